//! ManualPress core: the harvest pipeline and document assembly.
//!
//! Wires the automation, harvester, and image crates into one run:
//! open the manual, walk its navigation tree, dedup and assemble sections,
//! and render the result.

pub mod assembler;
pub mod pipeline;
pub mod render;

pub use assembler::{DocumentAssembler, clamp_level};
pub use pipeline::{HarvestJob, HarvestResult, ProgressReporter, SilentProgress, harvest};
pub use render::{DocumentRenderer, MarkdownRenderer};
