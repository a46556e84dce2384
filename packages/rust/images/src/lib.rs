//! Image materialization for ManualPress.
//!
//! [`ImageStore`] persists each section's PNG payloads at most once per
//! `(section key, carrier index)` pair, with atomic temp-then-rename writes.

pub mod store;

pub use store::{ImageStore, section_key};
