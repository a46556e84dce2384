//! Bounded poll-until-stable wait for client-side rendering.
//!
//! The target frame exposes no load-completion event, so after each click the
//! walker re-reads the frame body at short intervals until two consecutive
//! non-empty reads match, capped by a maximum wait.
//!
//! The frame keeps showing the previous entry's body until the new content
//! renders, so reads matching the caller's pre-click `baseline` never settle
//! early. Unchanged content is still returned at the deadline: several
//! navigation entries can legitimately alias one topic frame, and those
//! reach the deduplicator instead of timing out.

use std::time::Duration;

use tokio::time::Instant;

use manualpress_shared::Result;

/// Poll `read` until it returns the same non-baseline, non-empty content
/// twice in a row.
///
/// Returns the settled content; or the last content seen if the deadline
/// expires while the frame is still mutating; or the unchanged baseline
/// content if nothing new appeared by the deadline; or `None` if no content
/// ever appeared.
pub async fn poll_until_stable<F>(
    mut read: F,
    baseline: Option<&str>,
    interval: Duration,
    max_wait: Duration,
) -> Result<Option<String>>
where
    F: AsyncFnMut() -> Result<Option<String>>,
{
    let deadline = Instant::now() + max_wait;
    let mut previous: Option<String> = None;
    let mut unchanged: Option<String> = None;

    loop {
        if let Some(current) = read().await? {
            if !current.is_empty() {
                if baseline == Some(current.as_str()) {
                    unchanged = Some(current);
                } else {
                    if previous.as_deref() == Some(current.as_str()) {
                        return Ok(Some(current));
                    }
                    previous = Some(current);
                }
            }
        }

        if Instant::now() >= deadline {
            return Ok(previous.or(unchanged));
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(50);
    const MAX_WAIT: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn settles_on_two_matching_reads() {
        let mut reads = vec![
            None,
            Some("loading".to_string()),
            Some("<p>done</p>".to_string()),
            Some("<p>done</p>".to_string()),
        ]
        .into_iter();

        let result = poll_until_stable(
            async || Ok(reads.next().unwrap_or(None)),
            None,
            INTERVAL,
            MAX_WAIT,
        )
        .await
        .unwrap();

        assert_eq!(result.as_deref(), Some("<p>done</p>"));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_none_when_content_never_appears() {
        let result = poll_until_stable(async || Ok(None), None, INTERVAL, MAX_WAIT)
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_returns_last_read_when_still_mutating() {
        let mut counter = 0u32;
        let result = poll_until_stable(
            async || {
                counter += 1;
                Ok(Some(format!("render pass {counter}")))
            },
            None,
            INTERVAL,
            MAX_WAIT,
        )
        .await
        .unwrap();

        let last = result.expect("content appeared");
        assert!(last.starts_with("render pass"));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_reads_do_not_count_as_stable() {
        let mut reads = vec![
            Some(String::new()),
            Some(String::new()),
            Some("body".to_string()),
            Some("body".to_string()),
        ]
        .into_iter();

        let result = poll_until_stable(
            async || Ok(reads.next().unwrap_or(None)),
            None,
            INTERVAL,
            MAX_WAIT,
        )
        .await
        .unwrap();

        assert_eq!(result.as_deref(), Some("body"));
    }

    #[tokio::test(start_paused = true)]
    async fn reads_matching_baseline_do_not_settle_early() {
        // The frame still shows the previous entry while the click renders.
        let mut reads = vec![
            Some("old body".to_string()),
            Some("old body".to_string()),
            Some("new body".to_string()),
            Some("new body".to_string()),
        ]
        .into_iter();

        let result = poll_until_stable(
            async || Ok(reads.next().unwrap_or(None)),
            Some("old body"),
            INTERVAL,
            MAX_WAIT,
        )
        .await
        .unwrap();

        assert_eq!(result.as_deref(), Some("new body"));
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_content_is_returned_only_at_deadline() {
        let started = Instant::now();
        let result = poll_until_stable(
            async || Ok(Some("aliased topic".to_string())),
            Some("aliased topic"),
            INTERVAL,
            MAX_WAIT,
        )
        .await
        .unwrap();

        assert_eq!(result.as_deref(), Some("aliased topic"));
        assert!(started.elapsed() >= MAX_WAIT);
    }
}
