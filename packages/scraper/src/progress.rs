//! Progress reporting for long-running fetch loops.
//!
//! The scrapers iterate over dozens of states or years. They report through
//! [`ProgressCallback`] so the binary can render bars while library code
//! stays terminal-agnostic.

/// Receives progress updates from a fetch loop.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}
