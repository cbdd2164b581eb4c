//! Callbacks & Progress: the engine's only user-facing output surface.
//!
//! The engine never prints directly and never holds a "last error" global —
//! every fact it wants to surface goes through one of these sinks, or
//! through a `tracing` event: one object-safe trait, one blanket `Arc<T>`
//! impl, one no-op implementation for tests and non-interactive callers.

use std::sync::Arc;

/// The answer to a yes/no confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// The user (or `--force`/`ASSUME_ALWAYS_YES`) said yes.
    Yes,
    /// The user said no; the caller must abort the step being confirmed.
    No,
}

/// Progress/diagnostic sinks the engine reports through. Never inspected
/// for control flow by the engine itself beyond `confirm`'s answer.
pub trait Callbacks: Send + Sync {
    /// A free-text status line (e.g. "fetching index", "running pkg-install").
    fn message(&self, text: &str);

    /// Start a progress bar with `total` units of work ahead.
    fn progress_init(&self, label: &str, total: u64);

    /// Advance the active progress bar by one unit.
    fn progress_step(&self);

    /// Tear down the active progress bar.
    fn progress_done(&self);

    /// Ask the user to confirm a step; non-interactive callers answer
    /// immediately according to `--force`/`ASSUME_ALWAYS_YES`.
    fn confirm(&self, prompt: &str) -> Answer;
}

impl<T: Callbacks + ?Sized> Callbacks for Arc<T> {
    fn message(&self, text: &str) {
        (**self).message(text);
    }

    fn progress_init(&self, label: &str, total: u64) {
        (**self).progress_init(label, total);
    }

    fn progress_step(&self) {
        (**self).progress_step();
    }

    fn progress_done(&self) {
        (**self).progress_done();
    }

    fn confirm(&self, prompt: &str) -> Answer {
        (**self).confirm(prompt)
    }
}

/// A `Callbacks` implementation that discards everything and always answers
/// `Yes` — used by tests and by `--quiet`/`--force` non-interactive runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCallbacks;

impl Callbacks for NullCallbacks {
    fn message(&self, _text: &str) {}
    fn progress_init(&self, _label: &str, _total: u64) {}
    fn progress_step(&self) {}
    fn progress_done(&self) {}
    fn confirm(&self, _prompt: &str) -> Answer {
        Answer::Yes
    }
}
