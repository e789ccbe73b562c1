//! Process-wide state shared with the signal layer

use crate::jobs::JobRegistry;
use crate::signals::ForegroundSlot;
use std::sync::Arc;

/// State reachable from both the read loop and the signal handlers.
///
/// Created once at startup and shared by `Arc`; dropped when the shell exits.
#[derive(Debug, Default)]
pub struct ShellContext {
    /// Background jobs
    pub jobs: JobRegistry,
    /// The process currently being waited on, if any
    pub foreground: ForegroundSlot,
}

impl ShellContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}
