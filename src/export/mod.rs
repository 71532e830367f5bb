//! Supervised asynchronous export: job state, encode session, orchestration.

/// Export job state machine and observable status surface.
pub mod job;
/// `ffmpeg`-based encode session.
pub mod session;
/// Stage orchestration and status publishing.
pub mod supervisor;
