//! Source media inspection: asset and track resolution through `ffprobe`.

/// Track loading and probe-output parsing.
pub mod probe;
