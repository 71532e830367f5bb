//! Reframe is a post-capture video transform pipeline: it turns a freshly
//! recorded vertical (portrait) video into a landscape 16:9 MP4 by cropping
//! a horizontal slice from the source frame, applying an
//! orientation-correcting transform, compositing video (and optionally
//! audio) tracks, and exporting the result to a new container file with
//! progress reported throughout.
//!
//! # Pipeline overview
//!
//! 1. **Load**: [`load_tracks`] probes the source file (`ffprobe`) into a
//!    [`MediaAsset`] with its video and optional audio [`TrackHandle`]s.
//! 2. **Geometry**: [`compute_crop_geometry`] maps the natural size and
//!    preferred transform to a centered 16:9 [`CropGeometry`].
//! 3. **Compose**: [`build_composition`] inserts the full source time
//!    ranges into a fresh [`Composition`], time-aligned at zero.
//! 4. **Program**: [`build_render_program`] emits the single-instruction
//!    [`RenderProgram`] at the fixed 1920x1080 / 30 fps policy.
//! 5. **Export**: [`ExportSupervisor`] drives the `ffmpeg` encode,
//!    publishes [`ExportStatus`] over a watch channel, and hands the
//!    finished file to the persistence collaborator.
//!
//! Key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic geometry**: the crop calculator is pure; identical
//!   inputs produce bit-identical geometry.
//! - **Fail-fast**: every stage failure is terminal for its job: no
//!   retries, no partial output left referenced.
//! - **Isolated jobs**: each run owns its asset, composition, and unique
//!   output path; concurrent runs share no mutable state.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Supervised asynchronous export.
pub mod export;
/// Crop and output-transform geometry.
pub mod geometry;
/// Source media inspection.
pub mod media;
/// Timeline assembly and render instructions.
pub mod timeline;

pub use crate::foundation::core::{
    Affine, Fps, MEDIA_TIMESCALE, MediaTime, PixelSize, Point, Rect, Size, TimeRange, Vec2,
};
pub use crate::foundation::error::{ReframeError, ReframeResult};

pub use crate::export::job::{
    ExportJob, ExportPhase, ExportStatus, PROGRESS_COMPOSED, PROGRESS_DONE, PROGRESS_EXPORTING,
};
pub use crate::export::session::{EncodeSession, ensure_parent_dir, is_ffmpeg_on_path};
pub use crate::export::supervisor::{
    ExportOutcome, ExportSupervisor, PersistCallback, SupervisorOpts,
};
pub use crate::geometry::crop::{
    CropGeometry, OUTPUT_FPS, RENDER_SIZE, TARGET_ASPECT_RATIO, X264_CRF, X264_PRESET,
    compute_crop_geometry,
};
pub use crate::media::probe::{MediaAsset, TrackHandle, TrackKind, load_tracks, parse_probe_output};
pub use crate::timeline::composition::{Composition, CompositionTrack, build_composition};
pub use crate::timeline::program::{RenderInstruction, RenderProgram, build_render_program};
