use crate::foundation::core::{Fps, PixelSize, TimeRange};
use crate::foundation::error::{ReframeError, ReframeResult};
use crate::geometry::crop::{CropGeometry, OUTPUT_FPS, RENDER_SIZE};
use crate::timeline::composition::Composition;

/// A time-ranged directive telling the renderer what spatial treatment to
/// apply to the video composition track's content.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderInstruction {
    /// Output time span this instruction covers.
    pub time_range: TimeRange,
    /// Crop and combined transform, set at the range start and static for
    /// the whole span; no keyframing.
    pub geometry: CropGeometry,
}

/// The instruction set driving the output renderer.
///
/// Here always a single instruction spanning the whole composition
/// duration, at the fixed render size and output cadence. Consumed once by
/// the export stage.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderProgram {
    /// Fixed output render size.
    pub render_size: PixelSize,
    /// Fixed output frame cadence; source frames are resampled to it.
    pub fps: Fps,
    /// Ordered instructions, one per output time range.
    pub instructions: Vec<RenderInstruction>,
}

impl RenderProgram {
    /// The single whole-duration instruction.
    pub fn instruction(&self) -> ReframeResult<&RenderInstruction> {
        self.instructions
            .first()
            .ok_or_else(|| ReframeError::validation("render program has no instructions"))
    }
}

/// Build the render program for a composition and its crop geometry.
///
/// Pure data assembly; the only failure mode is a degenerate geometry
/// slipping through, which is re-checked here.
pub fn build_render_program(
    comp: &Composition,
    geometry: &CropGeometry,
) -> ReframeResult<RenderProgram> {
    if geometry.crop_size.width <= 0.0 || geometry.crop_size.height <= 0.0 {
        return Err(ReframeError::invalid_frame_geometry(
            "render program requires a non-degenerate crop",
        ));
    }

    Ok(RenderProgram {
        render_size: RENDER_SIZE,
        fps: OUTPUT_FPS,
        instructions: vec![RenderInstruction {
            time_range: comp.video.inserted,
            geometry: *geometry,
        }],
    })
}
