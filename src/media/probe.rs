use std::path::{Path, PathBuf};

use crate::foundation::core::{Affine, MEDIA_TIMESCALE, MediaTime, Size};
use crate::foundation::error::{ReframeError, ReframeResult};

/// Media kind of a source track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TrackKind {
    /// Video track.
    Video,
    /// Audio track.
    Audio,
}

/// Reference to one media track within a [`MediaAsset`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TrackHandle {
    /// Media kind.
    pub kind: TrackKind,
    /// Stream index within the container.
    pub stream_index: u32,
    /// Raw pixel dimensions before orientation correction (video only).
    pub natural_size: Option<Size>,
    /// Orientation-correcting display transform (video only).
    pub preferred_transform: Option<Affine>,
}

/// A probed source media file and its resolved tracks.
///
/// Immutable once loaded; owned by one pipeline run. The probe is read-only
/// and never mutates the source file.
#[derive(Clone, Debug)]
pub struct MediaAsset {
    /// Source file location.
    pub source_path: PathBuf,
    /// Total asset duration.
    pub duration: MediaTime,
    /// Natural presentation size of the video track.
    pub natural_size: Size,
    /// Preferred display transform of the video track.
    pub preferred_transform: Affine,
    /// The required video track.
    pub video: TrackHandle,
    /// Optional audio track; absence is not an error.
    pub audio: Option<TrackHandle>,
}

/// Resolve the video and optional audio tracks of a source file.
///
/// Runs `ffprobe` asynchronously; this is the pipeline's first suspend
/// point. Every probe failure (missing tool, unreadable file, no video
/// stream) maps to [`ReframeError::TracksUnavailable`].
#[tracing::instrument]
pub async fn load_tracks(source_path: &Path) -> ReframeResult<MediaAsset> {
    let out = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .await
        .map_err(|e| ReframeError::tracks_unavailable(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReframeError::tracks_unavailable(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    parse_probe_output(source_path, &out.stdout)
}

/// Parse `ffprobe` JSON output into a [`MediaAsset`].
///
/// Pure over the probe bytes so it can be tested without the tool.
pub fn parse_probe_output(source_path: &Path, json: &[u8]) -> ReframeResult<MediaAsset> {
    #[derive(serde::Deserialize)]
    struct ProbeSideData {
        rotation: Option<f64>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeTags {
        rotate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        index: u32,
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        side_data_list: Option<Vec<ProbeSideData>>,
        tags: Option<ProbeTags>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| ReframeError::tracks_unavailable(format!("ffprobe json parse failed: {e}")))?;

    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            ReframeError::tracks_unavailable(format!(
                "no video stream found in '{}'",
                source_path.display()
            ))
        })?;

    let width = video_stream
        .width
        .filter(|w| *w > 0)
        .ok_or_else(|| ReframeError::tracks_unavailable("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .filter(|h| *h > 0)
        .ok_or_else(|| ReframeError::tracks_unavailable("missing video height from ffprobe"))?;

    let rotation = stream_rotation_degrees(
        video_stream
            .side_data_list
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .find_map(|s| s.rotation),
        video_stream.tags.as_ref().and_then(|t| t.rotate.as_deref()),
    );
    let preferred_transform = transform_for_rotation(rotation);

    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| {
            ReframeError::tracks_unavailable(format!(
                "source duration unknown for '{}'",
                source_path.display()
            ))
        })?;
    let duration = MediaTime::from_secs_f64(duration_secs, MEDIA_TIMESCALE)?;

    let natural_size = Size::new(f64::from(width), f64::from(height));
    let video = TrackHandle {
        kind: TrackKind::Video,
        stream_index: video_stream.index,
        natural_size: Some(natural_size),
        preferred_transform: Some(preferred_transform),
    };

    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .map(|s| TrackHandle {
            kind: TrackKind::Audio,
            stream_index: s.index,
            natural_size: None,
            preferred_transform: None,
        });

    Ok(MediaAsset {
        source_path: source_path.to_path_buf(),
        duration,
        natural_size,
        preferred_transform,
        video,
        audio,
    })
}

/// Pick the stream rotation: display-matrix side data wins, the legacy
/// `rotate` tag is the fallback, no metadata means upright.
fn stream_rotation_degrees(side_data: Option<f64>, rotate_tag: Option<&str>) -> f64 {
    if let Some(r) = side_data {
        return r;
    }
    rotate_tag
        .and_then(|t| t.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Orientation transform for a rotation in degrees, normalized to [0, 360).
fn transform_for_rotation(degrees: f64) -> Affine {
    let norm = degrees.rem_euclid(360.0);
    if norm == 0.0 {
        Affine::IDENTITY
    } else {
        Affine::rotate(norm.to_radians())
    }
}
