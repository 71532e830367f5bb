use crate::foundation::core::{MediaTime, TimeRange};
use crate::foundation::error::{ReframeError, ReframeResult};
use crate::media::probe::{MediaAsset, TrackHandle, TrackKind};

/// One track of a [`Composition`]: a source stream with its inserted span.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CompositionTrack {
    /// Media kind of the inserted source track.
    pub kind: TrackKind,
    /// Source stream index the track reads from.
    pub source_stream: u32,
    /// Inserted span; always the full source range, aligned to time zero.
    pub inserted: TimeRange,
}

/// An editable in-memory timeline assembled from one source asset.
///
/// Owns exactly one video track and zero-or-one audio track, each holding
/// the full source time range inserted at time zero. Created fresh per
/// export and discarded after the export completes or fails.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Composition {
    /// Total composition duration (the source asset duration).
    pub duration: MediaTime,
    /// The required video track.
    pub video: CompositionTrack,
    /// Optional audio track, present only when the source has one.
    pub audio: Option<CompositionTrack>,
}

impl Composition {
    /// Whether the composition carries an audio track.
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Check structural invariants.
    pub fn validate(&self) -> ReframeResult<()> {
        if !self.duration.is_positive() {
            return Err(ReframeError::validation(
                "composition duration must be positive",
            ));
        }
        if self.video.kind != TrackKind::Video {
            return Err(ReframeError::validation(
                "composition video slot must hold a video track",
            ));
        }
        if let Some(audio) = &self.audio
            && audio.kind != TrackKind::Audio
        {
            return Err(ReframeError::validation(
                "composition audio slot must hold an audio track",
            ));
        }
        Ok(())
    }
}

/// Assemble a [`Composition`] from a probed asset.
///
/// Inserts the video track's full time range at time zero, and the audio
/// track's alongside when one is present. Fails with
/// [`ReframeError::TrackInsertionFailed`] when a track's source timing is
/// malformed; no partial composition is exposed on failure.
pub fn build_composition(asset: &MediaAsset) -> ReframeResult<Composition> {
    let video = insert_full_range(&asset.video, asset.duration, TrackKind::Video)?;
    let audio = asset
        .audio
        .as_ref()
        .map(|track| insert_full_range(track, asset.duration, TrackKind::Audio))
        .transpose()?;

    let comp = Composition {
        duration: asset.duration,
        video,
        audio,
    };
    comp.validate()?;
    Ok(comp)
}

/// Insert one source track's full `[0, duration)` range into a fresh
/// composition track.
fn insert_full_range(
    handle: &TrackHandle,
    duration: MediaTime,
    expected: TrackKind,
) -> ReframeResult<CompositionTrack> {
    if handle.kind != expected {
        return Err(ReframeError::track_insertion_failed(format!(
            "cannot insert {:?} track into {:?} composition slot",
            handle.kind, expected
        )));
    }
    if !duration.is_positive() {
        return Err(ReframeError::track_insertion_failed(format!(
            "source time range is empty ({} units at timescale {})",
            duration.value, duration.timescale
        )));
    }
    let inserted = TimeRange::from_zero(duration)
        .map_err(|e| ReframeError::track_insertion_failed(e.to_string()))?;

    Ok(CompositionTrack {
        kind: handle.kind,
        source_stream: handle.stream_index,
        inserted,
    })
}
