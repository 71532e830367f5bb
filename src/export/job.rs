use std::path::{Path, PathBuf};

use crate::foundation::error::{ReframeError, ReframeResult};

/// Progress checkpoint published once the composition is assembled.
pub const PROGRESS_COMPOSED: f64 = 0.3;

/// Progress checkpoint published when the encode operation starts.
pub const PROGRESS_EXPORTING: f64 = 0.6;

/// Progress value published on completion.
pub const PROGRESS_DONE: f64 = 1.0;

// Mid-encode progress interpolates inside [PROGRESS_EXPORTING, 1.0) and is
// capped below 1.0; the completion transition alone reports 1.0.
const PROGRESS_ENCODE_CAP: f64 = 0.99;

/// Phase of an export job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExportPhase {
    /// Job created, processing not started.
    Idle,
    /// Composition, geometry and render program assembly.
    Preparing,
    /// The asynchronous encode operation is running.
    Exporting,
    /// Output file finished and handed off.
    Completed,
    /// A stage failed; the job is terminal.
    Failed,
}

/// Read-only status surface exposed to the caller.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExportStatus {
    /// Whether the pipeline is between start and a terminal phase.
    pub is_processing: bool,
    /// Monotonically non-decreasing progress in `[0, 1]` while processing;
    /// reset to 0 on failure.
    pub progress: f64,
    /// Short human-readable description of the current stage, or the
    /// failure text in the `Failed` phase.
    pub status_message: Option<String>,
}

impl ExportStatus {
    /// Status of a job that has not started.
    pub fn idle() -> Self {
        Self {
            is_processing: false,
            progress: 0.0,
            status_message: None,
        }
    }
}

/// State machine for one export run.
///
/// Phases move `Idle -> Preparing -> Exporting -> Completed`, with any
/// non-terminal phase able to fall into `Failed`. Progress never decreases
/// while the job is live; a failure resets it to 0. The job is discarded
/// once a terminal phase has been reported to the caller.
#[derive(Debug)]
pub struct ExportJob {
    output_path: PathBuf,
    phase: ExportPhase,
    progress: f64,
    status_message: Option<String>,
    error_message: Option<String>,
}

impl ExportJob {
    /// Create an idle job targeting `output_path`.
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            phase: ExportPhase::Idle,
            progress: 0.0,
            status_message: None,
            error_message: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    /// The output location this job writes to.
    ///
    /// Callers must treat the file as usable only once the job reports
    /// [`ExportPhase::Completed`].
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Failure text, set in the `Failed` phase.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Snapshot of the observable status surface.
    pub fn status(&self) -> ExportStatus {
        ExportStatus {
            is_processing: matches!(self.phase, ExportPhase::Preparing | ExportPhase::Exporting),
            progress: self.progress,
            status_message: self.status_message.clone(),
        }
    }

    /// `Idle -> Preparing`.
    pub fn begin_preparing(&mut self) -> ReframeResult<()> {
        self.transition(ExportPhase::Idle, ExportPhase::Preparing)?;
        self.status_message = Some("Preparing composition".to_string());
        Ok(())
    }

    /// Checkpoint inside `Preparing`: composition assembled.
    pub fn mark_composed(&mut self) -> ReframeResult<()> {
        if self.phase != ExportPhase::Preparing {
            return Err(ReframeError::validation(
                "composition checkpoint requires the Preparing phase",
            ));
        }
        self.progress = self.progress.max(PROGRESS_COMPOSED);
        self.status_message = Some("Composition assembled".to_string());
        Ok(())
    }

    /// `Preparing -> Exporting`.
    pub fn begin_exporting(&mut self) -> ReframeResult<()> {
        self.transition(ExportPhase::Preparing, ExportPhase::Exporting)?;
        self.progress = self.progress.max(PROGRESS_EXPORTING);
        self.status_message = Some("Exporting video".to_string());
        Ok(())
    }

    /// Fold a best-effort encode fraction (in `[0, 1]`) into the
    /// `[PROGRESS_EXPORTING, 1.0)` band. Never regresses.
    pub fn update_encode_progress(&mut self, fraction: f64) -> ReframeResult<()> {
        if self.phase != ExportPhase::Exporting {
            return Err(ReframeError::validation(
                "encode progress requires the Exporting phase",
            ));
        }
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mapped = PROGRESS_EXPORTING + (PROGRESS_DONE - PROGRESS_EXPORTING) * fraction;
        self.progress = self.progress.max(mapped.min(PROGRESS_ENCODE_CAP));
        Ok(())
    }

    /// `Exporting -> Completed`.
    pub fn complete(&mut self) -> ReframeResult<()> {
        self.transition(ExportPhase::Exporting, ExportPhase::Completed)?;
        self.progress = PROGRESS_DONE;
        self.status_message = Some("Export complete".to_string());
        Ok(())
    }

    /// Transition any live phase to `Failed`, clearing progress and
    /// attaching the failure text.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.phase = ExportPhase::Failed;
        self.progress = 0.0;
        self.error_message = Some(message.clone());
        self.status_message = Some(message);
    }

    fn transition(&mut self, from: ExportPhase, to: ExportPhase) -> ReframeResult<()> {
        if self.phase != from {
            return Err(ReframeError::validation(format!(
                "export job cannot move from {:?} to {:?}",
                self.phase, to
            )));
        }
        self.phase = to;
        Ok(())
    }
}
