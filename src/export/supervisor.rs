use std::path::{Path, PathBuf};

use tokio::sync::watch;

use crate::export::job::{ExportJob, ExportStatus};
use crate::export::session::EncodeSession;
use crate::foundation::core::MediaTime;
use crate::foundation::error::{ReframeError, ReframeResult};
use crate::geometry::crop::compute_crop_geometry;
use crate::media::probe::load_tracks;
use crate::timeline::composition::build_composition;
use crate::timeline::program::build_render_program;

/// Downstream persistence collaborator, invoked once with the finished
/// output location.
pub type PersistCallback = Box<dyn Fn(&Path) + Send + Sync>;

/// Supervisor configuration.
#[derive(Clone, Debug)]
pub struct SupervisorOpts {
    /// Directory receiving output files. Treated as append-only: every job
    /// writes a unique, time-based filename, so concurrent jobs never
    /// collide.
    pub output_dir: PathBuf,
}

impl Default for SupervisorOpts {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir(),
        }
    }
}

/// Result of a completed export, handed back to the caller.
#[derive(Clone, Debug)]
pub struct ExportOutcome {
    /// Finished output file location.
    pub output_path: PathBuf,
    /// Duration of the exported clip.
    pub duration: MediaTime,
}

/// Drives one export pipeline run per submitted clip.
///
/// Stages run strictly in order (track load, geometry, composition,
/// render program, encode) with no speculative overlap. Status is
/// published through a watch channel the caller polls or awaits; all
/// failures are terminal for the job (no retries), and the caller may
/// re-submit the source file as a brand-new job.
pub struct ExportSupervisor {
    opts: SupervisorOpts,
    status_tx: watch::Sender<ExportStatus>,
    persist: Option<PersistCallback>,
}

impl ExportSupervisor {
    /// Create a supervisor.
    pub fn new(opts: SupervisorOpts) -> Self {
        let (status_tx, _) = watch::channel(ExportStatus::idle());
        Self {
            opts,
            status_tx,
            persist: None,
        }
    }

    /// Register the persistence collaborator invoked on success.
    pub fn on_exported<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        self.persist = Some(Box::new(callback));
        self
    }

    /// Subscribe to the observable status surface.
    pub fn subscribe(&self) -> watch::Receiver<ExportStatus> {
        self.status_tx.subscribe()
    }

    /// Run the full pipeline for one recorded clip.
    ///
    /// Suspends twice (at track load and for the encode) and performs the
    /// geometry and assembly work synchronously in between.
    #[tracing::instrument(skip(self), fields(source = %source_path.display()))]
    pub async fn process(&mut self, source_path: &Path) -> ReframeResult<ExportOutcome> {
        let output_path = unique_output_path(&self.opts.output_dir);
        let mut job = ExportJob::new(output_path);

        match self.run_stages(source_path, &mut job).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                job.fail(err.to_string());
                self.publish(&job);
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        source_path: &Path,
        job: &mut ExportJob,
    ) -> ReframeResult<ExportOutcome> {
        job.begin_preparing()?;
        self.publish(job);

        let asset = load_tracks(source_path).await?;
        let geometry = compute_crop_geometry(asset.natural_size, asset.preferred_transform)?;
        let comp = build_composition(&asset)?;
        job.mark_composed()?;
        self.publish(job);

        let program = build_render_program(&comp, &geometry)?;
        let session = EncodeSession::new(source_path, &comp, &program, job.output_path())?;

        job.begin_exporting()?;
        self.publish(job);

        session
            .run(|fraction| {
                let _ = job.update_encode_progress(fraction);
                self.publish(job);
            })
            .await?;

        job.complete()?;
        self.publish(job);

        let outcome = ExportOutcome {
            output_path: job.output_path().to_path_buf(),
            duration: comp.duration,
        };
        if let Some(persist) = &self.persist {
            persist(&outcome.output_path);
        }
        Ok(outcome)
    }

    fn publish(&self, job: &ExportJob) {
        let _ = self.status_tx.send(job.status());
    }
}

/// Unique, time-based output filename so concurrent jobs never collide.
fn unique_output_path(output_dir: &Path) -> PathBuf {
    output_dir.join(format!(
        "reframed_{}_{}.mp4",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ))
}
