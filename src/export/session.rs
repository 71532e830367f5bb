use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::foundation::error::{ReframeError, ReframeResult};
use crate::geometry::crop::{X264_CRF, X264_PRESET};
use crate::timeline::composition::Composition;
use crate::timeline::program::RenderProgram;

/// One render-and-encode operation: consumes a composition and render
/// program and produces the encoded output file.
///
/// The underlying `ffmpeg` child is spawned with kill-on-drop, so dropping
/// the in-flight future stops the encoder rather than orphaning it. A
/// failed encode removes its partially written output file.
pub struct EncodeSession {
    args: Vec<String>,
    out_path: PathBuf,
    duration_secs: f64,
}

impl EncodeSession {
    /// Construct the session for `source` -> `out_path`.
    ///
    /// Validates the render program, creates the output directory, and
    /// freezes the encoder argument list. The tool itself is checked when
    /// [`EncodeSession::run`] starts.
    pub fn new(
        source: &Path,
        comp: &Composition,
        program: &RenderProgram,
        out_path: &Path,
    ) -> ReframeResult<Self> {
        comp.validate()?;
        let args = build_ffmpeg_args(source, comp, program, out_path)?;
        ensure_parent_dir(out_path)?;
        Ok(Self {
            args,
            out_path: out_path.to_path_buf(),
            duration_secs: comp.duration.as_secs_f64(),
        })
    }

    /// Run the encode to completion.
    ///
    /// `on_progress` receives best-effort fractions in `[0, 1]` parsed from
    /// the encoder's progress stream; granularity is whatever the encoder
    /// reports, not a continuous signal.
    #[tracing::instrument(skip(self, on_progress), fields(out = %self.out_path.display()))]
    pub async fn run(self, mut on_progress: impl FnMut(f64)) -> ReframeResult<()> {
        if !is_ffmpeg_on_path().await {
            return Err(ReframeError::export_session_unavailable(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = tokio::process::Command::new("ffmpeg");
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            ReframeError::export_session_unavailable(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReframeError::export_failed("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReframeError::export_failed("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = tokio::spawn(async move {
            let mut stderr_bytes = Vec::new();
            let _ = stderr.read_to_end(&mut stderr_bytes).await;
            stderr_bytes
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(secs) = parse_progress_secs(&line)
                && self.duration_secs > 0.0
            {
                on_progress((secs / self.duration_secs).clamp(0.0, 1.0));
            }
        }

        let status = child.wait().await.map_err(|e| {
            ReframeError::export_failed(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = stderr_drain.await.unwrap_or_default();

        if !status.success() {
            let _ = tokio::fs::remove_file(&self.out_path).await;
            return Err(ReframeError::export_failed(format!(
                "ffmpeg exited with status {}: {}",
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }

        Ok(())
    }
}

/// Build the full encoder argument list.
///
/// Video: crop to the program's layer geometry, scale to the fixed render
/// size, resample to the fixed cadence, H.264 at the highest-quality
/// policy. Audio: stream-copied when the composition carries a track,
/// dropped otherwise.
pub(crate) fn build_ffmpeg_args(
    source: &Path,
    comp: &Composition,
    program: &RenderProgram,
    out_path: &Path,
) -> ReframeResult<Vec<String>> {
    let instruction = program.instruction()?;
    // The decoder auto-rotates frames into display space, so the
    // oriented-space crop coordinates apply directly.
    let (crop_w, crop_h, crop_x, crop_y) = instruction.geometry.pixel_crop();

    let mut args: Vec<String> = [
        "-y",
        "-loglevel",
        "error",
        "-nostats",
        "-progress",
        "pipe:1",
        "-i",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(source.to_string_lossy().into_owned());

    args.push("-map".to_string());
    args.push(format!("0:{}", comp.video.source_stream));
    if let Some(audio) = &comp.audio {
        args.push("-map".to_string());
        args.push(format!("0:{}", audio.source_stream));
    }

    args.push("-vf".to_string());
    args.push(format!(
        "crop={crop_w}:{crop_h}:{crop_x}:{crop_y},scale={}:{}",
        program.render_size.width, program.render_size.height
    ));
    args.push("-r".to_string());
    args.push(format!("{}/{}", program.fps.num, program.fps.den));

    args.extend(
        [
            "-c:v",
            "libx264",
            "-preset",
            X264_PRESET,
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push("-crf".to_string());
    args.push(X264_CRF.to_string());

    if comp.has_audio() {
        args.push("-c:a".to_string());
        args.push("copy".to_string());
    } else {
        args.push("-an".to_string());
    }

    args.push(out_path.to_string_lossy().into_owned());
    Ok(args)
}

/// Parse one `-progress` key/value line into processed output seconds.
///
/// Both `out_time_us` and `out_time_ms` carry microseconds; other keys are
/// ignored.
fn parse_progress_secs(line: &str) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_us" | "out_time_ms" => value
            .parse::<i64>()
            .ok()
            .filter(|v| *v >= 0)
            .map(|v| v as f64 / 1_000_000.0),
        _ => None,
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReframeResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub async fn is_ffmpeg_on_path() -> bool {
    tokio::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}
