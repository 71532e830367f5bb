use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use reframe::{
    ExportSupervisor, ReframeError, SupervisorOpts, load_tracks,
};

fn ffmpeg_tools_available() -> bool {
    let ffmpeg_ok = Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    let ffprobe_ok = Command::new("ffprobe")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    ffmpeg_ok && ffprobe_ok
}

fn temp_root(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "reframe_{tag}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

/// Synthesize a one-second portrait clip (1080x1920), optionally with a
/// sine audio track.
fn synth_portrait(root: &Path, name: &str, with_audio: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(root)?;
    let path = root.join(name);

    let mut cmd = Command::new("ffmpeg");
    cmd.args([
        "-v",
        "error",
        "-y",
        "-f",
        "lavfi",
        "-i",
        "testsrc=size=1080x1920:rate=30",
    ]);
    if with_audio {
        cmd.args(["-f", "lavfi", "-i", "sine=frequency=440:sample_rate=48000"]);
    }
    cmd.args(["-t", "1", "-pix_fmt", "yuv420p", "-c:v", "libx264"]);
    if with_audio {
        cmd.args(["-c:a", "aac"]);
    }
    let status = cmd.arg(&path).status()?;
    anyhow::ensure!(status.success(), "ffmpeg failed creating {name}");
    Ok(path)
}

#[tokio::test]
async fn portrait_export_completes_with_landscape_output() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = temp_root("export");
    let source = synth_portrait(&root, "portrait.mp4", true).unwrap();

    let persisted = Arc::new(AtomicUsize::new(0));
    let persisted_count = Arc::clone(&persisted);
    let mut supervisor = ExportSupervisor::new(SupervisorOpts {
        output_dir: root.join("out"),
    })
    .on_exported(move |_| {
        persisted_count.fetch_add(1, Ordering::SeqCst);
    });

    let mut status_rx = supervisor.subscribe();
    let observed = Arc::new(std::sync::Mutex::new(Vec::<f64>::new()));
    let observed_writer = Arc::clone(&observed);
    let watcher = tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow().clone();
            observed_writer.lock().unwrap().push(status.progress);
        }
    });

    let outcome = supervisor.process(&source).await.unwrap();
    assert!(outcome.output_path.exists());
    assert!((outcome.duration.as_secs_f64() - 1.0).abs() < 0.2);
    assert_eq!(persisted.load(Ordering::SeqCst), 1);

    // The finished file is landscape HD with the audio muxed through.
    let exported = load_tracks(&outcome.output_path).await.unwrap();
    assert_eq!(exported.natural_size.width, 1920.0);
    assert_eq!(exported.natural_size.height, 1080.0);
    assert!(exported.audio.is_some());

    drop(supervisor);
    watcher.await.unwrap();
    let progress = observed.lock().unwrap().clone();
    assert!(!progress.is_empty());
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*progress.last().unwrap(), 1.0);
}

#[tokio::test]
async fn silent_source_still_completes() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = temp_root("silent");
    let source = synth_portrait(&root, "silent.mp4", false).unwrap();

    let mut supervisor = ExportSupervisor::new(SupervisorOpts {
        output_dir: root.join("out"),
    });
    let outcome = supervisor.process(&source).await.unwrap();
    assert!(outcome.output_path.exists());

    let exported = load_tracks(&outcome.output_path).await.unwrap();
    assert!(exported.audio.is_none());
    assert_eq!(exported.natural_size.width, 1920.0);
}

#[tokio::test]
async fn corrupted_input_fails_before_any_output() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = temp_root("corrupt");
    std::fs::create_dir_all(&root).unwrap();
    let source = root.join("broken.mp4");
    std::fs::write(&source, b"not a movie").unwrap();

    let out_dir = root.join("out");
    let mut supervisor = ExportSupervisor::new(SupervisorOpts {
        output_dir: out_dir.clone(),
    });
    let status_rx = supervisor.subscribe();

    let err = supervisor.process(&source).await.unwrap_err();
    assert!(matches!(err, ReframeError::TracksUnavailable(_)));

    let last = status_rx.borrow().clone();
    assert_eq!(last.progress, 0.0);
    assert!(!last.is_processing);

    // Nothing was written: the pipeline failed before the encode stage.
    let outputs: Vec<_> = std::fs::read_dir(&out_dir)
        .map(|entries| entries.filter_map(|e| e.ok()).collect())
        .unwrap_or_default();
    assert!(outputs.is_empty());
}

#[tokio::test]
async fn concurrent_jobs_produce_distinct_outputs() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = temp_root("concurrent");
    let source_a = synth_portrait(&root, "a.mp4", true).unwrap();
    let source_b = synth_portrait(&root, "b.mp4", false).unwrap();

    let mut supervisor_a = ExportSupervisor::new(SupervisorOpts {
        output_dir: root.join("out"),
    });
    let mut supervisor_b = ExportSupervisor::new(SupervisorOpts {
        output_dir: root.join("out"),
    });

    let (a, b) = tokio::join!(supervisor_a.process(&source_a), supervisor_b.process(&source_b));
    let a = a.unwrap();
    let b = b.unwrap();

    assert_ne!(a.output_path, b.output_path);
    assert!(a.output_path.exists());
    assert!(b.output_path.exists());

    let probed_a = load_tracks(&a.output_path).await.unwrap();
    let probed_b = load_tracks(&b.output_path).await.unwrap();
    assert_eq!(probed_a.natural_size.width, 1920.0);
    assert_eq!(probed_b.natural_size.width, 1920.0);
    assert!(probed_a.audio.is_some());
    assert!(probed_b.audio.is_none());
}
