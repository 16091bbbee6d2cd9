//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::progress::TaskReporter;
use crate::task::{CancelScope, TaskStage};

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::traits::Transcoder;
use super::types::{MediaInfo, TranscodeJob};

/// Maximum stderr lines kept for failure reports.
const STDERR_TAIL_LINES: usize = 32;

/// FFmpeg-based transcoder with a fixed target profile.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

/// Extracts elapsed-media-time markers from progress lines.
///
/// Accepts both `time=HH:MM:SS.ms` (stats output, `out_time=` progress keys)
/// and a bare `time=SECONDS` form. Compiled once per transcode, not per line.
struct TimeMarkerParser {
    clock: Option<Regex>,
    seconds: Option<Regex>,
}

impl TimeMarkerParser {
    fn new() -> Self {
        Self {
            clock: Regex::new(r"time=(\d+):(\d+):(\d+(?:\.\d+)?)").ok(),
            seconds: Regex::new(r"time=(\d+(?:\.\d+)?)(?:\s|$)").ok(),
        }
    }

    fn parse(&self, line: &str) -> Option<f64> {
        if let Some(caps) = self.clock.as_ref()?.captures(line) {
            let h: f64 = caps.get(1)?.as_str().parse().ok()?;
            let m: f64 = caps.get(2)?.as_str().parse().ok()?;
            let s: f64 = caps.get(3)?.as_str().parse().ok()?;
            return Some(h * 3600.0 + m * 60.0 + s);
        }

        let caps = self.seconds.as_ref()?.captures(line)?;
        caps.get(1)?.as_str().parse().ok()
    }
}

impl FfmpegTranscoder {
    /// Creates a new transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds the ffmpeg argument list for one job.
    fn build_args(&self, input_path: &Path, output_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-nostdin".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-c:v".to_string(),
            self.config.video_codec.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
        ];

        // Resolution ceiling: scale down only, keep aspect ratio, keep the
        // width divisible by two for the encoder.
        if let Some(max_height) = self.config.max_height {
            args.extend([
                "-vf".to_string(),
                format!("scale=-2:'min({},ih)'", max_height),
            ]);
        }

        args.extend(["-c:a".to_string(), self.config.audio_codec.clone()]);

        // Keep stderr quiet except for errors and the progress stream.
        args.extend([
            "-loglevel".to_string(),
            "error".to_string(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]);

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args.push(output_path.to_string_lossy().to_string());
        args
    }


    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, TranscodeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }

        let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| {
            TranscodeError::probe_failed(format!("failed to parse ffprobe output: {}", e))
        })?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");
        let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
        })
    }

    /// Kills the subprocess and removes the partial output file.
    async fn abort(child: &mut Child, output_path: &Path) {
        let _ = child.kill().await;
        let _ = tokio::fs::remove_file(output_path).await;
    }

    /// Reads the encoder's stderr until it closes, reporting progress and
    /// reacting to cancellation between lines. Returns the exit status and
    /// the captured error-line tail.
    async fn drive(
        child: &mut Child,
        stderr: ChildStderr,
        output_path: &Path,
        cancel: &CancelScope,
        progress: &TaskReporter,
        duration_secs: f64,
    ) -> Result<(std::process::ExitStatus, String), TranscodeError> {
        let mut reader = BufReader::new(stderr).lines();
        let mut tail: Vec<String> = Vec::new();
        let time_markers = TimeMarkerParser::new();
        // Cancellation checkpoint even when the encoder goes quiet.
        let mut poll = tokio::time::interval(Duration::from_millis(250));

        loop {
            tokio::select! {
                line = reader.next_line() => match line {
                    Ok(Some(line)) => {
                        if cancel.is_requested() {
                            Self::abort(child, output_path).await;
                            return Err(TranscodeError::Cancelled);
                        }

                        if let Some(elapsed) = time_markers.parse(&line) {
                            progress
                                .report(
                                    TaskStage::Transcoding,
                                    elapsed as u64,
                                    duration_secs as u64,
                                )
                                .await;
                        } else if line.contains("Error") || line.contains("error") {
                            if tail.len() >= STDERR_TAIL_LINES {
                                tail.remove(0);
                            }
                            tail.push(line);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        Self::abort(child, output_path).await;
                        return Err(e.into());
                    }
                },
                _ = poll.tick() => {
                    if cancel.is_requested() {
                        Self::abort(child, output_path).await;
                        return Err(TranscodeError::Cancelled);
                    }
                }
            }
        }

        let status = child.wait().await?;
        Ok((status, tail.join("\n")))
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscodeError> {
        if !path.exists() {
            return Err(TranscodeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TranscodeError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn transcode(
        &self,
        job: TranscodeJob,
        cancel: &CancelScope,
        progress: &TaskReporter,
    ) -> Result<PathBuf, TranscodeError> {
        if !job.input_path.exists() {
            return Err(TranscodeError::InputNotFound {
                path: job.input_path.clone(),
            });
        }

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Total duration for percent computation; 0 degrades the display to
        // elapsed-time only, never a fabricated percentage.
        let duration_secs = self
            .probe(&job.input_path)
            .await
            .map(|info| info.duration_secs)
            .unwrap_or(0.0);

        let args = self.build_args(&job.input_path, &job.output_path);
        debug!("Running {:?} for task {}", self.config.ffmpeg_path, job.task_id);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        let stderr = child.stderr.take().expect("stderr should be captured");

        let driven = if self.config.timeout_secs > 0 {
            match timeout(
                Duration::from_secs(self.config.timeout_secs),
                Self::drive(
                    &mut child,
                    stderr,
                    &job.output_path,
                    cancel,
                    progress,
                    duration_secs,
                ),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => {
                    Self::abort(&mut child, &job.output_path).await;
                    return Err(TranscodeError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    });
                }
            }
        } else {
            Self::drive(
                &mut child,
                stderr,
                &job.output_path,
                cancel,
                progress,
                duration_secs,
            )
            .await
        };

        let (status, stderr_tail) = driven?;

        if !status.success() {
            let _ = tokio::fs::remove_file(&job.output_path).await;
            return Err(TranscodeError::ExitStatus {
                code: status.code(),
                stderr: stderr_tail,
            });
        }

        // The encoder can exit zero without producing output when the input
        // is empty or the destination is unwritable.
        tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| TranscodeError::ExitStatus {
                code: status.code(),
                stderr: "output file not created".to_string(),
            })?;

        Ok(job.output_path)
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscodeError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(TranscodeError::Io(e));
        }

        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscodeError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(TranscodeError::Io(e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressReporter;
    use crate::task::Task;
    use crate::testing::MockMessenger;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_build_args_target_profile() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_args(Path::new("/in.mkv"), Path::new("/out.mkv"));

        assert!(args.contains(&"-c:v".to_string()));
        assert!(args.contains(&"libx265".to_string()));
        assert!(args.contains(&"-crf".to_string()));
        assert!(args.contains(&"28".to_string()));
        assert!(args.contains(&"scale=-2:'min(1080,ih)'".to_string()));
        assert!(args.contains(&"-progress".to_string()));
        assert_eq!(args.last(), Some(&"/out.mkv".to_string()));
    }

    #[test]
    fn test_build_args_without_resolution_ceiling() {
        let config = TranscoderConfig {
            max_height: None,
            ..TranscoderConfig::default()
        };
        let transcoder = FfmpegTranscoder::new(config);
        let args = transcoder.build_args(Path::new("/in.mkv"), Path::new("/out.mkv"));
        assert!(!args.iter().any(|a| a.starts_with("scale=")));
    }

    #[test]
    fn test_parse_time_marker_clock_form() {
        let line = "frame=  100 fps= 25 q=28.0 size=1024KiB time=00:01:05.32 bitrate=...";
        let secs = TimeMarkerParser::new().parse(line).unwrap();
        assert!((secs - 65.32).abs() < 0.001);
    }

    #[test]
    fn test_parse_time_marker_progress_key() {
        let secs = TimeMarkerParser::new()
            .parse("out_time=00:00:05.000000")
            .unwrap();
        assert!((secs - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_time_marker_plain_seconds() {
        let secs = TimeMarkerParser::new().parse("time=12.5 ").unwrap();
        assert!((secs - 12.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_time_marker_absent() {
        assert!(TimeMarkerParser::new().parse("progress=continue").is_none());
    }

    #[test]
    fn test_parse_probe_output_video() {
        let json = r#"{
            "format": {
                "format_name": "matroska,webm",
                "duration": "7200.0",
                "size": "5000000000"
            },
            "streams": [
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080
                },
                {
                    "codec_type": "audio",
                    "codec_name": "aac"
                }
            ]
        }"#;

        let info = FfmpegTranscoder::parse_probe_output(Path::new("test.mkv"), json).unwrap();
        assert_eq!(info.format, "matroska");
        assert!((info.duration_secs - 7200.0).abs() < 0.01);
        assert_eq!(info.video_codec, Some("h264".to_string()));
        assert_eq!(info.video_height, Some(1080));
        assert_eq!(info.audio_codec, Some("aac".to_string()));
    }

    #[test]
    fn test_parse_probe_output_missing_duration() {
        let json = r#"{"format": {"format_name": "mpegts"}, "streams": []}"#;
        let info = FfmpegTranscoder::parse_probe_output(Path::new("t.ts"), json).unwrap();
        assert_eq!(info.duration_secs, 0.0);
    }

    #[cfg(unix)]
    mod subprocess {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_fake_binary(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            std::fs::write(&path, body).unwrap();
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
            path
        }

        fn harness(dir: &Path, ffmpeg_body: &str) -> (FfmpegTranscoder, TranscodeJob) {
            let ffmpeg = write_fake_binary(dir, "fake-ffmpeg", ffmpeg_body);
            // Probe fails fast so duration falls back to unknown.
            let ffprobe = write_fake_binary(dir, "fake-ffprobe", "#!/bin/sh\nexit 1\n");

            let input = dir.join("input.mkv");
            std::fs::write(&input, b"not really media").unwrap();

            let config = TranscoderConfig {
                ffmpeg_path: ffmpeg,
                ffprobe_path: ffprobe,
                ..TranscoderConfig::default()
            };
            let job = TranscodeJob {
                task_id: "t1".to_string(),
                input_path: input,
                output_path: dir.join("output.mkv"),
            };
            (FfmpegTranscoder::new(config), job)
        }

        async fn progress() -> TaskReporter {
            let messenger = Arc::new(MockMessenger::new());
            let reporter = ProgressReporter::new(messenger, Duration::from_secs(5));
            reporter.begin(&Task::from_feed("Ep01", "http://x/1")).await
        }

        #[tokio::test]
        async fn test_cancel_kills_subprocess_within_grace_period() {
            let dir = TempDir::new().unwrap();
            let (transcoder, job) = harness(
                dir.path(),
                "#!/bin/sh\nprintf 'time=00:00:01.00\\n' >&2\nexec sleep 30\n",
            );
            let progress = progress().await;

            let cancel = CancelScope::new();
            let canceller = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                canceller.request();
            });

            let result = timeout(
                Duration::from_secs(5),
                transcoder.transcode(job.clone(), &cancel, &progress),
            )
            .await
            .expect("cancellation must take effect within the grace period");

            assert!(matches!(result, Err(TranscodeError::Cancelled)));
            assert!(!job.output_path.exists());
        }

        #[tokio::test]
        async fn test_nonzero_exit_is_hard_failure() {
            let dir = TempDir::new().unwrap();
            let (transcoder, job) = harness(
                dir.path(),
                "#!/bin/sh\necho 'Error: boom' >&2\nexit 1\n",
            );
            let progress = progress().await;

            let err = transcoder
                .transcode(job, &CancelScope::new(), &progress)
                .await
                .unwrap_err();

            match err {
                TranscodeError::ExitStatus { code, stderr } => {
                    assert_eq!(code, Some(1));
                    assert!(stderr.contains("boom"));
                }
                other => panic!("expected ExitStatus, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_successful_run_requires_output_file() {
            let dir = TempDir::new().unwrap();
            // Exits zero without writing the output file.
            let (transcoder, job) = harness(dir.path(), "#!/bin/sh\nexit 0\n");
            let progress = progress().await;

            let err = transcoder
                .transcode(job, &CancelScope::new(), &progress)
                .await
                .unwrap_err();
            assert!(matches!(err, TranscodeError::ExitStatus { .. }));
        }
    }
}
