//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use scrollcast_models::EncodingConfig;

use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_line, FfmpegProgress};

/// Number of diagnostic stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 32;

/// Source marker for reading from standard input.
const STDIN_SOURCE: &str = "-";

/// One `-i` input with the options that precede it.
#[derive(Debug, Clone)]
struct FfmpegInput {
    args: Vec<String>,
    source: String,
}

impl FfmpegInput {
    fn new(source: impl Into<String>) -> Self {
        Self {
            args: Vec::new(),
            source: source.into(),
        }
    }
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Inputs in `-i` order; index N is `[N:v]` in filter graphs
    inputs: Vec<FfmpegInput>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after the last -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command with a single file input.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self::with_source(input.as_ref().to_string_lossy(), output)
    }

    /// Create a command whose first input is read from stdin.
    pub fn from_stdin(output: impl AsRef<Path>) -> Self {
        Self::with_source(STDIN_SOURCE, output)
    }

    fn with_source(source: impl Into<String>, output: impl AsRef<Path>) -> Self {
        Self {
            inputs: vec![FfmpegInput::new(source)],
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Append another file input.
    pub fn input(mut self, input: impl AsRef<Path>) -> Self {
        self.inputs
            .push(FfmpegInput::new(input.as_ref().to_string_lossy()));
        self
    }

    /// Add an argument before the most recently added input's `-i`.
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        if let Some(input) = self.inputs.last_mut() {
            input.args.push(arg.into());
        }
        self
    }

    /// Add multiple arguments before the most recently added input's `-i`.
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(input) = self.inputs.last_mut() {
            input.args.extend(args.into_iter().map(Into::into));
        }
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set input format for the most recent input.
    pub fn format(self, format: impl Into<String>) -> Self {
        self.input_arg("-f").input_arg(format)
    }

    /// Set input frame rate for the most recent input.
    pub fn frame_rate(self, fps: u32) -> Self {
        self.input_arg("-framerate").input_arg(fps.to_string())
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Select a stream or filter label for the output.
    pub fn map(self, stream: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(stream)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Set output pixel format.
    pub fn pixel_format(self, format: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    /// Apply codec, preset, CRF and pixel format from an encoding config.
    pub fn encoding(self, encoding: &EncodingConfig) -> Self {
        self.output_args(encoding.to_video_args())
    }

    /// Move the MP4 index to the front for progressive playback.
    pub fn faststart(self) -> Self {
        self.output_arg("-movflags").output_arg("+faststart")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Output file path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Whether the first input is read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.inputs.iter().any(|i| i.source == STDIN_SOURCE)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-hide_banner".to_string());
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands against an explicitly configured binary.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    /// Path to the ffmpeg executable
    binary: PathBuf,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Create a runner for the given ffmpeg executable.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout_secs: None,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Path of the ffmpeg executable this runner invokes.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command with progress callback.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &FfmpegCommand,
        progress_callback: F,
    ) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        let (mut child, stderr) = self.spawn(cmd, Stdio::null())?;
        let stderr_task = tokio::spawn(drain_stderr(stderr, progress_callback));

        let waited = self.wait_for_exit(&mut child).await;
        let tail = stderr_task.await.unwrap_or_default();

        check_status(waited?, tail)
    }

    /// Spawn an FFmpeg command that reads its first input from stdin.
    ///
    /// The returned pipe must be finished with [`FfmpegPipe::finish`] to
    /// flush the encoder and observe its exit status.
    pub fn spawn_piped(&self, cmd: &FfmpegCommand) -> MediaResult<FfmpegPipe> {
        if !cmd.reads_stdin() {
            return Err(MediaError::internal(
                "piped FFmpeg command has no stdin input",
            ));
        }

        let (mut child, stderr) = self.spawn(cmd, Stdio::piped())?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stdin not captured"))?;
        let stderr_task = tokio::spawn(drain_stderr(stderr, |_| {}));

        Ok(FfmpegPipe {
            child,
            stdin: Some(stdin),
            stderr_task: Some(stderr_task),
            timeout_secs: self.timeout_secs,
            bytes_written: 0,
        })
    }

    fn spawn(&self, cmd: &FfmpegCommand, stdin: Stdio) -> MediaResult<(Child, ChildStderr)> {
        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(stdin)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::FfmpegNotFound
                } else {
                    MediaError::ffmpeg_failed(format!("Failed to spawn FFmpeg: {}", e), None, None)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr not captured"))?;

        Ok((child, stderr))
    }

    async fn wait_for_exit(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        wait_with_timeout(child, self.timeout_secs).await
    }
}

/// A running FFmpeg process fed through stdin.
pub struct FfmpegPipe {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_task: Option<JoinHandle<String>>,
    timeout_secs: Option<u64>,
    bytes_written: u64,
}

impl FfmpegPipe {
    /// Write one chunk (e.g. an encoded frame) to FFmpeg.
    pub async fn write(&mut self, data: &[u8]) -> MediaResult<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| MediaError::internal("FFmpeg stdin already closed"))?;

        let written = stdin.write_all(data).await;
        if let Err(e) = written {
            // FFmpeg exited early; report its own diagnostics instead of EPIPE
            self.stdin = None;
            let status = self.child.wait().await.ok();
            let tail = self.take_tail().await;
            return Err(MediaError::ffmpeg_failed(
                format!("FFmpeg stopped accepting input: {}", e),
                Some(tail),
                status.and_then(|s| s.code()),
            ));
        }

        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Total bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Close stdin and wait for FFmpeg to finish encoding.
    pub async fn finish(mut self) -> MediaResult<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.shutdown().await.ok();
        }

        let waited = wait_with_timeout(&mut self.child, self.timeout_secs).await;
        let tail = self.take_tail().await;

        check_status(waited?, tail)
    }

    async fn take_tail(&mut self) -> String {
        match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        }
    }
}

async fn wait_with_timeout(child: &mut Child, timeout_secs: Option<u64>) -> MediaResult<ExitStatus> {
    let Some(secs) = timeout_secs else {
        return Ok(child.wait().await?);
    };

    let waited = tokio::time::timeout(Duration::from_secs(secs), child.wait()).await;
    match waited {
        Ok(status) => Ok(status?),
        Err(_) => {
            warn!("FFmpeg timed out after {} seconds, killing process", secs);
            let _ = child.kill().await;
            Err(MediaError::Timeout(secs))
        }
    }
}

fn check_status(status: ExitStatus, stderr_tail: String) -> MediaResult<()> {
    if status.success() {
        Ok(())
    } else {
        Err(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some(stderr_tail),
            status.code(),
        ))
    }
}

/// Read stderr to the end, forwarding progress and keeping the last diagnostic lines.
async fn drain_stderr<F>(stderr: ChildStderr, progress_callback: F) -> String
where
    F: Fn(FfmpegProgress) + Send + 'static,
{
    let mut reader = BufReader::new(stderr).lines();
    let mut progress = FfmpegProgress::default();
    let mut tail = StderrTail::new(STDERR_TAIL_LINES);

    while let Ok(Some(line)) = reader.next_line().await {
        if is_progress_line(&line) {
            if let Some(snapshot) = progress.apply_line(&line) {
                progress_callback(snapshot);
            }
        } else {
            tail.push(line);
        }
    }

    tail.into_string()
}

/// Bounded buffer of the most recent diagnostic lines.
#[derive(Debug)]
struct StderrTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl StderrTail {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, line: String) {
        if line.trim().is_empty() {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn into_string(self) -> String {
        Vec::from(self.lines).join("\n")
    }
}

/// Resolve the ffmpeg executable: explicit override first, then `PATH`.
pub fn resolve_ffmpeg(explicit: Option<&Path>) -> MediaResult<PathBuf> {
    resolve_binary(explicit, "ffmpeg").ok_or(MediaError::FfmpegNotFound)
}

/// Resolve the ffprobe executable: explicit override first, then `PATH`.
pub fn resolve_ffprobe(explicit: Option<&Path>) -> MediaResult<PathBuf> {
    resolve_binary(explicit, "ffprobe").ok_or(MediaError::FfprobeNotFound)
}

fn resolve_binary(explicit: Option<&Path>, name: &str) -> Option<PathBuf> {
    match explicit {
        Some(path) => which::which(path).ok(),
        None => which::which(name).ok(),
    }
}
