//! Encode plans and the FFmpeg runner.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::filters::{FilterChain, FilterGraph, FilterSpec};
use crate::progress::FfmpegProgress;

/// One `-i` input together with the options that must precede it.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInput {
    options: Vec<String>,
    path: PathBuf,
}

impl MediaInput {
    /// Plain file input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            options: Vec::new(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Input read through the concat demuxer from a list file.
    pub fn concat_list(list_path: impl AsRef<Path>) -> Self {
        Self::new(list_path)
            .option("-f", "concat")
            .option("-safe", "0")
    }

    /// Single still image repeated for as long as the output needs.
    pub fn looped_image(path: impl AsRef<Path>) -> Self {
        Self::new(path).option("-loop", "1")
    }

    /// Numbered image sequence read at `frames / seconds` frames per second.
    ///
    /// The rate is passed as a ratio so the image timeline spans exactly
    /// `seconds`, however long it is.
    pub fn image_sequence(pattern: impl AsRef<Path>, frames: usize, seconds: f64) -> Self {
        Self::new(pattern).option("-framerate", format!("{}/{}", frames, seconds))
    }

    /// Add an input option (before `-i`).
    pub fn option(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(flag.into());
        self.options.push(value.into());
        self
    }

    /// Loop the input forever; the output bound decides when to stop.
    pub fn loop_forever(self) -> Self {
        let mut looped = Self::new(&self.path).option("-stream_loop", "-1");
        looped.options.extend(self.options);
        looped
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }
}

/// A complete, ordered FFmpeg invocation.
///
/// Built once per job and handed by value to [`FfmpegRunner::run`].
#[derive(Debug, Clone)]
pub struct EncodePlan {
    /// Inputs in `-i` order; stream indices refer to this order
    inputs: Vec<MediaInput>,
    /// Filter expression, if any
    filter: Option<FilterSpec>,
    /// Output arguments (maps, codecs, bounds)
    output_args: Vec<String>,
    /// Output file path
    output: PathBuf,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl EncodePlan {
    /// Create a new plan writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            filter: None,
            output_args: Vec::new(),
            output: output.as_ref().to_path_buf(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Append an input.
    pub fn input(mut self, input: MediaInput) -> Self {
        self.inputs.push(input);
        self
    }

    /// Add an output argument.
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

    /// Set a single-chain video filter (`-vf`).
    pub fn video_filter(mut self, chain: FilterChain) -> Self {
        self.filter = Some(FilterSpec::Video(chain));
        self
    }

    /// Set a filter graph (`-filter_complex`).
    pub fn filter_complex(mut self, graph: FilterGraph) -> Self {
        self.filter = Some(FilterSpec::Complex(graph));
        self
    }

    /// Select an output stream, either an input specifier (`0:v`) or a graph label.
    pub fn map(self, stream: impl AsRef<str>) -> Self {
        let stream = stream.as_ref();
        let spec = if is_stream_specifier(stream) {
            stream.to_string()
        } else {
            format!("[{}]", stream)
        };
        self.output_arg("-map").output_arg(spec)
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

    /// Set encoder tuning.
    pub fn tune(self, tune: impl Into<String>) -> Self {
        self.output_arg("-tune").output_arg(tune)
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Set output pixel format.
    pub fn pixel_format(self, format: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    /// Set output frame rate.
    pub fn frame_rate(self, fps: u32) -> Self {
        self.output_arg("-r").output_arg(fps.to_string())
    }

    /// End the output with the shortest stream.
    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Hard cap on output duration.
    pub fn max_duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Extract single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-frames:v").output_arg("1")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn inputs(&self) -> &[MediaInput] {
        &self.inputs
    }

    pub fn filter(&self) -> Option<&FilterSpec> {
        self.filter.as_ref()
    }

    /// Rendered filter expression, if the plan has one.
    pub fn filter_expression(&self) -> Option<String> {
        self.filter.as_ref().map(FilterSpec::render)
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress goes to stdout so stderr carries only diagnostics
        args.push("-nostats".to_string());
        args.push("-progress".to_string());
        args.push("pipe:1".to_string());

        for input in &self.inputs {
            args.extend(input.options.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        if let Some(filter) = &self.filter {
            args.push(filter.flag().to_string());
            args.push(filter.render());
        }

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// `0:v`, `1:a:0` and similar refer to input streams rather than graph labels.
pub(crate) fn is_stream_specifier(stream: &str) -> bool {
    stream
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false)
}

/// Result of a successful encoder run.
#[derive(Debug, Clone)]
pub struct EncodeOutcome {
    /// Produced file
    pub output: PathBuf,
    /// Captured stderr
    pub diagnostic: String,
    /// Wall-clock run time
    pub elapsed: Duration,
}

/// Runner for encode plans with diagnostics capture, cancellation and timeout.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    /// Engine binary, a name on PATH or an absolute path
    binary: PathBuf,
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Timeout
    timeout: Option<Duration>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a new runner using `ffmpeg` from PATH.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            cancel_rx: None,
            timeout: None,
        }
    }

    /// Use a specific engine binary.
    pub fn with_binary(mut self, binary: impl AsRef<Path>) -> Self {
        self.binary = binary.as_ref().to_path_buf();
        self
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve the engine binary.
    pub fn locate(&self) -> MediaResult<PathBuf> {
        which::which(&self.binary).map_err(|_| MediaError::FfmpegNotFound(self.binary.clone()))
    }

    /// Run an encode plan.
    pub async fn run(&self, plan: EncodePlan) -> MediaResult<EncodeOutcome> {
        self.run_with_progress(plan, |_| {}).await
    }

    /// Run an encode plan with progress callback.
    pub async fn run_with_progress<F>(
        &self,
        plan: EncodePlan,
        progress_callback: F,
    ) -> MediaResult<EncodeOutcome>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        let binary = self.locate()?;

        let args = plan.build_args();
        debug!("Running FFmpeg: {} {}", binary.display(), args.join(" "));

        let start = Instant::now();
        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr not captured"))?;

        let progress_handle = tokio::spawn(async move {
            let mut reader = BufReader::new(stdout).lines();
            let mut current_progress = FfmpegProgress::default();

            while let Ok(Some(line)) = reader.next_line().await {
                if let Some(progress) = parse_progress_line(&line, &mut current_progress) {
                    progress_callback(progress);
                }
            }
        });

        let diagnostic_handle = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = BufReader::new(stderr).read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).trim().to_string()
        });

        let status = self.wait_for_completion(&mut child).await;

        // Pipes close once the process is gone, so both readers finish
        let diagnostic = diagnostic_handle.await.unwrap_or_default();
        let _ = progress_handle.await;

        let status = status?;
        let elapsed = start.elapsed();

        if !status.success() {
            return Err(MediaError::encode_failed(
                "FFmpeg exited with non-zero status",
                diagnostic,
                status.code(),
            ));
        }

        if tokio::fs::metadata(plan.output()).await.is_err() {
            return Err(MediaError::encode_failed(
                "output not produced",
                diagnostic,
                status.code(),
            ));
        }

        info!(
            output = %plan.output().display(),
            elapsed_ms = elapsed.as_millis() as u64,
            "FFmpeg finished"
        );

        Ok(EncodeOutcome {
            output: plan.output().to_path_buf(),
            diagnostic,
            elapsed,
        })
    }

    /// Wait for child process with cancellation and timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let cancelled = wait_for_cancel(self.cancel_rx.clone());
        let timeout = self.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            status = child.wait() => Ok(status?),
            _ = cancelled => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
            _ = deadline => {
                let secs = timeout.map(|t| t.as_secs()).unwrap_or_default();
                warn!("FFmpeg timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(secs))
            }
        }
    }
}

/// Resolves once the cancel flag turns true; never resolves without a receiver.
async fn wait_for_cancel(cancel_rx: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = cancel_rx else {
        return std::future::pending().await;
    };

    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender dropped without cancelling
            return std::future::pending().await;
        }
    }
}

/// Parse a progress line from FFmpeg's -progress output.
fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let line = line.trim();

    if let Some((key, value)) = line.split_once('=') {
        match key {
            "out_time_ms" | "out_time_us" => {
                // Both keys carry microseconds in current FFmpeg builds
                if let Ok(us) = value.parse::<i64>() {
                    current.out_time_ms = us / 1000;
                }
            }
            "out_time" => {
                current.out_time = value.to_string();
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    current.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    current.fps = fps;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    current.speed = speed;
                }
            }
            "progress" => {
                if value == "end" {
                    current.is_complete = true;
                }
                return Some(current.clone());
            }
            _ => {}
        }
    }

    None
}
