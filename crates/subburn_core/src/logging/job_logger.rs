//! Per-export log file.
//!
//! A [`JobLogger`] writes one file per export and mirrors each formatted line
//! to an optional callback (a progress console, a UI pane). In compact mode
//! progress lines are thinned to `progress_step` and encoder output is only
//! kept in the tail buffer, which is dumped when an export fails.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

struct LogState {
    /// `None` once the logger is closed.
    file: Option<BufWriter<File>>,
    tail: VecDeque<String>,
    last_progress: Option<u32>,
}

/// Per-export logger with dual output (file + callback).
pub struct JobLogger {
    job_name: String,
    log_path: PathBuf,
    config: LogConfig,
    callback: Option<LogCallback>,
    state: Mutex<LogState>,
}

impl JobLogger {
    /// Create `<log_dir>/<job_name>.log`, truncating an existing file.
    pub fn new(
        job_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let job_name = job_name.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&job_name)));
        let file = BufWriter::new(File::create(&log_path)?);

        Ok(Self {
            job_name,
            log_path,
            state: Mutex::new(LogState {
                file: Some(file),
                tail: VecDeque::with_capacity(config.error_tail),
                last_progress: None,
            }),
            config,
            callback,
        })
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Emit `message` unless `level` is below the configured minimum.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level >= self.config.level {
            self.emit(&mut self.state.lock(), message);
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    pub fn phase(&self, name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(name));
    }

    pub fn section(&self, name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Section.format(name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Log `Progress: N%`, returning whether the line was written.
    ///
    /// In compact mode a value is written only when it enters a new
    /// `progress_step` bucket or reaches 100.
    pub fn progress(&self, percent: u32) -> bool {
        let mut state = self.state.lock();
        if self.config.compact {
            let step = self.config.progress_step.max(1);
            let same_bucket = state
                .last_progress
                .is_some_and(|last| percent / step <= last / step);
            if same_bucket && percent < 100 {
                return false;
            }
            state.last_progress = Some(percent);
        }

        if LogLevel::Info >= self.config.level {
            self.emit(&mut state, &format!("Progress: {}%", percent));
        }
        true
    }

    /// Record one line of external tool output.
    ///
    /// The line always enters the tail buffer (bounded by `error_tail`) and
    /// is written directly only outside compact mode.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        let mut state = self.state.lock();
        if self.config.error_tail > 0 {
            if state.tail.len() >= self.config.error_tail {
                state.tail.pop_front();
            }
            state.tail.push_back(line.to_string());
        }

        if !self.config.compact {
            let stream = if is_stderr { "[stderr] " } else { "" };
            self.emit(&mut state, &format!("{}{}", stream, line));
        }
    }

    /// Write the buffered tail under a `[header/tail]` marker.
    pub fn show_tail(&self, header: &str) {
        let mut state = self.state.lock();
        if state.tail.is_empty() {
            return;
        }
        let lines: Vec<String> = state.tail.iter().cloned().collect();
        self.emit(&mut state, &format!("[{}/tail]", header));
        for line in &lines {
            self.emit(&mut state, line);
        }
    }

    pub fn clear_tail(&self) {
        self.state.lock().tail.clear();
    }

    pub fn get_tail(&self) -> Vec<String> {
        self.state.lock().tail.iter().cloned().collect()
    }

    pub fn flush(&self) {
        if let Some(file) = self.state.lock().file.as_mut() {
            let _ = file.flush();
        }
    }

    /// Flush and drop the file; the callback keeps receiving lines.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if let Some(mut file) = state.file.take() {
            let _ = file.flush();
        }
    }

    fn emit(&self, state: &mut LogState, message: &str) {
        let line = if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        };

        if let Some(file) = state.file.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
        if let Some(callback) = &self.callback {
            callback(&line);
        }
    }
}

impl Drop for JobLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Replace path separators, reserved punctuation and control characters.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Builder for a [`JobLogger`] with non-default settings.
pub struct JobLoggerBuilder {
    job_name: String,
    log_dir: PathBuf,
    config: LogConfig,
    callback: Option<LogCallback>,
}

impl JobLoggerBuilder {
    pub fn new(job_name: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            job_name: job_name.into(),
            log_dir: log_dir.into(),
            config: LogConfig::default(),
            callback: None,
        }
    }

    pub fn config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn callback(mut self, callback: LogCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn build(self) -> std::io::Result<JobLogger> {
        JobLogger::new(self.job_name, self.log_dir, self.config, self.callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn writes_to_sanitized_file() {
        let dir = tempdir().unwrap();
        let logger = JobLogger::new("clip: final?", dir.path(), LogConfig::default(), None).unwrap();

        logger.info("Test message");
        logger.flush();

        assert!(logger.log_path().ends_with("clip_ final_.log"));
        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("Test message"));
    }

    #[test]
    fn forwards_lines_to_callback() {
        let dir = tempdir().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);

        let logger = JobLoggerBuilder::new("job", dir.path())
            .callback(Box::new(move |_line| {
                seen.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
            .unwrap();

        logger.info("one");
        logger.warn("two");
        logger.debug("filtered by level");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn compact_mode_filters_progress() {
        let dir = tempdir().unwrap();
        let logger = JobLogger::new("job", dir.path(), LogConfig::default(), None).unwrap();

        assert!(logger.progress(0));
        assert!(!logger.progress(5));
        assert!(!logger.progress(19));
        assert!(logger.progress(20));
        assert!(!logger.progress(25));
        assert!(logger.progress(40));
        assert!(logger.progress(100));
    }

    #[test]
    fn tail_buffer_maintains_limit() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            error_tail: 5,
            ..LogConfig::default()
        };
        let logger = JobLogger::new("job", dir.path(), config, None).unwrap();

        for i in 0..10 {
            logger.output_line(&format!("Line {}", i), true);
        }

        let tail = logger.get_tail();
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0], "Line 5");
        assert_eq!(tail[4], "Line 9");
    }

    #[test]
    fn show_tail_writes_buffer_to_log() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            show_timestamps: false,
            ..LogConfig::default()
        };
        let logger = JobLogger::new("job", dir.path(), config, None).unwrap();

        logger.output_line("Conversion failed!", true);
        logger.show_tail("encoder");
        logger.flush();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert_eq!(content, "[encoder/tail]\nConversion failed!\n");
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }
}
