use super::{Level, LogError};
use crate::rotate::RollingFile;
use chrono::{Local, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::Dispatch;
use tracing_subscriber::{filter::LevelFilter, fmt as layer_fmt, layer::SubscriberExt};

pub const DEFAULT_LOG_PATH: &str = "runtime/go.log";
pub const DEFAULT_SUFFIX: &str = ".%Y%m%d";
pub const FATAL_EXIT_CODE: i32 = 1;
pub const CONSOLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: Level,
    pub path: PathBuf,
    pub suffix: String,
    pub rotation_hours: u64,
    pub rotation_count: usize,
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            path: PathBuf::from(DEFAULT_LOG_PATH),
            suffix: DEFAULT_SUFFIX.to_string(),
            rotation_hours: 24,
            rotation_count: 3,
            console: true,
        }
    }
}

impl LogConfig {
    pub fn with_level(level: &str) -> Self {
        Self {
            level: Level::parse(level),
            ..Self::default()
        }
    }
}

type Console = Mutex<Box<dyn Write + Send>>;

/// Leveled logger writing every accepted message twice: once through
/// `tracing` and once as a timestamped line on the console.
pub struct Logger {
    level: Level,
    sink: Option<Dispatch>,
    console: Option<Console>,
    terminate: fn(i32) -> !,
}

impl Logger {
    /// A logger without a file sink. Events go to whatever tracing
    /// subscriber is in scope.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            sink: None,
            console: Some(Mutex::new(Box::new(io::stdout()))),
            terminate: std::process::exit,
        }
    }

    /// A logger writing JSON lines into a rotating file.
    pub fn build(config: &LogConfig) -> Result<Self, LogError> {
        let period = i64::try_from(config.rotation_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .ok_or(LogError::InvalidRotation)?;
        let file = RollingFile::new(&config.path, &config.suffix, period, config.rotation_count)?;

        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::from(config.level))
            .with(
                layer_fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(Mutex::new(file)),
            );

        let mut logger = Self::new(config.level);
        logger.sink = Some(Dispatch::new(subscriber));
        if !config.console {
            logger.console = None;
        }
        Ok(logger)
    }

    pub fn with_console(mut self, console: impl Write + Send + 'static) -> Self {
        self.console = Some(Mutex::new(Box::new(console)));
        self
    }

    pub fn without_console(mut self) -> Self {
        self.console = None;
        self
    }

    pub fn with_terminate(mut self, terminate: fn(i32) -> !) -> Self {
        self.terminate = terminate;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn dispatch(&self) -> Option<&Dispatch> {
        self.sink.as_ref()
    }

    pub fn enabled(&self, severity: Level) -> bool {
        self.level.allows(severity)
    }

    /// Logs at fatal severity, then terminates the process.
    ///
    /// Termination never depends on the configured level.
    pub fn panic(&self, args: fmt::Arguments<'_>) -> ! {
        if self.enabled(Level::Error) {
            let msg = format!("[Panic] {args}");
            self.forward(|| tracing::error!(fatal = true, "{msg}"));
            self.echo(&msg);
        }
        (self.terminate)(FATAL_EXIT_CODE)
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args);
    }

    pub fn warning(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warning, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    fn emit(&self, severity: Level, args: fmt::Arguments<'_>) {
        if !self.enabled(severity) {
            return;
        }
        let msg = format!("{} {args}", severity.tag());
        self.forward(|| match severity {
            Level::Error => tracing::error!("{msg}"),
            Level::Warning => tracing::warn!("{msg}"),
            Level::Info => tracing::info!("{msg}"),
            Level::Debug => tracing::debug!("{msg}"),
        });
        self.echo(&msg);
    }

    fn forward(&self, event: impl FnOnce()) {
        match &self.sink {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, event),
            None => event(),
        }
    }

    fn echo(&self, msg: &str) {
        let Some(console) = &self.console else {
            return;
        };
        let line = format!("{} {msg}\n", Local::now().format(CONSOLE_TIME_FORMAT));
        let mut out = console.lock().unwrap_or_else(PoisonError::into_inner);
        // Console failures must not take the caller down with them.
        let _ = out.write_all(line.as_bytes());
        let _ = out.flush();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("file_sink", &self.sink.is_some())
            .field("console", &self.console.is_some())
            .finish()
    }
}
