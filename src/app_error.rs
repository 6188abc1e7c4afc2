use std::fmt;

use tracing::error;

/// Top level application errors.
///
/// Each variant knows how to render itself for the operator; `disp()`
/// also emits a `tracing::error!` so the failure is visible in
/// `--debug` logs even after the terminal has been restored.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Initial `ping()` against the daemon failed.
    DockerConnect,
    /// An action (`restart`/`stop`/`logs`/`exec`) returned a non-zero exit code.
    ActionNonZero { action: &'static str, code: i32, stderr: String },
    /// Spawning or waiting on an action's child process failed.
    ActionException { action: &'static str, message: String },
    /// Unhandled error reached the main loop.
    Fatal(String),
    /// The terminal could not be put into, or taken out of, raw/alternate-screen mode.
    Terminal,
}

impl AppError {
    /// Log the error and return its display string, for callers that
    /// need both the side-effect and the message in one place.
    pub fn disp(&self) -> String {
        let s = self.to_string();
        error!("{s}");
        s
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DockerConnect => write!(f, "Error: Failed to connect to Docker. Is it running?"),
            Self::ActionNonZero { action, code, stderr } => {
                write!(f, "Command failed: {action} (exit code {code})\n{stderr}")
            }
            Self::ActionException { action, message } => {
                write!(f, "Command failed: {action}\n{message}")
            }
            Self::Fatal(message) => write!(f, "Fatal error: {message}"),
            Self::Terminal => write!(f, "Fatal error: unable to control the terminal"),
        }
    }
}

impl std::error::Error for AppError {}
