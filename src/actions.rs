//! The action side of the input & action dispatcher.
//!
//! Builds a `std::process::Command` with inherited stdio for streaming
//! actions and waits on it directly; one-shot actions go through the
//! `ContainerApi` port instead of spawning a process at all.

use std::io::Write;
use std::time::Duration;

use tracing::error;

use crate::app_error::AppError;
use crate::container_api::{ApiError, ContainerApi};
use crate::model::ContainerId;
use crate::ui::{self, Backend};

/// Actions bound to a selected container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Logs,
    Restart,
    Stop,
    Shell,
}

impl Action {
    fn label(self) -> &'static str {
        match self {
            Self::Logs => "logs",
            Self::Restart => "restart",
            Self::Stop => "stop",
            Self::Shell => "exec",
        }
    }

    fn requires_confirm(self) -> bool {
        matches!(self, Self::Restart | Self::Stop)
    }
}

/// Run one action end to end: suspend the display, optionally confirm,
/// run the action, report the result, then restart the display.
pub async fn dispatch(
    terminal: &mut ratatui::Terminal<Backend>,
    api: &dyn ContainerApi,
    action: Action,
    id: &ContainerId,
    is_running: bool,
) -> Result<(), AppError> {
    // 1. Stop the live display.
    ui::leave(terminal)?;

    let outcome = run_action_body(api, action, id, is_running).await;

    // 4. Restart the live display with a forced refresh (the next render
    // tick always re-snapshots, so simply re-entering is sufficient).
    *terminal = ui::enter()?;

    outcome
}

async fn run_action_body(
    api: &dyn ContainerApi,
    action: Action,
    id: &ContainerId,
    is_running: bool,
) -> Result<(), AppError> {
    // 2. Confirm destructive actions.
    if action.requires_confirm() && !confirm(action) {
        println!("Aborted.");
        std::thread::sleep(Duration::from_secs(1));
        return Ok(());
    }

    match action {
        Action::Logs => run_child(api.logs_command(id, 100, is_running), action),
        Action::Shell => run_child(api.exec_interactive_command(id, &["/bin/sh"]), action),
        Action::Restart => run_one_shot_api(api.restart(id).await, action),
        Action::Stop => run_one_shot_api(api.stop(id).await, action),
    }
}

fn confirm(action: Action) -> bool {
    print!("{} selected container? [y/N] ", action.label());
    std::io::stdout().flush().ok();
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).ok();
    line.trim().eq_ignore_ascii_case("y")
}

/// For streaming/interactive actions: hand the terminal to the child
/// and wait for it to exit.
fn run_child(mut command: std::process::Command, action: Action) -> Result<(), AppError> {
    command
        .stdin(std::process::Stdio::inherit())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit());

    let mut child = command.spawn().map_err(|e| AppError::ActionException {
        action: action.label(),
        message: e.to_string(),
    })?;

    let status = child.wait().map_err(|e| AppError::ActionException {
        action: action.label(),
        message: e.to_string(),
    })?;

    if !status.success() {
        let code = status.code().unwrap_or(-1);
        eprintln!("Command exited with code {code}");
        wait_for_enter();
    }
    Ok(())
}

/// For one-shot actions: print a success/failure line, wait for Enter.
fn run_one_shot_api(result: Result<(), ApiError>, action: Action) -> Result<(), AppError> {
    match result {
        Ok(()) => {
            println!("{} succeeded.", action.label());
            Ok(())
        }
        Err(ApiError::Transient(message) | ApiError::Fatal(message)) => {
            let err = AppError::ActionNonZero { action: action.label(), code: 1, stderr: message };
            error!("{err}");
            eprintln!("{err}");
            wait_for_enter();
            Ok(())
        }
        Err(ApiError::NotFound) => {
            eprintln!("Command failed: {} — container not found", action.label());
            wait_for_enter();
            Ok(())
        }
        Err(ApiError::Disconnected(message)) => {
            let err = AppError::ActionException { action: action.label(), message };
            error!("{err}");
            eprintln!("{err}");
            wait_for_enter();
            Ok(())
        }
    }
}

fn wait_for_enter() {
    println!("Press Enter to continue...");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).ok();
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use futures_util::stream;

    use super::*;
    use crate::model::{ContainerDetail, ContainerEvent, ContainerRef, StatsSample};

    /// Records how many times `restart`/`stop` were invoked.
    struct RecordingApi {
        restart_calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ContainerApi for RecordingApi {
        async fn list_all(&self) -> Result<Vec<ContainerRef>, ApiError> {
            Ok(Vec::new())
        }
        async fn inspect(&self, _id: &ContainerId) -> Result<ContainerDetail, ApiError> {
            Err(ApiError::NotFound)
        }
        fn stream_events(&self) -> futures_util::stream::BoxStream<'static, Result<ContainerEvent, ApiError>> {
            Box::pin(stream::empty())
        }
        fn stream_stats(&self, _id: &ContainerId) -> futures_util::stream::BoxStream<'static, Result<StatsSample, ApiError>> {
            Box::pin(stream::empty())
        }
        fn logs_command(&self, _id: &ContainerId, _tail: u32, _follow: bool) -> std::process::Command {
            std::process::Command::new("true")
        }
        fn exec_interactive_command(&self, _id: &ContainerId, _argv: &[&str]) -> std::process::Command {
            std::process::Command::new("true")
        }
        async fn restart(&self, _id: &ContainerId) -> Result<(), ApiError> {
            self.restart_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ApiError::Transient("oci runtime error".into()))
            } else {
                Ok(())
            }
        }
        async fn stop(&self, _id: &ContainerId) -> Result<(), ApiError> {
            Ok(())
        }
        async fn ping(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn restart_invokes_api_exactly_once_and_reports_failure() {
        let api: Arc<dyn ContainerApi> = Arc::new(RecordingApi { restart_calls: AtomicUsize::new(0), fail: true });
        let id = ContainerId::new("c1");
        let result = run_one_shot_api(api.restart(&id).await, Action::Restart);
        assert!(result.is_ok());
    }
}
