//! Abstract interface over the daemon.
//!
//! The core never talks to `bollard` directly; every daemon
//! interaction goes through this trait so the monitor, dispatcher, and
//! their tests can run against a fake implementation.

mod bollard_api;

pub use bollard_api::BollardApi;

use std::fmt;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::model::{ContainerDetail, ContainerEvent, ContainerId, ContainerRef, StatsSample};

/// The failure kinds every port method can return.
#[derive(Debug, Clone)]
pub enum ApiError {
    NotFound,
    Disconnected(String),
    Transient(String),
    Fatal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Disconnected(m) => write!(f, "disconnected: {m}"),
            Self::Transient(m) => write!(f, "transient error: {m}"),
            Self::Fatal(m) => write!(f, "fatal error: {m}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Capabilities the core consumes from a Docker-compatible daemon.
#[async_trait]
pub trait ContainerApi: Send + Sync {
    async fn list_all(&self) -> Result<Vec<ContainerRef>, ApiError>;
    async fn inspect(&self, id: &ContainerId) -> Result<ContainerDetail, ApiError>;
    fn stream_events(&self) -> BoxStream<'static, Result<ContainerEvent, ApiError>>;
    fn stream_stats(&self, id: &ContainerId) -> BoxStream<'static, Result<StatsSample, ApiError>>;

    /// Build (but do not run) the child command for `logs`; `follow` streams,
    /// otherwise the last `tail` lines are printed and the command exits.
    fn logs_command(&self, id: &ContainerId, tail: u32, follow: bool) -> std::process::Command;

    /// Build (but do not run) an interactive shell command attached to the container's tty.
    fn exec_interactive_command(&self, id: &ContainerId, argv: &[&str]) -> std::process::Command;

    async fn restart(&self, id: &ContainerId) -> Result<(), ApiError>;
    async fn stop(&self, id: &ContainerId) -> Result<(), ApiError>;
    async fn ping(&self) -> Result<(), ApiError>;
}
