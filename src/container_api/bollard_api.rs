use std::collections::HashMap;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    InspectContainerOptions, ListContainersOptions, RestartContainerOptions, StatsOptions,
    StopContainerOptions,
};
use bollard::system::EventsOptions;
use futures_util::stream::{BoxStream, StreamExt};
use jiff::Timestamp;

use super::{ApiError, ContainerApi};
use crate::model::{ContainerDetail, ContainerEvent, ContainerId, ContainerRef, PortBinding, StatsSample};

/// `ContainerApi` backed by a live `bollard::Docker` connection.
///
/// Keeps every `bollard` call behind the `ContainerApi` port so the
/// monitor and dispatcher never import `bollard` directly.
pub struct BollardApi {
    docker: Docker,
}

impl BollardApi {
    /// Connect using the daemon's standard discovery (`DOCKER_HOST`, or
    /// the platform default socket).
    pub fn connect_with_defaults() -> Result<Self, ApiError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| ApiError::Disconnected(e.to_string()))?;
        Ok(Self { docker })
    }
}

fn map_bollard_err(err: bollard::errors::Error) -> ApiError {
    if let bollard::errors::Error::DockerResponseServerError { status_code: 404, .. } = err {
        ApiError::NotFound
    } else {
        ApiError::Transient(err.to_string())
    }
}

fn parse_ports(ports: &bollard::models::PortMap) -> Vec<PortBinding> {
    let mut out = Vec::new();
    for (container_port_proto, bindings) in ports {
        let mut parts = container_port_proto.splitn(2, '/');
        let container_port = parts.next().unwrap_or_default().to_owned();
        let protocol = parts.next().unwrap_or("tcp").to_owned();
        match bindings {
            Some(bindings) if !bindings.is_empty() => {
                for binding in bindings {
                    out.push(PortBinding {
                        host_ip: binding.host_ip.clone(),
                        host_port: binding.host_port.clone(),
                        container_port: container_port.clone(),
                        protocol: protocol.clone(),
                    });
                }
            }
            _ => out.push(PortBinding {
                host_ip: None,
                host_port: None,
                container_port,
                protocol,
            }),
        }
    }
    out
}

fn parse_started_at(raw: Option<&str>) -> Option<Timestamp> {
    raw.and_then(|s| s.parse::<Timestamp>().ok())
}

#[async_trait]
impl ContainerApi for BollardApi {
    async fn list_all(&self) -> Result<Vec<ContainerRef>, ApiError> {
        let options = ListContainersOptions::<String> { all: true, ..Default::default() };
        let summaries = self.docker.list_containers(Some(options)).await.map_err(map_bollard_err)?;
        Ok(summaries
            .into_iter()
            .filter_map(|c| c.id.map(ContainerId::new))
            .map(|id| ContainerRef { id })
            .collect())
    }

    async fn inspect(&self, id: &ContainerId) -> Result<ContainerDetail, ApiError> {
        let detail = self
            .docker
            .inspect_container(id.get(), None::<InspectContainerOptions>)
            .await
            .map_err(map_bollard_err)?;

        let name = detail
            .name
            .as_deref()
            .map(|n| n.trim_start_matches('/').to_owned())
            .unwrap_or_else(|| id.get().to_owned());

        let state = detail.state.as_ref();
        let raw_status = state
            .and_then(|s| s.status)
            .map(|s| format!("{s:?}").to_lowercase())
            .unwrap_or_default();
        let health_raw = state
            .and_then(|s| s.health.as_ref())
            .and_then(|h| h.status)
            .map(|s| format!("{s:?}").to_lowercase());
        let started_at = state.and_then(|s| s.started_at.as_deref()).and_then(parse_started_at);

        let ports = detail
            .network_settings
            .as_ref()
            .and_then(|n| n.ports.as_ref())
            .map(parse_ports)
            .unwrap_or_default();

        let labels: HashMap<String, String> = detail
            .config
            .as_ref()
            .and_then(|c| c.labels.clone())
            .unwrap_or_default();

        Ok(ContainerDetail {
            id: id.clone(),
            name,
            raw_status,
            health_raw,
            started_at,
            ports,
            labels,
        })
    }

    fn stream_events(&self) -> BoxStream<'static, Result<ContainerEvent, ApiError>> {
        let mut filters = HashMap::new();
        filters.insert("type".to_owned(), vec!["container".to_owned()]);
        let options = EventsOptions::<String> {
            filters,
            ..Default::default()
        };
        self.docker
            .events(Some(options))
            .map(|item| {
                item.map_err(map_bollard_err).map(|ev| ContainerEvent {
                    kind: ev.typ.map(|t| format!("{t:?}").to_lowercase()).unwrap_or_default(),
                    status: ev.action.unwrap_or_default(),
                    id: ContainerId::new(
                        ev.actor.and_then(|a| a.id).unwrap_or_default(),
                    ),
                })
            })
            .boxed()
    }

    fn stream_stats(&self, id: &ContainerId) -> BoxStream<'static, Result<StatsSample, ApiError>> {
        let options = StatsOptions { stream: true, one_shot: false };
        self.docker
            .stats(id.get(), Some(options))
            .map(|item| {
                item.map_err(map_bollard_err).map(|stats| StatsSample {
                    cpu_total: Some(stats.cpu_stats.cpu_usage.total_usage),
                    precpu_total: Some(stats.precpu_stats.cpu_usage.total_usage),
                    system_total: stats.cpu_stats.system_cpu_usage,
                    presystem_total: stats.precpu_stats.system_cpu_usage,
                    online_cpus: stats.cpu_stats.online_cpus.map(u64::from),
                    percpu_count: stats
                        .cpu_stats
                        .cpu_usage
                        .percpu_usage
                        .as_ref()
                        .map(|v| v.len() as u64),
                    mem_usage: stats.memory_stats.usage,
                    mem_limit: stats.memory_stats.limit,
                })
            })
            .boxed()
    }

    fn logs_command(&self, id: &ContainerId, tail: u32, follow: bool) -> std::process::Command {
        let mut cmd = std::process::Command::new("docker");
        cmd.arg("logs").arg("--tail").arg(tail.to_string());
        if follow {
            cmd.arg("-f");
        }
        cmd.arg(id.get());
        cmd
    }

    fn exec_interactive_command(&self, id: &ContainerId, argv: &[&str]) -> std::process::Command {
        let mut cmd = std::process::Command::new("docker");
        cmd.arg("exec").arg("-it").arg(id.get()).args(argv);
        cmd
    }

    async fn restart(&self, id: &ContainerId) -> Result<(), ApiError> {
        self.docker
            .restart_container(id.get(), None::<RestartContainerOptions>)
            .await
            .map_err(map_bollard_err)
    }

    async fn stop(&self, id: &ContainerId) -> Result<(), ApiError> {
        self.docker
            .stop_container(id.get(), None::<StopContainerOptions>)
            .await
            .map_err(map_bollard_err)
    }

    async fn ping(&self) -> Result<(), ApiError> {
        self.docker.ping().await.map(|_| ()).map_err(map_bollard_err)
    }
}
