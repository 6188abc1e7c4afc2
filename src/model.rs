use std::fmt;

use jiff::Timestamp;

/// Stable opaque container identity, as reported by the daemon.
///
/// Kept as a newtype rather than a bare `String` so it can never be
/// accidentally compared or formatted against `ContainerName`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn get(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Label used to group containers into Compose projects.
pub const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";

/// Displayed when a container carries no Compose project label.
pub const NO_PROJECT: &str = "(No Project)";

/// One `host_ip:host_port -> container_port/protocol` binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub host_ip: Option<String>,
    pub host_port: Option<String>,
    pub container_port: String,
    pub protocol: String,
}

/// One sample of the daemon's cumulative cpu counters, used to
/// compute a delta against the previous sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSample {
    pub cpu_total: u64,
    pub system_total: u64,
}

/// A single container as tracked by the monitor.
#[derive(Debug, Clone)]
pub struct ContainerRecord {
    pub id: ContainerId,
    pub name: String,
    pub project: String,
    pub raw_status: String,
    pub health_raw: Option<String>,
    pub started_at: Option<Timestamp>,
    pub ports: Vec<PortBinding>,
    pub cpu_display: crate::formatters::Styled,
    pub memory_display: crate::formatters::Styled,
    pub prev_cpu_sample: Option<CpuSample>,
}

impl ContainerRecord {
    /// `true` iff `raw_status` is a running/up state.
    pub fn is_running(&self) -> bool {
        let s = self.raw_status.to_lowercase();
        s.contains("running") || s.contains("up")
    }

    pub fn status_display(&self) -> crate::formatters::Styled {
        crate::formatters::format_status(&self.raw_status)
    }

    pub fn health_display(&self) -> crate::formatters::Styled {
        crate::formatters::format_health(self.health_raw.as_deref())
    }

    pub fn uptime_display(&self) -> crate::formatters::Styled {
        crate::formatters::format_uptime(self.started_at)
    }
}

/// Raw shapes returned by the `ContainerApi` port, mirroring the
/// Docker Engine API JSON.
#[derive(Debug, Clone)]
pub struct ContainerRef {
    pub id: ContainerId,
}

#[derive(Debug, Clone)]
pub struct ContainerDetail {
    pub id: ContainerId,
    pub name: String,
    pub raw_status: String,
    pub health_raw: Option<String>,
    pub started_at: Option<Timestamp>,
    pub ports: Vec<PortBinding>,
    pub labels: std::collections::HashMap<String, String>,
}

impl ContainerDetail {
    pub fn project(&self) -> String {
        self.labels
            .get(COMPOSE_PROJECT_LABEL)
            .cloned()
            .unwrap_or_else(|| NO_PROJECT.to_owned())
    }
}

#[derive(Debug, Clone)]
pub struct ContainerEvent {
    pub kind: String,
    pub status: String,
    pub id: ContainerId,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSample {
    pub cpu_total: Option<u64>,
    pub precpu_total: Option<u64>,
    pub system_total: Option<u64>,
    pub presystem_total: Option<u64>,
    pub online_cpus: Option<u64>,
    pub percpu_count: Option<u64>,
    pub mem_usage: Option<u64>,
    pub mem_limit: Option<u64>,
}

/// The renderable projection of the monitor's internal map.
///
/// Projects are ordered by name; containers within a project are
/// ordered by name.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub groups: Vec<(String, Vec<ContainerRecord>)>,
}

impl Snapshot {
    /// Concatenate each project's sorted containers in project order.
    pub fn flatten(&self) -> Vec<ContainerRecord> {
        self.groups.iter().flat_map(|(_, c)| c.iter().cloned()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|(_, c)| c.is_empty())
    }
}
