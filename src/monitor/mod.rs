//! Owns the live container map.
//!
//! One event worker tracks daemon-wide container events; one stats
//! worker runs per container currently `running`. Both patch the
//! shared map under a single lock; snapshots are deep-copied out of
//! it so readers never see a half-written record.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::container_api::{ApiError, ContainerApi};
use crate::formatters;
use crate::model::{ContainerDetail, ContainerId, ContainerRecord, CpuSample, Snapshot};

/// Bounded join deadline on shutdown.
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

struct StatsWorker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct ContainerMonitor {
    api: Arc<dyn ContainerApi>,
    containers: Arc<Mutex<HashMap<ContainerId, ContainerRecord>>>,
    stats_workers: Arc<Mutex<HashMap<ContainerId, StatsWorker>>>,
    stop: CancellationToken,
    event_handle: Mutex<Option<JoinHandle<()>>>,
}

/// Builds a record from a fresh inspect payload.
///
/// The daemon keeps the last `StartedAt` timestamp on a container even
/// after it exits, so `started_at` is nulled out here whenever the
/// container isn't running rather than trusted verbatim — otherwise a
/// stopped container would render a frozen uptime instead of `—`.
fn record_from_detail(detail: ContainerDetail) -> ContainerRecord {
    let project = detail.project();
    let running = is_running_status(&detail.raw_status);
    ContainerRecord {
        id: detail.id,
        name: detail.name,
        project,
        raw_status: detail.raw_status,
        health_raw: detail.health_raw,
        started_at: if running { detail.started_at } else { None },
        ports: detail.ports,
        cpu_display: formatters::dash(),
        memory_display: formatters::dash(),
        prev_cpu_sample: None,
    }
}

fn is_running_status(raw_status: &str) -> bool {
    let s = raw_status.to_lowercase();
    s.contains("running") || s.contains("up")
}

impl ContainerMonitor {
    pub fn new(api: Arc<dyn ContainerApi>) -> Self {
        Self {
            api,
            containers: Arc::new(Mutex::new(HashMap::new())),
            stats_workers: Arc::new(Mutex::new(HashMap::new())),
            stop: CancellationToken::new(),
            event_handle: Mutex::new(None),
        }
    }

    /// Initial populate, then launch the event worker; returns promptly.
    pub async fn run(self: &Arc<Self>) -> Result<(), ApiError> {
        self.initial_populate().await?;

        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.event_worker().await });
        *self.event_handle.lock() = Some(handle);
        Ok(())
    }

    async fn initial_populate(&self) -> Result<(), ApiError> {
        let refs = self.api.list_all().await?;
        for r in refs {
            match self.api.inspect(&r.id).await {
                Ok(detail) => self.insert_and_maybe_spawn(detail),
                Err(ApiError::NotFound) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn insert_and_maybe_spawn(&self, detail: ContainerDetail) {
        let id = detail.id.clone();
        let record = record_from_detail(detail);
        let is_running = record.is_running();
        self.containers.lock().insert(id.clone(), record);
        if is_running {
            self.ensure_stats_worker(id);
        }
    }

    async fn event_worker(self: Arc<Self>) {
        let mut events = self.api.stream_events();
        loop {
            tokio::select! {
                () = self.stop.cancelled() => break,
                next = events.next() => {
                    match next {
                        Some(Ok(event)) => {
                            if event.kind != "container" {
                                continue;
                            }
                            self.dispatch_event(event.status.as_str(), event.id).await;
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "event stream error, event worker exiting");
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
    }

    async fn dispatch_event(&self, status: &str, id: ContainerId) {
        match status {
            "create" | "start" | "restart" | "rename" => self.add_or_update(id).await,
            s if s.starts_with("health_status") => self.add_or_update(id).await,
            "die" | "stop" | "kill" | "destroy" => self.remove(id),
            _ => {}
        }
    }

    /// Inspect and refresh a single container's record.
    async fn add_or_update(&self, id: ContainerId) {
        match self.api.inspect(&id).await {
            Ok(detail) => {
                let running = {
                    let record = record_from_detail(detail);
                    let is_running = record.is_running();
                    self.containers.lock().insert(id.clone(), record);
                    is_running
                };
                if running {
                    self.ensure_stats_worker(id);
                } else {
                    self.cancel_stats_worker(&id);
                }
            }
            Err(ApiError::NotFound) => self.remove(id),
            Err(e) => warn!(error = %e, %id, "inspect failed during add_or_update"),
        }
    }

    fn remove(&self, id: ContainerId) {
        self.cancel_stats_worker(&id);
        self.containers.lock().remove(&id);
    }

    /// Signal (but do not join) a running container's stats worker.
    fn cancel_stats_worker(&self, id: &ContainerId) {
        if let Some(worker) = self.stats_workers.lock().remove(id) {
            worker.cancel.cancel();
        }
    }

    fn ensure_stats_worker(&self, id: ContainerId) {
        if self.stats_workers.lock().contains_key(&id) {
            return;
        }
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let api = Arc::clone(&self.api);
        let containers = Arc::clone(&self.containers);
        let worker_id = id.clone();

        let handle = tokio::spawn(async move {
            let mut stream = api.stream_stats(&worker_id);
            loop {
                tokio::select! {
                    () = task_cancel.cancelled() => break,
                    next = stream.next() => {
                        match next {
                            Some(Ok(sample)) => patch_stats(&containers, &worker_id, sample),
                            Some(Err(e)) => {
                                warn!(error = %e, id = %worker_id, "stats stream error, worker exiting");
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }
        });

        self.stats_workers.lock().insert(id, StatsWorker { cancel, handle });
    }

    /// Deep-copy the map into a grouped, sorted projection.
    pub fn snapshot(&self) -> Snapshot {
        let locked = self.containers.lock();
        let mut groups: HashMap<String, Vec<ContainerRecord>> = HashMap::new();
        for record in locked.values() {
            groups.entry(record.project.clone()).or_default().push(record.clone());
        }
        drop(locked);

        let mut entries: Vec<(String, Vec<ContainerRecord>)> = groups.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, containers) in &mut entries {
            containers.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Snapshot { groups: entries }
    }

    /// Stop every worker and join with a bounded timeout.
    pub async fn stop(&self) {
        self.stop.cancel();

        let event_handle = self.event_handle.lock().take();
        if let Some(handle) = event_handle {
            if tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, handle).await.is_err() {
                warn!("event worker join timed out during shutdown");
            }
        }

        let workers: Vec<(ContainerId, StatsWorker)> = self.stats_workers.lock().drain().collect();
        for (id, worker) in workers {
            worker.cancel.cancel();
            if tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, worker.handle).await.is_err() {
                warn!(%id, "stats worker join timed out during shutdown");
            }
        }
    }
}

fn patch_stats(
    containers: &Arc<Mutex<HashMap<ContainerId, ContainerRecord>>>,
    id: &ContainerId,
    sample: crate::model::StatsSample,
) {
    let mut locked = containers.lock();
    let Some(record) = locked.get_mut(id) else { return };

    record.memory_display = formatters::format_memory(sample.mem_usage, sample.mem_limit);

    let (Some(cpu_total), Some(system_total)) = (sample.cpu_total, sample.system_total) else {
        record.cpu_display = formatters::dash();
        return;
    };
    let cur = CpuSample { cpu_total, system_total };
    let prev = match (sample.precpu_total, sample.presystem_total) {
        (Some(precpu), Some(presystem)) => CpuSample { cpu_total: precpu, system_total: presystem },
        _ => record.prev_cpu_sample.unwrap_or(CpuSample { cpu_total: 0, system_total: 0 }),
    };
    let online = sample.online_cpus.unwrap_or(0);
    let percpu = sample.percpu_count.unwrap_or(0);
    record.cpu_display = formatters::format_cpu_percent(cur, prev, online, percpu);
    record.prev_cpu_sample = Some(cur);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use futures_util::stream::{self, BoxStream};
    use tokio::sync::mpsc;

    use super::*;
    use crate::model::{ContainerEvent, ContainerRef, PortBinding, StatsSample};

    /// A fake `ContainerApi` whose event/stats streams are fed by test code
    /// through channels, used to exercise the monitor deterministically.
    struct FakeApi {
        details: Mutex<HashMap<ContainerId, ContainerDetail>>,
        events_rx: Mutex<Option<mpsc::UnboundedReceiver<Result<ContainerEvent, ApiError>>>>,
        stats_calls: AtomicUsize,
    }

    impl FakeApi {
        fn new(events_rx: mpsc::UnboundedReceiver<Result<ContainerEvent, ApiError>>) -> Self {
            Self {
                details: Mutex::new(HashMap::new()),
                events_rx: Mutex::new(Some(events_rx)),
                stats_calls: AtomicUsize::new(0),
            }
        }

        fn insert(&self, detail: ContainerDetail) {
            self.details.lock().insert(detail.id.clone(), detail);
        }
    }

    #[async_trait]
    impl ContainerApi for FakeApi {
        async fn list_all(&self) -> Result<Vec<ContainerRef>, ApiError> {
            Ok(self.details.lock().keys().cloned().map(|id| ContainerRef { id }).collect())
        }

        async fn inspect(&self, id: &ContainerId) -> Result<ContainerDetail, ApiError> {
            self.details.lock().get(id).cloned().ok_or(ApiError::NotFound)
        }

        fn stream_events(&self) -> BoxStream<'static, Result<ContainerEvent, ApiError>> {
            let rx = self.events_rx.lock().take().expect("events stream taken twice");
            Box::pin(tokio_stream_from_receiver(rx))
        }

        fn stream_stats(&self, _id: &ContainerId) -> BoxStream<'static, Result<StatsSample, ApiError>> {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(stream::empty())
        }

        fn logs_command(&self, _id: &ContainerId, _tail: u32, _follow: bool) -> std::process::Command {
            std::process::Command::new("true")
        }

        fn exec_interactive_command(&self, _id: &ContainerId, _argv: &[&str]) -> std::process::Command {
            std::process::Command::new("true")
        }

        async fn restart(&self, _id: &ContainerId) -> Result<(), ApiError> {
            Ok(())
        }

        async fn stop(&self, _id: &ContainerId) -> Result<(), ApiError> {
            Ok(())
        }

        async fn ping(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn tokio_stream_from_receiver<T: Send + 'static>(
        mut rx: mpsc::UnboundedReceiver<T>,
    ) -> impl futures_util::Stream<Item = T> {
        async_stream::stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        }
    }

    fn detail(id: &str, project: &str, running: bool) -> ContainerDetail {
        let mut labels = HashMap::new();
        labels.insert(crate::model::COMPOSE_PROJECT_LABEL.to_owned(), project.to_owned());
        ContainerDetail {
            id: ContainerId::new(id),
            name: id.to_owned(),
            raw_status: if running { "running".into() } else { "exited".into() },
            health_raw: None,
            started_at: None,
            ports: Vec::<PortBinding>::new(),
            labels,
        }
    }

    #[tokio::test]
    async fn start_event_adds_container_and_spawns_stats_worker() {
        let (tx, rx) = mpsc::unbounded_channel();
        let fake = Arc::new(FakeApi::new(rx));
        fake.insert(detail("c1", "proj", true));
        let monitor = Arc::new(ContainerMonitor::new(fake.clone()));

        tx.send(Ok(ContainerEvent { kind: "container".into(), status: "start".into(), id: ContainerId::new("c1") }))
            .unwrap();

        monitor.event_worker_for_test().await;

        assert!(monitor.containers.lock().contains_key(&ContainerId::new("c1")));
        assert!(monitor.stats_workers.lock().contains_key(&ContainerId::new("c1")));
        monitor.stop().await;
    }

    #[tokio::test]
    async fn die_event_removes_only_that_container() {
        let (tx, rx) = mpsc::unbounded_channel();
        let fake = Arc::new(FakeApi::new(rx));
        let monitor = Arc::new(ContainerMonitor::new(fake.clone()));
        monitor.insert_and_maybe_spawn(detail("c1", "proj", true));
        monitor.insert_and_maybe_spawn(detail("c2", "proj", true));

        tx.send(Ok(ContainerEvent { kind: "container".into(), status: "die".into(), id: ContainerId::new("c1") }))
            .unwrap();

        monitor.event_worker_for_test().await;

        assert!(!monitor.containers.lock().contains_key(&ContainerId::new("c1")));
        assert!(monitor.containers.lock().contains_key(&ContainerId::new("c2")));
        monitor.stop().await;
    }

    impl ContainerMonitor {
        /// Drain one pass of events synchronously for tests (no timer-based loop needed).
        async fn event_worker_for_test(self: &Arc<Self>) {
            let mut events = self.api.stream_events();
            // Only one event is ever queued in these tests; take it then stop.
            if let Some(Ok(event)) = events.next().await {
                self.dispatch_event(event.status.as_str(), event.id).await;
            }
        }
    }

    #[test]
    fn snapshot_groups_and_sorts() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let fake = Arc::new(FakeApi::new(rx));
        let monitor = ContainerMonitor::new(fake);
        monitor.insert_and_maybe_spawn(detail("backend-service", "my-app", true));
        monitor.insert_and_maybe_spawn(detail("redis-cache", "my-app", false));
        monitor.insert_and_maybe_spawn(detail("old-container", "(No Project)", false));

        let snap = monitor.snapshot();
        assert_eq!(snap.groups.len(), 2);
        assert_eq!(snap.groups[0].0, "(No Project)");
        assert_eq!(snap.groups[1].0, "my-app");
        assert_eq!(snap.groups[1].1[0].name, "backend-service");
        assert_eq!(snap.groups[1].1[1].name, "redis-cache");
    }
}
