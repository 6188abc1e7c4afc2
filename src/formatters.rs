//! Pure formatting functions.
//!
//! Every function here is side-effect-free: primitive values in,
//! display strings with an attached color out. Nothing here touches
//! the daemon, the terminal, or any shared state.

use jiff::Timestamp;
use ratatui::style::Color;

use crate::model::{CpuSample, PortBinding};

/// Display text paired with the color it should render in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Styled {
    pub text: String,
    pub color: Color,
}

impl Styled {
    fn new(text: impl Into<String>, color: Color) -> Self {
        Self { text: text.into(), color }
    }

    fn grey_dash() -> Self {
        Self::new("—", Color::DarkGray)
    }
}

/// Placeholder shown before a value has been sampled, or when it does not apply.
pub fn dash() -> Styled {
    Styled::grey_dash()
}

/// `raw_status` → `✅ Up` / `🔁 Restarting` / `❌ Down` / `❓ <Status>`.
pub fn format_status(raw_status: &str) -> Styled {
    let lower = raw_status.to_lowercase();
    if lower.contains("running") || lower.contains("up") {
        Styled::new("✅ Up", Color::Green)
    } else if lower.contains("restarting") {
        Styled::new("🔁 Restarting", Color::Yellow)
    } else if lower.contains("exited") || lower.contains("dead") {
        Styled::new("❌ Down", Color::Red)
    } else {
        let mut chars = raw_status.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        };
        Styled::new(format!("❓ {capitalized}"), Color::Gray)
    }
}

/// `health_raw` → `🟢 Healthy` / `🔴 Unhealthy` / `🟡 Starting` / raw / `—`.
pub fn format_health(health_raw: Option<&str>) -> Styled {
    match health_raw {
        None => Styled::grey_dash(),
        Some("healthy") => Styled::new("🟢 Healthy", Color::Green),
        Some("unhealthy") => Styled::new("🔴 Unhealthy", Color::Red),
        Some("starting") => Styled::new("🟡 Starting", Color::Yellow),
        Some(other) => Styled::new(other.to_owned(), Color::Gray),
    }
}

/// `host_ip:host_port -> container_port`, one binding per line; `—` when empty.
pub fn format_ports(ports: &[PortBinding]) -> Styled {
    if ports.is_empty() {
        return Styled::grey_dash();
    }
    let lines: Vec<String> = ports
        .iter()
        .map(|p| {
            let suppress_ip = p
                .host_ip
                .as_deref()
                .is_none_or(|ip| ip == "0.0.0.0" || ip == "::");
            let container_side = format!("{}/{}", p.container_port, p.protocol);
            match (&p.host_port, suppress_ip) {
                (Some(host_port), true) => format!("{host_port} -> {container_side}"),
                (Some(host_port), false) => {
                    let ip = p.host_ip.as_deref().unwrap_or_default();
                    format!("{ip}:{host_port} -> {container_side}")
                }
                (None, _) => container_side,
            }
        })
        .collect();
    Styled::new(lines.join("\n"), Color::Reset)
}

/// Successive division by 1024 into `{"", K, M, G, T}iB`, one decimal.
pub fn format_bytes(size: i64) -> Styled {
    if size < 0 {
        return Styled::grey_dash();
    }
    const SUFFIXES: [&str; 5] = ["", "K", "M", "G", "T"];
    let mut value = size as f64;
    let mut idx = 0;
    while value >= 1024.0 && idx < SUFFIXES.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    Styled::new(format!("{value:.1}{}iB", SUFFIXES[idx]), Color::Reset)
}

/// `<usage> / <limit> (<pct>%)`, colored by percent.
pub fn format_memory(usage: Option<u64>, limit: Option<u64>) -> Styled {
    let (Some(usage), Some(limit)) = (usage, limit) else {
        return Styled::grey_dash();
    };
    if limit == 0 {
        return Styled::grey_dash();
    }
    let pct = (usage as f64 / limit as f64) * 100.0;
    let color = if pct > 85.0 {
        Color::Red
    } else if pct > 60.0 {
        Color::Yellow
    } else {
        Color::Cyan
    };
    let usage_text = format_bytes(usage as i64).text;
    let limit_text = format_bytes(limit as i64).text;
    Styled::new(format!("{usage_text} / {limit_text} ({pct:.1}%)"), color)
}

/// Sentinel instant the daemon uses for "never started".
const EPOCH_SENTINEL: &str = "0001-01-01T00:00:00Z";

/// Compact `<D>d<H>h` / `<H>h<M>m` / `<M>m<S>s` / `<S>s` uptime.
pub fn format_uptime(started_at: Option<Timestamp>) -> Styled {
    let Some(started_at) = started_at else {
        return Styled::grey_dash();
    };
    if started_at.to_string() == EPOCH_SENTINEL {
        return Styled::grey_dash();
    }
    let now = Timestamp::now();
    let elapsed_secs = now.as_second() - started_at.as_second();
    let total_secs = elapsed_secs.max(0) as u64;

    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let text = if days > 0 {
        format!("{days}d{hours}h")
    } else if hours > 0 {
        format!("{hours}h{minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    };
    Styled::new(text, Color::Reset)
}

/// CPU percentage from a current/previous sample pair.
pub fn format_cpu_percent(
    cur: CpuSample,
    prev: CpuSample,
    online_cpus: u64,
    percpu_count: u64,
) -> Styled {
    let delta_c = cur.cpu_total.saturating_sub(prev.cpu_total);
    let delta_s = cur.system_total.saturating_sub(prev.system_total);
    let online = if online_cpus > 0 { online_cpus } else if percpu_count > 0 { percpu_count } else { 1 };

    if delta_s > 0 && delta_c > 0 {
        let pct = (delta_c as f64 / delta_s as f64) * online as f64 * 100.0;
        let color = if pct > 80.0 {
            Color::Red
        } else if pct > 50.0 {
            Color::Yellow
        } else {
            Color::Cyan
        };
        Styled::new(format!("{pct:.2}%"), color)
    } else {
        Styled::new("0.00%", Color::DarkGray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_running_is_up() {
        assert_eq!(format_status("running").text, "✅ Up");
        assert_eq!(format_status("Up 3 hours").text, "✅ Up");
    }

    #[test]
    fn status_restarting() {
        assert_eq!(format_status("restarting").text, "🔁 Restarting");
    }

    #[test]
    fn status_exited_or_dead_is_down() {
        assert_eq!(format_status("exited").text, "❌ Down");
        assert_eq!(format_status("dead").text, "❌ Down");
    }

    #[test]
    fn status_other_is_capitalized_with_question_mark() {
        assert_eq!(format_status("created").text, "❓ Created");
    }

    #[test]
    fn health_mapping() {
        assert_eq!(format_health(None).text, "—");
        assert_eq!(format_health(Some("healthy")).text, "🟢 Healthy");
        assert_eq!(format_health(Some("unhealthy")).text, "🔴 Unhealthy");
        assert_eq!(format_health(Some("starting")).text, "🟡 Starting");
        assert_eq!(format_health(Some("weird")).text, "weird");
    }

    #[test]
    fn ports_empty_is_dash() {
        assert_eq!(format_ports(&[]).text, "—");
    }

    #[test]
    fn ports_suppresses_zero_ip() {
        let p = PortBinding {
            host_ip: Some("0.0.0.0".into()),
            host_port: Some("8000".into()),
            container_port: "8000".into(),
            protocol: "tcp".into(),
        };
        assert_eq!(format_ports(&[p]).text, "8000 -> 8000/tcp");
    }

    #[test]
    fn ports_keeps_nonzero_ip() {
        let p = PortBinding {
            host_ip: Some("127.0.0.1".into()),
            host_port: Some("8000".into()),
            container_port: "8000".into(),
            protocol: "tcp".into(),
        };
        assert_eq!(format_ports(&[p]).text, "127.0.0.1:8000 -> 8000/tcp");
    }

    #[test]
    fn bytes_round_trip() {
        assert_eq!(format_bytes(0).text, "0.0iB");
        assert_eq!(format_bytes(1023).text, "1023.0iB");
        assert_eq!(format_bytes(1024).text, "1.0KiB");
        assert_eq!(format_bytes(1_048_576).text, "1.0MiB");
        assert_eq!(format_bytes(1_073_741_824).text, "1.0GiB");
    }

    #[test]
    fn memory_thresholds() {
        assert_eq!(format_memory(Some(10), Some(100)).color, Color::Cyan);
        assert_eq!(format_memory(Some(70), Some(100)).color, Color::Yellow);
        assert_eq!(format_memory(Some(90), Some(100)).color, Color::Red);
        assert_eq!(format_memory(None, Some(100)).text, "—");
    }

    /// 2000/1000 cumulative cpu usage, 10000/5000 cumulative system usage, 2 online cpus → 40.00%.
    #[test]
    fn cpu_percent_matches_known_sample() {
        let cur = CpuSample { cpu_total: 2000, system_total: 10_000 };
        let prev = CpuSample { cpu_total: 1000, system_total: 5_000 };
        let styled = format_cpu_percent(cur, prev, 2, 0);
        assert_eq!(styled.text, "40.00%");
    }

    #[test]
    fn cpu_percent_thresholds() {
        let prev = CpuSample { cpu_total: 0, system_total: 0 };
        let cur_low = CpuSample { cpu_total: 25, system_total: 100 };
        assert_eq!(format_cpu_percent(cur_low, prev, 1, 0).color, Color::Cyan);
        let cur_mid = CpuSample { cpu_total: 60, system_total: 100 };
        assert_eq!(format_cpu_percent(cur_mid, prev, 1, 0).color, Color::Yellow);
        let cur_high = CpuSample { cpu_total: 90, system_total: 100 };
        assert_eq!(format_cpu_percent(cur_high, prev, 1, 0).color, Color::Red);
    }

    #[test]
    fn cpu_percent_falls_back_when_no_delta() {
        let sample = CpuSample { cpu_total: 10, system_total: 10 };
        let styled = format_cpu_percent(sample, sample, 1, 0);
        assert_eq!(styled.text, "0.00%");
        assert_eq!(styled.color, Color::DarkGray);
    }

    #[test]
    fn uptime_sentinel_is_dash() {
        let sentinel: Timestamp = EPOCH_SENTINEL.parse().unwrap();
        assert_eq!(format_uptime(Some(sentinel)).text, "—");
        assert_eq!(format_uptime(None).text, "—");
    }
}
