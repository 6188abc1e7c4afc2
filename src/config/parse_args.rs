use clap::Parser;

/// htop for your Docker Compose stack.
#[derive(Debug, Clone, Parser)]
#[command(name = "dockedup", version, about, long_about = None, disable_version_flag = true)]
pub struct Args {
    /// UI refresh rate in seconds (data is real-time).
    #[arg(short, long, default_value_t = 0.5)]
    pub refresh: f64,

    /// Enable debug logging.
    #[arg(short, long)]
    pub debug: bool,

    /// Print version information and exit.
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    pub version: (),
}

impl Default for Args {
    fn default() -> Self {
        Self { refresh: 0.5, debug: false, version: () }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_refresh_is_half_a_second() {
        assert_eq!(Args::default().refresh, 0.5);
    }
}
