//! CLI parsing and runtime configuration.
//!
//! The CLI surface is four flags plus `--version`/`--help`, which
//! `clap` derives automatically; there is no config file to merge.

mod parse_args;

pub use parse_args::Args;

use std::time::Duration;

use crate::app_error::AppError;

/// Minimum accepted refresh interval.
const MIN_REFRESH_SECS: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct Config {
    pub refresh: Duration,
    pub debug: bool,
}

impl Config {
    pub fn new(args: &Args) -> Result<Self, AppError> {
        if args.refresh < MIN_REFRESH_SECS {
            return Err(AppError::Fatal(format!(
                "--refresh must be >= {MIN_REFRESH_SECS}, got {}",
                args.refresh
            )));
        }
        Ok(Self {
            refresh: Duration::from_secs_f64(args.refresh),
            debug: args.debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_refresh_below_minimum() {
        let args = Args { refresh: 0.05, ..Args::default() };
        assert!(Config::new(&args).is_err());
    }

    #[test]
    fn accepts_minimum_refresh() {
        let args = Args { refresh: 0.1, ..Args::default() };
        assert!(Config::new(&args).is_ok());
    }
}
