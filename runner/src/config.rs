//! Configuration for the binary runner service

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_PROCESS_TIMEOUT_MS: u64 = 10_000;

/// Configuration for the binary runner
#[derive(Debug, Clone, Parser)]
#[command(name = "binary-runner")]
#[command(about = "Runs scripts and executables on request and reports their output")]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: SocketAddr,

    /// Hard wall-clock limit for one execution, in milliseconds
    #[arg(long, env = "RUNNING_PROCESS_TIMEOUT_MS", default_value_t = DEFAULT_PROCESS_TIMEOUT_MS)]
    pub process_timeout_ms: u64,

    /// Output logs in JSON format
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 8080).into(),
            process_timeout_ms: DEFAULT_PROCESS_TIMEOUT_MS,
            log_json: false,
        }
    }
}

impl Config {
    /// Parse configuration from command-line args and environment variables
    pub fn parse_config() -> Self {
        Config::parse()
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_millis(self.process_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_declared_constants() {
        let config = Config::default();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.process_timeout(), Duration::from_secs(10));
        assert!(!config.log_json);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "binary-runner",
            "--bind-addr",
            "127.0.0.1:9000",
            "--process-timeout-ms",
            "250",
            "--log-json",
        ])
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.process_timeout(), Duration::from_millis(250));
        assert!(config.log_json);
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let result =
            Config::try_parse_from(["binary-runner", "--process-timeout-ms", "soon"]);
        assert!(result.is_err());
    }
}
