// Configuration management for the RIP daemon
// Supports CLI arguments, config file (TOML), and environment variables

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::Level;

use crate::error::{RouterError, RouterResult};
use crate::rip::RIP_PORT;
use crate::router::{Interface, RouterConfig, Timers};

/// Interface bits are carried in a u64 receive mask
const MAX_INTERFACES: usize = 64;

/// ripd - RIP version 2 routing daemon
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "ripd")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, env = "RIPD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(short, long, env = "RIPD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Status API port
    #[arg(long, env = "RIPD_API_PORT")]
    pub api_port: Option<u16>,

    /// Don't start the status API
    #[arg(long, env = "RIPD_NO_API")]
    pub no_api: bool,

    /// UDP port for RIP traffic
    #[arg(long, env = "RIPD_RIP_PORT")]
    pub rip_port: Option<u16>,
}

/// Configuration file structure (TOML format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub timers: TimersConfig,

    /// Interfaces in id order: the first entry is interface 0
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub rip: RipConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimersConfig {
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,

    /// Seconds without refresh before a route becomes unreachable
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Seconds without refresh before a route is removed
    #[serde(default = "default_deletion")]
    pub deletion_secs: u64,

    #[serde(default = "default_triggered_max")]
    pub triggered_max_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub address: Ipv4Addr,

    #[serde(default = "default_prefix_len")]
    pub prefix_len: u8,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address (default: 127.0.0.1)
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RipConfig {
    #[serde(default = "default_rip_port")]
    pub port: u16,
}

// Default value functions
fn default_update_interval() -> u64 {
    30
}
fn default_timeout() -> u64 {
    180
}
fn default_deletion() -> u64 {
    300
}
fn default_triggered_max() -> u64 {
    5
}
fn default_sweep_interval() -> u64 {
    5
}
fn default_prefix_len() -> u8 {
    24
}
fn default_true() -> bool {
    true
}
fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_api_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_rip_port() -> u16 {
    RIP_PORT
}

impl Default for TimersConfig {
    fn default() -> Self {
        TimersConfig {
            update_interval_secs: default_update_interval(),
            timeout_secs: default_timeout(),
            deletion_secs: default_deletion(),
            triggered_max_secs: default_triggered_max(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            enabled: default_true(),
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

impl Default for RipConfig {
    fn default() -> Self {
        RipConfig {
            port: default_rip_port(),
        }
    }
}

impl ConfigFile {
    pub fn from_toml(content: &str) -> RouterResult<Self> {
        toml::from_str(content).map_err(|e| RouterError::Config(e.to_string()))
    }

    fn validate(&self) -> RouterResult<()> {
        let timers = &self.timers;
        if self.interfaces.is_empty() {
            return Err(RouterError::Config("at least one interface is required".to_string()));
        }
        if self.interfaces.len() > MAX_INTERFACES {
            return Err(RouterError::Config(format!(
                "at most {} interfaces are supported",
                MAX_INTERFACES
            )));
        }
        if let Some(bad) = self.interfaces.iter().find(|i| i.prefix_len > 32) {
            return Err(RouterError::Config(format!(
                "interface {} has prefix length {}",
                bad.address, bad.prefix_len
            )));
        }
        if timers.timeout_secs >= timers.deletion_secs {
            return Err(RouterError::Config(
                "timeout_secs must be less than deletion_secs".to_string(),
            ));
        }
        if timers.triggered_max_secs == 0 {
            return Err(RouterError::Config("triggered_max_secs must be at least 1".to_string()));
        }
        if timers.update_interval_secs == 0 || timers.sweep_interval_secs == 0 {
            return Err(RouterError::Config(
                "update and sweep intervals must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Merged configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: Level,
    pub api_enabled: bool,
    pub api_bind: SocketAddr,
    pub router: RouterConfig,
}

impl Config {
    /// Load configuration from all sources (CLI args, config file, defaults)
    /// Priority: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> anyhow::Result<Self> {
        let cli_args = CliArgs::parse();

        let config_file = if let Some(config_path) = &cli_args.config {
            tracing::info!("Loading configuration from: {}", config_path.display());
            ConfigFile::from_toml(&std::fs::read_to_string(config_path)?)?
        } else {
            // Try loading from default locations
            let default_paths = [PathBuf::from("ripd.toml"), PathBuf::from("config.toml")];

            let mut loaded_config = None;
            for path in default_paths {
                if path.exists() {
                    tracing::info!("Loading configuration from: {}", path.display());
                    loaded_config = Some(ConfigFile::from_toml(&std::fs::read_to_string(&path)?)?);
                    break;
                }
            }

            loaded_config.unwrap_or_default()
        };

        Ok(Config::from_sources(&cli_args, config_file)?)
    }

    /// Merges CLI overrides into the file settings and validates the result.
    pub fn from_sources(cli_args: &CliArgs, file: ConfigFile) -> RouterResult<Self> {
        file.validate()?;

        let level = cli_args.log_level.as_deref().unwrap_or(&file.logging.level);
        let log_level = parse_log_level(level)?;

        let api_enabled = !cli_args.no_api && file.api.enabled;
        let api_port = cli_args.api_port.unwrap_or(file.api.port);
        let api_bind = format!("{}:{}", file.api.bind_address, api_port)
            .parse::<SocketAddr>()
            .map_err(|e| RouterError::Config(format!("bad API bind address: {}", e)))?;

        let t = &file.timers;
        let timers = Timers::from_secs(
            t.update_interval_secs,
            t.timeout_secs,
            t.deletion_secs,
            t.triggered_max_secs,
            t.sweep_interval_secs,
        );

        let interfaces = file
            .interfaces
            .iter()
            .enumerate()
            .map(|(id, i)| Interface {
                id: id as u32,
                address: i.address,
                prefix_len: i.prefix_len,
                enabled: i.enabled,
            })
            .collect();

        Ok(Config {
            log_level,
            api_enabled,
            api_bind,
            router: RouterConfig {
                interfaces,
                timers,
                port: cli_args.rip_port.unwrap_or(file.rip.port),
            },
        })
    }
}

fn parse_log_level(level_str: &str) -> RouterResult<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(RouterError::Config(format!("Invalid log level: {}", level_str))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [timers]
        update_interval_secs = 10
        timeout_secs = 60

        [[interfaces]]
        address = "192.168.3.2"

        [[interfaces]]
        address = "10.1.0.1"
        prefix_len = 16
        enabled = false

        [api]
        port = 9000

        [logging]
        level = "debug"
    "#;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert_eq!(config.timers.update_interval_secs, 30);
        assert_eq!(config.timers.deletion_secs, 300);
        assert_eq!(config.rip.port, 520);
        assert!(config.api.enabled);
        assert!(config.interfaces.is_empty());
    }

    #[test]
    fn test_parse_file() {
        let file = ConfigFile::from_toml(SAMPLE).unwrap();
        assert_eq!(file.interfaces.len(), 2);
        assert_eq!(file.interfaces[0].prefix_len, 24);
        assert!(file.interfaces[0].enabled);
        assert_eq!(file.timers.deletion_secs, 300);

        let config = Config::from_sources(&CliArgs::default(), file).unwrap();
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.api_bind, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.router.port, 520);
        assert_eq!(config.router.timers.update_interval, 10_000);
        assert_eq!(config.router.timers.timeout, 60_000);

        let second = &config.router.interfaces[1];
        assert_eq!(second.id, 1);
        assert_eq!(second.address, Ipv4Addr::new(10, 1, 0, 1));
        assert!(!second.enabled);
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = CliArgs::parse_from(["ripd", "--rip-port", "5520", "--no-api", "-l", "warn"]);
        let config = Config::from_sources(&cli, ConfigFile::from_toml(SAMPLE).unwrap()).unwrap();
        assert_eq!(config.router.port, 5520);
        assert!(!config.api_enabled);
        assert_eq!(config.log_level, Level::WARN);
    }

    #[test]
    fn test_validation() {
        let cli = CliArgs::default();
        assert!(matches!(
            Config::from_sources(&cli, ConfigFile::default()),
            Err(RouterError::Config(_))
        ));

        let mut file = ConfigFile::from_toml(SAMPLE).unwrap();
        file.timers.timeout_secs = 300;
        assert!(Config::from_sources(&cli, file).is_err());

        let mut file = ConfigFile::from_toml(SAMPLE).unwrap();
        file.timers.triggered_max_secs = 0;
        assert!(Config::from_sources(&cli, file).is_err());

        let mut file = ConfigFile::from_toml(SAMPLE).unwrap();
        file.interfaces[0].prefix_len = 33;
        assert!(Config::from_sources(&cli, file).is_err());
    }

    #[test]
    fn test_bad_toml_rejected() {
        assert!(ConfigFile::from_toml("[[interfaces]]\naddress = \"not-an-ip\"").is_err());
    }

    #[test]
    fn test_parse_log_level() {
        assert!(matches!(parse_log_level("info"), Ok(Level::INFO)));
        assert!(matches!(parse_log_level("DEBUG"), Ok(Level::DEBUG)));
        assert!(parse_log_level("invalid").is_err());
    }
}
