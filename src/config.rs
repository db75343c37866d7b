//! Runtime configuration
//!
//! Settings are resolved in layers: built-in defaults, then an optional YAML file,
//! then `PATHWAY_*` environment variables, then explicit command-line flags.

use clap::Parser;
use pathway_core::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = ".pathway";
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_CONFIG: &str = "PATHWAY_CONFIG";
pub const ENV_TRANSPORT: &str = "PATHWAY_TRANSPORT";
pub const ENV_PORT: &str = "PATHWAY_PORT";
pub const ENV_DATA_DIR: &str = "PATHWAY_DATA_DIR";
pub const ENV_VERBOSE: &str = "PATHWAY_VERBOSE";
pub const ENV_READ_ONLY: &str = "PATHWAY_READ_ONLY";
pub const ENV_LOG_FILE: &str = "PATHWAY_LOG_FILE";
pub const ENV_BIND: &str = "PATHWAY_BIND";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            other => Err(Error::config(format!(
                "transport must be stdio or http, got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "pathway",
    about = "Development workflow knowledge graph served over MCP",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    /// Path to a YAML config file (or set PATHWAY_CONFIG)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Transport: stdio or http
    #[arg(short, long)]
    pub transport: Option<String>,

    /// Port for the HTTP transport
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Data root holding relationships.yaml, nodes/ and prompts/
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Only register tools that do not modify the graph
    #[arg(long, default_value_t = false)]
    pub read_only: bool,

    /// Write logs to a file (in addition to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Address the HTTP transport binds to
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Config file contents. Every field is optional; absent fields keep the lower layer.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub transport: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub verbose: Option<bool>,
    pub read_only: Option<bool>,
    pub log_file: Option<PathBuf>,
    pub bind: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::config(format!("config file: {}", e)))
    }

    /// Load an explicitly named config file. Missing or malformed files are errors.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config: Option<PathBuf>,
    pub transport: Transport,
    pub port: u16,
    pub data_dir: PathBuf,
    pub verbose: bool,
    pub read_only: bool,
    pub log_file: Option<PathBuf>,
    pub bind: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config: None,
            transport: Transport::Stdio,
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            verbose: false,
            read_only: false,
            log_file: None,
            bind: DEFAULT_BIND.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::config(format!("{} must be a boolean, got '{}'", var, other))),
    }
}

fn parse_port(var: &str, value: &str) -> Result<u16> {
    match value.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(Error::config(format!(
            "{} must be a port in 1-65535, got '{}'",
            var, value
        ))),
        Ok(p) => Ok(p),
    }
}

impl Settings {
    /// Resolve settings from every layer. `env` looks up one environment variable;
    /// the binary passes `std::env::var`, tests pass a map.
    pub fn resolve<F>(cli: &Cli, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        settings.config = cli.config.clone().or_else(|| env(ENV_CONFIG).map(PathBuf::from));
        if let Some(path) = &settings.config {
            settings.apply_file(FileConfig::load(path)?)?;
        }

        settings.apply_env(&env)?;
        settings.apply_cli(cli)?;
        settings.validate()?;
        Ok(settings)
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<()> {
        if let Some(t) = file.transport {
            self.transport = t.parse()?;
        }
        if let Some(p) = file.port {
            self.port = p;
        }
        if let Some(d) = file.data_dir {
            self.data_dir = d;
        }
        if let Some(v) = file.verbose {
            self.verbose = v;
        }
        if let Some(r) = file.read_only {
            self.read_only = r;
        }
        if let Some(l) = file.log_file {
            self.log_file = Some(l);
        }
        if let Some(b) = file.bind {
            self.bind = b;
        }
        if let Some(t) = file.request_timeout_secs {
            self.request_timeout_secs = t;
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(t) = env(ENV_TRANSPORT) {
            self.transport = t.parse()?;
        }
        if let Some(p) = env(ENV_PORT) {
            self.port = parse_port(ENV_PORT, &p)?;
        }
        if let Some(d) = env(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(d);
        }
        if let Some(v) = env(ENV_VERBOSE) {
            self.verbose = parse_bool(ENV_VERBOSE, &v)?;
        }
        if let Some(r) = env(ENV_READ_ONLY) {
            self.read_only = parse_bool(ENV_READ_ONLY, &r)?;
        }
        if let Some(l) = env(ENV_LOG_FILE) {
            self.log_file = Some(PathBuf::from(l));
        }
        if let Some(b) = env(ENV_BIND) {
            self.bind = b;
        }
        Ok(())
    }

    /// Flags only override when given; boolean flags can switch a feature on but not off.
    fn apply_cli(&mut self, cli: &Cli) -> Result<()> {
        if let Some(t) = &cli.transport {
            self.transport = t.parse()?;
        }
        if let Some(p) = cli.port {
            self.port = p;
        }
        if let Some(d) = &cli.data_dir {
            self.data_dir = d.clone();
        }
        if cli.verbose {
            self.verbose = true;
        }
        if cli.read_only {
            self.read_only = true;
        }
        if let Some(l) = &cli.log_file {
            self.log_file = Some(l.clone());
        }
        if let Some(b) = &cli.bind {
            self.bind = b.clone();
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("port must be in 1-65535"));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be positive"));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::config("data_dir must not be empty"));
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind
            .trim()
            .parse()
            .map_err(|_| {
                Error::config(format!("bind must be an IP address, got '{}'", self.bind))
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
