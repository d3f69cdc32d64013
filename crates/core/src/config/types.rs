use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::counter::CounterConfig;
use crate::fetch::FetchConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub sources: SourcesConfig,
    #[serde(default)]
    pub counter: CounterConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub run: RunConfig,
    /// When present, the binary serves the HTTP API instead of running once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,
}

/// Input files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Newline-separated vocabulary words.
    pub vocabulary: PathBuf,
    /// Newline-separated document locators.
    pub locators: PathBuf,
}

/// Per-run settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// How many of the most frequent tokens to report.
    #[serde(default = "default_top_n")]
    pub top_n: i64,
    /// Cancel the run after this many seconds (0 = no deadline).
    #[serde(default)]
    pub deadline_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            deadline_secs: 0,
        }
    }
}

fn default_top_n() -> i64 {
    10
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}
