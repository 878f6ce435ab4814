use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use snafu::ResultExt;

use crate::error::{ApplicationError, ConfigLoadSnafu};
use crate::overlay::{LanePolicy, LayoutParams};

/// Runtime settings, read from `BYTESHORTS_`-prefixed environment variables.
/// Every field has a default, so a bare environment boots a working server.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address", default = "defaults::host")]
    pub host: SocketAddr,

    /// Directory holding one JSON file per video record.
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,

    /// When set, a daily-rolling JSON log file is written here as well.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Insert the welcome video when the store comes up empty.
    #[serde(default = "defaults::seed")]
    pub seed: bool,

    #[serde(default = "defaults::overlay_lanes")]
    pub overlay_lanes: usize,
    #[serde(default = "defaults::overlay_base_ms")]
    pub overlay_base_ms: u64,
    #[serde(default = "defaults::overlay_jitter_ms")]
    pub overlay_jitter_ms: u64,
    #[serde(default = "defaults::overlay_stagger_ms")]
    pub overlay_stagger_ms: u64,
    #[serde(default)]
    pub overlay_policy: LanePolicy,
}

impl Config {
    pub fn from_env() -> Result<Config, ApplicationError> {
        envy::prefixed("BYTESHORTS_")
            .from_env::<Config>()
            .context(ConfigLoadSnafu)
    }

    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            lanes: self.overlay_lanes,
            base_duration: Duration::from_millis(self.overlay_base_ms),
            jitter: Duration::from_millis(self.overlay_jitter_ms),
            stagger: Duration::from_millis(self.overlay_stagger_ms),
            policy: self.overlay_policy,
        }
    }
}

mod defaults {
    use std::net::SocketAddr;
    use std::path::PathBuf;

    pub fn host() -> SocketAddr {
        "0.0.0.0:3001".parse().expect("static address")
    }

    pub fn data_dir() -> PathBuf {
        PathBuf::from("data")
    }

    pub fn seed() -> bool {
        true
    }

    pub fn overlay_lanes() -> usize {
        5
    }

    pub fn overlay_base_ms() -> u64 {
        6000
    }

    pub fn overlay_jitter_ms() -> u64 {
        4000
    }

    pub fn overlay_stagger_ms() -> u64 {
        1500
    }
}
