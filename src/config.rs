//! TOML configuration, read once at startup. CLI flags may override the
//! listen address; nothing is mutated afterwards.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::store::MetricSpec;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default = "default_targets")]
    pub targets: Vec<Target>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: General::default(),
            backend: Backend::default(),
            storage: Storage::default(),
            targets: default_targets(),
        }
    }
}

impl Config {
    /// Load from a TOML file, or fall back to built-in defaults when no
    /// path was given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("failed to parse config {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

impl Default for General {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            open_browser: default_open_browser(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

/// One polled target (an application, a service, the backend health
/// endpoint). Interval strings use humantime syntax, e.g. `"5s"`.
#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    pub name: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Disabled targets fetch once at startup and never repeat.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub metrics: Vec<MetricEntry>,
}

impl Target {
    /// Effective poll spacing. Disabled targets map to a zero interval,
    /// which the scheduler treats as "initial fetch only".
    pub fn interval(&self) -> anyhow::Result<Duration> {
        if !self.enabled {
            return Ok(Duration::ZERO);
        }
        humantime::parse_duration(&self.interval)
            .with_context(|| format!("bad interval {:?} for target {}", self.interval, self.name))
    }

    pub fn specs(&self) -> Vec<MetricSpec> {
        self.metrics.iter().map(MetricEntry::to_spec).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricEntry {
    pub name: String,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    /// Backfill jitter amplitude; derived from the range when omitted.
    pub jitter: Option<f64>,
}

impl MetricEntry {
    pub fn to_spec(&self) -> MetricSpec {
        let mut spec = MetricSpec::gauge(self.name.clone(), self.min, self.max);
        if let Some(jitter) = self.jitter {
            spec.jitter = jitter;
        }
        spec
    }
}

fn default_listen() -> SocketAddr {
    "127.0.0.1:4040".parse().unwrap()
}

fn default_open_browser() -> bool {
    true
}

fn default_base_url() -> String {
    "http://127.0.0.1:9090".to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".pulseboard")
}

fn default_interval() -> String {
    "5s".to_string()
}

fn default_capacity() -> usize {
    60
}

fn default_enabled() -> bool {
    true
}

fn default_max() -> f64 {
    f64::INFINITY
}

fn default_targets() -> Vec<Target> {
    vec![
        Target {
            name: "overview".to_string(),
            interval: "5s".to_string(),
            capacity: 60,
            enabled: true,
            metrics: vec![
                MetricEntry {
                    name: "cpu_percent".to_string(),
                    min: 0.0,
                    max: 100.0,
                    jitter: Some(2.5),
                },
                MetricEntry {
                    name: "memory_percent".to_string(),
                    min: 0.0,
                    max: 100.0,
                    jitter: Some(2.5),
                },
                MetricEntry {
                    name: "request_rate".to_string(),
                    min: 0.0,
                    max: 1000.0,
                    jitter: Some(1.0),
                },
                MetricEntry {
                    name: "error_rate".to_string(),
                    min: 0.0,
                    max: 100.0,
                    jitter: Some(0.5),
                },
            ],
        },
        Target {
            name: "health".to_string(),
            interval: "10s".to_string(),
            capacity: 30,
            enabled: true,
            metrics: vec![
                MetricEntry {
                    name: "up".to_string(),
                    min: 0.0,
                    max: 1.0,
                    jitter: Some(0.0),
                },
                MetricEntry {
                    name: "probe_latency_ms".to_string(),
                    min: 0.0,
                    max: 30000.0,
                    jitter: Some(5.0),
                },
            ],
        },
    ]
}
