// ⚙️ Configuration - defaults → JSON file → environment

use crate::fare::FareFormula;
use crate::notify::ADMIN_EMAIL;
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Names the JSON config file
pub const CONFIG_ENV: &str = "RIDESMARTER_CONFIG";
pub const BIND_ENV: &str = "RIDESMARTER_BIND";
pub const PAYMENT_DELAY_ENV: &str = "RIDESMARTER_PAYMENT_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,

    /// Artificial delay of the mock payment step
    pub payment_delay_ms: u64,

    /// Receives a notice for every new booking
    pub admin_email: String,

    /// Optional JSON file with the starting fare formula
    pub fare_formula_path: Option<PathBuf>,

    /// Seed the admin ledger with demo bookings
    pub demo_bookings: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_address: "0.0.0.0:3000".to_string(),
            payment_delay_ms: 1500,
            admin_email: ADMIN_EMAIL.to_string(),
            fare_formula_path: None,
            demo_bookings: true,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Defaults, then the file named by `RIDESMARTER_CONFIG`, then env overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(BIND_ENV) {
            self.bind_address = bind;
        }

        if let Some(delay) = lookup(PAYMENT_DELAY_ENV) {
            self.payment_delay_ms = delay
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of milliseconds, got {:?}", PAYMENT_DELAY_ENV, delay))?;
        }

        Ok(())
    }

    pub fn payment_delay(&self) -> Duration {
        Duration::from_millis(self.payment_delay_ms)
    }

    /// Starting fare formula: the configured file, or the built-in default
    pub fn fare_formula(&self) -> Result<FareFormula> {
        match &self.fare_formula_path {
            Some(path) => FareFormula::from_file(path),
            None => Ok(FareFormula::default()),
        }
    }
}

/// Install the global tracing subscriber on stderr (`RUST_LOG`, default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// TESTS
// ============================================================================
