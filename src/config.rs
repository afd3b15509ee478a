//! Process-wide simulator configuration.
//!
//! The defaults describe the virtual serial fixture used by the integration
//! rig. Any field can be overridden from the environment with the
//! `METER_SIM_` prefix, e.g. `METER_SIM_DEVICE_PATH=/tmp/ttyV3` or
//! `METER_SIM_READ_TIMEOUT=250ms`.

use crate::error::SimulatorError;
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "METER_SIM_";

/// Settings injected into the transport and the engine at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Path of the serial device exposed by the pairing utility.
    pub device_path: PathBuf,
    /// Baud rate used when opening the device.
    pub baud_rate: u32,
    /// Upper bound for a single read call. An unterminated fragment older
    /// than this is released as a line.
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    /// Delay between polls while no input is pending.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Delay between checks for the device path at startup.
    #[serde(with = "humantime_serde")]
    pub device_wait_interval: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from("/tmp/ttyV1"),
            baud_rate: 9600,
            read_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
            device_wait_interval: Duration::from_secs(1),
        }
    }
}

impl SimulatorConfig {
    /// Load the defaults overlaid with `METER_SIM_*` environment variables.
    pub fn load() -> Result<Self, SimulatorError> {
        Self::from_figment(Figment::new().merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Extract a validated configuration, using the defaults for any field
    /// the given figment does not provide.
    pub fn from_figment(overrides: Figment) -> Result<Self, SimulatorError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(overrides)
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulator cannot run with.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        if self.device_path.as_os_str().is_empty() {
            return Err(SimulatorError::InvalidConfig(
                "device_path must not be empty".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(SimulatorError::InvalidConfig(
                "baud_rate must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(SimulatorError::InvalidConfig(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.device_wait_interval.is_zero() {
            return Err(SimulatorError::InvalidConfig(
                "device_wait_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
