//! Configuration module - environment variable parsing

use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Game engine pub/sub address (host:port)
    pub engine_addr: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Serial device of the Bluetooth module
    pub serial_device: String,
    /// Serial baud rate
    pub serial_baud: u32,
    /// Bounded per-read ack timeout
    pub serial_timeout: Duration,

    /// Decision ticks per second; 0 disables the decision tick
    pub decision_hz: u32,
    /// Fixed world-tick rate driving the frightened-timer decay
    pub world_hz: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let world_hz = parse_or("WORLD_HZ", 24)?;
        if world_hz == 0 {
            return Err(ConfigError::ZeroWorldRate);
        }

        Ok(Self {
            engine_addr: env::var("ENGINE_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:11297".to_string()),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            serial_device: env::var("SERIAL_DEVICE")
                .unwrap_or_else(|_| "/dev/rfcomm0".to_string()),
            serial_baud: parse_or("SERIAL_BAUD", 115_200)?,
            serial_timeout: Duration::from_millis(parse_or("SERIAL_TIMEOUT_MS", 1_000)?),

            decision_hz: parse_or("DECISION_HZ", 32)?,
            world_hz,
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("World tick rate must be positive")]
    ZeroWorldRate,
}
