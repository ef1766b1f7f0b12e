use std::path::Path;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DayplanError, Result};

/// Top-level configuration for dayplan.
///
/// Loaded from `~/.dayplan/config.toml` by default. Every section falls back
/// to its defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayplanConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl DayplanConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DayplanConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check that every value can actually drive the scheduler.
    pub fn validate(&self) -> Result<()> {
        self.schedule.timezone()?;
        self.schedule.window()?;
        if self.schedule.todo_horizon_days == 0 {
            return Err(DayplanError::Config(
                "todo_horizon_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Placement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// IANA zone all timestamps are normalized to.
    pub timezone: String,
    /// Start of the daily working window, `HH:MM`.
    pub day_start: String,
    /// End of the daily working window, `HH:MM` (exclusive).
    pub day_end: String,
    /// Days searched for a free slot for an undated todo, today included.
    pub todo_horizon_days: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: "America/Toronto".to_string(),
            day_start: "08:00".to_string(),
            day_end: "20:00".to_string(),
            todo_horizon_days: 7,
        }
    }
}

impl ScheduleConfig {
    /// The configured zone.
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| DayplanError::Config(format!("Unknown timezone {}: {}", self.timezone, e)))
    }

    /// The working window as local times, start strictly before end.
    pub fn window(&self) -> Result<(NaiveTime, NaiveTime)> {
        let start = parse_clock_time("day_start", &self.day_start)?;
        let end = parse_clock_time("day_end", &self.day_end)?;
        if start >= end {
            return Err(DayplanError::Config(format!(
                "day_start {} must be before day_end {}",
                self.day_start, self.day_end
            )));
        }
        Ok((start, end))
    }
}

/// Event store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the day-keyed JSON event file.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "events.json".to_string(),
        }
    }
}

fn parse_clock_time(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| DayplanError::Config(format!("Invalid {} {:?}: {}", field, value, e)))
}
