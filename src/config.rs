use crate::holidays::{Birthday, Classifier, HolidayTable};
use crate::worktime::{ShiftTemplate, WeekdaySchedule};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file read when none is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "zeitblatt.toml";

/// Prefix of environment variables that override config file settings
pub const ENV_PREFIX: &str = "ZEITBLATT_";

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// JSON file holding the logged work times
    #[serde(default = "default_store")]
    pub store: PathBuf,

    /// File that log messages are written to; nothing is logged if unset
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// How long an edited day must stay untouched before it is saved
    #[serde(default = "default_save_delay_ms")]
    pub save_delay_ms: u64,

    #[serde(default)]
    pub birthdays: Vec<Birthday>,

    /// Default working hours; replaces the built-in Monday-to-Friday
    /// schedule entirely when present
    #[serde(default)]
    pub schedule: Option<ScheduleToml>,
}

fn default_store() -> PathBuf {
    PathBuf::from("zeitblatt.json")
}

fn default_save_delay_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Config {
        Config {
            store: default_store(),
            log_file: None,
            save_delay_ms: default_save_delay_ms(),
            birthdays: Vec::new(),
            schedule: None,
        }
    }
}

impl Config {
    /// Read the config from `path` (or [`DEFAULT_CONFIG_FILE`] if `None`)
    /// and from the environment.  A missing default file is not an error,
    /// but a missing file named explicitly is.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let file = match path {
            Some(p) if !p.exists() => return Err(ConfigError::Missing(p.to_owned())),
            Some(p) => p.to_owned(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };
        Config::from_figment(
            Figment::new()
                .merge(Toml::file(file))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Config, ConfigError> {
        figment
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    pub fn schedule(&self) -> WeekdaySchedule {
        self.schedule
            .clone()
            .map_or_else(WeekdaySchedule::default, WeekdaySchedule::from)
    }

    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms)
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(
            HolidayTable::austria(),
            self.birthdays.clone(),
            self.schedule(),
        )
    }
}

/// The `[schedule]` table, one optional shift per weekday:
///
/// ```toml
/// [schedule]
/// monday = { start = "08:00", end = "16:30", breaks = [["12:00", "12:30"]] }
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScheduleToml {
    pub sunday: Option<ShiftTemplate>,
    pub monday: Option<ShiftTemplate>,
    pub tuesday: Option<ShiftTemplate>,
    pub wednesday: Option<ShiftTemplate>,
    pub thursday: Option<ShiftTemplate>,
    pub friday: Option<ShiftTemplate>,
    pub saturday: Option<ShiftTemplate>,
}

impl From<ScheduleToml> for WeekdaySchedule {
    fn from(value: ScheduleToml) -> WeekdaySchedule {
        WeekdaySchedule::new([
            value.sunday,
            value.monday,
            value.tuesday,
            value.wednesday,
            value.thursday,
            value.friday,
            value.saturday,
        ])
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} does not exist", .0.display())]
    Missing(PathBuf),
    #[error(transparent)]
    Invalid(Box<figment::Error>),
}
