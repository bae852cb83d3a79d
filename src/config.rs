use std::env;
use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, Local};
use clap::ValueEnum;

use crate::odds_fetch::OddsFetchConfig;
use crate::stats_fetch::StatsFetchConfig;

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum SeasonType {
    Preseason,
    Regular,
    Postseason,
}

impl SeasonType {
    /// Numeric code the stats provider expects in `seasontype`.
    pub fn code(self) -> u8 {
        match self {
            Self::Preseason => 1,
            Self::Regular => 2,
            Self::Postseason => 3,
        }
    }
}

/// The week a run is about. Passed explicitly to every fetch, store and
/// export call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekSelector {
    pub year: i32,
    pub week: u8,
    pub season_type: SeasonType,
}

impl WeekSelector {
    pub fn new(year: i32, week: u8) -> Self {
        Self {
            year,
            week,
            season_type: SeasonType::Regular,
        }
    }

    /// Week 1 of the regular season in the current calendar year.
    pub fn current_year_default() -> Self {
        Self::new(Local::now().year(), 1)
    }

    pub fn with_season_type(mut self, season_type: SeasonType) -> Self {
        self.season_type = season_type;
        self
    }

    /// Stable file-name fragment, e.g. `2024_week_3`, with a suffix for
    /// non-regular seasons.
    pub fn slug(&self) -> String {
        match self.season_type {
            SeasonType::Regular => format!("{}_week_{}", self.year, self.week),
            SeasonType::Preseason => format!("{}_pre_week_{}", self.year, self.week),
            SeasonType::Postseason => format!("{}_post_week_{}", self.year, self.week),
        }
    }
}

impl fmt::Display for WeekSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} week {}", self.year, self.week)?;
        match self.season_type {
            SeasonType::Regular => Ok(()),
            SeasonType::Preseason => f.write_str(" (preseason)"),
            SeasonType::Postseason => f.write_str(" (postseason)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Csv,
    Sqlite,
}

impl StoreKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "sqlite" | "sqlite3" | "db" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub store: StoreKind,
    pub odds: OddsFetchConfig,
    pub stats: StatsFetchConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = env::var("DATA_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let store = env::var("RECORD_STORE")
            .ok()
            .and_then(|raw| {
                let parsed = StoreKind::parse(&raw);
                if parsed.is_none() {
                    tracing::warn!(value = %raw, "unknown RECORD_STORE, using csv");
                }
                parsed
            })
            .unwrap_or(StoreKind::Csv);

        Self {
            data_dir,
            store,
            odds: OddsFetchConfig::from_env(),
            stats: StatsFetchConfig::from_env(),
        }
    }
}

/// Load `.env.local` then `.env` if present. Existing variables win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}
