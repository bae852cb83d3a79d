use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel the odds provider uses when an outcome has no player description.
pub const UNKNOWN_PLAYER: &str = "N/A";

/// A single statistic as reported by a provider. Providers mix numbers and
/// display strings ("22/31", "2-14", "--"), so both are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

impl StatValue {
    /// Interpret a raw cell. Empty text yields `None`, numeric text becomes a number.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(Self::Number(n)),
            _ => Some(Self::Text(trimmed.to_string())),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.is_finite().then_some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatRecord {
    pub player_name: String,
    pub team: String,
    pub game_label: String,
    /// Stats provider category group, e.g. `passing`.
    pub category: String,
    /// Stats provider athlete id, when the payload carried one.
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
    /// Field label -> value. A label that is present with `None` was reported as null.
    pub stat_fields: BTreeMap<String, Option<StatValue>>,
}

impl PlayerStatRecord {
    pub fn field(&self, label: &str) -> Option<&StatValue> {
        self.stat_fields.get(label).and_then(Option::as_ref)
    }

    pub fn has_field(&self, label: &str) -> bool {
        self.stat_fields.contains_key(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPropRecord {
    pub event_label: String,
    pub bookmaker: String,
    /// Odds provider market key, e.g. `player_pass_tds`.
    pub market: String,
    pub player_name: String,
    /// Outcome name quoted by the book, usually `Over` or `Under`.
    pub side: String,
    pub line: Option<StatValue>,
    pub odds: Option<f64>,
}

impl PlayerPropRecord {
    pub fn has_player(&self) -> bool {
        let name = self.player_name.trim();
        !name.is_empty() && name != UNKNOWN_PLAYER
    }
}

/// A prop joined to the stat record it resolved against. Only lives between
/// matching and classification.
#[derive(Debug, Clone, Copy)]
pub struct MatchedPair<'a> {
    pub prop: &'a PlayerPropRecord,
    pub stat: &'a PlayerStatRecord,
    pub resolved_stat_value: Option<&'a StatValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnmatchedReason {
    NoMapping,
    NoMatchingPlayer,
}

impl UnmatchedReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::NoMapping => "no mapping",
            Self::NoMatchingPlayer => "no matching player",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UnmatchedProp<'a> {
    pub prop: &'a PlayerPropRecord,
    pub reason: UnmatchedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeResult {
    Over,
    Under,
    Push,
    NoData,
}

impl OutcomeResult {
    pub fn label(self) -> &'static str {
        match self {
            Self::Over => "Over",
            Self::Under => "Under",
            Self::Push => "Push",
            Self::NoData => "No Data",
        }
    }

    /// Over and Under are the only results that count toward hit rates.
    pub fn is_decided(self) -> bool {
        matches!(self, Self::Over | Self::Under)
    }
}

impl fmt::Display for OutcomeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedOutcome {
    pub event: String,
    pub player: String,
    pub prop_type: String,
    pub line: Option<StatValue>,
    pub actual_stat: Option<StatValue>,
    pub result: OutcomeResult,
    pub odds: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotalsSide {
    Over,
    Under,
}

impl TotalsSide {
    pub fn label(self) -> &'static str {
        match self {
            Self::Over => "Over",
            Self::Under => "Under",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsRow {
    pub side: TotalsSide,
    pub count: usize,
    pub denominator: usize,
    /// Fraction in `0.0..=1.0`; zero when the denominator is zero.
    pub fraction: f64,
}

impl TotalsRow {
    /// `1/1, 100.00% Over`
    pub fn summary(&self) -> String {
        format!(
            "{}/{}, {:.2}% {}",
            self.count,
            self.denominator,
            self.fraction * 100.0,
            self.side.label()
        )
    }
}

/// Hit tally for one market key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketTally {
    pub market: String,
    pub over: usize,
    pub under: usize,
    pub push: usize,
    pub no_data: usize,
}

impl MarketTally {
    pub fn over_fraction(&self) -> f64 {
        let decided = self.over + self.under;
        if decided == 0 {
            0.0
        } else {
            self.over as f64 / decided as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub outcomes: Vec<ClassifiedOutcome>,
    pub over: TotalsRow,
    pub under: TotalsRow,
    pub pushes: usize,
    pub no_data: usize,
}

/// One flat output row with the fixed comparison columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Event")]
    pub event: String,
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Prop Type")]
    pub prop_type: String,
    #[serde(rename = "Line")]
    pub line: String,
    #[serde(rename = "Actual Stat")]
    pub actual_stat: String,
    #[serde(rename = "Result")]
    pub result: String,
    #[serde(rename = "Odds")]
    pub odds: String,
}

pub const REPORT_COLUMNS: [&str; 7] = [
    "Event",
    "Player",
    "Prop Type",
    "Line",
    "Actual Stat",
    "Result",
    "Odds",
];

pub const TOTALS_EVENT: &str = "Totals";

impl ReportRow {
    pub fn from_outcome(outcome: &ClassifiedOutcome) -> Self {
        Self {
            event: outcome.event.clone(),
            player: outcome.player.clone(),
            prop_type: outcome.prop_type.clone(),
            line: opt_to_string(outcome.line.as_ref()),
            actual_stat: opt_to_string(outcome.actual_stat.as_ref()),
            result: outcome.result.label().to_string(),
            odds: opt_to_string(outcome.odds),
        }
    }

    pub fn from_totals(totals: &TotalsRow) -> Self {
        Self {
            event: TOTALS_EVENT.to_string(),
            player: String::new(),
            prop_type: String::new(),
            line: String::new(),
            actual_stat: String::new(),
            result: totals.summary(),
            odds: String::new(),
        }
    }

    pub fn is_totals(&self) -> bool {
        self.event == TOTALS_EVENT && self.player.is_empty()
    }

    pub fn cells(&self) -> [&str; 7] {
        [
            self.event.as_str(),
            self.player.as_str(),
            self.prop_type.as_str(),
            self.line.as_str(),
            self.actual_stat.as_str(),
            self.result.as_str(),
            self.odds.as_str(),
        ]
    }
}

impl ReconciliationReport {
    /// Outcome rows in prop order, then the Over and Under totals rows.
    pub fn rows(&self) -> Vec<ReportRow> {
        let mut rows: Vec<ReportRow> = self.outcomes.iter().map(ReportRow::from_outcome).collect();
        rows.push(ReportRow::from_totals(&self.over));
        rows.push(ReportRow::from_totals(&self.under));
        rows
    }

    pub fn totals(&self) -> [&TotalsRow; 2] {
        [&self.over, &self.under]
    }

    pub fn market_breakdown(&self) -> Vec<MarketTally> {
        let mut tallies: BTreeMap<&str, MarketTally> = BTreeMap::new();
        for outcome in &self.outcomes {
            let tally = tallies
                .entry(outcome.prop_type.as_str())
                .or_insert_with(|| MarketTally {
                    market: outcome.prop_type.clone(),
                    over: 0,
                    under: 0,
                    push: 0,
                    no_data: 0,
                });
            match outcome.result {
                OutcomeResult::Over => tally.over += 1,
                OutcomeResult::Under => tally.under += 1,
                OutcomeResult::Push => tally.push += 1,
                OutcomeResult::NoData => tally.no_data += 1,
            }
        }
        tallies.into_values().collect()
    }
}

/// Non-fatal anomalies raised while reconciling. None of these abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("no matching stat type for prop market {market}")]
    UnmappedCategory { market: String },
    #[error("no matching stats found for player {player} ({market})")]
    UnmatchedPlayer { player: String, market: String },
    #[error(
        "player name {player} appears on several teams ({}), using {chosen}{}",
        .teams.join(", "),
        id_note(.player_ids)
    )]
    AmbiguousPlayer {
        player: String,
        teams: Vec<String>,
        chosen: String,
        /// Provider athlete ids behind the name, in record order.
        player_ids: Vec<String>,
    },
    #[error("malformed {context}: {detail}")]
    MalformedInput { context: String, detail: String },
}

impl Diagnostic {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnmappedCategory { .. } => "unmapped_category",
            Self::UnmatchedPlayer { .. } => "unmatched_player",
            Self::AmbiguousPlayer { .. } => "ambiguous_player",
            Self::MalformedInput { .. } => "malformed_input",
        }
    }
}

fn id_note(ids: &[String]) -> String {
    if ids.is_empty() {
        String::new()
    } else {
        format!(" (provider ids {})", ids.join(", "))
    }
}

fn opt_to_string<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
