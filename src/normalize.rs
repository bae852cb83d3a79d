use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::model::{Diagnostic, PlayerPropRecord, PlayerStatRecord, StatValue, UNKNOWN_PLAYER};
use crate::vocabulary::{
    DERIVED_PASS_ATTEMPTS, DERIVED_PASS_COMPLETIONS, PASS_COMPLETIONS_ATTEMPTS, category_fields,
};

/// Records produced by a normalizer plus whatever it had to paper over.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

/// One finished game as seen by the stats provider: the scoreboard header
/// joined with the summary's box score.
#[derive(Debug, Clone, Default)]
pub struct RawGameSummary {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub teams: Vec<RawTeamBox>,
}

impl RawGameSummary {
    pub fn label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTeamBox {
    #[serde(deserialize_with = "null_as_default")]
    pub team: RawTeamRef,
    #[serde(deserialize_with = "null_as_default")]
    pub statistics: Vec<RawStatCategory>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTeamRef {
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "shortDisplayName")]
    pub short_display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStatCategory {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub athletes: Vec<RawAthleteLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAthleteLine {
    #[serde(deserialize_with = "null_as_default")]
    pub athlete: RawAthlete,
    /// Positional values, matched to labels by the category field table.
    #[serde(deserialize_with = "null_as_default")]
    pub stats: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAthlete {
    /// Provider athlete id. Kept for diagnostics, never joined on.
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

/// Scoreboard header for one game in a week.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreboardGame {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOddsEvent {
    pub id: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub commence_time: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub bookmakers: Vec<RawBookmaker>,
}

impl RawOddsEvent {
    pub fn label(&self) -> String {
        format!(
            "{} vs {}",
            self.home_team.as_deref().unwrap_or(UNKNOWN_PLAYER),
            self.away_team.as_deref().unwrap_or(UNKNOWN_PLAYER)
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawBookmaker {
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    pub title: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub markets: Vec<RawMarket>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMarket {
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOutcome {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub point: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EspnScoreboard {
    #[serde(deserialize_with = "null_as_default")]
    events: Vec<EspnEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EspnEvent {
    #[serde(deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    competitions: Vec<EspnCompetition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EspnCompetition {
    #[serde(deserialize_with = "null_as_default")]
    competitors: Vec<EspnCompetitor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EspnCompetitor {
    #[serde(rename = "homeAway", deserialize_with = "null_as_default")]
    home_away: String,
    #[serde(deserialize_with = "null_as_default")]
    team: RawTeamRef,
    score: Value,
}

/// Scoreboard headers for a week. Events without an id cannot be looked up
/// and are skipped with a diagnostic.
pub fn parse_espn_scoreboard_json(raw: &str) -> Result<Normalized<ScoreboardGame>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Normalized::default());
    }
    let board: EspnScoreboard = serde_json::from_str(trimmed).context("invalid scoreboard json")?;

    let mut out = Normalized::default();
    for (idx, event) in board.events.into_iter().enumerate() {
        let Some(id) = event.id else {
            out.diagnostics.push(Diagnostic::MalformedInput {
                context: format!(
                    "scoreboard event {}",
                    event.short_name.unwrap_or_else(|| format!("#{idx}"))
                ),
                detail: "event without an id".to_string(),
            });
            continue;
        };
        let competitors = event
            .competitions
            .into_iter()
            .next()
            .map(|c| c.competitors)
            .unwrap_or_default();
        let home = find_side(&competitors, "home");
        let away = find_side(&competitors, "away");
        out.records.push(ScoreboardGame {
            id,
            home_team: home.map(competitor_name).unwrap_or_else(unknown),
            away_team: away.map(competitor_name).unwrap_or_else(unknown),
            home_score: home.and_then(|c| value_to_u32(&c.score)),
            away_score: away.and_then(|c| value_to_u32(&c.score)),
        });
    }
    Ok(out)
}

/// Box score teams from a game summary payload. A summary without a box
/// score (game not played yet) is empty rather than an error.
pub fn parse_espn_summary_json(raw: &str) -> Result<Vec<RawTeamBox>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid summary json")?;
    let Some(players) = root.get("boxscore").and_then(|b| b.get("players")) else {
        return Ok(Vec::new());
    };
    let teams: Option<Vec<RawTeamBox>> =
        serde_json::from_value(players.clone()).context("invalid boxscore players")?;
    Ok(teams.unwrap_or_default())
}

pub fn parse_odds_event_json(raw: &str) -> Result<RawOddsEvent> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(RawOddsEvent::default());
    }
    serde_json::from_str(trimmed).context("invalid odds event json")
}

/// Event ids from the odds provider's event listing.
pub fn parse_odds_event_list_json(raw: &str) -> Result<Vec<RawOddsEvent>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("invalid odds event list json")
}

pub fn normalize_stats(games: &[RawGameSummary]) -> Normalized<PlayerStatRecord> {
    let mut out = Normalized::default();

    for game in games {
        let game_label = game.label();
        for team_box in &game.teams {
            let team = team_box
                .team
                .display_name
                .clone()
                .or_else(|| team_box.team.short_display_name.clone())
                .unwrap_or_default();
            if team.is_empty() {
                out.diagnostics.push(Diagnostic::MalformedInput {
                    context: format!("box score for {game_label}"),
                    detail: "team without a display name".to_string(),
                });
            }

            for category in &team_box.statistics {
                let labels = category_fields(&category.name);
                if labels.is_none() {
                    tracing::debug!(
                        category = %category.name,
                        "unknown stat category, fields left empty"
                    );
                }

                for line in &category.athletes {
                    let Some(player_name) = line
                        .athlete
                        .display_name
                        .as_deref()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                    else {
                        out.diagnostics.push(Diagnostic::MalformedInput {
                            context: format!("{} {} for {game_label}", team, category.name),
                            detail: "athlete without a display name".to_string(),
                        });
                        continue;
                    };

                    out.records.push(PlayerStatRecord {
                        player_name: player_name.to_string(),
                        team: team.clone(),
                        game_label: game_label.clone(),
                        category: category.name.clone(),
                        player_id: line.athlete.id.clone(),
                        home_score: game.home_score,
                        away_score: game.away_score,
                        stat_fields: zip_stat_fields(labels.unwrap_or_default(), &line.stats),
                    });
                }
            }
        }
    }

    out
}

/// Zip positional values against labels, stopping at the shorter side.
pub fn zip_stat_fields(labels: &[&str], stats: &[Value]) -> BTreeMap<String, Option<StatValue>> {
    let mut fields: BTreeMap<String, Option<StatValue>> = labels
        .iter()
        .zip(stats)
        .map(|(label, raw)| (label.to_string(), value_to_stat(raw)))
        .collect();

    let split = fields
        .get(PASS_COMPLETIONS_ATTEMPTS)
        .and_then(Option::as_ref)
        .and_then(split_made_attempted);
    if let Some((made, attempted)) = split {
        fields.insert(
            DERIVED_PASS_COMPLETIONS.to_string(),
            Some(StatValue::Number(made)),
        );
        fields.insert(
            DERIVED_PASS_ATTEMPTS.to_string(),
            Some(StatValue::Number(attempted)),
        );
    }

    fields
}

pub fn normalize_props(events: &[RawOddsEvent]) -> Normalized<PlayerPropRecord> {
    let mut out = Normalized::default();

    for event in events {
        let event_label = event.label();
        if event.home_team.is_none() || event.away_team.is_none() {
            out.diagnostics.push(Diagnostic::MalformedInput {
                context: format!("odds event {}", event.id.as_deref().unwrap_or("?")),
                detail: "missing home/away team".to_string(),
            });
        }

        for bookmaker in &event.bookmakers {
            let book = bookmaker
                .title
                .clone()
                .unwrap_or_else(|| bookmaker.key.clone());
            for market in &bookmaker.markets {
                for outcome in &market.outcomes {
                    if outcome.price.is_none() {
                        out.diagnostics.push(Diagnostic::MalformedInput {
                            context: format!("{book} {} for {event_label}", market.key),
                            detail: "outcome without a price".to_string(),
                        });
                    }
                    out.records.push(PlayerPropRecord {
                        event_label: event_label.clone(),
                        bookmaker: book.clone(),
                        market: market.key.clone(),
                        player_name: outcome
                            .description
                            .clone()
                            .unwrap_or_else(|| UNKNOWN_PLAYER.to_string()),
                        side: outcome.name.clone().unwrap_or_default(),
                        line: outcome.point.map(StatValue::Number),
                        odds: outcome.price,
                    });
                }
            }
        }
    }

    out
}

/// Providers send `null` where a list or name is empty. Treat it as absent.
fn null_as_default<'de, D, T>(de: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Ids arrive as strings or bare numbers; anything else counts as missing.
fn lenient_id<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn value_to_stat(raw: &Value) -> Option<StatValue> {
    match raw {
        Value::Null => None,
        Value::Number(n) => n.as_f64().map(StatValue::Number),
        Value::String(s) => StatValue::parse(s),
        other => StatValue::parse(&other.to_string()),
    }
}

fn value_to_u32(raw: &Value) -> Option<u32> {
    match raw {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn split_made_attempted(value: &StatValue) -> Option<(f64, f64)> {
    let StatValue::Text(text) = value else {
        return None;
    };
    let (made, attempted) = text.split_once('/')?;
    let made = made.trim().parse::<u32>().ok()?;
    let attempted = attempted.trim().parse::<u32>().ok()?;
    Some((f64::from(made), f64::from(attempted)))
}

fn find_side<'a>(competitors: &'a [EspnCompetitor], which: &str) -> Option<&'a EspnCompetitor> {
    competitors.iter().find(|c| c.home_away == which)
}

fn competitor_name(c: &EspnCompetitor) -> String {
    c.team
        .short_display_name
        .clone()
        .or_else(|| c.team.display_name.clone())
        .unwrap_or_else(unknown)
}

fn unknown() -> String {
    UNKNOWN_PLAYER.to_string()
}
