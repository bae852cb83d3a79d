use std::env;

use anyhow::{Context, Result};
use reqwest::blocking::RequestBuilder;

use crate::http_cache::snippet;
use crate::http_client::http_client;
use crate::normalize::{RawOddsEvent, parse_odds_event_json, parse_odds_event_list_json};
use crate::vocabulary::requested_markets;

const ODDS_API_BASE: &str = "https://api.the-odds-api.com/v4";

#[derive(Debug, Clone)]
pub struct OddsFetchConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub sport: String,
    pub regions: String,
    pub odds_format: String,
    pub markets: Vec<String>,
}

impl OddsFetchConfig {
    pub fn from_env() -> Self {
        let base_url = env_trimmed("ODDS_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| ODDS_API_BASE.to_string());
        let markets = env_trimmed("ODDS_MARKETS")
            .map(|raw| parse_markets(&raw))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(default_markets);

        Self {
            base_url,
            api_key: env_trimmed("ODDS_API_KEY"),
            sport: env_trimmed("ODDS_SPORT")
                .unwrap_or_else(|| "americanfootball_nfl".to_string()),
            regions: env_trimmed("ODDS_REGIONS")
                .unwrap_or_else(|| "us".to_string())
                .to_ascii_lowercase(),
            odds_format: env_trimmed("ODDS_FORMAT")
                .unwrap_or_else(|| "american".to_string())
                .to_ascii_lowercase(),
            markets,
        }
    }

    pub fn markets_param(&self) -> String {
        self.markets.join(",")
    }
}

impl Default for OddsFetchConfig {
    fn default() -> Self {
        Self {
            base_url: ODDS_API_BASE.to_string(),
            api_key: None,
            sport: "americanfootball_nfl".to_string(),
            regions: "us".to_string(),
            odds_format: "american".to_string(),
            markets: default_markets(),
        }
    }
}

/// Per-event odds for every upcoming event. Events whose odds failed are
/// left out and listed in `errors`.
#[derive(Debug, Clone, Default)]
pub struct EventOdds {
    pub events: Vec<RawOddsEvent>,
    pub errors: Vec<String>,
}

pub fn fetch_events(cfg: &OddsFetchConfig) -> Result<Vec<RawOddsEvent>> {
    let api_key = require_key(cfg)?;
    let url = format!("{}/sports/{}/events", cfg.base_url, cfg.sport);
    let client = http_client()?;
    let body = send(client.get(&url).query(&[("apiKey", api_key)]))
        .context("events request failed")?;
    parse_odds_event_list_json(&body)
}

pub fn fetch_event_odds(cfg: &OddsFetchConfig, event_id: &str) -> Result<RawOddsEvent> {
    let api_key = require_key(cfg)?;
    let url = format!(
        "{}/sports/{}/events/{event_id}/odds",
        cfg.base_url, cfg.sport
    );
    let markets = cfg.markets_param();
    let client = http_client()?;
    let body = send(client.get(&url).query(&[
        ("apiKey", api_key),
        ("regions", cfg.regions.as_str()),
        ("markets", markets.as_str()),
        ("oddsFormat", cfg.odds_format.as_str()),
    ]))
    .with_context(|| format!("odds request failed for event {event_id}"))?;
    parse_odds_event_json(&body)
}

/// Event list, then player prop odds per event. Only the provider's current
/// slate is available; past weeks have to come from the record store.
pub fn fetch_all_event_odds(cfg: &OddsFetchConfig) -> Result<EventOdds> {
    let events = fetch_events(cfg)?;
    tracing::info!(events = events.len(), sport = %cfg.sport, "odds events loaded");

    let mut out = EventOdds::default();
    for event in &events {
        let Some(event_id) = event.id.as_deref() else {
            out.errors.push(format!("event {} without id", event.label()));
            continue;
        };
        match fetch_event_odds(cfg, event_id) {
            Ok(odds) => out.events.push(odds),
            Err(err) => {
                tracing::warn!(event_id, "failed to fetch player props: {err:#}");
                out.errors
                    .push(format!("event {event_id} ({}): {err:#}", event.label()));
            }
        }
    }
    Ok(out)
}

fn send(req: RequestBuilder) -> Result<String> {
    let resp = req.send().context("request failed")?;
    let status = resp.status();
    if let Some(remaining) = resp
        .headers()
        .get("x-requests-remaining")
        .and_then(|v| v.to_str().ok())
    {
        tracing::debug!(remaining, "odds api quota");
    }
    let body = resp.text().context("failed reading odds body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("odds http {}: {}", status, snippet(&body)));
    }
    Ok(body)
}

fn require_key(cfg: &OddsFetchConfig) -> Result<&str> {
    cfg.api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("ODDS_API_KEY missing"))
}

fn default_markets() -> Vec<String> {
    requested_markets().into_iter().map(str::to_string).collect()
}

fn parse_markets(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let key = part.trim().to_ascii_lowercase();
        if !key.is_empty() && !out.contains(&key) {
            out.push(key);
        }
    }
    out
}

fn env_trimmed(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_list_is_split_and_deduplicated() {
        assert_eq!(
            parse_markets("player_pass_tds, player_rush_yds;PLAYER_PASS_TDS"),
            vec!["player_pass_tds".to_string(), "player_rush_yds".to_string()]
        );
    }

    #[test]
    fn default_config_requests_every_mapped_market() {
        let cfg = OddsFetchConfig::default();
        assert!(cfg.markets_param().contains("player_pass_tds"));
        assert_eq!(cfg.markets.len(), requested_markets().len());
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = fetch_events(&OddsFetchConfig::default()).unwrap_err();
        assert!(err.to_string().contains("ODDS_API_KEY"));
    }
}
