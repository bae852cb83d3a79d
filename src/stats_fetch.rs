use std::env;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::config::WeekSelector;
use crate::http_cache::{fetch_json_cached, persist_cache};
use crate::http_client::http_client;
use crate::model::Diagnostic;
use crate::normalize::{
    Normalized, RawGameSummary, ScoreboardGame, parse_espn_scoreboard_json,
    parse_espn_summary_json,
};

const ESPN_NFL_BASE: &str = "https://site.api.espn.com/apis/site/v2/sports/football/nfl";
const DEFAULT_PARALLELISM: usize = 6;

#[derive(Debug, Clone)]
pub struct StatsFetchConfig {
    pub base_url: String,
    pub parallelism: usize,
}

impl StatsFetchConfig {
    pub fn from_env() -> Self {
        let base_url = env::var("STATS_BASE_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| ESPN_NFL_BASE.to_string());
        let parallelism = env::var("FETCH_PARALLELISM")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_PARALLELISM)
            .clamp(2, 32);
        Self {
            base_url,
            parallelism,
        }
    }
}

impl Default for StatsFetchConfig {
    fn default() -> Self {
        Self {
            base_url: ESPN_NFL_BASE.to_string(),
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

/// Games for one week. Games whose summary failed are left out and listed
/// in `errors`; scoreboard entries that could not be used land in
/// `diagnostics`.
#[derive(Debug, Clone, Default)]
pub struct WeekSummaries {
    pub games: Vec<RawGameSummary>,
    pub errors: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn scoreboard_url(cfg: &StatsFetchConfig, week: &WeekSelector) -> String {
    format!(
        "{}/scoreboard?dates={}&seasontype={}&week={}",
        cfg.base_url,
        week.year,
        week.season_type.code(),
        week.week
    )
}

pub fn summary_url(cfg: &StatsFetchConfig, game_id: &str) -> String {
    format!("{}/summary?event={game_id}", cfg.base_url)
}

pub fn fetch_scoreboard(
    cfg: &StatsFetchConfig,
    week: &WeekSelector,
) -> Result<Normalized<ScoreboardGame>> {
    let client = http_client()?;
    let url = scoreboard_url(cfg, week);
    let body = fetch_json_cached(client, &url).context("scoreboard request failed")?;
    parse_espn_scoreboard_json(&body)
}

pub fn fetch_game_summary(cfg: &StatsFetchConfig, game: &ScoreboardGame) -> Result<RawGameSummary> {
    let client = http_client()?;
    let url = summary_url(cfg, &game.id);
    let body = fetch_json_cached(client, &url)
        .with_context(|| format!("summary request failed for game {}", game.id))?;
    let teams = parse_espn_summary_json(&body)
        .with_context(|| format!("summary for game {}", game.id))?;
    Ok(RawGameSummary {
        game_id: game.id.clone(),
        home_team: game.home_team.clone(),
        away_team: game.away_team.clone(),
        home_score: game.home_score,
        away_score: game.away_score,
        teams,
    })
}

/// Scoreboard, then every game summary on a bounded pool. A failing
/// scoreboard is fatal for the batch; a failing summary is not.
pub fn fetch_week_summaries(cfg: &StatsFetchConfig, week: &WeekSelector) -> Result<WeekSummaries> {
    let Normalized {
        records: games,
        diagnostics,
    } = fetch_scoreboard(cfg, week)?;
    tracing::info!(%week, games = games.len(), skipped = diagnostics.len(), "scoreboard loaded");

    let pool = build_fetch_pool(cfg.parallelism);
    let results: Vec<Result<RawGameSummary>> = with_fetch_pool(&pool, || {
        games
            .par_iter()
            .map(|game| fetch_game_summary(cfg, game))
            .collect()
    });

    let mut out = WeekSummaries {
        diagnostics,
        ..WeekSummaries::default()
    };
    for (game, result) in games.iter().zip(results) {
        match result {
            Ok(summary) => out.games.push(summary),
            Err(err) => {
                tracing::warn!(game_id = %game.id, "failed to retrieve summary: {err:#}");
                out.errors.push(format!(
                    "game {} ({} vs {}): {err:#}",
                    game.id, game.home_team, game.away_team
                ));
            }
        }
    }

    if let Err(err) = persist_cache() {
        tracing::warn!("http cache not saved: {err:#}");
    }
    Ok(out)
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|idx| format!("stats-fetch-{idx}"))
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
