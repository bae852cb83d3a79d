use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::config::{StoreKind, WeekSelector};
use crate::model::{PlayerPropRecord, PlayerStatRecord, ReconciliationReport, StatValue};
use crate::vocabulary::all_field_labels;

const STATS_FIXED_COLUMNS: [&str; 7] = [
    "Game",
    "Team",
    "Category",
    "Player",
    "Player ID",
    "Home Team Score",
    "Away Team Score",
];

/// Persists normalized record sets per week.
pub trait RecordStore {
    fn describe(&self) -> String;
    fn save_stats(&mut self, week: &WeekSelector, records: &[PlayerStatRecord]) -> Result<()>;
    fn load_stats(&self, week: &WeekSelector) -> Result<Vec<PlayerStatRecord>>;
    fn save_props(&mut self, week: &WeekSelector, records: &[PlayerPropRecord]) -> Result<()>;
    fn load_props(&self, week: &WeekSelector) -> Result<Vec<PlayerPropRecord>>;
}

pub fn open_store(kind: StoreKind, data_dir: &Path) -> Result<Box<dyn RecordStore>> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;
    Ok(match kind {
        StoreKind::Csv => Box::new(CsvStore::new(data_dir)),
        StoreKind::Sqlite => Box::new(SqliteStore::open(&data_dir.join("records.sqlite"))?),
    })
}

/// One wide CSV per record set and week. The props layout matches what
/// people keep by hand, so past lines can be dropped in and compared.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct PropRow {
    #[serde(rename = "Event", default)]
    event: String,
    #[serde(rename = "Bookmaker", default)]
    bookmaker: String,
    #[serde(rename = "Market", default)]
    market: String,
    #[serde(rename = "Player", default)]
    player: String,
    #[serde(rename = "Prop", default)]
    prop: String,
    #[serde(rename = "Line", default)]
    line: String,
    #[serde(rename = "Odds", default)]
    odds: String,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn stats_path(&self, week: &WeekSelector) -> PathBuf {
        self.dir
            .join(format!("nfl_{}_player_stats.csv", week.slug()))
    }

    pub fn props_path(&self, week: &WeekSelector) -> PathBuf {
        self.dir
            .join(format!("nfl_{}_player_props.csv", week.slug()))
    }
}

impl RecordStore for CsvStore {
    fn describe(&self) -> String {
        format!("csv files in {}", self.dir.display())
    }

    fn save_stats(&mut self, week: &WeekSelector, records: &[PlayerStatRecord]) -> Result<()> {
        let path = self.stats_path(week);
        let labels = stat_columns(records);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("open {} for writing", path.display()))?;

        let mut header: Vec<&str> = STATS_FIXED_COLUMNS.to_vec();
        header.extend(labels.iter().map(String::as_str));
        writer.write_record(&header).context("write stats header")?;

        for record in records {
            let mut row = vec![
                record.game_label.clone(),
                record.team.clone(),
                record.category.clone(),
                record.player_name.clone(),
                opt_to_string(record.player_id.as_deref()),
                opt_to_string(record.home_score),
                opt_to_string(record.away_score),
            ];
            row.extend(
                labels
                    .iter()
                    .map(|label| opt_to_string(record.field(label))),
            );
            writer
                .write_record(&row)
                .with_context(|| format!("write stats row for {}", record.player_name))?;
        }
        writer.flush().context("flush stats csv")?;
        Ok(())
    }

    fn load_stats(&self, week: &WeekSelector) -> Result<Vec<PlayerStatRecord>> {
        let path = self.stats_path(week);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)
            .with_context(|| format!("open {}", path.display()))?;
        let header = reader.headers().context("read stats header")?.clone();
        let column = |name: &str| header.iter().position(|h| h.trim() == name);
        let fixed: Vec<Option<usize>> = STATS_FIXED_COLUMNS
            .iter()
            .map(|&name| column(name))
            .collect();

        let mut out = Vec::new();
        for (idx, row) in reader.records().enumerate() {
            let row = row.with_context(|| format!("stats row {}", idx + 2))?;
            let cell = |pos: Option<usize>| {
                pos.and_then(|p| row.get(p))
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default()
            };
            let stat_fields = header
                .iter()
                .enumerate()
                .filter(|(pos, _)| !fixed.contains(&Some(*pos)))
                .filter_map(|(pos, label)| {
                    let value = StatValue::parse(row.get(pos)?)?;
                    Some((label.trim().to_string(), Some(value)))
                })
                .collect::<BTreeMap<_, _>>();

            out.push(PlayerStatRecord {
                game_label: cell(fixed[0]),
                team: cell(fixed[1]),
                category: cell(fixed[2]),
                player_name: cell(fixed[3]),
                player_id: Some(cell(fixed[4])).filter(|id| !id.is_empty()),
                home_score: cell(fixed[5]).parse().ok(),
                away_score: cell(fixed[6]).parse().ok(),
                stat_fields,
            });
        }
        Ok(out)
    }

    fn save_props(&mut self, week: &WeekSelector, records: &[PlayerPropRecord]) -> Result<()> {
        let path = self.props_path(week);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("open {} for writing", path.display()))?;
        for record in records {
            writer
                .serialize(PropRow {
                    event: record.event_label.clone(),
                    bookmaker: record.bookmaker.clone(),
                    market: record.market.clone(),
                    player: record.player_name.clone(),
                    prop: record.side.clone(),
                    line: opt_to_string(record.line.as_ref()),
                    odds: opt_to_string(record.odds),
                })
                .context("write props row")?;
        }
        writer.flush().context("flush props csv")?;
        Ok(())
    }

    fn load_props(&self, week: &WeekSelector) -> Result<Vec<PlayerPropRecord>> {
        let path = self.props_path(week);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)
            .with_context(|| format!("open {}", path.display()))?;

        let mut out = Vec::new();
        for (idx, row) in reader.deserialize::<PropRow>().enumerate() {
            let row = row.with_context(|| format!("props row {}", idx + 2))?;
            out.push(PlayerPropRecord {
                event_label: row.event,
                bookmaker: row.bookmaker,
                market: row.market.trim().to_string(),
                player_name: row.player,
                side: row.prop,
                line: StatValue::parse(&row.line),
                odds: row.odds.trim().parse::<f64>().ok(),
            });
        }
        Ok(out)
    }
}

/// Week-scoped tables in one SQLite file. Saving a week replaces it.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite")?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS stat_records (
            season INTEGER NOT NULL,
            season_type INTEGER NOT NULL,
            week INTEGER NOT NULL,
            seq INTEGER NOT NULL,
            game_label TEXT NOT NULL,
            team TEXT NOT NULL,
            category TEXT NOT NULL,
            player_name TEXT NOT NULL,
            player_id TEXT NULL,
            home_score INTEGER NULL,
            away_score INTEGER NULL,
            stat_fields_json TEXT NOT NULL,
            PRIMARY KEY (season, season_type, week, seq)
        );
        CREATE INDEX IF NOT EXISTS idx_stat_records_player ON stat_records(player_name);

        CREATE TABLE IF NOT EXISTS prop_records (
            season INTEGER NOT NULL,
            season_type INTEGER NOT NULL,
            week INTEGER NOT NULL,
            seq INTEGER NOT NULL,
            event_label TEXT NOT NULL,
            bookmaker TEXT NOT NULL,
            market TEXT NOT NULL,
            player_name TEXT NOT NULL,
            side TEXT NOT NULL,
            line_json TEXT NULL,
            odds REAL NULL,
            PRIMARY KEY (season, season_type, week, seq)
        );
        CREATE INDEX IF NOT EXISTS idx_prop_records_market ON prop_records(market);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn week_params(week: &WeekSelector) -> (i64, i64, i64) {
    (
        i64::from(week.year),
        i64::from(week.season_type.code()),
        i64::from(week.week),
    )
}

impl RecordStore for SqliteStore {
    fn describe(&self) -> String {
        format!("sqlite db {}", self.path.display())
    }

    fn save_stats(&mut self, week: &WeekSelector, records: &[PlayerStatRecord]) -> Result<()> {
        let (season, season_type, wk) = week_params(week);
        let tx = self.conn.transaction().context("begin stats transaction")?;
        tx.execute(
            "DELETE FROM stat_records WHERE season = ?1 AND season_type = ?2 AND week = ?3",
            params![season, season_type, wk],
        )
        .context("clear stats week")?;
        for (seq, record) in records.iter().enumerate() {
            let fields_json =
                serde_json::to_string(&record.stat_fields).context("serialize stat fields")?;
            tx.execute(
                r#"
                INSERT INTO stat_records (
                    season, season_type, week, seq, game_label, team, category,
                    player_name, player_id, home_score, away_score, stat_fields_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    season,
                    season_type,
                    wk,
                    seq as i64,
                    record.game_label,
                    record.team,
                    record.category,
                    record.player_name,
                    record.player_id,
                    record.home_score.map(i64::from),
                    record.away_score.map(i64::from),
                    fields_json,
                ],
            )
            .context("insert stat record")?;
        }
        tx.commit().context("commit stats transaction")?;
        Ok(())
    }

    fn load_stats(&self, week: &WeekSelector) -> Result<Vec<PlayerStatRecord>> {
        let (season, season_type, wk) = week_params(week);
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT game_label, team, category, player_name, player_id, home_score,
                       away_score, stat_fields_json
                FROM stat_records
                WHERE season = ?1 AND season_type = ?2 AND week = ?3
                ORDER BY seq ASC
                "#,
            )
            .context("prepare load stats query")?;
        let rows = stmt
            .query_map(params![season, season_type, wk], |row| {
                Ok((
                    PlayerStatRecord {
                        game_label: row.get(0)?,
                        team: row.get(1)?,
                        category: row.get(2)?,
                        player_name: row.get(3)?,
                        player_id: row.get(4)?,
                        home_score: row.get::<_, Option<u32>>(5)?,
                        away_score: row.get::<_, Option<u32>>(6)?,
                        stat_fields: BTreeMap::new(),
                    },
                    row.get::<_, String>(7)?,
                ))
            })
            .context("query load stats")?;

        let mut out = Vec::new();
        for row in rows {
            let (mut record, fields_json) = row.context("decode stat row")?;
            record.stat_fields = serde_json::from_str(&fields_json)
                .with_context(|| format!("stat fields for {}", record.player_name))?;
            out.push(record);
        }
        Ok(out)
    }

    fn save_props(&mut self, week: &WeekSelector, records: &[PlayerPropRecord]) -> Result<()> {
        let (season, season_type, wk) = week_params(week);
        let tx = self.conn.transaction().context("begin props transaction")?;
        tx.execute(
            "DELETE FROM prop_records WHERE season = ?1 AND season_type = ?2 AND week = ?3",
            params![season, season_type, wk],
        )
        .context("clear props week")?;
        for (seq, record) in records.iter().enumerate() {
            let line_json = record
                .line
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .context("serialize line")?;
            tx.execute(
                r#"
                INSERT INTO prop_records (
                    season, season_type, week, seq, event_label, bookmaker, market,
                    player_name, side, line_json, odds
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    season,
                    season_type,
                    wk,
                    seq as i64,
                    record.event_label,
                    record.bookmaker,
                    record.market,
                    record.player_name,
                    record.side,
                    line_json,
                    record.odds,
                ],
            )
            .context("insert prop record")?;
        }
        tx.commit().context("commit props transaction")?;
        Ok(())
    }

    fn load_props(&self, week: &WeekSelector) -> Result<Vec<PlayerPropRecord>> {
        let (season, season_type, wk) = week_params(week);
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT event_label, bookmaker, market, player_name, side, line_json, odds
                FROM prop_records
                WHERE season = ?1 AND season_type = ?2 AND week = ?3
                ORDER BY seq ASC
                "#,
            )
            .context("prepare load props query")?;
        let rows = stmt
            .query_map(params![season, season_type, wk], |row| {
                Ok((
                    PlayerPropRecord {
                        event_label: row.get(0)?,
                        bookmaker: row.get(1)?,
                        market: row.get(2)?,
                        player_name: row.get(3)?,
                        side: row.get(4)?,
                        line: None,
                        odds: row.get(6)?,
                    },
                    row.get::<_, Option<String>>(5)?,
                ))
            })
            .context("query load props")?;

        let mut out = Vec::new();
        for row in rows {
            let (mut record, line_json) = row.context("decode prop row")?;
            record.line = line_json
                .as_deref()
                .map(serde_json::from_str::<StatValue>)
                .transpose()
                .with_context(|| format!("line for {}", record.player_name))?;
            out.push(record);
        }
        Ok(out)
    }
}

/// Comparison rows with the fixed columns, totals last.
pub fn write_report_csv(path: &Path, report: &ReconciliationReport) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("open {} for writing", path.display()))?;
    for row in report.rows() {
        writer.serialize(&row).context("write comparison row")?;
    }
    writer.flush().context("flush comparison csv")?;
    Ok(())
}

/// Field columns for a wide stats sheet: known labels in table order, then
/// anything else alphabetically.
pub fn stat_columns(records: &[PlayerStatRecord]) -> Vec<String> {
    let present: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.stat_fields.keys().map(String::as_str))
        .collect();
    let known = all_field_labels();
    let mut columns: Vec<String> = known
        .iter()
        .filter(|label| present.contains(*label))
        .map(|label| label.to_string())
        .collect();
    columns.extend(
        present
            .iter()
            .filter(|label| !known.contains(*label))
            .map(|label| label.to_string()),
    );
    columns
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
