use std::fs;
use std::path::PathBuf;

use gridiron_props::model::{Diagnostic, StatValue, UNKNOWN_PLAYER};
use gridiron_props::normalize::{
    RawGameSummary, normalize_props, normalize_stats, parse_espn_scoreboard_json,
    parse_espn_summary_json, parse_odds_event_json, parse_odds_event_list_json,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_game() -> RawGameSummary {
    let board = parse_espn_scoreboard_json(&read_fixture("espn_scoreboard.json"))
        .expect("scoreboard should parse");
    let header = &board.records[0];
    RawGameSummary {
        game_id: header.id.clone(),
        home_team: header.home_team.clone(),
        away_team: header.away_team.clone(),
        home_score: header.home_score,
        away_score: header.away_score,
        teams: parse_espn_summary_json(&read_fixture("espn_summary.json"))
            .expect("summary should parse"),
    }
}

#[test]
fn parses_espn_scoreboard_fixture() {
    let board = parse_espn_scoreboard_json(&read_fixture("espn_scoreboard.json"))
        .expect("fixture should parse");
    assert!(board.diagnostics.is_empty());
    let games = board.records;
    assert_eq!(games.len(), 2);
    assert_eq!(games[0].id, "401671789");
    assert_eq!(games[0].home_team, "Chiefs");
    assert_eq!(games[0].away_team, "Ravens");
    assert_eq!(games[0].home_score, Some(27));
    assert_eq!(games[0].away_score, Some(20));

    // numeric scores and away-first competitor order
    assert_eq!(games[1].home_team, "Eagles");
    assert_eq!(games[1].home_score, Some(34));
    assert_eq!(games[1].away_score, Some(29));
}

#[test]
fn empty_payloads_parse_to_nothing() {
    assert!(parse_espn_scoreboard_json("null").expect("null").records.is_empty());
    assert!(parse_espn_summary_json("").expect("empty").is_empty());
    assert!(parse_espn_summary_json(r#"{"header":{}}"#).expect("no boxscore").is_empty());
    assert!(parse_odds_event_list_json(" null ").expect("null").is_empty());
}

#[test]
fn scoreboard_event_without_id_is_skipped() {
    let board = parse_espn_scoreboard_json(
        r#"{"events":[
            {"id":"401","competitions":[{"competitors":[
                {"homeAway":"home","team":{"shortDisplayName":"Bills"},"score":"24"},
                {"homeAway":"away","team":{"shortDisplayName":"Jets"},"score":"10"}
            ]}]},
            {"shortName":"NYG @ DAL","competitions":null},
            {"id":null,"competitions":[]}
        ]}"#,
    )
    .expect("one bad event should not fail the week");
    assert_eq!(board.records.len(), 1);
    assert_eq!(board.records[0].id, "401");
    assert_eq!(board.records[0].home_score, Some(24));
    assert_eq!(board.diagnostics.len(), 2);
    assert!(
        board
            .diagnostics
            .iter()
            .all(|d| d.kind() == "malformed_input")
    );
    assert!(board.diagnostics[0].to_string().contains("NYG @ DAL"));
}

#[test]
fn null_lists_in_summary_do_not_drop_the_game() {
    let teams = parse_espn_summary_json(
        r#"{"boxscore":{"players":[
            {"team":{"displayName":"Buffalo Bills"},"statistics":[
                {"name":"passing","athletes":null},
                {"name":"rushing","athletes":[
                    {"athlete":{"id":"3918298","displayName":"Josh Allen"},"stats":null},
                    {"athlete":{"id":"4379399","displayName":"James Cook"},"stats":["18","92"]}
                ]}
            ]},
            {"team":{"displayName":"New York Jets"},"statistics":null}
        ]}}"#,
    )
    .expect("null lists should parse");
    assert_eq!(teams.len(), 2);

    let game = RawGameSummary {
        game_id: "401".into(),
        home_team: "Bills".into(),
        away_team: "Jets".into(),
        teams,
        ..RawGameSummary::default()
    };
    let normalized = normalize_stats(&[game]);
    assert_eq!(normalized.records.len(), 2);
    assert!(normalized.records[0].stat_fields.is_empty());
    assert_eq!(
        normalized.records[1].field("Rushing Yards"),
        Some(&StatValue::Number(92.0))
    );
    assert_eq!(normalized.records[1].player_id.as_deref(), Some("4379399"));
    assert!(normalized.diagnostics.is_empty());

    assert!(
        parse_espn_summary_json(r#"{"boxscore":{"players":null}}"#)
            .expect("null players")
            .is_empty()
    );
}

#[test]
fn null_bookmaker_markets_keep_the_rest_of_the_event() {
    let event = parse_odds_event_json(
        r#"{"id":"e1","home_team":"Bills","away_team":"Jets","bookmakers":[
            {"key":"fanduel","title":"FanDuel","markets":null},
            {"key":"draftkings","title":"DraftKings","markets":[
                {"key":"player_rush_yds","outcomes":[
                    {"name":"Over","description":"James Cook","price":-115,"point":74.5},
                    {"name":"Under","description":"James Cook","price":-105,"point":74.5}
                ]}
            ]}
        ]}"#,
    )
    .expect("null markets should parse");
    let normalized = normalize_props(&[event]);
    assert_eq!(normalized.records.len(), 2);
    assert!(normalized.records.iter().all(|r| r.bookmaker == "DraftKings"));
    assert!(normalized.diagnostics.is_empty());
}

#[test]
fn malformed_json_is_an_error() {
    assert!(parse_espn_scoreboard_json("{").is_err());
    assert!(parse_odds_event_json("[1,").is_err());
}

#[test]
fn normalizes_summary_into_stat_records() {
    let normalized = normalize_stats(&[fixture_game()]);
    assert_eq!(normalized.records.len(), 8);

    let mahomes = &normalized.records[0];
    assert_eq!(mahomes.player_name, "Patrick Mahomes");
    assert_eq!(mahomes.team, "Kansas City Chiefs");
    assert_eq!(mahomes.game_label, "Chiefs vs Ravens");
    assert_eq!(mahomes.category, "passing");
    assert_eq!(mahomes.home_score, Some(27));
    assert_eq!(mahomes.player_id.as_deref(), Some("3139477"));
    assert_eq!(mahomes.field("Passing TDs"), Some(&StatValue::Number(1.0)));
    assert_eq!(
        mahomes.field("Completions/Attempts"),
        Some(&StatValue::Text("20/28".into()))
    );
    assert_eq!(
        mahomes.field("Passing Completions"),
        Some(&StatValue::Number(20.0))
    );
    assert_eq!(
        mahomes.field("Sacks-Yards Lost"),
        Some(&StatValue::Text("2-14".into()))
    );

    let lamar: Vec<_> = normalized
        .records
        .iter()
        .filter(|r| r.player_name == "Lamar Jackson")
        .collect();
    assert_eq!(lamar.len(), 2);
    assert_eq!(lamar[1].category, "rushing");
    assert_eq!(lamar[1].field("Rushing Yards"), Some(&StatValue::Number(122.0)));

    assert_eq!(normalized.diagnostics.len(), 1);
    assert!(matches!(
        normalized.diagnostics[0],
        Diagnostic::MalformedInput { .. }
    ));
}

#[test]
fn parses_odds_event_list_fixture() {
    let events = parse_odds_event_list_json(&read_fixture("odds_events.json"))
        .expect("fixture should parse");
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].label(), "Philadelphia Eagles vs Green Bay Packers");
    assert!(events.iter().all(|e| e.bookmakers.is_empty()));
}

#[test]
fn normalizes_odds_event_into_prop_records() {
    let event =
        parse_odds_event_json(&read_fixture("odds_event.json")).expect("fixture should parse");
    let normalized = normalize_props(&[event]);
    assert_eq!(normalized.records.len(), 11);
    assert!(normalized.diagnostics.is_empty());

    let first = &normalized.records[0];
    assert_eq!(first.event_label, "Kansas City Chiefs vs Baltimore Ravens");
    assert_eq!(first.bookmaker, "DraftKings");
    assert_eq!(first.market, "player_pass_tds");
    assert_eq!(first.player_name, "Patrick Mahomes");
    assert_eq!(first.side, "Over");
    assert_eq!(first.line, Some(StatValue::Number(1.5)));
    assert_eq!(first.odds, Some(-150.0));

    let last = normalized.records.last().expect("records");
    assert_eq!(last.player_name, UNKNOWN_PLAYER);
    assert!(!last.has_player());
}
