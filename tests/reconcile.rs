use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use gridiron_props::model::{
    Diagnostic, OutcomeResult, PlayerPropRecord, PlayerStatRecord, StatValue, TOTALS_EVENT,
};
use gridiron_props::normalize::{
    RawGameSummary, normalize_props, normalize_stats, parse_espn_scoreboard_json,
    parse_espn_summary_json, parse_odds_event_json,
};
use gridiron_props::reconcile;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn prop(market: &str, player: &str, line: f64) -> PlayerPropRecord {
    PlayerPropRecord {
        event_label: "Home vs Away".to_string(),
        bookmaker: "DraftKings".to_string(),
        market: market.to_string(),
        player_name: player.to_string(),
        side: "Over".to_string(),
        line: Some(StatValue::Number(line)),
        odds: Some(-110.0),
    }
}

fn stat(player: &str, category: &str, fields: &[(&str, f64)]) -> PlayerStatRecord {
    PlayerStatRecord {
        player_name: player.to_string(),
        team: "Home".to_string(),
        game_label: "Home vs Away".to_string(),
        category: category.to_string(),
        player_id: None,
        home_score: Some(24),
        away_score: Some(17),
        stat_fields: fields
            .iter()
            .map(|(k, v)| (k.to_string(), Some(StatValue::Number(*v))))
            .collect::<BTreeMap<_, _>>(),
    }
}

#[test]
fn single_over_prop_produces_full_over_totals() {
    let props = vec![prop("player_pass_tds", "J. Doe", 1.5)];
    let stats = vec![stat("J. Doe", "passing", &[("Passing TDs", 2.0)])];

    let result = reconcile(&props, &stats);
    let report = &result.report;
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].result, OutcomeResult::Over);
    assert_eq!(report.outcomes[0].actual_stat, Some(StatValue::Number(2.0)));
    assert_eq!(report.outcomes[0].line, Some(StatValue::Number(1.5)));
    assert_eq!(report.outcomes[0].odds, Some(-110.0));

    assert_eq!(report.over.summary(), "1/1, 100.00% Over");
    assert_eq!(report.under.summary(), "0/1, 0.00% Under");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn missing_field_is_no_data_and_out_of_denominator() {
    let props = vec![prop("player_pass_tds", "J. Doe", 1.5)];
    let stats = vec![stat("J. Doe", "passing", &[("Passing Yards", 250.0)])];

    let result = reconcile(&props, &stats);
    let report = &result.report;
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].result, OutcomeResult::NoData);
    assert_eq!(report.outcomes[0].actual_stat, None);
    assert_eq!(report.no_data, 1);
    assert_eq!(report.over.denominator, 0);
    assert_eq!(report.over.summary(), "0/0, 0.00% Over");
    assert_eq!(report.under.summary(), "0/0, 0.00% Under");
}

#[test]
fn unmapped_market_is_only_a_diagnostic() {
    let props = vec![
        prop("player_kicking_points", "H. Kicker", 7.5),
        prop("player_pass_tds", "J. Doe", 1.5),
    ];
    let stats = vec![
        stat("H. Kicker", "kicking", &[("Total Points", 9.0)]),
        stat("J. Doe", "passing", &[("Passing TDs", 1.0)]),
    ];

    let result = reconcile(&props, &stats);
    assert_eq!(result.report.outcomes.len(), 1);
    assert!(
        result
            .report
            .outcomes
            .iter()
            .all(|o| o.prop_type != "player_kicking_points")
    );
    assert_eq!(result.unmapped, 1);
    assert_eq!(
        result.diagnostics,
        vec![Diagnostic::UnmappedCategory {
            market: "player_kicking_points".to_string()
        }]
    );
}

#[test]
fn rows_keep_prop_order_with_totals_last() {
    let props = vec![
        prop("player_rush_yds", "B", 50.5),
        prop("player_pass_tds", "A", 1.5),
        prop("player_receptions", "C", 4.0),
    ];
    let stats = vec![
        stat("A", "passing", &[("Passing TDs", 0.0)]),
        stat("B", "rushing", &[("Rushing Yards", 80.0)]),
        stat("C", "receiving", &[("Receptions", 4.0)]),
    ];

    let rows = reconcile(&props, &stats).report.rows();
    let players: Vec<&str> = rows.iter().map(|r| r.player.as_str()).collect();
    assert_eq!(players, vec!["B", "A", "C", "", ""]);
    let results: Vec<&str> = rows.iter().map(|r| r.result.as_str()).collect();
    assert_eq!(
        results,
        vec![
            "Over",
            "Under",
            "Push",
            "1/2, 50.00% Over",
            "1/2, 50.00% Under"
        ]
    );
    assert_eq!(rows[3].event, TOTALS_EVENT);
    assert!(rows[3].is_totals() && rows[4].is_totals());
    assert!(!rows[0].is_totals());
}

#[test]
fn fixture_week_reconciles_end_to_end() {
    let board = parse_espn_scoreboard_json(&read_fixture("espn_scoreboard.json")).expect("board");
    let header = &board.records[0];
    let game = RawGameSummary {
        game_id: header.id.clone(),
        home_team: header.home_team.clone(),
        away_team: header.away_team.clone(),
        home_score: header.home_score,
        away_score: header.away_score,
        teams: parse_espn_summary_json(&read_fixture("espn_summary.json")).expect("summary"),
    };
    let stats = normalize_stats(&[game]).records;
    let event = parse_odds_event_json(&read_fixture("odds_event.json")).expect("odds");
    let props = normalize_props(&[event]).records;

    let result = reconcile(&props, &stats);
    let report = &result.report;

    let summary: Vec<(&str, &str, OutcomeResult)> = report
        .outcomes
        .iter()
        .map(|o| (o.player.as_str(), o.prop_type.as_str(), o.result))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Patrick Mahomes", "player_pass_tds", OutcomeResult::Under),
            ("Patrick Mahomes", "player_pass_tds", OutcomeResult::Under),
            ("Lamar Jackson", "player_rush_yds", OutcomeResult::Over),
            ("Lamar Jackson", "player_rush_yds", OutcomeResult::Over),
            ("Lamar Jackson", "player_pass_yds", OutcomeResult::Over),
            ("Travis Kelce", "player_receptions", OutcomeResult::Under),
            ("Derrick Henry", "player_rush_tds", OutcomeResult::Over),
            ("Patrick Mahomes", "player_pass_completions", OutcomeResult::Under),
        ]
    );
    assert_eq!(report.over.summary(), "4/8, 50.00% Over");
    assert_eq!(report.under.summary(), "4/8, 50.00% Under");
    assert_eq!(result.unmapped, 1);
    assert_eq!(result.unmatched_players, 2);

    let kinds: Vec<&str> = result.diagnostics.iter().map(Diagnostic::kind).collect();
    assert_eq!(
        kinds,
        vec!["unmapped_category", "unmatched_player", "unmatched_player"]
    );

    let breakdown = report.market_breakdown();
    let rush = breakdown
        .iter()
        .find(|t| t.market == "player_rush_yds")
        .expect("rush tally");
    assert_eq!((rush.over, rush.under), (2, 0));
    assert!((rush.over_fraction() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn same_name_on_two_teams_is_flagged_once() {
    let mut other = stat("J. Smith", "receiving", &[("Receptions", 2.0)]);
    other.team = "Away".to_string();
    let stats = vec![
        stat("J. Smith", "receiving", &[("Receptions", 6.0)]),
        other,
    ];
    let props = vec![
        prop("player_receptions", "J. Smith", 4.5),
        prop("player_receptions", "J. Smith", 5.5),
    ];

    let result = reconcile(&props, &stats);
    assert_eq!(result.report.outcomes[0].result, OutcomeResult::Over);
    assert_eq!(result.report.outcomes[1].result, OutcomeResult::Over);
    assert_eq!(result.diagnostics.len(), 1);
    assert!(matches!(
        &result.diagnostics[0],
        Diagnostic::AmbiguousPlayer { chosen, .. } if chosen == "Home"
    ));
}
