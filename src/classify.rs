use std::cmp::Ordering;

use crate::model::{ClassifiedOutcome, MatchedPair, OutcomeResult, StatValue};

/// Compare a resolved stat against the quoted line.
///
/// A missing or non-numeric value on either side is `NoData`, never an
/// error. When both sides coerce, the outcome carries the numeric values;
/// otherwise the raw values are passed through for display.
pub fn classify(pair: &MatchedPair<'_>) -> ClassifiedOutcome {
    let prop = pair.prop;
    let actual = pair.resolved_stat_value;
    let line = prop.line.as_ref();

    let (result, line_out, actual_out) = match (actual, line) {
        (Some(actual), Some(line)) => match (actual.as_f64(), line.as_f64()) {
            (Some(a), Some(l)) => (
                compare(a, l),
                Some(StatValue::Number(l)),
                Some(StatValue::Number(a)),
            ),
            _ => (OutcomeResult::NoData, Some(line.clone()), Some(actual.clone())),
        },
        _ => (OutcomeResult::NoData, line.cloned(), actual.cloned()),
    };

    ClassifiedOutcome {
        event: prop.event_label.clone(),
        player: prop.player_name.clone(),
        prop_type: prop.market.clone(),
        line: line_out,
        actual_stat: actual_out,
        result,
        odds: prop.odds,
    }
}

fn compare(actual: f64, line: f64) -> OutcomeResult {
    match actual.partial_cmp(&line) {
        Some(Ordering::Greater) => OutcomeResult::Over,
        Some(Ordering::Less) => OutcomeResult::Under,
        Some(Ordering::Equal) => OutcomeResult::Push,
        None => OutcomeResult::NoData,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{PlayerPropRecord, PlayerStatRecord};

    fn fixtures(line: Option<StatValue>) -> (PlayerPropRecord, PlayerStatRecord) {
        let prop = PlayerPropRecord {
            event_label: "Chiefs vs Ravens".into(),
            bookmaker: "FanDuel".into(),
            market: "player_rush_yds".into(),
            player_name: "J. Doe".into(),
            side: "Under".into(),
            line,
            odds: Some(-115.0),
        };
        let stat = PlayerStatRecord {
            player_name: "J. Doe".into(),
            team: "Chiefs".into(),
            game_label: "Chiefs vs Ravens".into(),
            category: "rushing".into(),
            player_id: None,
            home_score: Some(24),
            away_score: Some(17),
            stat_fields: BTreeMap::new(),
        };
        (prop, stat)
    }

    fn n(value: f64) -> StatValue {
        StatValue::Number(value)
    }

    fn t(value: &str) -> StatValue {
        StatValue::Text(value.to_string())
    }

    fn run(actual: Option<StatValue>, line: Option<StatValue>) -> ClassifiedOutcome {
        let (prop, stat) = fixtures(line);
        classify(&MatchedPair {
            prop: &prop,
            stat: &stat,
            resolved_stat_value: actual.as_ref(),
        })
    }

    #[test]
    fn numeric_comparison() {
        let over = run(Some(n(68.0)), Some(n(55.5)));
        assert_eq!(over.result, OutcomeResult::Over);
        assert_eq!(over.actual_stat, Some(StatValue::Number(68.0)));
        assert_eq!(over.odds, Some(-115.0));
        assert_eq!(
            run(Some(n(40.0)), Some(n(55.5))).result,
            OutcomeResult::Under
        );
        assert_eq!(
            run(Some(n(55.0)), Some(n(55.0))).result,
            OutcomeResult::Push
        );
    }

    #[test]
    fn numeric_text_is_coerced() {
        let out = run(Some(t("68")), Some(t(" 55.5 ")));
        assert_eq!(out.result, OutcomeResult::Over);
        assert_eq!(out.line, Some(StatValue::Number(55.5)));
    }

    #[test]
    fn missing_values_are_no_data() {
        let out = run(None, Some(n(55.5)));
        assert_eq!(out.result, OutcomeResult::NoData);
        assert_eq!(out.line, Some(StatValue::Number(55.5)));
        assert_eq!(out.actual_stat, None);
        assert_eq!(run(Some(n(12.0)), None).result, OutcomeResult::NoData);
    }

    #[test]
    fn non_numeric_values_pass_through_uncoerced() {
        let out = run(Some(t("22/31")), Some(n(20.5)));
        assert_eq!(out.result, OutcomeResult::NoData);
        assert_eq!(out.actual_stat, Some(StatValue::Text("22/31".into())));
        assert_eq!(run(Some(n(3.0)), Some(t("N/A"))).result, OutcomeResult::NoData);
    }
}
