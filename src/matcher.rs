use std::collections::HashMap;

use crate::model::{
    Diagnostic, MatchedPair, PlayerPropRecord, PlayerStatRecord, UnmatchedProp, UnmatchedReason,
};
use crate::vocabulary::{MarketCategory, map_market};

#[derive(Debug, Default)]
pub struct MatchOutput<'a> {
    /// Matched pairs in input prop order.
    pub matched: Vec<MatchedPair<'a>>,
    pub unmatched: Vec<UnmatchedProp<'a>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Stat records grouped by exact player name, preserving input order.
struct StatIndex<'a> {
    by_player: HashMap<&'a str, Vec<&'a PlayerStatRecord>>,
}

impl<'a> StatIndex<'a> {
    fn build(stats: &'a [PlayerStatRecord]) -> Self {
        let mut by_player: HashMap<&'a str, Vec<&'a PlayerStatRecord>> = HashMap::new();
        for record in stats {
            by_player
                .entry(record.player_name.as_str())
                .or_default()
                .push(record);
        }
        Self { by_player }
    }

    fn records(&self, player: &str) -> &[&'a PlayerStatRecord] {
        self.by_player.get(player).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Join props to stat records by player name and mapped category.
///
/// Names are compared exactly, case included. Only records of the mapped
/// category group can resolve a value: the first one holding the mapped field
/// wins. A player found without such a record still yields a pair with no
/// resolved value.
pub fn match_props<'a>(
    props: &'a [PlayerPropRecord],
    stats: &'a [PlayerStatRecord],
) -> MatchOutput<'a> {
    let index = StatIndex::build(stats);
    let mut out = MatchOutput::default();
    let mut flagged_ambiguous: Vec<&str> = Vec::new();

    for prop in props {
        let Some(mapping) = map_market(&prop.market) else {
            out.unmatched.push(UnmatchedProp {
                prop,
                reason: UnmatchedReason::NoMapping,
            });
            out.diagnostics.push(Diagnostic::UnmappedCategory {
                market: prop.market.clone(),
            });
            continue;
        };

        let candidates = if prop.has_player() {
            index.records(&prop.player_name)
        } else {
            &[]
        };
        let Some(stat) = pick_record(candidates, mapping) else {
            out.unmatched.push(UnmatchedProp {
                prop,
                reason: UnmatchedReason::NoMatchingPlayer,
            });
            out.diagnostics.push(Diagnostic::UnmatchedPlayer {
                player: prop.player_name.clone(),
                market: prop.market.clone(),
            });
            continue;
        };

        if !flagged_ambiguous.contains(&prop.player_name.as_str())
            && let Some(teams) = ambiguous_teams(candidates)
        {
            flagged_ambiguous.push(prop.player_name.as_str());
            out.diagnostics.push(Diagnostic::AmbiguousPlayer {
                player: prop.player_name.clone(),
                teams,
                chosen: stat.team.clone(),
                player_ids: player_ids(candidates),
            });
        }

        let resolved_stat_value = if stat.category == mapping.group {
            stat.field(mapping.label)
        } else {
            None
        };
        out.matched.push(MatchedPair {
            prop,
            stat,
            resolved_stat_value,
        });
    }

    out
}

fn pick_record<'a>(
    candidates: &[&'a PlayerStatRecord],
    mapping: &MarketCategory,
) -> Option<&'a PlayerStatRecord> {
    candidates
        .iter()
        .find(|r| r.category == mapping.group && r.has_field(mapping.label))
        .or_else(|| candidates.iter().find(|r| r.category == mapping.group))
        .or_else(|| candidates.first())
        .copied()
}

/// Distinct teams behind one player name, when there is more than one.
fn ambiguous_teams(candidates: &[&PlayerStatRecord]) -> Option<Vec<String>> {
    let mut teams: Vec<String> = Vec::new();
    for record in candidates {
        if !teams.contains(&record.team) {
            teams.push(record.team.clone());
        }
    }
    (teams.len() > 1).then_some(teams)
}

fn player_ids(candidates: &[&PlayerStatRecord]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in candidates.iter().filter_map(|r| r.player_id.as_ref()) {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    ids
}
