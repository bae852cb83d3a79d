use crate::aggregate::aggregate;
use crate::classify::classify;
use crate::matcher::match_props;
use crate::model::{
    Diagnostic, PlayerPropRecord, PlayerStatRecord, ReconciliationReport, UnmatchedReason,
};

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub report: ReconciliationReport,
    pub diagnostics: Vec<Diagnostic>,
    pub unmapped: usize,
    pub unmatched_players: usize,
}

/// Run props against stats: match, classify, aggregate.
///
/// Pure and synchronous. Anomalies never abort the run; they come back in
/// `diagnostics`.
pub fn reconcile(props: &[PlayerPropRecord], stats: &[PlayerStatRecord]) -> Reconciliation {
    let matched = match_props(props, stats);

    let outcomes = matched.matched.iter().map(classify).collect::<Vec<_>>();
    let report = aggregate(outcomes);

    let unmapped = matched
        .unmatched
        .iter()
        .filter(|u| u.reason == UnmatchedReason::NoMapping)
        .count();
    let unmatched_players = matched.unmatched.len() - unmapped;

    for skipped in &matched.unmatched {
        tracing::trace!(
            player = %skipped.prop.player_name,
            market = %skipped.prop.market,
            reason = skipped.reason.label(),
            "prop skipped"
        );
    }
    for diagnostic in &matched.diagnostics {
        tracing::debug!(kind = diagnostic.kind(), "{diagnostic}");
    }
    tracing::info!(
        props = props.len(),
        stats = stats.len(),
        classified = report.outcomes.len(),
        unmapped,
        unmatched_players,
        over = report.over.count,
        under = report.under.count,
        "reconciliation complete"
    );

    Reconciliation {
        report,
        diagnostics: matched.diagnostics,
        unmapped,
        unmatched_players,
    }
}
