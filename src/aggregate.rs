use crate::model::{ClassifiedOutcome, OutcomeResult, ReconciliationReport, TotalsRow, TotalsSide};

/// Tally Over/Under hit rates across classified outcomes.
///
/// Push and NoData are counted separately and stay out of the denominator.
/// Outcome order is kept as given.
pub fn aggregate(outcomes: Vec<ClassifiedOutcome>) -> ReconciliationReport {
    let mut over = 0usize;
    let mut under = 0usize;
    let mut pushes = 0usize;
    let mut no_data = 0usize;
    for outcome in &outcomes {
        match outcome.result {
            OutcomeResult::Over => over += 1,
            OutcomeResult::Under => under += 1,
            OutcomeResult::Push => pushes += 1,
            OutcomeResult::NoData => no_data += 1,
        }
    }
    let denominator = outcomes.iter().filter(|o| o.result.is_decided()).count();

    ReconciliationReport {
        outcomes,
        over: totals_row(TotalsSide::Over, over, denominator),
        under: totals_row(TotalsSide::Under, under, denominator),
        pushes,
        no_data,
    }
}

fn totals_row(side: TotalsSide, count: usize, denominator: usize) -> TotalsRow {
    let fraction = if denominator > 0 {
        count as f64 / denominator as f64
    } else {
        0.0
    };
    TotalsRow {
        side,
        count,
        denominator,
        fraction,
    }
}
