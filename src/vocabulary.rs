/// Where an odds provider market resolves on the stats side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketCategory {
    pub market: &'static str,
    /// Stats provider category group the label lives in.
    pub group: &'static str,
    /// Field label inside the group's stat fields.
    pub label: &'static str,
}

const fn entry(market: &'static str, group: &'static str, label: &'static str) -> MarketCategory {
    MarketCategory {
        market,
        group,
        label,
    }
}

pub const MARKET_CATEGORIES: &[MarketCategory] = &[
    entry("player_pass_tds", "passing", "Passing TDs"),
    entry("player_pass_yds", "passing", "Passing Yards"),
    entry("player_pass_attempts", "passing", DERIVED_PASS_ATTEMPTS),
    entry("player_pass_completions", "passing", DERIVED_PASS_COMPLETIONS),
    entry("player_pass_interceptions", "passing", "Interceptions"),
    entry("player_rush_yds", "rushing", "Rushing Yards"),
    entry("player_rush_attempts", "rushing", "Attempts"),
    entry("player_rush_longest", "rushing", "Longest Run"),
    entry("player_rush_tds", "rushing", "Rushing TDs"),
    entry("player_receptions", "receiving", "Receptions"),
    entry("player_reception_yds", "receiving", "Receiving Yards"),
    entry("player_reception_longest", "receiving", "Longest Reception"),
    entry("player_reception_tds", "receiving", "Receiving TDs"),
];

/// Ordered field labels for each stats provider category. The provider's
/// positional stat arrays are zipped against these.
pub const CATEGORY_FIELDS: &[(&str, &[&str])] = &[
    (
        "passing",
        &[
            "Completions/Attempts",
            "Passing Yards",
            "Yards per Attempt",
            "Passing TDs",
            "Interceptions",
            "Sacks-Yards Lost",
            "QBR",
            "Passer Rating",
        ],
    ),
    (
        "rushing",
        &[
            "Attempts",
            "Rushing Yards",
            "Yards per Carry",
            "Rushing TDs",
            "Longest Run",
        ],
    ),
    (
        "receiving",
        &[
            "Receptions",
            "Receiving Yards",
            "Yards per Reception",
            "Receiving TDs",
            "Longest Reception",
            "Targets",
        ],
    ),
    ("fumbles", &["Fumbles", "Fumbles Lost", "Fumbles Recovered"]),
    (
        "defensive",
        &[
            "Total Tackles",
            "Solo Tackles",
            "Sacks",
            "Tackles for Loss",
            "Passes Defended",
            "Interceptions",
            "Defensive TDs",
        ],
    ),
    ("interceptions", &["Interceptions", "Return Yards", "Return TDs"]),
    (
        "kickReturns",
        &[
            "Returns",
            "Yards",
            "Avg Yards/Return",
            "Longest Return",
            "Return TDs",
        ],
    ),
    (
        "puntReturns",
        &[
            "Returns",
            "Yards",
            "Avg Yards/Return",
            "Longest Return",
            "Return TDs",
        ],
    ),
    (
        "kicking",
        &[
            "FG Made/Attempted",
            "FG%",
            "Longest FG",
            "XP Made/Attempted",
            "Total Points",
        ],
    ),
    (
        "punting",
        &[
            "Punts",
            "Yards",
            "Avg Yards/Punt",
            "Inside 20",
            "Longest Punt",
        ],
    ),
];

/// Combined completions/attempts field in the passing group.
pub const PASS_COMPLETIONS_ATTEMPTS: &str = "Completions/Attempts";
pub const DERIVED_PASS_COMPLETIONS: &str = "Passing Completions";
pub const DERIVED_PASS_ATTEMPTS: &str = "Passing Attempts";

/// Resolve a market key. `None` means the market is unmapped and must be
/// skipped with a diagnostic.
pub fn map_market(market: &str) -> Option<&'static MarketCategory> {
    let key = market.trim();
    MARKET_CATEGORIES.iter().find(|m| m.market == key)
}

/// Ordered field labels for a category, or `None` for categories the table
/// does not know.
pub fn category_fields(category: &str) -> Option<&'static [&'static str]> {
    CATEGORY_FIELDS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, fields)| *fields)
}

/// Market keys to request from the odds provider by default.
pub fn requested_markets() -> Vec<&'static str> {
    MARKET_CATEGORIES.iter().map(|m| m.market).collect()
}

/// Every field label in table order, each once. Used to lay out wide stat sheets.
pub fn all_field_labels() -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for (group, fields) in CATEGORY_FIELDS {
        for field in *fields {
            if !out.contains(field) {
                out.push(*field);
            }
        }
        if *group == "passing" {
            for derived in [DERIVED_PASS_COMPLETIONS, DERIVED_PASS_ATTEMPTS] {
                if !out.contains(&derived) {
                    out.push(derived);
                }
            }
        }
    }
    out
}
