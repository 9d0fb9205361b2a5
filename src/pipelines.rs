//! The three basketball-reference aggregations, one per binary.
//!
//! They differ on purpose: which cleanup passes run, inner vs. left joins,
//! and whether salaryless rows survive all follow the season each script was
//! written for.

use tracing::info;

use crate::clean;
use crate::error::Result;
use crate::fetch::{first_table, TableFetcher};
use crate::merge::{self, JoinKind};
use crate::settings::NbaSettings;
use crate::table::Table;

const PLAYER: &str = "Player";
const TEAM: &str = "Tm";
const SALARY: &str = "Salary";

/// 2020-21 per-game + advanced: full cleanup on both, left join on (Player, Tm).
pub fn per_game_and_advanced(fetcher: &dyn TableFetcher, nba: &NbaSettings) -> Result<Table> {
    let standard = first_table(fetcher, &nba.per_game_2021_url)?;
    let advanced = first_table(fetcher, &nba.advanced_2021_url)?;
    info!(per_game = standard.height(), advanced = advanced.height(), "fetched 2021 tables");

    let cleaned = [standard, advanced]
        .into_iter()
        .map(|t| clean::clean(t, PLAYER))
        .collect::<Result<Vec<_>>>()?;
    merge::merge_all(&cleaned, &[PLAYER, TEAM], JoinKind::Left)
}

/// Season totals inner-joined with one salary column, renamed `Salary`.
pub fn stats_and_salaries(fetcher: &dyn TableFetcher, nba: &NbaSettings) -> Result<Table> {
    let contracts = first_table(fetcher, &nba.contracts_url)?;
    let salary_col = nba.salary_2020_column.as_str();
    let mut salaries = contracts.select_columns(&[PLAYER, salary_col])?;
    salaries.rename_columns(&[(salary_col, SALARY)]);

    let players = first_table(fetcher, &nba.totals_2020_url)?;
    let mut total = merge::join(&players, &salaries, &[PLAYER], JoinKind::Inner)?;
    clean::drop_header_rows(&mut total, PLAYER)?;
    Ok(total)
}

/// 2021-22 per-game + advanced with salaries; one row per player, salaried only.
pub fn advanced_stats_and_salaries(fetcher: &dyn TableFetcher, nba: &NbaSettings) -> Result<Table> {
    let salary_col = nba.salary_2022_column.as_str();

    let mut contracts = first_table(fetcher, &nba.contracts_url)?;
    clean::drop_header_rows(&mut contracts, PLAYER)?;
    let mut salaries = contracts.select_positions(&[1, 2, 3]);
    let idx = salaries.require_column(salary_col)?;
    salaries.retain_rows(|row| !row[idx].eq_str(SALARY));

    let mut per_game = first_table(fetcher, &nba.per_game_2022_url)?;
    let mut advanced = first_table(fetcher, &nba.advanced_2022_url)?;
    clean::drop_header_rows(&mut per_game, PLAYER)?;
    clean::drop_header_rows(&mut advanced, PLAYER)?;

    let mut stats = merge::join(&per_game, &advanced, &[PLAYER, TEAM], JoinKind::Inner)?;
    merge::drop_placeholder_columns(&mut stats);
    merge::reconcile_traded(&mut stats, PLAYER, TEAM, &nba.traded_sentinel)?;

    let mut out = merge::join(&stats, &salaries, &[PLAYER], JoinKind::Left)?;
    let dupes = merge::dedup_rows(&mut out);
    out.rename_columns(&[(salary_col, SALARY)]);
    let unpaid = merge::drop_missing(&mut out, SALARY)?;
    info!(dupes, unpaid, rows = out.height(), "merged stats and salaries");
    Ok(out)
}
