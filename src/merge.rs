use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use tracing::debug;

use crate::clean;
use crate::error::Result;
use crate::table::{Cell, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Every left row survives; unmatched rows get `Missing` on the right side.
    Left,
    /// Only rows with a match on both sides.
    Inner,
}

/// Join `right` onto `left` on the `on` columns.
///
/// Output rows follow left order, one per matching (left, right) pair.
/// Key columns appear once, at their left positions. A non-key column present
/// on both sides keeps the left copy; the right copy is dropped.
pub fn join(left: &Table, right: &Table, on: &[&str], kind: JoinKind) -> Result<Table> {
    let left_keys = on.iter().map(|k| left.require_column(k)).collect::<Result<Vec<_>>>()?;
    let right_keys = on.iter().map(|k| right.require_column(k)).collect::<Result<Vec<_>>>()?;

    let right_extra: Vec<usize> = (0..right.width())
        .filter(|i| !right_keys.contains(i))
        .filter(|&i| left.column_index(&right.columns()[i]).is_none())
        .collect();
    let dropped = right.width() - right_keys.len() - right_extra.len();
    if dropped > 0 {
        debug!(dropped, "dropped right-side duplicate columns");
    }

    let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        if let Some(key) = row_key(row, &right_keys) {
            index.entry(key).or_default().push(i);
        }
    }

    let columns = left
        .columns()
        .iter()
        .chain(right_extra.iter().map(|&i| &right.columns()[i]))
        .cloned()
        .collect();

    let mut rows = Vec::new();
    for row in left.rows() {
        let matches = row_key(row, &left_keys).and_then(|k| index.get(&k));
        match matches {
            Some(hits) => {
                for &hit in hits {
                    let r = &right.rows()[hit];
                    rows.push(
                        row.iter()
                            .cloned()
                            .chain(right_extra.iter().map(|&i| r[i].clone()))
                            .collect(),
                    );
                }
            }
            None if kind == JoinKind::Left => {
                rows.push(
                    row.iter()
                        .cloned()
                        .chain(right_extra.iter().map(|_| Cell::Missing))
                        .collect(),
                );
            }
            None => {}
        }
    }

    Ok(Table::new(columns, rows))
}

fn row_key(row: &[Cell], keys: &[usize]) -> Option<Vec<String>> {
    keys.iter().map(|&k| row[k].key()).collect()
}

/// Fold `join` across `tables` left to right.
pub fn merge_all(tables: &[Table], on: &[&str], kind: JoinKind) -> Result<Table> {
    let Some((first, rest)) = tables.split_first() else {
        return Ok(Table::default());
    };
    rest.iter()
        .try_fold(first.clone(), |acc, t| join(&acc, t, on, kind))
}

pub fn drop_placeholder_columns(table: &mut Table) {
    clean::drop_placeholder_columns(table);
}

/// Keep only the aggregate (`sentinel`) row for any entity that has one.
///
/// Per-team rows for those entities are removed, the aggregate rows are
/// appended, and the table is stably sorted by `entity`.
pub fn reconcile_traded(table: &mut Table, entity: &str, team: &str, sentinel: &str) -> Result<()> {
    let e = table.require_column(entity)?;
    let t = table.require_column(team)?;

    let (totals, rest): (Vec<Vec<Cell>>, Vec<Vec<Cell>>) = std::mem::take(table.rows_mut())
        .into_iter()
        .partition(|row| row[t].eq_str(sentinel));

    let traded: HashSet<String> = totals.iter().filter_map(|row| row[e].key()).collect();
    debug!(traded = traded.len(), "reconciling traded entities");

    let rows = table.rows_mut();
    rows.extend(
        rest.into_iter()
            .filter(|row| row[e].key().map_or(true, |k| !traded.contains(&k))),
    );
    rows.extend(totals);
    rows.sort_by_cached_key(|row| row[e].to_string());
    Ok(())
}

/// Remove rows identical to an earlier row. Returns how many were removed.
pub fn dedup_rows(table: &mut Table) -> usize {
    let before = table.height();
    let unique: Vec<Vec<Cell>> = std::mem::take(table.rows_mut())
        .into_iter()
        .unique_by(|row| row.iter().map(|c| (c.is_missing(), c.to_string())).collect::<Vec<_>>())
        .collect();
    *table.rows_mut() = unique;
    before - table.height()
}

/// Drop rows where `column` is missing.
pub fn drop_missing(table: &mut Table, column: &str) -> Result<usize> {
    let idx = table.require_column(column)?;
    let before = table.height();
    table.retain_rows(|row| !row[idx].is_missing());
    Ok(before - table.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Cell::from_raw(c)).collect())
                .collect(),
        )
    }

    fn labels(t: &Table) -> Vec<&str> {
        t.columns().iter().map(String::as_str).collect()
    }

    #[test]
    fn single_player_merge_has_no_duplicate_columns() {
        let per_game = table(&["Player", "Tm", "G", "PTS"], &[&["LeBron James", "LAL", "45", "25.0"]]);
        let advanced = table(&["Player", "Tm", "G", "PER"], &[&["LeBron James", "LAL", "45", "24.2"]]);
        let merged = join(&per_game, &advanced, &["Player"], JoinKind::Left).unwrap();
        assert_eq!(merged.height(), 1);
        assert_eq!(labels(&merged), vec!["Player", "Tm", "G", "PTS", "PER"]);
        assert!(merged.columns().iter().all(|c| !c.ends_with("_y")));
        let unique: HashSet<&String> = merged.columns().iter().collect();
        assert_eq!(unique.len(), merged.width());
    }

    #[test]
    fn left_join_keeps_unmatched_rows() {
        let l = table(&["Player", "PTS"], &[&["A", "1"], &["B", "2"]]);
        let r = table(&["Player", "Salary"], &[&["A", "$10"]]);
        let left = join(&l, &r, &["Player"], JoinKind::Left).unwrap();
        assert_eq!(left.height(), 2);
        assert_eq!(left.rows()[1][2], Cell::Missing);
        let inner = join(&l, &r, &["Player"], JoinKind::Inner).unwrap();
        assert_eq!(inner.height(), 1);
    }

    #[test]
    fn duplicate_right_keys_fan_out() {
        let l = table(&["Player"], &[&["A"]]);
        let r = table(&["Player", "Tm"], &[&["A", "X"], &["A", "Y"]]);
        let j = join(&l, &r, &["Player"], JoinKind::Inner).unwrap();
        assert_eq!(j.height(), 2);
    }

    #[test]
    fn two_column_key() {
        let l = table(&["Player", "Tm", "PTS"], &[&["A", "X", "1"], &["A", "Y", "2"]]);
        let r = table(&["Player", "Tm", "PER"], &[&["A", "Y", "9"]]);
        let j = join(&l, &r, &["Player", "Tm"], JoinKind::Inner).unwrap();
        assert_eq!(j.height(), 1);
        assert_eq!(j.rows()[0][3], Cell::from("9"));
    }

    #[test]
    fn traded_player_keeps_only_total_row() {
        let mut t = table(
            &["Player", "Tm", "PTS"],
            &[
                &["B", "LAL", "3"],
                &["A", "X", "10"],
                &["A", "Y", "12"],
                &["A", "TOT", "22"],
                &["C", "BOS", "7"],
            ],
        );
        reconcile_traded(&mut t, "Player", "Tm", "TOT").unwrap();
        assert_eq!(t.height(), 3);
        let a: Vec<&Vec<Cell>> = t.rows().iter().filter(|r| r[0].eq_str("A")).collect();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0][1], Cell::from("TOT"));
        let order: Vec<String> = t.column(0).map(|c| c.to_string()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn dedup_removes_identical_rows_only() {
        let mut t = table(&["Player", "Salary"], &[&["A", "1"], &["A", "1"], &["A", ""]]);
        assert_eq!(dedup_rows(&mut t), 1);
        assert_eq!(t.height(), 2);
    }

    #[test]
    fn drop_missing_salary() {
        let mut t = table(&["Player", "Salary"], &[&["A", "$1"], &["B", ""]]);
        assert_eq!(drop_missing(&mut t, "Salary").unwrap(), 1);
        assert_eq!(t.rows()[0][0], Cell::from("A"));
    }

    #[test]
    fn merge_all_folds_left() {
        let a = table(&["Player", "G"], &[&["A", "1"]]);
        let b = table(&["Player", "G", "PER"], &[&["A", "2", "3"]]);
        let c = table(&["Player", "WS"], &[&["A", "4"]]);
        let m = merge_all(&[a, b, c], &["Player"], JoinKind::Left).unwrap();
        assert_eq!(labels(&m), vec!["Player", "G", "PER", "WS"]);
        assert_eq!(m.rows()[0][1], Cell::from("1"));
    }
}
