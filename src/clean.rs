//! Cleanup passes for tables scraped off stats pages.
//!
//! The pages repeat their header row every few dozen rows and leave some
//! header cells blank, so a raw table needs three passes before it can be
//! joined: header-artifact rows out, placeholder columns out, numeric columns
//! coerced and densified.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::Result;
use crate::table::{Cell, Table};

/// Run all three passes in order.
pub fn clean(mut table: Table, identity: &str) -> Result<Table> {
    drop_header_rows(&mut table, identity)?;
    drop_placeholder_columns(&mut table);
    coerce_numeric(&mut table);
    Ok(table)
}

/// Drop rows whose `identity` cell repeats the column label (e.g. Player == "Player").
pub fn drop_header_rows(table: &mut Table, identity: &str) -> Result<usize> {
    let idx = table.require_column(identity)?;
    let before = table.height();
    table.retain_rows(|row| !row[idx].eq_str(identity));
    let removed = before - table.height();
    debug!(identity, removed, "dropped header-artifact rows");
    Ok(removed)
}

pub fn is_placeholder_label(label: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^Unnamed(: \d+)?").unwrap());
    re.is_match(label)
}

pub fn drop_placeholder_columns(table: &mut Table) {
    table.retain_columns(|label| !is_placeholder_label(label));
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Convert every fully numeric column to `Number` and fill its gaps with the
/// column mean. Columns with any non-numeric text are left exactly as they were.
/// Returns the labels of the columns that were converted.
pub fn coerce_numeric(table: &mut Table) -> Vec<String> {
    let mut converted = Vec::new();
    for idx in 0..table.width() {
        let Some(values) = numeric_values(table, idx) else {
            continue;
        };
        let mean = values.iter().flatten().sum::<f64>() / values.iter().flatten().count() as f64;
        for (cell, value) in table.column_mut(idx).zip(values) {
            *cell = Cell::Number(value.unwrap_or(mean));
        }
        converted.push(table.columns()[idx].clone());
    }
    debug!(columns = ?converted, "coerced numeric columns");
    converted
}

/// `Some` with one entry per row (`None` for missing) when every present cell
/// parses, and at least one does.
fn numeric_values(table: &Table, idx: usize) -> Option<Vec<Option<f64>>> {
    let mut values = Vec::with_capacity(table.height());
    let mut present = 0usize;
    for cell in table.column(idx) {
        match cell {
            Cell::Missing => values.push(None),
            Cell::Number(n) => {
                present += 1;
                values.push(Some(*n));
            }
            Cell::Text(s) => {
                present += 1;
                values.push(Some(parse_number(s)?));
            }
        }
    }
    (present > 0).then_some(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Cell::from_raw(c)).collect())
                .collect(),
        )
    }

    fn stats_page() -> Table {
        raw(
            &["Rk", "Player", "Pos", "Unnamed: 3", "PTS", "3P%"],
            &[
                &["1", "Precious Achiuwa", "PF", "", "5.0", ".509"],
                &["2", "Jaylen Adams", "PG", "", "1.0", ""],
                &["Rk", "Player", "Pos", "", "PTS", "3P%"],
                &["3", "Steven Adams", "C", "", "7.6", ".333"],
            ],
        )
    }

    #[test]
    fn removes_header_artifact_rows() {
        let t = clean(stats_page(), "Player").unwrap();
        assert_eq!(t.height(), 3);
        let idx = t.column_index("Player").unwrap();
        assert!(t.column(idx).all(|c| !c.eq_str("Player")));
    }

    #[test]
    fn drops_placeholder_columns() {
        let t = clean(stats_page(), "Player").unwrap();
        assert!(t.column_index("Unnamed: 3").is_none());
        assert_eq!(t.width(), 5);
    }

    #[test]
    fn imputes_mean_without_shifting_it() {
        let t = clean(stats_page(), "Player").unwrap();
        let idx = t.column_index("3P%").unwrap();
        let vals: Vec<f64> = t.column(idx).map(|c| c.as_number().unwrap()).collect();
        let expected = (0.509 + 0.333) / 2.0;
        assert!((vals[1] - expected).abs() < 1e-12);
        let mean = vals.iter().sum::<f64>() / vals.len() as f64;
        assert!((mean - expected).abs() < 1e-12);
    }

    #[test]
    fn text_columns_untouched() {
        let t = clean(stats_page(), "Player").unwrap();
        let idx = t.column_index("Pos").unwrap();
        let after: Vec<&Cell> = t.column(idx).collect();
        assert_eq!(after, vec![&Cell::from("PF"), &Cell::from("PG"), &Cell::from("C")]);
    }

    #[test]
    fn one_bad_cell_keeps_column_as_text() {
        let mut t = raw(&["Salary"], &[&["100"], &["$2,000"], &[""]]);
        assert!(coerce_numeric(&mut t).is_empty());
        assert_eq!(t.rows()[0][0], Cell::from("100"));
        assert_eq!(t.rows()[2][0], Cell::Missing);
    }

    #[test]
    fn all_missing_column_is_not_numeric() {
        let mut t = raw(&["Blank", "N"], &[&["", "1"], &["", "3"]]);
        assert_eq!(coerce_numeric(&mut t), vec!["N".to_string()]);
        assert!(t.column(0).all(Cell::is_missing));
    }

    #[test]
    fn nan_text_is_not_a_number() {
        let mut t = raw(&["Player"], &[&["Nan"], &["inf"]]);
        assert!(coerce_numeric(&mut t).is_empty());
    }

    #[test]
    fn missing_identity_column_is_an_error() {
        assert!(clean(stats_page(), "Name").is_err());
    }
}
