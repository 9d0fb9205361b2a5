use std::fmt;

use crate::error::{Error, Result};

/// One cell of a scraped table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Raw page text becomes `Text`, except blank cells which are `Missing`.
    pub fn from_raw(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Missing
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// True when the cell renders to exactly `s` (text match or formatted number).
    pub fn eq_str(&self, s: &str) -> bool {
        match self {
            Cell::Text(t) => t == s,
            Cell::Number(_) => self.to_string() == s,
            Cell::Missing => false,
        }
    }

    /// Join/dedup key. Numbers and text compare by their rendered form.
    pub(crate) fn key(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// A rectangular table: ordered column labels plus rows of equal width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Rows shorter than the header are padded with `Missing`; longer rows are cut.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, Cell::Missing);
                r
            })
            .collect();
        Table { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    pub fn require_column(&self, label: &str) -> Result<usize> {
        self.column_index(label)
            .ok_or_else(|| Error::MissingColumn(label.to_string()))
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |r| &r[idx])
    }

    pub(crate) fn column_mut(&mut self, idx: usize) -> impl Iterator<Item = &mut Cell> + '_ {
        self.rows.iter_mut().map(move |r| &mut r[idx])
    }

    /// Keep only the columns at `positions`, in that order.
    pub fn select_positions(&self, positions: &[usize]) -> Table {
        let columns = positions
            .iter()
            .filter_map(|&i| self.columns.get(i).cloned())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|r| positions.iter().filter_map(|&i| r.get(i).cloned()).collect())
            .collect();
        Table { columns, rows }
    }

    pub fn select_columns(&self, labels: &[&str]) -> Result<Table> {
        let positions = labels
            .iter()
            .map(|l| self.require_column(l))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.select_positions(&positions))
    }

    /// Rename by `(from, to)` pairs. Unknown labels are ignored.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for col in self.columns.iter_mut() {
            if let Some((_, to)) = renames.iter().find(|(from, _)| *from == col.as_str()) {
                *col = to.to_string();
            }
        }
    }

    pub fn retain_rows<F>(&mut self, keep: F)
    where
        F: FnMut(&Vec<Cell>) -> bool,
    {
        self.rows.retain(keep);
    }

    pub fn retain_columns<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        let positions: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| keep(c.as_str()))
            .map(|(i, _)| i)
            .collect();
        if positions.len() != self.columns.len() {
            *self = self.select_positions(&positions);
        }
    }

    pub fn drop_column(&mut self, label: &str) -> Result<()> {
        let idx = self.require_column(label)?;
        self.columns.remove(idx);
        for row in self.rows.iter_mut() {
            row.remove(idx);
        }
        Ok(())
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Cell>> {
        &mut self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["Player".into(), "Tm".into(), "PTS".into()],
            vec![
                vec!["LeBron James".into(), "LAL".into(), Cell::Number(25.0)],
                vec!["Player".into(), "Tm".into()],
            ],
        )
    }

    #[test]
    fn pads_short_rows() {
        let t = sample();
        assert_eq!(t.rows()[1][2], Cell::Missing);
        assert_eq!(t.width(), 3);
    }

    #[test]
    fn blank_raw_cells_are_missing() {
        assert_eq!(Cell::from_raw("  "), Cell::Missing);
        assert_eq!(Cell::from_raw(" .345 "), Cell::Text(".345".into()));
    }

    #[test]
    fn select_and_rename() {
        let mut t = sample().select_columns(&["PTS", "Player"]).unwrap();
        t.rename_columns(&[("PTS", "Points")]);
        assert_eq!(t.columns(), &["Points".to_string(), "Player".to_string()]);
        assert_eq!(t.rows()[0][1], Cell::from("LeBron James"));
        assert!(sample().select_columns(&["Salary"]).is_err());
    }

    #[test]
    fn drop_column_removes_cells() {
        let mut t = sample();
        t.drop_column("Tm").unwrap();
        assert_eq!(t.width(), 2);
        assert!(t.rows().iter().all(|r| r.len() == 2));
        assert_eq!(t.rows()[0][1].as_number(), Some(25.0));
        assert!(t.drop_column("Tm").is_err());
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(Cell::Number(25.0).to_string(), "25");
        assert_eq!(Cell::Number(0.345).to_string(), "0.345");
        assert!(Cell::Number(25.0).eq_str("25"));
    }
}
