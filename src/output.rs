use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::table::{Cell, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexColumn {
    Omit,
    /// Leading unnamed column holding the 0-based row number.
    Include,
}

pub fn write_table(table: &Table, path: impl AsRef<Path>, index: IndexColumn) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = Vec::with_capacity(table.width() + 1);
    if index == IndexColumn::Include {
        header.push("");
    }
    header.extend(table.columns().iter().map(String::as_str));
    wtr.write_record(&header)?;

    for (i, row) in table.rows().iter().enumerate() {
        let mut record: Vec<String> = Vec::with_capacity(row.len() + 1);
        if index == IndexColumn::Include {
            record.push(i.to_string());
        }
        record.extend(row.iter().map(Cell::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = table.height(), "wrote table");
    Ok(())
}

/// Serialize `records` under `header`. The header row is written even when
/// there are no records; it must list the fields in serialization order.
pub fn write_records<T: Serialize>(
    records: &[T],
    header: &[&str],
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    wtr.write_record(header)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = records.len(), "wrote records");
    Ok(())
}

/// Read a file written by `write_table` back as text cells.
pub fn read_table(path: impl AsRef<Path>) -> Result<Table> {
    let mut rdr = csv::Reader::from_path(path)?;
    let columns = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from_raw).collect());
    }
    Ok(Table::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged() -> Table {
        Table::new(
            vec!["Player".into(), "Tm".into(), "PTS".into(), "Salary".into()],
            vec![
                vec!["LeBron James".into(), "LAL".into(), Cell::Number(25.0), "$41,180,544".into()],
                vec!["Jaylen Adams".into(), "MIL".into(), Cell::Number(0.3), Cell::Missing],
            ],
        )
    }

    #[test]
    fn round_trip_preserves_labels_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = merged();
        write_table(&table, &path, IndexColumn::Omit).unwrap();

        let back = read_table(&path).unwrap();
        assert_eq!(back.columns(), table.columns());
        for (a, b) in table.rows().iter().zip(back.rows()) {
            for (x, y) in a.iter().zip(b) {
                assert_eq!(x.to_string(), y.to_string());
            }
        }
    }

    #[test]
    fn index_column_is_leading_and_unnamed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indexed.csv");
        write_table(&merged(), &path, IndexColumn::Include).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(",Player,Tm,PTS,Salary"));
        assert_eq!(lines.next(), Some("0,LeBron James,LAL,25,\"$41,180,544\""));
        assert_eq!(lines.next(), Some("1,Jaylen Adams,MIL,0.3,"));
    }

    #[derive(Serialize)]
    struct Line {
        #[serde(rename = "Player")]
        player: &'static str,
        #[serde(rename = "PTS")]
        pts: u32,
    }

    #[test]
    fn records_carry_header_even_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        write_records::<Line>(&[], &["Player", "PTS"], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Player,PTS\n");

        let lines = [Line { player: "LeBron James", pts: 25 }];
        write_records(&lines, &["Player", "PTS"], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Player,PTS\nLeBron James,25\n");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.csv");
        assert!(write_table(&merged(), &path, IndexColumn::Omit).is_err());
    }
}
