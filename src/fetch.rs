use std::collections::HashMap;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use tracing::info;

use crate::error::{Error, Result};
use crate::settings::HttpSettings;
use crate::table::{Cell, Table};

/// Anything that can turn a URL into the tables on that page.
pub trait TableFetcher {
    fn fetch_tables(&self, url: &str) -> Result<Vec<Table>>;
}

/// Table `index` on the page at `url`.
pub fn nth_table(fetcher: &dyn TableFetcher, url: &str, index: usize) -> Result<Table> {
    let mut tables = fetcher.fetch_tables(url)?;
    if index >= tables.len() {
        return Err(Error::NoTable {
            url: url.to_string(),
            index,
        });
    }
    Ok(tables.swap_remove(index))
}

pub fn first_table(fetcher: &dyn TableFetcher, url: &str) -> Result<Table> {
    nth_table(fetcher, url, 0)
}

pub struct HttpTableFetcher {
    client: reqwest::blocking::Client,
}

impl HttpTableFetcher {
    pub fn new(http: &HttpSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()?;
        Ok(HttpTableFetcher { client })
    }
}

impl TableFetcher for HttpTableFetcher {
    fn fetch_tables(&self, url: &str) -> Result<Vec<Table>> {
        info!("Fetching {}", url);
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let html = resp.text()?;
        let tables = parse_tables(&html);
        info!(url, tables = tables.len(), "parsed page");
        Ok(tables)
    }
}

struct Selectors {
    table: Selector,
    thead_tr: Selector,
    tbody_tr: Selector,
    any_tr: Selector,
    cell: Selector,
}

impl Selectors {
    fn new() -> Self {
        let sel = |s: &str| Selector::parse(s).unwrap();
        Selectors {
            table: sel("table"),
            thead_tr: sel("thead > tr"),
            tbody_tr: sel("tbody > tr"),
            any_tr: sel("tr"),
            cell: sel("th, td"),
        }
    }
}

/// Every `<table>` in `html`, in document order.
///
/// Labels come from the last `<thead>` row; upper header levels are discarded.
/// Data rows are kept verbatim, including any repeated header rows.
pub fn parse_tables(html: &str) -> Vec<Table> {
    let doc = Html::parse_document(html);
    let sel = Selectors::new();
    doc.select(&sel.table)
        .filter_map(|t| parse_table(t, &sel))
        .collect()
}

fn parse_table(table: ElementRef<'_>, sel: &Selectors) -> Option<Table> {
    let head: Vec<ElementRef> = table.select(&sel.thead_tr).collect();
    let (header, body): (ElementRef, Vec<ElementRef>) = match head.last() {
        Some(&last) => (last, table.select(&sel.tbody_tr).collect()),
        None => {
            let mut all = table.select(&sel.any_tr);
            let first = all.next()?;
            (first, all.collect())
        }
    };

    let labels = header_labels(header, sel);
    if labels.is_empty() {
        return None;
    }
    let rows = body
        .into_iter()
        .map(|tr| row_cells(tr, sel))
        .filter(|r| !r.is_empty())
        .collect();
    Some(Table::new(labels, rows))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn colspan(cell: ElementRef<'_>) -> usize {
    cell.value()
        .attr("colspan")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

fn header_labels(tr: ElementRef<'_>, sel: &Selectors) -> Vec<String> {
    let mut raw = Vec::new();
    for cell in tr.select(&sel.cell) {
        let text = cell_text(cell);
        for _ in 0..colspan(cell) {
            raw.push(text.clone());
        }
    }
    label_columns(raw)
}

/// Blank labels become `Unnamed: {pos}`; repeats become `{label}.{n}`.
pub fn label_columns(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(pos, label)| {
            let label = if label.is_empty() {
                format!("Unnamed: {}", pos)
            } else {
                label
            };
            let count = seen.entry(label.clone()).or_insert(0);
            let out = if *count == 0 {
                label
            } else {
                format!("{}.{}", label, count)
            };
            *count += 1;
            out
        })
        .collect()
}

fn row_cells(tr: ElementRef<'_>, sel: &Selectors) -> Vec<Cell> {
    let mut cells = Vec::new();
    for cell in tr.select(&sel.cell) {
        let text = cell_text(cell);
        for _ in 0..colspan(cell) {
            cells.push(Cell::from_raw(&text));
        }
    }
    cells
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Serves canned HTML by URL.
    pub(crate) struct FixtureFetcher(pub HashMap<String, String>);

    impl TableFetcher for FixtureFetcher {
        fn fetch_tables(&self, url: &str) -> Result<Vec<Table>> {
            let html = self.0.get(url).ok_or(Error::Status {
                url: url.to_string(),
                status: 404,
            })?;
            Ok(parse_tables(html))
        }
    }

    pub(crate) fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn per_game_fixture() {
        let tables = parse_tables(&fixture("per_game"));
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.columns()[..3], ["Rk", "Player", "Pos"]);
        // repeated header row survives parsing
        assert!(t.rows().iter().any(|r| r[1].eq_str("Player")));
        assert!(t.rows().iter().all(|r| r.len() == t.width()));
    }

    #[test]
    fn contracts_fixture_keeps_lower_header_level() {
        let t = &parse_tables(&fixture("contracts"))[0];
        assert_eq!(t.columns()[..4], ["Rk", "Player", "Tm", "2021-22"]);
        assert!(t.rows().iter().any(|r| r[3].eq_str("Salary")));
    }

    #[test]
    fn blank_and_repeated_labels() {
        let labels = label_columns(vec!["G".into(), "".into(), "G".into(), "G".into()]);
        assert_eq!(labels, vec!["G", "Unnamed: 1", "G.1", "G.2"]);
    }

    #[test]
    fn table_without_thead_uses_first_row() {
        let html = "<table><tr><td>A</td><td>B</td></tr><tr><td>1</td><td></td></tr></table>";
        let t = &parse_tables(html)[0];
        assert_eq!(t.columns(), &["A".to_string(), "B".to_string()]);
        assert_eq!(t.rows()[0][1], Cell::Missing);
    }

    #[test]
    fn missing_table_index() {
        let mut pages = HashMap::new();
        pages.insert("u".to_string(), "<p>none</p>".to_string());
        let f = FixtureFetcher(pages);
        assert!(matches!(first_table(&f, "u"), Err(Error::NoTable { .. })));
    }
}
