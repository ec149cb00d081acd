use anyhow::{Context, Result};
use regex::{Captures, Regex};

/// A table extracted from an HTML page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HtmlTable {
    /// Header cell texts (`<th>`), in column order
    pub headers: Vec<String>,
    /// Body rows, each a list of `<td>` cell texts
    pub rows: Vec<Vec<String>>,
}

/// Extract every `<table>` of an HTML document, in document order
///
/// Headers come from `<th>` cells in `<thead>`; without a `<thead>` the first
/// row holding `<th>` cells is used. Rows come from `<tbody>` (or every other
/// row when there is no `<tbody>`); rows without `<td>` cells are skipped.
/// Nested tables are not supported.
///
/// # Example
/// ```
/// use trackwatch::parser::table::extract_tables;
///
/// let html = "<table><thead><tr><th>Status</th></tr></thead>\
///             <tbody><tr><td>Shipped</td></tr></tbody></table>";
/// let tables = extract_tables(html).unwrap();
/// assert_eq!(tables[0].headers, vec!["Status"]);
/// assert_eq!(tables[0].rows, vec![vec!["Shipped".to_string()]]);
/// ```
pub fn extract_tables(html: &str) -> Result<Vec<HtmlTable>> {
    let patterns = TablePatterns::new()?;
    let mut tables = Vec::new();

    for cap in patterns.table.captures_iter(html) {
        let inner = &cap[1];

        let thead = patterns.thead.captures(inner).map(|c| c[1].to_string());
        let tbody = patterns.tbody.captures(inner).map(|c| c[1].to_string());

        let (headers, rows) = match (thead, tbody) {
            (Some(head), Some(body)) => (patterns.header_cells(&head), patterns.body_rows(&body)),
            (Some(head), None) => {
                let rest = patterns.thead.replace(inner, "");
                (patterns.header_cells(&head), patterns.body_rows(&rest))
            }
            (None, body) => {
                let headers = patterns.header_cells(inner);
                let rows = match body {
                    Some(body) => patterns.body_rows(&body),
                    None => patterns.body_rows(inner),
                };
                (headers, rows)
            }
        };

        tables.push(HtmlTable { headers, rows });
    }

    Ok(tables)
}

/// Every pattern the extractor needs, compiled once per document
struct TablePatterns {
    table: Regex,
    thead: Regex,
    tbody: Regex,
    row: Regex,
    th: Regex,
    td: Regex,
    tag: Regex,
    entity: Regex,
}

impl TablePatterns {
    fn new() -> Result<Self> {
        Ok(Self {
            table: Regex::new(r"(?is)<table\b[^>]*>(.*?)</table\s*>")
                .context("Failed to compile table regex")?,
            thead: Regex::new(r"(?is)<thead\b[^>]*>(.*?)</thead\s*>")
                .context("Failed to compile thead regex")?,
            tbody: Regex::new(r"(?is)<tbody\b[^>]*>(.*?)</tbody\s*>")
                .context("Failed to compile tbody regex")?,
            row: Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").context("Failed to compile row regex")?,
            th: Regex::new(r"(?is)<th\b[^>]*>(.*?)</th\s*>").context("Failed to compile th regex")?,
            td: Regex::new(r"(?is)<td\b[^>]*>(.*?)</td\s*>").context("Failed to compile td regex")?,
            tag: Regex::new(r"(?s)<[^>]*>").context("Failed to compile tag regex")?,
            entity: Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);")
                .context("Failed to compile entity regex")?,
        })
    }

    /// `<th>` cells of the first row in `fragment` that has any
    fn header_cells(&self, fragment: &str) -> Vec<String> {
        self.rows(fragment)
            .map(|row| self.cells(row, &self.th))
            .find(|cells| !cells.is_empty())
            .unwrap_or_default()
    }

    fn body_rows(&self, fragment: &str) -> Vec<Vec<String>> {
        self.rows(fragment)
            .map(|row| self.cells(row, &self.td))
            .filter(|cells| !cells.is_empty())
            .collect()
    }

    fn rows<'a>(&'a self, fragment: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.row
            .captures_iter(fragment)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
    }

    fn cells(&self, row: &str, cell: &Regex) -> Vec<String> {
        cell.captures_iter(row)
            .map(|c| self.cell_text(&c[1]))
            .collect()
    }

    /// Plain text of a cell: tags stripped, entities decoded, whitespace collapsed
    fn cell_text(&self, fragment: &str) -> String {
        let stripped = self.tag.replace_all(fragment, " ");
        let decoded = self.decode_entities(&stripped);
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Decode named entities commonly found in tracking pages plus numeric ones
    fn decode_entities(&self, text: &str) -> String {
        let decoded = self.entity.replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let replacement = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
                _ => None,
            };

            match replacement {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        });

        decoded.into_owned()
    }
}
