//! Tab-separated metadata tables.
//!
//! Only what the pipeline needs is parsed: the header row and the cell
//! values, so that column choices and highlight values can be checked
//! against what the file actually contains.

use std::collections::HashSet;

use crate::error::RenderError;

/// Cell values treated as missing when collecting distinct values.
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "1.#IND", "1.#QNAN",
];

/// Whether a cell value counts as missing.
pub fn is_missing(value: &str) -> bool {
    MISSING_TOKENS.contains(&value)
}

/// A parsed tab-separated table with a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MetadataTable {
    /// Parse a tab-separated table.
    ///
    /// The first non-blank line is the header. Rows may be shorter than the
    /// header (trailing cells are missing) but never longer. A UTF-8 byte
    /// order mark and Windows line endings are accepted.
    pub fn parse(data: &[u8]) -> Result<Self, RenderError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| unreadable(format!("not valid UTF-8 ({e})")))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut lines = text
            .lines()
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty());

        let (_, header_line) = lines
            .next()
            .ok_or_else(|| unreadable("file has no header row"))?;

        let headers: Vec<String> = header_line
            .split('\t')
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(unreadable("header row has no column names"));
        }

        let mut seen = HashSet::new();
        for header in headers.iter().filter(|h| !h.is_empty()) {
            if !seen.insert(header.as_str()) {
                return Err(unreadable(format!("duplicate column '{header}'")));
            }
        }

        let mut rows = Vec::new();
        for (index, line) in lines {
            let cells: Vec<String> = line.split('\t').map(|c| c.trim().to_string()).collect();
            if cells.len() > headers.len() {
                return Err(unreadable(format!(
                    "line {} has {} fields, header has {}",
                    index + 1,
                    cells.len(),
                    headers.len()
                )));
            }
            rows.push(cells);
        }

        Ok(Self { headers, rows })
    }

    /// Header column names, in file order. Unnamed columns are skipped.
    pub fn columns(&self) -> Vec<&str> {
        self.headers
            .iter()
            .map(String::as_str)
            .filter(|h| !h.is_empty())
            .collect()
    }

    /// Whether the header contains `column`.
    pub fn has_column(&self, column: &str) -> bool {
        !column.is_empty() && self.headers.iter().any(|h| h == column)
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Distinct non-missing values of `column`, in first-appearance order.
    /// Returns `None` when the column does not exist.
    pub fn distinct_values(&self, column: &str) -> Option<Vec<&str>> {
        if column.is_empty() {
            return None;
        }
        let index = self.headers.iter().position(|h| h == column)?;

        let mut seen = HashSet::new();
        let values = self
            .rows
            .iter()
            .filter_map(|row| row.get(index))
            .map(String::as_str)
            .filter(|v| !is_missing(v))
            .filter(|v| seen.insert(*v))
            .collect();
        Some(values)
    }
}

fn unreadable(detail: impl std::fmt::Display) -> RenderError {
    RenderError::validation(format!("metadata unreadable: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "id\tcountry\tclade\n\
        s1\tKenya\tA\n\
        s2\tUganda\tA\n\
        s3\tKenya\tB\n\
        s4\tNA\tB\n\
        s5\t\tC\n";

    #[test]
    fn test_parse_header_and_rows() {
        let table = MetadataTable::parse(SAMPLE.as_bytes()).expect("parse");
        assert_eq!(table.columns(), vec!["id", "country", "clade"]);
        assert_eq!(table.row_count(), 5);
        assert!(table.has_column("clade"));
        assert!(!table.has_column("host"));
        assert!(!table.has_column(""));
    }

    #[test]
    fn test_distinct_values_skip_missing_and_keep_order() {
        let table = MetadataTable::parse(SAMPLE.as_bytes()).expect("parse");
        assert_eq!(
            table.distinct_values("country"),
            Some(vec!["Kenya", "Uganda"])
        );
        assert_eq!(table.distinct_values("clade"), Some(vec!["A", "B", "C"]));
        assert_eq!(table.distinct_values("host"), None);
    }

    #[test]
    fn test_short_rows_are_missing_cells() {
        let table = MetadataTable::parse(b"id\tcountry\ns1\n s2 \tPeru\n").expect("parse");
        assert_eq!(table.distinct_values("country"), Some(vec!["Peru"]));
        assert_eq!(table.distinct_values("id"), Some(vec!["s1", "s2"]));
    }

    #[test]
    fn test_bom_and_crlf_are_accepted() {
        let table =
            MetadataTable::parse("\u{feff}id\tclade\r\ns1\tA\r\n".as_bytes()).expect("parse");
        assert_eq!(table.columns(), vec!["id", "clade"]);
        assert_eq!(table.distinct_values("clade"), Some(vec!["A"]));
    }

    #[test]
    fn test_rejects_unreadable_input() {
        for input in [
            &b""[..],
            &b"\n\n  \n"[..],
            &b"\t\t\n"[..],
            &b"id\tid\n"[..],
            &b"id\tclade\ns1\tA\textra\n"[..],
            &[0xff, 0xfe, 0x00][..],
        ] {
            let err = MetadataTable::parse(input).unwrap_err();
            assert!(
                err.to_string().starts_with("metadata unreadable"),
                "unexpected message: {err}"
            );
        }
    }
}
