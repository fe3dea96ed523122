//! Row and request types shared by the endpoint interfaces.

use std::collections::HashMap;

/// Direction of a retrieval pass.
///
/// Lookup relationships can point forward or backward in the computed task
/// order, so the retrieval protocol queries in both directions; `Target`
/// addresses the target-side endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDirection {
    Forwards,
    Backwards,
    Target,
}

/// Direction of an update pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDirection {
    Forwards,
    Backwards,
}

/// Outcome of a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Abort,
}

/// Options controlling how a confirmation prompt behaves.
#[derive(Debug, Clone, Copy)]
pub struct PromptOptions {
    /// Decision assumed when the user gives no explicit answer.
    pub default: Decision,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            default: Decision::Continue,
        }
    }
}

/// One row-oriented record as exchanged with an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    /// External-id value identifying the record across endpoints.
    pub key: String,
    /// Native record identifier on the endpoint the row came from, if known.
    pub record_id: Option<String>,
    /// Raw column values.
    pub fields: HashMap<String, String>,
}

/// Tabular file content with column headers and row order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Index of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Value of the named column within the given row, if both exist.
    pub fn cell<'a>(&self, row: &'a [String], column: &str) -> Option<&'a str> {
        self.column_index(column)
            .and_then(|index| row.get(index))
            .map(String::as_str)
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_resolves_by_header_name() {
        let mut table = TableData::new(vec!["Id".into(), "Name".into()]);
        table.push_row(vec!["1".into(), "ACME".into()]);
        assert_eq!(table.column_index("Name"), Some(1));
        assert_eq!(table.cell(&table.rows[0], "Name"), Some("ACME"));
        assert_eq!(table.cell(&table.rows[0], "Missing"), None);
    }
}
