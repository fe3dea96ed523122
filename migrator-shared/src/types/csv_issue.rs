use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One detected problem in the tabular source files: either a structural
/// defect of a single file or a broken cross-file reference.
///
/// Issues are immutable once created and accumulate in declaration order for
/// the duration of the validate/repair pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvIssue {
    /// When the issue was detected.
    pub date: DateTime<Utc>,
    /// Offending value in the child file (or a row locator for structural issues).
    pub child_value: String,
    /// Object whose file contains the problem.
    pub child_object: String,
    /// Column the problem was found in.
    pub child_field: String,
    /// Referenced value that should exist on the parent side.
    pub parent_value: String,
    /// Parent object the reference points at.
    pub parent_object: String,
    /// Parent column the reference should have matched.
    pub parent_field: String,
    /// Human-readable error description.
    pub error: String,
}

impl CsvIssue {
    /// Column headers of the issues report file, in output order.
    pub const REPORT_HEADERS: [&'static str; 8] = [
        "Date",
        "Child value",
        "Child sObject",
        "Child field",
        "Parent value",
        "Parent sObject",
        "Parent field",
        "Error",
    ];

    /// A structural issue scoped to a single file (no parent side).
    pub fn structural(
        child_object: impl Into<String>,
        child_field: impl Into<String>,
        child_value: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            date: Utc::now(),
            child_value: child_value.into(),
            child_object: child_object.into(),
            child_field: child_field.into(),
            parent_value: String::new(),
            parent_object: String::new(),
            parent_field: String::new(),
            error: error.into(),
        }
    }

    /// A cross-file reference issue.
    #[allow(clippy::too_many_arguments)]
    pub fn reference(
        child_object: impl Into<String>,
        child_field: impl Into<String>,
        child_value: impl Into<String>,
        parent_object: impl Into<String>,
        parent_field: impl Into<String>,
        parent_value: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            date: Utc::now(),
            child_value: child_value.into(),
            child_object: child_object.into(),
            child_field: child_field.into(),
            parent_value: parent_value.into(),
            parent_object: parent_object.into(),
            parent_field: parent_field.into(),
            error: error.into(),
        }
    }

    /// The issue as one report row, matching [`Self::REPORT_HEADERS`].
    pub fn report_row(&self) -> Vec<String> {
        vec![
            self.date.to_rfc3339(),
            self.child_value.clone(),
            self.child_object.clone(),
            self.child_field.clone(),
            self.parent_value.clone(),
            self.parent_object.clone(),
            self.parent_field.clone(),
            self.error.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_row_matches_header_order() {
        let issue = CsvIssue::reference(
            "Contact",
            "AccountId",
            "ACME",
            "Account",
            "Name",
            "ACME",
            "Missing parent record",
        );
        let row = issue.report_row();
        assert_eq!(row.len(), CsvIssue::REPORT_HEADERS.len());
        assert_eq!(row[1], "ACME");
        assert_eq!(row[2], "Contact");
        assert_eq!(row[5], "Account");
        assert_eq!(row[7], "Missing parent record");
    }

    #[test]
    fn structural_issue_has_empty_parent_side() {
        let issue = CsvIssue::structural("Account", "Id", "", "Missing required column");
        assert!(issue.parent_object.is_empty());
        assert!(issue.parent_value.is_empty());
        assert_eq!(issue.error, "Missing required column");
    }
}
