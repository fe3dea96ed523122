mod csv_issue;
mod record_set;
mod script_object;

pub use csv_issue::CsvIssue;
pub use record_set::RecordSet;
pub use script_object::ScriptObject;

/// Name of the native row-identifier column every tabular data file carries.
pub const ID_COLUMN: &str = "Id";
