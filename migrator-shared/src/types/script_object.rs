use serde::{Deserialize, Serialize};

fn default_external_id() -> String {
    "Name".to_string()
}

/// Describes one migrated object type.
///
/// Parent relationships are split into *lookup* (soft references whose
/// ordering is flexible) and *master-detail* (hard references whose parent
/// must be fully processed before the child). The behavior flags control
/// placement in the computed task order and how the object participates in
/// retrieval and update passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptObject {
    /// Object type name, also the base name of its tabular data file.
    pub name: String,
    /// Business-key field used to match records across source and target.
    #[serde(default = "default_external_id")]
    pub external_id: String,
    /// Names of lookup (soft reference) parent objects.
    #[serde(default)]
    pub lookup_parents: Vec<String>,
    /// Names of master-detail (hard reference) parent objects.
    #[serde(default)]
    pub master_detail_parents: Vec<String>,
    /// Source retrieval is unrestricted ("fetch everything").
    #[serde(default)]
    pub all_records: bool,
    /// Identity/reference-type object, processed before anything else.
    #[serde(default)]
    pub is_special_object: bool,
    /// Object declares no parent relationships at all.
    #[serde(default)]
    pub is_object_without_relationships: bool,
    /// Read-only object, never receives DML.
    #[serde(default)]
    pub is_readonly_object: bool,
    /// Source retrieval uses a size-limited query.
    #[serde(default)]
    pub is_limited_query: bool,
    /// External id is a composite of several fields.
    #[serde(default)]
    pub has_complex_external_id: bool,
    /// External id is an autonumber field.
    #[serde(default)]
    pub has_autonumber_external_id: bool,
}

impl ScriptObject {
    /// Creates an object description with the given name, the default
    /// external id, and no relationships or flags set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            external_id: default_external_id(),
            lookup_parents: Vec::new(),
            master_detail_parents: Vec::new(),
            all_records: false,
            is_special_object: false,
            is_object_without_relationships: false,
            is_readonly_object: false,
            is_limited_query: false,
            has_complex_external_id: false,
            has_autonumber_external_id: false,
        }
    }

    /// Sets the external id field.
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = external_id.into();
        self
    }

    /// Adds a lookup parent.
    pub fn with_lookup_parent(mut self, parent: impl Into<String>) -> Self {
        self.lookup_parents.push(parent.into());
        self
    }

    /// Adds a master-detail parent.
    pub fn with_master_detail_parent(mut self, parent: impl Into<String>) -> Self {
        self.master_detail_parents.push(parent.into());
        self
    }

    /// Marks the object as an identity/reference-type object.
    pub fn special(mut self) -> Self {
        self.is_special_object = true;
        self
    }

    /// Marks the object as read-only.
    pub fn readonly(mut self) -> Self {
        self.is_readonly_object = true;
        self
    }

    /// Marks the object for unrestricted retrieval.
    pub fn fetch_all(mut self) -> Self {
        self.all_records = true;
        self
    }

    /// Marks the object for a size-limited query.
    pub fn limited_query(mut self) -> Self {
        self.is_limited_query = true;
        self
    }

    /// Returns every declared parent name, master-detail parents first.
    pub fn parents(&self) -> impl Iterator<Item = &String> {
        self.master_detail_parents
            .iter()
            .chain(self.lookup_parents.iter())
    }

    /// Name of the working tabular data file for this object.
    pub fn working_csv_filename(&self) -> String {
        format!("{}.csv", self.name)
    }

    /// Name of the pristine copy made before the working file is mutated.
    pub fn source_copy_csv_filename(&self) -> String {
        format!("{}_source.csv", self.name)
    }

    /// Name of the column through which a child file references this object.
    pub fn reference_column(&self) -> String {
        format!("{}Id", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_relationships_and_flags() {
        let object = ScriptObject::new("Contact")
            .with_external_id("Email")
            .with_lookup_parent("Account")
            .with_master_detail_parent("Household")
            .limited_query();

        assert_eq!(object.name, "Contact");
        assert_eq!(object.external_id, "Email");
        assert_eq!(object.lookup_parents, vec!["Account"]);
        assert_eq!(object.master_detail_parents, vec!["Household"]);
        assert!(object.is_limited_query);
        assert!(!object.is_readonly_object);
        let parents: Vec<&String> = object.parents().collect();
        assert_eq!(parents, vec!["Household", "Account"]);
    }

    #[test]
    fn filenames_derive_from_object_name() {
        let object = ScriptObject::new("Account");
        assert_eq!(object.working_csv_filename(), "Account.csv");
        assert_eq!(object.source_copy_csv_filename(), "Account_source.csv");
        assert_eq!(object.reference_column(), "AccountId");
    }

    #[test]
    fn deserializes_with_defaults() {
        let object: ScriptObject = serde_json::from_str(r#"{"name": "Case"}"#).unwrap();
        assert_eq!(object.name, "Case");
        assert_eq!(object.external_id, "Name");
        assert!(object.lookup_parents.is_empty());
        assert!(!object.all_records);
    }
}
