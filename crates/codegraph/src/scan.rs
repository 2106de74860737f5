use crate::model::Tag;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

// ------------------------------------------------------------------
// Scanner output
// ------------------------------------------------------------------

/// Structural summary of one source file, as produced by the scanner.
///
/// Every field is optional on the wire. A field that is present but has
/// the wrong shape is replaced by its empty value instead of failing the
/// whole document. Inside lists and maps only the bad entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub functions: Vec<String>,
    /// Bare class names; used when the scanner gives no `classDetails`.
    #[serde(default, deserialize_with = "lenient_seq")]
    pub classes: Vec<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub class_details: Vec<ClassDetail>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub signatures: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub sources: BTreeMap<String, String>,
    /// Caller -> callees. Ordered so that edge emission is deterministic.
    #[serde(default, deserialize_with = "lenient_map")]
    pub dependencies: BTreeMap<String, BTreeSet<String>>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub comments: Vec<Annotation>,
}

impl ScanResult {
    /// Classes in scan order: detailed ones first, then bare names that
    /// have no detail entry.
    pub fn all_classes(&self) -> Vec<ClassDetail> {
        let mut classes = self.class_details.clone();
        for name in &self.classes {
            if !classes.iter().any(|c| &c.name == name) {
                classes.push(ClassDetail {
                    name: name.clone(),
                    methods: Vec::new(),
                });
            }
        }
        classes
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDetail {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub methods: Vec<MethodDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodDetail {
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub signature: Option<String>,
}

// ------------------------------------------------------------------
// Persisted annotations
// ------------------------------------------------------------------

/// Durable annotation record. Joined back to code nodes by `node_label`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    #[serde(default, deserialize_with = "lenient")]
    pub node_label: String,
    #[serde(default, deserialize_with = "lenient")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(default)]
    pub tag: Tag,
}

/// Canonical value echoed by the persistence collaborator after a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationEcho {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub comments: Vec<Annotation>,
}

// ------------------------------------------------------------------
// Folder listing
// ------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTree {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileTree>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// A list whose malformed elements are skipped one by one.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let serde_json::Value::Array(items) = serde_json::Value::deserialize(deserializer)?
    else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                log::debug!("skipping malformed entry: {e}");
                None
            }
        })
        .collect())
}

/// A string-keyed map whose malformed values are skipped one by one.
fn lenient_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let serde_json::Value::Object(entries) = serde_json::Value::deserialize(deserializer)?
    else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(decoded) => Some((key, decoded)),
            Err(e) => {
                log::debug!("skipping malformed entry {key:?}: {e}");
                None
            }
        })
        .collect())
}
