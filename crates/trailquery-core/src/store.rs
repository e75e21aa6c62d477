// ABOUTME: Read-only accessor for per-person location record files on disk.
// ABOUTME: Discovers available persons by file naming convention and resolves their file paths.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::record::PersonId;

/// Every record file is named `tlv_day_locations_<person>.json`.
pub const RECORD_FILE_PREFIX: &str = "tlv_day_locations_";
pub const RECORD_FILE_EXTENSION: &str = ".json";
const PERSON_PREFIX: &str = "person";

/// Locates person record files inside a single data directory.
/// The file set is never written by this crate.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file backing `person`. The file may not exist.
    pub fn record_path(&self, person: &PersonId) -> PathBuf {
        self.root.join(format!(
            "{}{}{}",
            RECORD_FILE_PREFIX,
            person.as_str(),
            RECORD_FILE_EXTENSION
        ))
    }

    /// True iff a record file exists for `person`. Identifiers that could
    /// escape the data directory are never considered present.
    pub fn person_exists(&self, person: &PersonId) -> bool {
        let id = person.as_str();
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return false;
        }
        self.record_path(person).is_file()
    }

    /// Sorted, duplicate-free identifiers of every `person<N>` record file.
    /// An unreadable or missing data directory yields an empty list.
    pub fn list_persons(&self) -> Vec<PersonId> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %self.root.display(), "cannot read data directory: {}", e);
                return Vec::new();
            }
        };

        let persons: BTreeSet<PersonId> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                person_from_file_name(name.to_str()?)
            })
            .filter(|person| self.person_exists(person))
            .collect();

        persons.into_iter().collect()
    }
}

/// Extract `person<N>` from `tlv_day_locations_person<N>.json`.
fn person_from_file_name(name: &str) -> Option<PersonId> {
    let digits = name
        .strip_prefix(RECORD_FILE_PREFIX)?
        .strip_prefix(PERSON_PREFIX)?
        .strip_suffix(RECORD_FILE_EXTENSION)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(PersonId::new(format!("{}{}", PERSON_PREFIX, digits)))
}
