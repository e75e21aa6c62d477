// ABOUTME: Query executor that runs filter expressions against one or more persons' record files.
// ABOUTME: Engine failures degrade to empty results; returned records are tagged with their person.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::engine::FilterEngine;
use crate::record::PersonId;
use crate::store::RecordStore;

/// Result of running one filter expression for a list of persons.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MultiPersonOutcome {
    /// Every person's records flattened into one sequence.
    Combined {
        locations: Vec<Value>,
        count: usize,
        persons: Vec<PersonId>,
        jq_filter: String,
        #[serde(skip)]
        resolved: Vec<PersonId>,
    },
    /// Records kept apart per person.
    Separate {
        person_results: BTreeMap<PersonId, Vec<Value>>,
        total_count: usize,
        persons: Vec<PersonId>,
        jq_filter: String,
        #[serde(skip)]
        resolved: Vec<PersonId>,
    },
}

impl MultiPersonOutcome {
    /// Requested persons that had backing data and were queried.
    pub fn resolved_persons(&self) -> &[PersonId] {
        match self {
            Self::Combined { resolved, .. } | Self::Separate { resolved, .. } => resolved,
        }
    }

    /// All returned values, regardless of grouping.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Self::Combined { locations, .. } => locations.iter().collect(),
            Self::Separate { person_results, .. } => {
                person_results.values().flatten().collect()
            }
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Self::Combined { count, .. } => *count,
            Self::Separate { total_count, .. } => *total_count,
        }
    }
}

/// Runs filter expressions over person record files through a [`FilterEngine`].
#[derive(Clone)]
pub struct QueryExecutor {
    store: RecordStore,
    engine: Arc<dyn FilterEngine>,
}

impl QueryExecutor {
    pub fn new(store: RecordStore, engine: Arc<dyn FilterEngine>) -> Self {
        Self { store, engine }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Run `filter` against one person's records. Unknown persons and engine
    /// failures both yield an empty result; failures are logged, not returned.
    pub async fn run_filter_query(&self, person: &PersonId, filter: &str) -> Vec<Value> {
        if !self.store.person_exists(person) {
            tracing::debug!(%person, "no record file for person");
            return Vec::new();
        }

        let path = self.store.record_path(person);
        match self.engine.run(filter, &path).await {
            Ok(values) => {
                tracing::debug!(%person, filter, count = values.len(), "filter query finished");
                values
            }
            Err(e) => {
                tracing::warn!(%person, filter, "error querying {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Run `filter` for every person in the comma-separated `persons_csv`,
    /// tagging each returned object with its person identifier.
    pub async fn run_multi_person_query(
        &self,
        persons_csv: &str,
        filter: &str,
        combine_results: bool,
    ) -> MultiPersonOutcome {
        let persons = parse_person_list(persons_csv);
        let mut resolved = Vec::new();
        let mut person_results: BTreeMap<PersonId, Vec<Value>> = BTreeMap::new();
        let mut combined = Vec::new();

        for person in &persons {
            if !self.store.person_exists(person) {
                tracing::info!(%person, "skipping unknown person");
                continue;
            }

            let mut values = self.run_filter_query(person, filter).await;
            for value in &mut values {
                tag_with_person(value, person);
            }

            resolved.push(person.clone());
            if combine_results {
                combined.extend(values);
            } else {
                person_results.insert(person.clone(), values);
            }
        }

        if combine_results {
            MultiPersonOutcome::Combined {
                count: combined.len(),
                locations: combined,
                persons,
                jq_filter: filter.to_string(),
                resolved,
            }
        } else {
            MultiPersonOutcome::Separate {
                total_count: person_results.values().map(Vec::len).sum(),
                person_results,
                persons,
                jq_filter: filter.to_string(),
                resolved,
            }
        }
    }
}

/// Split `person1, person2` into trimmed, non-empty identifiers.
pub fn parse_person_list(persons_csv: &str) -> Vec<PersonId> {
    persons_csv
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PersonId::from)
        .collect()
}

fn tag_with_person(value: &mut Value, person: &PersonId) {
    if let Value::Object(map) = value {
        map.insert("person".to_string(), Value::String(person.to_string()));
    }
}
