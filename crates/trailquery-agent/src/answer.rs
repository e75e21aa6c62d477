// ABOUTME: Aggregation of tool results into a QueryOutcome and assembly of the FinalAnswer.
// ABOUTME: Builds the summary, the coordinate list, person fields, and multi-person display colors.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use trailquery_core::{Coordinate, LocationRecord, PersonId};

use crate::policy::PERSON_COLORS;
use crate::tools::ToolOutput;

/// Fragments starting with these are mechanical echoes, not narrative.
pub const ECHO_PREFIXES: [&str; 3] = [
    "Executed jq query",
    "Distance between locations:",
    "Error executing",
];

pub const NO_DATA_SUMMARY: &str = "No location data found for the specified query parameters.";

/// Everything gathered while answering one query.
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    /// Person-tagged records from every tool call, in arrival order.
    pub records: Vec<LocationRecord>,
    pub persons: BTreeSet<PersonId>,
    /// Narrative fragments in the order they were produced.
    pub fragments: Vec<String>,
}

impl QueryOutcome {
    /// Fold one tool result into the aggregate. Values that are not
    /// person-tagged location records (aggregates, scalars) are not collected.
    pub fn absorb(&mut self, output: &ToolOutput) {
        let ToolOutput::Query(query) = output else {
            return;
        };

        self.persons.extend(query.resolved_persons().iter().cloned());

        for value in query.values() {
            match serde_json::from_value::<LocationRecord>(value.clone()) {
                Ok(record) => {
                    if let Some(person) = &record.person {
                        self.persons.insert(person.clone());
                        self.records.push(record);
                    }
                }
                Err(e) => {
                    tracing::debug!("tool value is not a location record: {}", e);
                }
            }
        }
    }

    pub fn push_fragment(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }
}

/// The structured answer to a natural-language query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAnswer {
    /// Set only when exactly one person is involved.
    pub person: Option<PersonId>,
    /// Set only when more than one person is involved.
    pub persons: Option<Vec<PersonId>>,
    pub locations: Vec<LocationRecord>,
    pub summary: String,
    pub coordinates: Vec<Coordinate>,
    /// Set only when more than one person is involved.
    pub person_colors: Option<BTreeMap<PersonId, String>>,
}

/// Build the final answer from an aggregated outcome.
pub fn assemble(outcome: QueryOutcome) -> FinalAnswer {
    let QueryOutcome {
        records,
        persons,
        fragments,
    } = outcome;

    let narrative: Vec<&str> = fragments
        .iter()
        .map(String::as_str)
        .filter(|f| !ECHO_PREFIXES.iter().any(|prefix| f.starts_with(prefix)))
        .collect();

    let summary = if narrative.is_empty() {
        templated_summary(records.len(), &persons)
    } else {
        narrative.join(" ")
    };

    let coordinates = records.iter().map(LocationRecord::coordinate).collect();
    let persons: Vec<PersonId> = persons.into_iter().collect();

    let (person, plural, person_colors) = match persons.len() {
        0 => (None, None, None),
        1 => (persons.into_iter().next(), None, None),
        _ => {
            let colors = assign_colors(&persons);
            (None, Some(persons), Some(colors))
        }
    };

    FinalAnswer {
        person,
        persons: plural,
        locations: records,
        summary,
        coordinates,
        person_colors,
    }
}

/// Fallback sentence used when the model produced no narrative.
pub fn templated_summary(location_count: usize, persons: &BTreeSet<PersonId>) -> String {
    if location_count == 0 {
        return NO_DATA_SUMMARY.to_string();
    }

    let noun = if location_count == 1 { "location" } else { "locations" };
    match persons.iter().next() {
        Some(person) if persons.len() == 1 => format!(
            "{} was tracked at {} {} during the requested time period.",
            person, location_count, noun
        ),
        _ => format!(
            "Found {} {} across {} people during the requested time period.",
            location_count,
            noun,
            persons.len()
        ),
    }
}

/// Cycle through the palette in sorted person order.
fn assign_colors(sorted_persons: &[PersonId]) -> BTreeMap<PersonId, String> {
    sorted_persons
        .iter()
        .enumerate()
        .map(|(i, person)| {
            (
                person.clone(),
                PERSON_COLORS[i % PERSON_COLORS.len()].to_string(),
            )
        })
        .collect()
}
