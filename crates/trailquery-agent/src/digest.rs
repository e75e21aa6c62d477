// ABOUTME: Compact text digest of aggregated location records for the fallback narration call.
// ABOUTME: Groups records by person, sorts by timestamp, and samples start/middle/end of long tracks.

use std::fmt::Write;

use trailquery_core::LocationRecord;

use crate::policy::NarrativePolicy;

/// Render `records` as a digest the model can narrate.
///
/// Persons appear in the order they were first seen. Each person's records
/// are sorted by timestamp; tracks longer than the policy threshold are
/// sampled at their start, middle, and end.
pub fn build_digest(records: &[LocationRecord], policy: &NarrativePolicy) -> String {
    let mut groups: Vec<(&str, Vec<&LocationRecord>)> = Vec::new();
    for record in records {
        let person = record.person.as_ref().map_or("unknown", |p| p.as_str());
        match groups.iter_mut().find(|(name, _)| *name == person) {
            Some((_, group)) => group.push(record),
            None => groups.push((person, vec![record])),
        }
    }

    let mut digest = String::from("Location data retrieved:\n\n");

    for (person, mut group) in groups {
        group.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        let _ = writeln!(digest, "{} ({} locations):", person, group.len());

        for record in sample(&group, policy) {
            let time = record.timestamp.replace('T', " ").replace('Z', "");
            let _ = writeln!(
                digest,
                "  {}: {:.6}, {:.6}",
                time, record.latitude, record.longitude
            );
        }
        digest.push('\n');
    }

    digest
}

/// First, middle, and last `digest_sample_edge` records of a long track.
fn sample<'a>(sorted: &[&'a LocationRecord], policy: &NarrativePolicy) -> Vec<&'a LocationRecord> {
    let n = sorted.len();
    let edge = policy.digest_sample_edge;
    if n <= policy.digest_sample_threshold || n <= edge * 3 {
        return sorted.to_vec();
    }

    let mid_start = (n / 2).saturating_sub(edge.saturating_sub(1) / 2);
    let mut picked = Vec::with_capacity(edge * 3);
    picked.extend_from_slice(&sorted[..edge]);
    picked.extend_from_slice(&sorted[mid_start..mid_start + edge]);
    picked.extend_from_slice(&sorted[n - edge..]);
    picked
}
