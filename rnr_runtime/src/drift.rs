//! Drift detection between two traces.
//!
//! Used to verify record → replay → re-record round trips: two traces of
//! the same session must agree entry by entry once both are rebased on
//! their first entry.

use std::collections::BTreeSet;

use serde::Serialize;

use rnr_trace::domain::{IndexKey, TraceBody, TraceEntry, XrTime};

use crate::replay::rebuild_final_index;

/// Structured comparison of trace `a` against trace `b`.
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub entries_a: usize,
    pub entries_b: usize,
    /// Position of the first entry that differs in relative time, key or
    /// payload. `None` when one trace is a prefix of the other.
    pub first_divergence: Option<usize>,
    pub keys_only_in_a: Vec<IndexKey>,
    pub keys_only_in_b: Vec<IndexKey>,
    /// Keys present in both whose final payloads differ.
    pub final_payload_drift: Vec<PayloadDrift>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayloadDrift {
    pub key: IndexKey,
    pub time_a: XrTime,
    pub time_b: XrTime,
    pub body_a: TraceBody,
    pub body_b: TraceBody,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.entries_a == self.entries_b
            && self.first_divergence.is_none()
            && self.keys_only_in_a.is_empty()
            && self.keys_only_in_b.is_empty()
            && self.final_payload_drift.is_empty()
    }
}

pub fn compare_traces(a: &[TraceEntry], b: &[TraceEntry]) -> DriftReport {
    let origin_a = a.first().map_or(0, |e| e.time);
    let origin_b = b.first().map_or(0, |e| e.time);

    let first_divergence = a.iter().zip(b).position(|(ea, eb)| {
        ea.time.saturating_sub(origin_a) != eb.time.saturating_sub(origin_b)
            || ea.key != eb.key
            || ea.body != eb.body
    });

    let index_a = rebuild_final_index(a);
    let index_b = rebuild_final_index(b);
    let keys_a: BTreeSet<&IndexKey> = index_a.iter().map(|(k, _)| k).collect();
    let keys_b: BTreeSet<&IndexKey> = index_b.iter().map(|(k, _)| k).collect();

    let keys_only_in_a = keys_a.difference(&keys_b).map(|k| (*k).clone()).collect();
    let keys_only_in_b = keys_b.difference(&keys_a).map(|k| (*k).clone()).collect();

    let mut final_payload_drift = Vec::new();
    for key in keys_a.intersection(&keys_b) {
        let (Some(ea), Some(eb)) = (index_a.get(key), index_b.get(key)) else {
            continue;
        };
        if ea.body != eb.body {
            final_payload_drift.push(PayloadDrift {
                key: (*key).clone(),
                time_a: ea.time.saturating_sub(origin_a),
                time_b: eb.time.saturating_sub(origin_b),
                body_a: ea.body.clone(),
                body_b: eb.body.clone(),
            });
        }
    }

    DriftReport {
        entries_a: a.len(),
        entries_b: b.len(),
        first_divergence,
        keys_only_in_a,
        keys_only_in_b,
        final_payload_drift,
    }
}
