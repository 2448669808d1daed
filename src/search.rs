use crate::filters::{active_constraints, Constraint, FilterSpec, FilterState};
use crate::records::{field_text, Record};

/// Free-text query plus every filter constraint currently in force.
pub struct Predicate<'a> {
    needle: Option<String>,
    constraints: Vec<(&'a str, Constraint<'a>)>,
}

impl<'a> Predicate<'a> {
    pub fn new(query: &str, specs: &'a [FilterSpec], state: &'a FilterState) -> Self {
        let needle = if query.trim().is_empty() {
            None
        } else {
            Some(query.to_lowercase())
        };
        Predicate {
            needle,
            constraints: active_constraints(specs, state),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(needle) = &self.needle {
            if !matches_search(record, needle) {
                return false;
            }
        }
        self.constraints
            .iter()
            .all(|(field, c)| c.matches(record.get(*field)))
    }
}

/// Any field of the record, visible or not, contains the lowercased needle.
pub fn matches_search(record: &Record, needle: &str) -> bool {
    record
        .values()
        .filter_map(|v| field_text(Some(v)))
        .any(|t| t.to_lowercase().contains(needle))
}

/// Indexes of matching records, in input order.
pub fn filter_indices(
    records: &[Record],
    query: &str,
    specs: &[FilterSpec],
    state: &FilterState,
) -> Vec<usize> {
    let predicate = Predicate::new(query, specs, state);
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| predicate.matches(r))
        .map(|(i, _)| i)
        .collect()
}
