use crate::records::{field_datetime, field_text, parse_datetime, Record};
use crate::view::ColumnSpec;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// `column: None` keeps insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortState {
    /// Header click. Unknown and non-sortable columns leave the state as is.
    pub fn toggled(&self, column: &str, columns: &[ColumnSpec]) -> SortState {
        if !is_sortable(column, columns) {
            return self.clone();
        }
        if self.column.as_deref() == Some(column) {
            return SortState {
                column: self.column.clone(),
                direction: self.direction.flipped(),
            };
        }
        SortState {
            column: Some(column.to_string()),
            direction: SortDirection::Asc,
        }
    }

    /// Explicit sort request; falls back to the current state when the column
    /// cannot be sorted.
    pub fn validated(&self, requested: SortState, columns: &[ColumnSpec]) -> SortState {
        match requested.column.as_deref() {
            None => requested,
            Some(c) if is_sortable(c, columns) => requested,
            Some(_) => self.clone(),
        }
    }
}

fn is_sortable(column: &str, columns: &[ColumnSpec]) -> bool {
    columns.iter().any(|c| c.key == column && c.sortable)
}

/// How one column's values compare. Picked once per sort from the values
/// present, so every sort runs under a single total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnMode {
    Numeric,
    Chronological,
    Boolean,
    Textual,
}

fn column_mode<'a>(values: impl Iterator<Item = &'a Value>) -> ColumnMode {
    let mut mode: Option<ColumnMode> = None;
    for v in values {
        let this = match v {
            Value::Null => continue,
            Value::String(s) if s.trim().is_empty() => continue,
            Value::Number(_) => ColumnMode::Numeric,
            Value::Bool(_) => ColumnMode::Boolean,
            Value::String(s) if parse_datetime(s).is_some() => ColumnMode::Chronological,
            _ => return ColumnMode::Textual,
        };
        match mode {
            None => mode = Some(this),
            Some(m) if m == this => {}
            Some(_) => return ColumnMode::Textual,
        }
    }
    mode.unwrap_or(ColumnMode::Textual)
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Absent,
    Number(f64),
    When(NaiveDateTime),
    Flag(bool),
    Text(String),
}

impl SortKey {
    fn build(mode: ColumnMode, value: Option<&Value>) -> SortKey {
        // Blank strings sit with missing values in typed columns.
        let value = value.filter(|v| v.as_str().map_or(true, |s| !s.trim().is_empty()));
        let key = match mode {
            ColumnMode::Numeric => value.and_then(|v| v.as_f64()).map(SortKey::Number),
            ColumnMode::Chronological => field_datetime(value).map(SortKey::When),
            ColumnMode::Boolean => value.and_then(|v| v.as_bool()).map(SortKey::Flag),
            ColumnMode::Textual => {
                return SortKey::Text(field_text(value).unwrap_or_default());
            }
        };
        key.unwrap_or(SortKey::Absent)
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Absent => 0,
            SortKey::Number(_) => 1,
            SortKey::When(_) => 2,
            SortKey::Flag(_) => 3,
            SortKey::Text(_) => 4,
        }
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::When(a), SortKey::When(b)) => a.cmp(b),
            (SortKey::Flag(a), SortKey::Flag(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Reorders `indices` by the sort column. Ties keep their input order in
/// both directions.
pub fn sort_indices(records: &[Record], indices: &[usize], sort: &SortState) -> Vec<usize> {
    let Some(column) = sort.column.as_deref() else {
        return indices.to_vec();
    };
    let field = |i: usize| records.get(i).and_then(|r| r.get(column));
    let mode = column_mode(indices.iter().filter_map(|&i| field(i)));

    let mut keyed: Vec<(SortKey, usize)> = indices
        .iter()
        .map(|&i| (SortKey::build(mode, field(i)), i))
        .collect();
    keyed.sort_by(|a, b| {
        let ord = a.0.compare(&b.0);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    keyed.into_iter().map(|(_, i)| i).collect()
}
