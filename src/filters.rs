use crate::records::{field_date, field_text, parse_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Text,
    Select,
    Multiselect,
    Date,
    Daterange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

/// Current value of one filter control.
///
/// Anything that is not a string, a list of strings or a `{from, to}` object
/// is kept as `Other` and never constrains the result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Set(Vec<String>),
    Range(DateRange),
    Other(Value),
}

impl FilterValue {
    pub fn from_json(raw: &Value) -> FilterValue {
        serde_json::from_value(raw.clone()).unwrap_or_else(|_| FilterValue::Other(raw.clone()))
    }
}

/// Filter name -> current value. Names double as the record field they test.
pub type FilterState = BTreeMap<String, FilterValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(rename = "type")]
    pub kind: FilterKind,
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FilterValue>,
}

impl FilterSpec {
    pub fn empty_value(&self) -> FilterValue {
        match self.kind {
            FilterKind::Text | FilterKind::Select | FilterKind::Date => {
                FilterValue::Text(String::new())
            }
            FilterKind::Multiselect => FilterValue::Set(Vec::new()),
            FilterKind::Daterange => FilterValue::Range(DateRange::default()),
        }
    }

    /// Value used at view start and after "clear all".
    pub fn initial_value(&self) -> FilterValue {
        self.default_value
            .clone()
            .unwrap_or_else(|| self.empty_value())
    }

    /// The predicate this filter applies for `value`, or `None` when the value
    /// is empty or has the wrong shape for the filter type.
    pub fn constraint<'a>(&self, value: &'a FilterValue) -> Option<Constraint<'a>> {
        match (self.kind, value) {
            (FilterKind::Text, FilterValue::Text(s)) if !s.is_empty() => {
                Some(Constraint::Contains(s.to_lowercase()))
            }
            (FilterKind::Select, FilterValue::Text(s)) if !s.is_empty() => {
                Some(Constraint::Equals(s))
            }
            (FilterKind::Multiselect, FilterValue::Set(items)) if !items.is_empty() => {
                Some(Constraint::OneOf(items))
            }
            (FilterKind::Date, FilterValue::Text(s)) => parse_date(s).map(Constraint::OnDate),
            (FilterKind::Daterange, FilterValue::Range(r)) => {
                let from = parse_date(&r.from);
                let to = parse_date(&r.to);
                if from.is_none() && to.is_none() {
                    None
                } else {
                    Some(Constraint::Between(from, to))
                }
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint<'a> {
    /// Lowercased needle.
    Contains(String),
    Equals(&'a str),
    OneOf(&'a [String]),
    OnDate(NaiveDate),
    Between(Option<NaiveDate>, Option<NaiveDate>),
}

impl Constraint<'_> {
    /// Missing and null fields never satisfy a constraint.
    pub fn matches(&self, field: Option<&Value>) -> bool {
        match self {
            Constraint::Contains(needle) => field_text(field)
                .map(|t| t.to_lowercase().contains(needle.as_str()))
                .unwrap_or(false),
            Constraint::Equals(expected) => {
                field_text(field).map(|t| t == *expected).unwrap_or(false)
            }
            Constraint::OneOf(items) => field_text(field)
                .map(|t| items.iter().any(|i| *i == t))
                .unwrap_or(false),
            Constraint::OnDate(day) => field_date(field) == Some(*day),
            Constraint::Between(from, to) => match field_date(field) {
                Some(d) => from.map_or(true, |f| d >= f) && to.map_or(true, |t| d <= t),
                None => false,
            },
        }
    }
}

pub fn initial_state(specs: &[FilterSpec]) -> FilterState {
    specs
        .iter()
        .map(|s| (s.name.clone(), s.initial_value()))
        .collect()
}

/// New state with one filter changed. Names without a spec are ignored.
pub fn with_value(
    specs: &[FilterSpec],
    state: &FilterState,
    name: &str,
    value: FilterValue,
) -> FilterState {
    let mut next = state.clone();
    if specs.iter().any(|s| s.name == name) {
        next.insert(name.to_string(), value);
    }
    next
}

/// New state from a caller-supplied map. Declared filters the map leaves out
/// fall back to their initial value; undeclared names are dropped.
pub fn replaced(specs: &[FilterSpec], incoming: &FilterState) -> FilterState {
    specs
        .iter()
        .map(|s| {
            let v = incoming
                .get(&s.name)
                .cloned()
                .unwrap_or_else(|| s.initial_value());
            (s.name.clone(), v)
        })
        .collect()
}

/// Constraints in force, keyed by the field they test.
pub fn active_constraints<'a>(
    specs: &'a [FilterSpec],
    state: &'a FilterState,
) -> Vec<(&'a str, Constraint<'a>)> {
    specs
        .iter()
        .filter_map(|s| {
            let value = state.get(&s.name)?;
            s.constraint(value).map(|c| (s.name.as_str(), c))
        })
        .collect()
}

/// Number of filters currently narrowing the result set.
pub fn active_filter_count(specs: &[FilterSpec], state: &FilterState) -> usize {
    active_constraints(specs, state).len()
}
