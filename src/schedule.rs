use crate::records::{field_datetime, field_text, parse_time, Record};
use chrono::{Datelike, Days, NaiveDate, NaiveTime};

#[derive(Debug, Clone, PartialEq)]
pub struct WeekDay {
    pub date: NaiveDate,
    /// Record indexes, earliest start first.
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekGrid {
    pub week_start: NaiveDate,
    pub days: Vec<WeekDay>,
    pub outside_week: usize,
    pub undated: usize,
}

/// Monday on or before `day`, if the calendar reaches back that far.
pub fn week_start(day: NaiveDate) -> Option<NaiveDate> {
    day.checked_sub_days(Days::new(u64::from(day.weekday().num_days_from_monday())))
}

/// Buckets the ordered rows into the Monday-based week containing `week_of`.
///
/// With no `start_field`, the time part of the date field orders a day.
/// Rows without a start time go last; equal starts keep `ordered` order.
/// `None` when the week runs past the ends of the calendar.
pub fn place_week(
    records: &[Record],
    ordered: &[usize],
    date_field: &str,
    start_field: Option<&str>,
    week_of: NaiveDate,
) -> Option<WeekGrid> {
    let start = week_start(week_of)?;
    let dates = (0..7u64)
        .map(|offset| start.checked_add_days(Days::new(offset)))
        .collect::<Option<Vec<_>>>()?;
    let mut buckets: Vec<Vec<(Option<NaiveTime>, usize)>> = vec![Vec::new(); 7];
    let mut outside_week = 0;
    let mut undated = 0;

    for &i in ordered {
        let Some(record) = records.get(i) else {
            continue;
        };
        let Some(when) = field_datetime(record.get(date_field)) else {
            undated += 1;
            continue;
        };
        let offset = (when.date() - start).num_days();
        if !(0..7).contains(&offset) {
            outside_week += 1;
            continue;
        }
        let starts_at = match start_field {
            Some(f) => field_text(record.get(f)).and_then(|t| parse_time(&t)),
            None => Some(when.time()),
        };
        buckets[offset as usize].push((starts_at, i));
    }

    let days = buckets
        .into_iter()
        .zip(dates)
        .map(|(mut rows, date)| {
            rows.sort_by_key(|(t, _)| (t.is_none(), *t));
            WeekDay {
                date,
                rows: rows.into_iter().map(|(_, i)| i).collect(),
            }
        })
        .collect();

    Some(WeekGrid {
        week_start: start,
        days,
        outside_week,
        undated,
    })
}
