use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{optional_str, required_str, view_ref};
use crate::ipc::types::{AppState, Request};
use crate::records::parse_date;
use crate::schedule::place_week;
use chrono::Datelike;
use serde_json::{json, Value};

fn handle_week(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let date_field = required_str(req, "dateField")?;
    let start_field = optional_str(req, "startField");
    let week_raw = required_str(req, "weekOf")?;
    let bad_week = |message: &str| {
        HandlerErr::new("bad_params", message).with_details(json!({ "weekOf": week_raw }))
    };
    let week_of = parse_date(&week_raw).ok_or_else(|| bad_week("weekOf must be a date"))?;
    let view = view_ref(state, req)?;
    let records = &view.table.records;

    let grid = place_week(
        records,
        &view.model().ordered,
        &date_field,
        start_field.as_deref(),
        week_of,
    )
    .ok_or_else(|| bad_week("weekOf is too close to the ends of the calendar"))?;
    let days: Vec<Value> = grid
        .days
        .iter()
        .map(|d| {
            let rows: Vec<Value> = d
                .rows
                .iter()
                .filter_map(|&i| records.get(i).map(|r| json!({ "index": i, "record": r })))
                .collect();
            json!({
                "date": d.date.format("%Y-%m-%d").to_string(),
                "weekday": d.date.weekday().to_string(),
                "rows": rows,
            })
        })
        .collect();

    Ok(json!({
        "weekStart": grid.week_start.format("%Y-%m-%d").to_string(),
        "days": days,
        "outsideWeek": grid.outside_week,
        "undated": grid.undated,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "schedule.week" => handle_week(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
