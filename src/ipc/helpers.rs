use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::db;
use crate::ipc::error::HandlerErr;
use crate::ipc::types::{AppState, Request};
use crate::records::Record;
use crate::view::View;

pub fn required_str(req: &Request, key: &str) -> Result<String, HandlerErr> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn required_i64(req: &Request, key: &str) -> Result<i64, HandlerErr> {
    optional_i64(req, key)?
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn optional_i64(req: &Request, key: &str) -> Result<Option<i64>, HandlerErr> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            HandlerErr::new("bad_params", format!("{} must be an integer", key))
                .with_details(json!({ key: v }))
        }),
    }
}

/// Typed view of `params[key]`; absent or null is `None`.
pub fn optional_param<T: DeserializeOwned>(
    req: &Request,
    key: &str,
) -> Result<Option<T>, HandlerErr> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| HandlerErr::new("bad_params", format!("invalid {}: {}", key, e))),
    }
}

pub fn required_param<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, HandlerErr> {
    optional_param(req, key)?
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn db_conn<'a>(state: &'a AppState) -> Result<&'a Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

/// Every element must be a JSON object.
pub fn parse_records(key: &str, raw: &Value) -> Result<Vec<Record>, HandlerErr> {
    let Some(items) = raw.as_array() else {
        return Err(HandlerErr::new(
            "bad_params",
            format!("{} must be an array of objects", key),
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_object().cloned().ok_or_else(|| {
                HandlerErr::new("bad_params", format!("{}[{}] must be an object", key, i))
                    .with_details(json!({ "index": i }))
            })
        })
        .collect()
}

/// Records from inline `records` or from the workspace dataset named by
/// `dataset`. `None` when the request carries neither.
pub fn resolve_records(
    state: &AppState,
    req: &Request,
) -> Result<Option<Vec<Record>>, HandlerErr> {
    if let Some(raw) = req.params.get("records").filter(|v| !v.is_null()) {
        return parse_records("records", raw).map(Some);
    }
    let Some(name) = optional_str(req, "dataset") else {
        return Ok(None);
    };
    let conn = db_conn(state)?;
    let records = db::dataset_load(conn, &name)
        .map_err(|e| HandlerErr::new("db_query_failed", format!("{e:#}")))?
        .ok_or_else(|| {
            HandlerErr::new("not_found", "dataset not found")
                .with_details(json!({ "dataset": name }))
        })?;
    Ok(Some(records))
}

pub fn view_mut<'a>(state: &'a mut AppState, req: &Request) -> Result<&'a mut View, HandlerErr> {
    let view_id = required_str(req, "viewId")?;
    state.views.get_mut(&view_id).ok_or_else(|| {
        HandlerErr::new("not_found", "view not found").with_details(json!({ "viewId": view_id }))
    })
}

pub fn view_ref<'a>(state: &'a AppState, req: &Request) -> Result<&'a View, HandlerErr> {
    let view_id = required_str(req, "viewId")?;
    state.views.get(&view_id).ok_or_else(|| {
        HandlerErr::new("not_found", "view not found").with_details(json!({ "viewId": view_id }))
    })
}
