use crate::db;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{db_conn, parse_records, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn db_failed(e: anyhow::Error) -> HandlerErr {
    HandlerErr::new("db_query_failed", format!("{e:#}"))
}

fn handle_import(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let name = required_str(req, "name")?;
    let raw = req
        .params
        .get("records")
        .ok_or_else(|| HandlerErr::new("bad_params", "missing records"))?;
    let records = parse_records("records", raw)?;

    let info = db::dataset_upsert(conn, &name, &records).map_err(db_failed)?;
    tracing::info!(dataset = %info.name, records = info.record_count, "dataset imported");
    Ok(json!({
        "datasetId": info.id,
        "name": info.name,
        "recordCount": info.record_count,
        "contentHash": info.content_hash,
    }))
}

fn handle_list(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let datasets = db::dataset_list(conn).map_err(db_failed)?;
    Ok(json!({ "datasets": datasets }))
}

fn handle_get(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let name = required_str(req, "name")?;
    let records = db::dataset_load(conn, &name)
        .map_err(db_failed)?
        .ok_or_else(|| {
            HandlerErr::new("not_found", "dataset not found").with_details(json!({ "name": name }))
        })?;
    Ok(json!({ "name": name, "records": records }))
}

fn handle_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let name = required_str(req, "name")?;
    let deleted = db::dataset_delete(conn, &name).map_err(db_failed)?;
    if deleted {
        tracing::info!(dataset = %name, "dataset deleted");
    }
    Ok(json!({ "deleted": deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "datasets.import" => handle_import(state, req),
        "datasets.list" => handle_list(state, req),
        "datasets.get" => handle_get(state, req),
        "datasets.delete" => handle_delete(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
