use crate::filters::{self, FilterSpec, FilterState, FilterValue};
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{
    optional_i64, optional_param, optional_str, parse_records, required_i64, required_param,
    required_str, resolve_records, view_mut, view_ref,
};
use crate::ipc::types::{AppState, Request};
use crate::paging::PaginationState;
use crate::records::{cell_text, field_text, Record};
use crate::sorting::SortState;
use crate::view::{compute, Action, ColumnSpec, Table, View, ViewModel, ViewState};
use serde_json::{json, Value};
use std::path::PathBuf;
use uuid::Uuid;

fn row_key(table: &Table, idx: usize) -> Value {
    table
        .row_key
        .as_deref()
        .and_then(|k| table.records.get(idx).and_then(|r| r.get(k)))
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| json!(idx))
}

fn project(table: &Table, idx: usize) -> Vec<String> {
    let Some(record) = table.records.get(idx) else {
        return Vec::new();
    };
    table.columns.iter().map(|c| cell_text(record, &c.key)).collect()
}

fn model_json(table: &Table, state: &ViewState, m: &ViewModel) -> Value {
    let rows: Vec<&Record> = m
        .visible
        .iter()
        .filter_map(|&i| table.records.get(i))
        .collect();
    let keys: Vec<Value> = m.visible.iter().map(|&i| row_key(table, i)).collect();
    let cells: Vec<Vec<String>> = m.visible.iter().map(|&i| project(table, i)).collect();
    json!({
        "visibleRows": rows,
        "rowIndexes": m.visible,
        "rowKeys": keys,
        "cells": cells,
        "totalFilteredCount": m.total_filtered_count,
        "totalPages": m.total_pages,
        "currentPage": m.current_page,
        "pageSize": m.page_size,
        "pageWindow": m.page_window,
        "activeFilterCount": m.active_filter_count,
        "searchQuery": state.search_query,
        "filterState": state.filter_state,
        "sort": state.sort,
    })
}

pub fn view_json(view: &View) -> Value {
    model_json(&view.table, &view.state, view.model())
}

fn handle_open(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    if state.views.len() >= state.config.max_views {
        return Err(HandlerErr::new(
            "too_many_views",
            "close a view before opening another",
        )
        .with_details(json!({ "maxViews": state.config.max_views })));
    }
    let columns: Vec<ColumnSpec> = required_param(req, "columns")?;
    let filter_specs: Vec<FilterSpec> = optional_param(req, "filters")?.unwrap_or_default();
    let records = resolve_records(state, req)?.unwrap_or_default();
    let page_size = optional_i64(req, "pageSize")?;

    let table = Table {
        records,
        columns,
        filters: filter_specs,
        row_key: optional_str(req, "rowKey"),
    };
    let view = View::new(table, page_size, state.config.page_size());
    let view_id = Uuid::new_v4().to_string();
    let body = view_json(&view);
    tracing::info!(
        view_id = %view_id,
        records = view.table.records.len(),
        "view opened"
    );
    state.views.insert(view_id.clone(), view);
    Ok(json!({ "viewId": view_id, "view": body }))
}

fn handle_get(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let view = view_ref(state, req)?;
    Ok(json!({ "view": view_json(view) }))
}

fn handle_close(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let view_id = required_str(req, "viewId")?;
    let closed = state.views.remove(&view_id).is_some();
    if closed {
        tracing::info!(view_id = %view_id, "view closed");
    }
    Ok(json!({ "closed": closed }))
}

fn handle_list(state: &mut AppState, _req: &Request) -> Result<Value, HandlerErr> {
    let mut views: Vec<Value> = state
        .views
        .iter()
        .map(|(id, v)| {
            json!({
                "viewId": id,
                "recordCount": v.table.records.len(),
                "totalFilteredCount": v.model().total_filtered_count,
                "columns": v.table.columns.iter().map(|c| c.key.as_str()).collect::<Vec<_>>(),
            })
        })
        .collect();
    views.sort_by(|a, b| a["viewId"].as_str().cmp(&b["viewId"].as_str()));
    Ok(json!({ "views": views }))
}

fn handle_set_records(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let records = resolve_records(state, req)?
        .ok_or_else(|| HandlerErr::new("bad_params", "missing records or dataset"))?;
    let view = view_mut(state, req)?;
    view.replace_records(records);
    Ok(json!({ "view": view_json(view) }))
}

fn handle_set_filter_specs(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let specs: Vec<FilterSpec> = required_param(req, "filters")?;
    let view = view_mut(state, req)?;
    view.replace_filter_specs(specs);
    Ok(json!({ "view": view_json(view) }))
}

/// Free text kept as typed; absent or null reads as empty.
fn optional_text(req: &Request, key: &str) -> Result<String, HandlerErr> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(v) => Err(HandlerErr::new("bad_params", format!("{} must be a string", key))
            .with_details(json!({ key: v }))),
    }
}

/// Reads an integer field of a nested params object.
fn nested_i64(parent: Option<&Value>, outer: &str, key: &str) -> Result<Option<i64>, HandlerErr> {
    match parent.and_then(|p| p.get(key)) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            HandlerErr::new("bad_params", format!("{}.{} must be an integer", outer, key))
                .with_details(json!({ key: v }))
        }),
    }
}

/// Actions that map one-to-one onto a front-end event.
fn parse_action(req: &Request) -> Result<Option<Action>, HandlerErr> {
    let action = match req.method.as_str() {
        "views.search" => Action::Search(optional_text(req, "query")?),
        "views.setFilter" => Action::SetFilter {
            name: required_str(req, "name")?,
            value: FilterValue::from_json(req.params.get("value").unwrap_or(&Value::Null)),
        },
        "views.setFilters" => {
            Action::ReplaceFilters(optional_param::<FilterState>(req, "filterState")?.unwrap_or_default())
        }
        "views.clearFilters" => Action::ClearFilters,
        "views.toggleSort" => Action::ToggleSort(required_str(req, "column")?),
        "views.setSort" => Action::SetSort(
            serde_json::from_value::<SortState>(req.params.clone()).map_err(|e| {
                HandlerErr::new("bad_params", format!("invalid sort: {}", e))
            })?,
        ),
        "views.setPage" => Action::SetPage(required_i64(req, "page")?),
        "views.setPageSize" => Action::SetPageSize(required_i64(req, "pageSize")?),
        _ => return Ok(None),
    };
    Ok(Some(action))
}

fn handle_action(
    state: &mut AppState,
    req: &Request,
    action: Action,
) -> Result<Value, HandlerErr> {
    let view = view_mut(state, req)?;
    view.dispatch(action);
    Ok(json!({ "view": view_json(view) }))
}

/// One-shot evaluation with every input supplied by the caller.
fn handle_compute(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let raw = req
        .params
        .get("records")
        .ok_or_else(|| HandlerErr::new("bad_params", "missing records"))?;
    let records = parse_records("records", raw)?;
    let columns: Vec<ColumnSpec> = optional_param(req, "columns")?.unwrap_or_default();
    let filter_specs: Vec<FilterSpec> = optional_param(req, "filters")?.unwrap_or_default();
    let incoming: FilterState = optional_param(req, "filterState")?.unwrap_or_default();
    let requested_sort: SortState = optional_param(req, "sortState")?.unwrap_or_default();

    let paging = req.params.get("paginationState");
    let page = nested_i64(paging, "paginationState", "currentPage")?.unwrap_or(1);
    let size = nested_i64(paging, "paginationState", "pageSize")?.unwrap_or(0);

    let table = Table {
        records,
        columns,
        filters: filter_specs,
        row_key: optional_str(req, "rowKey"),
    };
    let view_state = ViewState {
        search_query: optional_text(req, "searchQuery")?,
        filter_state: filters::replaced(&table.filters, &incoming),
        sort: SortState::default().validated(requested_sort, &table.columns),
        pagination: PaginationState::new(page, size, state.config.page_size()),
    };
    let model = compute(&table, &view_state);
    Ok(model_json(&table, &view_state, &model))
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Writes every matching row, not just the current page.
fn handle_export_csv(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let out_path = required_str(req, "outPath")?;
    let view = view_ref(state, req)?;
    let table = &view.table;

    let header = table
        .columns
        .iter()
        .map(|c| {
            if c.header.is_empty() {
                csv_quote(&c.key)
            } else {
                csv_quote(&c.header)
            }
        })
        .collect::<Vec<_>>()
        .join(",");
    let mut csv = header;
    csv.push('\n');

    let mut rows_exported = 0usize;
    for record in view
        .model()
        .ordered
        .iter()
        .filter_map(|&i| table.records.get(i))
    {
        let line = table
            .columns
            .iter()
            .map(|c| csv_quote(&field_text(record.get(&c.key)).unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(",");
        csv.push_str(&line);
        csv.push('\n');
        rows_exported += 1;
    }

    let out = PathBuf::from(&out_path);
    let io_err = |e: std::io::Error| {
        HandlerErr::new("export_failed", e.to_string()).with_details(json!({ "path": out_path }))
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(&out, csv).map_err(io_err)?;
    tracing::info!(path = %out_path, rows = rows_exported, "view exported");

    Ok(json!({ "rowsExported": rows_exported, "path": out_path }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "views.open" => handle_open(state, req),
        "views.get" => handle_get(state, req),
        "views.close" => handle_close(state, req),
        "views.list" => handle_list(state, req),
        "views.setRecords" => handle_set_records(state, req),
        "views.setFilterSpecs" => handle_set_filter_specs(state, req),
        "views.compute" => handle_compute(state, req),
        "views.exportCsv" => handle_export_csv(state, req),
        _ => match parse_action(req) {
            Ok(Some(action)) => handle_action(state, req, action),
            Ok(None) => return None,
            Err(e) => Err(e),
        },
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
