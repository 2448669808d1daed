mod test_support;

use serde_json::json;
use test_support::{
    error_code, request, request_ok, spawn_sidecar, student_columns, student_filters, students,
};

fn indexes(view: &serde_json::Value) -> Vec<i64> {
    view["rowIndexes"]
        .as_array()
        .expect("rowIndexes")
        .iter()
        .map(|v| v.as_i64().expect("index"))
        .collect()
}

#[test]
fn view_follows_search_filter_sort_and_page_events() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "views.open",
        json!({
            "columns": student_columns(),
            "filters": student_filters(),
            "records": students(25),
            "pageSize": 10,
            "rowKey": "id"
        }),
    );
    let view_id = opened["viewId"].as_str().expect("viewId").to_string();
    let view = &opened["view"];
    assert_eq!(view["totalFilteredCount"], json!(25));
    assert_eq!(view["totalPages"], json!(3));
    assert_eq!(view["currentPage"], json!(1));
    assert_eq!(view["pageWindow"], json!([1, 2, 3]));
    assert_eq!(view["rowKeys"][0], json!("s00"));
    assert_eq!(view["cells"][0], json!(["Student 00", "14", "active", "-"]));

    let page3 = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "views.setPage",
        json!({ "viewId": view_id, "page": 3 }),
    );
    assert_eq!(indexes(&page3["view"]), vec![20, 21, 22, 23, 24]);

    let filtered = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "views.setFilter",
        json!({ "viewId": view_id, "name": "status", "value": ["active", "pending"] }),
    );
    assert_eq!(filtered["view"]["totalFilteredCount"], json!(13));
    assert_eq!(filtered["view"]["currentPage"], json!(1));
    assert_eq!(filtered["view"]["activeFilterCount"], json!(1));

    let page2 = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "views.setPage",
        json!({ "viewId": view_id, "page": 2 }),
    );
    assert_eq!(page2["view"]["visibleRows"].as_array().map(|a| a.len()), Some(3));

    let searched = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "views.search",
        json!({ "viewId": view_id, "query": "STUDENT 1" }),
    );
    assert_eq!(searched["view"]["totalFilteredCount"], json!(5));
    assert_eq!(searched["view"]["currentPage"], json!(1));
    assert_eq!(indexes(&searched["view"]), vec![10, 12, 14, 16, 18]);

    let asc = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "views.toggleSort",
        json!({ "viewId": view_id, "column": "age" }),
    );
    assert_eq!(indexes(&asc["view"]), vec![10, 16, 12, 18, 14]);
    assert_eq!(asc["view"]["sort"], json!({ "column": "age", "direction": "asc" }));

    let desc = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "views.toggleSort",
        json!({ "viewId": view_id, "column": "age" }),
    );
    assert_eq!(indexes(&desc["view"]), vec![14, 18, 12, 16, 10]);

    let unchanged = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "views.toggleSort",
        json!({ "viewId": view_id, "column": "notes" }),
    );
    assert_eq!(
        unchanged["view"]["sort"],
        json!({ "column": "age", "direction": "desc" })
    );

    let cleared = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "views.clearFilters",
        json!({ "viewId": view_id }),
    );
    assert_eq!(cleared["view"]["activeFilterCount"], json!(0));
    assert_eq!(cleared["view"]["searchQuery"], json!(""));
    assert_eq!(cleared["view"]["totalFilteredCount"], json!(25));
    assert_eq!(cleared["view"]["filterState"]["status"], json!([]));
    assert_eq!(
        cleared["view"]["filterState"]["enrolled"],
        json!({ "from": "", "to": "" })
    );

    let closed = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "views.close",
        json!({ "viewId": view_id }),
    );
    assert_eq!(closed["closed"], json!(true));
    let gone = request(
        &mut stdin,
        &mut reader,
        "11",
        "views.get",
        json!({ "viewId": view_id }),
    );
    assert_eq!(error_code(&gone), Some("not_found"));
}

#[test]
fn page_requests_are_clamped_to_the_filtered_range() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "views.open",
        json!({
            "columns": student_columns(),
            "filters": student_filters(),
            "records": students(25),
            "pageSize": 5
        }),
    );
    let view_id = opened["viewId"].as_str().expect("viewId").to_string();

    let far = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "views.setPage",
        json!({ "viewId": view_id, "page": 99 }),
    );
    assert_eq!(far["view"]["currentPage"], json!(5));
    assert_eq!(far["view"]["pageWindow"], json!([1, 2, 3, 4, 5]));

    let low = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "views.setPage",
        json!({ "viewId": view_id, "page": -4 }),
    );
    assert_eq!(low["view"]["currentPage"], json!(1));

    let ranged = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "views.setFilters",
        json!({
            "viewId": view_id,
            "filterState": { "enrolled": { "from": "2024-01-05", "to": "2024-01-07" } }
        }),
    );
    assert_eq!(ranged["view"]["totalFilteredCount"], json!(3));
    assert_eq!(ranged["view"]["totalPages"], json!(1));
    assert_eq!(ranged["view"]["filterState"]["name"], json!(""));

    let resized = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "views.setPageSize",
        json!({ "viewId": view_id, "pageSize": 0 }),
    );
    assert_eq!(resized["view"]["pageSize"], json!(10));

    let bad = request(
        &mut stdin,
        &mut reader,
        "6",
        "views.setPage",
        json!({ "viewId": view_id, "page": "two" }),
    );
    assert_eq!(error_code(&bad), Some("bad_params"));
}

#[test]
fn malformed_filter_values_do_not_constrain() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "views.open",
        json!({
            "columns": student_columns(),
            "filters": student_filters(),
            "records": students(8)
        }),
    );
    let view_id = opened["viewId"].as_str().expect("viewId").to_string();

    let v = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "views.setFilter",
        json!({ "viewId": view_id, "name": "status", "value": "active" }),
    );
    assert_eq!(v["view"]["totalFilteredCount"], json!(8));
    assert_eq!(v["view"]["activeFilterCount"], json!(0));

    let v = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "views.setFilter",
        json!({ "viewId": view_id, "name": "enrolled", "value": { "from": "someday" } }),
    );
    assert_eq!(v["view"]["totalFilteredCount"], json!(8));
}

#[test]
fn non_string_query_is_rejected_and_search_is_kept() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "views.open",
        json!({ "columns": student_columns(), "records": students(12) }),
    );
    let view_id = opened["viewId"].as_str().expect("viewId").to_string();

    let v = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "views.search",
        json!({ "viewId": view_id, "query": "student 1" }),
    );
    let narrowed = v["view"]["totalFilteredCount"].clone();
    assert_ne!(narrowed, json!(12));

    let bad = request(
        &mut stdin,
        &mut reader,
        "3",
        "views.search",
        json!({ "viewId": view_id, "query": 5 }),
    );
    assert_eq!(error_code(&bad), Some("bad_params"));
    assert_eq!(bad["error"]["details"]["query"], json!(5));

    let v = request_ok(&mut stdin, &mut reader, "4", "views.get", json!({ "viewId": view_id }));
    assert_eq!(v["view"]["searchQuery"], json!("student 1"));
    assert_eq!(v["view"]["totalFilteredCount"], narrowed);

    let v = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "views.search",
        json!({ "viewId": view_id, "query": null }),
    );
    assert_eq!(v["view"]["totalFilteredCount"], json!(12));
}

#[test]
fn replacing_records_starts_the_view_over() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "views.open",
        json!({
            "columns": student_columns(),
            "filters": student_filters(),
            "records": students(25),
            "pageSize": 10
        }),
    );
    let view_id = opened["viewId"].as_str().expect("viewId").to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "views.search",
        json!({ "viewId": view_id, "query": "student 2" }),
    );

    let replaced = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "views.setRecords",
        json!({ "viewId": view_id, "records": students(4) }),
    );
    assert_eq!(replaced["view"]["totalFilteredCount"], json!(4));
    assert_eq!(replaced["view"]["searchQuery"], json!(""));
    assert_eq!(replaced["view"]["pageSize"], json!(10));

    let respec = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "views.setFilterSpecs",
        json!({
            "viewId": view_id,
            "filters": [{ "type": "select", "name": "status", "defaultValue": "active" }]
        }),
    );
    assert_eq!(respec["view"]["totalFilteredCount"], json!(1));
    assert_eq!(respec["view"]["activeFilterCount"], json!(1));

    let bad = request(
        &mut stdin,
        &mut reader,
        "5",
        "views.setRecords",
        json!({ "viewId": view_id, "records": [1, 2] }),
    );
    assert_eq!(error_code(&bad), Some("bad_params"));
}
