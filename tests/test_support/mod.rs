#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    spawn_sidecar_with(&[])
}

pub fn spawn_sidecar_with(args: &[&str]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .args(args)
        .env_remove("ROSTERD_WORKSPACE")
        .env_remove("ROSTERD_PAGE_SIZE")
        .env_remove("ROSTERD_MAX_VIEWS")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

pub fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

/// Students list as the front end sends it.
pub fn students(n: usize) -> serde_json::Value {
    let statuses = ["active", "inactive", "pending", "cancelled"];
    let rows: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            json!({
                "id": format!("s{:02}", i),
                "name": format!("Student {:02}", i),
                "age": 14 + (i % 5),
                "status": statuses[i % statuses.len()],
                "enrolled": format!("2024-01-{:02}", 1 + (i % 28)),
            })
        })
        .collect();
    json!(rows)
}

pub fn student_columns() -> serde_json::Value {
    json!([
        { "key": "name", "header": "Name" },
        { "key": "age", "header": "Age" },
        { "key": "status", "header": "Status" },
        { "key": "notes", "header": "Notes", "sortable": false }
    ])
}

pub fn student_filters() -> serde_json::Value {
    json!([
        { "type": "text", "name": "name", "label": "Name" },
        {
            "type": "multiselect",
            "name": "status",
            "label": "Status",
            "options": [
                { "value": "active", "label": "Active" },
                { "value": "inactive", "label": "Inactive" },
                { "value": "pending", "label": "Pending" },
                { "value": "cancelled", "label": "Cancelled" }
            ]
        },
        { "type": "daterange", "name": "enrolled", "label": "Enrolled" }
    ])
}
