#![allow(dead_code)]

//! In-process stand-in for the node's `/json` API, served by axum on an
//! ephemeral port.

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use nodepanel_proto::transport::HttpTransport;

/// Canned per-port answer: body, delay before answering, or a failure.
#[derive(Debug, Clone)]
pub struct PortReply {
    pub body: Value,
    pub delay: Duration,
    pub fail: bool,
}

impl PortReply {
    pub fn ok(body: Value, delay_ms: u64) -> Self {
        Self {
            body,
            delay: Duration::from_millis(delay_ms),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            body: Value::Null,
            delay: Duration::ZERO,
            fail: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct NodeState {
    pub dmx_ports: Vec<Value>,
    pub dmx_status: HashMap<String, PortReply>,
    pub rdm_ports: Vec<Value>,
    pub rdm_tod: HashMap<String, PortReply>,
    pub fail_port_lists: bool,

    pub show: Option<u8>,
    pub status: String,
    pub looping: bool,
    pub shows: Vec<u8>,
    /// Accept actions but leave the player untouched.
    pub ignore_commands: bool,

    pub uptime_enabled: bool,
    /// `None` serves 400, as on boards without a display.
    pub display_on: Option<bool>,
    /// `.txt` blocks by file name, served wrapped in `{"<name>": …}`.
    pub config_files: HashMap<String, Value>,
    pub actions: Vec<Value>,
    pub deletes: Vec<Value>,
}

pub type Shared = Arc<Mutex<NodeState>>;

pub struct MockNode {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl MockNode {
    pub async fn start(state: NodeState) -> Self {
        let state: Shared = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route("/json/dmx/portstatus", get(dmx_ports))
            .route("/json/dmx/status", get(dmx_status))
            .route("/json/rdm/portstatus", get(rdm_ports))
            .route("/json/rdm/tod", get(rdm_tod))
            .route("/json/showfile/status", get(show_status))
            .route("/json/showfile/directory", get(show_directory))
            .route("/json/list", get(list))
            .route("/json/version", get(version))
            .route("/json/uptime", get(uptime))
            .route("/json/display", get(display))
            .route("/json/directory", get(config_directory))
            .route("/json/:file", get(config_file))
            .route("/json/action", axum::routing::post(action).delete(delete_show))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock node");
        let addr = listener.local_addr().expect("mock node addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, state }
    }

    pub fn transport(&self) -> HttpTransport {
        HttpTransport::new("127.0.0.1", self.addr.port()).expect("transport")
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut NodeState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }
}

pub fn player(show: Option<u8>, status: &str) -> NodeState {
    NodeState {
        show,
        status: status.to_string(),
        shows: vec![0, 1, 5, 12],
        uptime_enabled: true,
        display_on: Some(true),
        ..NodeState::default()
    }
}

pub fn port(letter: &str, direction: &str) -> Value {
    json!({"port": letter, "direction": direction})
}

pub fn dmx_body(sent: u64) -> Value {
    json!({"sent": {"packets": sent, "slots": 512}, "received": {"packets": 0, "slots": 0}})
}

async fn port_list(state: &Shared, rdm: bool) -> Response {
    let st = state.lock().unwrap();
    if st.fail_port_lists {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let ports = if rdm { st.rdm_ports.clone() } else { st.dmx_ports.clone() };
    Json(Value::Array(ports)).into_response()
}

async fn port_reply(state: &Shared, query: Option<String>, rdm: bool) -> Response {
    let key = query.unwrap_or_default();
    let reply = {
        let st = state.lock().unwrap();
        let table = if rdm { &st.rdm_tod } else { &st.dmx_status };
        table.get(&key).cloned()
    };
    let Some(reply) = reply else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    tokio::time::sleep(reply.delay).await;
    if reply.fail {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let mut body = reply.body;
    body["port"] = Value::String(key);
    Json(body).into_response()
}

async fn dmx_ports(State(state): State<Shared>) -> Response {
    port_list(&state, false).await
}

async fn dmx_status(State(state): State<Shared>, RawQuery(q): RawQuery) -> Response {
    port_reply(&state, q, false).await
}

async fn rdm_ports(State(state): State<Shared>) -> Response {
    port_list(&state, true).await
}

async fn rdm_tod(State(state): State<Shared>, RawQuery(q): RawQuery) -> Response {
    port_reply(&state, q, true).await
}

async fn show_status(State(state): State<Shared>) -> Json<Value> {
    let st = state.lock().unwrap();
    let show = st
        .show
        .map(|s| format!("{:02}", s))
        .unwrap_or_else(|| "none".to_string());
    Json(json!({"show": show, "status": st.status, "loop": if st.looping { "1" } else { "0" }}))
}

async fn show_directory(State(state): State<Shared>) -> Json<Value> {
    let st = state.lock().unwrap();
    let shows: Vec<String> = st.shows.iter().map(|s| format!("{:02}", s)).collect();
    Json(json!({ "shows": shows }))
}

async fn list() -> Json<Value> {
    Json(json!({"list": {"ip": "127.0.0.1", "name": "mock", "node": "Art-Net 4", "output": "DMX"}}))
}

async fn version() -> Json<Value> {
    Json(json!({"version": "2.1", "board": "Orange Pi One", "build": {"date": "Mar  3 2024", "time": "10:00:00"}}))
}

async fn display(State(state): State<Shared>) -> Response {
    match state.lock().unwrap().display_on {
        Some(on) => Json(json!({"active": if on { "Yes" } else { "No" }})).into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn config_directory(State(state): State<Shared>) -> Json<Value> {
    let st = state.lock().unwrap();
    let files: serde_json::Map<String, Value> = st
        .config_files
        .keys()
        .map(|name| (name.clone(), Value::String(name.trim_end_matches(".txt").to_string())))
        .collect();
    Json(json!({ "files": files }))
}

async fn config_file(State(state): State<Shared>, Path(file): Path<String>) -> Response {
    if !file.ends_with(".txt") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match state.lock().unwrap().config_files.get(&file) {
        Some(body) => {
            let mut wrapped = serde_json::Map::new();
            wrapped.insert(file.clone(), body.clone());
            Json(Value::Object(wrapped)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn uptime(State(state): State<Shared>) -> Response {
    if !state.lock().unwrap().uptime_enabled {
        return StatusCode::BAD_REQUEST.into_response();
    }
    Json(json!({"uptime": 90_061})).into_response()
}

/// Applies player actions the way the firmware does, including refusing
/// transitions that make no sense from the current state.
async fn action(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    let mut st = state.lock().unwrap();
    st.actions.push(body.clone());
    if st.ignore_commands {
        return StatusCode::OK;
    }
    if let Some(show) = body.get("show").and_then(Value::as_u64) {
        st.show = Some(show as u8);
        return StatusCode::OK;
    }
    if let Some(cmd) = body.get("status").and_then(Value::as_str) {
        match cmd {
            "start" if st.show.is_some() => st.status = "Playing".into(),
            "stop" if st.status == "Playing" || st.status == "Paused" => {
                st.status = "Stopped".into()
            }
            "resume" if st.status == "Paused" => st.status = "Playing".into(),
            _ => {}
        }
        return StatusCode::OK;
    }
    if let Some(flag) = body.get("loop").and_then(Value::as_u64) {
        st.looping = flag != 0;
        return StatusCode::OK;
    }
    if ["identify", "display", "rdm", "reboot"]
        .iter()
        .any(|k| body.get(*k).is_some())
    {
        return StatusCode::OK;
    }
    StatusCode::BAD_REQUEST
}

async fn delete_show(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    let mut st = state.lock().unwrap();
    st.deletes.push(body.clone());
    let Some(show) = body.get("show").and_then(Value::as_u64) else {
        return StatusCode::BAD_REQUEST;
    };
    st.shows.retain(|s| u64::from(*s) != show);
    if st.show.map(u64::from) == Some(show) {
        st.show = None;
        st.status = "Stopped".into();
    }
    StatusCode::OK
}
