use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use axum_extra::{headers, TypedHeader};
use futures::{sink::SinkExt, stream::StreamExt};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use anno_core::annotation::{AnnotationId, StrokeInput};
use anno_core::AnnotationDocument;
use serde::Deserialize;
use serde_json::json;

/// Format an engine error as a JSON message for the frontend
fn format_error(code: &str, message: &str, severity: &str) -> String {
    format!(
        "ERROR_UPDATE:{}",
        json!({
            "code": code,
            "message": message,
            "severity": severity
        })
    )
}

// Application State
struct AppState {
    document: Arc<RwLock<AnnotationDocument>>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let shared_state = Arc::new(AppState {
        document: Arc::new(RwLock::new(AnnotationDocument::new())),
    });

    // build our application with a route
    let app = Router::new()
        .route("/", get(root))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn root() -> &'static str {
    "Hello from the annotation engine backend!"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    user_agent: Option<TypedHeader<headers::UserAgent>>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let agent = user_agent.map_or("unknown".to_string(), |TypedHeader(ua)| ua.to_string());
    let session = uuid::Uuid::new_v4();
    info!("Session {} connecting ({})", session, agent);
    ws.on_upgrade(move |socket| handle_socket(socket, state, session))
}

/// `PARTITION_UPDATE:{...}`: the resolved label regions plus markers.
fn partition_frame(doc: &AnnotationDocument) -> String {
    let json = serde_json::to_string(&doc.partition_view()).unwrap_or("{}".to_string());
    format!("PARTITION_UPDATE:{}", json)
}

/// `RENDER_UPDATE:{...}`: triangulated meshes per label.
fn render_frame(doc: &AnnotationDocument) -> String {
    let json = match doc.partition_meshes() {
        Ok(meshes) => serde_json::to_string(&meshes).unwrap_or("{}".to_string()),
        Err(e) => {
            warn!("Mesh generation failed: {}", e);
            "{}".to_string()
        }
    };
    format!("RENDER_UPDATE:{}", json)
}

/// `SELECTION_UPDATE:[...]`: the currently selected record ids.
fn selection_frame(doc: &AnnotationDocument) -> String {
    let json = serde_json::to_string(&doc.selection().selected).unwrap_or("[]".to_string());
    format!("SELECTION_UPDATE:{}", json)
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, session: uuid::Uuid) {
    info!("Session {} connected", session);
    let (mut sender, mut receiver) = socket.split();

    // Send the current partition so a reconnecting client can redraw.
    {
        let frame = {
            let doc = state.document.read().unwrap();
            partition_frame(&doc)
        };
        if sender.send(Message::Text(frame)).await.is_err() {
            return;
        }
    }

    while let Some(msg) = receiver.next().await {
        let msg = if let Ok(msg) = msg {
            msg
        } else {
            return;
        };

        let Message::Text(text) = msg else {
            continue;
        };
        info!("Session {} received: {}", session, text);

        // Frames to push after the lock is released.
        let mut frames: Vec<String> = Vec::new();

        if text.starts_with("ADD_STROKE:") {
            let json_str = text.trim_start_matches("ADD_STROKE:");
            match serde_json::from_str::<StrokeInput>(json_str) {
                Ok(input) => {
                    let result = {
                        let mut doc = state.document.write().unwrap();
                        let result = doc.add_stroke(input);
                        if result.is_ok() {
                            frames.push(partition_frame(&doc));
                            frames.push(render_frame(&doc));
                        }
                        result
                    }; // Lock dropped here!
                    match result {
                        Ok(id) => info!("Stroke {} committed", id),
                        Err(e) => {
                            warn!("Stroke rejected: {}", e);
                            frames.push(format_error("INVALID_GEOMETRY", &e.to_string(), "warning"));
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to parse ADD_STROKE payload: {}", e);
                    frames.push(format_error("BAD_COMMAND", &e.to_string(), "warning"));
                }
            }
        } else if text.starts_with("ADD_BOX:") {
            #[derive(Deserialize)]
            struct BoxCmd {
                label: String,
                corners: [[f64; 2]; 4],
            }
            let json_str = text.trim_start_matches("ADD_BOX:");
            match serde_json::from_str::<BoxCmd>(json_str) {
                Ok(cmd) => {
                    let result = {
                        let mut doc = state.document.write().unwrap();
                        let result = doc.add_box(cmd.label, cmd.corners);
                        if result.is_ok() {
                            frames.push(partition_frame(&doc));
                        }
                        result
                    };
                    if let Err(e) = result {
                        warn!("Box rejected: {}", e);
                        frames.push(format_error("INVALID_GEOMETRY", &e.to_string(), "warning"));
                    }
                }
                Err(e) => {
                    warn!("Failed to parse ADD_BOX payload: {}", e);
                    frames.push(format_error("BAD_COMMAND", &e.to_string(), "warning"));
                }
            }
        } else if text.starts_with("ADD_POINT:") {
            #[derive(Deserialize)]
            struct PointCmd {
                label: String,
                pos: [f64; 2],
            }
            let json_str = text.trim_start_matches("ADD_POINT:");
            match serde_json::from_str::<PointCmd>(json_str) {
                Ok(cmd) => {
                    let result = {
                        let mut doc = state.document.write().unwrap();
                        let result = doc.add_point(cmd.label, cmd.pos);
                        if result.is_ok() {
                            frames.push(partition_frame(&doc));
                        }
                        result
                    };
                    if let Err(e) = result {
                        warn!("Point rejected: {}", e);
                        frames.push(format_error("INVALID_GEOMETRY", &e.to_string(), "warning"));
                    }
                }
                Err(e) => {
                    warn!("Failed to parse ADD_POINT payload: {}", e);
                    frames.push(format_error("BAD_COMMAND", &e.to_string(), "warning"));
                }
            }
        } else if text.starts_with("SELECT_AT:") {
            // Expected format: SELECT_AT:{"point": [x, y], "tolerance": 4.0, "modifier": "replace"|"add"}
            #[derive(Deserialize)]
            struct SelectCmd {
                point: [f64; 2],
                #[serde(default)]
                tolerance: f64,
                modifier: Option<String>,
            }
            let json_str = text.trim_start_matches("SELECT_AT:");
            match serde_json::from_str::<SelectCmd>(json_str) {
                Ok(cmd) => {
                    let additive = cmd.modifier.as_deref() == Some("add");
                    let hit = {
                        let mut doc = state.document.write().unwrap();
                        let hit = doc.select_at(cmd.point, cmd.tolerance, additive);
                        frames.push(selection_frame(&doc));
                        hit
                    };
                    match hit {
                        Some(h) => info!(
                            "Hit {} record(s){}",
                            h.ids.len(),
                            h.label.map_or(String::new(), |l| format!(" of label '{}'", l))
                        ),
                        None => info!("Hit nothing"),
                    }
                }
                Err(e) => {
                    warn!("Failed to parse SELECT_AT payload: {}", e);
                    frames.push(format_error("BAD_COMMAND", &e.to_string(), "warning"));
                }
            }
        } else if text.starts_with("LASSO:") {
            #[derive(Deserialize)]
            struct LassoCmd {
                ring: Vec<[f64; 2]>,
                modifier: Option<String>,
            }
            let json_str = text.trim_start_matches("LASSO:");
            match serde_json::from_str::<LassoCmd>(json_str) {
                Ok(cmd) => {
                    let additive = cmd.modifier.as_deref() == Some("add");
                    let result = {
                        let mut doc = state.document.write().unwrap();
                        let result = doc.lasso_select(&cmd.ring, additive);
                        frames.push(selection_frame(&doc));
                        result
                    };
                    match result {
                        Ok(count) => info!("Lasso matched {} record(s)", count),
                        Err(e) => {
                            warn!("Lasso rejected: {}", e);
                            frames.push(format_error("INVALID_GEOMETRY", &e.to_string(), "warning"));
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to parse LASSO payload: {}", e);
                    frames.push(format_error("BAD_COMMAND", &e.to_string(), "warning"));
                }
            }
        } else if text == "CLEAR_SELECTION" {
            let mut doc = state.document.write().unwrap();
            doc.clear_selection();
            frames.push(selection_frame(&doc));
            drop(doc);
            info!("Cleared selection");
        } else if text == "DELETE_SELECTED" {
            let removed = {
                let mut doc = state.document.write().unwrap();
                let removed = doc.delete_selected();
                frames.push(partition_frame(&doc));
                frames.push(render_frame(&doc));
                frames.push(selection_frame(&doc));
                removed
            };
            info!("Deleted {} record(s)", removed);
        } else if text.starts_with("RELABEL:") {
            let label = text.trim_start_matches("RELABEL:");
            let replaced = {
                let mut doc = state.document.write().unwrap();
                let replaced = doc.relabel_selected(label);
                frames.push(partition_frame(&doc));
                frames.push(render_frame(&doc));
                frames.push(selection_frame(&doc));
                replaced
            };
            info!("Relabeled {} record(s) to '{}'", replaced, label);
        } else if text.starts_with("DELETE_LABEL:") {
            let label = text.trim_start_matches("DELETE_LABEL:");
            let removed = {
                let mut doc = state.document.write().unwrap();
                let removed = doc.delete_label(label);
                frames.push(partition_frame(&doc));
                frames.push(render_frame(&doc));
                frames.push(selection_frame(&doc));
                removed
            };
            info!("Deleted label '{}' ({} record(s))", label, removed);
        } else if text == "UNDO" {
            let undone = {
                let mut doc = state.document.write().unwrap();
                let undone = doc.undo();
                if undone {
                    frames.push(partition_frame(&doc));
                    frames.push(render_frame(&doc));
                    frames.push(selection_frame(&doc));
                }
                undone
            };
            if undone {
                info!("Undid last batch");
            } else {
                info!("Nothing to undo");
            }
        } else if text == "CLEAR" {
            {
                let mut doc = state.document.write().unwrap();
                doc.clear();
                frames.push(partition_frame(&doc));
                frames.push(render_frame(&doc));
                frames.push(selection_frame(&doc));
            }
            info!("Cleared document");
        } else if text == "EXPORT" {
            let result = {
                let doc = state.document.read().unwrap();
                doc.export_json()
            };
            match result {
                Ok(json) => frames.push(format!("LOG_EXPORT:{}", json)),
                Err(e) => {
                    warn!("Export failed: {}", e);
                    frames.push(format_error("EXPORT_FAILED", &e.to_string(), "error"));
                }
            }
        } else if text.starts_with("IMPORT:") {
            let json_str = text.trim_start_matches("IMPORT:");
            let result = {
                let mut doc = state.document.write().unwrap();
                let result = doc.import_json(json_str);
                if result.is_ok() {
                    frames.push(partition_frame(&doc));
                    frames.push(render_frame(&doc));
                    frames.push(selection_frame(&doc));
                }
                result
            };
            if let Err(e) = result {
                warn!("Import failed: {}", e);
                frames.push(format_error("IMPORT_FAILED", &e.to_string(), "error"));
            } else {
                info!("Imported log");
            }
        } else if text.starts_with("DESELECT:") {
            let id_str = text.trim_start_matches("DESELECT:");
            if let Ok(raw) = id_str.parse::<u64>() {
                let mut doc = state.document.write().unwrap();
                doc.deselect(AnnotationId(raw));
                frames.push(selection_frame(&doc));
            } else {
                warn!("Invalid id for DESELECT: {}", id_str);
            }
        } else {
            warn!("Unknown command: {}", text);
        }

        for frame in frames {
            if sender.send(Message::Text(frame)).await.is_err() {
                return;
            }
        }
    }

    info!("Session {} disconnected", session);
}
