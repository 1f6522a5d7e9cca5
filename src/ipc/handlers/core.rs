use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::Config;
use crate::store::Workspace;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state
                .workspace
                .as_ref()
                .map(|ws| ws.root().to_string_lossy().to_string())
        }),
    )
}

fn workspace_select(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let path = PathBuf::from(get_required_str(params, "path")?);

    let mut config = Config::default();
    if let Some(q) = params.get("monthlyQuota").and_then(|v| v.as_u64()) {
        if q == 0 {
            return Err(HandlerErr::bad_params("monthlyQuota must be at least 1"));
        }
        config.monthly_quota = q as u32;
    }
    if let Some(n) = params.get("slotsPerLevel").and_then(|v| v.as_u64()) {
        if n == 0 {
            return Err(HandlerErr::bad_params("slotsPerLevel must be at least 1"));
        }
        config.slots_per_level = n as u32;
    }

    let ws = Workspace::open(&path, config)
        .map_err(|e| HandlerErr::new("workspace_open_failed", format!("{e:#}")))?;
    let result = json!({
        "workspacePath": path.to_string_lossy(),
        "monthlyQuota": config.monthly_quota,
        "slotsPerLevel": config.slots_per_level,
    });
    state.workspace = Some(ws);
    Ok(result)
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    match workspace_select(state, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
