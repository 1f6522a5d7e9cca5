use crate::backup;
use crate::ipc::helpers::{get_actor, get_required_str, require_admin, with_workspace, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::Workspace;
use serde_json::json;
use std::path::PathBuf;

fn export(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_admin(&actor)?;
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);
    let summary = backup::export_workspace_bundle(ws.root(), &out_path)
        .map_err(|e| HandlerErr::new("export_failed", format!("{e:#}")))?;
    Ok(json!({
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "outPath": out_path.to_string_lossy(),
    }))
}

fn import(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_admin(&actor)?;
    let in_path = PathBuf::from(get_required_str(params, "inPath")?);
    let root = ws.root().to_path_buf();
    let summary = backup::import_workspace_bundle(&in_path, &root)
        .map_err(|e| HandlerErr::new("import_failed", format!("{e:#}")))?;
    // The stores on disk just changed under the in-memory tables.
    ws.reload()
        .map_err(|e| HandlerErr::new("workspace_reload_failed", format!("{e:#}")))?;
    Ok(json!({
        "bundleFormatDetected": summary.bundle_format_detected,
        "filesRestored": summary.files_restored,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(with_workspace(state, req, export)),
        "backup.import" => Some(with_workspace(state, req, import)),
        _ => None,
    }
}
