use crate::calendar;
use crate::ipc::helpers::{get_actor, get_year_month, with_workspace, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::Workspace;

fn month(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    let (year, month) = get_year_month(params)?;
    let view = calendar::project(ws, &actor, year, month);
    serde_json::to_value(view)
        .map_err(|e| HandlerErr::new("internal", format!("calendar encode failed: {e}")))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calendar.month" => Some(with_workspace(state, req, month)),
        _ => None,
    }
}
