use crate::booking::{self, BookingFilter, CancelOutcome};
use crate::ipc::helpers::{
    get_actor, get_slot_key, get_str, now_string, require_student, with_workspace, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::BookingStatus;
use crate::reconcile;
use crate::store::Workspace;
use serde_json::json;

fn submit(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_student(&actor)?;
    let key = get_slot_key(params)?;
    let now = now_string();

    let rank = booking::submit(ws, &actor, &key, &now)?;
    reconcile::recalculate_totals_best_effort(ws);
    Ok(json!({ "rank": rank }))
}

fn cancel(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_student(&actor)?;
    let key = get_slot_key(params)?;

    let outcome = booking::cancel(ws, &actor, &key)?;
    reconcile::recalculate_totals_best_effort(ws);
    let outcome = match outcome {
        CancelOutcome::Removed => "removed",
        CancelOutcome::CancelRequested => "cancelRequested",
    };
    Ok(json!({ "outcome": outcome }))
}

fn list(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let mut filter = BookingFilter {
        student_id: get_str(params, "studentId"),
        month: get_str(params, "month"),
        status: None,
    };
    if let Some(raw) = get_str(params, "status") {
        let Some(status) = BookingStatus::parse(&raw) else {
            return Err(HandlerErr::bad_params(format!("unknown status: {raw}")));
        };
        filter.status = Some(status);
    }

    let rows: Vec<serde_json::Value> = booking::list(ws, &filter)
        .into_iter()
        .map(|(b, waiting)| {
            let mut row = serde_json::to_value(&b).unwrap_or_default();
            if let Some(obj) = row.as_object_mut() {
                obj.insert("waitingCount".to_string(), json!(waiting));
            }
            row
        })
        .collect();
    Ok(json!({ "bookings": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "bookings.submit" => Some(with_workspace(state, req, submit)),
        "bookings.cancel" => Some(with_workspace(state, req, cancel)),
        "bookings.list" => Some(with_workspace(state, req, list)),
        _ => None,
    }
}
