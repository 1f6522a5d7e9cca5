use crate::booking::{self, Decision};
use crate::ipc::helpers::{
    get_actor, get_required_str, get_slot_key, get_str, now_string, require_admin, with_workspace,
    HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::reconcile;
use crate::store::Workspace;
use serde_json::json;

fn decide(
    ws: &mut Workspace,
    params: &serde_json::Value,
    decision: Decision,
) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_admin(&actor)?;
    let student_id = get_required_str(params, "studentId")?;
    let key = get_slot_key(params)?;
    let remark = get_str(params, "remark").unwrap_or_default();
    let now = now_string();

    booking::decide(ws, &actor, &student_id, &key, decision, &remark, &now)?;

    // Approval immediately mirrors into the attendance store so the shift
    // shows up on rosters without waiting for the next reconcile sweep.
    let mut promoted = false;
    if decision == Decision::Approve {
        let approved = ws
            .bookings
            .iter()
            .find(|b| b.student_id == student_id && b.key() == key)
            .cloned();
        if let Some(b) = approved {
            promoted = reconcile::promote_if_approved(ws, &b, &now)?;
        }
    }
    reconcile::recalculate_totals_best_effort(ws);
    Ok(json!({ "ok": true, "promoted": promoted }))
}

fn annotate(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_admin(&actor)?;
    let student_id = get_required_str(params, "studentId")?;
    let key = get_slot_key(params)?;
    let remark = get_required_str(params, "remark")?;
    booking::annotate(ws, &student_id, &key, &remark, &now_string())?;
    Ok(json!({ "ok": true }))
}

fn confirm_cancel(
    ws: &mut Workspace,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_admin(&actor)?;
    let student_id = get_required_str(params, "studentId")?;
    let key = get_slot_key(params)?;
    booking::confirm_cancel(ws, &student_id, &key, &now_string())?;
    reconcile::recalculate_totals_best_effort(ws);
    Ok(json!({ "ok": true }))
}

fn run_reconcile(
    ws: &mut Workspace,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_admin(&actor)?;
    let promoted = reconcile::run(ws, &now_string())?;
    Ok(json!({ "promoted": promoted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "decisions.approve" => Some(with_workspace(state, req, |ws, p| {
            decide(ws, p, Decision::Approve)
        })),
        "decisions.reject" => Some(with_workspace(state, req, |ws, p| {
            decide(ws, p, Decision::Reject)
        })),
        "decisions.annotate" => Some(with_workspace(state, req, annotate)),
        "decisions.confirmCancel" => Some(with_workspace(state, req, confirm_cancel)),
        "reconcile.run" => Some(with_workspace(state, req, run_reconcile)),
        _ => None,
    }
}
