use crate::ipc::helpers::{
    get_actor, get_bool, get_required_str, get_str, require_admin, with_workspace, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::Account;
use crate::store::Workspace;
use serde_json::json;

fn list(ws: &mut Workspace, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let rows: Vec<serde_json::Value> = ws
        .accounts
        .iter()
        .map(|a| serde_json::to_value(a).unwrap_or_default())
        .collect();
    Ok(json!({ "accounts": rows }))
}

/// Insert-or-update keyed on the student id. Totals are derived counters, so
/// an update never resets them; only reconciliation rewrites those columns.
fn upsert(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_admin(&actor)?;
    let id = get_required_str(params, "id")?;
    let name = get_required_str(params, "name")?;
    let role = get_str(params, "role").unwrap_or_else(|| "student".to_string());
    let on_job_training = get_bool(params, "onJobTraining").unwrap_or(false);
    let night_eligible = get_bool(params, "nightEligible").unwrap_or(false);

    let created;
    let old = match ws.accounts.iter().position(|a| a.id == id) {
        Some(pos) => {
            created = false;
            let prev = ws.accounts[pos].clone();
            let a = &mut ws.accounts[pos];
            a.name = name;
            a.role = role;
            a.on_job_training = on_job_training;
            a.night_eligible = night_eligible;
            Some((pos, prev))
        }
        None => {
            created = true;
            ws.accounts.push(Account {
                id: id.clone(),
                name,
                role,
                on_job_training,
                night_eligible,
                total_approved: 0,
                total_pending: 0,
            });
            None
        }
    };

    if let Err(e) = ws.save_accounts() {
        match old {
            Some((pos, prev)) => ws.accounts[pos] = prev,
            None => {
                ws.accounts.pop();
            }
        }
        return Err(HandlerErr::new("store_save_failed", format!("{e:#}")));
    }
    Ok(json!({ "ok": true, "created": created }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "accounts.list" => Some(with_workspace(state, req, list)),
        "accounts.upsert" => Some(with_workspace(state, req, upsert)),
        _ => None,
    }
}
