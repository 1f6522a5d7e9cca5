use crate::catalog;
use crate::ipc::helpers::{
    get_actor, get_bool, get_slot_key, get_str, get_year_month, now_string, require_admin,
    with_workspace, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store::Workspace;
use serde_json::json;

/// Idempotent catalog generation for a month, then the month's rows.
fn month_open(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let (year, month) = get_year_month(params)?;
    let added = catalog::generate_month(ws, year, month)
        .map_err(|e| HandlerErr::new("store_save_failed", format!("{e:#}")))?;

    let month_key = format!("{year:04}-{month:02}");
    let slots: Vec<serde_json::Value> = ws
        .slots
        .iter()
        .filter(|s| s.date.starts_with(&month_key))
        .map(|s| serde_json::to_value(s).unwrap_or_default())
        .collect();

    Ok(json!({
        "year": year,
        "month": month,
        "added": added,
        "slots": slots,
    }))
}

/// Admin slot control: open/close a slot and adjust its requirement flags.
/// Identity fields are immutable; the row must already exist.
fn update(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_admin(&actor)?;
    let key = get_slot_key(params)?;

    let Some(pos) = ws.slots.iter().position(|s| s.key() == key) else {
        return Err(HandlerErr::new("not_found", format!("slot {key} not found")));
    };

    let old = ws.slots[pos].clone();
    {
        let slot = &mut ws.slots[pos];
        if let Some(v) = get_bool(params, "isOpen") {
            slot.is_open = v;
        }
        if let Some(v) = get_bool(params, "requiresOjt") {
            slot.requires_ojt = v;
        }
        if let Some(v) = get_bool(params, "requiresNight") {
            slot.requires_night = v;
        }
        if let Some(v) = get_str(params, "remark") {
            slot.remark = v;
        }
        slot.updated_by = actor.id.clone();
        slot.updated_at = now_string();
    }

    if let Err(e) = ws.save_slots() {
        ws.slots[pos] = old;
        return Err(HandlerErr::new("store_save_failed", format!("{e:#}")));
    }

    let slot = &ws.slots[pos];
    Ok(json!({
        "ok": true,
        "isOpen": slot.is_open,
        "requiresOjt": slot.requires_ojt,
        "requiresNight": slot.requires_night,
        "remark": slot.remark,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "slots.monthOpen" => Some(with_workspace(state, req, month_open)),
        "slots.update" => Some(with_workspace(state, req, update)),
        _ => None,
    }
}
