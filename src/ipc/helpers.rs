use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{canonical_date, Actor, OpError, ShiftLevel, ShiftPeriod, SlotKey};
use crate::store::Workspace;

/// Handler-level failure, mapped onto the IPC error envelope.
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> HandlerErr {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> HandlerErr {
        HandlerErr::new("bad_params", message)
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<OpError> for HandlerErr {
    fn from(e: OpError) -> HandlerErr {
        HandlerErr::new(e.code, e.message)
    }
}

/// Runs a handler against the bound workspace, mapping the no-workspace
/// case and handler errors onto the response envelope.
pub fn with_workspace(
    state: &mut AppState,
    req: &Request,
    f: impl FnOnce(&mut Workspace, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(ws, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn now_string() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))
}

pub fn get_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
}

pub fn get_bool(params: &serde_json::Value, key: &str) -> Option<bool> {
    params.get(key).and_then(|v| v.as_bool())
}

/// The explicit caller identity every operation carries; there is no
/// ambient session to fall back on.
pub fn get_actor(params: &serde_json::Value) -> Result<Actor, HandlerErr> {
    let Some(raw) = params.get("actor") else {
        return Err(HandlerErr::bad_params("missing actor"));
    };
    let actor: Actor = serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid actor: {e}")))?;
    if actor.id.trim().is_empty() {
        return Err(HandlerErr::bad_params("actor.id must not be empty"));
    }
    Ok(actor)
}

pub fn require_admin(actor: &Actor) -> Result<(), HandlerErr> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(HandlerErr::new("unauthorized", "admin role required"))
    }
}

pub fn require_student(actor: &Actor) -> Result<(), HandlerErr> {
    if actor.role.eq_ignore_ascii_case("student") {
        Ok(())
    } else {
        Err(HandlerErr::new("unauthorized", "student role required"))
    }
}

/// Parses the four-part slot identity out of request params, canonicalizing
/// the date so store comparisons are exact.
pub fn get_slot_key(params: &serde_json::Value) -> Result<SlotKey, HandlerErr> {
    let date_raw = get_required_str(params, "date")?;
    let Some((date, _)) = canonical_date(&date_raw) else {
        return Err(HandlerErr::bad_params("invalid date, expected YYYY-MM-DD"));
    };
    let period_raw = get_required_str(params, "period")?;
    let Some(period) = ShiftPeriod::parse(&period_raw) else {
        return Err(HandlerErr::bad_params(format!(
            "unknown shift period: {period_raw}"
        )));
    };
    let level_raw = get_required_str(params, "level")?;
    let Some(level) = ShiftLevel::parse(&level_raw) else {
        return Err(HandlerErr::bad_params(format!(
            "unknown shift level: {level_raw}"
        )));
    };
    let slot_number = params
        .get("slotNumber")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| HandlerErr::bad_params("missing slotNumber"))? as u32;
    if slot_number == 0 {
        return Err(HandlerErr::bad_params("slotNumber starts at 1"));
    }
    Ok(SlotKey {
        date,
        period,
        level,
        slot_number,
    })
}

pub fn get_year_month(params: &serde_json::Value) -> Result<(i32, u32), HandlerErr> {
    let year = params
        .get("year")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params("missing year"))?;
    let month = params
        .get("month")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| HandlerErr::bad_params("missing month"))?;
    if !(1..=12).contains(&month) {
        return Err(HandlerErr::bad_params("month must be between 1 and 12"));
    }
    if !(1970..=9999).contains(&year) {
        return Err(HandlerErr::bad_params("year out of range"));
    }
    Ok((year as i32, month as u32))
}
