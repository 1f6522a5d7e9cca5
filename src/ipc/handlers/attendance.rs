use crate::ipc::helpers::{
    get_actor, get_required_str, get_str, now_string, require_admin, require_student,
    with_workspace, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{canonical_date, ShiftLevel, ShiftPeriod};
use crate::store::Workspace;
use chrono::NaiveTime;
use serde_json::json;

/// The attendance identity is (student, date, period, level); slot numbers
/// collapse at promotion time.
fn record_identity(
    params: &serde_json::Value,
) -> Result<(String, ShiftPeriod, ShiftLevel), HandlerErr> {
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
    Ok((date, period, level))
}

fn find_record(
    ws: &Workspace,
    student_id: &str,
    date: &str,
    period: ShiftPeriod,
    level: ShiftLevel,
) -> Option<usize> {
    ws.records.iter().position(|r| {
        r.student_id == student_id && r.date == date && r.period == period && r.level == level
    })
}

fn list(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_str(params, "studentId");
    let rows: Vec<serde_json::Value> = ws
        .records
        .iter()
        .filter(|r| student_id.as_ref().map(|id| &r.student_id == id).unwrap_or(true))
        .map(|r| serde_json::to_value(r).unwrap_or_default())
        .collect();
    Ok(json!({ "records": rows }))
}

fn clock(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_student(&actor)?;
    let (date, period, level) = record_identity(params)?;
    let action = get_required_str(params, "action")?;
    let now = now_string();

    let Some(pos) = find_record(ws, &actor.id, &date, period, level) else {
        return Err(HandlerErr::new(
            "not_found",
            "no attendance record for this shift",
        ));
    };

    let old = ws.records[pos].clone();
    {
        let r = &mut ws.records[pos];
        match action.as_str() {
            "clockIn" => {
                if !r.clock_in.is_empty() {
                    return Err(HandlerErr::new(
                        "already_clocked_in",
                        "shift already has a clock-in time",
                    ));
                }
                r.clock_in = now.clone();
            }
            "clockOut" => {
                if r.clock_in.is_empty() {
                    return Err(HandlerErr::new("not_clocked_in", "clock in first"));
                }
                if !r.clock_out.is_empty() {
                    return Err(HandlerErr::new(
                        "already_clocked_out",
                        "shift already has a clock-out time",
                    ));
                }
                r.clock_out = now.clone();
            }
            other => {
                return Err(HandlerErr::bad_params(format!(
                    "unknown action: {other}, expected clockIn or clockOut"
                )))
            }
        }
        if let Some(remarks) = get_str(params, "remarks") {
            r.remarks = remarks;
        }
    }

    if let Err(e) = ws.save_records() {
        ws.records[pos] = old;
        return Err(HandlerErr::new("store_save_failed", format!("{e:#}")));
    }
    let r = &ws.records[pos];
    Ok(json!({
        "clockIn": r.clock_in,
        "clockOut": r.clock_out,
    }))
}

/// Planned shift hours from `HH:MM` boundaries. Overnight shifts wrap past
/// midnight, so a negative span gains 24h.
fn shift_hours(start: &str, end: &str) -> Option<f64> {
    let start = NaiveTime::parse_from_str(start.trim(), "%H:%M").ok()?;
    let end = NaiveTime::parse_from_str(end.trim(), "%H:%M").ok()?;
    let mut minutes = (end - start).num_minutes();
    if minutes < 0 {
        minutes += 24 * 60;
    }
    Some(minutes as f64 / 60.0)
}

fn save(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_admin(&actor)?;
    let student_id = get_required_str(params, "studentId")?;
    let (date, period, level) = record_identity(params)?;
    let shift_start = get_required_str(params, "shiftStart")?;
    let shift_end = get_required_str(params, "shiftEnd")?;

    let Some(pos) = find_record(ws, &student_id, &date, period, level) else {
        return Err(HandlerErr::new(
            "not_found",
            "no attendance record for this shift",
        ));
    };

    let old = ws.records[pos].clone();
    {
        let r = &mut ws.records[pos];
        r.shift_start = shift_start.clone();
        r.shift_end = shift_end.clone();
        // Unparsable times keep the previous hours figure untouched.
        if let Some(hours) = shift_hours(&shift_start, &shift_end) {
            r.shift_hours = hours;
        }
        if let Some(remarks) = get_str(params, "remarks") {
            r.remarks = remarks;
        }
    }

    if let Err(e) = ws.save_records() {
        ws.records[pos] = old;
        return Err(HandlerErr::new("store_save_failed", format!("{e:#}")));
    }
    let r = &ws.records[pos];
    Ok(json!({
        "shiftStart": r.shift_start,
        "shiftEnd": r.shift_end,
        "shiftHours": r.shift_hours,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.list" => Some(with_workspace(state, req, list)),
        "attendance.clock" => Some(with_workspace(state, req, clock)),
        "attendance.save" => Some(with_workspace(state, req, save)),
        _ => None,
    }
}
