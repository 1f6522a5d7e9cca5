use crate::backup::sha256_hex;
use crate::ipc::helpers::{
    get_actor, get_required_str, get_str, now_string, require_admin, with_workspace, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{canonical_date, weekday_name, ShiftLevel, ShiftPeriod, VerificationRecord};
use crate::store::Workspace;
use serde_json::json;
use std::path::Path;
use uuid::Uuid;

/// Attendance rows joined with whether a verification entry exists for the
/// same (student, date, period, level).
fn list(ws: &mut Workspace, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let rows: Vec<serde_json::Value> = ws
        .records
        .iter()
        .map(|r| {
            let verified = ws.verifications.iter().any(|v| {
                v.student_id == r.student_id
                    && v.date == r.date
                    && v.period == r.period
                    && v.level == r.level
            });
            let mut row = serde_json::to_value(r).unwrap_or_default();
            if let Some(obj) = row.as_object_mut() {
                obj.insert("isVerified".to_string(), json!(verified));
            }
            row
        })
        .collect();
    Ok(json!({ "records": rows }))
}

fn save(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let actor = get_actor(params)?;
    require_admin(&actor)?;
    let student_id = get_required_str(params, "studentId")?;
    let date_raw = get_required_str(params, "date")?;
    let Some((date, parsed)) = canonical_date(&date_raw) else {
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
    let staff_name = get_required_str(params, "staffName")?;
    let signature_path = get_required_str(params, "signatureFile")?;

    // The verified shift carries its attendance snapshot so the audit row
    // stays meaningful even if the attendance store is edited later.
    let record = ws
        .records
        .iter()
        .find(|r| {
            r.student_id == student_id && r.date == date && r.period == period && r.level == level
        })
        .cloned();
    let Some(record) = record else {
        return Err(HandlerErr::new(
            "not_found",
            "no attendance record for this shift",
        ));
    };

    let bytes = std::fs::read(&signature_path).map_err(|e| {
        HandlerErr::new(
            "signature_read_failed",
            format!("cannot read {signature_path}: {e}"),
        )
    })?;
    let digest = sha256_hex(&bytes);

    let ext = Path::new(&signature_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let file_name = format!("{student_id}_{date}_{period}_{level}{ext}");
    let sig_dir = ws.signatures_dir();
    let dest = sig_dir.join(&file_name);
    std::fs::create_dir_all(&sig_dir)
        .and_then(|_| std::fs::write(&dest, &bytes))
        .map_err(|e| {
            HandlerErr::new(
                "signature_write_failed",
                format!("cannot store signature: {e}"),
            )
        })?;

    ws.verifications.push(VerificationRecord {
        id: Uuid::new_v4().to_string(),
        timestamp: now_string(),
        student_id: student_id.clone(),
        student_name: record.student_name.clone(),
        month: record.month.clone(),
        date: date.clone(),
        day: weekday_name(parsed),
        period,
        level,
        clock_in: record.clock_in.clone(),
        clock_out: record.clock_out.clone(),
        shift_start: record.shift_start.clone(),
        shift_end: record.shift_end.clone(),
        shift_hours: record.shift_hours,
        staff_name,
        signature_file: file_name.clone(),
        signature_sha256: digest.clone(),
        staff_remarks: get_str(params, "remarks").unwrap_or_default(),
    });
    if let Err(e) = ws.save_verifications() {
        ws.verifications.pop();
        return Err(HandlerErr::new("store_save_failed", format!("{e:#}")));
    }

    Ok(json!({
        "ok": true,
        "signatureFile": file_name,
        "signatureSha256": digest,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "verify.list" => Some(with_workspace(state, req, list)),
        "verify.save" => Some(with_workspace(state, req, save)),
        _ => None,
    }
}
