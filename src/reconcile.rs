use crate::model::{AttendanceRecord, Booking, BookingStatus, OpError};
use crate::store::Workspace;
use uuid::Uuid;

/// Mirrors an Approved booking into the attendance store, once. The dedupe
/// identity is (student, date, period): a second promotion for the same
/// shift is a no-op. Returns whether a record was inserted.
pub fn promote_if_approved(
    ws: &mut Workspace,
    booking: &Booking,
    now: &str,
) -> Result<bool, OpError> {
    if booking.status != BookingStatus::Approved {
        return Ok(false);
    }
    let exists = ws.records.iter().any(|r| {
        r.student_id == booking.student_id && r.date == booking.date && r.period == booking.period
    });
    if exists {
        return Ok(false);
    }

    ws.records.push(AttendanceRecord {
        id: Uuid::new_v4().to_string(),
        timestamp: now.to_string(),
        booking_timestamp: booking.timestamp.clone(),
        student_id: booking.student_id.clone(),
        student_name: booking.student_name.clone(),
        month: booking.month.clone(),
        date: booking.date.clone(),
        day: booking.day.clone(),
        period: booking.period,
        level: booking.level,
        clock_in: String::new(),
        clock_out: String::new(),
        shift_start: String::new(),
        shift_end: String::new(),
        shift_hours: 0.0,
        remarks: String::new(),
    });
    if let Err(e) = ws.save_records() {
        ws.records.pop();
        return Err(OpError::new("store_save_failed", format!("{e:#}")));
    }
    Ok(true)
}

/// Full recomputation of per-student approved/pending counters from the
/// booking store. O(bookings x students), so callers run it only after a
/// state-changing operation.
pub fn recalculate_totals(ws: &mut Workspace) -> anyhow::Result<()> {
    for account in &mut ws.accounts {
        account.total_approved = 0;
        account.total_pending = 0;
    }
    for i in 0..ws.accounts.len() {
        let id = ws.accounts[i].id.clone();
        let mut approved = 0u32;
        let mut pending = 0u32;
        for b in &ws.bookings {
            if b.student_id != id {
                continue;
            }
            match b.status {
                BookingStatus::Approved => approved += 1,
                BookingStatus::Pending => pending += 1,
                _ => {}
            }
        }
        ws.accounts[i].total_approved = approved;
        ws.accounts[i].total_pending = pending;
    }
    ws.save_accounts()
}

/// Best-effort totals refresh: a recalculation failure is logged but never
/// fails the operation that triggered it.
pub fn recalculate_totals_best_effort(ws: &mut Workspace) {
    if let Err(e) = recalculate_totals(ws) {
        tracing::warn!(error = %format!("{e:#}"), "totals recalculation failed");
    }
}

/// The promote-and-recalculate hook: promotes every Approved booking still
/// missing an attendance record, then refreshes totals. Safe to re-run.
pub fn run(ws: &mut Workspace, now: &str) -> Result<usize, OpError> {
    let approved: Vec<Booking> = ws
        .bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Approved)
        .cloned()
        .collect();
    let mut promoted = 0usize;
    for booking in &approved {
        if promote_if_approved(ws, booking, now)? {
            promoted += 1;
        }
    }
    recalculate_totals_best_effort(ws);
    Ok(promoted)
}
