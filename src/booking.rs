use crate::eligibility;
use crate::model::{
    canonical_date, Actor, Booking, BookingStatus, OpError, SlotKey,
};
use crate::store::Workspace;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Pending booking deleted outright.
    Removed,
    /// Approved booking flagged; admin confirmation still required.
    CancelRequested,
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub student_id: Option<String>,
    pub month: Option<String>,
    pub status: Option<BookingStatus>,
}

fn store_err(e: anyhow::Error) -> OpError {
    OpError::new("store_save_failed", format!("{e:#}"))
}

fn find_active(ws: &Workspace, student_id: &str, key: &SlotKey) -> Option<usize> {
    ws.bookings
        .iter()
        .position(|b| b.student_id == student_id && b.is_active() && b.key() == *key)
}

/// Re-derives the approved-index entry for one slot identity after a
/// rolled-back mutation.
fn refresh_approved(ws: &mut Workspace, key: &SlotKey) {
    let any = ws
        .bookings
        .iter()
        .any(|b| b.status == BookingStatus::Approved && b.key() == *key);
    if any {
        ws.mark_approved(key.clone());
    } else {
        ws.clear_approved(key);
    }
}

/// Creates a Pending booking for an open, eligible slot and returns the
/// assigned preference rank.
pub fn submit(ws: &mut Workspace, actor: &Actor, key: &SlotKey, now: &str) -> Result<u32, OpError> {
    let Some((date, parsed)) = canonical_date(&key.date) else {
        return Err(OpError::new("bad_params", "invalid date, expected YYYY-MM-DD"));
    };
    debug_assert_eq!(date, key.date);

    let Some(slot) = ws.slots.iter().find(|s| s.key() == *key) else {
        return Err(OpError::new("not_found", format!("slot {key} not found")));
    };
    if !slot.is_open {
        return Err(OpError::new("slot_closed", format!("slot {key} is not open")));
    }

    let (ok, reason) = eligibility::eligible(actor, slot);
    if !ok {
        return Err(OpError::new("not_eligible", reason));
    }

    if find_active(ws, &actor.id, key).is_some() {
        return Err(OpError::new(
            "duplicate_booking",
            "you already booked this shift",
        ));
    }

    // Rank counts only the student's Pending/Approved bookings this month;
    // a rejected attempt frees its place for the next try.
    let month = key.month().to_string();
    let mut active_in_month = 0u32;
    let mut max_rank = 0u32;
    for b in &ws.bookings {
        if b.student_id != actor.id || b.month != month {
            continue;
        }
        if matches!(b.status, BookingStatus::Pending | BookingStatus::Approved) {
            active_in_month += 1;
            max_rank = max_rank.max(b.preference_rank);
        }
    }
    if active_in_month >= ws.config.monthly_quota {
        return Err(OpError::new(
            "quota_exceeded",
            format!(
                "you can only hold {} preferences per month",
                ws.config.monthly_quota
            ),
        ));
    }
    let rank = max_rank + 1;

    ws.bookings.push(Booking {
        timestamp: now.to_string(),
        student_id: actor.id.clone(),
        student_name: actor.name.clone(),
        month,
        date: key.date.clone(),
        day: crate::model::weekday_name(parsed),
        period: key.period,
        level: key.level,
        slot_number: key.slot_number,
        preference_rank: rank,
        status: BookingStatus::Pending,
        admin_decision: String::new(),
        admin_remark: String::new(),
        decision_timestamp: String::new(),
        cancel_requested: false,
    });

    if let Err(e) = ws.save_bookings() {
        ws.bookings.pop();
        return Err(store_err(e));
    }
    Ok(rank)
}

/// Student-initiated cancellation. Pending bookings are removed; Approved
/// ones are only flagged for admin confirmation.
pub fn cancel(ws: &mut Workspace, actor: &Actor, key: &SlotKey) -> Result<CancelOutcome, OpError> {
    let Some(pos) = find_active(ws, &actor.id, key) else {
        let had_cancelled = ws
            .bookings
            .iter()
            .any(|b| b.student_id == actor.id && b.key() == *key);
        if had_cancelled {
            return Err(OpError::new("nothing_to_cancel", "booking already cancelled"));
        }
        return Err(OpError::new("not_found", "no booking found for this shift"));
    };

    match ws.bookings[pos].status {
        BookingStatus::Pending => {
            let removed = ws.bookings.remove(pos);
            if let Err(e) = ws.save_bookings() {
                ws.bookings.insert(pos, removed);
                return Err(store_err(e));
            }
            Ok(CancelOutcome::Removed)
        }
        BookingStatus::Approved => {
            let old = ws.bookings[pos].clone();
            ws.bookings[pos].cancel_requested = true;
            if let Err(e) = ws.save_bookings() {
                ws.bookings[pos] = old;
                return Err(store_err(e));
            }
            Ok(CancelOutcome::CancelRequested)
        }
        BookingStatus::Rejected => Err(OpError::new(
            "nothing_to_cancel",
            "rejected bookings cannot be cancelled",
        )),
        BookingStatus::Cancelled => unreachable!("find_active excludes cancelled rows"),
    }
}

/// Admin approve/reject. Approval enforces at-most-one-approved per slot
/// identity through the secondary index rather than a table scan.
pub fn decide(
    ws: &mut Workspace,
    admin: &Actor,
    student_id: &str,
    key: &SlotKey,
    decision: Decision,
    remark: &str,
    now: &str,
) -> Result<(), OpError> {
    let Some(pos) = find_active(ws, student_id, key) else {
        return Err(OpError::new("not_found", "booking not found"));
    };

    if decision == Decision::Approve && ws.slot_approved(key) {
        return Err(OpError::new(
            "duplicate_approval",
            format!("slot {key} already has an approved booking"),
        ));
    }

    let old = ws.bookings[pos].clone();
    {
        let b = &mut ws.bookings[pos];
        b.status = match decision {
            Decision::Approve => BookingStatus::Approved,
            Decision::Reject => BookingStatus::Rejected,
        };
        b.admin_decision = b.status.as_str().to_string();
        b.admin_remark = remark.to_string();
        b.decision_timestamp = now.to_string();
    }
    match decision {
        Decision::Approve => ws.mark_approved(key.clone()),
        Decision::Reject => {
            if old.status == BookingStatus::Approved {
                ws.clear_approved(key);
            }
        }
    }

    if let Err(e) = ws.save_bookings() {
        ws.bookings[pos] = old;
        refresh_approved(ws, key);
        return Err(store_err(e));
    }
    tracing::info!(
        admin = %admin.id,
        student = %student_id,
        slot = %key,
        decision = ?decision,
        "booking decided"
    );
    Ok(())
}

/// Remark-only update; deliberately distinct from approve/reject so a note
/// never changes booking status.
pub fn annotate(
    ws: &mut Workspace,
    student_id: &str,
    key: &SlotKey,
    remark: &str,
    now: &str,
) -> Result<(), OpError> {
    let Some(pos) = find_active(ws, student_id, key) else {
        return Err(OpError::new("not_found", "booking not found"));
    };
    let old = ws.bookings[pos].clone();
    ws.bookings[pos].admin_remark = remark.to_string();
    ws.bookings[pos].decision_timestamp = now.to_string();
    if let Err(e) = ws.save_bookings() {
        ws.bookings[pos] = old;
        return Err(store_err(e));
    }
    Ok(())
}

/// Admin confirms a student's cancel request on an Approved booking.
pub fn confirm_cancel(
    ws: &mut Workspace,
    student_id: &str,
    key: &SlotKey,
    now: &str,
) -> Result<(), OpError> {
    let Some(pos) = find_active(ws, student_id, key) else {
        return Err(OpError::new("not_found", "booking not found"));
    };
    let b = &ws.bookings[pos];
    if b.status != BookingStatus::Approved || !b.cancel_requested {
        return Err(OpError::new(
            "no_cancel_request",
            "booking has no pending cancel request",
        ));
    }
    let old = ws.bookings[pos].clone();
    ws.bookings[pos].status = BookingStatus::Cancelled;
    ws.bookings[pos].decision_timestamp = now.to_string();
    ws.clear_approved(key);
    if let Err(e) = ws.save_bookings() {
        ws.bookings[pos] = old;
        refresh_approved(ws, key);
        return Err(store_err(e));
    }
    Ok(())
}

/// Pending-count per slot identity, surfaced as queue depth next to each
/// booking row.
pub fn waiting_counts(ws: &Workspace) -> HashMap<SlotKey, u32> {
    let mut counts: HashMap<SlotKey, u32> = HashMap::new();
    for b in &ws.bookings {
        if b.status == BookingStatus::Pending {
            *counts.entry(b.key()).or_default() += 1;
        }
    }
    counts
}

pub fn list(ws: &Workspace, filter: &BookingFilter) -> Vec<(Booking, u32)> {
    let counts = waiting_counts(ws);
    ws.bookings
        .iter()
        .filter(|b| {
            filter
                .student_id
                .as_ref()
                .map(|id| &b.student_id == id)
                .unwrap_or(true)
                && filter.month.as_ref().map(|m| &b.month == m).unwrap_or(true)
                && filter.status.map(|s| b.status == s).unwrap_or(true)
        })
        .map(|b| (b.clone(), counts.get(&b.key()).copied().unwrap_or(0)))
        .collect()
}
