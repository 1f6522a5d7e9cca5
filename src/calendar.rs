use crate::catalog::month_dates;
use crate::eligibility;
use crate::model::{Actor, SlotDefinition};
use crate::store::Workspace;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

/// One bookable slot as a student sees it on the calendar.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub date: String,
    pub period: String,
    pub level: String,
    pub slot_number: u32,
    /// open | pending | approved | rejected
    pub status: String,
    pub eligible: bool,
    pub reason: String,
    pub remark: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub date: String,
    pub in_month: bool,
    pub shifts: Vec<SlotView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<DayView>>,
}

/// Monday-first week rows covering the month, padded with the neighbouring
/// months' dates the way a wall calendar is.
pub fn month_weeks(year: i32, month: u32) -> Vec<Vec<NaiveDate>> {
    let dates = month_dates(year, month);
    let Some(first) = dates.first().copied() else {
        return Vec::new();
    };
    let last = *dates.last().expect("non-empty month");

    let mut cursor = first;
    while cursor.weekday() != Weekday::Mon {
        cursor -= Duration::days(1);
    }

    let mut weeks = Vec::new();
    while cursor <= last {
        let week: Vec<NaiveDate> = (0..7).map(|i| cursor + Duration::days(i)).collect();
        cursor += Duration::days(7);
        weeks.push(week);
    }
    weeks
}

/// Read-only composition of slot catalog, the student's own bookings, and
/// attendance records into a per-day, per-slot display model. An attendance
/// record always wins over the booking row's status: promotion has already
/// happened, so the shift is theirs.
pub fn project(ws: &Workspace, actor: &Actor, year: i32, month: u32) -> MonthView {
    let month_key = format!("{year:04}-{month:02}");

    // Open slots for the month, plus closed placeholders for slots the
    // student booked before an admin shut or removed them.
    let mut slots: Vec<SlotDefinition> = ws
        .slots
        .iter()
        .filter(|s| s.is_open && s.date.starts_with(&month_key))
        .cloned()
        .collect();
    for b in &ws.bookings {
        if b.student_id != actor.id || !b.is_active() || !b.date.starts_with(&month_key) {
            continue;
        }
        let k = b.key();
        if !slots.iter().any(|s| s.key() == k) {
            slots.push(SlotDefinition {
                month: month_key.clone(),
                date: b.date.clone(),
                day: b.day.clone(),
                period: b.period,
                level: b.level,
                slot_number: b.slot_number,
                is_open: false,
                requires_ojt: false,
                requires_night: false,
                remark: String::new(),
                updated_by: String::new(),
                updated_at: String::new(),
            });
        }
    }

    let weeks = month_weeks(year, month)
        .into_iter()
        .map(|week| {
            week.into_iter()
                .map(|d| {
                    let date_str = d.format("%Y-%m-%d").to_string();
                    let in_month = d.month() == month && d.year() == year;
                    let mut shifts: Vec<SlotView> = if in_month {
                        slots
                            .iter()
                            .filter(|s| s.date == date_str)
                            .map(|s| slot_view(ws, actor, s))
                            .collect()
                    } else {
                        Vec::new()
                    };
                    shifts.sort_by(|a, b| {
                        (&a.period, &a.level, a.slot_number).cmp(&(
                            &b.period,
                            &b.level,
                            b.slot_number,
                        ))
                    });
                    DayView {
                        date: date_str,
                        in_month,
                        shifts,
                    }
                })
                .collect()
        })
        .collect();

    MonthView { year, month, weeks }
}

fn slot_view(ws: &Workspace, actor: &Actor, slot: &SlotDefinition) -> SlotView {
    let (eligible, reason) = eligibility::eligible(actor, slot);
    let key = slot.key();

    let promoted = ws.records.iter().any(|r| {
        r.student_id == actor.id
            && r.date == slot.date
            && r.period == slot.period
            && r.level == slot.level
    });
    let status = if promoted {
        "approved".to_string()
    } else {
        ws.bookings
            .iter()
            .find(|b| b.student_id == actor.id && b.is_active() && b.key() == key)
            .map(|b| b.status.as_str().to_ascii_lowercase())
            .unwrap_or_else(|| "open".to_string())
    };

    SlotView {
        date: slot.date.clone(),
        period: slot.period.to_string(),
        level: slot.level.to_string(),
        slot_number: slot.slot_number,
        status,
        eligible,
        reason,
        remark: slot.remark.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking;
    use crate::catalog;
    use crate::model::{Config, ShiftLevel, ShiftPeriod, SlotKey};
    use std::time::{SystemTime, UNIX_EPOCH};

    const NOW: &str = "2025-03-01 09:00:00";

    fn temp_workspace(prefix: &str) -> Workspace {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        Workspace::open(&p, Config::default()).expect("open workspace")
    }

    fn student(id: &str) -> Actor {
        Actor {
            id: id.to_string(),
            name: id.to_string(),
            role: "student".to_string(),
            on_job_training: false,
            night_eligible: false,
        }
    }

    #[test]
    fn weeks_start_monday_and_cover_month() {
        let weeks = month_weeks(2025, 3);
        // March 2025: Sat the 1st, Mon the 31st -> 6 rows
        assert_eq!(weeks.len(), 6);
        for week in &weeks {
            assert_eq!(week.len(), 7);
            assert_eq!(week[0].weekday(), Weekday::Mon);
        }
        assert!(weeks[0].contains(&NaiveDate::from_ymd_opt(2025, 3, 1).expect("date")));
        assert!(weeks[5].contains(&NaiveDate::from_ymd_opt(2025, 3, 31).expect("date")));
    }

    #[test]
    fn only_open_slots_show_unless_booked() {
        let mut ws = temp_workspace("shiftbookd-calendar-open");
        catalog::generate_month(&mut ws, 2025, 3).expect("generate");
        let k = SlotKey {
            date: "2025-03-10".to_string(),
            period: ShiftPeriod::Morning,
            level: ShiftLevel::L3,
            slot_number: 1,
        };
        let pos = ws.slots.iter().position(|s| s.key() == k).expect("slot");
        ws.slots[pos].is_open = true;
        ws.save_slots().expect("save");

        let s = student("S1");
        let view = project(&ws, &s, 2025, 3);
        let day = view
            .weeks
            .iter()
            .flatten()
            .find(|d| d.date == "2025-03-10")
            .expect("day");
        assert_eq!(day.shifts.len(), 1);
        assert_eq!(day.shifts[0].status, "open");
        assert!(day.shifts[0].eligible);

        // book it, then close the slot: the booking must keep it visible
        booking::submit(&mut ws, &s, &k, NOW).expect("submit");
        let pos = ws.slots.iter().position(|s| s.key() == k).expect("slot");
        ws.slots[pos].is_open = false;
        ws.save_slots().expect("save");

        let view = project(&ws, &s, 2025, 3);
        let day = view
            .weeks
            .iter()
            .flatten()
            .find(|d| d.date == "2025-03-10")
            .expect("day");
        assert_eq!(day.shifts.len(), 1);
        assert_eq!(day.shifts[0].status, "pending");
    }

    #[test]
    fn attendance_record_outranks_booking_status() {
        let mut ws = temp_workspace("shiftbookd-calendar-promoted");
        catalog::generate_month(&mut ws, 2025, 3).expect("generate");
        let k = SlotKey {
            date: "2025-03-10".to_string(),
            period: ShiftPeriod::Morning,
            level: ShiftLevel::L3,
            slot_number: 1,
        };
        let pos = ws.slots.iter().position(|s| s.key() == k).expect("slot");
        ws.slots[pos].is_open = true;
        ws.save_slots().expect("save");

        let s = student("S1");
        booking::submit(&mut ws, &s, &k, NOW).expect("submit");
        // promote by hand without touching the booking row
        let b = ws.bookings[0].clone();
        let mut approved = b.clone();
        approved.status = crate::model::BookingStatus::Approved;
        crate::reconcile::promote_if_approved(&mut ws, &approved, NOW).expect("promote");

        let view = project(&ws, &s, 2025, 3);
        let day = view
            .weeks
            .iter()
            .flatten()
            .find(|d| d.date == "2025-03-10")
            .expect("day");
        assert_eq!(day.shifts[0].status, "approved");
        assert_eq!(ws.bookings[0].status, crate::model::BookingStatus::Pending);
    }
}
