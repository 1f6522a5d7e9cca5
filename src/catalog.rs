use crate::model::{weekday_name, ShiftLevel, ShiftPeriod, SlotDefinition, SlotKey};
use crate::store::Workspace;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashSet;

/// Every calendar date of the month, in order.
pub fn month_dates(year: i32, month: u32) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let Some(mut d) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return dates;
    };
    while d.month() == month {
        dates.push(d);
        d += Duration::days(1);
    }
    dates
}

/// Expands (year, month) into the full cross-product of dates x periods x
/// levels x slot numbers, appending a closed slot row for every combination
/// not already in the catalog. Existing rows are never touched, so a second
/// run for the same month is a no-op. Returns the number of rows added.
pub fn generate_month(ws: &mut Workspace, year: i32, month: u32) -> anyhow::Result<usize> {
    let existing: HashSet<SlotKey> = ws.slots.iter().map(|s| s.key()).collect();
    let month_key = format!("{year:04}-{month:02}");

    let mut added = 0usize;
    for date in month_dates(year, month) {
        let date_str = date.format("%Y-%m-%d").to_string();
        let day = weekday_name(date);
        for period in ShiftPeriod::ALL {
            for level in ShiftLevel::ALL {
                for slot_number in 1..=ws.config.slots_per_level {
                    let key = SlotKey {
                        date: date_str.clone(),
                        period,
                        level,
                        slot_number,
                    };
                    if existing.contains(&key) {
                        continue;
                    }
                    ws.slots.push(SlotDefinition {
                        month: month_key.clone(),
                        date: date_str.clone(),
                        day: day.clone(),
                        period,
                        level,
                        slot_number,
                        is_open: false,
                        requires_ojt: false,
                        // convenience default; admins may still override
                        requires_night: period == ShiftPeriod::Night,
                        remark: String::new(),
                        updated_by: String::new(),
                        updated_at: String::new(),
                    });
                    added += 1;
                }
            }
        }
    }

    if added > 0 {
        ws.save_slots()?;
    }
    Ok(added)
}
