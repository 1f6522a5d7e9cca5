mod test_support;

use serde_json::json;
use test_support::{admin, open_march, open_slot, slot_params, spawn_with_workspace, student};

fn day<'a>(view: &'a serde_json::Value, date: &str) -> &'a serde_json::Value {
    view["weeks"]
        .as_array()
        .expect("weeks")
        .iter()
        .flat_map(|w| w.as_array().expect("week"))
        .find(|d| d["date"] == json!(date))
        .expect("day cell")
}

#[test]
fn month_grid_is_monday_first_and_padded() {
    let (mut sc, _dir) = spawn_with_workspace("shiftbookd-calendar-grid");
    open_march(&mut sc);

    let view = sc.request_ok(
        "calendar.month",
        json!({ "actor": student("A"), "year": 2025, "month": 3 }),
    );
    let weeks = view["weeks"].as_array().expect("weeks");
    assert_eq!(weeks.len(), 6);
    assert!(weeks.iter().all(|w| w.as_array().expect("week").len() == 7));

    // March 2025 starts on a Saturday; the padding days carry no shifts
    let padding = day(&view, "2025-02-24");
    assert_eq!(padding["inMonth"], json!(false));
    assert_eq!(padding["shifts"].as_array().map(|v| v.len()), Some(0));
    assert_eq!(day(&view, "2025-03-01")["inMonth"], json!(true));
}

#[test]
fn slot_status_tracks_the_viewers_own_bookings() {
    let (mut sc, _dir) = spawn_with_workspace("shiftbookd-calendar-status");
    open_march(&mut sc);
    open_slot(&mut sc, "2025-03-10", "Morning", "L3", 1);

    let view = sc.request_ok(
        "calendar.month",
        json!({ "actor": student("A"), "year": 2025, "month": 3 }),
    );
    let shifts = day(&view, "2025-03-10")["shifts"].as_array().expect("shifts");
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0]["status"], json!("open"));
    assert_eq!(shifts[0]["eligible"], json!(true));

    sc.request_ok(
        "bookings.submit",
        slot_params(student("A"), "2025-03-10", "Morning", "L3", 1),
    );
    let view = sc.request_ok(
        "calendar.month",
        json!({ "actor": student("A"), "year": 2025, "month": 3 }),
    );
    assert_eq!(
        day(&view, "2025-03-10")["shifts"][0]["status"],
        json!("pending")
    );

    // another student still sees the slot as open
    let view = sc.request_ok(
        "calendar.month",
        json!({ "actor": student("B"), "year": 2025, "month": 3 }),
    );
    assert_eq!(day(&view, "2025-03-10")["shifts"][0]["status"], json!("open"));

    sc.request_ok(
        "decisions.approve",
        json!({
            "actor": admin("ADM"),
            "studentId": "A",
            "date": "2025-03-10",
            "period": "Morning",
            "level": "L3",
            "slotNumber": 1,
        }),
    );
    let view = sc.request_ok(
        "calendar.month",
        json!({ "actor": student("A"), "year": 2025, "month": 3 }),
    );
    assert_eq!(
        day(&view, "2025-03-10")["shifts"][0]["status"],
        json!("approved")
    );
}

#[test]
fn closed_booked_slot_stays_visible_to_its_owner() {
    let (mut sc, _dir) = spawn_with_workspace("shiftbookd-calendar-closed");
    open_march(&mut sc);
    open_slot(&mut sc, "2025-03-10", "Morning", "L3", 1);
    sc.request_ok(
        "bookings.submit",
        slot_params(student("A"), "2025-03-10", "Morning", "L3", 1),
    );
    sc.request_ok(
        "slots.update",
        json!({
            "actor": admin("ADM"),
            "date": "2025-03-10",
            "period": "Morning",
            "level": "L3",
            "slotNumber": 1,
            "isOpen": false,
        }),
    );

    let view = sc.request_ok(
        "calendar.month",
        json!({ "actor": student("A"), "year": 2025, "month": 3 }),
    );
    assert_eq!(
        day(&view, "2025-03-10")["shifts"][0]["status"],
        json!("pending")
    );

    let view = sc.request_ok(
        "calendar.month",
        json!({ "actor": student("B"), "year": 2025, "month": 3 }),
    );
    assert_eq!(
        day(&view, "2025-03-10")["shifts"].as_array().map(|v| v.len()),
        Some(0)
    );
}

#[test]
fn ineligible_slots_carry_their_reason() {
    let (mut sc, _dir) = spawn_with_workspace("shiftbookd-calendar-reason");
    open_march(&mut sc);
    open_slot(&mut sc, "2025-03-10", "Night", "L4", 1);

    let mut viewer = student("A");
    viewer["nightEligible"] = json!(false);
    let view = sc.request_ok(
        "calendar.month",
        json!({ "actor": viewer, "year": 2025, "month": 3 }),
    );
    let shift = &day(&view, "2025-03-10")["shifts"][0];
    assert_eq!(shift["eligible"], json!(false));
    assert_eq!(shift["reason"], json!("Night shift eligibility required"));
}
