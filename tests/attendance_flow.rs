mod test_support;

use serde_json::json;
use test_support::{admin, open_march, open_slot, slot_params, spawn_with_workspace, student, Sidecar};

fn approved_shift(sc: &mut Sidecar, student_id: &str, date: &str) {
    sc.request_ok(
        "bookings.submit",
        slot_params(student(student_id), date, "Morning", "L3", 1),
    );
    sc.request_ok(
        "decisions.approve",
        json!({
            "actor": admin("ADM"),
            "studentId": student_id,
            "date": date,
            "period": "Morning",
            "level": "L3",
            "slotNumber": 1,
        }),
    );
}

fn clock_params(student_id: &str, date: &str, action: &str) -> serde_json::Value {
    json!({
        "actor": student(student_id),
        "date": date,
        "period": "Morning",
        "level": "L3",
        "action": action,
    })
}

#[test]
fn clocking_follows_in_then_out_exactly_once() {
    let (mut sc, _dir) = spawn_with_workspace("shiftbookd-clock");
    open_march(&mut sc);
    open_slot(&mut sc, "2025-03-10", "Morning", "L3", 1);
    approved_shift(&mut sc, "A", "2025-03-10");

    sc.request_err(
        "attendance.clock",
        clock_params("A", "2025-03-10", "clockOut"),
        "not_clocked_in",
    );

    let result = sc.request_ok("attendance.clock", clock_params("A", "2025-03-10", "clockIn"));
    assert!(result["clockIn"].as_str().is_some_and(|v| !v.is_empty()));
    sc.request_err(
        "attendance.clock",
        clock_params("A", "2025-03-10", "clockIn"),
        "already_clocked_in",
    );

    let result = sc.request_ok("attendance.clock", clock_params("A", "2025-03-10", "clockOut"));
    assert!(result["clockOut"].as_str().is_some_and(|v| !v.is_empty()));
    sc.request_err(
        "attendance.clock",
        clock_params("A", "2025-03-10", "clockOut"),
        "already_clocked_out",
    );
}

#[test]
fn clocking_needs_a_promoted_shift_and_the_right_student() {
    let (mut sc, _dir) = spawn_with_workspace("shiftbookd-clock-auth");
    open_march(&mut sc);
    open_slot(&mut sc, "2025-03-10", "Morning", "L3", 1);
    approved_shift(&mut sc, "A", "2025-03-10");

    // pending-only booking has no attendance row yet
    open_slot(&mut sc, "2025-03-11", "Morning", "L3", 1);
    sc.request_ok(
        "bookings.submit",
        slot_params(student("A"), "2025-03-11", "Morning", "L3", 1),
    );
    sc.request_err(
        "attendance.clock",
        clock_params("A", "2025-03-11", "clockIn"),
        "not_found",
    );

    sc.request_err(
        "attendance.clock",
        clock_params("B", "2025-03-10", "clockIn"),
        "not_found",
    );

    let mut as_admin = clock_params("A", "2025-03-10", "clockIn");
    as_admin["actor"] = admin("ADM");
    sc.request_err("attendance.clock", as_admin, "unauthorized");
}

#[test]
fn shift_hours_are_computed_from_planned_times() {
    let (mut sc, _dir) = spawn_with_workspace("shiftbookd-shift-hours");
    open_march(&mut sc);
    open_slot(&mut sc, "2025-03-10", "Morning", "L3", 1);
    approved_shift(&mut sc, "A", "2025-03-10");

    let result = sc.request_ok(
        "attendance.save",
        json!({
            "actor": admin("ADM"),
            "studentId": "A",
            "date": "2025-03-10",
            "period": "Morning",
            "level": "L3",
            "shiftStart": "09:00",
            "shiftEnd": "17:30",
        }),
    );
    assert_eq!(result["shiftHours"], json!(8.5));

    // overnight span wraps past midnight
    let result = sc.request_ok(
        "attendance.save",
        json!({
            "actor": admin("ADM"),
            "studentId": "A",
            "date": "2025-03-10",
            "period": "Morning",
            "level": "L3",
            "shiftStart": "22:00",
            "shiftEnd": "06:00",
        }),
    );
    assert_eq!(result["shiftHours"], json!(8.0));

    // unparsable times are stored but the hours figure is left alone
    let result = sc.request_ok(
        "attendance.save",
        json!({
            "actor": admin("ADM"),
            "studentId": "A",
            "date": "2025-03-10",
            "period": "Morning",
            "level": "L3",
            "shiftStart": "late",
            "shiftEnd": "later",
        }),
    );
    assert_eq!(result["shiftStart"], json!("late"));
    assert_eq!(result["shiftHours"], json!(8.0));
}
