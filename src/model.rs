use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shift periods are a fixed enumeration; the night period carries a default
/// eligibility restriction when slots are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftPeriod {
    Morning,
    Afternoon,
    Night,
}

impl ShiftPeriod {
    pub const ALL: [ShiftPeriod; 3] = [
        ShiftPeriod::Morning,
        ShiftPeriod::Afternoon,
        ShiftPeriod::Night,
    ];

    pub fn parse(s: &str) -> Option<ShiftPeriod> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(ShiftPeriod::Morning),
            "afternoon" => Some(ShiftPeriod::Afternoon),
            "night" => Some(ShiftPeriod::Night),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftPeriod::Morning => "Morning",
            ShiftPeriod::Afternoon => "Afternoon",
            ShiftPeriod::Night => "Night",
        }
    }
}

impl fmt::Display for ShiftPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftLevel {
    L3,
    L4,
    L6,
}

impl ShiftLevel {
    pub const ALL: [ShiftLevel; 3] = [ShiftLevel::L3, ShiftLevel::L4, ShiftLevel::L6];

    pub fn parse(s: &str) -> Option<ShiftLevel> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L3" => Some(ShiftLevel::L3),
            "L4" => Some(ShiftLevel::L4),
            "L6" => Some(ShiftLevel::L6),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftLevel::L3 => "L3",
            ShiftLevel::L4 => "L4",
            ShiftLevel::L6 => "L6",
        }
    }
}

impl fmt::Display for ShiftLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub fn parse(s: &str) -> Option<BookingStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "rejected" => Some(BookingStatus::Rejected),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Approved => "Approved",
            BookingStatus::Rejected => "Rejected",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

/// The four-part slot identity. Dates are canonical `YYYY-MM-DD` strings;
/// identity comparison is exact string match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub date: String,
    pub period: ShiftPeriod,
    pub level: ShiftLevel,
    pub slot_number: u32,
}

impl SlotKey {
    pub fn month(&self) -> &str {
        // canonical dates always carry the YYYY-MM prefix
        &self.date[..7.min(self.date.len())]
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.date, self.period, self.level, self.slot_number
        )
    }
}

/// Parses and re-formats a date so stored values are always canonical.
pub fn canonical_date(s: &str) -> Option<(String, NaiveDate)> {
    let d = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()?;
    Some((d.format("%Y-%m-%d").to_string(), d))
}

pub fn weekday_name(d: NaiveDate) -> String {
    d.format("%A").to_string()
}

/// Admin-owned slot configuration. One row per slot identity; identity
/// fields are immutable after catalog generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDefinition {
    pub month: String,
    pub date: String,
    pub day: String,
    pub period: ShiftPeriod,
    pub level: ShiftLevel,
    pub slot_number: u32,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub requires_ojt: bool,
    #[serde(default)]
    pub requires_night: bool,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub updated_by: String,
    #[serde(default)]
    pub updated_at: String,
}

impl SlotDefinition {
    pub fn key(&self) -> SlotKey {
        SlotKey {
            date: self.date.clone(),
            period: self.period,
            level: self.level,
            slot_number: self.slot_number,
        }
    }
}

/// A student's request to work a slot, carrying the approval lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub timestamp: String,
    pub student_id: String,
    pub student_name: String,
    pub month: String,
    pub date: String,
    pub day: String,
    pub period: ShiftPeriod,
    pub level: ShiftLevel,
    pub slot_number: u32,
    pub preference_rank: u32,
    pub status: BookingStatus,
    #[serde(default)]
    pub admin_decision: String,
    #[serde(default)]
    pub admin_remark: String,
    #[serde(default)]
    pub decision_timestamp: String,
    #[serde(default)]
    pub cancel_requested: bool,
}

impl Booking {
    pub fn key(&self) -> SlotKey {
        SlotKey {
            date: self.date.clone(),
            period: self.period,
            level: self.level,
            slot_number: self.slot_number,
        }
    }

    /// Cancelled rows do not block a fresh booking for the same identity.
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

/// Attendance shell created exactly once per Approved booking; afterwards
/// only the student's own clock/save actions touch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub timestamp: String,
    #[serde(default)]
    pub booking_timestamp: String,
    pub student_id: String,
    pub student_name: String,
    pub month: String,
    pub date: String,
    pub day: String,
    pub period: ShiftPeriod,
    pub level: ShiftLevel,
    #[serde(default)]
    pub clock_in: String,
    #[serde(default)]
    pub clock_out: String,
    #[serde(default)]
    pub shift_start: String,
    #[serde(default)]
    pub shift_end: String,
    #[serde(default)]
    pub shift_hours: f64,
    #[serde(default)]
    pub remarks: String,
}

/// Append-only audit entry; never edited or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub id: String,
    pub timestamp: String,
    pub student_id: String,
    pub student_name: String,
    pub month: String,
    pub date: String,
    pub day: String,
    pub period: ShiftPeriod,
    pub level: ShiftLevel,
    #[serde(default)]
    pub clock_in: String,
    #[serde(default)]
    pub clock_out: String,
    #[serde(default)]
    pub shift_start: String,
    #[serde(default)]
    pub shift_end: String,
    #[serde(default)]
    pub shift_hours: f64,
    pub staff_name: String,
    #[serde(default)]
    pub signature_file: String,
    #[serde(default)]
    pub signature_sha256: String,
    #[serde(default)]
    pub staff_remarks: String,
}

/// Roster row; totals are derived counters recomputed after every
/// state-changing booking operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub on_job_training: bool,
    #[serde(default)]
    pub night_eligible: bool,
    #[serde(default)]
    pub total_approved: u32,
    #[serde(default)]
    pub total_pending: u32,
}

/// Identity resolved by the caller and threaded through every operation.
/// There is no ambient session inside the sidecar.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub on_job_training: bool,
    #[serde(default)]
    pub night_eligible: bool,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

/// Per-workspace configuration, passed in at selection time instead of
/// living in module globals.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub monthly_quota: u32,
    pub slots_per_level: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            monthly_quota: 3,
            slots_per_level: 2,
        }
    }
}

/// Expected business-rule or validation failure. Mapped 1:1 onto the IPC
/// error envelope by the handlers.
#[derive(Debug)]
pub struct OpError {
    pub code: &'static str,
    pub message: String,
}

impl OpError {
    pub fn new(code: &'static str, message: impl Into<String>) -> OpError {
        OpError {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for OpError {}
