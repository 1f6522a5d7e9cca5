use crate::model::{
    Account, AttendanceRecord, Booking, BookingStatus, Config, SlotDefinition, SlotKey,
    VerificationRecord,
};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const SLOT_FILE: &str = "slot_control.json";
pub const BOOKING_FILE: &str = "shift_bookings.json";
pub const RECORD_FILE: &str = "shift_records.json";
pub const VERIFY_FILE: &str = "shift_verify.json";
pub const ACCOUNT_FILE: &str = "accounts.json";

pub const STORE_FILES: [&str; 5] = [SLOT_FILE, BOOKING_FILE, RECORD_FILE, VERIFY_FILE, ACCOUNT_FILE];

/// Typed default used to backfill a column that an older file predates.
#[derive(Debug, Clone, Copy)]
pub enum ColumnDefault {
    Text,
    Int,
    Float,
    Bool,
}

impl ColumnDefault {
    fn value(&self) -> Value {
        match self {
            ColumnDefault::Text => Value::String(String::new()),
            ColumnDefault::Int => Value::from(0),
            ColumnDefault::Float => Value::from(0.0),
            ColumnDefault::Bool => Value::Bool(false),
        }
    }
}

pub struct Column {
    pub name: &'static str,
    pub default: ColumnDefault,
}

const fn col(name: &'static str, default: ColumnDefault) -> Column {
    Column { name, default }
}

/// Non-identity columns per store. Identity columns are never backfilled;
/// a row missing its identity is dropped at load time instead.
pub const SLOT_SCHEMA: &[Column] = &[
    col("isOpen", ColumnDefault::Bool),
    col("requiresOjt", ColumnDefault::Bool),
    col("requiresNight", ColumnDefault::Bool),
    col("remark", ColumnDefault::Text),
    col("updatedBy", ColumnDefault::Text),
    col("updatedAt", ColumnDefault::Text),
];

pub const BOOKING_SCHEMA: &[Column] = &[
    col("adminDecision", ColumnDefault::Text),
    col("adminRemark", ColumnDefault::Text),
    col("decisionTimestamp", ColumnDefault::Text),
    col("cancelRequested", ColumnDefault::Bool),
];

pub const RECORD_SCHEMA: &[Column] = &[
    col("bookingTimestamp", ColumnDefault::Text),
    col("clockIn", ColumnDefault::Text),
    col("clockOut", ColumnDefault::Text),
    col("shiftStart", ColumnDefault::Text),
    col("shiftEnd", ColumnDefault::Text),
    col("shiftHours", ColumnDefault::Float),
    col("remarks", ColumnDefault::Text),
];

pub const VERIFY_SCHEMA: &[Column] = &[
    col("clockIn", ColumnDefault::Text),
    col("clockOut", ColumnDefault::Text),
    col("shiftStart", ColumnDefault::Text),
    col("shiftEnd", ColumnDefault::Text),
    col("shiftHours", ColumnDefault::Float),
    col("signatureFile", ColumnDefault::Text),
    col("signatureSha256", ColumnDefault::Text),
    col("staffRemarks", ColumnDefault::Text),
];

pub const ACCOUNT_SCHEMA: &[Column] = &[
    col("role", ColumnDefault::Text),
    col("onJobTraining", ColumnDefault::Bool),
    col("nightEligible", ColumnDefault::Bool),
    col("totalApproved", ColumnDefault::Int),
    col("totalPending", ColumnDefault::Int),
];

/// Backfills any column absent from a row with its typed default. Schema
/// drift is repaired here, never surfaced.
pub fn ensure_columns(rows: &mut [Map<String, Value>], schema: &[Column]) {
    for row in rows.iter_mut() {
        for column in schema {
            if !row.contains_key(column.name) {
                row.insert(column.name.to_string(), column.default.value());
            }
        }
    }
}

fn load_raw(path: &Path) -> Vec<Map<String, Value>> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "store unreadable, treating as empty");
            }
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<Map<String, Value>>>(&text) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "store corrupt, treating as empty");
            Vec::new()
        }
    }
}

/// Loads a table, repairing schema drift first. Missing or unreadable files
/// load as empty; rows that still fail to deserialize are dropped.
pub fn load_table<T: DeserializeOwned>(path: &Path, schema: &[Column]) -> Vec<T> {
    let mut rows = load_raw(path);
    ensure_columns(&mut rows, schema);
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<T>(Value::Object(row)) {
            Ok(v) => out.push(v),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "dropping unparsable row");
            }
        }
    }
    out
}

/// Writes the full table to a fresh temp file in the same directory, then
/// renames it over the target. A failure leaves the original untouched.
pub fn save_table<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(rows)
        .with_context(|| format!("failed to serialize {}", path.display()))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".saving");
    let tmp = PathBuf::from(tmp);

    let write_result = (|| -> anyhow::Result<()> {
        let mut f = std::fs::File::create(&tmp)
            .with_context(|| format!("failed to create temp file {}", tmp.display()))?;
        f.write_all(text.as_bytes())
            .with_context(|| format!("failed to write temp file {}", tmp.display()))?;
        f.flush()
            .with_context(|| format!("failed to flush temp file {}", tmp.display()))?;
        Ok(())
    })();
    if let Err(e) = write_result {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to replace {}", path.display()));
    }
    Ok(())
}

/// All stores loaded into memory, plus the secondary index that makes the
/// at-most-one-approved check an O(1) lookup. Mutations write through the
/// save_* methods so disk and memory stay aligned.
pub struct Workspace {
    root: PathBuf,
    pub config: Config,
    pub slots: Vec<SlotDefinition>,
    pub bookings: Vec<Booking>,
    pub records: Vec<AttendanceRecord>,
    pub verifications: Vec<VerificationRecord>,
    pub accounts: Vec<Account>,
    approved: HashSet<SlotKey>,
}

impl Workspace {
    pub fn open(root: &Path, config: Config) -> anyhow::Result<Workspace> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("failed to create workspace {}", root.display()))?;
        let mut ws = Workspace {
            root: root.to_path_buf(),
            config,
            slots: load_table(&root.join(SLOT_FILE), SLOT_SCHEMA),
            bookings: load_table(&root.join(BOOKING_FILE), BOOKING_SCHEMA),
            records: load_table(&root.join(RECORD_FILE), RECORD_SCHEMA),
            verifications: load_table(&root.join(VERIFY_FILE), VERIFY_SCHEMA),
            accounts: load_table(&root.join(ACCOUNT_FILE), ACCOUNT_SCHEMA),
            approved: HashSet::new(),
        };
        ws.rebuild_approved_index();
        Ok(ws)
    }

    /// Re-opens every store from disk, e.g. after a bundle import.
    pub fn reload(&mut self) -> anyhow::Result<()> {
        *self = Workspace::open(&self.root, self.config)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    pub fn signatures_dir(&self) -> PathBuf {
        self.root.join("signatures")
    }

    fn rebuild_approved_index(&mut self) {
        self.approved = self
            .bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Approved)
            .map(|b| b.key())
            .collect();
    }

    pub fn slot_approved(&self, key: &SlotKey) -> bool {
        self.approved.contains(key)
    }

    pub fn mark_approved(&mut self, key: SlotKey) {
        self.approved.insert(key);
    }

    pub fn clear_approved(&mut self, key: &SlotKey) {
        self.approved.remove(key);
    }

    pub fn save_slots(&self) -> anyhow::Result<()> {
        save_table(&self.store_path(SLOT_FILE), &self.slots)
    }

    pub fn save_bookings(&self) -> anyhow::Result<()> {
        save_table(&self.store_path(BOOKING_FILE), &self.bookings)
    }

    pub fn save_records(&self) -> anyhow::Result<()> {
        save_table(&self.store_path(RECORD_FILE), &self.records)
    }

    pub fn save_verifications(&self) -> anyhow::Result<()> {
        save_table(&self.store_path(VERIFY_FILE), &self.verifications)
    }

    pub fn save_accounts(&self) -> anyhow::Result<()> {
        save_table(&self.store_path(ACCOUNT_FILE), &self.accounts)
    }
}
