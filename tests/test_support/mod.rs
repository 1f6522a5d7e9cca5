#![allow(dead_code)]

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

/// A running sidecar process driven over its stdin/stdout line protocol.
pub struct Sidecar {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
}

impl Sidecar {
    pub fn spawn() -> Sidecar {
        let mut child = Command::new(env!("CARGO_BIN_EXE_shiftbookd"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn sidecar binary");
        let stdin = child.stdin.take().expect("child stdin");
        let stdout = BufReader::new(child.stdout.take().expect("child stdout"));
        Sidecar {
            child,
            stdin,
            stdout,
            next_id: 1,
        }
    }

    /// Sends one request and returns the raw response envelope.
    pub fn request(&mut self, method: &str, params: Value) -> Value {
        let id = format!("t{}", self.next_id);
        self.next_id += 1;
        let line = serde_json::to_string(&json!({
            "id": id,
            "method": method,
            "params": params,
        }))
        .expect("encode request");
        writeln!(self.stdin, "{line}").expect("write request");
        self.stdin.flush().expect("flush request");

        let mut resp_line = String::new();
        self.stdout.read_line(&mut resp_line).expect("read response");
        let resp: Value = serde_json::from_str(&resp_line).expect("parse response");
        assert_eq!(resp["id"], json!(id), "response id mismatch: {resp}");
        resp
    }

    /// Sends a request that must succeed and returns its result payload.
    pub fn request_ok(&mut self, method: &str, params: Value) -> Value {
        let resp = self.request(method, params);
        assert_eq!(resp["ok"], json!(true), "{method} failed: {resp}");
        resp["result"].clone()
    }

    /// Sends a request that must fail and asserts on the error code.
    pub fn request_err(&mut self, method: &str, params: Value, code: &str) -> Value {
        let resp = self.request(method, params);
        assert_eq!(resp["ok"], json!(false), "{method} unexpectedly succeeded: {resp}");
        assert_eq!(
            resp["error"]["code"],
            json!(code),
            "unexpected error from {method}: {resp}"
        );
        resp["error"].clone()
    }
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

/// Spawns a sidecar already bound to a fresh workspace directory.
pub fn spawn_with_workspace(prefix: &str) -> (Sidecar, PathBuf) {
    let dir = temp_dir(prefix);
    let mut sc = Sidecar::spawn();
    sc.request_ok(
        "workspace.select",
        json!({ "path": dir.to_string_lossy() }),
    );
    (sc, dir)
}

pub fn admin(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Admin {id}"),
        "role": "admin",
        "onJobTraining": false,
        "nightEligible": true,
    })
}

pub fn student(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Student {id}"),
        "role": "student",
        "onJobTraining": false,
        "nightEligible": true,
    })
}

/// Opens March 2025 and returns how many slots were generated.
pub fn open_march(sc: &mut Sidecar) -> u64 {
    let result = sc.request_ok("slots.monthOpen", json!({ "year": 2025, "month": 3 }));
    result["added"].as_u64().expect("added count")
}

/// Admin opens one slot for booking.
pub fn open_slot(sc: &mut Sidecar, date: &str, period: &str, level: &str, slot_number: u32) {
    sc.request_ok(
        "slots.update",
        json!({
            "actor": admin("ADM"),
            "date": date,
            "period": period,
            "level": level,
            "slotNumber": slot_number,
            "isOpen": true,
        }),
    );
}

/// Shorthand for the slot identity params every booking call carries.
pub fn slot_params(actor: Value, date: &str, period: &str, level: &str, slot_number: u32) -> Value {
    json!({
        "actor": actor,
        "date": date,
        "period": period,
        "level": level,
        "slotNumber": slot_number,
    })
}
