use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::store::STORE_FILES;

const MANIFEST_ENTRY: &str = "manifest.json";
pub const BUNDLE_FORMAT_V1: &str = "shiftbook-workspace-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub files_restored: usize,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Bundles every store file present in the workspace into a zip with a
/// manifest carrying per-entry checksums. Absent stores are simply skipped.
pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
    for name in STORE_FILES {
        let path = workspace_path.join(name);
        if !path.is_file() {
            continue;
        }
        let bytes = std::fs::read(&path)
            .with_context(|| format!("failed to read store {}", path.display()))?;
        entries.push((name.to_string(), bytes));
    }
    if entries.is_empty() {
        return Err(anyhow!(
            "no store files found in workspace {}",
            workspace_path.display()
        ));
    }

    let out_file = File::create(out_path)
        .with_context(|| format!("failed to create output file {}", out_path.display()))?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "files": entries
            .iter()
            .map(|(name, bytes)| json!({ "name": name, "sha256": sha256_hex(bytes) }))
            .collect::<Vec<_>>(),
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    let entry_count = entries.len() + 1;
    for (name, bytes) in &entries {
        zip.start_file(format!("data/{name}"), opts)
            .with_context(|| format!("failed to start entry {name}"))?;
        zip.write_all(bytes)
            .with_context(|| format!("failed to write entry {name}"))?;
    }
    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count,
    })
}

/// Restores store files from a bundle. The manifest format and checksums are
/// validated before anything is written; each file lands via a temp path and
/// rename so a failed import never leaves a half-written store.
pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    std::fs::create_dir_all(workspace_path)
        .with_context(|| format!("failed to create workspace {}", workspace_path.display()))?;

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.display()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest.get("format").and_then(|v| v.as_str()).unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {format}"));
    }

    let files = manifest
        .get("files")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let mut restored = 0usize;
    for file in files {
        let Some(name) = file.get("name").and_then(|v| v.as_str()) else {
            continue;
        };
        if !STORE_FILES.contains(&name) {
            return Err(anyhow!("bundle names unknown store file: {name}"));
        }
        let expected_sha = file.get("sha256").and_then(|v| v.as_str()).unwrap_or("");

        let mut bytes = Vec::new();
        archive
            .by_name(&format!("data/{name}"))
            .with_context(|| format!("bundle missing data/{name}"))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read data/{name}"))?;
        if !expected_sha.is_empty() && sha256_hex(&bytes) != expected_sha {
            return Err(anyhow!("checksum mismatch for {name}"));
        }

        let dst = workspace_path.join(name);
        let tmp = workspace_path.join(format!("{name}.importing"));
        if tmp.exists() {
            let _ = std::fs::remove_file(&tmp);
        }
        let write_result = (|| -> anyhow::Result<()> {
            let mut out = File::create(&tmp)
                .with_context(|| format!("failed to create temp file {}", tmp.display()))?;
            out.write_all(&bytes)
                .with_context(|| format!("failed to write temp file {}", tmp.display()))?;
            out.flush()
                .with_context(|| format!("failed to flush temp file {}", tmp.display()))?;
            Ok(())
        })();
        if let Err(e) = write_result {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        std::fs::rename(&tmp, &dst)
            .with_context(|| format!("failed to move store into place at {}", dst.display()))?;
        restored += 1;
    }

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        files_restored: restored,
    })
}
