//! Report session management.
//!
//! Provides per-run report directories with:
//! - Unique session directories under the configured report base directory
//! - Automatic cleanup unless explicitly preserved
//! - Session metadata tracking

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config;

/// A report session with organized file management
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session ID
    pub id: String,
    /// Root directory for this session
    pub dir: PathBuf,
    /// Whether to keep files after session ends
    pub keep: bool,
}

impl Session {
    /// Create a session with a specific name/prefix
    pub fn with_name(name: &str) -> Self {
        let id = format!("{}_{}", sanitize_name(name), generate_timestamp_suffix());
        let dir = base_dir().join(&id);
        Self { id, dir, keep: false }
    }

    /// Create a session in a specific directory (kept by default)
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let id = dir
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(generate_session_id);
        Self { id, dir, keep: true }
    }

    /// Set whether to keep files after session ends
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// Initialize the session directory
    pub fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let metadata = serde_json::json!({
            "id": self.id,
            "created": chrono::Utc::now().to_rfc3339(),
            "pid": std::process::id(),
        });

        let metadata_path = self.dir.join(".session.json");
        fs::write(metadata_path, serde_json::to_string_pretty(&metadata)?)?;

        Ok(())
    }

    /// Path of the JSON report for a flow
    pub fn report_path(&self, flow: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_name(flow)))
    }

    /// List all JSON reports in the session
    pub fn list_reports(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut reports = Vec::new();
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)? {
                let path = entry?.path();
                let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
                let is_metadata = path.file_name().map(|n| n == ".session.json").unwrap_or(false);
                if is_json && !is_metadata {
                    reports.push(path);
                }
            }
        }
        reports.sort();
        Ok(reports)
    }

    /// Clean up the session directory
    pub fn cleanup(&self) -> std::io::Result<()> {
        if self.dir.exists() && !self.keep {
            fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.keep {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }
}

fn base_dir() -> PathBuf {
    PathBuf::from(config::report_base_dir())
}

/// Generate a unique session ID
fn generate_session_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("session_{}_{}", timestamp, std::process::id())
}

/// Generate a timestamp suffix
fn generate_timestamp_suffix() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Sanitize a name for use in filenames
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

/// Clean up sessions under the base directory older than `max_age`
pub fn cleanup_old_sessions(max_age: Duration) -> std::io::Result<usize> {
    cleanup_old_sessions_in(&base_dir(), max_age)
}

/// Remove session directories under `base` last modified more than `max_age` ago
pub fn cleanup_old_sessions_in(base: &Path, max_age: Duration) -> std::io::Result<usize> {
    if !base.exists() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let mut cleaned = 0;

    for entry in fs::read_dir(base)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if let Some(age) = age {
            if age > max_age && fs::remove_dir_all(&path).is_ok() {
                cleaned += 1;
            }
        }
    }

    Ok(cleaned)
}

/// List all existing sessions
pub fn list_sessions() -> std::io::Result<Vec<PathBuf>> {
    list_sessions_in(&base_dir())
}

/// List session directories under `base`, sorted by name
pub fn list_sessions_in(base: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !base.exists() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();
    for entry in fs::read_dir(base)? {
        let path = entry?.path();
        if path.is_dir() {
            sessions.push(path);
        }
    }
    sessions.sort();
    Ok(sessions)
}
