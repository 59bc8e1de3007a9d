#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use study_kernel_contracts::ContractViolation;
use tracing::debug;

use crate::StorageError;

/// Best-effort sink for a session's flattened output.
///
/// `updates` maps slash-separated store paths to JSON values; a write either
/// lands completely or returns an error.
pub trait PersistenceAdapter {
    fn name(&self) -> &'static str;
    fn write_updates(&mut self, updates: &BTreeMap<String, Value>) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryStore {
    entries: BTreeMap<String, Value>,
    reject_writes: bool,
    write_calls: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every write fails as if the remote were unreachable.
    pub fn unavailable() -> Self {
        Self {
            reject_writes: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls
    }
}

impl PersistenceAdapter for InMemoryStore {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    fn write_updates(&mut self, updates: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        self.write_calls += 1;
        if self.reject_writes {
            return Err(StorageError::Transport("in-memory store marked unavailable".to_string()));
        }
        self.entries
            .extend(updates.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}

/// One JSON document per participant, `<dir>/<participant_id>.json`, holding
/// path → value for everything written for that participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn participant_file(&self, participant_id: &str) -> PathBuf {
        self.dir.join(format!("{participant_id}.json"))
    }

    pub fn load(&self, participant_id: &str) -> Result<BTreeMap<String, Value>, StorageError> {
        let path = self.participant_file(participant_id);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn participant_segment(path: &str) -> Result<&str, StorageError> {
    path.split('/')
        .nth(1)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ContractViolation::InvalidValue {
                field: "store.path",
                reason: "must be <root>/<participant_id>/<key>",
            }
            .into()
        })
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    let mut tmp = path.to_path_buf();
    tmp.set_extension("json.tmp");
    fs::write(&tmp, data)?;
    fs::rename(tmp, path)?;
    Ok(())
}

impl PersistenceAdapter for JsonFileStore {
    fn name(&self) -> &'static str {
        "json_file"
    }

    fn write_updates(&mut self, updates: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        let mut by_participant: BTreeMap<&str, Vec<(&String, &Value)>> = BTreeMap::new();
        for (path, value) in updates {
            by_participant
                .entry(participant_segment(path)?)
                .or_default()
                .push((path, value));
        }
        fs::create_dir_all(&self.dir)?;
        for (participant_id, entries) in by_participant {
            let mut doc = self.load(participant_id)?;
            doc.extend(entries.into_iter().map(|(k, v)| (k.clone(), v.clone())));
            let data = serde_json::to_vec_pretty(&doc)?;
            let file = self.participant_file(participant_id);
            write_atomic(&file, &data)?;
            debug!(file = %file.display(), entries = doc.len(), "participant document written");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeDbConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout_ms: u32,
    pub user_agent: String,
}

impl RealtimeDbConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout_ms: 10_000,
            user_agent: "study-engine/0.1".to_string(),
        }
    }

    /// `STUDY_RTDB_URL` (required), `STUDY_RTDB_AUTH`, `STUDY_RTDB_TIMEOUT_MS`.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("STUDY_RTDB_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())?;
        let mut cfg = Self::new(base_url);
        cfg.auth_token = std::env::var("STUDY_RTDB_AUTH")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if let Some(ms) = std::env::var("STUDY_RTDB_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|ms| *ms > 0)
        {
            cfg.timeout_ms = ms;
        }
        Some(cfg)
    }

    pub fn patch_endpoint(&self) -> String {
        format!("{}/.json", self.base_url.trim_end_matches('/'))
    }
}

/// Firebase-style realtime database reached over its REST surface.
pub struct RealtimeDbStore {
    config: RealtimeDbConfig,
    agent: ureq::Agent,
}

impl RealtimeDbStore {
    pub fn new(config: RealtimeDbConfig) -> Result<Self, StorageError> {
        if config.timeout_ms == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "realtime_db.timeout_ms",
                reason: "must be > 0",
            }
            .into());
        }
        if config.base_url.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "realtime_db.base_url",
                reason: "must not be empty",
            }
            .into());
        }
        let timeout = Duration::from_millis(u64::from(config.timeout_ms).max(100));
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(&config.user_agent)
            .build();
        Ok(Self { config, agent })
    }

    pub fn config(&self) -> &RealtimeDbConfig {
        &self.config
    }
}

fn storage_error_from_ureq(err: ureq::Error) -> StorageError {
    match err {
        ureq::Error::Status(status, _) => StorageError::Http { status },
        ureq::Error::Transport(transport) => StorageError::Transport(transport.to_string()),
    }
}

impl PersistenceAdapter for RealtimeDbStore {
    fn name(&self) -> &'static str {
        "realtime_db"
    }

    fn write_updates(&mut self, updates: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        let body = Value::Object(updates.clone().into_iter().collect());
        let mut request = self
            .agent
            .request("PATCH", &self.config.patch_endpoint())
            .set("Content-Type", "application/json")
            .set("Accept", "application/json");
        if let Some(token) = self.config.auth_token.as_deref() {
            request = request.query("auth", token);
        }
        request.send_json(body).map_err(storage_error_from_ureq)?;
        debug!(entries = updates.len(), "realtime database patch accepted");
        Ok(())
    }
}
