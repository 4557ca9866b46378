use crate::models::Report;
use crate::s3::ObjectStore;
use crate::{verbose_eprintln, verbose_println};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Object key of the canonical, always-overwritten history.
pub const STATS_KEY: &str = "stats.json";

/// Every past run's report, keyed by run timestamp.
///
/// Entries are kept as raw JSON so reports written by older versions are
/// carried forward untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    entries: BTreeMap<String, Value>,
}

impl History {
    /// Parses a stored history. Unreadable or non-object content counts as empty.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<BTreeMap<String, Value>>(text) {
            Ok(entries) => Self { entries },
            Err(e) => {
                verbose_println!("Previous stats are not a JSON object ({}), starting fresh", e);
                Self::default()
            }
        }
    }

    /// Adds `report` under `timestamp`, replacing any entry with the same key.
    pub fn insert(&mut self, timestamp: String, report: &Report) -> Result<()> {
        let value = serde_json::to_value(report).context("Failed to serialize report")?;
        self.entries.insert(timestamp, value);
        Ok(())
    }

    pub fn get(&self, timestamp: &str) -> Option<&Value> {
        self.entries.get(timestamp)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.entries).context("Failed to serialize stats history")
    }
}

/// History key for a run; two runs within the same second share a key.
pub fn timestamp_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Key of the immutable per-run snapshot object.
pub fn snapshot_key(now: DateTime<Utc>) -> String {
    format!(
        "stats-{}.json",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

struct Remote {
    store: Box<dyn ObjectStore>,
    upload: bool,
}

/// Loads, extends and rewrites the history file, mirroring it to object
/// storage when a bucket is configured.
pub struct HistoryStore {
    local_path: PathBuf,
    remote: Option<Remote>,
}

impl HistoryStore {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: path.into(),
            remote: None,
        }
    }

    /// Reads previous history from `store` and, when `upload` is set, publishes to it.
    pub fn with_remote(mut self, store: Box<dyn ObjectStore>, upload: bool) -> Self {
        self.remote = Some(Remote { store, upload });
        self
    }

    /// Reads the previous history. Never fails: anything missing or broken is empty.
    pub async fn load(&self) -> History {
        match &self.remote {
            Some(remote) => {
                verbose_println!("Reading previous {} file from S3", STATS_KEY);
                match remote.store.get(STATS_KEY).await {
                    Ok(bytes) => History::parse(&String::from_utf8_lossy(&bytes)),
                    Err(e) => {
                        verbose_eprintln!("Could not read previous stats from S3: {}", e);
                        History::default()
                    }
                }
            }
            None => {
                verbose_println!("Reading previous {} file from local filesystem", STATS_KEY);
                match tokio::fs::read_to_string(&self.local_path).await {
                    Ok(text) => History::parse(&text),
                    Err(e) => {
                        verbose_eprintln!(
                            "Could not read {}: {}",
                            self.local_path.display(),
                            e
                        );
                        History::default()
                    }
                }
            }
        }
    }

    /// Appends `report` to the stored history under `now` and writes it back.
    ///
    /// The local file is always rewritten first. Remote uploads (a snapshot,
    /// then the canonical object) follow and their failure fails the call.
    pub async fn persist(&self, report: &Report, now: DateTime<Utc>) -> Result<History> {
        let mut history = self.load().await;
        history.insert(timestamp_key(now), report)?;
        let json = history.to_json()?;

        if let Some(parent) = self.local_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }
        }
        tokio::fs::write(&self.local_path, &json)
            .await
            .with_context(|| format!("Failed to write stats file: {}", self.local_path.display()))?;
        println!(
            "Saved {} runs to {}",
            history.len(),
            self.local_path.display()
        );

        match &self.remote {
            Some(remote) if remote.upload => {
                verbose_println!("Uploading {} to S3", STATS_KEY);
                let snapshot = snapshot_key(now);
                remote.store.put(&snapshot, json.clone().into_bytes()).await?;
                remote.store.put(STATS_KEY, json.into_bytes()).await?;
                verbose_println!("Uploaded {}", STATS_KEY);
            }
            _ => verbose_println!("Not uploading {} to S3", STATS_KEY),
        }

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn corrupt_or_non_object_history_is_empty() {
        assert!(History::parse("").is_empty());
        assert!(History::parse("{not json").is_empty());
        assert!(History::parse("[1, 2, 3]").is_empty());
        assert!(History::parse("null").is_empty());
    }

    #[test]
    fn existing_entries_are_kept_verbatim() {
        let history = History::parse(
            r#"{"Tue Mar 06 2018 09:00:00 GMT+0000 (GMT)": {"rent": {"county": {"lowest": null}}}}"#,
        );
        assert_eq!(history.len(), 1);
        let entry = history.get("Tue Mar 06 2018 09:00:00 GMT+0000 (GMT)").unwrap();
        assert!(entry["rent"]["county"]["lowest"].is_null());
    }

    #[test]
    fn timestamp_key_is_second_precision_utc() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 8, 5, 9).unwrap();
        assert_eq!(timestamp_key(now), "2026-10-17T08:05:09Z");
    }

    #[test]
    fn snapshot_key_carries_milliseconds() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 8, 5, 9).unwrap();
        assert_eq!(snapshot_key(now), "stats-2026-10-17T08:05:09.000Z.json");
    }
}
