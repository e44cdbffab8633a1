//! Plan persistence with file locking.
//!
//! The plan is stored as a JSON object keyed by `YYYY-MM-DD`. Loading never
//! fails on bad data: a missing or unreadable file yields an empty plan, and
//! individual malformed entries are skipped with a warning.

use crate::calendar::parse_day_key;
use crate::{DayEntry, Error, Plan, Result};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

impl Plan {
    /// Load a plan from a file with shared locking
    ///
    /// Returns an empty plan if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No plan file found, starting with an empty plan");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open plan file {:?}: {}. Starting empty.", path, e);
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock plan file {:?}: {}. Starting empty.", path, e);
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read plan file {:?}: {}. Starting empty.", path, e);
            return Ok(Self::default());
        }

        file.unlock()?;

        let raw = match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&contents) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to parse plan file {:?}: {}. Starting empty.", path, e);
                return Ok(Self::default());
            }
        };

        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            let day = match parse_day_key(&key) {
                Ok(day) => day,
                Err(e) => {
                    tracing::warn!("Skipping plan entry {:?}: {}", key, e);
                    continue;
                }
            };
            match serde_json::from_value::<DayEntry>(value) {
                Ok(entry) => {
                    entries.insert(day, entry);
                }
                Err(e) => tracing::warn!("Skipping plan entry {}: {}", key, e),
            }
        }

        tracing::debug!("Loaded {} plan entries from {:?}", entries.len(), path);
        Ok(Self::from_entries(entries))
    }

    /// Save the plan to a file with exclusive locking
    ///
    /// Writes to a temp file in the same directory, syncs it, then renames
    /// it over the original.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "plan path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} plan entries to {:?}", self.len(), path);
        Ok(())
    }

    /// Load the plan, modify it, and save it back
    ///
    /// An exclusive lock on a sidecar `.lock` file is held for the whole
    /// cycle, so concurrent updaters are serialized instead of overwriting
    /// each other. Nothing is written if `f` fails.
    pub fn update<F, T>(path: &Path, f: F) -> Result<(Self, T)>
    where
        F: FnOnce(&mut Plan) -> Result<T>,
    {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path(path))?;
        lock.lock_exclusive()?;

        let result = Self::load(path).and_then(|mut plan| {
            let outcome = f(&mut plan)?;
            plan.save(path)?;
            Ok((plan, outcome))
        });

        let _ = lock.unlock();
        result
    }
}

fn lock_path(path: &Path) -> PathBuf {
    path.with_extension("lock")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FeelingRecord, Protocol, StartTime};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn evening() -> StartTime {
        "20:00".parse().unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let plan_path = temp_dir.path().join("plan.json");

        let mut plan = Plan::new();
        plan.set_day(date(2026, 3, 2), Protocol::H16, evening());
        plan.attach_feeling(
            date(2026, 3, 2),
            FeelingRecord::new(3, "😊").unwrap(),
            Some("slept well".into()),
        );
        plan.set_day(date(2026, 3, 4), Protocol::H72, "08:30".parse().unwrap());
        plan.clear_day(date(2026, 3, 3));

        plan.save(&plan_path).unwrap();
        let loaded = Plan::load(&plan_path).unwrap();

        assert_eq!(loaded, plan);
        let long = loaded.fast_on(date(2026, 3, 4)).unwrap().fast;
        assert_eq!((long.end_time() - long.start_time()).num_hours(), 72);
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let plan = Plan::load(&temp_dir.path().join("nonexistent.json")).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_corrupted_file_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let plan_path = temp_dir.path().join("plan.json");
        std::fs::write(&plan_path, "{ invalid json }").unwrap();

        let plan = Plan::load(&plan_path).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let plan_path = temp_dir.path().join("plan.json");
        let json = r#"{
            "2026-03-02": {"status": "fasting", "fasting_length": 16,
                           "start_time": "2026-03-02T20:00:00",
                           "end_time": "2026-03-03T12:00:00"},
            "2026-03-03": {"status": "not_fasting"},
            "2026-3-4": {"status": "not_fasting"},
            "2026-03-05": {"status": "fasting", "fasting_length": 15,
                           "start_time": "2026-03-05T20:00:00",
                           "end_time": "2026-03-06T11:00:00"},
            "2026-03-06": {"status": "fasting", "fasting_length": 16,
                           "start_time": "2026-03-06T20:00:00",
                           "end_time": "2026-03-06T21:00:00"}
        }"#;
        std::fs::write(&plan_path, json).unwrap();

        let plan = Plan::load(&plan_path).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan.fast_on(date(2026, 3, 2)).is_some());
        assert_eq!(plan.get(date(2026, 3, 3)), Some(&DayEntry::NotFasting));
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let plan_path = temp_dir.path().join("plan.json");

        let (_, changed) = Plan::update(&plan_path, |plan| {
            plan.set_day(date(2026, 3, 2), Protocol::H24, evening());
            Ok(plan.toggle_uncomplete(date(2026, 3, 2)))
        })
        .unwrap();
        assert!(!changed);

        let loaded = Plan::load(&plan_path).unwrap();
        assert_eq!(
            loaded.fast_on(date(2026, 3, 2)).map(|r| r.fast.fasting_length()),
            Some(Protocol::H24)
        );
    }

    #[test]
    fn test_failed_update_leaves_file_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let plan_path = temp_dir.path().join("plan.json");
        let mut plan = Plan::new();
        plan.clear_day(date(2026, 3, 2));
        plan.save(&plan_path).unwrap();

        let result = Plan::update(&plan_path, |plan| {
            plan.reset();
            Err::<(), _>(Error::Other("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(Plan::load(&plan_path).unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        let temp_dir = tempfile::tempdir().unwrap();
        let plan_path = temp_dir.path().join("plan.json");

        let handles: Vec<_> = (1..=8)
            .map(|d| {
                let plan_path = plan_path.clone();
                std::thread::spawn(move || {
                    Plan::update(&plan_path, |plan| {
                        plan.set_day(date(2026, 3, d), Protocol::H16, evening());
                        Ok(())
                    })
                    .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(Plan::load(&plan_path).unwrap().len(), 8);
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let plan_path = temp_dir.path().join("plan.json");

        Plan::new().save(&plan_path).unwrap();

        assert!(plan_path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "plan.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only plan.json, found extras: {:?}",
            extras
        );
    }
}
