use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::dates::{format_key, parse_key};
use crate::error::{AppError, AppResult};
use crate::storage::KeyValueStore;
use crate::timetable::Period;

/// Fixed key the whole record is persisted under
pub const STORAGE_KEY: &str = "completedClasses";

/// Per-date, per-period completion flags.
/// Sparse: a missing date or period reads as "not completed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompletionStore {
    entries: BTreeMap<String, BTreeMap<u8, bool>>,
}

impl CompletionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self, date: NaiveDate, period: Period) -> bool {
        self.entries
            .get(&format_key(date))
            .and_then(|periods| periods.get(&period.get()))
            .copied()
            .unwrap_or(false)
    }

    /// Flip the flag for one slot and return the new value.
    /// Clearing a flag removes the entry, so two toggles leave the store as it was.
    pub fn toggle(&mut self, date: NaiveDate, period: Period) -> bool {
        let key = format_key(date);
        let periods = self.entries.entry(key.clone()).or_default();
        let completed = !periods.get(&period.get()).copied().unwrap_or(false);

        if completed {
            periods.insert(period.get(), true);
        } else {
            periods.remove(&period.get());
            if periods.is_empty() {
                self.entries.remove(&key);
            }
        }

        completed
    }

    /// Number of slots currently flagged as done
    pub fn completed_count(&self) -> usize {
        self.entries
            .values()
            .map(|periods| periods.values().filter(|done| **done).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every slot flagged as done, in date order
    pub fn completed_slots(&self) -> impl Iterator<Item = (NaiveDate, Period)> + '_ {
        self.entries.iter().flat_map(|(key, periods)| {
            let date = parse_key(key).ok();
            periods
                .iter()
                .filter(|(_, done)| **done)
                .filter_map(move |(period, _)| Some((date?, Period::new(*period)?)))
        })
    }

    /// Strict parse: the JSON must be date -> period -> bool with canonical
    /// date keys and periods in 1..=7. `false` flags are dropped so the
    /// result is as sparse as one built by toggling.
    pub fn from_json(raw: &str) -> AppResult<Self> {
        let entries: BTreeMap<String, BTreeMap<String, bool>> =
            serde_json::from_str(raw).map_err(|e| AppError::CorruptRecord(e.to_string()))?;

        let mut store = Self::new();
        for (key, periods) in entries {
            let date = parse_key(&key).map_err(|_| AppError::CorruptRecord(format!("bad date key '{}'", key)))?;
            let canonical = format_key(date);

            let mut flags = BTreeMap::new();
            for (period, done) in periods {
                let period = period
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .and_then(Period::new)
                    .ok_or_else(|| AppError::CorruptRecord(format!("bad period '{}' under {}", period, key)))?;
                if done {
                    flags.insert(period.get(), true);
                }
            }
            if !flags.is_empty() {
                store.entries.insert(canonical, flags);
            }
        }

        Ok(store)
    }

    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load the persisted record. A missing or unreadable record yields an
    /// empty store; corruption is logged, never returned.
    pub fn load(kv: &dyn KeyValueStore) -> Self {
        let raw = match kv.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::new(),
            Err(e) => {
                tracing::warn!("could not read completion record, starting empty: {}", e);
                return Self::new();
            }
        };

        match Self::from_json(&raw) {
            Ok(store) => {
                tracing::debug!("loaded {} completed slots", store.completed_count());
                store
            }
            Err(e) => {
                tracing::warn!("discarding completion record: {}", e);
                Self::new()
            }
        }
    }

    /// Serialize the whole store and overwrite the persisted record
    pub fn save(&self, kv: &mut dyn KeyValueStore) -> AppResult<()> {
        kv.set(STORAGE_KEY, &self.to_json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn period(n: u8) -> Period {
        Period::new(n).unwrap()
    }

    #[test]
    fn test_missing_entries_read_as_incomplete() {
        let store = CompletionStore::new();
        assert!(!store.is_completed(monday(), period(2)));
    }

    #[test]
    fn test_toggle_sets_and_clears() {
        let mut store = CompletionStore::new();

        assert!(store.toggle(monday(), period(2)));
        assert!(store.is_completed(monday(), period(2)));
        assert!(!store.is_completed(monday(), period(3)));

        assert!(!store.toggle(monday(), period(2)));
        assert!(!store.is_completed(monday(), period(2)));
    }

    #[test]
    fn test_double_toggle_restores_structure() {
        let mut store = CompletionStore::new();
        store.toggle(monday(), period(5));
        let before = store.clone();

        store.toggle(monday(), period(2));
        store.toggle(monday(), period(2));

        assert_eq!(store, before);
    }

    #[test]
    fn test_persist_and_reload_round_trip() {
        let mut kv = MemoryStore::new();
        let mut store = CompletionStore::new();
        store.toggle(monday(), period(2));
        store.toggle(monday(), period(6));
        store.toggle(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(), period(7));

        store.save(&mut kv).unwrap();
        let reloaded = CompletionStore::load(&kv);

        assert_eq!(reloaded, store);
        assert_eq!(reloaded.completed_count(), 3);
    }

    #[test]
    fn test_persisted_shape() {
        let mut kv = MemoryStore::new();
        let mut store = CompletionStore::new();
        store.toggle(monday(), period(2));
        store.save(&mut kv).unwrap();

        let raw = kv.get(STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({ "2025-03-03": { "2": true } }));
    }

    #[test]
    fn test_load_missing_record_is_empty() {
        let kv = MemoryStore::new();
        assert!(CompletionStore::load(&kv).is_empty());
    }

    #[test]
    fn test_load_malformed_record_is_empty() {
        let mut kv = MemoryStore::new();

        kv.set(STORAGE_KEY, "{not json").unwrap();
        assert!(CompletionStore::load(&kv).is_empty());

        kv.set(STORAGE_KEY, "{\"yesterday\":{\"1\":true}}").unwrap();
        assert!(CompletionStore::load(&kv).is_empty());

        kv.set(STORAGE_KEY, "{\"2025-03-03\":{\"9\":true}}").unwrap();
        assert!(CompletionStore::load(&kv).is_empty());
    }

    #[test]
    fn test_from_json_drops_false_entries() {
        // Records written by older clients keep `false` entries around
        let raw = "{\"2025-03-03\":{\"2\":false,\"3\":true},\"2025-03-04\":{\"1\":false}}";
        let mut store = CompletionStore::from_json(raw).unwrap();
        assert!(!store.is_completed(monday(), period(2)));
        assert!(store.is_completed(monday(), period(3)));
        assert_eq!(store.completed_count(), 1);
        assert_eq!(store.to_json().unwrap(), "{\"2025-03-03\":{\"3\":true}}");

        let loaded = store.clone();
        store.toggle(monday(), period(2));
        store.toggle(monday(), period(2));
        assert_eq!(store, loaded);

        let err = CompletionStore::from_json("[]").unwrap_err();
        assert!(matches!(err, AppError::CorruptRecord(_)));
    }

    #[test]
    fn test_completed_slots_lists_done_flags() {
        let mut store = CompletionStore::new();
        let friday = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        store.toggle(friday, period(7));
        store.toggle(monday(), period(5));
        store.toggle(monday(), period(2));

        let slots: Vec<_> = store.completed_slots().collect();
        assert_eq!(slots, vec![(monday(), period(2)), (monday(), period(5)), (friday, period(7))]);
    }
}
