#![deny(warnings)]

//! Persistence layer: key-value stores, game snapshots and the daily claim ledger.
//!
//! The engine treats storage as best-effort. Helpers here that the engine
//! calls on its hot path ([`load_state`], [`save_state`]) log and swallow
//! store failures instead of returning them.

use chrono::NaiveDate;
use idle_core::{GameConfig, GameState};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Key of the current snapshot format.
pub const SAVE_KEY: &str = "idle_factory_save_v2";

/// Keys written by earlier releases, removed on a full reset.
pub const LEGACY_SAVE_KEYS: &[&str] = &["idle_factory_save_v1", "idle_factory_save"];

/// Key holding the date of the last daily reward claim.
pub const DAILY_CLAIM_KEY: &str = "daily_reward_claim_date";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("encode error: {0}")]
    Encode(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Encode(e.to_string())
    }
}

/// Opaque string blobs addressed by key.
pub trait Store {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&mut self, key: &str, blob: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }
    fn save(&mut self, key: &str, blob: &str) -> Result<(), StoreError> {
        (**self).save(key, blob)
    }
    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-process store, used by tests and headless sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails, to exercise the best-effort paths.
    pub fn unavailable() -> Self {
        Self {
            entries: BTreeMap::new(),
            unavailable: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store disabled".into()));
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.root.join(format!("{name}.json"))
    }
}

impl Store for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Serialize the full state. Timer handles are not part of [`GameState`].
pub fn encode_snapshot(state: &GameState) -> Result<String, StoreError> {
    Ok(serde_json::to_string(state)?)
}

/// Decode a snapshot by merging its top-level fields over a fresh state.
///
/// Each known field is checked on its own: a field with the wrong shape keeps
/// its default and the rest of the snapshot still applies. Missing fields keep
/// their defaults and unknown fields are dropped. Returns `None` only when the
/// blob is not a JSON object.
pub fn decode_snapshot(blob: &str, config: &GameConfig) -> Option<GameState> {
    let saved = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("snapshot is not a JSON object; ignoring");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "snapshot is not valid JSON; ignoring");
            return None;
        }
    };
    let mut base = match serde_json::to_value(GameState::new(config)) {
        Ok(Value::Object(map)) => map,
        _ => return None,
    };
    for (key, value) in saved {
        if !base.contains_key(&key) {
            debug!(field = %key, "dropping unknown snapshot field");
            continue;
        }
        let mut single = Map::new();
        single.insert(key.clone(), value.clone());
        match serde_json::from_value::<GameState>(Value::Object(single)) {
            Ok(_) => {
                base.insert(key, value);
            }
            Err(e) => warn!(field = %key, error = %e, "mistyped snapshot field; keeping default"),
        }
    }
    match serde_json::from_value::<GameState>(Value::Object(base)) {
        Ok(mut state) => {
            state.normalize(config);
            Some(state)
        }
        Err(e) => {
            warn!(error = %e, "snapshot could not be merged; ignoring");
            None
        }
    }
}

/// Load and decode the saved state, if any. Store failures count as "no save".
pub fn load_state<S: Store + ?Sized>(store: &S, config: &GameConfig) -> Option<GameState> {
    match store.load(SAVE_KEY) {
        Ok(Some(blob)) => {
            let state = decode_snapshot(&blob, config);
            if state.is_some() {
                info!(key = SAVE_KEY, "restored saved game");
            }
            state
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "could not read save; starting fresh");
            None
        }
    }
}

/// Write the snapshot. Returns whether it reached the store.
pub fn save_state<S: Store + ?Sized>(store: &mut S, state: &GameState) -> bool {
    let result = encode_snapshot(state).and_then(|blob| store.save(SAVE_KEY, &blob));
    match result {
        Ok(()) => {
            debug!(key = SAVE_KEY, "game saved");
            true
        }
        Err(e) => {
            warn!(error = %e, "save failed; continuing with in-memory state");
            false
        }
    }
}

/// Remove the current and legacy snapshots and the daily claim record.
pub fn wipe<S: Store + ?Sized>(store: &mut S) {
    let keys = std::iter::once(SAVE_KEY)
        .chain(LEGACY_SAVE_KEYS.iter().copied())
        .chain(std::iter::once(DAILY_CLAIM_KEY));
    for key in keys {
        if let Err(e) = store.remove(key) {
            warn!(key, error = %e, "could not remove stored key");
        }
    }
}

/// Date-keyed gate for the daily reward.
pub trait ClaimLedger {
    fn has_claimed_on(&self, day: NaiveDate) -> bool;
    fn record_claim(&mut self, day: NaiveDate) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> ClaimLedger for S {
    fn has_claimed_on(&self, day: NaiveDate) -> bool {
        match self.load(DAILY_CLAIM_KEY) {
            Ok(Some(text)) => text.trim().parse::<NaiveDate>().ok() == Some(day),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "could not read daily claim record");
                false
            }
        }
    }

    fn record_claim(&mut self, day: NaiveDate) -> Result<(), StoreError> {
        self.save(DAILY_CLAIM_KEY, &day.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idle_core::{Campaign, EffectKind, EphemeralEffect, UpgradeId};
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.load("k").unwrap().is_none());
        store.save("k", "v").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("saves"));
        assert!(store.load(SAVE_KEY).unwrap().is_none());
        store.save(SAVE_KEY, "{}").unwrap();
        assert_eq!(store.load(SAVE_KEY).unwrap().as_deref(), Some("{}"));
        assert!(store.root().join(format!("{SAVE_KEY}.json")).exists());
        store.remove(SAVE_KEY).unwrap();
        store.remove(SAVE_KEY).unwrap();
        assert!(store.load(SAVE_KEY).unwrap().is_none());
    }

    #[test]
    fn snapshot_roundtrip_through_store() {
        let cfg = GameConfig::default();
        let mut state = GameState::new(&cfg);
        state.credit(777);
        state.upgrade_prices.insert(UpgradeId::Lab, 1_760);
        state.active_campaigns.insert(Campaign::Pub, true);
        state.active_effect = Some(EphemeralEffect {
            kind: EffectKind::DoubleAll,
            name: "Meltdown".into(),
            description: "x2".into(),
            duration_secs: 15,
        });
        state.achievements[0].achieved = true;
        let mut store = MemoryStore::new();
        assert!(save_state(&mut store, &state));
        let back = load_state(&store, &cfg).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn partial_snapshot_merges_over_defaults() {
        let cfg = GameConfig::default();
        let back = decode_snapshot(
            r#"{"currency": 12, "lifetimeSpent": 300, "legacyField": [1, 2]}"#,
            &cfg,
        )
        .unwrap();
        assert_eq!(back.currency, 12);
        assert_eq!(back.lifetime_spent, 300);
        assert_eq!(back.manual_rate, 1.0);
        assert_eq!(back.achievements.len(), cfg.levels.len());
    }

    #[test]
    fn non_object_snapshots_are_rejected() {
        let cfg = GameConfig::default();
        assert!(decode_snapshot("not json", &cfg).is_none());
        assert!(decode_snapshot("[1, 2]", &cfg).is_none());
        assert!(decode_snapshot("42", &cfg).is_none());
    }

    #[test]
    fn mistyped_field_keeps_the_rest_of_the_save() {
        let cfg = GameConfig::default();
        let back = decode_snapshot(
            r#"{"currency": 40000, "lifetimeSpent": 90000, "prestigeMultiplier": 3.375, "muted": "yes"}"#,
            &cfg,
        )
        .unwrap();
        assert_eq!(back.currency, 40_000);
        assert_eq!(back.lifetime_spent, 90_000);
        assert_eq!(back.prestige_multiplier, 3.375);
        assert!(!back.muted);
    }

    #[test]
    fn every_mistyped_field_falls_back_to_default() {
        let cfg = GameConfig::default();
        let back = decode_snapshot(
            r#"{"currency": "lots", "upgradePrices": {"atelier": -3}, "totalClicks": 12}"#,
            &cfg,
        )
        .unwrap();
        assert_eq!(back.currency, 0);
        assert_eq!(back.price(UpgradeId::Atelier), 50);
        assert_eq!(back.total_clicks, 12);
    }

    #[test]
    fn unavailable_store_is_swallowed() {
        let cfg = GameConfig::default();
        let mut store = MemoryStore::unavailable();
        assert!(!save_state(&mut store, &GameState::default()));
        assert!(load_state(&store, &cfg).is_none());
        assert!(!store.has_claimed_on(day(19)));
        wipe(&mut store);
    }

    #[test]
    fn ledger_is_keyed_by_day() {
        let mut store = MemoryStore::new();
        assert!(!store.has_claimed_on(day(19)));
        store.record_claim(day(19)).unwrap();
        assert!(store.has_claimed_on(day(19)));
        assert!(!store.has_claimed_on(day(20)));
    }

    #[test]
    fn wipe_clears_saves_and_claims() {
        let mut store = MemoryStore::new();
        store.save(SAVE_KEY, "{}").unwrap();
        store.save(LEGACY_SAVE_KEYS[0], "{}").unwrap();
        store.record_claim(day(1)).unwrap();
        store.save("preferences", "dark").unwrap();
        wipe(&mut store);
        assert_eq!(store.len(), 1);
        assert!(!store.has_claimed_on(day(1)));
    }

    proptest! {
        #[test]
        fn roundtrip_preserves_balances(currency in 0u64..1_000_000_000,
                                        extra in 0u64..1_000_000_000,
                                        clicks in 0u64..1_000_000,
                                        manual in 1u32..500) {
            let cfg = GameConfig::default();
            let mut state = GameState::new(&cfg);
            state.currency = currency;
            state.lifetime_spent = currency + extra;
            state.total_clicks = clicks;
            state.manual_rate = f64::from(manual);
            let blob = encode_snapshot(&state).unwrap();
            let back = decode_snapshot(&blob, &cfg).unwrap();
            prop_assert_eq!(back, state);
        }
    }
}
