//! Persistence bridge: a single named storage slot with a debounced writer.
//!
//! The bridge does not own a clock. Callers hand it the current time on
//! every `schedule` and `poll`, which keeps it deterministic under test and
//! lets the WASM host drive it from `requestAnimationFrame` or a timer.

use crate::error::{PersistError, PersistResult};
use crate::model::CanvasState;
use std::collections::HashMap;

/// Key/value backend for the saved document. Browser `localStorage` in the
/// web host, a map in tests.
pub trait Storage {
    fn read(&self, key: &str) -> PersistResult<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> PersistResult<()>;
    fn remove(&mut self, key: &str) -> PersistResult<()>;
}

/// In-memory [`Storage`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
    writes: usize,
    /// When set, every write fails with this message.
    pub fail_writes: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }

    /// Put a raw value into a slot, bypassing the write counter.
    pub fn seed(&mut self, key: &str, value: &str) {
        self.slots.insert(key.to_string(), value.to_string());
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> PersistResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> PersistResult<()> {
        if let Some(reason) = &self.fail_writes {
            return Err(PersistError::Storage(reason.clone()));
        }
        self.slots.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PersistResult<()> {
        self.slots.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Pending {
    state: CanvasState,
    due_ms: f64,
}

pub struct PersistenceBridge<S: Storage> {
    storage: S,
    key: String,
    delay_ms: f64,
    pending: Option<Pending>,
    last_saved_ms: Option<f64>,
}

impl<S: Storage> PersistenceBridge<S> {
    pub fn new(storage: S, key: impl Into<String>, delay_ms: f64) -> Self {
        Self {
            storage,
            key: key.into(),
            delay_ms: delay_ms.max(0.0),
            pending: None,
            last_saved_ms: None,
        }
    }

    /// Read the saved document. A missing slot, unreadable storage or a
    /// corrupt value all come back as `None`; the latter two are logged.
    pub fn load(&self) -> Option<CanvasState> {
        let raw = match self.storage.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("persist: cannot read `{}`: {e}", self.key);
                return None;
            }
        };
        match serde_json::from_str::<CanvasState>(&raw) {
            Ok(mut state) => {
                state.normalize();
                Some(state)
            }
            Err(e) => {
                log::warn!("persist: ignoring corrupt `{}`: {e}", self.key);
                None
            }
        }
    }

    /// Queue `state` for saving once `delay_ms` passes without another call.
    /// Replaces whatever was pending.
    pub fn schedule(&mut self, state: CanvasState, now_ms: f64) {
        self.pending = Some(Pending {
            state,
            due_ms: now_ms + self.delay_ms,
        });
    }

    /// Drop the pending save, if any.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time the pending save becomes due.
    pub fn due_ms(&self) -> Option<f64> {
        self.pending.as_ref().map(|p| p.due_ms)
    }

    /// Write the pending snapshot if its window has elapsed. Returns whether
    /// a write happened.
    pub fn poll(&mut self, now_ms: f64) -> PersistResult<bool> {
        match &self.pending {
            Some(p) if now_ms >= p.due_ms => self.flush(Some(now_ms)),
            _ => Ok(false),
        }
    }

    /// Write the pending snapshot immediately, ignoring the window.
    pub fn flush_now(&mut self) -> PersistResult<bool> {
        self.flush(None)
    }

    /// Remove the saved slot and cancel any pending write.
    pub fn clear(&mut self) -> PersistResult<()> {
        self.pending = None;
        self.storage.remove(&self.key)
    }

    /// Time of the last successful write, as passed to `poll`.
    pub fn last_saved_ms(&self) -> Option<f64> {
        self.last_saved_ms
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn flush(&mut self, now_ms: Option<f64>) -> PersistResult<bool> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };
        // Serialize fully before touching storage so a failure leaves the
        // previous value intact.
        let json = serde_json::to_string(&pending.state)?;
        self.storage.write(&self.key, &json)?;
        if now_ms.is_some() {
            self.last_saved_ms = now_ms;
        }
        log::debug!("persist: saved `{}` ({} bytes)", self.key, json.len());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::LayerId;
    use crate::model::{LayerTemplate, TextLayer};
    use pretty_assertions::assert_eq;

    const KEY: &str = "adomate-design";

    fn bridge() -> PersistenceBridge<MemoryStorage> {
        PersistenceBridge::new(MemoryStorage::new(), KEY, 2000.0)
    }

    fn doc(text: &str) -> CanvasState {
        let mut state = CanvasState::default();
        state.background_image = Some("data:image/png;base64,AAAA".into());
        let mut l = TextLayer::from_template(
            LayerId::intern("persist-layer"),
            &LayerTemplate::default(),
            1.0,
            2.0,
        );
        l.text = text.into();
        state.layers.push(l);
        state
    }

    #[test]
    fn debounce_waits_for_quiet_window() {
        let mut b = bridge();
        b.schedule(doc("a"), 0.0);
        assert!(!b.poll(1999.0).unwrap());
        b.schedule(doc("b"), 1500.0);
        assert!(!b.poll(3000.0).unwrap());
        assert!(b.poll(3500.0).unwrap());
        assert_eq!(b.storage().writes(), 1);
        assert_eq!(b.load().unwrap().layers[0].text, "b");
        assert!(!b.is_pending());
    }

    #[test]
    fn roundtrip_is_deep_equal() {
        let mut b = bridge();
        let state = doc("hello\nworld");
        b.schedule(state.clone(), 0.0);
        b.flush_now().unwrap();
        assert_eq!(b.load(), Some(state));
    }

    #[test]
    fn corrupt_slot_loads_as_none() {
        let mut b = bridge();
        b.storage_mut().seed(KEY, "{not json");
        assert_eq!(b.load(), None);
    }

    #[test]
    fn clear_cancels_pending_and_removes_slot() {
        let mut b = bridge();
        b.schedule(doc("x"), 0.0);
        b.flush_now().unwrap();
        b.schedule(doc("y"), 10.0);
        b.clear().unwrap();
        assert!(!b.is_pending());
        assert!(!b.poll(10_000.0).unwrap());
        assert_eq!(b.load(), None);
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let mut b = bridge();
        b.schedule(doc("old"), 0.0);
        b.flush_now().unwrap();
        b.storage_mut().fail_writes = Some("quota exceeded".into());
        b.schedule(doc("new"), 0.0);
        assert!(b.poll(5000.0).is_err());
        assert_eq!(b.load().unwrap().layers[0].text, "old");
    }
}
