//! Browser `localStorage` as a persistence backend.

use ado_core::error::{PersistError, PersistResult};
use ado_core::persist::Storage;
use wasm_bindgen::JsValue;

/// [`Storage`] over `window.localStorage`. Unavailable storage (private
/// mode, disabled cookies) surfaces as `PersistError::Storage`.
#[derive(Debug, Default)]
pub struct LocalStorage;

fn js_err(context: &str, e: JsValue) -> PersistError {
    PersistError::Storage(format!("{context}: {e:?}"))
}

impl LocalStorage {
    fn backend(&self) -> PersistResult<web_sys::Storage> {
        let window = web_sys::window().ok_or_else(|| PersistError::Storage("no window".into()))?;
        window
            .local_storage()
            .map_err(|e| js_err("localStorage", e))?
            .ok_or_else(|| PersistError::Storage("localStorage disabled".into()))
    }
}

impl Storage for LocalStorage {
    fn read(&self, key: &str) -> PersistResult<Option<String>> {
        self.backend()?.get_item(key).map_err(|e| js_err("getItem", e))
    }

    fn write(&mut self, key: &str, value: &str) -> PersistResult<()> {
        self.backend()?
            .set_item(key, value)
            .map_err(|e| js_err("setItem", e))
    }

    fn remove(&mut self, key: &str) -> PersistResult<()> {
        self.backend()?
            .remove_item(key)
            .map_err(|e| js_err("removeItem", e))
    }
}
