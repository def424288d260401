use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::domain::{ApplicationState, SectionUpdate, WizardStep};

/// Fixed key under which the in-progress wizard is stored.
pub const APPLICATION_STATE_KEY: &str = "civic-participation-application";

/// Key-value storage scoped to one client session, mirroring browser session storage.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("session storage unavailable: {0}")]
    Unavailable(String),
    #[error("application state could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A section patch that could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("invalid section fields: {0}")]
    Invalid(#[source] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Process-local session storage.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
    fn items(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.items
            .lock()
            .map_err(|_| StorageError::Unavailable("storage mutex poisoned".to_string()))
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.items()?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items()?.remove(key);
        Ok(())
    }
}

/// Wizard answers for one session, written through to storage on every change.
#[derive(Debug)]
pub struct FormStateStore<S> {
    storage: Arc<S>,
    state: ApplicationState,
}

impl<S> FormStateStore<S>
where
    S: SessionStorage,
{
    /// Rehydrate from storage. Unreadable JSON counts as no saved state.
    pub fn load(storage: Arc<S>) -> Result<Self, StorageError> {
        let state = match storage.get_item(APPLICATION_STATE_KEY)? {
            Some(raw) => match serde_json::from_str::<ApplicationState>(&raw) {
                Ok(state) => state,
                Err(err) => {
                    debug!(error = %err, "discarding malformed application state");
                    ApplicationState::default()
                }
            },
            None => ApplicationState::default(),
        };

        Ok(Self { storage, state })
    }

    pub fn get(&self) -> &ApplicationState {
        &self.state
    }

    pub fn update(&mut self, update: SectionUpdate) -> Result<(), StorageError> {
        self.state.apply(update);
        self.persist()
    }

    /// Apply a JSON patch to one section and persist it. Rejected patches change nothing.
    pub fn patch(&mut self, step: WizardStep, patch: serde_json::Value) -> Result<(), PatchError> {
        let mut state = self.state.clone();
        state
            .patch_section(step, patch)
            .map_err(PatchError::Invalid)?;
        self.state = state;
        self.persist()?;
        Ok(())
    }

    /// Drop the saved answers, both in memory and in storage.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.state = ApplicationState::default();
        self.storage.remove_item(APPLICATION_STATE_KEY)
    }

    fn persist(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&self.state)?;
        self.storage.set_item(APPLICATION_STATE_KEY, raw)
    }
}
