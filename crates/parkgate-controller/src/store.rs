//! Persistence of runtime parameters.
//!
//! The controller loads parameters once at start-up and saves the whole set
//! after every successful change. A store failure never blocks a change: the
//! new value stays in effect for the running process.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parkgate_core::{Error, ParameterSet, Result};
use parking_lot::Mutex;
use tracing::debug;

/// Backing storage for the [`ParameterSet`].
pub trait ParameterStore: Send {
    /// Read the stored parameters, or `None` if nothing was stored yet.
    ///
    /// # Errors
    /// Returns an error if the storage is unreadable or holds invalid data.
    fn load(&mut self) -> Result<Option<ParameterSet>>;

    /// Replace the stored parameters.
    ///
    /// # Errors
    /// Returns an error if the parameters could not be written.
    fn save(&mut self, params: &ParameterSet) -> Result<()>;
}

/// In-memory store; clones share state so tests can inspect what was saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    stored: Option<ParameterSet>,
    failing: bool,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `params`.
    pub fn with_parameters(params: ParameterSet) -> Self {
        let store = Self::default();
        store.state.lock().stored = Some(params);
        store
    }

    /// Make every subsequent load and save fail.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    pub fn stored(&self) -> Option<ParameterSet> {
        self.state.lock().stored
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().saves
    }
}

impl ParameterStore for MemoryStore {
    fn load(&mut self) -> Result<Option<ParameterSet>> {
        let state = self.state.lock();
        if state.failing {
            return Err(Error::config("memory store unavailable"));
        }
        Ok(state.stored)
    }

    fn save(&mut self, params: &ParameterSet) -> Result<()> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(Error::config("memory store unavailable"));
        }
        state.stored = Some(*params);
        state.saves += 1;
        Ok(())
    }
}

/// Parameters kept as a flat JSON object keyed by wire name.
///
/// ```json
/// {"ULTRASONIC_THRESHOLD": 30, "ULTRASONIC_TIMEOUT_MS": 5000, "SALIDA_DELAY_MS": 3000}
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ParameterStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<ParameterSet>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No stored parameters");
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        let params: ParameterSet = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(Some(params))
    }

    fn save(&mut self, params: &ParameterSet) -> Result<()> {
        let json = serde_json::to_string_pretty(params)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "Parameters saved");
        Ok(())
    }
}
