//! Categorization session store
//!
//! Holds the per-variable regroupings the user has saved during an
//! interactive session, with their total IVs. The store is explicit
//! state injected into the session loop, and it round-trips through
//! JSON so a session can be resumed.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One saved categorization: the initial-label -> group-label mapping
/// and the total IV of the regrouped variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCategorization {
    pub mapping: HashMap<String, String>,
    pub iv: f64,
}

/// All saved categorizations of a session, keyed by variable name.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CategorizationStore {
    saved: BTreeMap<String, SavedCategorization>,
}

impl CategorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save (or overwrite) a variable's categorization. Saving the same
    /// state twice is a no-op.
    pub fn save(&mut self, variable: &str, mapping: HashMap<String, String>, iv: f64) {
        self.saved
            .insert(variable.to_string(), SavedCategorization { mapping, iv });
    }

    pub fn get(&self, variable: &str) -> Option<&SavedCategorization> {
        self.saved.get(variable)
    }

    /// Drop one variable's saved categorization; unknown names are a no-op.
    pub fn reset(&mut self, variable: &str) {
        self.saved.remove(variable);
    }

    /// Drop every saved categorization.
    pub fn reset_all(&mut self) {
        self.saved.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = &String> {
        self.saved.keys()
    }

    /// Saved variables sorted by IV descending.
    pub fn ranking(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .saved
            .iter()
            .map(|(name, cat)| (name.as_str(), cat.iv))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    /// Load a session from a JSON file; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {}", path.display()))
    }

    /// Persist the session as JSON.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize session")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write session file: {}", path.display()))
    }
}
