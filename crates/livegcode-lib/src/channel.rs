//! Shared live configuration — the only state crossing thread boundaries.
//!
//! The interception path, the LED worker, and settings/API callers all go
//! through [`ConfigChannel`]. Rules are held as an `Arc<RuleSet>` swapped
//! wholesale; lighting is a small value copied out under a read lock. A
//! reader always sees one complete version of either.

use std::sync::{Arc, PoisonError, RwLock};

use crate::config::Config;
use crate::lighting::{LightingConfig, LightingUpdate};
use crate::rules::RuleSet;

/// Current ordered rule list, replaced (never edited) on reload.
#[derive(Debug, Default)]
pub struct RuleStore {
    current: RwLock<Arc<RuleSet>>,
}

impl RuleStore {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(rules)),
        }
    }

    /// Cheap handle to the current rule set; unaffected by later replacements.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        // A panicking writer cannot leave a half-assigned Arc behind.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn replace(&self, rules: RuleSet) {
        let rules = Arc::new(rules);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = rules;
    }
}

/// Synchronized holder for the live rule set and lighting configuration.
#[derive(Debug, Default)]
pub struct ConfigChannel {
    rules: RuleStore,
    lighting: RwLock<LightingConfig>,
}

impl ConfigChannel {
    pub fn new(rules: RuleSet, lighting: LightingConfig) -> Self {
        Self {
            rules: RuleStore::new(rules),
            lighting: RwLock::new(lighting),
        }
    }

    /// Build from a loaded settings file.
    pub fn from_config(config: &Config) -> Self {
        Self::new(RuleSet::from_configs(&config.rules), config.lighting.clone())
    }

    pub fn snapshot_rules(&self) -> Arc<RuleSet> {
        self.rules.snapshot()
    }

    pub fn replace_rules(&self, rules: RuleSet) {
        let count = rules.len();
        self.rules.replace(rules);
        log::info!("{count} rules loaded");
    }

    pub fn snapshot_lighting(&self) -> LightingConfig {
        self.lighting
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merge a partial update into the live lighting config.
    ///
    /// The update is validated first; a rejected update changes nothing.
    pub fn update_lighting(&self, update: LightingUpdate) -> crate::error::Result<()> {
        update.validate()?;
        log::debug!("lighting update: {update:?}");
        self.lighting
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(update);
        Ok(())
    }

    /// Replace the whole lighting config.
    pub fn replace_lighting(&self, lighting: LightingConfig) {
        *self.lighting.write().unwrap_or_else(PoisonError::into_inner) = lighting;
    }

    /// Re-read everything from a settings file that was just saved or reloaded.
    ///
    /// Rules are replaced, not merged.
    pub fn apply_settings(&self, config: &Config) {
        self.replace_rules(RuleSet::from_configs(&config.rules));
        self.replace_lighting(config.lighting.clone());
    }
}
