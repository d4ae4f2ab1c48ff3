use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::profile::InterpreterProfile;

/// Name → profile table.
///
/// Writers are serialized by the lock; readers get a shared snapshot of the
/// profile and never hold the lock while a process runs.
#[derive(Debug, Default)]
pub struct Registry {
    profiles: RwLock<HashMap<String, Arc<InterpreterProfile>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `profile` under `name`, replacing any existing entry wholesale.
    ///
    /// Returns the previous profile, if there was one.
    pub fn register(
        &self,
        name: impl Into<String>,
        mut profile: InterpreterProfile,
    ) -> Option<Arc<InterpreterProfile>> {
        let name = name.into();
        profile.name = name.clone();
        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        let previous = profiles.insert(name.clone(), Arc::new(profile));
        debug!(
            target: "polyshell",
            interpreter = %name,
            replaced = previous.is_some(),
            "registered interpreter"
        );
        previous
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<InterpreterProfile>> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Registered names. Order is unspecified.
    pub fn list(&self) -> Vec<String> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
