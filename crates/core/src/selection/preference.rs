//! Requester preference lookup.

use async_trait::async_trait;
use std::collections::HashMap;

use super::UserPreference;

/// Resolves the preference record for a requester.
///
/// Returning `None` means the requester is unknown and must not be served.
#[async_trait]
pub trait PreferenceProvider: Send + Sync {
    async fn preference_for(&self, requester: &str) -> Option<UserPreference>;
}

/// Preferences from a fixed table, typically the `[preferences]` config section.
#[derive(Debug, Clone, Default)]
pub struct StaticPreferences {
    by_requester: HashMap<String, UserPreference>,
}

impl StaticPreferences {
    pub fn new(by_requester: HashMap<String, UserPreference>) -> Self {
        Self { by_requester }
    }

    pub fn len(&self) -> usize {
        self.by_requester.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_requester.is_empty()
    }
}

#[async_trait]
impl PreferenceProvider for StaticPreferences {
    async fn preference_for(&self, requester: &str) -> Option<UserPreference> {
        self.by_requester.get(requester).cloned()
    }
}
