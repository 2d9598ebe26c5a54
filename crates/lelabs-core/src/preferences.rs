use chrono::{DateTime, Utc};
use lelabs_store::RecordStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::clock::Clock;

/// Fixed key of the single preferences record
pub const PREFERENCES_KEY: &str = "user-preferences";

/// A project the user follows, with the moment they last caught up on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowedProject {
    pub id: String,
    pub last_checked: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemePreference {
    #[default]
    Default,
    HighContrast,
}

impl ThemePreference {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "default" => Some(ThemePreference::Default),
            "high-contrast" | "high_contrast" | "highcontrast" => Some(ThemePreference::HighContrast),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Default => "default",
            ThemePreference::HighContrast => "high-contrast",
        }
    }
}

/// Everything we remember about the local user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub followed_projects: Vec<FollowedProject>,
    #[serde(default)]
    pub theme: ThemePreference,
    #[serde(default)]
    pub reduced_motion: bool,
}

impl UserPreferences {
    pub fn followed(&self, project_id: &str) -> Option<&FollowedProject> {
        self.followed_projects.iter().find(|p| p.id == project_id)
    }

    pub fn is_following(&self, project_id: &str) -> bool {
        self.followed(project_id).is_some()
    }
}

/// Where preferences are persisted
#[cfg_attr(test, mockall::automock)]
pub trait PreferenceBackend: Send {
    fn load(&self) -> crate::Result<Option<UserPreferences>>;
    fn save(&self, preferences: &UserPreferences) -> crate::Result<()>;
}

impl PreferenceBackend for RecordStore {
    fn load(&self) -> crate::Result<Option<UserPreferences>> {
        Ok(self.get(PREFERENCES_KEY)?)
    }

    fn save(&self, preferences: &UserPreferences) -> crate::Result<()> {
        Ok(self.put(PREFERENCES_KEY, preferences)?)
    }
}

/// Volatile backend for tests and `--ephemeral` runs
#[derive(Debug, Default)]
pub struct MemoryBackend {
    record: Mutex<Option<UserPreferences>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(preferences: UserPreferences) -> Self {
        Self {
            record: Mutex::new(Some(preferences)),
        }
    }
}

impl PreferenceBackend for MemoryBackend {
    fn load(&self) -> crate::Result<Option<UserPreferences>> {
        Ok(self.record.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, preferences: &UserPreferences) -> crate::Result<()> {
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = Some(preferences.clone());
        Ok(())
    }
}

/// Local, single-profile preference store
///
/// Every mutation builds the complete next value, writes it through the
/// backend in one call, and only then replaces the in-memory copy. A failed
/// write leaves the in-memory state exactly as it was.
pub struct PreferenceStore {
    backend: Box<dyn PreferenceBackend>,
    clock: Arc<dyn Clock>,
    preferences: UserPreferences,
    revision: u64,
}

impl PreferenceStore {
    /// Load the stored record, writing defaults on first open
    pub fn open(backend: Box<dyn PreferenceBackend>, clock: Arc<dyn Clock>) -> crate::Result<Self> {
        let preferences = match backend.load()? {
            Some(stored) => {
                debug!(
                    "Loaded preferences ({} followed projects)",
                    stored.followed_projects.len()
                );
                stored
            }
            None => {
                info!("No stored preferences, initialising defaults");
                let defaults = UserPreferences::default();
                backend.save(&defaults)?;
                defaults
            }
        };

        Ok(Self {
            backend,
            clock,
            preferences,
            revision: 0,
        })
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    /// Bumped after every successful write
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_following(&self, project_id: &str) -> bool {
        self.preferences.is_following(project_id)
    }

    pub fn last_checked(&self, project_id: &str) -> Option<DateTime<Utc>> {
        self.preferences.followed(project_id).map(|p| p.last_checked)
    }

    /// Start following a project. Returns false if it already was followed.
    pub fn follow(&mut self, project_id: &str) -> crate::Result<bool> {
        if self.is_following(project_id) {
            return Ok(false);
        }

        let mut next = self.preferences.clone();
        next.followed_projects.push(FollowedProject {
            id: project_id.to_string(),
            last_checked: self.clock.now(),
        });
        self.commit(next)?;
        info!("Following project {}", project_id);
        Ok(true)
    }

    /// Stop following a project. Returns false if it was not followed.
    pub fn unfollow(&mut self, project_id: &str) -> crate::Result<bool> {
        if !self.is_following(project_id) {
            return Ok(false);
        }

        let mut next = self.preferences.clone();
        next.followed_projects.retain(|p| p.id != project_id);
        self.commit(next)?;
        info!("Unfollowed project {}", project_id);
        Ok(true)
    }

    /// Move a followed project's watermark to now. Never moves it backwards.
    pub fn update_last_checked(&mut self, project_id: &str) -> crate::Result<bool> {
        if !self.is_following(project_id) {
            return Ok(false);
        }

        let now = self.clock.now();
        let mut next = self.preferences.clone();
        for followed in next.followed_projects.iter_mut().filter(|p| p.id == project_id) {
            followed.last_checked = followed.last_checked.max(now);
        }
        self.commit(next)?;
        debug!("Advanced watermark of {} to {}", project_id, now);
        Ok(true)
    }

    pub fn set_theme(&mut self, theme: ThemePreference) -> crate::Result<()> {
        let next = UserPreferences {
            theme,
            ..self.preferences.clone()
        };
        self.commit(next)
    }

    pub fn set_reduced_motion(&mut self, reduced_motion: bool) -> crate::Result<()> {
        let next = UserPreferences {
            reduced_motion,
            ..self.preferences.clone()
        };
        self.commit(next)
    }

    fn commit(&mut self, next: UserPreferences) -> crate::Result<()> {
        self.backend.save(&next)?;
        self.preferences = next;
        self.revision += 1;
        Ok(())
    }
}
