use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::hash::update_hash;
use crate::models::{LabsData, ProjectUpdate};
use crate::preferences::{PreferenceStore, UserPreferences};

/// An update on a followed project the user has not caught up on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// `<projectId>-<hash>`
    pub id: String,
    pub project_id: String,
    pub project_title: String,
    pub update: ProjectUpdate,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

/// What dismissing a notification does to the project's watermark
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DismissPolicy {
    /// Leave the watermark alone; the update may come back after a restart
    #[default]
    RemindLater,
    /// Advance the watermark as if the notification had been read
    Acknowledge,
}

impl DismissPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "remind-later" | "remind_later" => Some(DismissPolicy::RemindLater),
            "acknowledge" => Some(DismissPolicy::Acknowledge),
            _ => None,
        }
    }
}

/// `<projectId>-<hash>` where the hash covers the id, title and date.
/// The hash shipped in the catalog is not used.
pub fn notification_id(project_id: &str, update: &ProjectUpdate) -> String {
    let date = update.date.to_rfc3339_opts(SecondsFormat::Secs, true);
    format!("{}-{}", project_id, update_hash(project_id, &update.title, &date))
}

/// Pending notifications for the given catalog and preferences
///
/// Pure: one entry per update newer than the owning project's watermark, in
/// followed-project order, then update order. Followed ids that no longer
/// exist in the catalog are skipped.
pub fn derive_pending(
    catalog: &LabsData,
    preferences: &UserPreferences,
    now: DateTime<Utc>,
) -> Vec<Notification> {
    let mut pending = Vec::new();

    for followed in &preferences.followed_projects {
        let Some(project) = catalog.project(&followed.id) else {
            debug!("Followed project {} is not in the catalog", followed.id);
            continue;
        };

        for update in project.updates.iter().filter(|u| u.date > followed.last_checked) {
            pending.push(Notification {
                id: notification_id(&project.id, update),
                project_id: project.id.clone(),
                project_title: project.title.clone(),
                update: update.clone(),
                read: false,
                timestamp: now,
            });
        }
    }

    pending
}

/// In-process notification set
///
/// Notifications are never persisted. Dismissed ids are remembered for the
/// life of the process so they cannot be re-derived.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    notifications: Vec<Notification>,
    dismissed: HashSet<String>,
    policy: DismissPolicy,
    last_inputs: Option<(u64, u64)>,
}

impl NotificationCenter {
    pub fn new(policy: DismissPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> DismissPolicy {
        self.policy
    }

    /// Re-derive if the catalog generation or preference revision moved.
    /// Returns how many notifications were added.
    pub fn sync(
        &mut self,
        catalog: &LabsData,
        generation: u64,
        preferences: &PreferenceStore,
        now: DateTime<Utc>,
    ) -> usize {
        let inputs = (generation, preferences.revision());
        if self.last_inputs == Some(inputs) {
            return 0;
        }
        self.last_inputs = Some(inputs);
        self.derive(catalog, preferences.preferences(), now)
    }

    /// Unmemoised derivation pass. New entries are prepended as one block.
    pub fn derive(
        &mut self,
        catalog: &LabsData,
        preferences: &UserPreferences,
        now: DateTime<Utc>,
    ) -> usize {
        // Two updates can hash to the same id; keep the first of each
        let mut seen: HashSet<String> = self.notifications.iter().map(|n| n.id.clone()).collect();
        let mut fresh: Vec<Notification> = derive_pending(catalog, preferences, now)
            .into_iter()
            .filter(|n| !self.dismissed.contains(&n.id) && seen.insert(n.id.clone()))
            .collect();

        let added = fresh.len();
        if added > 0 {
            info!("{} new notification(s)", added);
            fresh.append(&mut self.notifications);
            self.notifications = fresh;
        }
        added
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn has_unread_for(&self, project_id: &str) -> bool {
        self.notifications
            .iter()
            .any(|n| !n.read && n.project_id == project_id)
    }

    /// Mark one notification read and advance its project's watermark.
    /// Unknown ids are ignored.
    pub fn mark_as_read(&mut self, id: &str, preferences: &mut PreferenceStore) -> crate::Result<bool> {
        let Some(notification) = self.notifications.iter_mut().find(|n| n.id == id) else {
            debug!("mark_as_read: no notification {}", id);
            return Ok(false);
        };
        // Watermark first: a failed write leaves the entry unread
        preferences.update_last_checked(&notification.project_id)?;
        notification.read = true;
        Ok(true)
    }

    /// Mark everything read, advancing each distinct project once.
    /// Every project is attempted; only projects whose watermark was saved
    /// are marked read, and the first storage error is returned.
    pub fn mark_all_as_read(&mut self, preferences: &mut PreferenceStore) -> crate::Result<usize> {
        let mut projects: Vec<String> = Vec::new();
        for notification in &self.notifications {
            if !projects.contains(&notification.project_id) {
                projects.push(notification.project_id.clone());
            }
        }

        let mut first_error = None;
        let mut advanced: HashSet<&str> = HashSet::new();
        for project_id in &projects {
            match preferences.update_last_checked(project_id) {
                Ok(_) => {
                    advanced.insert(project_id.as_str());
                }
                Err(e) => {
                    warn!("Failed to advance watermark for {}: {}", project_id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        for notification in &mut self.notifications {
            if advanced.contains(notification.project_id.as_str()) {
                notification.read = true;
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(projects.len()),
        }
    }

    /// Remove a notification for good (for this process)
    pub fn dismiss(&mut self, id: &str, preferences: &mut PreferenceStore) -> crate::Result<bool> {
        let Some(index) = self.notifications.iter().position(|n| n.id == id) else {
            return Ok(false);
        };
        let removed = self.notifications.remove(index);
        self.dismissed.insert(removed.id.clone());

        if self.policy == DismissPolicy::Acknowledge {
            preferences.update_last_checked(&removed.project_id)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::models::{Project, ProjectStatus, TileStyles};
    use crate::preferences::{FollowedProject, MemoryBackend, MockPreferenceBackend};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn project(id: &str, updates: Vec<ProjectUpdate>) -> Project {
        Project {
            id: id.to_string(),
            title: id.to_uppercase(),
            slug: id.to_string(),
            status: ProjectStatus::Active,
            featured: false,
            hash: String::new(),
            description: String::new(),
            summary: String::new(),
            tags: vec![],
            last_updated: None,
            image: None,
            tile_styles: TileStyles::default(),
            updates,
            links: None,
        }
    }

    fn update(title: &str, date: DateTime<Utc>) -> ProjectUpdate {
        ProjectUpdate {
            hash: format!("src-{}", title),
            date,
            title: title.to_string(),
            content: String::new(),
        }
    }

    fn catalog(projects: Vec<Project>) -> LabsData {
        LabsData {
            meta: Default::default(),
            projects,
            news: vec![],
            pages: Default::default(),
        }
    }

    fn store(clock: Arc<ManualClock>) -> PreferenceStore {
        PreferenceStore::open(Box::new(MemoryBackend::new()), clock).unwrap()
    }

    #[test]
    fn test_only_updates_after_watermark_are_pending() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock.clone());
        prefs.follow("p1").unwrap();

        let data = catalog(vec![project(
            "p1",
            vec![
                update("old", t0() - Duration::hours(1)),
                update("same", t0()),
                update("new", t0() + Duration::hours(1)),
            ],
        )]);

        let pending = derive_pending(&data, prefs.preferences(), t0());
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].update.title, "new");
        assert!(pending[0].id.starts_with("p1-"));
    }

    #[test]
    fn test_unfollowed_and_missing_projects_are_ignored() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock);
        prefs.follow("ghost").unwrap();

        let data = catalog(vec![project("p2", vec![update("x", t0() + Duration::days(1))])]);
        assert!(derive_pending(&data, prefs.preferences(), t0()).is_empty());
    }

    #[test]
    fn test_rederiving_never_duplicates() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock);
        prefs.follow("p1").unwrap();
        let data = catalog(vec![project("p1", vec![update("u", t0() + Duration::hours(1))])]);

        let mut center = NotificationCenter::default();
        assert_eq!(center.derive(&data, prefs.preferences(), t0()), 1);
        assert_eq!(center.derive(&data, prefs.preferences(), t0()), 0);
        assert_eq!(center.derive(&data, prefs.preferences(), t0()), 0);
        assert_eq!(center.notifications().len(), 1);
    }

    #[test]
    fn test_new_block_is_prepended_in_source_order() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock);
        prefs.follow("p1").unwrap();
        prefs.follow("p2").unwrap();

        let mut center = NotificationCenter::default();
        let first = catalog(vec![project("p1", vec![update("a", t0() + Duration::hours(1))])]);
        center.derive(&first, prefs.preferences(), t0());

        let second = catalog(vec![
            project(
                "p1",
                vec![
                    update("a", t0() + Duration::hours(1)),
                    update("b", t0() + Duration::hours(2)),
                ],
            ),
            project("p2", vec![update("c", t0() + Duration::hours(3))]),
        ]);
        assert_eq!(center.derive(&second, prefs.preferences(), t0()), 2);

        let titles: Vec<_> = center
            .notifications()
            .iter()
            .map(|n| n.update.title.as_str())
            .collect();
        assert_eq!(titles, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sync_is_memoised_on_inputs() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock);
        prefs.follow("p1").unwrap();
        let data = catalog(vec![project("p1", vec![update("u", t0() + Duration::hours(1))])]);

        let mut center = NotificationCenter::default();
        assert_eq!(center.sync(&data, 1, &prefs, t0()), 1);

        // same inputs: derivation is skipped entirely
        let mut more = data.clone();
        more.projects[0]
            .updates
            .push(update("v", t0() + Duration::hours(2)));
        assert_eq!(center.sync(&more, 1, &prefs, t0()), 0);

        // new generation: picked up
        assert_eq!(center.sync(&more, 2, &prefs, t0()), 1);
    }

    #[test]
    fn test_mark_as_read_is_idempotent() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock.clone());
        prefs.follow("p1").unwrap();
        let data = catalog(vec![project("p1", vec![update("u", t0() + Duration::hours(1))])]);

        let mut center = NotificationCenter::default();
        center.derive(&data, prefs.preferences(), t0());
        let id = center.notifications()[0].id.clone();

        clock.set(t0() + Duration::hours(2));
        assert!(center.mark_as_read(&id, &mut prefs).unwrap());
        let after_first = prefs.last_checked("p1");
        let state_first = center.notifications().to_vec();

        assert!(center.mark_as_read(&id, &mut prefs).unwrap());
        assert_eq!(center.notifications(), state_first.as_slice());
        assert_eq!(prefs.last_checked("p1"), after_first);
        assert_eq!(center.unread_count(), 0);
    }

    #[test]
    fn test_mark_unknown_id_is_noop() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock);
        let mut center = NotificationCenter::default();
        assert!(!center.mark_as_read("nope", &mut prefs).unwrap());
        assert!(!center.dismiss("nope", &mut prefs).unwrap());
        assert_eq!(prefs.revision(), 0);
    }

    #[test]
    fn test_dismiss_removes_unread_and_blocks_rederivation() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock);
        prefs.follow("p1").unwrap();
        let data = catalog(vec![project("p1", vec![update("u", t0() + Duration::hours(1))])]);

        let mut center = NotificationCenter::default();
        center.derive(&data, prefs.preferences(), t0());
        assert_eq!(center.unread_count(), 1);

        let id = center.notifications()[0].id.clone();
        assert!(center.dismiss(&id, &mut prefs).unwrap());
        assert_eq!(center.unread_count(), 0);
        assert!(center.get(&id).is_none());

        // remind-later leaves the watermark, but the same process never shows it again
        assert_eq!(prefs.last_checked("p1"), Some(t0()));
        assert_eq!(center.derive(&data, prefs.preferences(), t0()), 0);
    }

    #[test]
    fn test_acknowledge_policy_advances_watermark() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock.clone());
        prefs.follow("p1").unwrap();
        let data = catalog(vec![project("p1", vec![update("u", t0() + Duration::hours(1))])]);

        let mut center = NotificationCenter::new(DismissPolicy::Acknowledge);
        center.derive(&data, prefs.preferences(), t0());
        let id = center.notifications()[0].id.clone();

        clock.set(t0() + Duration::hours(2));
        center.dismiss(&id, &mut prefs).unwrap();
        assert_eq!(prefs.last_checked("p1"), Some(t0() + Duration::hours(2)));

        // a fresh process would not resurrect it either
        assert!(derive_pending(&data, prefs.preferences(), clock.now()).is_empty());
    }

    #[test]
    fn test_follow_update_mark_all_scenario() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock.clone());
        prefs.follow("p1").unwrap();

        let data = catalog(vec![project("p1", vec![update("ship", t0() + Duration::hours(1))])]);
        let mut center = NotificationCenter::default();

        clock.set(t0() + Duration::hours(2));
        assert_eq!(center.sync(&data, 1, &prefs, clock.now()), 1);
        assert_eq!(center.unread_count(), 1);
        assert_eq!(center.notifications()[0].project_id, "p1");
        assert!(!center.notifications()[0].read);

        assert_eq!(center.mark_all_as_read(&mut prefs).unwrap(), 1);
        assert!(center.notifications()[0].read);
        assert_eq!(prefs.last_checked("p1"), Some(t0() + Duration::hours(2)));

        clock.set(t0() + Duration::hours(3));
        assert_eq!(center.sync(&data, 1, &prefs, clock.now()), 0);
        assert_eq!(center.notifications().len(), 1);
        assert!(center.notifications()[0].read);
    }

    #[test]
    fn test_mark_all_advances_each_project_once() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock.clone());
        prefs.follow("p1").unwrap();
        prefs.follow("p2").unwrap();
        let data = catalog(vec![
            project(
                "p1",
                vec![
                    update("a", t0() + Duration::hours(1)),
                    update("b", t0() + Duration::hours(2)),
                ],
            ),
            project("p2", vec![update("c", t0() + Duration::hours(1))]),
        ]);

        let mut center = NotificationCenter::default();
        center.derive(&data, prefs.preferences(), t0());
        let before = prefs.revision();

        clock.set(t0() + Duration::hours(4));
        assert_eq!(center.mark_all_as_read(&mut prefs).unwrap(), 2);
        assert_eq!(prefs.revision(), before + 2);
        assert!(!center.has_unread_for("p1"));
        assert!(!center.has_unread_for("p2"));
    }

    #[test]
    fn test_update_hash_ignores_shipped_hash() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock);
        prefs.follow("p1").unwrap();

        let mut a = update("u", t0() + Duration::hours(1));
        let mut b = a.clone();
        a.hash = "one".into();
        b.hash = "two".into();

        let first = derive_pending(&catalog(vec![project("p1", vec![a])]), prefs.preferences(), t0());
        let second = derive_pending(&catalog(vec![project("p1", vec![b])]), prefs.preferences(), t0());
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn test_colliding_update_ids_materialise_once() {
        let clock = Arc::new(ManualClock::new(t0()));
        let mut prefs = store(clock.clone());
        prefs.follow("p1").unwrap();

        let mut a = update("Release", t0() + Duration::hours(1));
        let mut b = a.clone();
        a.content = "a".into();
        b.content = "b".into();
        let data = catalog(vec![project("p1", vec![a, b])]);

        let mut center = NotificationCenter::default();
        assert_eq!(center.derive(&data, prefs.preferences(), t0()), 1);
        assert_eq!(center.notifications().len(), 1);

        let id = center.notifications()[0].id.clone();
        clock.set(t0() + Duration::hours(2));
        center.mark_as_read(&id, &mut prefs).unwrap();
        assert_eq!(center.unread_count(), 0);
    }

    fn failing_store() -> PreferenceStore {
        let mut backend = MockPreferenceBackend::new();
        backend.expect_load().returning(|| {
            Ok(Some(UserPreferences {
                followed_projects: vec![FollowedProject {
                    id: "p1".to_string(),
                    last_checked: t0(),
                }],
                ..UserPreferences::default()
            }))
        });
        backend.expect_save().returning(|_| {
            Err(crate::Error::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        });
        let clock = Arc::new(ManualClock::new(t0() + Duration::hours(2)));
        PreferenceStore::open(Box::new(backend), clock).unwrap()
    }

    #[test]
    fn test_failed_watermark_write_keeps_notification_unread() {
        let mut prefs = failing_store();
        let data = catalog(vec![project("p1", vec![update("u", t0() + Duration::hours(1))])]);

        let mut center = NotificationCenter::default();
        center.derive(&data, prefs.preferences(), t0());
        let id = center.notifications()[0].id.clone();

        assert!(center.mark_as_read(&id, &mut prefs).is_err());
        assert!(!center.notifications()[0].read);
        assert_eq!(center.unread_count(), 1);
        assert_eq!(prefs.last_checked("p1"), Some(t0()));
    }

    #[test]
    fn test_failed_mark_all_keeps_notifications_unread() {
        let mut prefs = failing_store();
        let data = catalog(vec![project(
            "p1",
            vec![
                update("a", t0() + Duration::hours(1)),
                update("b", t0() + Duration::minutes(90)),
            ],
        )]);

        let mut center = NotificationCenter::default();
        center.derive(&data, prefs.preferences(), t0());

        assert!(center.mark_all_as_read(&mut prefs).is_err());
        assert_eq!(center.unread_count(), 2);
        assert_eq!(prefs.last_checked("p1"), Some(t0()));
    }

    #[test]
    fn test_dismiss_policy_parse() {
        assert_eq!(DismissPolicy::parse("acknowledge"), Some(DismissPolicy::Acknowledge));
        assert_eq!(DismissPolicy::parse("Remind-Later"), Some(DismissPolicy::RemindLater));
        assert_eq!(DismissPolicy::parse("forget"), None);
    }
}
