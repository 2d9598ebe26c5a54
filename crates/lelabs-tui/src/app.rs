// TUI application state and event handling
use lelabs_core::gallery::{self, YourNews};
use lelabs_core::models::{LabsData, NewsItem, Project, ProjectStatus, TileSize};
use lelabs_core::routes::{self, PageView};
use lelabs_core::{
    CatalogProvider, ClickOutcome, Clock, Face, Notification, NotificationCenter,
    PreferenceStore, ProjectFilter, Route, SnapshotSource, Theme, ThemePreference, Tile, TileSpec,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,        // Moving around the gallery
    Notifications, // Notification panel has focus
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Home,
    Gallery,
    YourNews,
    Detail(String),
}

/// A project tile placed in the gallery grid
#[derive(Debug, Clone)]
pub struct GalleryTile {
    pub project_id: String,
    pub span: u8,
    pub size: TileSize,
    pub tile: Tile,
}

/// A news tile on the home view
#[derive(Debug, Clone)]
pub struct NewsTile {
    pub news_id: String,
    pub span: u8,
    pub size: TileSize,
    pub tile: Tile,
}

/// What activating the selected tile asks the runner to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Navigated,
    OpenUrl(String),
    Nothing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub view: View,
    pub tiles: Vec<GalleryTile>,
    pub selected_index: usize,
    pub news_tiles: Vec<NewsTile>,
    pub news_index: usize,
    /// Where each visible tile was last drawn, for mouse hit-testing
    pub tile_areas: Vec<(usize, Rect)>,
    pub notification_index: usize,
    pub filter: ProjectFilter,
    pub theme: Theme,
    pub error_message: Option<String>,
    pub status_message: Option<String>,
    catalog: CatalogProvider,
    preferences: PreferenceStore,
    notifications: NotificationCenter,
    clock: Arc<dyn Clock>,
    rng: StdRng,
}

impl App {
    pub fn new(
        catalog: CatalogProvider,
        preferences: PreferenceStore,
        notifications: NotificationCenter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let theme = Theme::for_preference(preferences.preferences().theme);
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            view: View::Gallery,
            tiles: Vec::new(),
            selected_index: 0,
            news_tiles: Vec::new(),
            news_index: 0,
            tile_areas: Vec::new(),
            notification_index: 0,
            filter: ProjectFilter::default(),
            theme,
            error_message: None,
            status_message: None,
            catalog,
            preferences,
            notifications,
            clock,
            rng: StdRng::from_entropy(),
        }
    }

    /// Pin tile randomness (face, transition, rotation) to a seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn catalog(&self) -> Option<&LabsData> {
        self.catalog.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.catalog.is_loading()
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    pub fn notifications(&self) -> &[Notification] {
        self.notifications.notifications()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.unread_count()
    }

    pub fn has_unread_for(&self, project_id: &str) -> bool {
        self.notifications.has_unread_for(project_id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.catalog().and_then(|c| c.project(id))
    }

    pub fn news_item(&self, id: &str) -> Option<&NewsItem> {
        self.catalog().and_then(|c| c.news_item(id))
    }

    pub fn selected_tile(&self) -> Option<&GalleryTile> {
        self.tiles.get(self.selected_index)
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.selected_tile().and_then(|t| self.project(&t.project_id))
    }

    pub fn your_news(&self) -> YourNews {
        match self.catalog() {
            Some(data) => gallery::your_news(data, self.preferences.preferences()),
            None => YourNews::NothingNew,
        }
    }

    /// First load of the catalog
    pub async fn load(&mut self) {
        let outcome = self.catalog.load().await;
        self.after_load(outcome);
    }

    pub async fn refresh(&mut self) {
        let outcome = self.catalog.refresh().await;
        self.after_load(outcome);
    }

    fn after_load(&mut self, outcome: Result<SnapshotSource, lelabs_core::CatalogError>) {
        match outcome {
            Ok(SnapshotSource::Primary) => {
                self.error_message = None;
                self.status_message = Some("Catalog up to date".to_string());
            }
            Ok(SnapshotSource::Fallback) => {
                self.error_message = None;
                self.status_message = Some("Offline: showing the bundled snapshot".to_string());
            }
            Err(e) => {
                self.error_message = Some(format!("Could not load projects: {}", e));
            }
        }
        self.rebuild_tiles(Instant::now());
        self.sync_notifications();
    }

    /// Re-mount every gallery and news tile from the current snapshot and filter
    pub fn rebuild_tiles(&mut self, now: Instant) {
        let Some(data) = self.catalog.data() else {
            self.tiles.clear();
            self.news_tiles.clear();
            return;
        };
        let reduced = self.preferences.preferences().reduced_motion;
        let projects = self.filter.apply(&data.projects, self.preferences.preferences());

        let rng = &mut self.rng;
        self.tiles = gallery::layout(&projects)
            .into_iter()
            .map(|item| GalleryTile {
                project_id: item.project.id.clone(),
                span: item.span,
                size: item.size,
                tile: Tile::mount(
                    TileSpec::for_project(item.project).reduced_motion(reduced),
                    item.project.tile_styles.clone(),
                    now,
                    &mut *rng,
                ),
            })
            .collect();

        self.news_tiles = gallery::home_view(&data)
            .latest_news
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let span = gallery::column_span(index);
                NewsTile {
                    news_id: item.id.clone(),
                    span,
                    size: TileSize::from_column_span(span),
                    tile: Tile::mount(
                        TileSpec::for_news(item).reduced_motion(reduced),
                        item.tile_styles.clone(),
                        now,
                        &mut *rng,
                    ),
                }
            })
            .collect();

        if self.selected_index >= self.tiles.len() {
            self.selected_index = self.tiles.len().saturating_sub(1);
        }
        if self.news_index >= self.news_tiles.len() {
            self.news_index = self.news_tiles.len().saturating_sub(1);
        }
        debug!(
            "Mounted {} gallery tiles and {} news tiles",
            self.tiles.len(),
            self.news_tiles.len()
        );
    }

    /// Drive tile rotation. Returns true when any face changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for gallery_tile in &mut self.tiles {
            changed |= gallery_tile.tile.tick(now, &mut self.rng);
        }
        for news_tile in &mut self.news_tiles {
            changed |= news_tile.tile.tick(now, &mut self.rng);
        }
        changed
    }

    pub fn sync_notifications(&mut self) {
        let Some(data) = self.catalog.data() else {
            return;
        };
        let now = self.clock.now();
        self.notifications
            .sync(&data, self.catalog.generation(), &self.preferences, now);

        let len = self.notifications.notifications().len();
        if self.notification_index >= len {
            self.notification_index = len.saturating_sub(1);
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Selection cursor and tile count of the view on screen
    fn cursor(&mut self) -> (&mut usize, usize) {
        match self.view {
            View::Home => (&mut self.news_index, self.news_tiles.len()),
            _ => (&mut self.selected_index, self.tiles.len()),
        }
    }

    pub fn next_tile(&mut self) {
        let (index, len) = self.cursor();
        if len > 0 {
            *index = (*index + 1) % len;
        }
    }

    pub fn previous_tile(&mut self) {
        let (index, len) = self.cursor();
        if len > 0 {
            *index = index.checked_sub(1).unwrap_or(len - 1);
        }
    }

    pub fn flip_selected(&mut self) {
        let tile = match self.view {
            View::Home => self.news_tiles.get_mut(self.news_index).map(|t| &mut t.tile),
            _ => self.tiles.get_mut(self.selected_index).map(|t| &mut t.tile),
        };
        if let Some(tile) = tile {
            tile.flip();
        }
    }

    /// Select whatever tile was drawn under a mouse click and activate it
    pub fn click_at(&mut self, column: u16, row: u16) -> Activation {
        let hit = self
            .tile_areas
            .iter()
            .find(|(_, area)| {
                column >= area.x && column < area.right() && row >= area.y && row < area.bottom()
            })
            .map(|(index, _)| *index);

        let Some(hit) = hit else {
            return Activation::Nothing;
        };
        let (index, len) = self.cursor();
        if hit >= len {
            return Activation::Nothing;
        }
        *index = hit;
        self.activate_selected()
    }

    /// Activate the selected tile the way a click would
    pub fn activate_selected(&mut self) -> Activation {
        if self.view == View::Home {
            // news tiles have no destination of their own
            return match self.news_tiles.get(self.news_index).map(|t| t.tile.click()) {
                Some(ClickOutcome::Navigate(path)) => {
                    let route = Route::parse(path);
                    self.navigate(&route);
                    Activation::Navigated
                }
                _ => Activation::Nothing,
            };
        }

        let Some(gallery_tile) = self.tiles.get(self.selected_index) else {
            return Activation::Nothing;
        };

        match gallery_tile.tile.click() {
            ClickOutcome::Navigate(path) => {
                let route = Route::parse(path);
                self.navigate(&route);
                Activation::Navigated
            }
            ClickOutcome::Inert if gallery_tile.tile.current_face() == Face::Links => self
                .project(&gallery_tile.project_id)
                .and_then(|p| p.link_entries().first().map(|(_, url)| url.to_string()))
                .map(Activation::OpenUrl)
                .unwrap_or(Activation::Nothing),
            ClickOutcome::Custom | ClickOutcome::Inert => Activation::Nothing,
        }
    }

    /// Resolve a route as a visit and switch to its view
    pub fn navigate(&mut self, route: &Route) {
        let Some(data) = self.catalog.data() else {
            return;
        };

        self.view = match routes::visit(route, &data, &mut self.preferences) {
            PageView::ProjectDetail(project) => View::Detail(project.id.clone()),
            PageView::YourNews => View::YourNews,
            PageView::Home(_) => View::Home,
            PageView::NotFound => {
                self.error_message = Some(format!("Page not found: {}", route));
                View::Gallery
            }
            _ => View::Gallery,
        };
        self.sync_notifications();
    }

    pub fn show_home(&mut self) {
        self.navigate(&Route::Home);
    }

    pub fn show_gallery(&mut self) {
        self.view = View::Gallery;
    }

    pub fn show_your_news(&mut self) {
        self.navigate(&Route::YourNews);
    }

    pub fn toggle_follow_selected(&mut self) {
        let Some(project_id) = self.current_project_id() else {
            return;
        };

        let result = if self.preferences.is_following(&project_id) {
            self.preferences
                .unfollow(&project_id)
                .map(|_| format!("Unfollowed {}", project_id))
        } else {
            self.preferences
                .follow(&project_id)
                .map(|_| format!("Following {}", project_id))
        };

        match result {
            Ok(message) => self.status_message = Some(message),
            Err(e) => {
                warn!("Failed to update follows: {}", e);
                self.error_message = Some(format!("Could not save preferences: {}", e));
            }
        }

        if self.filter.followed_only {
            self.rebuild_tiles(Instant::now());
        }
        self.sync_notifications();
    }

    /// The project on screen: the open detail page, else the selected tile
    fn current_project_id(&self) -> Option<String> {
        match &self.view {
            View::Detail(id) => Some(id.clone()),
            View::Gallery => self.selected_tile().map(|t| t.project_id.clone()),
            View::Home | View::YourNews => None,
        }
    }

    pub fn toggle_reduced_motion(&mut self) {
        let reduced = !self.preferences.preferences().reduced_motion;
        if let Err(e) = self.preferences.set_reduced_motion(reduced) {
            warn!("Failed to save motion preference: {}", e);
            self.error_message = Some(format!("Could not save preferences: {}", e));
            return;
        }

        let now = Instant::now();
        for gallery_tile in &mut self.tiles {
            gallery_tile.tile.set_reduced_motion(reduced, now, &mut self.rng);
        }
        for news_tile in &mut self.news_tiles {
            news_tile.tile.set_reduced_motion(reduced, now, &mut self.rng);
        }
        self.status_message = Some(if reduced {
            "Reduced motion on".to_string()
        } else {
            "Reduced motion off".to_string()
        });
    }

    pub fn toggle_theme(&mut self) {
        let next = match self.preferences.preferences().theme {
            ThemePreference::Default => ThemePreference::HighContrast,
            ThemePreference::HighContrast => ThemePreference::Default,
        };
        match self.preferences.set_theme(next) {
            Ok(()) => self.theme = Theme::for_preference(next),
            Err(e) => {
                warn!("Failed to save theme: {}", e);
                self.error_message = Some(format!("Could not save preferences: {}", e));
            }
        }
    }

    /// all -> planning -> active -> paused -> completed -> all
    pub fn cycle_status_filter(&mut self) {
        let statuses = ProjectStatus::all();
        let next = match self.filter.status {
            None => Some(statuses[0]),
            Some(current) => statuses
                .iter()
                .position(|s| *s == current)
                .and_then(|i| statuses.get(i + 1).copied()),
        };
        self.filter.status = next;
        self.rebuild_tiles(Instant::now());
    }

    /// all -> each tag in first-seen order -> all
    pub fn cycle_tag_filter(&mut self) {
        let Some(data) = self.catalog.data() else {
            return;
        };
        let tags = gallery::unique_tags(&data.projects);
        let current = self.filter.tag.as_deref().unwrap_or("all");
        let next = tags
            .iter()
            .position(|t| t == current)
            .and_then(|i| tags.get(i + 1))
            .cloned();

        self.filter.tag = next;
        self.rebuild_tiles(Instant::now());
    }

    pub fn toggle_followed_only(&mut self) {
        self.filter.followed_only = !self.filter.followed_only;
        self.rebuild_tiles(Instant::now());
    }

    pub fn toggle_notifications(&mut self) {
        self.input_mode = match self.input_mode {
            InputMode::Normal => InputMode::Notifications,
            InputMode::Notifications => InputMode::Normal,
        };
    }

    pub fn next_notification(&mut self) {
        let len = self.notifications.notifications().len();
        if len > 0 {
            self.notification_index = (self.notification_index + 1) % len;
        }
    }

    pub fn previous_notification(&mut self) {
        let len = self.notifications.notifications().len();
        if len > 0 {
            self.notification_index = self.notification_index.checked_sub(1).unwrap_or(len - 1);
        }
    }

    fn selected_notification_id(&self) -> Option<String> {
        self.notifications
            .notifications()
            .get(self.notification_index)
            .map(|n| n.id.clone())
    }

    pub fn mark_selected_read(&mut self) {
        let Some(id) = self.selected_notification_id() else {
            return;
        };
        if let Err(e) = self.notifications.mark_as_read(&id, &mut self.preferences) {
            warn!("Failed to record read state: {}", e);
            self.error_message = Some(format!("Could not save preferences: {}", e));
        }
        self.sync_notifications();
    }

    pub fn mark_all_read(&mut self) {
        match self.notifications.mark_all_as_read(&mut self.preferences) {
            Ok(projects) => debug!("Marked notifications of {} project(s) read", projects),
            Err(e) => {
                warn!("Failed to record read state: {}", e);
                self.error_message = Some(format!("Could not save preferences: {}", e));
            }
        }
        self.sync_notifications();
    }

    pub fn dismiss_selected(&mut self) {
        let Some(id) = self.selected_notification_id() else {
            return;
        };
        if let Err(e) = self.notifications.dismiss(&id, &mut self.preferences) {
            warn!("Failed to record dismissal: {}", e);
            self.error_message = Some(format!("Could not save preferences: {}", e));
        }
        self.sync_notifications();
    }
}
