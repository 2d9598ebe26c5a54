// Gallery and feed composition over a catalog snapshot
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{LabsData, NewsItem, Page, Project, ProjectStatus, TileSize, TileStyles};
use crate::notifications::notification_id;
use crate::preferences::UserPreferences;

/// Followed, and at least one update is newer than the watermark
pub fn has_new_updates(project: &Project, preferences: &UserPreferences) -> bool {
    preferences
        .followed(&project.id)
        .map(|f| project.updates.iter().any(|u| u.date > f.last_checked))
        .unwrap_or(false)
}

/// An unread project update dressed up as a news item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub title: String,
    pub summary: String,
    pub image: Option<String>,
    pub tile_styles: TileStyles,
    pub project_id: String,
    pub project_slug: String,
}

/// The personal feed
#[derive(Debug, Clone, PartialEq)]
pub enum YourNews {
    NotFollowing,
    NothingNew,
    Updates(Vec<NewsEntry>),
}

/// Unread updates of followed projects, newest first
pub fn your_news(catalog: &LabsData, preferences: &UserPreferences) -> YourNews {
    if preferences.followed_projects.is_empty() {
        return YourNews::NotFollowing;
    }

    let mut entries: Vec<NewsEntry> = catalog
        .projects
        .iter()
        .filter_map(|project| preferences.followed(&project.id).map(|f| (project, f)))
        .flat_map(|(project, followed)| {
            project
                .updates
                .iter()
                .filter(move |u| u.date > followed.last_checked)
                .map(move |u| NewsEntry {
                    id: notification_id(&project.id, u),
                    date: u.date,
                    title: format!("{}: {}", project.title, u.title),
                    summary: u.content.clone(),
                    image: project.image.clone(),
                    tile_styles: project.tile_styles.clone(),
                    project_id: project.id.clone(),
                    project_slug: project.slug.clone(),
                })
        })
        .collect();

    if entries.is_empty() {
        return YourNews::NothingNew;
    }
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    YourNews::Updates(entries)
}

/// Project list filters; `None` means "all"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub tag: Option<String>,
    pub followed_only: bool,
}

impl ProjectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: Option<ProjectStatus>) -> Self {
        self.status = status;
        self
    }

    /// `"all"` clears the tag filter
    pub fn tag(mut self, tag: Option<impl Into<String>>) -> Self {
        self.tag = tag.map(Into::into).filter(|t: &String| t.as_str() != "all");
        self
    }

    pub fn followed_only(mut self, followed_only: bool) -> Self {
        self.followed_only = followed_only;
        self
    }

    pub fn matches(&self, project: &Project, preferences: &UserPreferences) -> bool {
        if let Some(status) = self.status {
            if project.status != status {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !project.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        !self.followed_only || preferences.is_following(&project.id)
    }

    pub fn apply<'a>(&self, projects: &'a [Project], preferences: &UserPreferences) -> Vec<&'a Project> {
        projects
            .iter()
            .filter(|p| self.matches(p, preferences))
            .collect()
    }
}

/// `all` followed by every tag in first-seen order
pub fn unique_tags(projects: &[Project]) -> Vec<String> {
    let mut tags = vec!["all".to_string()];
    for tag in projects.iter().flat_map(|p| p.tags.iter()) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

const SPAN_CYCLE: [u8; 12] = [12, 6, 4, 4, 4, 3, 3, 6, 3, 3, 8, 4];

/// Column span (out of 12) for the tile at `index` in the gallery
pub fn column_span(index: usize) -> u8 {
    if index > 0 && index % 23 == 0 {
        return 12;
    }
    SPAN_CYCLE[index % SPAN_CYCLE.len()]
}

/// One placed tile in the project gallery
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalleryItem<'a> {
    pub project: &'a Project,
    pub span: u8,
    pub size: TileSize,
}

pub fn layout<'a>(projects: &[&'a Project]) -> Vec<GalleryItem<'a>> {
    projects
        .iter()
        .copied()
        .enumerate()
        .map(|(index, project)| {
            let span = column_span(index);
            GalleryItem {
                project,
                span,
                size: TileSize::from_column_span(span),
            }
        })
        .collect()
}

/// Landing page content
#[derive(Debug, Clone)]
pub struct HomeView<'a> {
    pub page: &'a Page,
    pub featured: Vec<&'a Project>,
    pub latest_news: Vec<&'a NewsItem>,
}

pub fn home_view(catalog: &LabsData) -> HomeView<'_> {
    let mut latest_news: Vec<&NewsItem> = catalog.news.iter().collect();
    latest_news.sort_by(|a, b| b.date.cmp(&a.date));

    HomeView {
        page: &catalog.pages.home,
        featured: catalog.projects.iter().filter(|p| p.featured).collect(),
        latest_news,
    }
}
