use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// The whole site snapshot: projects, news and page copy
///
/// Accepts the static JSON shape (camelCase) as well as rows coming out of
/// the queryable store (snake_case), so both sources land in one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabsData {
    #[serde(default)]
    pub meta: Meta,
    pub projects: Vec<Project>,
    #[serde(default)]
    pub news: Vec<NewsItem>,
    #[serde(default)]
    pub pages: Pages,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, alias = "last_updated", deserialize_with = "timestamp::deserialize_opt")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "last_updated", deserialize_with = "timestamp::deserialize_opt")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "non_empty")]
    pub image: Option<String>,
    #[serde(default, alias = "tile_styles")]
    pub tile_styles: TileStyles,
    #[serde(default)]
    pub updates: Vec<ProjectUpdate>,
    #[serde(default)]
    pub links: Option<ProjectLinks>,
}

impl Project {
    /// Link entries in display order, skipping the empty ones
    pub fn link_entries(&self) -> Vec<(&'static str, &str)> {
        self.links
            .as_ref()
            .map(ProjectLinks::entries)
            .unwrap_or_default()
    }

    pub fn has_links(&self) -> bool {
        !self.link_entries().is_empty()
    }

    pub fn latest_update(&self) -> Option<&ProjectUpdate> {
        self.updates.iter().max_by_key(|u| u.date)
    }

    pub fn detail_path(&self) -> String {
        format!("/projects/{}", self.slug)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    Paused,
    Completed,
}

impl ProjectStatus {
    pub fn all() -> [ProjectStatus; 4] {
        [
            ProjectStatus::Planning,
            ProjectStatus::Active,
            ProjectStatus::Paused,
            ProjectStatus::Completed,
        ]
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(raw))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::Active => "active",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Planning => write!(f, "Planning"),
            ProjectStatus::Active => write!(f, "Active"),
            ProjectStatus::Paused => write!(f, "Paused"),
            ProjectStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// One entry in a project's changelog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub hash: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub date: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectLinks {
    pub github: Option<String>,
    pub license: Option<String>,
    pub demo: Option<String>,
    pub video: Option<String>,
    pub documentation: Option<String>,
}

impl ProjectLinks {
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("GitHub", &self.github),
            ("Demo", &self.demo),
            ("Docs", &self.documentation),
            ("Video", &self.video),
            ("License", &self.license),
        ]
        .into_iter()
        .filter_map(|(label, url)| {
            url.as_deref()
                .filter(|u| !u.trim().is_empty())
                .map(|u| (label, u))
        })
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    #[serde(default)]
    pub hash: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub date: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub image: Option<String>,
    #[serde(default, alias = "tile_styles")]
    pub tile_styles: TileStyles,
}

/// Colours and footprint of a tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileStyles {
    pub background: String,
    pub color: String,
    #[serde(default)]
    pub size: TileSize,
}

/// Background of the landing page's lead tile
pub const HERO_BACKGROUND: &str = "#23468C";

impl TileStyles {
    pub fn new(background: impl Into<String>, color: impl Into<String>, size: TileSize) -> Self {
        Self {
            background: background.into(),
            color: color.into(),
            size,
        }
    }

    /// The hero tile is recognised by its footprint and colour, not by a flag
    pub fn is_hero(&self) -> bool {
        self.size == TileSize::Large && self.background.eq_ignore_ascii_case(HERO_BACKGROUND)
    }
}

impl Default for TileStyles {
    fn default() -> Self {
        Self::new("#1E1E2E", "#FFFFFF", TileSize::Medium)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileSize {
    Small,
    #[default]
    Medium,
    Large,
    Wide,
}

impl TileSize {
    /// Gallery column span (out of 12) to tile footprint
    pub fn from_column_span(span: u8) -> Self {
        match span {
            3 => TileSize::Small,
            6 => TileSize::Medium,
            12 => TileSize::Wide,
            _ => TileSize::Large,
        }
    }

    /// Rows of terminal height a tile of this size gets in the gallery
    pub fn height(&self) -> u16 {
        match self {
            TileSize::Small => 7,
            TileSize::Medium => 9,
            TileSize::Large => 11,
            TileSize::Wide => 8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pages {
    #[serde(default)]
    pub home: Page,
    #[serde(default)]
    pub methodology: Page,
    #[serde(default)]
    pub about: Page,
    #[serde(flatten)]
    pub other: BTreeMap<String, Page>,
}

impl Pages {
    pub fn get(&self, name: &str) -> Option<&Page> {
        match name {
            "home" => Some(&self.home),
            "methodology" => Some(&self.methodology),
            "about" => Some(&self.about),
            other => self.other.get(other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub layout: Option<Vec<PageSection>>,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub styles: Option<BTreeMap<String, String>>,
}

impl LabsData {
    /// Parse and normalise a catalog document
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        let mut data: LabsData = serde_json::from_str(raw)
            .map_err(|e| crate::Error::InvalidCatalog(e.to_string()))?;
        data.normalize();
        Ok(data)
    }

    /// Order every project's updates oldest first
    pub fn normalize(&mut self) {
        for project in &mut self.projects {
            project.updates.sort_by_key(|u| u.date);
        }
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_by_slug(&self, slug: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.slug == slug)
    }

    pub fn news_item(&self, id: &str) -> Option<&NewsItem> {
        self.news.iter().find(|n| n.id == id)
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// Lenient timestamp parsing: RFC 3339, naive ISO date-time, or a bare date
pub mod timestamp {
    use super::*;

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw)))
    }

    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            Some(s) if !s.trim().is_empty() => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", s))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bundled_snapshot_parses() {
        let data = LabsData::from_json(crate::catalog::BUNDLED_SNAPSHOT).unwrap();
        assert!(!data.projects.is_empty());
        assert!(!data.news.is_empty());
        assert!(!data.pages.home.title.is_empty());
        assert!(data.projects.iter().any(|p| p.tile_styles.is_hero()));
    }

    #[test]
    fn test_snake_case_rows_are_accepted() {
        let raw = r##"{
            "projects": [{
                "id": "p1", "title": "Row", "slug": "row",
                "last_updated": "2025-02-01",
                "tile_styles": { "background": "#000000", "color": "#ffffff", "size": "wide" },
                "image": ""
            }]
        }"##;
        let data = LabsData::from_json(raw).unwrap();
        let project = &data.projects[0];
        assert_eq!(project.tile_styles.size, TileSize::Wide);
        assert_eq!(
            project.last_updated,
            Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap())
        );
        assert!(project.image.is_none());
        assert!(project.updates.is_empty());
    }

    #[test]
    fn test_missing_projects_is_invalid() {
        let err = LabsData::from_json(r#"{ "news": [] }"#).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidCatalog(_)));
    }

    #[test]
    fn test_updates_are_sorted_by_date() {
        let raw = r##"{
            "projects": [{
                "id": "p1", "title": "T", "slug": "t",
                "tileStyles": { "background": "#111111", "color": "#eeeeee" },
                "updates": [
                    { "hash": "b", "date": "2025-03-02T10:00:00Z", "title": "second" },
                    { "hash": "a", "date": "2025-03-01", "title": "first" }
                ]
            }]
        }"##;
        let data = LabsData::from_json(raw).unwrap();
        let titles: Vec<_> = data.projects[0].updates.iter().map(|u| u.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(data.projects[0].tile_styles.size, TileSize::Medium);
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap();
        assert_eq!(timestamp::parse("2025-01-15T09:30:00Z"), Some(expected));
        assert_eq!(timestamp::parse("2025-01-15T10:30:00+01:00"), Some(expected));
        assert_eq!(timestamp::parse("2025-01-15T09:30:00.000"), Some(expected));
        assert_eq!(
            timestamp::parse("2025-01-15"),
            Some(Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(timestamp::parse("yesterday"), None);
    }

    #[test]
    fn test_link_entries_skip_blanks() {
        let links = ProjectLinks {
            github: Some("https://github.com/le-labs/x".into()),
            license: Some("".into()),
            demo: None,
            video: Some("https://video.example/x".into()),
            documentation: None,
        };
        let entries = links.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "GitHub");
        assert_eq!(entries[1].0, "Video");
    }

    #[test]
    fn test_hero_detection() {
        assert!(TileStyles::new("#23468c", "#fff", TileSize::Large).is_hero());
        assert!(!TileStyles::new("#23468C", "#fff", TileSize::Wide).is_hero());
        assert!(!TileStyles::new("#000000", "#fff", TileSize::Large).is_hero());
    }

    #[test]
    fn test_column_span_to_size() {
        assert_eq!(TileSize::from_column_span(3), TileSize::Small);
        assert_eq!(TileSize::from_column_span(6), TileSize::Medium);
        assert_eq!(TileSize::from_column_span(12), TileSize::Wide);
        assert_eq!(TileSize::from_column_span(4), TileSize::Large);
        assert_eq!(TileSize::from_column_span(8), TileSize::Large);
    }
}
