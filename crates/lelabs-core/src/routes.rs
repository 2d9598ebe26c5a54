// Site routes and the views they resolve to
use tracing::{debug, warn};

use crate::gallery::{home_view, HomeView};
use crate::models::{LabsData, Page, Project};
use crate::preferences::PreferenceStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Projects,
    ProjectDetail(String),
    Methodology,
    YourNews,
    About,
    Contact,
    Login,
    Account,
    BillingSuccess,
    NotFound(String),
}

impl Route {
    /// Parse a path. Total: anything unrecognised is `NotFound`.
    pub fn parse(raw: &str) -> Self {
        let path = raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["projects"] => Route::Projects,
            ["projects", slug] => match urlencoding::decode(slug) {
                Ok(decoded) => Route::ProjectDetail(decoded.into_owned()),
                Err(_) => Route::NotFound(raw.to_string()),
            },
            ["methodology"] => Route::Methodology,
            ["your-news"] => Route::YourNews,
            ["about"] => Route::About,
            ["contact"] => Route::Contact,
            ["login"] => Route::Login,
            ["account"] => Route::Account,
            ["billing", "success"] => Route::BillingSuccess,
            _ => Route::NotFound(raw.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Projects => "/projects".to_string(),
            Route::ProjectDetail(slug) => format!("/projects/{}", urlencoding::encode(slug)),
            Route::Methodology => "/methodology".to_string(),
            Route::YourNews => "/your-news".to_string(),
            Route::About => "/about".to_string(),
            Route::Contact => "/contact".to_string(),
            Route::Login => "/login".to_string(),
            Route::Account => "/account".to_string(),
            Route::BillingSuccess => "/billing/success".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// What a route shows for a given snapshot
#[derive(Debug, Clone)]
pub enum PageView<'a> {
    Home(HomeView<'a>),
    Projects(&'a [Project]),
    ProjectDetail(&'a Project),
    Content(&'a Page),
    YourNews,
    Login,
    Account,
    BillingSuccess,
    NotFound,
}

/// Resolve a route against the catalog. Pure.
pub fn resolve<'a>(route: &Route, catalog: &'a LabsData) -> PageView<'a> {
    match route {
        Route::Home => PageView::Home(home_view(catalog)),
        Route::Projects => PageView::Projects(&catalog.projects),
        Route::ProjectDetail(slug) => catalog
            .project_by_slug(slug)
            .map(PageView::ProjectDetail)
            .unwrap_or(PageView::NotFound),
        Route::Methodology => PageView::Content(&catalog.pages.methodology),
        Route::About => PageView::Content(&catalog.pages.about),
        Route::Contact => catalog
            .pages
            .get("contact")
            .map(PageView::Content)
            .unwrap_or(PageView::NotFound),
        Route::YourNews => PageView::YourNews,
        Route::Login => PageView::Login,
        Route::Account => PageView::Account,
        Route::BillingSuccess => PageView::BillingSuccess,
        Route::NotFound(_) => PageView::NotFound,
    }
}

/// Resolve a route as a visit: opening a followed project's detail page
/// marks it as checked. A storage failure is logged and the view still
/// resolves.
pub fn visit<'a>(route: &Route, catalog: &'a LabsData, preferences: &mut PreferenceStore) -> PageView<'a> {
    let view = resolve(route, catalog);
    if let PageView::ProjectDetail(project) = &view {
        if preferences.is_following(&project.id) {
            match preferences.update_last_checked(&project.id) {
                Ok(_) => debug!("Marked {} as checked on visit", project.id),
                Err(e) => warn!("Failed to record visit to {}: {}", project.id, e),
            }
        }
    }
    view
}
