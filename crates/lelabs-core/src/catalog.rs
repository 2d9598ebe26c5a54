// Data provider: primary catalog with a bundled fallback snapshot
use async_trait::async_trait;
use lelabs_api::CatalogClient;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::LabsData;

/// Snapshot compiled into the binary, used when nothing better is reachable
pub const BUNDLED_SNAPSHOT: &str = include_str!("../data/le-labs-data.json");

/// Something that can hand back a raw catalog document
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Human readable label used in logs and errors
    fn name(&self) -> String;

    async fn fetch(&self) -> crate::Result<String>;
}

/// Remote catalog document over HTTP
pub struct HttpCatalogSource {
    client: CatalogClient,
}

impl HttpCatalogSource {
    pub fn new(url: impl Into<String>) -> crate::Result<Self> {
        Ok(Self {
            client: CatalogClient::new(url)?,
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    fn name(&self) -> String {
        self.client.url().to_string()
    }

    async fn fetch(&self) -> crate::Result<String> {
        Ok(self.client.fetch_document().await?)
    }
}

/// Catalog document on local disk
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> crate::Result<String> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}

/// The snapshot shipped inside the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedCatalogSource;

#[async_trait]
impl CatalogSource for EmbeddedCatalogSource {
    fn name(&self) -> String {
        "bundled snapshot".to_string()
    }

    async fn fetch(&self) -> crate::Result<String> {
        Ok(BUNDLED_SNAPSHOT.to_string())
    }
}

/// Why no fresh snapshot could be produced
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("primary source failed ({primary}) and fallback failed ({fallback})")]
    Unavailable { primary: String, fallback: String },
}

/// Which source the current snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Primary,
    Fallback,
}

/// Holds the current catalog snapshot
///
/// Consumers only ever see a complete snapshot, the loading flag, or an
/// error. A failed load keeps whatever snapshot was there before.
pub struct CatalogProvider {
    primary: Box<dyn CatalogSource>,
    fallback: Box<dyn CatalogSource>,
    snapshot: Option<Arc<LabsData>>,
    source: Option<SnapshotSource>,
    loading: bool,
    error: Option<CatalogError>,
    generation: u64,
}

impl CatalogProvider {
    pub fn new(primary: Box<dyn CatalogSource>, fallback: Box<dyn CatalogSource>) -> Self {
        Self {
            primary,
            fallback,
            snapshot: None,
            source: None,
            loading: true,
            error: None,
            generation: 0,
        }
    }

    /// Primary source with the bundled snapshot as fallback
    pub fn with_bundled_fallback(primary: Box<dyn CatalogSource>) -> Self {
        Self::new(primary, Box::new(EmbeddedCatalogSource))
    }

    /// Fetch from the primary source, falling back on any failure
    pub async fn load(&mut self) -> Result<SnapshotSource, CatalogError> {
        self.loading = true;
        let outcome = self.fetch_any().await;
        self.loading = false;

        match outcome {
            Ok((data, source)) => {
                info!(
                    "Catalog loaded from {:?} source: {} projects, {} news items",
                    source,
                    data.projects.len(),
                    data.news.len()
                );
                self.snapshot = Some(Arc::new(data));
                self.source = Some(source);
                self.error = None;
                self.generation += 1;
                Ok(source)
            }
            Err(e) => {
                warn!("Catalog load failed, keeping previous snapshot: {}", e);
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Re-run the load and replace the snapshot wholesale
    pub async fn refresh(&mut self) -> Result<SnapshotSource, CatalogError> {
        debug!("Refreshing catalog");
        self.load().await
    }

    async fn fetch_any(&self) -> Result<(LabsData, SnapshotSource), CatalogError> {
        let primary = match fetch_snapshot(self.primary.as_ref()).await {
            Ok(data) => return Ok((data, SnapshotSource::Primary)),
            Err(e) => {
                warn!(
                    "Primary catalog {} unusable, trying {}: {}",
                    self.primary.name(),
                    self.fallback.name(),
                    e
                );
                e
            }
        };

        fetch_snapshot(self.fallback.as_ref())
            .await
            .map(|data| (data, SnapshotSource::Fallback))
            .map_err(|fallback| CatalogError::Unavailable { primary, fallback })
    }

    pub fn data(&self) -> Option<Arc<LabsData>> {
        self.snapshot.clone()
    }

    /// Borrow the current snapshot without bumping the refcount
    pub fn snapshot(&self) -> Option<&LabsData> {
        self.snapshot.as_deref()
    }

    pub fn source(&self) -> Option<SnapshotSource> {
        self.source
    }

    pub fn error(&self) -> Option<&CatalogError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Bumped every time a new snapshot is swapped in
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

async fn fetch_snapshot(source: &dyn CatalogSource) -> Result<LabsData, String> {
    let raw = source.fetch().await.map_err(|e| e.to_string())?;
    LabsData::from_json(&raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_returning(body: &'static str) -> MockCatalogSource {
        let mut source = MockCatalogSource::new();
        source.expect_name().return_const("mock".to_string());
        source
            .expect_fetch()
            .returning(move || Ok(body.to_string()));
        source
    }

    fn failing_source() -> MockCatalogSource {
        let mut source = MockCatalogSource::new();
        source.expect_name().return_const("broken".to_string());
        source.expect_fetch().returning(|| {
            Err(crate::Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "gone",
            )))
        });
        source
    }

    #[tokio::test]
    async fn test_starts_loading_without_data() {
        let provider = CatalogProvider::with_bundled_fallback(Box::new(failing_source()));
        assert!(provider.is_loading());
        assert!(provider.data().is_none());
        assert!(provider.error().is_none());
        assert_eq!(provider.generation(), 0);
    }

    #[tokio::test]
    async fn test_primary_success() {
        let primary = source_returning(r##"{"projects":[{"id":"p1","title":"P","slug":"p"}]}"##);
        let mut provider = CatalogProvider::new(Box::new(primary), Box::new(failing_source()));

        assert_eq!(provider.load().await, Ok(SnapshotSource::Primary));
        let data = provider.data().unwrap();
        assert_eq!(data.projects.len(), 1);
        assert!(!provider.is_loading());
        assert_eq!(provider.generation(), 1);
    }

    #[tokio::test]
    async fn test_malformed_primary_falls_back_to_bundled() {
        let primary = source_returning("{ this is not json");
        let mut provider = CatalogProvider::with_bundled_fallback(Box::new(primary));

        assert_eq!(provider.load().await, Ok(SnapshotSource::Fallback));
        assert!(provider.data().is_some());
        assert!(provider.error().is_none());
        assert_eq!(provider.source(), Some(SnapshotSource::Fallback));
    }

    #[tokio::test]
    async fn test_missing_projects_array_falls_back() {
        let primary = source_returning(r#"{"news":[]}"#);
        let mut provider = CatalogProvider::with_bundled_fallback(Box::new(primary));

        assert_eq!(provider.load().await, Ok(SnapshotSource::Fallback));
        assert!(!provider.data().unwrap().projects.is_empty());
    }

    #[tokio::test]
    async fn test_both_failing_on_first_load_surfaces_error() {
        let mut provider =
            CatalogProvider::new(Box::new(failing_source()), Box::new(failing_source()));

        let err = provider.load().await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable { .. }));
        assert!(provider.data().is_none());
        assert!(provider.error().is_some());
        assert!(!provider.is_loading());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_good_snapshot() {
        let mut primary = MockCatalogSource::new();
        primary.expect_name().return_const("flaky".to_string());
        let mut calls = 0;
        primary.expect_fetch().returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(r##"{"projects":[{"id":"p1","title":"P","slug":"p"}]}"##.to_string())
            } else {
                Err(crate::Error::NotFound("offline".into()))
            }
        });

        let mut provider = CatalogProvider::new(Box::new(primary), Box::new(failing_source()));
        provider.load().await.unwrap();
        assert!(provider.refresh().await.is_err());

        let data = provider.data().unwrap();
        assert_eq!(data.projects[0].id, "p1");
        assert!(provider.error().is_some());
        assert_eq!(provider.generation(), 1);
    }

    #[tokio::test]
    async fn test_http_error_status_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/le-labs-data.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let primary =
            HttpCatalogSource::new(format!("{}/data/le-labs-data.json", server.uri())).unwrap();
        let mut provider = CatalogProvider::with_bundled_fallback(Box::new(primary));

        assert_eq!(provider.load().await, Ok(SnapshotSource::Fallback));
        assert!(provider.error().is_none());
    }

    #[tokio::test]
    async fn test_file_source_reads_document() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.json");
        std::fs::write(&file, BUNDLED_SNAPSHOT).unwrap();

        let mut provider = CatalogProvider::new(
            Box::new(FileCatalogSource::new(&file)),
            Box::new(failing_source()),
        );
        assert_eq!(provider.load().await, Ok(SnapshotSource::Primary));
    }
}
