//! Test doubles for provisioning and launching.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use zip::write::SimpleFileOptions;

use crate::observer::{LaunchEvent, Observer};
use crate::provision::{DownloadError, Fetcher, ReleaseManifest};

/// Manifest pointing at `https://releases.test/` with no default extensions.
pub fn test_manifest() -> ReleaseManifest {
    ReleaseManifest {
        archive_url_template: Some("https://releases.test/liquibase-{version}.zip".to_string()),
        releases: Default::default(),
        extension_url_template: "https://releases.test/{name}-{version}.jar".to_string(),
        default_extensions: Vec::new(),
    }
}

/// Builds an in-memory release zip shaped like the upstream Liquibase archive.
///
/// `script` becomes the body of the `liquibase` launcher (mode 0755).
pub fn release_archive(script: &str) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default;

    zip.add_directory("lib/", options()).unwrap();
    zip.add_directory("internal/lib/", options()).unwrap();

    zip.start_file("liquibase", options().unix_permissions(0o755))
        .unwrap();
    zip.write_all(script.as_bytes()).unwrap();

    zip.start_file("liquibase.bat", options().unix_permissions(0o644))
        .unwrap();
    zip.write_all(b"@echo off\r\n").unwrap();

    zip.start_file("internal/lib/liquibase-core.jar", options())
        .unwrap();
    zip.write_all(b"PK-core").unwrap();

    zip.finish().unwrap().into_inner()
}

/// Serves canned bodies per URL and records every request.
///
/// Unknown URLs fail with a 404 [`DownloadError::Status`].
#[derive(Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.into(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        _expected_sha256: Option<&str>,
    ) -> Result<u64, DownloadError> {
        self.requests.lock().unwrap().push(url.to_string());

        let body = self.responses.get(url).ok_or_else(|| DownloadError::Status {
            url: url.to_string(),
            status: 404,
            reason: "Not Found".to_string(),
        })?;

        let io_err = |source| DownloadError::Io {
            path: dest.to_path_buf(),
            source,
        };

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(dest, body).map_err(io_err)?;

        Ok(body.len() as u64)
    }
}

/// Collects every event it is notified of.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<LaunchEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LaunchEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Observer for RecordingObserver {
    fn notify(&self, event: &LaunchEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
