//! Test helpers: build the application against scratch directories.
//!
//! Run from workspace root: `cargo test -p domin8-api`.

#![allow(dead_code)]

pub mod fixtures;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use domin8_api::state::AppState;
use domin8_core::{Config, WatermarkServiceConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Test application: server, state, and the scratch directory everything lives in.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn logo_dir(&self) -> PathBuf {
        self.state.config.logo_upload_dir().clone()
    }

    pub fn media_dir(&self) -> PathBuf {
        self.state.config.media_upload_dir().clone()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.state.config.output_dir().clone()
    }

    pub fn public_dir(&self) -> PathBuf {
        self.state.config.public_dir().clone()
    }
}

/// Setup test app with default settings and scratch directories.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

/// Setup test app, overriding individual environment settings.
pub async fn setup_test_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let root = temp_dir.path();

    let mut vars: HashMap<String, String> = HashMap::new();
    let dir = |p: &str| root.join(p).to_string_lossy().to_string();
    vars.insert("LOGO_UPLOAD_DIR".into(), dir("uploads/logos"));
    vars.insert("MEDIA_UPLOAD_DIR".into(), dir("uploads/media"));
    vars.insert("MEDIA_OUTPUT_DIR".into(), dir("outputs"));
    vars.insert("PUBLIC_DIR".into(), dir("public"));
    vars.insert("ENVIRONMENT".into(), "test".into());
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    let config = WatermarkServiceConfig::from_lookup(|key| vars.get(key).cloned())
        .expect("Invalid test configuration");
    let config = Config::new(config);

    let (state, app) = domin8_api::setup::build_app(config)
        .await
        .expect("Failed to build app");

    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        temp_dir,
    }
}

/// Multipart body for `/process`
pub fn process_form(
    asset: (&str, &str, Vec<u8>),
    logo: (&str, &str, Vec<u8>),
    asset_type: &str,
) -> MultipartForm {
    let (asset_name, asset_mime, asset_data) = asset;
    let (logo_name, logo_mime, logo_data) = logo;
    MultipartForm::new()
        .add_part(
            "file",
            Part::bytes(bytes::Bytes::from(asset_data))
                .file_name(asset_name)
                .mime_type(asset_mime),
        )
        .add_part(
            "logo",
            Part::bytes(bytes::Bytes::from(logo_data))
                .file_name(logo_name)
                .mime_type(logo_mime),
        )
        .add_text("type", asset_type)
}

/// Regular files currently in `dir`
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect()
        })
        .unwrap_or_default()
}

/// Wait for `dir` to hold no regular files.
pub async fn wait_until_empty(dir: &Path, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if files_in(dir).is_empty() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
