//! Shared test helpers for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use chrono::Utc;
use http::{Request, StatusCode};
use serde_json::Value;
use tokio::sync::watch;
use tower::ServiceExt;

use reportal_api::AppState;
use reportal_capacity::adapter::CapacityControl;
use reportal_capacity::{CapacityController, CapacityHandle, CapacityResult, ControllerOptions};
use reportal_core::config::AppConfig;
use reportal_database::memory::{MemoryActivityStore, MemoryCapacityConfigStore};
use reportal_entity::capacity::{CapacitySettings, CapacityState, CapacityType};
use reportal_worker::ReconciliationJob;

fn test_config(utc_offset_minutes: i32) -> String {
    format!(
        r#"
[database]
provider = "memory"

[activity]
active_window_seconds = 300

[capacity]
idle_timeout_seconds = 300
event_buffer = 32
utc_offset_minutes = {utc_offset_minutes}
"#
    )
}

/// Fake management API that records every call.
#[derive(Debug)]
pub struct RecordingAdapter {
    state: Mutex<CapacityState>,
    gets: AtomicUsize,
    resumes: AtomicUsize,
    suspends: AtomicUsize,
}

impl RecordingAdapter {
    fn new(initial: CapacityState) -> Self {
        Self {
            state: Mutex::new(initial),
            gets: AtomicUsize::new(0),
            resumes: AtomicUsize::new(0),
            suspends: AtomicUsize::new(0),
        }
    }

    /// Number of `get_state` calls.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `resume` calls.
    pub fn resumes(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }

    /// Number of `suspend` calls.
    pub fn suspends(&self) -> usize {
        self.suspends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapacityControl for RecordingAdapter {
    async fn get_state(&self, settings: &CapacitySettings) -> CapacityState {
        if settings.address().is_err() {
            return CapacityState::Unavailable;
        }
        self.gets.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap()
    }

    async fn resume(&self, settings: &CapacitySettings) -> CapacityResult<()> {
        settings.address()?;
        self.resumes.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = CapacityState::Active;
        Ok(())
    }

    async fn suspend(&self, settings: &CapacitySettings) -> CapacityResult<()> {
        settings.address()?;
        self.suspends.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = CapacityState::Suspended;
        Ok(())
    }

    fn last_observed(&self) -> Option<CapacityState> {
        Some(*self.state.lock().unwrap())
    }
}

/// Fully configured, auto-managed capacity settings.
pub fn managed_settings() -> CapacitySettings {
    CapacitySettings {
        capacity_type: CapacityType::Fabric,
        capacity_name: Some("reportcap".to_string()),
        resource_group: Some("rg-bi".to_string()),
        subscription_id: Some("sub-1".to_string()),
        auto_managed_capacity: true,
        updated_at: Utc::now(),
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Heartbeat store behind the router
    pub activity: MemoryActivityStore,
    /// Settings and schedule behind the controller
    pub config_store: MemoryCapacityConfigStore,
    /// Fake management API
    pub adapter: Arc<RecordingAdapter>,
    /// Controller handle
    pub capacity: CapacityHandle,
    /// Reconciliation job, run by hand instead of by cron
    pub job: ReconciliationJob,
    _shutdown: watch::Sender<bool>,
}

impl TestApp {
    /// Create a new test application
    pub fn new(initial: CapacityState, settings: Option<CapacitySettings>) -> Self {
        Self::with_utc_offset(initial, settings, 0)
    }

    /// Create a test application whose schedule is evaluated at `utc_offset_minutes`
    pub fn with_utc_offset(
        initial: CapacityState,
        settings: Option<CapacitySettings>,
        utc_offset_minutes: i32,
    ) -> Self {
        let config = Arc::new(
            AppConfig::from_toml(&test_config(utc_offset_minutes)).expect("test config parses"),
        );

        let activity = MemoryActivityStore::new();
        let config_store = match settings {
            Some(settings) => MemoryCapacityConfigStore::with_settings(settings),
            None => MemoryCapacityConfigStore::new(),
        };
        let adapter = Arc::new(RecordingAdapter::new(initial));

        let controller = CapacityController::new(
            Arc::new(config_store.clone()),
            Arc::new(activity.clone()),
            adapter.clone(),
            ControllerOptions::from_config(&config).expect("controller options"),
        );
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (capacity, _task) = controller.spawn(config.capacity.event_buffer, shutdown_rx);

        let job = ReconciliationJob::new(
            Arc::new(activity.clone()),
            capacity.clone(),
            config.activity.active_window(),
        );

        let router = reportal_api::build_router(AppState {
            config: Arc::clone(&config),
            activity_store: Arc::new(activity.clone()),
            config_store: Arc::new(config_store.clone()),
            capacity: capacity.clone(),
        });

        Self {
            router,
            activity,
            config_store,
            adapter,
            capacity,
            job,
            _shutdown: shutdown,
        }
    }

    /// Send a request through the router
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
