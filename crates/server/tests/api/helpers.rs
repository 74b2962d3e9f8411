use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use avwx_core::ClassificationScheme;
use axum::Router;
use mockall::mock;
use server::{
    app, db, AppState, Database, MetarSnapshot, SnapshotStore, TafSnapshot,
};

static TEST_DB_COUNTER: AtomicU32 = AtomicU32::new(0);

pub struct TestApp {
    pub app: Router,
    pub store: Arc<Database>,
}

/// Build an app over a fresh sqlite store in a unique temp directory
pub async fn spawn_app() -> TestApp {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    let suffix = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "avwx-test-{}-{}-{}",
        std::process::id(),
        nanos,
        suffix
    ));

    let store = Arc::new(
        Database::new(dir.to_str().expect("utf-8 temp path"))
            .await
            .expect("sqlite store"),
    );

    let state = AppState {
        remote_url: "http://localhost:9810".to_string(),
        scheme: ClassificationScheme::FourTier,
        store: store.clone(),
    };

    TestApp {
        app: app(state),
        store,
    }
}

/// Build an app over an arbitrary (usually mocked) store
pub fn spawn_app_with_store(store: Arc<dyn SnapshotStore>) -> Router {
    app(AppState {
        remote_url: "http://localhost:9810".to_string(),
        scheme: ClassificationScheme::FourTier,
        store,
    })
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as i64
}

mock! {
    pub Store {}

    #[async_trait]
    impl SnapshotStore for Store {
        async fn store_metar(&self, snapshot: MetarSnapshot) -> Result<bool, db::Error>;
        async fn store_taf(&self, snapshot: TafSnapshot) -> Result<bool, db::Error>;
        async fn stations(&self) -> Result<Vec<String>, db::Error>;
        async fn latest_metars(
            &self,
            station_ids: &[String],
        ) -> Result<Vec<MetarSnapshot>, db::Error>;
        async fn latest_tafs(
            &self,
            station_ids: &[String],
        ) -> Result<Vec<TafSnapshot>, db::Error>;
        async fn metar_range(
            &self,
            station_id: &str,
            start: i64,
            end: i64,
        ) -> Result<Vec<MetarSnapshot>, db::Error>;
        async fn taf_range(
            &self,
            station_id: &str,
            start: i64,
            end: i64,
        ) -> Result<Vec<TafSnapshot>, db::Error>;
        async fn health_check(&self) -> Result<(), db::Error>;
    }
}
