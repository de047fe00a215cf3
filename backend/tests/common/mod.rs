//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use shared::{CreateItemInput, Item, Location, LowStockAlert, CreateProjectInput};
use sqlx::SqlitePool;
use stockroom_backend::{
    db,
    services::{AllocationService, ItemService, LedgerService, LocationService, ReportingService},
    AppState, Config, LowStockNotifier,
};

/// Notifier that keeps every alert for inspection
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<LowStockAlert>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<LowStockAlert> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.alerts.lock().unwrap().clear();
    }
}

impl LowStockNotifier for RecordingNotifier {
    fn notify(&self, alert: LowStockAlert) {
        self.alerts.lock().unwrap().push(alert);
    }
}

/// Fresh migrated in-memory database
pub async fn test_pool() -> SqlitePool {
    let config = Config::for_tests();
    let pool = db::connect(&config.database).await.unwrap();
    db::migrate(&pool).await.unwrap();
    pool
}

/// Services wired to one database and one recording notifier
pub struct Harness {
    pub pool: SqlitePool,
    pub config: Config,
    pub notifier: Arc<RecordingNotifier>,
    pub items: ItemService,
    pub ledger: LedgerService,
    pub allocations: AllocationService,
    pub locations: LocationService,
    pub reporting: ReportingService,
}

impl Harness {
    pub async fn new() -> Self {
        let pool = test_pool().await;
        let config = Config::for_tests();
        let notifier = Arc::new(RecordingNotifier::default());
        let dyn_notifier: Arc<dyn LowStockNotifier> = notifier.clone();

        Self {
            items: ItemService::new(pool.clone(), dyn_notifier.clone(), &config.uploads.dir),
            ledger: LedgerService::new(pool.clone(), dyn_notifier.clone()),
            allocations: AllocationService::new(pool.clone(), dyn_notifier.clone()),
            locations: LocationService::new(pool.clone()),
            reporting: ReportingService::new(pool.clone(), dyn_notifier, &config.uploads.dir),
            pool,
            config,
            notifier,
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            db: self.pool.clone(),
            config: Arc::new(self.config.clone()),
            notifier: self.notifier.clone(),
        }
    }

    /// Create an item and forget any alert its creation raised
    pub async fn item(&self, code: &str, quantity: i64, minimum: i64) -> Item {
        let item = self
            .items
            .create(CreateItemInput {
                brand: "Dell".into(),
                code: code.into(),
                description: format!("Producto {}", code),
                quantity,
                minimum,
                location: "ALMACÉN".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        self.notifier.clear();
        item
    }

    pub async fn project(&self, name: &str) -> Location {
        self.locations
            .create_project(CreateProjectInput {
                name: name.into(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    pub async fn quantity(&self, item_id: i64) -> i64 {
        self.items.get(item_id).await.unwrap().quantity
    }

    /// Sum of entries minus sum of exits for an item
    pub async fn ledger_balance(&self, item_id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(CASE WHEN kind = 'entry' THEN quantity ELSE -quantity END), 0) \
             FROM movements WHERE item_id = ?",
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    pub async fn allocated(&self, item_id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity_assigned), 0) FROM allocations WHERE item_id = ?",
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }
}
