#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use opskit_db::{ConnectOpts, DbHandle};
use opskit_errors::Problem;
use retail_ops::seed::{DemoCallers, seed_demo};
use retail_ops::{DomainError, RetailOpsConfig, ServiceContext, Services};

pub struct Harness {
    pub db: Arc<DbHandle>,
    pub services: Services,
    pub callers: DemoCallers,
}

/// Migrated, seeded in-memory database behind the default configuration.
pub async fn harness() -> Harness {
    let opts = ConnectOpts {
        max_conns: Some(1),
        ..Default::default()
    };
    let db = DbHandle::connect("sqlite::memory:", opts)
        .await
        .expect("Failed to connect to database");
    retail_ops::migrate(&db).await.expect("migrations failed");
    assert!(seed_demo(db.sea()).await.expect("seed failed"));

    let db = Arc::new(db);
    let ctx = ServiceContext::from_config(Arc::clone(&db), &RetailOpsConfig::default());
    Harness {
        services: Services::new(&ctx),
        callers: DemoCallers::new(),
        db,
    }
}

/// HTTP status the error would surface with.
pub fn status(err: DomainError) -> u16 {
    Problem::from(err).status.as_u16()
}
