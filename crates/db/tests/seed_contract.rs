use rust_decimal::Decimal;
use tempfile::TempDir;

use servicedesk_core::domain::customer::CustomerId;
use servicedesk_core::domain::order::{OrderId, OrderStatus};
use servicedesk_core::lookup::LookupService;
use servicedesk_db::{connect_with_settings, migrations, SampleDataset, SqlLookupService};

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

async fn seeded_file_pool(dir: &TempDir) -> SeedContractTestResult<sqlx::SqlitePool> {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("seed.db").display());
    let pool = connect_with_settings(&url, 2, 5).await.map_err(|e| e.to_string())?;
    migrations::run_pending(&pool).await.map_err(|e| e.to_string())?;
    SampleDataset::load(&pool).await.map_err(|e| e.to_string())?;
    Ok(pool)
}

#[tokio::test]
async fn seeded_database_verifies_and_serves_lookups() -> SeedContractTestResult {
    let dir = TempDir::new().map_err(|e| e.to_string())?;
    let pool = seeded_file_pool(&dir).await?;

    let verification = SampleDataset::verify(&pool).await.map_err(|e| e.to_string())?;
    require!(verification.all_present, "missing rows: {:?}", verification.missing());

    let lookups = SqlLookupService::new(pool);
    let order = lookups
        .find_order(&OrderId("ORD-003".to_string()))
        .await
        .map_err(|e| e.to_string())?
        .ok_or("ORD-003 should be seeded")?;
    require!(order.total == Decimal::new(150000, 2), "unexpected total {}", order.total);
    require!(order.status == OrderStatus::Delivered, "unexpected status {}", order.status);

    let jane_orders = lookups
        .orders_for_customer(&CustomerId("CUST-002".to_string()))
        .await
        .map_err(|e| e.to_string())?;
    let ids: Vec<&str> = jane_orders.iter().map(|order| order.id.0.as_str()).collect();
    require!(ids == vec!["ORD-002", "ORD-006"], "unexpected orders {ids:?}");
    Ok(())
}

#[tokio::test]
async fn reseeding_preserves_operator_edits() -> SeedContractTestResult {
    let dir = TempDir::new().map_err(|e| e.to_string())?;
    let pool = seeded_file_pool(&dir).await?;

    sqlx::query("UPDATE orders SET status = 'cancelled' WHERE id = 'ORD-008'")
        .execute(&pool)
        .await
        .map_err(|e| e.to_string())?;
    let reseed = SampleDataset::load(&pool).await.map_err(|e| e.to_string())?;
    require!(reseed.orders_inserted == 0, "reseed should not insert: {reseed:?}");

    let status: String = sqlx::query_scalar("SELECT status FROM orders WHERE id = 'ORD-008'")
        .fetch_one(&pool)
        .await
        .map_err(|e| e.to_string())?;
    require!(status == "cancelled", "edit was overwritten: {status}");
    Ok(())
}
