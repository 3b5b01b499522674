//! One-shot low stock check.
//!
//! Raises a reorder request for every material whose available stock is
//! below its threshold and has no open request, logs what was created, and
//! exits. Meant to be run from cron or a systemd timer.

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitedesk_api::material_checker::MaterialChecker;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitedesk_api=info,sitedesk_material_check=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = match sitedesk_db::create_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            return ExitCode::FAILURE;
        }
    };

    // No WebSocket clients exist in this process; requests are only persisted.
    let checker = MaterialChecker::without_notifications(pool);
    match checker.check_low_stock_and_notify().await {
        Ok(created) if created.is_empty() => {
            tracing::info!("All stock levels are above their thresholds");
            ExitCode::SUCCESS
        }
        Ok(created) => {
            for n in &created {
                tracing::info!(
                    request_id = n.request_id,
                    material_id = n.material_id,
                    material = %n.material_name,
                    requested = n.requested_quantity,
                    "{}",
                    n.message
                );
            }
            tracing::info!(count = created.len(), "Low stock check raised purchase requests");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Low stock check failed");
            ExitCode::FAILURE
        }
    }
}
