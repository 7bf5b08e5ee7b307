pub mod config;
pub mod dashboard;
pub mod dtos;
pub mod error;
pub mod models;
pub mod services;

use config::Config;
use dashboard::FeeDashboard;
use models::StudentContext;
use secrecy::ExposeSecret;
use services::{FeeStoreClient, HostedGateway, RedisResumeStore};

/// Wire a dashboard controller against the configured collaborator
/// services: the fee record store, the hosted payment gateway, the receipt
/// generator, and the Redis-backed resumption store.
pub fn build_dashboard(
    config: Config,
    student: StudentContext,
) -> anyhow::Result<FeeDashboard<HostedGateway, RedisResumeStore>> {
    let fees = FeeStoreClient::new(config.fees.base_url.clone());
    let receipts = services::ReceiptClient::new(config.receipts.base_url.clone());

    let gateway = HostedGateway::new(config.gateway.clone());
    if gateway.is_configured() {
        tracing::info!("payment gateway client initialized");
    } else {
        tracing::warn!("gateway credentials not configured - payments will be rejected");
    }

    let redis = redis::Client::open(config.resume.redis_url.expose_secret().as_str())?;
    let resume = RedisResumeStore::new(redis);

    tracing::info!(
        service = %config.service_name,
        student_id = %student.id,
        "fee dashboard built"
    );

    Ok(FeeDashboard::new(student, fees, receipts, gateway, resume))
}
