use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub fees: FeesApiConfig,
    pub gateway: GatewayConfig,
    pub receipts: ReceiptsConfig,
    pub resume: ResumeConfig,
    pub service_name: String,
}

/// Fee Record Store endpoint.
#[derive(Deserialize, Clone, Debug)]
pub struct FeesApiConfig {
    pub base_url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct GatewayConfig {
    pub key_id: String,
    pub key_secret: Secret<String>,
    /// Base URL of the payment session / verification API.
    pub api_base_url: String,
    /// Base URL of the hosted checkout page the user is redirected to.
    pub checkout_base_url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ReceiptsConfig {
    pub base_url: String,
}

/// Redirect-resumption marker store.
#[derive(Deserialize, Clone, Debug)]
pub struct ResumeConfig {
    pub redis_url: Secret<String>,
    pub ttl_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let fees_base_url =
            env::var("FEES_API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000/api".to_string());

        let gateway_key_id = env::var("GATEWAY_KEY_ID").unwrap_or_default();
        let gateway_key_secret = env::var("GATEWAY_KEY_SECRET").unwrap_or_default();
        let gateway_api_base_url = env::var("GATEWAY_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api".to_string());
        let gateway_checkout_base_url = env::var("GATEWAY_CHECKOUT_URL")
            .unwrap_or_else(|_| "https://checkout.example.com".to_string());

        let receipts_base_url = env::var("RECEIPTS_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api".to_string());

        let resume_redis_url =
            env::var("RESUME_REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let resume_ttl_seconds = env::var("RESUME_TTL_SECONDS")
            .unwrap_or_else(|_| "600".to_string())
            .parse()?;

        Ok(Self {
            fees: FeesApiConfig {
                base_url: fees_base_url,
            },
            gateway: GatewayConfig {
                key_id: gateway_key_id,
                key_secret: Secret::new(gateway_key_secret),
                api_base_url: gateway_api_base_url,
                checkout_base_url: gateway_checkout_base_url,
            },
            receipts: ReceiptsConfig {
                base_url: receipts_base_url,
            },
            resume: ResumeConfig {
                redis_url: Secret::new(resume_redis_url),
                ttl_seconds: resume_ttl_seconds,
            },
            service_name: "fees-dashboard".to_string(),
        })
    }
}
