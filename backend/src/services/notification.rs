//! Low-stock notification delivery
//!
//! Ledger operations evaluate the post-commit state of every item they
//! touched and hand alerts to a [`LowStockNotifier`]. Delivery is
//! fire-and-forget: a notifier never reports failure back to the caller.

use std::{sync::Arc, time::Duration};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use shared::{Item, LowStockAlert};

use crate::config::NotificationConfig;

/// Header carrying the HMAC-SHA256 signature of a webhook body
pub const SIGNATURE_HEADER: &str = "X-Stockroom-Signature";

/// Receives low-stock alerts. Implementations must not block the caller.
pub trait LowStockNotifier: Send + Sync {
    fn notify(&self, alert: LowStockAlert);
}

/// Evaluate an item after a committed mutation and dispatch an alert if it
/// sits at or below its minimum. Returns whether an alert was dispatched.
pub fn notify_if_low(notifier: &dyn LowStockNotifier, item: &Item) -> bool {
    match item.low_stock_alert() {
        Some(alert) => {
            notifier.notify(alert);
            true
        }
        None => false,
    }
}

/// Build the notifier described by configuration
pub fn notifier_from_config(config: &NotificationConfig) -> Arc<dyn LowStockNotifier> {
    match config.webhook_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => match WebhookNotifier::new(
            url.to_string(),
            config.webhook_secret.clone(),
            Duration::from_secs(config.timeout_secs.max(1)),
        ) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                tracing::warn!("Webhook notifier unavailable, falling back to log: {}", e);
                Arc::new(LogNotifier)
            }
        },
        None => Arc::new(LogNotifier),
    }
}

/// Writes alerts to the log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LowStockNotifier for LogNotifier {
    fn notify(&self, alert: LowStockAlert) {
        tracing::warn!(
            item_id = alert.item_id,
            code = %alert.code,
            quantity = alert.quantity,
            minimum = alert.minimum,
            "Low stock: {}",
            alert.description
        );
    }
}

/// Webhook payload
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    event: &'static str,
    subject: String,
    message: String,
    alert: &'a LowStockAlert,
}

impl<'a> WebhookPayload<'a> {
    fn low_stock(alert: &'a LowStockAlert) -> Self {
        Self {
            event: "low_stock",
            subject: format!("Alerta de stock bajo: {}", alert.description),
            message: format!(
                "El producto {} (Código {}) está por debajo del stock mínimo. \
                 Cantidad actual: {} | Stock mínimo: {}",
                alert.description, alert.code, alert.quantity, alert.minimum
            ),
            alert,
        }
    }
}

/// Posts alerts as JSON to an HTTP endpoint
#[derive(Clone)]
pub struct WebhookNotifier {
    url: String,
    secret: Option<String>,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(
        url: String,
        secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url,
            secret,
            http_client,
        })
    }

    /// Base64 HMAC-SHA256 of `body` under `secret`
    pub fn sign(secret: &str, body: &[u8]) -> Result<String, String> {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| "Failed to create HMAC".to_string())?;
        mac.update(body);
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Deliver one alert
    pub async fn deliver(&self, alert: &LowStockAlert) -> Result<(), String> {
        let body = serde_json::to_vec(&WebhookPayload::low_stock(alert))
            .map_err(|e| format!("Failed to encode alert: {}", e))?;

        let mut request = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(secret) = &self.secret {
            request = request.header(SIGNATURE_HEADER, Self::sign(secret, &body)?);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| format!("Failed to send alert: {}", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("Webhook responded with {}", response.status()))
        }
    }
}

impl LowStockNotifier for WebhookNotifier {
    fn notify(&self, alert: LowStockAlert) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(item_id = alert.item_id, "No runtime available, low-stock alert dropped");
            return;
        };

        let notifier = self.clone();
        handle.spawn(async move {
            match notifier.deliver(&alert).await {
                Ok(()) => tracing::debug!(item_id = alert.item_id, "Low-stock alert delivered"),
                Err(e) => tracing::warn!(item_id = alert.item_id, "Low-stock alert failed: {}", e),
            }
        });
    }
}
