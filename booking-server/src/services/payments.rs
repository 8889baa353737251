//! Payment Gateway Client
//!
//! PayPal 风格的订单 API：client-credentials 令牌缓存、创建订单、
//! 捕获、退款。核心只把它当作不透明的 "charge" 能力使用。

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use crate::core::config::PayPalConfig;

const SANDBOX_API: &str = "https://api-m.sandbox.paypal.com";
const LIVE_API: &str = "https://api-m.paypal.com";

/// Token refresh margin before the provider-reported expiry
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 300;

#[derive(Clone)]
pub struct PaymentClient {
    http: reqwest::Client,
    config: PayPalConfig,
    brand_name: String,
    token: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Result of creating a provider order
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order_id: String,
    pub status: String,
    pub approval_url: Option<String>,
}

/// Result of capturing a provider order
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub order_id: String,
    pub status: String,
    pub transaction_id: Option<String>,
    pub amount: f64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct OrderLink {
    rel: String,
    href: String,
}

#[derive(Deserialize)]
struct CaptureAmount {
    value: String,
}

#[derive(Deserialize)]
struct CaptureDetails {
    id: String,
    amount: Option<CaptureAmount>,
}

#[derive(Deserialize)]
struct UnitPayments {
    captures: Option<Vec<CaptureDetails>>,
}

#[derive(Deserialize)]
struct PurchaseUnit {
    payments: Option<UnitPayments>,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<OrderLink>,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

impl PaymentClient {
    pub fn new(config: PayPalConfig, brand_name: String) -> Self {
        if config.client_id.is_empty() {
            tracing::info!("Payment gateway not configured");
        }
        Self {
            http: reqwest::Client::new(),
            config,
            brand_name,
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.client_id.is_empty() && !self.config.client_secret.is_empty()
    }

    pub fn client_id(&self) -> &str {
        &self.config.client_id
    }

    pub fn mode(&self) -> &str {
        &self.config.mode
    }

    fn api_base(&self) -> &'static str {
        if self.config.mode == "live" {
            LIVE_API
        } else {
            SANDBOX_API
        }
    }

    /// OAuth client-credentials token, cached until shortly before expiry
    async fn access_token(&self) -> Result<String> {
        if let Some(cached) = self.token.read().await.as_ref()
            && cached.expires_at > Instant::now()
        {
            return Ok(cached.access_token.clone());
        }

        if !self.is_configured() {
            return Err(anyhow!("Payment gateway not configured"));
        }

        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.api_base()))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Payment gateway auth request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow!("Payment gateway auth error ({status})"));
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Invalid payment gateway token response")?;

        let expires_at = Instant::now()
            + Duration::from_secs(token.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS));
        *self.token.write().await = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }

    /// Create a provider order and return the buyer approval link
    pub async fn create_order(
        &self,
        amount: f64,
        reference: &str,
        description: &str,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<CreatedOrder> {
        let token = self.access_token().await?;

        let payload = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": reference,
                "description": description,
                "amount": {
                    "currency_code": "USD",
                    "value": format!("{amount:.2}"),
                }
            }],
            "application_context": {
                "brand_name": self.brand_name,
                "landing_page": "BILLING",
                "user_action": "PAY_NOW",
                "return_url": return_url,
                "cancel_url": cancel_url,
            }
        });

        let response = self
            .http
            .post(format!("{}/v2/checkout/orders", self.api_base()))
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await
            .context("Payment gateway order request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Payment gateway order error ({status}): {detail}"));
        }

        let order: OrderResponse = response
            .json()
            .await
            .context("Invalid payment gateway order response")?;

        let approval_url = order
            .links
            .iter()
            .find(|l| l.rel == "approve")
            .map(|l| l.href.clone());

        Ok(CreatedOrder {
            order_id: order.id,
            status: order.status,
            approval_url,
        })
    }

    /// Capture an approved order
    pub async fn capture_order(&self, order_id: &str) -> Result<CaptureResult> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(format!(
                "{}/v2/checkout/orders/{order_id}/capture",
                self.api_base()
            ))
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .context("Payment gateway capture request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Payment gateway capture error ({status}): {detail}"));
        }

        let order: OrderResponse = response
            .json()
            .await
            .context("Invalid payment gateway capture response")?;

        let capture = order
            .purchase_units
            .first()
            .and_then(|u| u.payments.as_ref())
            .and_then(|p| p.captures.as_ref())
            .and_then(|c| c.first());

        let amount = capture
            .and_then(|c| c.amount.as_ref())
            .and_then(|a| a.value.parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(CaptureResult {
            order_id: order.id,
            status: order.status,
            transaction_id: capture.map(|c| c.id.clone()),
            amount,
        })
    }

    /// Refund a completed capture (full refund when `amount` is None)
    pub async fn refund_capture(&self, capture_id: &str, amount: Option<f64>) -> Result<String> {
        let token = self.access_token().await?;

        let payload = match amount {
            Some(value) => json!({
                "amount": { "value": format!("{value:.2}"), "currency_code": "USD" }
            }),
            None => json!({}),
        };

        let response = self
            .http
            .post(format!(
                "{}/v2/payments/captures/{capture_id}/refund",
                self.api_base()
            ))
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await
            .context("Payment gateway refund request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Payment gateway refund error ({status}): {detail}"));
        }

        #[derive(Deserialize)]
        struct RefundResponse {
            id: String,
        }

        let refund: RefundResponse = response
            .json()
            .await
            .context("Invalid payment gateway refund response")?;
        Ok(refund.id)
    }
}
