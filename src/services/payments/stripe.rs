use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{PaymentLink, PaymentLinkProvider};

/// Stripe Checkout sessions over the form-encoded REST API.
pub struct StripeProvider {
    secret_key: String,
    success_url: String,
    cancel_url: String,
    client: reqwest::Client,
}

impl StripeProvider {
    pub fn new(secret_key: String, success_url: String, cancel_url: String) -> Self {
        Self {
            secret_key,
            success_url,
            cancel_url,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct CheckoutSession {
    id: String,
    url: String,
}

#[async_trait]
impl PaymentLinkProvider for StripeProvider {
    async fn create_link(
        &self,
        amount_cents: i64,
        description: &str,
        booking_id: &str,
    ) -> anyhow::Result<PaymentLink> {
        let amount = amount_cents.to_string();
        let session: CheckoutSession = self
            .client
            .post("https://api.stripe.com/v1/checkout/sessions")
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("mode", "payment"),
                ("success_url", &self.success_url),
                ("cancel_url", &self.cancel_url),
                ("line_items[0][quantity]", "1"),
                ("line_items[0][price_data][currency]", "usd"),
                ("line_items[0][price_data][unit_amount]", &amount),
                (
                    "line_items[0][price_data][product_data][name]",
                    description,
                ),
                ("metadata[booking_id]", booking_id),
            ])
            .send()
            .await
            .context("failed to create checkout session")?
            .error_for_status()
            .context("payment API returned error")?
            .json()
            .await
            .context("failed to decode checkout session")?;

        Ok(PaymentLink {
            payment_url: session.url,
            provider_order_id: session.id,
        })
    }
}
