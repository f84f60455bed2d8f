pub mod stripe;

use async_trait::async_trait;

/// Hosted payment page returned by the payment collaborator.
pub struct PaymentLink {
    pub payment_url: String,
    pub provider_order_id: String,
}

#[async_trait]
pub trait PaymentLinkProvider: Send + Sync {
    async fn create_link(
        &self,
        amount_cents: i64,
        description: &str,
        booking_id: &str,
    ) -> anyhow::Result<PaymentLink>;
}
