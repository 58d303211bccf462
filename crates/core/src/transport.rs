use async_trait::async_trait;

use crate::errors::DeliveryError;
use crate::payload::QuotePayload;

/// One way of getting a quote request into the company inbox.
///
/// Implementations make a single attempt: no retry, no fallback to another
/// transport, no timeout beyond what the underlying client enforces.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, payload: &QuotePayload) -> Result<(), DeliveryError>;
}
