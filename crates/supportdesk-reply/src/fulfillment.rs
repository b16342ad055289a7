//! Order-status lookup

use async_trait::async_trait;
use std::time::Duration;
use supportdesk_core::{OrderStatusInfo, Result};
use tracing::debug;

/// Default simulated latency of [`MockFulfillment`]
pub const DEFAULT_LOOKUP_LATENCY: Duration = Duration::from_millis(150);

/// Source of shipment status for a validated order id
#[async_trait]
pub trait FulfillmentLookup: Send + Sync {
    async fn order_status(&self, order_id: &str) -> Result<OrderStatusInfo>;
}

/// Simulated data source: every order has shipped with DHL
#[derive(Debug, Clone)]
pub struct MockFulfillment {
    latency: Duration,
}

impl MockFulfillment {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for MockFulfillment {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_LATENCY)
    }
}

#[async_trait]
impl FulfillmentLookup for MockFulfillment {
    async fn order_status(&self, order_id: &str) -> Result<OrderStatusInfo> {
        tokio::time::sleep(self.latency).await;
        debug!("Mock fulfillment answered for {}", order_id);

        Ok(OrderStatusInfo {
            order_id: order_id.to_string(),
            status: "shipped".to_string(),
            carrier: "DHL".to_string(),
            tracking: "00340434123DE".to_string(),
            eta_days: 2,
        })
    }
}
