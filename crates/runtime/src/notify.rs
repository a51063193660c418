//! Outbound notification channels.
//!
//! [`Channel`] is a closed set; each variant has exactly one [`Courier`] in
//! [`Couriers`], picked by `match`.

use std::sync::Arc;

use async_trait::async_trait;
use combat_core::{ActionKind, BattleResult, IdentityId, Role, Sequence};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use thiserror::Error;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    Email,
    Push,
}

/// One message to one identity on one channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub identity: IdentityId,
    pub channel: Channel,
    pub action: ActionKind,
    pub sequence: Sequence,
    /// Owner of the event this notification points at.
    pub event_owner: IdentityId,
    pub role: Role,
    pub result: BattleResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("{channel} delivery to {identity} rejected: {reason}")]
    Rejected {
        channel: Channel,
        identity: IdentityId,
        reason: String,
    },

    #[error("{channel} delivery could not encode payload: {reason}")]
    Encoding { channel: Channel, reason: String },
}

/// Delivers notifications over one channel.
#[async_trait]
pub trait Courier: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Courier that writes the payload to the log instead of sending it.
pub struct LogCourier {
    channel: Channel,
}

impl LogCourier {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl Courier for LogCourier {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let payload =
            serde_json::to_string(notification).map_err(|e| DeliveryError::Encoding {
                channel: self.channel,
                reason: e.to_string(),
            })?;
        info!("[{}] -> {}: {}", self.channel, notification.identity, payload);
        Ok(())
    }
}

/// One courier per channel.
#[derive(Clone)]
pub struct Couriers {
    email: Arc<dyn Courier>,
    push: Arc<dyn Courier>,
}

impl Couriers {
    pub fn new(email: Arc<dyn Courier>, push: Arc<dyn Courier>) -> Self {
        Self { email, push }
    }

    /// Couriers that only log.
    pub fn logging() -> Self {
        Self::new(
            Arc::new(LogCourier::new(Channel::Email)),
            Arc::new(LogCourier::new(Channel::Push)),
        )
    }

    pub fn courier(&self, channel: Channel) -> &dyn Courier {
        match channel {
            Channel::Email => self.email.as_ref(),
            Channel::Push => self.push.as_ref(),
        }
    }

    pub async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.courier(notification.channel).deliver(notification).await
    }
}

impl Default for Couriers {
    fn default() -> Self {
        Self::logging()
    }
}
