//! Subscription bookkeeping

use litlayer_types::{StreamChannel, SubscribeRequest};

/// A subscription the caller asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Channel type
    pub channel: StreamChannel,
    /// Symbol or account address the channel is keyed by
    pub key: String,
    /// Request ID sent with the subscribe frame
    pub request_id: Option<String>,
}

impl Subscription {
    /// Record the intent expressed by a subscribe request
    pub fn from_request(request: &SubscribeRequest) -> Option<Self> {
        let target = &request.subscription;
        let key = target.symbol.clone().or_else(|| target.address.clone())?;
        Some(Self {
            channel: target.channel,
            key,
            request_id: request.id.clone(),
        })
    }

    fn same_target(&self, other: &Subscription) -> bool {
        self.channel == other.channel && self.key == other.key
    }
}

/// Tracks what the caller is subscribed to
///
/// The connection does not replay these after a reconnect; callers that
/// want their subscriptions back resubscribe from [`SubscriptionManager::all`].
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionManager {
    /// Create a new subscription manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription, replacing an earlier one for the same target
    pub fn add(&mut self, sub: Subscription) {
        self.subscriptions.retain(|s| !s.same_target(&sub));
        self.subscriptions.push(sub);
    }

    /// Remove the subscription for a target; returns whether one existed
    pub fn remove(&mut self, sub: &Subscription) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| !s.same_target(sub));
        before != self.subscriptions.len()
    }

    /// Get all active subscriptions
    pub fn all(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Get number of active subscriptions
    pub fn count(&self) -> usize {
        self.subscriptions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litlayer_types::{AddressChannel, SymbolChannel};

    #[test]
    fn test_subscription_from_request() {
        let req = SubscribeRequest::subscribe_symbol(SymbolChannel::Market, "ETH").with_id("req-1");
        let sub = Subscription::from_request(&req).unwrap();
        assert_eq!(sub.channel, StreamChannel::Symbol(SymbolChannel::Market));
        assert_eq!(sub.key, "ETH");
        assert_eq!(sub.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_subscription_manager() {
        let mut manager = SubscriptionManager::new();
        let market = Subscription::from_request(&SubscribeRequest::subscribe_symbol(
            SymbolChannel::Market,
            "ETH",
        ))
        .unwrap();
        let balance = Subscription::from_request(&SubscribeRequest::subscribe_address(
            AddressChannel::Balance,
            "0xabc",
        ))
        .unwrap();

        manager.add(market.clone());
        manager.add(balance);
        manager.add(market.clone());
        assert_eq!(manager.count(), 2);

        assert!(manager.remove(&market));
        assert!(!manager.remove(&market));
        assert_eq!(manager.count(), 1);
    }
}
