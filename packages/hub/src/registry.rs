//! Subscription registry mapping group keys to member sets.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use report_core::{ClientId, GroupKey};

/// Registry of which clients belong to which report groups.
///
/// Membership mutation and fan-out iteration may run concurrently;
/// readers get a consistent-at-a-point-in-time snapshot of a member set,
/// nothing stronger. Iteration order is unspecified.
pub struct SubscriptionRegistry {
    groups: RwLock<HashMap<GroupKey, HashSet<ClientId>>>,
}

impl SubscriptionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Add a client to a group. Re-subscribing is a no-op.
    pub fn subscribe(&self, client: ClientId, key: GroupKey) {
        let mut groups = self.groups.write().unwrap();
        let inserted = groups.entry(key.clone()).or_default().insert(client);
        if inserted {
            tracing::debug!("Client {} joined group {}", client, key);
        }
    }

    /// Remove a client from a group. No-op if absent.
    pub fn unsubscribe(&self, client: ClientId, key: &GroupKey) {
        let mut groups = self.groups.write().unwrap();
        if let Some(members) = groups.get_mut(key) {
            if members.remove(&client) {
                tracing::debug!("Client {} left group {}", client, key);
            }
            if members.is_empty() {
                groups.remove(key);
            }
        }
    }

    /// Remove a client from every group it belongs to.
    ///
    /// Called on disconnect; safe when the client was never subscribed.
    pub fn remove_client(&self, client: ClientId) {
        let mut groups = self.groups.write().unwrap();
        groups.retain(|_, members| {
            members.remove(&client);
            !members.is_empty()
        });
    }

    /// Snapshot of the current member set of a group (possibly empty).
    pub fn members_of(&self, key: &GroupKey) -> Vec<ClientId> {
        self.groups
            .read()
            .unwrap()
            .get(key)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Snapshot of every group that currently has members.
    pub fn group_keys(&self) -> Vec<GroupKey> {
        self.groups.read().unwrap().keys().cloned().collect()
    }

    /// Number of groups with at least one member.
    pub fn group_count(&self) -> usize {
        self.groups.read().unwrap().len()
    }

    /// Whether no client is subscribed to anything.
    pub fn is_empty(&self) -> bool {
        self.groups.read().unwrap().is_empty()
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use report_core::{DataType, DateRange, ReportKind};

    fn key(kind: ReportKind, day: u32) -> GroupKey {
        let from = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, day + 1).unwrap();
        GroupKey::new(kind, DateRange::new(from, to), DataType::default())
    }

    #[test]
    fn subscribe_is_idempotent() {
        let registry = SubscriptionRegistry::new();
        let client = ClientId::new();
        let k = key(ReportKind::Departmental, 1);

        registry.subscribe(client, k.clone());
        registry.subscribe(client, k.clone());

        assert_eq!(registry.members_of(&k), vec![client]);
        assert_eq!(registry.group_count(), 1);
    }

    #[test]
    fn unsubscribe_when_absent_is_a_no_op() {
        let registry = SubscriptionRegistry::new();
        let member = ClientId::new();
        let stranger = ClientId::new();
        let k = key(ReportKind::Hourly, 1);

        registry.subscribe(member, k.clone());
        registry.unsubscribe(stranger, &k);
        registry.unsubscribe(stranger, &key(ReportKind::Payment, 5));

        assert_eq!(registry.members_of(&k), vec![member]);
    }

    #[test]
    fn unsubscribe_prunes_emptied_groups() {
        let registry = SubscriptionRegistry::new();
        let client = ClientId::new();
        let k = key(ReportKind::Employee, 1);

        registry.subscribe(client, k.clone());
        registry.unsubscribe(client, &k);

        assert!(registry.members_of(&k).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_client_strips_every_membership() {
        let registry = SubscriptionRegistry::new();
        let leaver = ClientId::new();
        let stays = ClientId::new();
        let k1 = key(ReportKind::Departmental, 1);
        let k2 = key(ReportKind::Hourly, 3);
        let k3 = key(ReportKind::Payment, 5);

        registry.subscribe(leaver, k1.clone());
        registry.subscribe(leaver, k2.clone());
        registry.subscribe(leaver, k3.clone());
        registry.subscribe(stays, k2.clone());

        registry.remove_client(leaver);

        assert!(registry.members_of(&k1).is_empty());
        assert_eq!(registry.members_of(&k2), vec![stays]);
        assert!(registry.members_of(&k3).is_empty());

        // Second removal is a no-op
        registry.remove_client(leaver);
        assert_eq!(registry.members_of(&k2), vec![stays]);
    }

    #[test]
    fn remove_client_never_subscribed_is_safe() {
        let registry = SubscriptionRegistry::new();
        registry.remove_client(ClientId::new());
        assert!(registry.is_empty());
    }

    #[test]
    fn replayed_sequences_yield_net_membership() {
        let registry = SubscriptionRegistry::new();
        let a = ClientId::new();
        let b = ClientId::new();
        let k = key(ReportKind::Departmental, 1);

        registry.subscribe(a, k.clone());
        registry.subscribe(b, k.clone());
        registry.unsubscribe(a, &k);
        registry.subscribe(a, k.clone());
        registry.subscribe(a, k.clone());
        registry.unsubscribe(b, &k);

        assert_eq!(registry.members_of(&k), vec![a]);
    }

    #[test]
    fn group_keys_reflects_populated_groups_only() {
        let registry = SubscriptionRegistry::new();
        let client = ClientId::new();
        let k1 = key(ReportKind::Hourly, 1);
        let k2 = key(ReportKind::Payment, 2);

        registry.subscribe(client, k1.clone());
        registry.subscribe(client, k2.clone());
        registry.unsubscribe(client, &k1);

        assert_eq!(registry.group_keys(), vec![k2]);
    }
}
