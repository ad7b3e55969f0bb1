// biovalidate-lookup/src/single_flight.rs
// ============================================================================
// Module: Single-Flight Coalescing Table
// Description: Ensures at most one concurrent provider resolution per key.
// Purpose: Prevent two overlapping `resolve_batch` calls (from independent
//          validation runs sharing one subsystem handle) from both hitting
//          the network for the same identifier.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! The lookup subsystem already deduplicates identifiers within a single
//! `resolve_batch` call; [`SingleFlight`] instead protects against
//! *cross-call* duplication. The first caller for a key becomes its leader
//! and is responsible for publishing the result once the provider round trip
//! completes; every other caller for the same key becomes a follower and
//! waits on a [`tokio::sync::broadcast`] receiver instead of issuing its own
//! request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::hash::Hash;

use tokio::sync::Mutex;
use tokio::sync::broadcast;

// ============================================================================
// SECTION: Roles
// ============================================================================

/// What a caller should do for a given key, returned by [`SingleFlight::enter`].
pub enum Role<V> {
    /// This caller is first; it must compute the value and call
    /// [`SingleFlight::publish`] when done.
    Leader,
    /// Another caller is already in flight; await this receiver instead.
    Follower(broadcast::Receiver<V>),
}

// ============================================================================
// SECTION: Table
// ============================================================================

/// A coalescing table keyed by `K`, broadcasting a `V` to every follower once
/// the leader publishes.
pub struct SingleFlight<K, V> {
    /// Senders for keys currently being resolved by their leader.
    inflight: Mutex<HashMap<K, broadcast::Sender<V>>>,
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self { inflight: Mutex::new(HashMap::new()) }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Claims `key`, returning [`Role::Leader`] if no other caller currently
    /// holds it, or [`Role::Follower`] subscribed to the eventual result.
    pub async fn enter(&self, key: K) -> Role<V> {
        let mut table = self.inflight.lock().await;
        if let Some(sender) = table.get(&key) {
            Role::Follower(sender.subscribe())
        } else {
            let (sender, _receiver) = broadcast::channel(1);
            table.insert(key, sender);
            Role::Leader
        }
    }

    /// Publishes `value` to every follower waiting on `key` and releases the
    /// key so a future caller starts a fresh resolution.
    pub async fn publish(&self, key: &K, value: V) {
        let sender = self.inflight.lock().await.remove(key);
        if let Some(sender) = sender {
            let _ = sender.send(value);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions are permitted to panic")]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_caller_is_leader_second_is_follower() {
        let table: SingleFlight<String, u32> = SingleFlight::default();
        let key = "human:tp53".to_string();

        assert!(matches!(table.enter(key.clone()).await, Role::Leader));
        match table.enter(key.clone()).await {
            Role::Follower(_) => {}
            Role::Leader => panic!("expected follower"),
        }
    }

    #[tokio::test]
    async fn follower_receives_the_leaders_published_value() {
        let table: SingleFlight<String, u32> = SingleFlight::default();
        let key = "human:tp53".to_string();

        assert!(matches!(table.enter(key.clone()).await, Role::Leader));
        let Role::Follower(mut receiver) = table.enter(key.clone()).await else {
            panic!("expected follower");
        };
        table.publish(&key, 42).await;
        assert_eq!(receiver.recv().await.expect("value delivered"), 42);
    }

    #[tokio::test]
    async fn publishing_releases_the_key_for_a_fresh_resolution() {
        let table: SingleFlight<String, u32> = SingleFlight::default();
        let key = "human:tp53".to_string();

        assert!(matches!(table.enter(key.clone()).await, Role::Leader));
        table.publish(&key, 1).await;
        assert!(matches!(table.enter(key.clone()).await, Role::Leader));
    }
}
