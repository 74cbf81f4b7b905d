//! Mesh change notifications.
//!
//! Host glue publishes a [`MeshChange`] whenever an entity's mesh is written.
//! Consumers hold a [`FeedSubscription`] and drain their own queue once per
//! cycle. With no subscribers, published changes are dropped.

use bevy::prelude::*;

/// One mesh write on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshChange {
    pub entity: Entity,
    /// Whether vertex data or topology changed (as opposed to only
    /// attributes the validator ignores)
    pub geometry_updated: bool,
}

/// Handle for one subscriber's queue.
///
/// Not `Clone`: releasing it through [`MeshChangeFeed::unsubscribe`] consumes
/// the only handle.
#[derive(Debug, PartialEq, Eq)]
pub struct FeedSubscription {
    id: u32,
}

#[derive(Resource, Default)]
pub struct MeshChangeFeed {
    next_id: u32,
    queues: Vec<(u32, Vec<MeshChange>)>,
}

impl MeshChangeFeed {
    pub fn subscribe(&mut self) -> FeedSubscription {
        let id = self.next_id;
        self.next_id += 1;
        self.queues.push((id, Vec::new()));
        FeedSubscription { id }
    }

    pub fn unsubscribe(&mut self, subscription: FeedSubscription) {
        self.queues.retain(|(id, _)| *id != subscription.id);
    }

    pub fn publish(&mut self, change: MeshChange) {
        for (_, queue) in &mut self.queues {
            queue.push(change);
        }
    }

    /// Take every change published since the last drain.
    pub fn drain(&mut self, subscription: &FeedSubscription) -> Vec<MeshChange> {
        self.queues
            .iter_mut()
            .find(|(id, _)| *id == subscription.id)
            .map(|(_, queue)| std::mem::take(queue))
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.queues.len()
    }
}
