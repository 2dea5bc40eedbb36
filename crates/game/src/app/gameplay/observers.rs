use std::collections::BTreeSet;

use fishtank_engine::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Topic {
    Appeared,
    Removed,
    PointerClick,
}

/// Who listens to which world notification. Subscribers are kept in id order
/// so delivery order matches registration order.
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    appeared: BTreeSet<EntityId>,
    removed: BTreeSet<EntityId>,
    pointer_click: BTreeSet<EntityId>,
}

impl ObserverRegistry {
    pub(crate) fn subscribe(&mut self, topic: Topic, id: EntityId) -> bool {
        self.topic_mut(topic).insert(id)
    }

    pub(crate) fn unsubscribe(&mut self, topic: Topic, id: EntityId) -> bool {
        self.topic_mut(topic).remove(&id)
    }

    #[cfg(test)]
    pub(crate) fn is_subscribed(&self, topic: Topic, id: EntityId) -> bool {
        self.topic(topic).contains(&id)
    }

    /// Snapshot of current subscribers; callbacks may change subscriptions
    /// while the snapshot is being delivered.
    pub(crate) fn subscribers(&self, topic: Topic) -> Vec<EntityId> {
        self.topic(topic).iter().copied().collect()
    }

    pub(crate) fn prune(&mut self, id: EntityId) {
        self.appeared.remove(&id);
        self.removed.remove(&id);
        self.pointer_click.remove(&id);
    }

    #[cfg(test)]
    pub(crate) fn subscription_count(&self) -> usize {
        self.appeared.len() + self.removed.len() + self.pointer_click.len()
    }

    fn topic(&self, topic: Topic) -> &BTreeSet<EntityId> {
        match topic {
            Topic::Appeared => &self.appeared,
            Topic::Removed => &self.removed,
            Topic::PointerClick => &self.pointer_click,
        }
    }

    fn topic_mut(&mut self, topic: Topic) -> &mut BTreeSet<EntityId> {
        match topic {
            Topic::Appeared => &mut self.appeared,
            Topic::Removed => &mut self.removed,
            Topic::PointerClick => &mut self.pointer_click,
        }
    }
}
