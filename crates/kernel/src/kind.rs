use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What an entity is. Behaviour differences live in [`KindRegistry`], not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Car,
    Truck,
    Van,
    /// Game-defined kind; its capabilities come from the registry.
    Custom(u32),
}

/// Per-kind behaviour flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub movable: bool,
}

/// Capability table keyed by kind.
///
/// Built-in vehicle kinds are movable. Kinds that were never registered get
/// `Capabilities::default()`, i.e. they stay put.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindRegistry {
    table: BTreeMap<EntityKind, Capabilities>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        let movable = Capabilities { movable: true };
        let table = [
            (EntityKind::Car, movable),
            (EntityKind::Truck, movable),
            (EntityKind::Van, movable),
        ]
        .into_iter()
        .collect();
        Self { table }
    }
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a kind's capabilities, returning the previous entry.
    pub fn register(&mut self, kind: EntityKind, caps: Capabilities) -> Option<Capabilities> {
        self.table.insert(kind, caps)
    }

    /// Capabilities for `kind`; unregistered kinds are immovable.
    pub fn capabilities(&self, kind: EntityKind) -> Capabilities {
        self.table.get(&kind).copied().unwrap_or_default()
    }

    /// Whether the tick moves entities of this kind.
    pub fn is_movable(&self, kind: EntityKind) -> bool {
        self.capabilities(kind).movable
    }

    /// Registered kinds in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.table.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicles_are_movable_by_default() {
        let r = KindRegistry::new();
        assert!(r.is_movable(EntityKind::Car));
        assert!(r.is_movable(EntityKind::Truck));
        assert!(r.is_movable(EntityKind::Van));
    }

    #[test]
    fn unknown_custom_kind_is_static() {
        let r = KindRegistry::new();
        assert!(!r.is_movable(EntityKind::Custom(7)));
    }

    #[test]
    fn register_overrides() {
        let mut r = KindRegistry::new();
        let prev = r.register(EntityKind::Truck, Capabilities { movable: false });
        assert_eq!(prev, Some(Capabilities { movable: true }));
        assert!(!r.is_movable(EntityKind::Truck));

        assert!(r.register(EntityKind::Custom(1), Capabilities { movable: true }).is_none());
        assert!(r.is_movable(EntityKind::Custom(1)));
        assert_eq!(r.kinds().count(), 4);
    }
}
