use super::creature::{Creature, CreatureId};
use super::region::RegionId;
use serde::{Deserialize, Serialize};

/// Lifecycle change produced by one region tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A creature was bred inside `region`.
    Birth { region: RegionId, creature: Creature },
    /// A creature died of age, crowding and poor adaptation.
    Death { region: RegionId, creature: Creature },
    /// A creature left `from` and was re-minted in `to` as `arrival`.
    /// `creature` is the departing record under its old identity.
    Migration {
        creature: Creature,
        from: RegionId,
        to: RegionId,
        arrival: CreatureId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Birth,
    Death,
    Migration,
}

impl LifecycleEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::Birth { .. } => EventKind::Birth,
            LifecycleEvent::Death { .. } => EventKind::Death,
            LifecycleEvent::Migration { .. } => EventKind::Migration,
        }
    }

    #[must_use]
    pub fn creature(&self) -> &Creature {
        match self {
            LifecycleEvent::Birth { creature, .. }
            | LifecycleEvent::Death { creature, .. }
            | LifecycleEvent::Migration { creature, .. } => creature,
        }
    }

    /// Region whose tick produced the event (the source, for migrations).
    #[must_use]
    pub fn region(&self) -> &RegionId {
        match self {
            LifecycleEvent::Birth { region, .. } | LifecycleEvent::Death { region, .. } => region,
            LifecycleEvent::Migration { from, .. } => from,
        }
    }

    #[must_use]
    pub fn is_migration(&self) -> bool {
        matches!(self, LifecycleEvent::Migration { .. })
    }
}
