use std::collections::HashMap;

use crate::{
    math::{Rotation, Vector3},
    types::{RefId, Tick},
};

/// Animation graph variables captured alongside a movement snapshot or an
/// action event. Indices are meaningful only to the simulation binding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationVariables {
    pub booleans: Vec<bool>,
    pub integers: Vec<i32>,
    pub floats: Vec<f32>,
}

impl AnimationVariables {
    /// Interpolates the float variables, stepping booleans and integers from
    /// the older snapshot.
    pub fn lerp(&self, other: &AnimationVariables, t: f32) -> AnimationVariables {
        let mut floats = self.floats.clone();
        for (index, value) in floats.iter_mut().enumerate() {
            if let Some(target) = other.floats.get(index) {
                *value += (*target - *value) * t;
            }
        }
        AnimationVariables {
            booleans: self.booleans.clone(),
            integers: self.integers.clone(),
            floats,
        }
    }
}

/// One discrete action/animation event, replayed in arrival order on
/// observing participants.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionEvent {
    pub tick: Tick,
    pub kind: u32,
    pub variables: AnimationVariables,
}

/// Opaque serialized appearance for entities without a resolvable template,
/// e.g. player characters and procedurally generated creatures.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppearancePayload {
    pub buffer: Vec<u8>,
}

/// Core stat values (health, stamina, ...) keyed by the simulation's stat
/// indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoreValues {
    pub values: HashMap<u32, f32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventoryEntry {
    pub item: RefId,
    pub count: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub entries: Vec<InventoryEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FactionRank {
    pub faction: RefId,
    pub rank: i8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FactionsSnapshot {
    pub entries: Vec<FactionRank>,
}

/// One quest-progress entry of the privileged/primary entity's log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QuestEntry {
    pub id: RefId,
    pub stage: u16,
}

/// Complete capture of an entity's replicated state at one instant: enough
/// for any participant to (re)materialize a local representation of it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnSnapshot {
    /// Existing world object this entity maps onto, `NONE` for objects that
    /// only exist inside the session.
    pub reference: RefId,
    /// Template to instantiate, `NONE` when `appearance` carries an embedded
    /// payload instead.
    pub template: RefId,
    pub appearance: Option<AppearancePayload>,
    pub change_flags: u32,
    pub cell: RefId,
    pub world_space: RefId,
    pub position: Vector3,
    pub rotation: Rotation,
    pub initial_values: CoreValues,
    pub inventory: InventorySnapshot,
    pub factions: FactionsSnapshot,
    pub is_player: bool,
    pub is_dead: bool,
    pub is_weapon_drawn: bool,
    pub latest_action: ActionEvent,
}
