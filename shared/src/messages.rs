use std::collections::HashMap;

use crate::{
    math::{Rotation, Vector3},
    state::{
        ActionEvent, AnimationVariables, AppearancePayload, CoreValues, FactionsSnapshot,
        InventorySnapshot, QuestEntry, SpawnSnapshot,
    },
    types::{Cookie, RefId, ServerId, Tick},
};

/// Asks the authoritative side to decide who simulates an entity. Carries a
/// full snapshot so either side can take over.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssignmentRequest {
    pub cookie: Cookie,
    pub reference: RefId,
    pub cell: RefId,
    pub world_space: RefId,
    pub position: Vector3,
    pub rotation: Rotation,
    pub change_flags: u32,
    pub appearance: Option<AppearancePayload>,
    pub inventory: InventorySnapshot,
    pub factions: FactionsSnapshot,
    pub values: CoreValues,
    pub is_dead: bool,
    pub is_weapon_drawn: bool,
    pub latest_action: ActionEvent,
    /// Only present for the privileged/primary entity.
    pub quest_log: Option<Vec<QuestEntry>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssignmentResponse {
    pub cookie: Cookie,
    pub granted_local: bool,
    pub server_id: ServerId,
    pub snapshot: SpawnSnapshot,
}

/// Withdraws an in-flight assignment request after its entity disappeared
/// locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CancelAssignment {
    pub cookie: Cookie,
}

/// Server-initiated spawn of a remotely-simulated entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnRequest {
    pub server_id: ServerId,
    pub snapshot: SpawnSnapshot,
}

/// Asks for a refreshed spawn snapshot of an already-tracked remote entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnDataRequest {
    pub server_id: ServerId,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnDataNotify {
    pub server_id: ServerId,
    pub initial_values: CoreValues,
    pub inventory: InventorySnapshot,
    pub is_dead: bool,
    pub is_weapon_drawn: bool,
}

/// Movement and drained action events for one entity, keyed by `ServerId`
/// inside a [`MovementUpdate`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityMovement {
    pub position: Vector3,
    pub rotation: Rotation,
    pub variables: AnimationVariables,
    pub direction: f32,
    pub actions: Vec<ActionEvent>,
}

/// Batched movement+action message, sent by owners and fanned out by the
/// server to observers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovementUpdate {
    pub tick: Tick,
    pub updates: HashMap<ServerId, EntityMovement>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FactionsChangeRequest {
    pub changes: HashMap<ServerId, FactionsSnapshot>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FactionsChangeNotify {
    pub changes: HashMap<ServerId, FactionsSnapshot>,
}

/// Gives up ownership of an entity, or offers a transfer of an entity nobody
/// is known to own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnershipTransferRequest {
    pub server_id: ServerId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnershipTransferNotify {
    pub server_id: ServerId,
}

/// Optimistic claim of a currently remote entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnershipClaim {
    pub server_id: ServerId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveNotify {
    pub server_id: ServerId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RespawnRequest {
    pub server_id: ServerId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RespawnNotify {
    pub server_id: ServerId,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExperienceSyncRequest {
    pub amount: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExperienceSyncNotify {
    pub amount: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialogueRequest {
    pub server_id: ServerId,
    pub sound: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialogueNotify {
    pub server_id: ServerId,
    pub sound: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubtitleRequest {
    pub server_id: ServerId,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubtitleNotify {
    pub server_id: ServerId,
    pub text: String,
}

/// Every message the replication engine hands to the transport. Wire
/// encoding and delivery are the transport's concern.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientMessage {
    Assignment(AssignmentRequest),
    CancelAssignment(CancelAssignment),
    SpawnData(SpawnDataRequest),
    Movement(MovementUpdate),
    FactionsChange(FactionsChangeRequest),
    OwnershipTransfer(OwnershipTransferRequest),
    OwnershipClaim(OwnershipClaim),
    Respawn(RespawnRequest),
    ExperienceSync(ExperienceSyncRequest),
    Dialogue(DialogueRequest),
    Subtitle(SubtitleRequest),
}
