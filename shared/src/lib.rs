//! # Tandem Shared
//! Common identifiers, state snapshots and message shapes shared between the
//! tandem replication engine and its transport layer.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod math;
mod messages;
mod state;
mod timer;
mod types;

pub use math::{Rotation, Vector3};
pub use messages::{
    AssignmentRequest, AssignmentResponse, CancelAssignment, ClientMessage, DialogueNotify,
    DialogueRequest, EntityMovement, ExperienceSyncNotify, ExperienceSyncRequest,
    FactionsChangeNotify, FactionsChangeRequest, MovementUpdate, OwnershipClaim,
    OwnershipTransferNotify, OwnershipTransferRequest, RemoveNotify, RespawnNotify,
    RespawnRequest, SpawnDataNotify, SpawnDataRequest, SpawnRequest, SubtitleNotify,
    SubtitleRequest,
};
pub use state::{
    ActionEvent, AnimationVariables, AppearancePayload, CoreValues, FactionRank,
    FactionsSnapshot, InventoryEntry, InventorySnapshot, QuestEntry, SpawnSnapshot,
};
pub use timer::Timer;
pub use types::{Cookie, ObjectId, RefId, ServerId, Tick};
