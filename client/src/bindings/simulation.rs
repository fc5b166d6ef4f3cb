use tandem_shared::{
    ActionEvent, AnimationVariables, AppearancePayload, CoreValues, FactionsSnapshot,
    InventorySnapshot, ObjectId, QuestEntry, RefId, Rotation, SpawnSnapshot, Vector3,
};

use crate::error::SpawnError;

/// Narrow interface onto the simulation-binding collaborator: everything the
/// replication engine needs from the native game simulation, keyed by opaque
/// [`ObjectId`] handles.
///
/// Getters return `None` when the object cannot be resolved (despawned,
/// unloaded); the engine treats that as a transient condition and retries on
/// a later tick where the spec requires it.
pub trait Simulation {
    // Resolution

    fn object_exists(&self, object: ObjectId) -> bool;

    /// Maps a module-qualified reference onto a concrete object id, without
    /// materializing anything.
    fn resolve_reference(&self, reference: RefId) -> Option<ObjectId>;

    /// Reverse mapping of [`Self::resolve_reference`]: the module-qualified
    /// reference of a concrete object. `None` when the object cannot be
    /// mapped into the session's id space (content mismatch).
    fn reference_of(&self, object: ObjectId) -> Option<RefId>;

    /// The privileged/primary entity's backing object (the local player).
    fn player_object(&self) -> ObjectId;

    /// Whether the object only exists for the duration of this session and
    /// should be destroyed rather than released when replication ends.
    fn is_temporary(&self, object: ObjectId) -> bool;

    // Lifecycle

    /// Materializes a local representation from a spawn snapshot, resolving
    /// the template or deserializing the embedded appearance payload.
    fn spawn_object(&mut self, snapshot: &SpawnSnapshot) -> Result<ObjectId, SpawnError>;

    fn destroy_object(&mut self, object: ObjectId);

    // Transform

    fn position(&self, object: ObjectId) -> Option<Vector3>;

    fn rotation(&self, object: ObjectId) -> Option<Rotation>;

    fn movement_direction(&self, object: ObjectId) -> Option<f32>;

    fn cell_of(&self, object: ObjectId) -> Option<RefId>;

    fn world_space_of(&self, object: ObjectId) -> Option<RefId>;

    /// Per-tick interpolated transform apply; never changes cell membership.
    fn set_transform(&mut self, object: ObjectId, position: Vector3, rotation: Rotation);

    /// Teleports the object into a cell. A `RefId::NONE` cell means the
    /// observer's current cell; implementations lazily load exterior cells
    /// from the world space when needed.
    fn move_object(&mut self, object: ObjectId, cell: RefId, position: Vector3);

    // Replicated state

    fn inventory(&self, object: ObjectId) -> Option<InventorySnapshot>;

    fn set_inventory(&mut self, object: ObjectId, inventory: &InventorySnapshot);

    fn factions(&self, object: ObjectId) -> Option<FactionsSnapshot>;

    fn set_factions(&mut self, object: ObjectId, factions: &FactionsSnapshot);

    fn core_values(&self, object: ObjectId) -> Option<CoreValues>;

    fn set_core_values(&mut self, object: ObjectId, values: &CoreValues);

    fn is_dead(&self, object: ObjectId) -> Option<bool>;

    fn set_dead(&mut self, object: ObjectId, dead: bool);

    fn is_weapon_drawn(&self, object: ObjectId) -> Option<bool>;

    fn set_weapon_drawn(&mut self, object: ObjectId, drawn: bool);

    fn animation_variables(&self, object: ObjectId) -> Option<AnimationVariables>;

    fn set_animation_variables(&mut self, object: ObjectId, variables: &AnimationVariables);

    /// Latest captured action of the object, with its animation variables.
    fn latest_action(&self, object: ObjectId) -> Option<ActionEvent>;

    fn play_action(&mut self, object: ObjectId, event: &ActionEvent);

    /// Serialized appearance and change flags, `Some` only when the object
    /// carries session-local or changed appearance data worth replicating.
    fn appearance(&self, object: ObjectId) -> Option<(AppearancePayload, u32)>;

    // Flags & privileged setup

    /// Marks the object as simulated elsewhere (suppresses local AI).
    fn set_remote(&mut self, object: ObjectId, remote: bool);

    fn set_player(&mut self, object: ObjectId, player: bool);

    /// Player-only setup on a materialized remote: map-marker visibility,
    /// friendly-hit immunity, player respawn mode.
    fn apply_privileged_setup(&mut self, object: ObjectId);

    // Observer context

    /// Whether a position falls inside the currently loaded simulation
    /// region around the observer (area of interest).
    fn in_loaded_region(&self, position: Vector3) -> bool;

    /// Whether the object's visual/physical backing is ready to accept full
    /// state (inventory, dead flag, weapon draw).
    fn visual_ready(&self, object: ObjectId) -> bool;

    /// Whether the local player is currently grouped with other
    /// participants.
    fn is_grouped(&self) -> bool;

    /// Quest-progress log of the privileged entity. May contain duplicates;
    /// the engine deduplicates before sending.
    fn quest_log(&self) -> Vec<QuestEntry>;

    /// Credits shared experience to the local player's active skill.
    fn apply_combat_experience(&mut self, amount: f32);

    // Dialogue passthrough

    fn speak(&mut self, object: ObjectId, sound: &str);

    fn show_subtitle(&mut self, object: ObjectId, text: &str);
}
