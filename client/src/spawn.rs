use log::{info, warn};

use tandem_shared::{ObjectId, RefId, SpawnDataNotify, SpawnRequest, SpawnSnapshot, Vector3};

use crate::{
    actions::RemoteActionLog,
    arbiter::{defer_weapon_draw_if_changed, reconcile_dead_state},
    bindings::Simulation,
    error::SpawnError,
    interpolation::InterpolationComponent,
    scheduler::WeaponDrawQueue,
    world::{Entity, EntityRegistry, OwnershipMarker, RemoteMarker},
};

/// Materializes local representations for remotely-simulated entities once
/// they become relevant (area of interest), from the spawn snapshot cached
/// on their `Remote` marker.
pub struct SpawnCoordinator;

impl SpawnCoordinator {
    pub fn new() -> Self {
        Self
    }

    /// Registers a server-initiated spawn. The entity is tracked as remote
    /// immediately; materialization is left to the spawn pass so only
    /// entities inside the loaded region get a representation.
    pub fn on_spawn_request<S: Simulation>(
        &mut self,
        registry: &mut EntityRegistry,
        request: &SpawnRequest,
        sim: &mut S,
    ) {
        if registry.remote_entity_by_server_id(request.server_id).is_some() {
            warn!("entity {:?} is already spawned", request.server_id);
            return;
        }

        let snapshot = &request.snapshot;

        // Referenced world objects may already be observed locally; fold the
        // spawn onto that entity instead of creating a second one.
        let existing = if snapshot.reference.is_none() {
            None
        } else {
            sim.resolve_reference(snapshot.reference)
                .and_then(|object| registry.entity_by_object(object))
        };
        let entity = existing.unwrap_or_else(|| registry.create_entity());

        let mut remote = RemoteMarker::new(request.server_id, snapshot.clone());
        remote.cached_object = registry.object_of(entity);
        registry.set_marker(entity, OwnershipMarker::Remote(remote));

        registry.set_interpolation(
            entity,
            InterpolationComponent::new(snapshot.position, snapshot.rotation),
        );

        let mut actions = RemoteActionLog::new();
        actions.enqueue(snapshot.latest_action.clone());
        registry.set_remote_actions(entity, actions);

        if let Some(object) = registry.object_of(entity) {
            sim.set_remote(object, true);
        }
    }

    /// A refreshed snapshot for an already-tracked remote entity: update the
    /// cache and apply whatever the existing representation can take now.
    pub fn on_spawn_data<S: Simulation>(
        &mut self,
        registry: &mut EntityRegistry,
        notify: &SpawnDataNotify,
        sim: &mut S,
        weapon_draws: &mut WeaponDrawQueue,
    ) {
        let Some(entity) = registry.remote_entity_by_server_id(notify.server_id) else {
            return;
        };

        if let Some(remote) = registry.remote_marker_mut(entity) {
            remote.snapshot.initial_values = notify.initial_values.clone();
            remote.snapshot.inventory = notify.inventory.clone();
            remote.snapshot.is_dead = notify.is_dead;
            remote.snapshot.is_weapon_drawn = notify.is_weapon_drawn;
        }

        let Some(object) = registry.object_of(entity) else {
            return;
        };
        if !sim.object_exists(object) {
            return;
        }

        sim.set_core_values(object, &notify.initial_values);
        sim.set_inventory(object, &notify.inventory);
        defer_weapon_draw_if_changed(sim, weapon_draws, object, notify.is_weapon_drawn);
        reconcile_dead_state(sim, object, notify.is_dead);
    }

    /// The per-tick spawn pass: every remote entity without a live
    /// representation whose last known position falls inside the loaded
    /// region gets one materialized from its cached snapshot.
    pub fn run<S: Simulation>(&mut self, registry: &mut EntityRegistry, sim: &mut S) {
        for entity in registry.remote_entities() {
            let has_representation = registry
                .object_of(entity)
                .map(|object| sim.object_exists(object))
                .unwrap_or(false);
            if has_representation {
                continue;
            }

            let position = last_known_position(registry, entity);
            if !sim.in_loaded_region(position) {
                continue;
            }

            let Some(snapshot) = registry.remote_marker(entity).map(|r| r.snapshot.clone())
            else {
                continue;
            };

            match materialize(&snapshot, sim) {
                Ok(object) => {
                    if let Some(stale) = registry.unbind_object(entity) {
                        info!("replacing stale representation {:?} of {:?}", stale, entity);
                    }
                    registry.bind_object(entity, object);
                    if let Some(remote) = registry.remote_marker_mut(entity) {
                        remote.cached_object = Some(object);
                    }

                    sim.set_remote(object, true);
                    sim.move_object(object, RefId::NONE, position);
                    sim.set_transform(object, position, snapshot.rotation);
                    sim.set_core_values(object, &snapshot.initial_values);

                    if snapshot.is_player {
                        sim.set_player(object, true);
                        sim.apply_privileged_setup(object);
                    }
                    reconcile_dead_state(sim, object, snapshot.is_dead);

                    registry.set_waiting_for_3d(entity);
                }
                Err(error) => {
                    // Left unmaterialized; the pass retries next tick.
                    warn!("could not materialize {:?}: {}", entity, error);
                }
            }
        }
    }

    /// Second half of materialization: once the visual backing reports
    /// ready, apply the state it could not take earlier and clear the
    /// `WaitingFor3D` marker.
    pub fn finish_pending<S: Simulation>(
        &mut self,
        registry: &mut EntityRegistry,
        sim: &mut S,
        weapon_draws: &mut WeaponDrawQueue,
    ) {
        for entity in registry.remote_entities() {
            if !registry.is_waiting_for_3d(entity) {
                continue;
            }
            let Some(object) = registry.object_of(entity) else {
                continue;
            };
            if !sim.object_exists(object) || !sim.visual_ready(object) {
                continue;
            }
            let Some(snapshot) = registry.remote_marker(entity).map(|r| r.snapshot.clone())
            else {
                continue;
            };

            sim.set_inventory(object, &snapshot.inventory);
            sim.set_factions(object, &snapshot.factions);
            sim.set_animation_variables(object, &snapshot.latest_action.variables);
            defer_weapon_draw_if_changed(sim, weapon_draws, object, snapshot.is_weapon_drawn);
            reconcile_dead_state(sim, object, snapshot.is_dead);

            registry.clear_waiting_for_3d(entity);
        }
    }
}

impl Default for SpawnCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the entity was last seen: the interpolated transform when movement
/// has been received, the cached snapshot position otherwise.
fn last_known_position(registry: &EntityRegistry, entity: Entity) -> Vector3 {
    if let Some(interpolation) = registry.interpolation(entity) {
        return interpolation.position;
    }
    registry
        .remote_marker(entity)
        .map(|remote| remote.snapshot.position)
        .unwrap_or(Vector3::ZERO)
}

/// Resolves the snapshot into a concrete object: an existing referenced
/// world object, an instantiated template, or an embedded appearance
/// payload, in that order.
fn materialize<S: Simulation>(
    snapshot: &SpawnSnapshot,
    sim: &mut S,
) -> Result<ObjectId, SpawnError> {
    if !snapshot.reference.is_none() {
        return sim
            .resolve_reference(snapshot.reference)
            .ok_or(SpawnError::ReferenceUnresolved {
                reference: snapshot.reference,
            });
    }
    sim.spawn_object(snapshot)
}
