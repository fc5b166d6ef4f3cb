use std::collections::{HashMap, HashSet};

use log::{error, info, warn};

use tandem_shared::{
    AssignmentRequest, AssignmentResponse, CancelAssignment, ClientMessage, Cookie, ObjectId,
    OwnershipClaim, OwnershipTransferRequest, QuestEntry, RefId, ServerId, SpawnDataRequest,
};

use crate::{
    actions::{LocalActionLog, RemoteActionLog},
    bindings::{Simulation, Transport},
    error::ReplicationError,
    interpolation::InterpolationComponent,
    scheduler::WeaponDrawQueue,
    world::{Entity, EntityRegistry, OwnershipMarker, RemoteMarker},
};

/// State machine deciding who simulates each entity, and owner of the
/// cookie-correlation protocol for assignment requests.
///
/// `Unowned -> WaitingForAssignment(cookie) -> {Local | Remote}`; a remote
/// entity can be claimed optimistically (`Remote -> Local`), and any state
/// collapses back to unowned on disconnect.
pub struct OwnershipArbiter {
    cookie_seed: u32,
    /// In-flight assignment requests. An entry can outlive its entity's
    /// waiting marker when a concurrent spawn resolves ownership first; the
    /// late response then only applies incremental corrections.
    in_flight: HashMap<Cookie, Entity>,
}

impl OwnershipArbiter {
    pub fn new() -> Self {
        Self {
            cookie_seed: 0,
            in_flight: HashMap::new(),
        }
    }

    /// Entry point for an object newly observed in the local simulation.
    /// Requests spawn data for known remotes, seeds the factions cache and
    /// requests an ownership assignment for unmarked entities.
    pub fn process_new_entity<S: Simulation, T: Transport>(
        &mut self,
        registry: &mut EntityRegistry,
        entity: Entity,
        sim: &mut S,
        transport: &mut T,
    ) {
        if !transport.is_online() {
            return;
        }
        let Some(object) = registry.object_of(entity) else {
            return;
        };
        if !sim.object_exists(object) {
            return;
        }

        if let Some(remote) = registry.remote_marker(entity) {
            let server_id = remote.server_id;
            transport.send(ClientMessage::SpawnData(SpawnDataRequest { server_id }));
        }

        if registry.marker(entity).is_some() {
            return;
        }

        registry.set_faction_cache(entity, sim.factions(object).unwrap_or_default());
        self.request_assignment(registry, entity, sim, transport);
    }

    /// Sends an assignment request carrying a full state snapshot, so the
    /// authoritative side can hand the entity to either participant. The
    /// waiting marker is only attached once the transport accepted the
    /// message; on send failure the caller may simply retry.
    pub fn request_assignment<S: Simulation, T: Transport>(
        &mut self,
        registry: &mut EntityRegistry,
        entity: Entity,
        sim: &mut S,
        transport: &mut T,
    ) {
        if !transport.is_online() {
            return;
        }
        let Some(object) = registry.object_of(entity) else {
            warn!("{}", ReplicationError::ObjectNotBound { entity });
            return;
        };

        let cookie = Cookie::new(self.cookie_seed);
        let message = match build_assignment_request(object, cookie, sim) {
            Ok(message) => message,
            Err(error) => {
                error!("assignment request for {:?} aborted: {}", entity, error);
                return;
            }
        };

        info!(
            "requesting assignment for {:?}, object {:?}, cookie {:?}",
            entity, object, cookie
        );

        if transport.send(ClientMessage::Assignment(message)) {
            registry.set_marker(entity, OwnershipMarker::WaitingForAssignment { cookie });
            self.in_flight.insert(cookie, entity);
            self.cookie_seed = self.cookie_seed.wrapping_add(1);
        }
    }

    /// Resolves an in-flight assignment request. Unknown cookies are benign
    /// races with cancellation or disconnect and are dropped with a warning.
    pub fn on_assignment_response<S: Simulation>(
        &mut self,
        registry: &mut EntityRegistry,
        response: &AssignmentResponse,
        sim: &mut S,
        weapon_draws: &mut WeaponDrawQueue,
    ) {
        info!("assignment response for cookie {:?}", response.cookie);

        let Some(entity) = self.in_flight.remove(&response.cookie) else {
            warn!(
                "{}",
                ReplicationError::CookieNotFound {
                    cookie: response.cookie
                }
            );
            return;
        };
        if !registry.contains(entity) {
            warn!(
                "entity for cookie {:?} disappeared before the response arrived",
                response.cookie
            );
            return;
        }

        if matches!(
            registry.marker(entity),
            Some(OwnershipMarker::WaitingForAssignment { .. })
        ) {
            registry.clear_marker(entity);
        }

        let Some(object) = registry.object_of(entity) else {
            error!(
                "assignment response for cookie {:?}: {}",
                response.cookie,
                ReplicationError::ObjectNotBound { entity }
            );
            return;
        };

        let snapshot = &response.snapshot;

        // Ownership was already settled by a concurrent spawn; only pick up
        // the incremental corrections.
        if registry.marker(entity).is_some() {
            reconcile_dead_state(sim, object, snapshot.is_dead);
            defer_weapon_draw_if_changed(sim, weapon_draws, object, snapshot.is_weapon_drawn);
            return;
        }

        if response.granted_local {
            registry.set_marker(
                entity,
                OwnershipMarker::Local {
                    server_id: response.server_id,
                },
            );
            registry.set_local_actions(entity, LocalActionLog::new());
            return;
        }

        if !sim.object_exists(object) {
            registry.destroy_entity(entity);
            return;
        }

        let mut remote = RemoteMarker::new(response.server_id, snapshot.clone());
        remote.cached_object = Some(object);
        registry.set_marker(entity, OwnershipMarker::Remote(remote));

        sim.set_remote(object, true);
        registry.set_interpolation(
            entity,
            InterpolationComponent::new(snapshot.position, snapshot.rotation),
        );
        registry.set_remote_actions(entity, RemoteActionLog::new());

        sim.set_core_values(object, &snapshot.initial_values);
        reconcile_dead_state(sim, object, snapshot.is_dead);
        defer_weapon_draw_if_changed(sim, weapon_draws, object, snapshot.is_weapon_drawn);
        sim.move_object(object, snapshot.cell, snapshot.position);
    }

    /// Claims a currently remote entity for local simulation, optimistically:
    /// the marker flips before the authoritative side confirms. A later
    /// reassignment through a fresh assignment cycle is accepted
    /// idempotently.
    pub fn request_ownership_transfer<S: Simulation, T: Transport>(
        &mut self,
        registry: &mut EntityRegistry,
        entity: Entity,
        sim: &mut S,
        transport: &mut T,
    ) {
        let server_id = match registry.remote_marker(entity) {
            Some(remote) => remote.server_id,
            None => {
                warn!("ownership transfer requested for non-remote entity {:?}", entity);
                return;
            }
        };

        registry.clear_marker(entity);
        registry.strip_replication(entity);
        if let Some(object) = registry.object_of(entity) {
            sim.set_remote(object, false);
        }

        registry.set_marker(entity, OwnershipMarker::Local { server_id });
        registry.set_local_actions(entity, LocalActionLog::new());

        transport.send(ClientMessage::OwnershipClaim(OwnershipClaim { server_id }));
        info!("ownership claimed for {:?}", server_id);
    }

    /// The authoritative side announced a transfer of this entity. A local
    /// holder is demoted and re-enters the assignment flow; otherwise the
    /// transfer offer is re-broadcast since another participant presumably
    /// owns it.
    pub fn on_transfer_notification<S: Simulation, T: Transport>(
        &mut self,
        registry: &mut EntityRegistry,
        server_id: ServerId,
        sim: &mut S,
        transport: &mut T,
    ) {
        if let Some(entity) = registry.local_entity_by_server_id(server_id) {
            registry.clear_marker(entity);
            registry.remove_local_actions(entity);
            self.request_assignment(registry, entity, sim, transport);
            return;
        }

        warn!("no locally-owned entity for ownership transfer {:?}", server_id);
        transport.send(ClientMessage::OwnershipTransfer(OwnershipTransferRequest {
            server_id,
        }));
    }

    /// The server instructed removal of a remote entity.
    pub fn on_remove_notification<S: Simulation>(
        &mut self,
        registry: &mut EntityRegistry,
        server_id: ServerId,
        sim: &mut S,
    ) {
        let Some(entity) = registry.remote_entity_by_server_id(server_id) else {
            warn!("{}", ReplicationError::ServerIdNotFound { server_id });
            return;
        };

        if let Some(object) = registry.object_of(entity) {
            if sim.is_temporary(object) {
                info!("deleting temporary representation {:?}", object);
                sim.destroy_object(object);
                registry.unbind_object(entity);
            }
        }

        registry.clear_marker(entity);
        registry.strip_replication(entity);
        registry.destroy_if_bare(entity);
    }

    /// Withdraws an entity from replication: cancels an in-flight request,
    /// releases local ownership, or tears down remote replication state.
    pub fn cancel<S: Simulation, T: Transport>(
        &mut self,
        registry: &mut EntityRegistry,
        entity: Entity,
        sim: &mut S,
        transport: &mut T,
    ) {
        match registry.marker(entity).cloned() {
            Some(OwnershipMarker::Remote(_)) => {
                if let Some(object) = registry.object_of(entity) {
                    if sim.is_temporary(object) && sim.object_exists(object) {
                        info!("deleting temporary representation {:?}", object);
                        sim.destroy_object(object);
                        registry.unbind_object(entity);
                    }
                }
                registry.clear_marker(entity);
                registry.strip_replication(entity);
            }
            Some(OwnershipMarker::WaitingForAssignment { cookie }) => {
                transport.send(ClientMessage::CancelAssignment(CancelAssignment { cookie }));
                self.in_flight.remove(&cookie);
                registry.clear_marker(entity);
            }
            Some(OwnershipMarker::Local { server_id }) => {
                transport.send(ClientMessage::OwnershipTransfer(OwnershipTransferRequest {
                    server_id,
                }));
                registry.clear_marker(entity);
                registry.remove_local_actions(entity);
            }
            None => {}
        }
    }

    /// A session was established: run every previously-observed object
    /// through the assignment flow. Session-temporary leftovers from an
    /// earlier connection are destroyed instead.
    pub fn on_connected<S: Simulation, T: Transport>(
        &mut self,
        registry: &mut EntityRegistry,
        sim: &mut S,
        transport: &mut T,
    ) {
        for entity in registry.entities() {
            let Some(object) = registry.object_of(entity) else {
                continue;
            };

            if sim.is_temporary(object) {
                if sim.object_exists(object) {
                    sim.destroy_object(object);
                }
                registry.unbind_object(entity);
                registry.destroy_if_bare(entity);
                continue;
            }

            self.process_new_entity(registry, entity, sim, transport);
        }
    }

    /// The transport closed: every ownership marker is stripped, leaving
    /// bare identity state. Remote player representations are destroyed,
    /// persistent representations are handed back to local simulation.
    pub fn on_disconnected<S: Simulation>(&mut self, registry: &mut EntityRegistry, sim: &mut S) {
        for entity in registry.entities() {
            if let Some(remote) = registry.remote_marker(entity) {
                let is_remote_player = remote.snapshot.is_player;
                if let Some(object) = registry.object_of(entity) {
                    if sim.object_exists(object) {
                        if is_remote_player {
                            sim.destroy_object(object);
                            registry.unbind_object(entity);
                        } else {
                            sim.set_remote(object, false);
                        }
                    }
                }
            }

            registry.clear_marker(entity);
            registry.strip_replication(entity);
            registry.remove_local_actions(entity);
            registry.destroy_if_bare(entity);
        }

        self.in_flight.clear();
    }

    /// Number of assignment requests currently awaiting a response.
    pub fn in_flight_requests(&self) -> usize {
        self.in_flight.len()
    }
}

impl Default for OwnershipArbiter {
    fn default() -> Self {
        Self::new()
    }
}

fn build_assignment_request<S: Simulation>(
    object: ObjectId,
    cookie: Cookie,
    sim: &S,
) -> Result<AssignmentRequest, ReplicationError> {
    let unresolved = ReplicationError::ObjectUnresolved { object };

    let reference = sim.reference_of(object).ok_or(unresolved.clone())?;
    let cell = sim.cell_of(object).ok_or(unresolved.clone())?;
    let world_space = sim.world_space_of(object).unwrap_or(RefId::NONE);
    let position = sim.position(object).ok_or(unresolved.clone())?;
    let rotation = sim.rotation(object).ok_or(unresolved.clone())?;
    let inventory = sim.inventory(object).ok_or(unresolved.clone())?;
    let factions = sim.factions(object).ok_or(unresolved.clone())?;
    let values = sim.core_values(object).ok_or(unresolved.clone())?;
    let is_dead = sim.is_dead(object).ok_or(unresolved.clone())?;
    let is_weapon_drawn = sim.is_weapon_drawn(object).ok_or(unresolved)?;

    let (appearance, change_flags) = match sim.appearance(object) {
        Some((payload, flags)) => (Some(payload), flags),
        None => (None, 0),
    };

    let is_player = object == sim.player_object();
    let quest_log = if is_player {
        Some(dedup_quest_log(sim.quest_log()))
    } else {
        None
    };

    Ok(AssignmentRequest {
        cookie,
        reference,
        cell,
        world_space,
        position,
        rotation,
        change_flags,
        appearance,
        inventory,
        factions,
        values,
        is_dead,
        is_weapon_drawn,
        latest_action: sim.latest_action(object).unwrap_or_default(),
        quest_log,
    })
}

fn dedup_quest_log(entries: Vec<QuestEntry>) -> Vec<QuestEntry> {
    let mut seen = HashSet::new();
    entries.into_iter().filter(|entry| seen.insert(*entry)).collect()
}

/// Kills or revives the object only when its current state disagrees with
/// the replicated flag.
pub(crate) fn reconcile_dead_state<S: Simulation>(sim: &mut S, object: ObjectId, dead: bool) {
    if sim.is_dead(object) != Some(dead) {
        sim.set_dead(object, dead);
    }
}

/// Queues a deferred weapon-draw change when the replicated flag disagrees
/// with the object's current state.
pub(crate) fn defer_weapon_draw_if_changed<S: Simulation>(
    sim: &S,
    weapon_draws: &mut WeaponDrawQueue,
    object: ObjectId,
    drawn: bool,
) {
    if sim.is_weapon_drawn(object) != Some(drawn) {
        weapon_draws.defer(object, drawn);
    }
}
