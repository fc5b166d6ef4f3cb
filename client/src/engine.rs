use log::{error, warn};

use tandem_shared::{
    ActionEvent, AssignmentResponse, ClientMessage, DialogueNotify, DialogueRequest,
    ExperienceSyncNotify, FactionsChangeNotify, MovementUpdate, ObjectId, OwnershipTransferNotify,
    RemoveNotify, RespawnNotify, RespawnRequest, ServerId, SpawnDataNotify, SpawnRequest,
    SubtitleNotify, SubtitleRequest,
};

use crate::{
    arbiter::OwnershipArbiter,
    bindings::{Simulation, Transport},
    interpolation::MovementPoint,
    scheduler::{ReplicationScheduler, SchedulerConfig},
    spawn::SpawnCoordinator,
    world::{Entity, EntityRegistry},
};

/// The replication engine: single owner of the entity registry, dispatching
/// simulation events and inbound network messages to the ownership arbiter,
/// spawn coordinator and scheduler.
///
/// All mutation happens on one logical update thread. The embedding
/// application queues inbound messages and hands them over between tick
/// passes; [`ReplicationEngine::update`] then drives the per-tick passes in
/// fixed order. The simulation binding is expected to report every object
/// destruction through [`ReplicationEngine::on_object_removed`], including
/// destructions the engine itself initiated.
pub struct ReplicationEngine {
    registry: EntityRegistry,
    arbiter: OwnershipArbiter,
    spawner: SpawnCoordinator,
    scheduler: ReplicationScheduler,
}

impl ReplicationEngine {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            registry: EntityRegistry::new(),
            arbiter: OwnershipArbiter::new(),
            spawner: SpawnCoordinator::new(),
            scheduler: ReplicationScheduler::new(config),
        }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn in_flight_requests(&self) -> usize {
        self.arbiter.in_flight_requests()
    }

    // Per-tick driver

    /// Runs one replication tick, in fixed order: spawn pass, local
    /// broadcast, remote-state application, faction diff, experience sync,
    /// deferred weapon draws.
    pub fn update<S: Simulation, T: Transport>(
        &mut self,
        delta_seconds: f32,
        sim: &mut S,
        transport: &mut T,
    ) {
        self.spawner.run(&mut self.registry, sim);
        self.scheduler.broadcast_movement(&mut self.registry, sim, transport);
        self.scheduler.apply_remote_state(&mut self.registry, sim, transport);
        self.spawner
            .finish_pending(&mut self.registry, sim, self.scheduler.weapon_draws_mut());
        self.scheduler
            .broadcast_faction_changes(&mut self.registry, sim, transport);
        self.scheduler.broadcast_experience(sim, transport);
        self.scheduler.apply_deferred_weapon_draws(delta_seconds, sim);
    }

    // Local simulation events

    /// An object appeared in the local simulation: correlate it against a
    /// tracked remote entity or start the assignment flow for it.
    pub fn on_object_added<S: Simulation, T: Transport>(
        &mut self,
        object: ObjectId,
        sim: &mut S,
        transport: &mut T,
    ) {
        if object == sim.player_object() {
            sim.set_player(object, true);
        }

        let entity = if let Some(entity) = self.registry.remote_entity_by_cached_object(object) {
            sim.set_remote(object, true);
            entity
        } else if let Some(entity) = self.registry.entity_by_object(object) {
            entity
        } else {
            self.registry.create_entity()
        };
        self.registry.bind_object(entity, object);

        self.arbiter
            .process_new_entity(&mut self.registry, entity, sim, transport);
    }

    /// An object disappeared from the local simulation.
    pub fn on_object_removed<S: Simulation, T: Transport>(
        &mut self,
        object: ObjectId,
        sim: &mut S,
        transport: &mut T,
    ) {
        let Some(entity) = self.registry.entity_by_object(object) else {
            error!("object to remove is not tracked: {:?}", object);
            return;
        };

        self.arbiter.cancel(&mut self.registry, entity, sim, transport);
        self.registry.unbind_object(entity);
        self.registry.destroy_if_bare(entity);
    }

    /// A discrete action was captured on a locally-simulated object.
    pub fn on_action_event(&mut self, object: ObjectId, event: ActionEvent) {
        let Some(entity) = self.registry.entity_by_object(object) else {
            return;
        };
        if let Some(log) = self.registry.local_actions_mut(entity) {
            log.append(event);
        }
    }

    /// The local player earned experience worth sharing with the group.
    pub fn on_experience_gained(&mut self, amount: f32) {
        self.scheduler.accumulate_experience(amount);
    }

    /// A locally-simulated speaker started a voice line.
    pub fn on_dialogue_event<T: Transport>(
        &mut self,
        object: ObjectId,
        sound: &str,
        transport: &mut T,
    ) {
        if !transport.is_connected() {
            return;
        }
        let Some(server_id) = self.server_id_for_outbound(object) else {
            return;
        };
        transport.send(ClientMessage::Dialogue(DialogueRequest {
            server_id,
            sound: sound.to_owned(),
        }));
    }

    /// A locally-simulated speaker displayed a subtitle.
    pub fn on_subtitle_event<T: Transport>(
        &mut self,
        object: ObjectId,
        text: &str,
        transport: &mut T,
    ) {
        if !transport.is_connected() {
            return;
        }
        let Some(server_id) = self.server_id_for_outbound(object) else {
            return;
        };
        transport.send(ClientMessage::Subtitle(SubtitleRequest {
            server_id,
            text: text.to_owned(),
        }));
    }

    /// Local gameplay wants control of a currently remote entity.
    pub fn request_ownership_transfer<S: Simulation, T: Transport>(
        &mut self,
        entity: Entity,
        sim: &mut S,
        transport: &mut T,
    ) {
        self.arbiter
            .request_ownership_transfer(&mut self.registry, entity, sim, transport);
    }

    // Connection lifecycle

    pub fn on_connected<S: Simulation, T: Transport>(&mut self, sim: &mut S, transport: &mut T) {
        self.arbiter.on_connected(&mut self.registry, sim, transport);
    }

    pub fn on_disconnected<S: Simulation>(&mut self, sim: &mut S) {
        self.arbiter.on_disconnected(&mut self.registry, sim);
    }

    // Inbound network messages

    pub fn on_assignment_response<S: Simulation>(
        &mut self,
        response: &AssignmentResponse,
        sim: &mut S,
    ) {
        self.arbiter.on_assignment_response(
            &mut self.registry,
            response,
            sim,
            self.scheduler.weapon_draws_mut(),
        );
    }

    pub fn on_spawn_request<S: Simulation>(&mut self, request: &SpawnRequest, sim: &mut S) {
        self.spawner.on_spawn_request(&mut self.registry, request, sim);
    }

    pub fn on_spawn_data<S: Simulation>(&mut self, notify: &SpawnDataNotify, sim: &mut S) {
        self.spawner.on_spawn_data(
            &mut self.registry,
            notify,
            sim,
            self.scheduler.weapon_draws_mut(),
        );
    }

    /// Routes per-entity movement snapshots and action events into the
    /// interpolation buffers and remote action logs. Unknown server ids are
    /// skipped; the entity may have been removed concurrently.
    pub fn on_movement_update(&mut self, update: &MovementUpdate) {
        for (server_id, movement) in &update.updates {
            let Some(entity) = self.registry.remote_entity_by_server_id(*server_id) else {
                continue;
            };

            if let Some(interpolation) = self.registry.interpolation_mut(entity) {
                interpolation.add_point(MovementPoint {
                    tick: update.tick,
                    position: movement.position,
                    rotation: movement.rotation,
                    variables: movement.variables.clone(),
                    direction: movement.direction,
                });
            }

            if let Some(log) = self.registry.remote_actions_mut(entity) {
                for action in &movement.actions {
                    log.enqueue(action.clone());
                }
            }
        }
    }

    pub fn on_factions_change<S: Simulation>(
        &mut self,
        notify: &FactionsChangeNotify,
        sim: &mut S,
    ) {
        for (server_id, factions) in &notify.changes {
            let Some(entity) = self.registry.remote_entity_by_server_id(*server_id) else {
                continue;
            };
            let Some(object) = self
                .registry
                .object_of(entity)
                .filter(|object| sim.object_exists(*object))
            else {
                continue;
            };

            self.registry.set_faction_cache(entity, factions.clone());
            sim.set_factions(object, factions);
        }
    }

    pub fn on_ownership_transfer<S: Simulation, T: Transport>(
        &mut self,
        notify: &OwnershipTransferNotify,
        sim: &mut S,
        transport: &mut T,
    ) {
        self.arbiter
            .on_transfer_notification(&mut self.registry, notify.server_id, sim, transport);
    }

    pub fn on_remove_character<S: Simulation>(&mut self, notify: &RemoveNotify, sim: &mut S) {
        self.arbiter
            .on_remove_notification(&mut self.registry, notify.server_id, sim);
    }

    /// The server wants this entity's representation torn down and respawned
    /// from fresh spawn data.
    pub fn on_respawn<S: Simulation, T: Transport>(
        &mut self,
        notify: &RespawnNotify,
        sim: &mut S,
        transport: &mut T,
    ) {
        let Some(entity) = self.registry.entity_by_server_id(notify.server_id) else {
            error!("no tracked entity for respawn of {:?}", notify.server_id);
            return;
        };

        if let Some(object) = self.registry.object_of(entity) {
            if sim.object_exists(object) {
                sim.destroy_object(object);
            }
        }

        transport.send(ClientMessage::Respawn(RespawnRequest {
            server_id: notify.server_id,
        }));
    }

    pub fn on_experience_sync<S: Simulation>(
        &mut self,
        notify: &ExperienceSyncNotify,
        sim: &mut S,
    ) {
        sim.apply_combat_experience(notify.amount);
    }

    pub fn on_dialogue<S: Simulation>(&mut self, notify: &DialogueNotify, sim: &mut S) {
        let Some(object) = self.remote_object_for(notify.server_id) else {
            warn!("no speaker for dialogue of {:?}", notify.server_id);
            return;
        };
        sim.speak(object, &notify.sound);
    }

    pub fn on_subtitle<S: Simulation>(&mut self, notify: &SubtitleNotify, sim: &mut S) {
        let Some(object) = self.remote_object_for(notify.server_id) else {
            warn!("no speaker for subtitle of {:?}", notify.server_id);
            return;
        };
        sim.show_subtitle(object, &notify.text);
    }

    // Helpers

    fn server_id_for_outbound(&self, object: ObjectId) -> Option<ServerId> {
        let entity = self.registry.entity_by_object(object)?;
        let server_id = self.registry.server_id_of(entity);
        if server_id.is_none() {
            error!("no server id for outbound event of {:?}", object);
        }
        server_id
    }

    fn remote_object_for(&self, server_id: ServerId) -> Option<ObjectId> {
        let entity = self.registry.remote_entity_by_server_id(server_id)?;
        self.registry.object_of(entity)
    }
}

impl Default for ReplicationEngine {
    fn default() -> Self {
        Self::new()
    }
}
