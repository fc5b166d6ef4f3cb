use std::collections::HashMap;
use std::time::Duration;

use log::debug;

use tandem_shared::{
    ClientMessage, EntityMovement, ExperienceSyncRequest, FactionsChangeRequest, MovementUpdate,
    ObjectId, Tick, Timer,
};

use crate::{
    bindings::{Simulation, Transport},
    interpolation::INTERPOLATION_DELAY,
    world::EntityRegistry,
};

/// Broadcast cooldowns and apply delays, overridable for tests.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// Minimum interval between movement+action broadcasts.
    pub movement_cooldown: Duration,
    /// Minimum interval between faction-diff broadcasts.
    pub factions_cooldown: Duration,
    /// Minimum interval between experience broadcasts.
    pub experience_cooldown: Duration,
    /// Seconds a weapon-draw change stays pending before it is applied,
    /// masking the animation-transition latency.
    pub weapon_draw_delay: f32,
    /// Playback delay of remote interpolation, in ticks.
    pub interpolation_delay: Tick,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            movement_cooldown: Duration::from_millis(100),
            factions_cooldown: Duration::from_millis(2000),
            experience_cooldown: Duration::from_millis(1000),
            weapon_draw_delay: 0.5,
            interpolation_delay: INTERPOLATION_DELAY,
        }
    }
}

/// Weapon-draw changes held back for a short delay before being applied to
/// the local representation.
pub struct WeaponDrawQueue {
    pending: HashMap<ObjectId, PendingDraw>,
}

struct PendingDraw {
    elapsed: f32,
    desired: bool,
}

impl WeaponDrawQueue {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    pub fn defer(&mut self, object: ObjectId, desired: bool) {
        self.pending.insert(
            object,
            PendingDraw {
                elapsed: 0.0,
                desired,
            },
        );
    }

    /// Advances all pending entries and applies those past the delay. An
    /// entry whose object cannot be resolved stays queued for a later tick.
    pub fn update<S: Simulation>(&mut self, delta_seconds: f32, delay: f32, sim: &mut S) {
        let mut applied = Vec::new();

        for (object, pending) in self.pending.iter_mut() {
            pending.elapsed += delta_seconds;
            if pending.elapsed <= delay {
                continue;
            }
            if !sim.object_exists(*object) {
                continue;
            }
            sim.set_weapon_drawn(*object, pending.desired);
            applied.push(*object);
        }

        for object in applied {
            self.pending.remove(&object);
        }
    }

    pub fn is_pending(&self, object: ObjectId) -> bool {
        self.pending.contains_key(&object)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for WeaponDrawQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Tick-driven half of the engine: rate-limited outbound broadcasts, remote
/// state application and the deferred weapon-draw queue.
pub struct ReplicationScheduler {
    config: SchedulerConfig,
    movement_timer: Timer,
    factions_timer: Timer,
    experience_timer: Timer,
    cached_experience: f32,
    weapon_draws: WeaponDrawQueue,
}

impl ReplicationScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            movement_timer: Timer::new(config.movement_cooldown),
            factions_timer: Timer::new(config.factions_cooldown),
            experience_timer: Timer::new(config.experience_cooldown),
            cached_experience: 0.0,
            weapon_draws: WeaponDrawQueue::new(),
        }
    }

    pub fn weapon_draws_mut(&mut self) -> &mut WeaponDrawQueue {
        &mut self.weapon_draws
    }

    pub fn weapon_draws(&self) -> &WeaponDrawQueue {
        &self.weapon_draws
    }

    /// Accumulates a locally-earned experience delta for the next sync.
    pub fn accumulate_experience(&mut self, amount: f32) {
        self.cached_experience += amount;
    }

    /// Broadcasts movement and drained action events of every locally-owned
    /// entity, at most once per cooldown.
    pub fn broadcast_movement<S: Simulation, T: Transport>(
        &mut self,
        registry: &mut EntityRegistry,
        sim: &S,
        transport: &mut T,
    ) {
        if !self.movement_timer.ringing() {
            return;
        }
        self.movement_timer.reset();

        let mut message = MovementUpdate {
            tick: transport.current_tick(),
            updates: HashMap::new(),
        };

        for entity in registry.local_entities() {
            let Some(server_id) = registry.server_id_of(entity) else {
                continue;
            };
            let Some(object) = registry.object_of(entity) else {
                continue;
            };
            let (Some(position), Some(rotation)) = (sim.position(object), sim.rotation(object))
            else {
                continue;
            };

            let actions = registry
                .local_actions_mut(entity)
                .map(|log| log.drain_for_broadcast())
                .unwrap_or_default();

            message.updates.insert(
                server_id,
                EntityMovement {
                    position,
                    rotation,
                    variables: sim.animation_variables(object).unwrap_or_default(),
                    direction: sim.movement_direction(object).unwrap_or(0.0),
                    actions,
                },
            );
        }

        transport.send(ClientMessage::Movement(message));
    }

    /// Applies interpolated transforms and due action events to every
    /// remotely-simulated entity. Interpolation advances even for entities
    /// outside the loaded region, so re-entry detection stays accurate.
    pub fn apply_remote_state<S: Simulation, T: Transport>(
        &mut self,
        registry: &mut EntityRegistry,
        sim: &mut S,
        transport: &T,
    ) {
        let playback_tick = transport
            .current_tick()
            .saturating_sub(self.config.interpolation_delay);

        for entity in registry.remote_entities() {
            let transform = registry.interpolation_mut(entity).map(|interpolation| {
                interpolation.update(playback_tick);
                (
                    interpolation.position,
                    interpolation.rotation,
                    interpolation.variables.clone(),
                )
            });

            let object = registry
                .object_of(entity)
                .filter(|object| sim.object_exists(*object));

            if let (Some(object), Some((position, rotation, variables))) = (object, transform) {
                sim.set_transform(object, position, rotation);
                sim.set_animation_variables(object, &variables);
            }

            // Due events are consumed either way; without a ready
            // representation they are dropped, not retried.
            let due = registry
                .remote_actions_mut(entity)
                .map(|log| log.take_due(playback_tick))
                .unwrap_or_default();
            let ready = object.is_some() && !registry.is_waiting_for_3d(entity);
            if let Some(object) = object {
                if ready {
                    for event in &due {
                        sim.play_action(object, event);
                    }
                }
            }
        }
    }

    /// Diffs current faction memberships of locally-owned entities against
    /// the broadcast cache, at most once per cooldown, sending only when at
    /// least one entity changed.
    pub fn broadcast_faction_changes<S: Simulation, T: Transport>(
        &mut self,
        registry: &mut EntityRegistry,
        sim: &S,
        transport: &mut T,
    ) {
        if !self.factions_timer.ringing() {
            return;
        }
        self.factions_timer.reset();

        let mut message = FactionsChangeRequest {
            changes: HashMap::new(),
        };

        for entity in registry.local_entities() {
            let Some(server_id) = registry.server_id_of(entity) else {
                continue;
            };
            let Some(object) = registry.object_of(entity) else {
                continue;
            };
            let Some(factions) = sim.factions(object) else {
                continue;
            };

            if registry.faction_cache(entity) == Some(&factions) {
                continue;
            }

            registry.set_faction_cache(entity, factions.clone());
            message.changes.insert(server_id, factions);
        }

        if !message.changes.is_empty() {
            transport.send(ClientMessage::FactionsChange(message));
        }
    }

    /// Broadcasts accumulated experience, at most once per cooldown, only
    /// while grouped and only when non-zero. The accumulator keeps growing
    /// while ungrouped and resets once sent.
    pub fn broadcast_experience<S: Simulation, T: Transport>(
        &mut self,
        sim: &S,
        transport: &mut T,
    ) {
        if !self.experience_timer.ringing() {
            return;
        }
        self.experience_timer.reset();

        if self.cached_experience == 0.0 {
            return;
        }
        if !sim.is_grouped() {
            return;
        }

        let amount = self.cached_experience;
        self.cached_experience = 0.0;

        transport.send(ClientMessage::ExperienceSync(ExperienceSyncRequest { amount }));
        debug!("synced {} accumulated experience", amount);
    }

    /// Applies weapon-draw changes whose masking delay elapsed.
    pub fn apply_deferred_weapon_draws<S: Simulation>(&mut self, delta_seconds: f32, sim: &mut S) {
        self.weapon_draws
            .update(delta_seconds, self.config.weapon_draw_delay, sim);
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}
