//! Mock collaborators for driving the replication engine in integration
//! tests: an in-memory simulation binding and a transport that records every
//! message handed to it.

// Not every test crate exercises every helper.
#![allow(dead_code)]

use std::collections::HashMap;

use tandem_client::{Simulation, SpawnError, Transport};
use tandem_shared::{
    ActionEvent, AnimationVariables, AppearancePayload, AssignmentResponse, ClientMessage, Cookie,
    CoreValues, FactionsSnapshot, InventorySnapshot, ObjectId, QuestEntry, RefId, Rotation,
    ServerId, SpawnSnapshot, Tick, Vector3,
};

pub const PLAYER_OBJECT: u32 = 0x14;

#[derive(Clone, Debug)]
pub struct MockObject {
    pub reference: RefId,
    pub cell: RefId,
    pub world_space: RefId,
    pub position: Vector3,
    pub rotation: Rotation,
    pub direction: f32,
    pub inventory: InventorySnapshot,
    pub factions: FactionsSnapshot,
    pub values: CoreValues,
    pub dead: bool,
    pub weapon_drawn: bool,
    pub variables: AnimationVariables,
    pub latest_action: ActionEvent,
    pub appearance: Option<(AppearancePayload, u32)>,
    pub temporary: bool,
    pub remote: bool,
    pub player: bool,
    pub privileged_setup: bool,
    pub visual_ready: bool,
    pub inventory_applied: u32,
    pub factions_applied: u32,
    pub played_actions: Vec<ActionEvent>,
    pub spoken: Vec<String>,
    pub subtitles: Vec<String>,
}

impl MockObject {
    fn new(reference: RefId) -> Self {
        Self {
            reference,
            cell: RefId::new(0x1000, 0),
            world_space: RefId::new(0x2000, 0),
            position: Vector3::ZERO,
            rotation: Rotation::default(),
            direction: 0.0,
            inventory: InventorySnapshot::default(),
            factions: FactionsSnapshot::default(),
            values: CoreValues::default(),
            dead: false,
            weapon_drawn: false,
            variables: AnimationVariables::default(),
            latest_action: ActionEvent::default(),
            appearance: None,
            temporary: false,
            remote: false,
            player: false,
            privileged_setup: false,
            visual_ready: true,
            inventory_applied: 0,
            factions_applied: 0,
            played_actions: Vec::new(),
            spoken: Vec::new(),
            subtitles: Vec::new(),
        }
    }
}

pub struct MockSimulation {
    pub objects: HashMap<ObjectId, MockObject>,
    pub references: HashMap<RefId, ObjectId>,
    pub player: ObjectId,
    pub region_loaded: bool,
    pub grouped: bool,
    pub quest_log: Vec<QuestEntry>,
    pub combat_experience: f32,
    pub fail_spawn: bool,
    pub spawn_visual_ready: bool,
    pub spawned: Vec<ObjectId>,
    next_object: u32,
}

impl MockSimulation {
    pub fn new() -> Self {
        let mut sim = Self {
            objects: HashMap::new(),
            references: HashMap::new(),
            player: ObjectId::new(PLAYER_OBJECT),
            region_loaded: true,
            grouped: true,
            quest_log: Vec::new(),
            combat_experience: 0.0,
            fail_spawn: false,
            spawn_visual_ready: false,
            spawned: Vec::new(),
            next_object: 0xff00_0000,
        };
        sim.add_object(PLAYER_OBJECT);
        sim
    }

    /// Adds a world object whose reference id mirrors its object id.
    pub fn add_object(&mut self, id: u32) -> ObjectId {
        let object = ObjectId::new(id);
        let reference = RefId::new(id, 0);
        self.objects.insert(object, MockObject::new(reference));
        self.references.insert(reference, object);
        object
    }

    pub fn object(&self, object: ObjectId) -> &MockObject {
        self.objects.get(&object).expect("object not in mock simulation")
    }

    pub fn object_mut(&mut self, object: ObjectId) -> &mut MockObject {
        self.objects.get_mut(&object).expect("object not in mock simulation")
    }
}

impl Simulation for MockSimulation {
    fn object_exists(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object)
    }

    fn resolve_reference(&self, reference: RefId) -> Option<ObjectId> {
        self.references.get(&reference).copied()
    }

    fn reference_of(&self, object: ObjectId) -> Option<RefId> {
        self.objects.get(&object).map(|o| o.reference)
    }

    fn player_object(&self) -> ObjectId {
        self.player
    }

    fn is_temporary(&self, object: ObjectId) -> bool {
        self.objects.get(&object).map(|o| o.temporary).unwrap_or(false)
    }

    fn spawn_object(&mut self, snapshot: &SpawnSnapshot) -> Result<ObjectId, SpawnError> {
        if self.fail_spawn {
            return Err(SpawnError::TemplateUnresolved {
                template: snapshot.template,
            });
        }

        let object = ObjectId::new(self.next_object);
        self.next_object += 1;

        let mut mock = MockObject::new(RefId::NONE);
        mock.position = snapshot.position;
        mock.rotation = snapshot.rotation;
        mock.temporary = true;
        mock.visual_ready = self.spawn_visual_ready;
        self.objects.insert(object, mock);
        self.spawned.push(object);
        Ok(object)
    }

    fn destroy_object(&mut self, object: ObjectId) {
        self.objects.remove(&object);
    }

    fn position(&self, object: ObjectId) -> Option<Vector3> {
        self.objects.get(&object).map(|o| o.position)
    }

    fn rotation(&self, object: ObjectId) -> Option<Rotation> {
        self.objects.get(&object).map(|o| o.rotation)
    }

    fn movement_direction(&self, object: ObjectId) -> Option<f32> {
        self.objects.get(&object).map(|o| o.direction)
    }

    fn cell_of(&self, object: ObjectId) -> Option<RefId> {
        self.objects.get(&object).map(|o| o.cell)
    }

    fn world_space_of(&self, object: ObjectId) -> Option<RefId> {
        self.objects.get(&object).map(|o| o.world_space)
    }

    fn set_transform(&mut self, object: ObjectId, position: Vector3, rotation: Rotation) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.position = position;
            o.rotation = rotation;
        }
    }

    fn move_object(&mut self, object: ObjectId, cell: RefId, position: Vector3) {
        if let Some(o) = self.objects.get_mut(&object) {
            if !cell.is_none() {
                o.cell = cell;
            }
            o.position = position;
        }
    }

    fn inventory(&self, object: ObjectId) -> Option<InventorySnapshot> {
        self.objects.get(&object).map(|o| o.inventory.clone())
    }

    fn set_inventory(&mut self, object: ObjectId, inventory: &InventorySnapshot) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.inventory = inventory.clone();
            o.inventory_applied += 1;
        }
    }

    fn factions(&self, object: ObjectId) -> Option<FactionsSnapshot> {
        self.objects.get(&object).map(|o| o.factions.clone())
    }

    fn set_factions(&mut self, object: ObjectId, factions: &FactionsSnapshot) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.factions = factions.clone();
            o.factions_applied += 1;
        }
    }

    fn core_values(&self, object: ObjectId) -> Option<CoreValues> {
        self.objects.get(&object).map(|o| o.values.clone())
    }

    fn set_core_values(&mut self, object: ObjectId, values: &CoreValues) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.values = values.clone();
        }
    }

    fn is_dead(&self, object: ObjectId) -> Option<bool> {
        self.objects.get(&object).map(|o| o.dead)
    }

    fn set_dead(&mut self, object: ObjectId, dead: bool) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.dead = dead;
        }
    }

    fn is_weapon_drawn(&self, object: ObjectId) -> Option<bool> {
        self.objects.get(&object).map(|o| o.weapon_drawn)
    }

    fn set_weapon_drawn(&mut self, object: ObjectId, drawn: bool) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.weapon_drawn = drawn;
        }
    }

    fn animation_variables(&self, object: ObjectId) -> Option<AnimationVariables> {
        self.objects.get(&object).map(|o| o.variables.clone())
    }

    fn set_animation_variables(&mut self, object: ObjectId, variables: &AnimationVariables) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.variables = variables.clone();
        }
    }

    fn latest_action(&self, object: ObjectId) -> Option<ActionEvent> {
        self.objects.get(&object).map(|o| o.latest_action.clone())
    }

    fn play_action(&mut self, object: ObjectId, event: &ActionEvent) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.played_actions.push(event.clone());
        }
    }

    fn appearance(&self, object: ObjectId) -> Option<(AppearancePayload, u32)> {
        self.objects.get(&object).and_then(|o| o.appearance.clone())
    }

    fn set_remote(&mut self, object: ObjectId, remote: bool) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.remote = remote;
        }
    }

    fn set_player(&mut self, object: ObjectId, player: bool) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.player = player;
        }
    }

    fn apply_privileged_setup(&mut self, object: ObjectId) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.privileged_setup = true;
        }
    }

    fn in_loaded_region(&self, _position: Vector3) -> bool {
        self.region_loaded
    }

    fn visual_ready(&self, object: ObjectId) -> bool {
        self.objects.get(&object).map(|o| o.visual_ready).unwrap_or(false)
    }

    fn is_grouped(&self) -> bool {
        self.grouped
    }

    fn quest_log(&self) -> Vec<QuestEntry> {
        self.quest_log.clone()
    }

    fn apply_combat_experience(&mut self, amount: f32) {
        self.combat_experience += amount;
    }

    fn speak(&mut self, object: ObjectId, sound: &str) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.spoken.push(sound.to_owned());
        }
    }

    fn show_subtitle(&mut self, object: ObjectId, text: &str) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.subtitles.push(text.to_owned());
        }
    }
}

pub struct MockTransport {
    pub online: bool,
    pub connected: bool,
    pub tick: Tick,
    pub accept_sends: bool,
    pub sent: Vec<ClientMessage>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            online: true,
            connected: true,
            tick: 10_000,
            accept_sends: true,
            sent: Vec::new(),
        }
    }

    pub fn sent_assignments(&self) -> Vec<&tandem_shared::AssignmentRequest> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                ClientMessage::Assignment(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn count_movement(&self) -> usize {
        self.sent
            .iter()
            .filter(|m| matches!(m, ClientMessage::Movement(_)))
            .count()
    }

    pub fn count_faction_changes(&self) -> usize {
        self.sent
            .iter()
            .filter(|m| matches!(m, ClientMessage::FactionsChange(_)))
            .count()
    }

    pub fn count_experience(&self) -> usize {
        self.sent
            .iter()
            .filter(|m| matches!(m, ClientMessage::ExperienceSync(_)))
            .count()
    }
}

impl Transport for MockTransport {
    fn is_online(&self) -> bool {
        self.online
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn current_tick(&self) -> Tick {
        self.tick
    }

    fn connect(&mut self, _address: &str) {
        self.connected = true;
    }

    fn close(&mut self) {
        self.connected = false;
    }

    fn send(&mut self, message: ClientMessage) -> bool {
        if !self.accept_sends {
            return false;
        }
        self.sent.push(message);
        true
    }
}

// Message builders

pub fn snapshot_at(position: Vector3) -> SpawnSnapshot {
    SpawnSnapshot {
        template: RefId::new(0x1337, 1),
        position,
        ..SpawnSnapshot::default()
    }
}

pub fn local_grant(cookie: Cookie, server_id: u32) -> AssignmentResponse {
    AssignmentResponse {
        cookie,
        granted_local: true,
        server_id: ServerId::new(server_id),
        snapshot: SpawnSnapshot::default(),
    }
}

pub fn remote_grant(cookie: Cookie, server_id: u32, snapshot: SpawnSnapshot) -> AssignmentResponse {
    AssignmentResponse {
        cookie,
        granted_local: false,
        server_id: ServerId::new(server_id),
        snapshot,
    }
}
