use std::collections::{BTreeSet, HashMap, HashSet};

use tandem_shared::{Cookie, FactionsSnapshot, ObjectId, ServerId};

use crate::{
    actions::{LocalActionLog, RemoteActionLog},
    interpolation::InterpolationComponent,
    world::{
        entity::Entity,
        ownership::{OwnershipMarker, RemoteMarker},
    },
};

/// Association of entity handles to their component side tables. Components
/// are toggled on and off by explicit insertion/removal; there is no runtime
/// type discovery.
///
/// The ownership marker lives in a single table of tagged variants, so an
/// entity can never carry more than one of Local/Remote/WaitingForAssignment
/// at a time.
pub struct EntityRegistry {
    next_entity: u64,
    entities: BTreeSet<Entity>,
    objects: HashMap<Entity, ObjectId>,
    object_index: HashMap<ObjectId, Entity>,
    ownership: HashMap<Entity, OwnershipMarker>,
    interpolation: HashMap<Entity, InterpolationComponent>,
    local_actions: HashMap<Entity, LocalActionLog>,
    remote_actions: HashMap<Entity, RemoteActionLog>,
    faction_cache: HashMap<Entity, FactionsSnapshot>,
    waiting_for_3d: HashSet<Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            next_entity: 0,
            entities: BTreeSet::new(),
            objects: HashMap::new(),
            object_index: HashMap::new(),
            ownership: HashMap::new(),
            interpolation: HashMap::new(),
            local_actions: HashMap::new(),
            remote_actions: HashMap::new(),
            faction_cache: HashMap::new(),
            waiting_for_3d: HashSet::new(),
        }
    }

    // Entity lifecycle

    pub fn create_entity(&mut self) -> Entity {
        let entity = Entity::new(self.next_entity);
        self.next_entity += 1;
        self.entities.insert(entity);
        entity
    }

    pub fn destroy_entity(&mut self, entity: Entity) {
        if let Some(object) = self.objects.remove(&entity) {
            self.object_index.remove(&object);
        }
        self.ownership.remove(&entity);
        self.strip_replication(entity);
        self.local_actions.remove(&entity);
        self.entities.remove(&entity);
    }

    /// Destroys an entity that carries neither an ownership marker nor a
    /// backing object. Returns whether it was destroyed.
    pub fn destroy_if_bare(&mut self, entity: Entity) -> bool {
        if self.ownership.contains_key(&entity) || self.objects.contains_key(&entity) {
            return false;
        }
        self.destroy_entity(entity);
        true
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// All live entities, in creation order.
    pub fn entities(&self) -> Vec<Entity> {
        self.entities.iter().copied().collect()
    }

    // Object binding

    pub fn bind_object(&mut self, entity: Entity, object: ObjectId) {
        self.objects.insert(entity, object);
        self.object_index.insert(object, entity);
    }

    pub fn unbind_object(&mut self, entity: Entity) -> Option<ObjectId> {
        let object = self.objects.remove(&entity)?;
        self.object_index.remove(&object);
        Some(object)
    }

    pub fn object_of(&self, entity: Entity) -> Option<ObjectId> {
        self.objects.get(&entity).copied()
    }

    pub fn entity_by_object(&self, object: ObjectId) -> Option<Entity> {
        self.object_index.get(&object).copied()
    }

    // Ownership markers

    pub fn marker(&self, entity: Entity) -> Option<&OwnershipMarker> {
        self.ownership.get(&entity)
    }

    pub fn set_marker(&mut self, entity: Entity, marker: OwnershipMarker) {
        self.ownership.insert(entity, marker);
    }

    pub fn clear_marker(&mut self, entity: Entity) -> Option<OwnershipMarker> {
        self.ownership.remove(&entity)
    }

    pub fn remote_marker(&self, entity: Entity) -> Option<&RemoteMarker> {
        match self.ownership.get(&entity) {
            Some(OwnershipMarker::Remote(remote)) => Some(remote),
            _ => None,
        }
    }

    pub fn remote_marker_mut(&mut self, entity: Entity) -> Option<&mut RemoteMarker> {
        match self.ownership.get_mut(&entity) {
            Some(OwnershipMarker::Remote(remote)) => Some(remote),
            _ => None,
        }
    }

    /// The stable cross-participant id of an entity, whichever side owns it.
    pub fn server_id_of(&self, entity: Entity) -> Option<ServerId> {
        match self.ownership.get(&entity)? {
            OwnershipMarker::Local { server_id } => Some(*server_id),
            OwnershipMarker::Remote(remote) => Some(remote.server_id),
            OwnershipMarker::WaitingForAssignment { .. } => None,
        }
    }

    pub fn entity_waiting_on(&self, cookie: Cookie) -> Option<Entity> {
        self.entities.iter().copied().find(|entity| {
            matches!(
                self.ownership.get(entity),
                Some(OwnershipMarker::WaitingForAssignment { cookie: waiting }) if *waiting == cookie
            )
        })
    }

    pub fn local_entity_by_server_id(&self, server_id: ServerId) -> Option<Entity> {
        self.entities.iter().copied().find(|entity| {
            matches!(
                self.ownership.get(entity),
                Some(OwnershipMarker::Local { server_id: owned }) if *owned == server_id
            )
        })
    }

    pub fn remote_entity_by_server_id(&self, server_id: ServerId) -> Option<Entity> {
        self.entities.iter().copied().find(|entity| {
            matches!(
                self.ownership.get(entity),
                Some(OwnershipMarker::Remote(remote)) if remote.server_id == server_id
            )
        })
    }

    pub fn entity_by_server_id(&self, server_id: ServerId) -> Option<Entity> {
        self.local_entity_by_server_id(server_id)
            .or_else(|| self.remote_entity_by_server_id(server_id))
    }

    /// Remote entity whose last representation used the given object id,
    /// for correlating a representation reappearing in the simulation.
    pub fn remote_entity_by_cached_object(&self, object: ObjectId) -> Option<Entity> {
        self.entities.iter().copied().find(|entity| {
            matches!(
                self.ownership.get(entity),
                Some(OwnershipMarker::Remote(remote)) if remote.cached_object == Some(object)
            )
        })
    }

    pub fn local_entities(&self) -> Vec<Entity> {
        self.entities
            .iter()
            .copied()
            .filter(|entity| {
                matches!(self.ownership.get(entity), Some(OwnershipMarker::Local { .. }))
            })
            .collect()
    }

    pub fn remote_entities(&self) -> Vec<Entity> {
        self.entities
            .iter()
            .copied()
            .filter(|entity| {
                matches!(self.ownership.get(entity), Some(OwnershipMarker::Remote(_)))
            })
            .collect()
    }

    // Interpolation

    pub fn set_interpolation(&mut self, entity: Entity, component: InterpolationComponent) {
        self.interpolation.insert(entity, component);
    }

    pub fn interpolation(&self, entity: Entity) -> Option<&InterpolationComponent> {
        self.interpolation.get(&entity)
    }

    pub fn interpolation_mut(&mut self, entity: Entity) -> Option<&mut InterpolationComponent> {
        self.interpolation.get_mut(&entity)
    }

    // Action logs

    pub fn set_local_actions(&mut self, entity: Entity, log: LocalActionLog) {
        self.local_actions.insert(entity, log);
    }

    pub fn local_actions_mut(&mut self, entity: Entity) -> Option<&mut LocalActionLog> {
        self.local_actions.get_mut(&entity)
    }

    pub fn remove_local_actions(&mut self, entity: Entity) {
        self.local_actions.remove(&entity);
    }

    pub fn set_remote_actions(&mut self, entity: Entity, log: RemoteActionLog) {
        self.remote_actions.insert(entity, log);
    }

    pub fn remote_actions_mut(&mut self, entity: Entity) -> Option<&mut RemoteActionLog> {
        self.remote_actions.get_mut(&entity)
    }

    // Faction cache

    pub fn set_faction_cache(&mut self, entity: Entity, factions: FactionsSnapshot) {
        self.faction_cache.insert(entity, factions);
    }

    pub fn faction_cache(&self, entity: Entity) -> Option<&FactionsSnapshot> {
        self.faction_cache.get(&entity)
    }

    // WaitingFor3D

    pub fn set_waiting_for_3d(&mut self, entity: Entity) {
        self.waiting_for_3d.insert(entity);
    }

    pub fn is_waiting_for_3d(&self, entity: Entity) -> bool {
        self.waiting_for_3d.contains(&entity)
    }

    pub fn clear_waiting_for_3d(&mut self, entity: Entity) {
        self.waiting_for_3d.remove(&entity);
    }

    /// Removes every replication-side component: interpolation, remote action
    /// log, faction cache and the WaitingFor3D marker. The ownership marker
    /// and object binding are left untouched.
    pub fn strip_replication(&mut self, entity: Entity) {
        self.interpolation.remove(&entity);
        self.remote_actions.remove(&entity);
        self.faction_cache.remove(&entity);
        self.waiting_for_3d.remove(&entity);
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_shared::SpawnSnapshot;

    #[test]
    fn marker_table_holds_at_most_one_marker() {
        let mut registry = EntityRegistry::new();
        let entity = registry.create_entity();

        registry.set_marker(
            entity,
            OwnershipMarker::WaitingForAssignment {
                cookie: Cookie::new(1),
            },
        );
        registry.set_marker(
            entity,
            OwnershipMarker::Remote(RemoteMarker::new(
                ServerId::new(9),
                SpawnSnapshot::default(),
            )),
        );

        assert!(registry.entity_waiting_on(Cookie::new(1)).is_none());
        assert_eq!(registry.remote_entity_by_server_id(ServerId::new(9)), Some(entity));
    }

    #[test]
    fn destroy_if_bare_spares_marked_and_bound_entities() {
        let mut registry = EntityRegistry::new();

        let bound = registry.create_entity();
        registry.bind_object(bound, ObjectId::new(0x14));
        assert!(!registry.destroy_if_bare(bound));

        let owned = registry.create_entity();
        registry.set_marker(
            owned,
            OwnershipMarker::Local {
                server_id: ServerId::new(2),
            },
        );
        assert!(!registry.destroy_if_bare(owned));

        let bare = registry.create_entity();
        assert!(registry.destroy_if_bare(bare));
        assert!(!registry.contains(bare));
    }

    #[test]
    fn object_binding_round_trip() {
        let mut registry = EntityRegistry::new();
        let entity = registry.create_entity();
        let object = ObjectId::new(0xabcd);

        registry.bind_object(entity, object);
        assert_eq!(registry.entity_by_object(object), Some(entity));
        assert_eq!(registry.object_of(entity), Some(object));

        assert_eq!(registry.unbind_object(entity), Some(object));
        assert_eq!(registry.entity_by_object(object), None);
    }
}
