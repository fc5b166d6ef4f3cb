use thiserror::Error;

use tandem_shared::{Cookie, ObjectId, RefId, ServerId};

use crate::world::Entity;

/// Lookup failures inside the replication engine. All of these denote benign
/// races (concurrent despawn, disconnect, cancellation); handlers log them
/// at warn level and drop the triggering message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReplicationError {
    /// No entity is waiting on the given assignment cookie
    #[error("no entity is waiting on cookie {cookie:?}")]
    CookieNotFound { cookie: Cookie },

    /// No tracked entity carries the given server id
    #[error("no tracked entity for server id {server_id:?}")]
    ServerIdNotFound { server_id: ServerId },

    /// The entity has no backing simulation object
    #[error("entity {entity:?} has no backing simulation object")]
    ObjectNotBound { entity: Entity },

    /// The simulation could not resolve the object id
    #[error("simulation object {object:?} could not be resolved")]
    ObjectUnresolved { object: ObjectId },
}

/// Failures while materializing a local representation from a spawn
/// snapshot. Materialization is retried on later ticks while the entity
/// stays inside the loaded region.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpawnError {
    /// The snapshot references a world object unknown to this participant
    #[error("reference {reference:?} could not be resolved, possibly missing content")]
    ReferenceUnresolved { reference: RefId },

    /// The snapshot's template is unknown to this participant
    #[error("template {template:?} could not be resolved, possibly missing content")]
    TemplateUnresolved { template: RefId },

    /// The embedded appearance payload was rejected by the simulation
    #[error("appearance payload was rejected by the simulation")]
    AppearanceRejected,

    /// The snapshot carries neither a reference, a template, nor a payload
    #[error("snapshot carries nothing to materialize from")]
    NothingToSpawn,
}
