use tandem_shared::{Cookie, ObjectId, ServerId, SpawnSnapshot};

/// Who simulates an entity. Stored as a single tagged variant per entity, so
/// the at-most-one-marker invariant holds structurally.
#[derive(Clone, Debug, PartialEq)]
pub enum OwnershipMarker {
    /// This participant is authoritative and mirrors state outward.
    Local { server_id: ServerId },
    /// Another participant is authoritative; we replay its state.
    Remote(RemoteMarker),
    /// An assignment request is in flight.
    WaitingForAssignment { cookie: Cookie },
}

/// Replication state for a remotely-simulated entity.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteMarker {
    pub server_id: ServerId,
    /// Object id of the last local representation, used to correlate the
    /// representation reappearing in the simulation.
    pub cached_object: Option<ObjectId>,
    /// Last full state capture, enough to (re)materialize a representation
    /// when the entity enters the area of interest.
    pub snapshot: SpawnSnapshot,
}

impl RemoteMarker {
    pub fn new(server_id: ServerId, snapshot: SpawnSnapshot) -> Self {
        Self {
            server_id,
            cached_object: None,
            snapshot,
        }
    }
}
