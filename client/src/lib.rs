//! # Tandem Client
//! Client-side replication engine: decides, for every shared mutable entity,
//! whether this participant simulates it locally or replays a remote owner's
//! state, and keeps both views consistent over an unreliable-latency
//! network.
//!
//! The engine performs no I/O of its own; it talks to the outside world
//! through the [`Transport`] and [`Simulation`] collaborator traits.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod actions;
mod arbiter;
mod bindings;
mod engine;
mod error;
mod interpolation;
mod scheduler;
mod spawn;
mod world;

pub use actions::{LocalActionLog, RemoteActionLog};
pub use arbiter::OwnershipArbiter;
pub use bindings::{Simulation, Transport};
pub use engine::ReplicationEngine;
pub use error::{ReplicationError, SpawnError};
pub use interpolation::{InterpolationComponent, MovementPoint, INTERPOLATION_DELAY};
pub use scheduler::{ReplicationScheduler, SchedulerConfig, WeaponDrawQueue};
pub use spawn::SpawnCoordinator;
pub use world::{Entity, EntityRegistry, OwnershipMarker, RemoteMarker};
