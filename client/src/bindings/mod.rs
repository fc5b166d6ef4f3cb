mod simulation;
mod transport;

pub use simulation::Simulation;
pub use transport::Transport;
