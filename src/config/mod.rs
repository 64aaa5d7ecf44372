pub mod generation;
pub mod simulation;

pub use generation::GridParams;
pub use simulation::SimulationConfig;
