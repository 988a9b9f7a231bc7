pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;

pub use policy::InspectorPersonality;
pub use seeds::{resolve_seed_inputs, split_csv};
pub use simulation::{SimulationConfig, SimulationResult, run_simulation};
