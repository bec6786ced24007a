pub mod fluid_grid;
pub mod particles;
pub mod pingpong;
pub mod resources;
pub mod synapse;
pub mod synapse_grid;
pub mod trait_def;
pub mod types;

pub use fluid_grid::FluidGrid;
pub use particles::ParticleSystem;
pub use synapse::SynapseNetwork;
pub use synapse_grid::{SynapseField, SynapseGrid};
pub use trait_def::Simulation;
