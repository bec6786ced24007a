//! Full-window generative backdrop: a fluid / synapse simulation that runs as
//! a wgpu compute kernel when an accelerated backend can be negotiated, and as
//! a software canvas otherwise.

pub mod app;
pub mod backend;
pub mod config;
pub mod effect;
pub mod input;
pub mod logging;
pub mod noise;
pub mod rendering;
pub mod simulation;
pub mod time;
pub mod viewport;
