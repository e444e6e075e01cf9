mod bloom;
mod context;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub(crate) use state::{GpuState, PairSlot};
