mod cpu;
mod reg_state;

pub use cpu::*;
pub use reg_state::*;
