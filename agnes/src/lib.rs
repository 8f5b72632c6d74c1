use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agnes_6502::{Cpu6502, CpuError};
use log::info;
use thiserror::Error;

pub mod cart;
pub mod mem;

use cart::{ConsoleType, INesHeader, LoadError, MapperError, NesCart};
use mem::CpuMemMap;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Mapper(#[from] MapperError),
    #[error(transparent)]
    Cpu(#[from] CpuError<MapperError>),
    #[error("unsupported system: {0}")]
    UnsupportedSystem(ConsoleType),
}

/// Refuses images for anything but the home console.
pub fn check_system(header: &INesHeader) -> Result<(), Error> {
    match header.console {
        ConsoleType::NesFamicom => Ok(()),
        other => Err(Error::UnsupportedSystem(other)),
    }
}

/// Cooperative cancellation for [`NesEmulator::run`], checked between instructions.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct NesEmulator<C> {
    pub cpu: Cpu6502<CpuMemMap<C>>,
}

impl<C: NesCart> NesEmulator<C> {
    pub fn new(cart: C) -> Self {
        Self {
            cpu: Cpu6502::new(CpuMemMap::new(cart)),
        }
    }

    /// Starts execution at the reset vector.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.cpu.reset()?;
        info!("reset vector ($FFFC): {:#06X}", self.cpu.pc);
        Ok(())
    }

    pub fn step(&mut self) -> Result<(), Error> {
        self.cpu.step()?;
        Ok(())
    }

    /// Steps until `stop` is set, `max_steps` instructions have run, or an
    /// instruction fails. Returns the number of instructions executed.
    pub fn run(&mut self, stop: &StopToken, max_steps: Option<u64>) -> Result<u64, Error> {
        let mut steps = 0;
        while !stop.is_stopped() {
            if max_steps.is_some_and(|max| steps >= max) {
                stop.stop();
                break;
            }
            self.step()?;
            steps += 1;
        }
        Ok(steps)
    }

    pub fn cart(&self) -> &C {
        &self.cpu.bus.cart
    }

    pub fn cart_mut(&mut self) -> &mut C {
        &mut self.cpu.bus.cart
    }

    pub fn into_cart(self) -> C {
        self.cpu.bus.cart
    }
}
