use std::fmt;

use agnes_6502::Bus;
use log::warn;

use crate::cart::{MapperError, NesCart};

/// Physical size of the internal work RAM; `$0000-$1FFF` mirrors it four times.
pub const RAM_SIZE: usize = 0x800;

/// Value read back from unemulated peripheral registers.
pub const OPEN_BUS: u8 = 0xFF;

/// Register windows the core does not emulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peripheral {
    Ppu,
    ApuIo,
    TestMode,
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ppu => "PPU registers",
            Self::ApuIo => "APU/IO registers",
            Self::TestMode => "CPU test mode registers",
        })
    }
}

/// Where a CPU address lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Index into work RAM.
    Ram(usize),
    Peripheral(Peripheral),
    Cartridge,
}

impl Region {
    pub fn of(addr: u16) -> Self {
        match addr {
            0x0000..=0x1FFF => Self::Ram(addr as usize % RAM_SIZE), // 2 KB internal RAM
            0x2000..=0x3FFF => Self::Peripheral(Peripheral::Ppu),
            0x4000..=0x4017 => Self::Peripheral(Peripheral::ApuIo),
            0x4018..=0x401F => Self::Peripheral(Peripheral::TestMode), // normally disabled
            0x4020..=0xFFFF => Self::Cartridge, // PRG ROM, PRG RAM, and mapper registers
        }
    }
}

/// The CPU's view of memory: work RAM, peripheral stubs, and the cartridge.
pub struct CpuMemMap<C> {
    pub ram: Box<[u8; RAM_SIZE]>,
    pub cart: C,
}

impl<C> CpuMemMap<C> {
    pub fn new(cart: C) -> Self {
        Self {
            ram: Box::new([0; RAM_SIZE]),
            cart,
        }
    }
}

impl<C: NesCart> Bus for CpuMemMap<C> {
    type Error = MapperError;

    fn read(&mut self, addr: u16) -> Result<u8, MapperError> {
        match Region::of(addr) {
            Region::Ram(index) => Ok(self.ram[index]),
            Region::Peripheral(peripheral) => {
                warn!("read from {:#06X}: {} are not implemented, returning {:#04X}", addr, peripheral, OPEN_BUS);
                Ok(OPEN_BUS)
            }
            Region::Cartridge => self.cart.cpu_read(addr),
        }
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), MapperError> {
        match Region::of(addr) {
            Region::Ram(index) => {
                self.ram[index] = value;
                Ok(())
            }
            Region::Peripheral(peripheral) => {
                warn!("write of {:#04X} to {:#06X}: {} are not implemented, ignoring", value, addr, peripheral);
                Ok(())
            }
            Region::Cartridge => self.cart.cpu_write(addr, value),
        }
    }
}
