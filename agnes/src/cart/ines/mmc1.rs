//! MMC1: banking registers loaded through a serial shift register.
//!
//! Writes to `$8000-$FFFF` with bit 7 clear shift bit 0 into a 5-bit shift
//! register. A write with bit 7 set commits the shift register into the
//! register selected by the address quarter (control, CHR bank 0, CHR bank 1,
//! PRG bank) and clears it.
//!
//! Only PRG banking is modelled. CHR reads answer `0xFF` and CHR writes are
//! dropped; the CHR bank registers are latched but otherwise unused.

use log::{debug, warn};

use super::header::PRG_BANK_SIZE;
use super::mapper::MapperError;
use super::save::SaveRam;
use super::CartridgeImage;
use crate::cart::NesCart;

/// Bytes of save RAM visible at `$6000-$7FFF`.
pub(crate) const SAVE_WINDOW_LEN: usize = 0x2000;

/// Power-on control value: 16 KiB PRG mode with the last bank fixed at `$C000`.
const CONTROL_POWER_ON: u8 = 0x0C;

#[derive(Debug)]
pub struct Mmc1<'rom> {
    image: &'rom CartridgeImage,
    save: Option<SaveRam>,
    shift_register: u8,
    control: u8,
    chr_bank_0: u8,
    chr_bank_1: u8,
    prg_bank: u8,
}

impl<'rom> Mmc1<'rom> {
    pub fn new(image: &'rom CartridgeImage, save: Option<SaveRam>) -> Self {
        Self {
            image,
            save,
            shift_register: 0,
            control: CONTROL_POWER_ON,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
        }
    }

    pub fn shift_register(&self) -> u8 {
        self.shift_register
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    pub fn chr_bank_0(&self) -> u8 {
        self.chr_bank_0
    }

    pub fn chr_bank_1(&self) -> u8 {
        self.chr_bank_1
    }

    pub fn prg_bank(&self) -> u8 {
        self.prg_bank
    }

    pub fn has_save_ram(&self) -> bool {
        self.save.is_some()
    }

    /// PRG banking mode from control bits 2-3:
    /// - 0, 1: 32 KiB at `$8000`, bank number with its low bit ignored
    /// - 2: first bank fixed at `$8000`, `$C000` switchable
    /// - 3: `$8000` switchable, last bank fixed at `$C000`
    pub fn prg_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    /// Offset into PRG ROM for a CPU address in `$8000-$FFFF`, wrapped to the ROM size.
    fn prg_offset(&self, addr: u16) -> Option<usize> {
        let prg_size = self.image.header().prg_rom_bytes();
        if prg_size == 0 {
            return None;
        }
        let window = (addr - 0x8000) as usize;
        let bank = self.prg_bank as usize;
        let offset = match (self.prg_mode(), addr) {
            (0 | 1, _) => (bank & 0x0E) * PRG_BANK_SIZE + window,
            (2, 0x8000..=0xBFFF) => window,
            (2, _) => (bank & 0x0F) * PRG_BANK_SIZE + window - PRG_BANK_SIZE,
            (_, 0x8000..=0xBFFF) => (bank & 0x0F) * PRG_BANK_SIZE + window,
            (_, _) => prg_size - PRG_BANK_SIZE + window - PRG_BANK_SIZE,
        };
        Some(offset % prg_size)
    }

    fn read_prg(&self, addr: u16) -> Result<u8, MapperError> {
        let bytes = self.image.bytes();
        let offset = self
            .prg_offset(addr)
            .map_or(usize::MAX, |offset| self.image.header().prg_rom_start() + offset);
        bytes.get(offset).copied().ok_or(MapperError::AddressOverflow {
            addr,
            offset,
            len: bytes.len(),
        })
    }

    fn read_save(&self, addr: u16) -> u8 {
        let Some(save) = &self.save else {
            return 0xFF;
        };
        save.read((addr - 0x6000) as usize).unwrap_or_else(|| {
            warn!("read from {:#06X} is past the end of save RAM, returning 0xFF", addr);
            0xFF
        })
    }

    fn write_save(&mut self, addr: u16, value: u8) -> Result<(), MapperError> {
        let Some(save) = &mut self.save else {
            return Ok(());
        };
        if !save.write((addr - 0x6000) as usize, value)? {
            warn!("write to {:#06X} is past the end of save RAM, ignoring", addr);
        }
        Ok(())
    }

    fn write_serial(&mut self, addr: u16, value: u8) {
        if value & 0x80 != 0 {
            let latched = self.shift_register & 0x1F;
            let register = match addr {
                0x8000..=0x9FFF => &mut self.control,
                0xA000..=0xBFFF => &mut self.chr_bank_0,
                0xC000..=0xDFFF => &mut self.chr_bank_1,
                _ => &mut self.prg_bank,
            };
            *register = latched;
            self.shift_register = 0;
            debug!("MMC1 commit {:#04X} via {:#06X}", latched, addr);
        } else {
            self.shift_register = ((self.shift_register << 1) | (value & 1)) & 0x1F;
        }
    }

    pub fn destroy(self) -> Result<(), MapperError> {
        if let Some(mut save) = self.save {
            save.flush()?;
        }
        Ok(())
    }
}

impl NesCart for Mmc1<'_> {
    fn cpu_read(&mut self, addr: u16) -> Result<u8, MapperError> {
        match addr {
            0x6000..=0x7FFF => Ok(self.read_save(addr)),
            0x8000..=0xFFFF => self.read_prg(addr),
            _ => {
                warn!("read from unmapped cartridge address {:#06X}, returning 0xFF", addr);
                Ok(0xFF)
            }
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) -> Result<(), MapperError> {
        match addr {
            0x6000..=0x7FFF => self.write_save(addr, value),
            0x8000..=0xFFFF => {
                self.write_serial(addr, value);
                Ok(())
            }
            _ => {
                warn!("write to unmapped cartridge address {:#06X} ignored", addr);
                Ok(())
            }
        }
    }

    fn ppu_read(&mut self, _addr: u16) -> u8 {
        0xFF
    }

    fn ppu_write(&mut self, _addr: u16, _value: u8) {}
}
