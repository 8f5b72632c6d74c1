use std::path::Path;

use log::info;
use thiserror::Error;

use super::mmc1::Mmc1;
use super::save::{save_path, SaveRam};
use super::CartridgeImage;
use crate::cart::NesCart;

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("unsupported mapper {0:#06X}")]
    UnsupportedMapper(u16),
    /// Bank math produced an offset outside the loaded image. This is an
    /// emulator bug or a malformed image, never hardware behaviour.
    #[error("mapper address overflow: {addr:#06X} resolved to offset {offset:#X} of a {len:#X} byte image")]
    AddressOverflow { addr: u16, offset: usize, len: usize },
    #[error("save RAM io error: {0}")]
    Io(#[from] std::io::Error),
}

macro_rules! mappers {
    ($($name:ident = $id:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum MapperKind {
            $($name,)*
        }

        impl MapperKind {
            pub fn from_id(id: u16) -> Result<Self, MapperError> {
                match id {
                    $($id => Ok(Self::$name),)*
                    _ => Err(MapperError::UnsupportedMapper(id))
                }
            }

            pub fn id(self) -> u16 {
                match self {
                    $(Self::$name => $id,)*
                }
            }
        }
    };
}

mappers! {
    Mmc1 = 1,
}

/// The mapper circuit of a loaded cartridge.
#[derive(Debug)]
pub enum Mapper<'rom> {
    Mmc1(Mmc1<'rom>),
}

impl<'rom> Mapper<'rom> {
    /// Builds the mapper the header asks for, opening the battery file next
    /// to `rom_path` when the cartridge has one.
    pub fn new(image: &'rom CartridgeImage, rom_path: &Path) -> Result<Self, MapperError> {
        let kind = MapperKind::from_id(image.header().mapper)?;
        let save_len = image.header().save_ram_bytes();
        let save = if save_len > 0 {
            let path = save_path(rom_path);
            info!("battery-backed RAM present, will save to {}", path.display());
            SaveRam::open(&path, save_len.min(super::mmc1::SAVE_WINDOW_LEN))?
        } else {
            None
        };
        Ok(Self::with_save(kind, image, save))
    }

    /// Builds a mapper of a known kind around an already opened save store.
    pub fn with_save(kind: MapperKind, image: &'rom CartridgeImage, save: Option<SaveRam>) -> Self {
        match kind {
            MapperKind::Mmc1 => Self::Mmc1(Mmc1::new(image, save)),
        }
    }

    pub fn kind(&self) -> MapperKind {
        match self {
            Self::Mmc1(_) => MapperKind::Mmc1,
        }
    }

    /// Tears the mapper down, flushing battery RAM. The image is left untouched.
    pub fn destroy(self) -> Result<(), MapperError> {
        match self {
            Self::Mmc1(mmc1) => mmc1.destroy(),
        }
    }
}

impl NesCart for Mapper<'_> {
    fn cpu_read(&mut self, addr: u16) -> Result<u8, MapperError> {
        match self {
            Self::Mmc1(mmc1) => mmc1.cpu_read(addr),
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) -> Result<(), MapperError> {
        match self {
            Self::Mmc1(mmc1) => mmc1.cpu_write(addr, value),
        }
    }

    fn ppu_read(&mut self, addr: u16) -> u8 {
        match self {
            Self::Mmc1(mmc1) => mmc1.ppu_read(addr),
        }
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        match self {
            Self::Mmc1(mmc1) => mmc1.ppu_write(addr, value),
        }
    }
}
