use std::io::prelude::*;
use std::path::Path;

mod header;
mod info;
mod mapper;
mod mmc1;
mod parse;
mod save;

pub use header::*;
pub use info::RomInfo;
pub use mapper::{Mapper, MapperError, MapperKind};
pub use mmc1::Mmc1;
pub use parse::LoadError;
pub use save::{save_path, SaveRam, SaveStore};

/// A loaded `.nes` image: the raw file plus its parsed header.
///
/// Never modified after loading; mappers borrow it for the lifetime of the
/// emulation.
#[derive(Debug)]
pub struct CartridgeImage {
    bytes: Box<[u8]>,
    header: INesHeader,
}

impl CartridgeImage {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    pub fn parse(read: &mut impl Read) -> Result<Self, LoadError> {
        let mut bytes = Vec::new();
        read.read_to_end(&mut bytes)?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, LoadError> {
        let header = INesHeader::parse(&bytes)?;
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
            header,
        })
    }

    pub fn header(&self) -> &INesHeader {
        &self.header
    }

    /// The whole file, header included.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn prg_rom(&self) -> &[u8] {
        let start = self.header.prg_rom_start();
        &self.bytes[start..start + self.header.prg_rom_bytes()]
    }

    pub fn chr_rom(&self) -> &[u8] {
        let start = self.header.prg_rom_start() + self.header.prg_rom_bytes();
        &self.bytes[start..start + self.header.chr_rom_bytes()]
    }
}
