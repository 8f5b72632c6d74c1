use std::fmt;

/// Size of the fixed header at the start of every image.
pub const HEADER_LEN: usize = 16;
/// Size of the optional trainer between the header and PRG ROM.
pub const TRAINER_LEN: usize = 512;
pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;

/// The header dialect the image was identified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderFormat {
    INes,
    /// Pre-standard dumps; bytes 7-15 may hold garbage.
    ArchaicINes,
    /// Never produced by detection; kept so descriptors can name the dialect.
    INes07,
    Nes2,
}

impl HeaderFormat {
    pub fn is_nes2(self) -> bool {
        self == Self::Nes2
    }
}

impl fmt::Display for HeaderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::INes => "iNES",
            Self::ArchaicINes => "Archaic iNES",
            Self::INes07 => "iNES 0.7",
            Self::Nes2 => "NES 2.0",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// Console the image targets (byte 7, bits 0-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleType {
    NesFamicom,
    /// Vs. UniSystem / DualSystem. PPU and hardware types are only known for NES 2.0 images.
    VsSystem { ppu_type: u8, hardware_type: u8 },
    Playchoice10,
    /// Extended console type code from byte 14 (NES 2.0 only, otherwise 0).
    Extended(u8),
}

impl ConsoleType {
    pub fn name(self) -> &'static str {
        match self {
            Self::NesFamicom => "Nintendo Entertainment System or Nintendo Famicom",
            Self::VsSystem { .. } => "Nintendo Vs. UniSystem or Nintendo Vs. DualSystem",
            Self::Playchoice10 => "Nintendo Playchoice 10",
            Self::Extended(code) => match code & 0xF {
                0x0 => "Nintendo Entertainment System, Nintendo Famicom or Dendy (Extended)",
                0x1 => "Nintendo Vs. UniSystem or Nintendo Vs. DualSystem",
                0x2 => "Nintendo Playchoice 10",
                0x3 => "Nintendo Famicom clone with 6502-compatible CPU",
                0x4 => "Nintendo Entertainment System or Nintendo Famicom with EPSM/Plug-through cartridge",
                0x5 => "V.R. Technology VT01 with red/cyan STN palette",
                0x6 => "V.R. Technology VT02",
                0x7 => "V.R. Technology VT03",
                0x8 => "V.R. Technology VT09",
                0x9 => "V.R. Technology VT32",
                0xA => "V.R. Technology VT369",
                0xB => "UMC UM6578",
                0xC => "Nintendo Famicom Network System",
                _ => "Unknown (Reserved)",
            },
        }
    }
}

impl fmt::Display for ConsoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CPU/PPU timing standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
    /// RP2C02
    Ntsc,
    /// RP2C07
    Pal,
    MultiRegion,
    /// UA6538
    Dendy,
}

impl Timing {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Ntsc,
            1 => Self::Pal,
            2 => Self::MultiRegion,
            3 => Self::Dendy,
            _ => unreachable!("masked to 2 bits"),
        }
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ntsc => "RP2C02 (NTSC)",
            Self::Pal => "RP2C07 (PAL)",
            Self::MultiRegion => "Dual-compatible (NTSC/PAL)",
            Self::Dendy => "UA6538 (Dendy)",
        })
    }
}

/// A RAM size as the header encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RamSize {
    /// NES 2.0: `64 << n` bytes, with 0 meaning none.
    Shift(u8),
    /// Legacy dialects: `n` units of 8 KiB.
    Units(u8),
}

impl RamSize {
    pub fn bytes(self) -> usize {
        match self {
            Self::Shift(0) => 0,
            Self::Shift(n) => 64 << n,
            Self::Units(n) => n as usize * 8 * 1024,
        }
    }
}

/// Advisory findings; none of them change the parsed values beyond what is documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderWarning {
    /// The header bytes did not unambiguously identify a dialect.
    UncertainFormat,
    /// Bytes 9 and 10 disagree on the TV system; NTSC was chosen.
    TimingMismatch,
    /// Byte 10 marks the image as dual-region; NTSC was chosen.
    DualRegion,
}

impl fmt::Display for HeaderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UncertainFormat => "could not definitively determine ROM format, errors may occur",
            Self::TimingMismatch => "header bytes 9 and 10 disagree on NTSC/PAL, defaulting to NTSC",
            Self::DualRegion => "NTSC/PAL cross-compatible ROM, defaulting to NTSC",
        })
    }
}

/// Everything the header says about the cartridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct INesHeader {
    pub format: HeaderFormat,
    /// Set when the dialect was a best guess.
    pub uncertain: bool,
    /// Byte 7 carried the NES 2.0 identifier, whatever dialect was finally chosen.
    pub nes2_identifier: bool,
    pub file_size: usize,
    /// In 16 KiB banks.
    pub prg_rom_len: u16,
    /// In 8 KiB banks.
    pub chr_rom_len: u16,
    /// 12 bits under NES 2.0, 8 bits otherwise.
    pub mapper: u16,
    pub submapper: u8,
    pub vertical_mirroring: bool,
    pub battery: bool,
    pub trainer: bool,
    pub four_screen: bool,
    pub console: ConsoleType,
    pub prg_ram: RamSize,
    pub prg_nvram: RamSize,
    pub chr_ram: RamSize,
    pub chr_nvram: RamSize,
    pub timing: Timing,
    pub misc_rom_count: u8,
    pub expansion_device: u8,
    pub warnings: Vec<HeaderWarning>,
}

impl INesHeader {
    pub fn mirroring(&self) -> Mirroring {
        if self.four_screen {
            Mirroring::FourScreen
        } else if self.vertical_mirroring {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }

    pub fn prg_rom_start(&self) -> usize {
        HEADER_LEN + if self.trainer { TRAINER_LEN } else { 0 }
    }

    pub fn prg_rom_bytes(&self) -> usize {
        self.prg_rom_len as usize * PRG_BANK_SIZE
    }

    pub fn chr_rom_bytes(&self) -> usize {
        self.chr_rom_len as usize * CHR_BANK_SIZE
    }

    /// Bytes the header, trainer, PRG ROM and CHR ROM occupy together.
    pub fn layout_len(&self) -> usize {
        self.prg_rom_start() + self.prg_rom_bytes() + self.chr_rom_bytes()
    }

    pub fn has_prg_ram(&self) -> bool {
        self.prg_ram.bytes() > 0 || self.prg_nvram.bytes() > 0
    }

    /// Size of the battery-backed region mapped at `$6000`, or 0 without a battery.
    pub fn save_ram_bytes(&self) -> usize {
        if !self.battery {
            return 0;
        }
        match self.prg_nvram.bytes() {
            0 => self.prg_ram.bytes(),
            nvram => nvram,
        }
    }
}
