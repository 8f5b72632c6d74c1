use log::{debug, warn};
use thiserror::Error;

use super::header::*;

const MAGIC: &[u8; 4] = b"NES\x1A";

/// Slack the NES 2.0 size prediction allows on top of the ROM banks.
const NES2_PREDICTION_SLACK: usize = 512;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid image: missing magic value")]
    InvalidImage,
    #[error("corrupt image: header declares {expected} bytes but the file has {actual}")]
    CorruptImage { expected: usize, actual: usize },
}

/// A bit field within the 16-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    // Shared by every dialect
    PrgRomLow,
    ChrRomLow,
    VerticalMirroring,
    Battery,
    Trainer,
    FourScreen,
    MapperLow,
    ConsoleType,
    FormatId,
    MapperMid,

    // NES 2.0 only
    MapperHigh,
    Submapper,
    PrgRomHigh,
    ChrRomHigh,
    PrgRamShift,
    PrgNvramShift,
    ChrRamShift,
    ChrNvramShift,
    Timing,
    VsPpuType,
    VsHardwareType,
    ExtendedConsoleType,
    MiscRomCount,
    ExpansionDevice,

    // Legacy dialects only
    PrgRamUnits,
    TvSystem,
    TvSystemExt,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpec {
    pub field: Field,
    pub byte: usize,
    pub shift: u8,
    pub mask: u8,
}

const fn spec(field: Field, byte: usize, shift: u8, mask: u8) -> FieldSpec {
    FieldSpec { field, byte, shift, mask }
}

/// Indexed by `Field as usize`.
pub(crate) const FIELD_TABLE: [FieldSpec; 27] = [
    spec(Field::PrgRomLow, 4, 0, 0xFF),
    spec(Field::ChrRomLow, 5, 0, 0xFF),
    spec(Field::VerticalMirroring, 6, 0, 0x1),
    spec(Field::Battery, 6, 1, 0x1),
    spec(Field::Trainer, 6, 2, 0x1),
    spec(Field::FourScreen, 6, 3, 0x1),
    spec(Field::MapperLow, 6, 4, 0xF),
    spec(Field::ConsoleType, 7, 0, 0x3),
    spec(Field::FormatId, 7, 2, 0x3),
    spec(Field::MapperMid, 7, 4, 0xF),
    spec(Field::MapperHigh, 8, 0, 0xF),
    spec(Field::Submapper, 8, 4, 0xF),
    spec(Field::PrgRomHigh, 9, 0, 0xF),
    spec(Field::ChrRomHigh, 9, 4, 0xF),
    spec(Field::PrgRamShift, 10, 0, 0xF),
    spec(Field::PrgNvramShift, 10, 4, 0xF),
    spec(Field::ChrRamShift, 11, 0, 0xF),
    spec(Field::ChrNvramShift, 11, 4, 0xF),
    spec(Field::Timing, 12, 0, 0x3),
    spec(Field::VsPpuType, 13, 0, 0xF),
    spec(Field::VsHardwareType, 13, 4, 0xF),
    spec(Field::ExtendedConsoleType, 14, 0, 0xF),
    spec(Field::MiscRomCount, 14, 0, 0x3),
    spec(Field::ExpansionDevice, 15, 0, 0x3F),
    spec(Field::PrgRamUnits, 8, 0, 0xFF),
    spec(Field::TvSystem, 9, 0, 0x1),
    spec(Field::TvSystemExt, 10, 0, 0x3),
];

/// `FormatId` value carried by NES 2.0 images.
const NES2_ID: u8 = 0b10;

struct RawHeader<'h>(&'h [u8; HEADER_LEN]);

impl RawHeader<'_> {
    fn get(&self, field: Field) -> u8 {
        let spec = FIELD_TABLE[field as usize];
        (self.0[spec.byte] >> spec.shift) & spec.mask
    }

    fn flag(&self, field: Field) -> bool {
        self.get(field) != 0
    }

    fn nes2_rom_lens(&self) -> (u16, u16) {
        let prg = self.get(Field::PrgRomLow) as u16 | (self.get(Field::PrgRomHigh) as u16) << 8;
        let chr = self.get(Field::ChrRomLow) as u16 | (self.get(Field::ChrRomHigh) as u16) << 8;
        (prg, chr)
    }

    fn legacy_rom_lens(&self) -> (u16, u16) {
        (self.get(Field::PrgRomLow) as u16, self.get(Field::ChrRomLow) as u16)
    }

    /// Picks the dialect, returning it with the uncertainty flag.
    ///
    /// An NES 2.0 identifier only counts if the extended ROM sizes (plus a
    /// fixed slack) fit in the file; otherwise the image is read as iNES.
    fn resolve_format(&self, file_size: usize) -> (HeaderFormat, bool) {
        match self.get(Field::FormatId) {
            NES2_ID => {
                let (prg, chr) = self.nes2_rom_lens();
                let predicted = NES2_PREDICTION_SLACK
                    + CHR_BANK_SIZE * chr as usize
                    + PRG_BANK_SIZE * prg as usize;
                if file_size < predicted {
                    debug!(
                        "NES 2.0 identifier present but predicted size {} exceeds file size {}, reading as iNES",
                        predicted, file_size
                    );
                    (HeaderFormat::INes, false)
                } else {
                    (HeaderFormat::Nes2, false)
                }
            }
            0b01 => (HeaderFormat::ArchaicINes, false),
            0b00 if self.0[12..16].iter().all(|&b| b == 0) => (HeaderFormat::INes, false),
            _ => (HeaderFormat::ArchaicINes, true),
        }
    }

    /// Legacy TV system: byte 9 gives a guess that byte 10 must agree with
    /// for PAL to be chosen.
    fn legacy_timing(&self, warnings: &mut Vec<HeaderWarning>) -> Timing {
        let byte9_pal = self.flag(Field::TvSystem);
        match (self.get(Field::TvSystemExt), byte9_pal) {
            (0, false) => Timing::Ntsc,
            (2, true) => Timing::Pal,
            (0 | 2, _) => {
                warnings.push(HeaderWarning::TimingMismatch);
                Timing::Ntsc
            }
            _ => {
                warnings.push(HeaderWarning::DualRegion);
                Timing::Ntsc
            }
        }
    }
}

impl INesHeader {
    /// Parses the header at the start of a complete image.
    ///
    /// The whole image is needed because the dialect depends on the file size.
    pub fn parse(image: &[u8]) -> Result<Self, LoadError> {
        use LoadError::*;

        if !image.starts_with(MAGIC) {
            return Err(InvalidImage);
        }
        let raw: &[u8; HEADER_LEN] = image
            .get(..HEADER_LEN)
            .and_then(|header| header.try_into().ok())
            .ok_or(CorruptImage { expected: HEADER_LEN, actual: image.len() })?;
        let raw = RawHeader(raw);
        let file_size = image.len();

        let mut warnings = Vec::new();
        let (format, uncertain) = raw.resolve_format(file_size);
        if uncertain {
            warnings.push(HeaderWarning::UncertainFormat);
        }

        let (prg_rom_len, chr_rom_len) = if format.is_nes2() {
            raw.nes2_rom_lens()
        } else {
            raw.legacy_rom_lens()
        };

        let console_bits = raw.get(Field::ConsoleType);
        let mut mapper = raw.get(Field::MapperLow) as u16 | (raw.get(Field::MapperMid) as u16) << 4;

        let mut header = if format.is_nes2() {
            mapper |= (raw.get(Field::MapperHigh) as u16) << 8;
            let console = match console_bits {
                0 => ConsoleType::NesFamicom,
                1 => ConsoleType::VsSystem {
                    ppu_type: raw.get(Field::VsPpuType),
                    hardware_type: raw.get(Field::VsHardwareType),
                },
                2 => ConsoleType::Playchoice10,
                _ => ConsoleType::Extended(raw.get(Field::ExtendedConsoleType)),
            };
            Self {
                format,
                uncertain,
                nes2_identifier: true,
                file_size,
                prg_rom_len,
                chr_rom_len,
                mapper,
                submapper: raw.get(Field::Submapper),
                vertical_mirroring: false,
                battery: false,
                trainer: false,
                four_screen: false,
                console,
                prg_ram: RamSize::Shift(raw.get(Field::PrgRamShift)),
                prg_nvram: RamSize::Shift(raw.get(Field::PrgNvramShift)),
                chr_ram: RamSize::Shift(raw.get(Field::ChrRamShift)),
                chr_nvram: RamSize::Shift(raw.get(Field::ChrNvramShift)),
                timing: Timing::from_bits(raw.get(Field::Timing)),
                misc_rom_count: raw.get(Field::MiscRomCount),
                expansion_device: raw.get(Field::ExpansionDevice),
                warnings: Vec::new(),
            }
        } else {
            let console = match console_bits {
                0 => ConsoleType::NesFamicom,
                1 => ConsoleType::VsSystem { ppu_type: 0, hardware_type: 0 },
                2 => ConsoleType::Playchoice10,
                _ => ConsoleType::Extended(0),
            };
            let timing = raw.legacy_timing(&mut warnings);
            Self {
                format,
                uncertain,
                nes2_identifier: raw.get(Field::FormatId) == NES2_ID,
                file_size,
                prg_rom_len,
                chr_rom_len,
                mapper: mapper & 0xFF,
                submapper: 0,
                vertical_mirroring: false,
                battery: false,
                trainer: false,
                four_screen: false,
                console,
                prg_ram: RamSize::Units(raw.get(Field::PrgRamUnits).max(1)),
                prg_nvram: RamSize::Shift(0),
                chr_ram: RamSize::Shift(0),
                chr_nvram: RamSize::Shift(0),
                timing,
                misc_rom_count: 0,
                expansion_device: 0,
                warnings: Vec::new(),
            }
        };

        header.vertical_mirroring = raw.flag(Field::VerticalMirroring);
        header.battery = raw.flag(Field::Battery);
        header.trainer = raw.flag(Field::Trainer);
        header.four_screen = raw.flag(Field::FourScreen);

        let expected = header.layout_len();
        if expected > file_size {
            return Err(CorruptImage { expected, actual: file_size });
        }

        for warning in &warnings {
            warn!("{}", warning);
        }
        header.warnings = warnings;
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_table_is_indexed_by_field() {
        for (index, spec) in FIELD_TABLE.iter().enumerate() {
            assert_eq!(spec.field as usize, index, "{:?}", spec.field);
            assert!(spec.byte >= 4 && spec.byte < HEADER_LEN, "{:?}", spec.field);
            assert!(spec.shift < 8, "{:?}", spec.field);
            assert!(
                (spec.mask as u16) << spec.shift <= 0xFF,
                "{:?} spills out of its byte",
                spec.field
            );
        }
    }

    #[test]
    fn every_field_reads_its_own_bits() {
        for spec in FIELD_TABLE {
            let mut bytes = [0; HEADER_LEN];
            bytes[spec.byte] = spec.mask << spec.shift;
            let raw = RawHeader(&bytes);
            assert_eq!(raw.get(spec.field), spec.mask, "{:?}", spec.field);

            bytes[spec.byte] = !(spec.mask << spec.shift);
            let raw = RawHeader(&bytes);
            assert_eq!(raw.get(spec.field), 0, "{:?}", spec.field);
        }
    }

    #[test]
    fn format_id_patterns() {
        let mut bytes = [0; HEADER_LEN];
        let large = 1 << 20;

        bytes[7] = 0x08;
        assert_eq!(RawHeader(&bytes).resolve_format(large), (HeaderFormat::Nes2, false));
        bytes[7] = 0x04;
        assert_eq!(RawHeader(&bytes).resolve_format(large), (HeaderFormat::ArchaicINes, false));
        bytes[7] = 0x0C;
        assert_eq!(RawHeader(&bytes).resolve_format(large), (HeaderFormat::ArchaicINes, true));
        bytes[7] = 0x00;
        assert_eq!(RawHeader(&bytes).resolve_format(large), (HeaderFormat::INes, false));
        bytes[15] = 0x01;
        assert_eq!(RawHeader(&bytes).resolve_format(large), (HeaderFormat::ArchaicINes, true));
    }

    #[test]
    fn legacy_timing_precedence() {
        let cases = [
            (0x00, 0x00, Timing::Ntsc, None),
            (0x01, 0x02, Timing::Pal, None),
            (0x01, 0x00, Timing::Ntsc, Some(HeaderWarning::TimingMismatch)),
            (0x00, 0x02, Timing::Ntsc, Some(HeaderWarning::TimingMismatch)),
            (0x00, 0x01, Timing::Ntsc, Some(HeaderWarning::DualRegion)),
            (0x01, 0x03, Timing::Ntsc, Some(HeaderWarning::DualRegion)),
        ];
        for (byte9, byte10, timing, warning) in cases {
            let mut bytes = [0; HEADER_LEN];
            bytes[9] = byte9;
            bytes[10] = byte10;
            let mut warnings = Vec::new();
            assert_eq!(RawHeader(&bytes).legacy_timing(&mut warnings), timing);
            assert_eq!(warnings.first().copied(), warning, "{:#04X} {:#04X}", byte9, byte10);
        }
    }
}
