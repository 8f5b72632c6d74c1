use std::fmt;

use super::header::{INesHeader, Mirroring};

/// Human-readable dump of every header field.
pub struct RomInfo<'h>(pub &'h INesHeader);

fn kib(bytes: usize) -> f64 {
    bytes as f64 / 1024.0
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

impl fmt::Display for RomInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.0;
        let uncertain = if header.uncertain { " (Uncertain)" } else { "" };
        let mirroring = if header.vertical_mirroring {
            "1 (Vertical)"
        } else {
            "0 (Horizontal)"
        };

        writeln!(f, "=== BEGIN ROM INFO ===")?;
        writeln!(f, "File info:")?;
        writeln!(f, "\tFile size: {:.2}KiB", kib(header.file_size))?;
        writeln!(f, "\tROM format: {}{}", header.format, uncertain)?;
        writeln!(f, "\tNES 2.0 identifier present: {}", yes_no(header.nes2_identifier))?;
        writeln!(f, "ROM info:")?;
        writeln!(f, "\tPRG ROM size: {}KiB", header.prg_rom_len as u32 * 16)?;
        writeln!(f, "\tCHR ROM size: {}KiB", header.chr_rom_len as u32 * 8)?;
        writeln!(f, "\tMapper number: {:#06X}", header.mapper)?;
        if header.format.is_nes2() {
            writeln!(f, "\tSubmapper number: {:#04X}", header.submapper)?;
        }
        writeln!(f, "\tMirroring: {}", mirroring)?;
        writeln!(f, "\tBattery-backed PRG RAM: {}", yes_no(header.battery))?;
        writeln!(f, "\tTrainer present: {}", yes_no(header.trainer))?;
        writeln!(f, "\tForce four screen VRAM: {}", yes_no(header.mirroring() == Mirroring::FourScreen))?;
        writeln!(f, "\tSystem type: {}", header.console)?;
        writeln!(f, "\tPRG RAM size: {:.2}KiB", kib(header.prg_ram.bytes()))?;
        writeln!(f, "\tPRG NVRAM size: {:.2}KiB", kib(header.prg_nvram.bytes()))?;
        writeln!(f, "\tCHR RAM size: {:.2}KiB", kib(header.chr_ram.bytes()))?;
        writeln!(f, "\tCHR NVRAM size: {:.2}KiB", kib(header.chr_nvram.bytes()))?;
        writeln!(f, "\tTiming mode: {}", header.timing)?;
        if header.format.is_nes2() {
            writeln!(f, "\tMiscellaneous ROMs: {}", header.misc_rom_count)?;
            writeln!(f, "\tDefault expansion device: {:#04X}", header.expansion_device)?;
        }
        write!(f, "===  END ROM INFO  ===")
    }
}
