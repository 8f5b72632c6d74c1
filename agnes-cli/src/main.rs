use std::path::{Path, PathBuf};
use std::process::ExitCode;

use agnes::cart::{CartridgeImage, Mapper, RomInfo};
use agnes::{check_system, NesEmulator, StopToken};
use anyhow::Context;
use clap::Parser;
use console::style;
use log::{info, warn};

mod logger;

/// Runs an NES cartridge image on the CPU core.
#[derive(Parser, Debug)]
#[command(name = "agnes", version)]
struct Args {
    /// Path to an iNES or NES 2.0 image
    #[arg(value_name = "ROM")]
    rom: PathBuf,

    /// Print the parsed header and exit without running anything
    #[arg(short, long, default_value_t = false)]
    info: bool,

    /// Run images for Vs. System, PlayChoice-10 and other non-NES hardware anyway
    #[arg(short, long, default_value_t = false)]
    force: bool,

    /// Stop after this many instructions
    #[arg(long, value_name = "N")]
    steps: Option<u64>,

    /// Log more; repeat for debug and trace output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let image = CartridgeImage::load(&args.rom)
        .with_context(|| format!("failed to load {}", args.rom.display()))?;

    if args.info {
        println!("{}", RomInfo(image.header()));
        return Ok(());
    }

    if args.force {
        if let Err(err) = check_system(image.header()) {
            warn!("{}, continuing because of --force", err);
        }
    } else {
        check_system(image.header()).context("refusing to run (use --force to override)")?;
    }

    let stop = StopToken::new();
    ctrlc::set_handler({
        let stop = stop.clone();
        move || stop.stop()
    })
    .context("failed to install the Ctrl-C handler")?;

    let steps = emulate(&image, &args.rom, &stop, args.steps)?;
    info!("executed {} instructions", steps);
    Ok(())
}

/// Runs `image` until `stop` is set, the step budget runs out, or the core
/// fails. The mapper is torn down on every path out of the run loop.
fn emulate(image: &CartridgeImage, rom: &Path, stop: &StopToken, max_steps: Option<u64>) -> anyhow::Result<u64> {
    let mapper = Mapper::new(image, rom).context("failed to set up the cartridge mapper")?;
    info!("mapper {:?}", mapper.kind());
    let mut emu = NesEmulator::new(mapper);

    let result = emu
        .reset()
        .and_then(|()| emu.run(stop, max_steps));
    if stop.is_stopped() {
        info!("stopped at {:#06X}", emu.cpu.pc);
    }
    let teardown = emu.into_cart().destroy();

    let steps = result.context("emulation stopped")?;
    teardown.context("failed to flush save RAM")?;
    Ok(steps)
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    /// One PRG bank, one CHR bank, MMC1 with battery. The program stores `$42`
    /// at `$6003` and spins.
    fn battery_image() -> CartridgeImage {
        let mut bytes = b"NES\x1A\x01\x01\x12\x00".to_vec();
        bytes.resize(16, 0);
        let mut prg = vec![0; 0x4000];
        prg[..8].copy_from_slice(&[
            0xA9, 0x42, // LDA #$42
            0x8D, 0x03, 0x60, // STA $6003
            0x4C, 0x05, 0xC0, // JMP $C005
        ]);
        prg[0x3FFC..].copy_from_slice(&[0x00, 0xC0, 0x00, 0x00]);
        bytes.extend(prg);
        bytes.resize(bytes.len() + 0x2000, 0);
        CartridgeImage::from_bytes(bytes).unwrap()
    }

    #[test]
    fn interrupt_stops_loop_and_flushes_save() {
        let dir = std::env::temp_dir();
        let rom = dir.join(format!("agnes-cli-interrupt-{}.nes", std::process::id()));
        let sav = rom.with_extension("sav");
        std::fs::write(&sav, [0u8; 4]).unwrap();

        let image = battery_image();
        let stop = StopToken::new();
        let interrupt = thread::spawn({
            let stop = stop.clone();
            move || {
                thread::sleep(Duration::from_millis(20));
                stop.stop();
            }
        });

        let steps = emulate(&image, &rom, &stop, None).unwrap();
        interrupt.join().unwrap();
        assert!(steps >= 2);
        assert_eq!(std::fs::read(&sav).unwrap()[3], 0x42);

        std::fs::remove_file(&sav).unwrap();
    }

    #[test]
    fn step_budget_sets_the_token() {
        let image = battery_image();
        let rom = std::env::temp_dir().join(format!("agnes-cli-budget-{}.nes", std::process::id()));
        let stop = StopToken::new();
        assert_eq!(emulate(&image, &rom, &stop, Some(5)).unwrap(), 5);
        assert!(stop.is_stopped());
    }
}
