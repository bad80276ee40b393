use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use log::{info, LevelFilter};

use chip8_host::{keymap::DEFAULT_HOLD_TICKS, load_rom, Runner, Terminal};
use ember8::{Config, Ember8, SeededRng};

/// Run a chip-8 program in the terminal
///
/// Keypad is mapped on 1234/QWER/ASDF/ZXCV, Escape quits. Logs go to stderr,
/// redirect it to keep them off the screen.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the raw program image
    #[arg(short, long)]
    rom: PathBuf,

    /// Instructions executed per second
    #[arg(short, long, default_value_t = Config::DEFAULT_IPS)]
    ips: u32,

    /// Seed for the random number generator, taken from the clock when missing
    #[arg(long)]
    seed: Option<u128>,

    /// Size of a single pixel in terminal rows
    #[arg(short, long, default_value_t = 1)]
    scale: usize,

    /// Ticks a key press is held for, terminals don't report releases
    #[arg(long, default_value_t = DEFAULT_HOLD_TICKS)]
    hold: u8,

    /// Overrides RUST_LOG
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

fn init_logger(level: Option<LevelFilter>) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    );
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.init();
}

fn clock_seed() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.log_level);

    let seed = args.seed.unwrap_or_else(clock_seed);
    info!("random seed {}", seed);
    let mut ember = Ember8::new(SeededRng::new(seed));
    load_rom(&mut ember, &args.rom)
        .with_context(|| format!("cannot start {}", args.rom.display()))?;

    let config = Config {
        instructions_per_second: args.ips,
        ..Config::default()
    };
    let terminal = Terminal::new(args.scale, args.hold).context("cannot set up terminal")?;
    let mut runner = Runner::new(ember, terminal, config);
    let result = runner.run();
    // restore the terminal before anything is reported
    drop(runner);
    result.context("emulation stopped")
}
