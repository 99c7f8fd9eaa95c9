use chipcore::context::SongData;
use chipcore::dispatch::{chip_channels, RegisterWrite};
use chipcore::instrument::{Instrument, MacroKind, MacroTable};
use chipcore::{create_dispatch, ChipConfig, Command, EngineContext, Region};
use clap::Parser;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "chipcore")]
#[command(version = "0.1.0")]
#[command(about = "Drive a sound chip backend and dump its register writes", long_about = None)]
struct Args {
    /// List available sound chips
    #[arg(short = 'L', long)]
    list_chips: bool,

    /// Chip to drive
    #[arg(short, long, default_value = "2A03")]
    chip: String,

    /// JSON chip configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Timing profile (ntsc, pal, dendy), overrides the config file
    #[arg(short, long, value_parser = parse_region)]
    region: Option<Region>,

    /// Channel the notes are played on
    #[arg(long, default_value_t = 0)]
    channel: usize,

    /// Notes to play, one after another
    #[arg(short, long, value_delimiter = ',', default_value = "48,52,55,60")]
    notes: Vec<i32>,

    /// Ticks each note is held
    #[arg(short, long, default_value_t = 8)]
    ticks_per_note: usize,

    /// Volume macro for the instrument
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    vol_macro: Option<Vec<i32>>,

    /// Output samples per tick (defaults to 1/60 s)
    #[arg(long)]
    samples_per_tick: Option<usize>,

    /// Print the register sheet and exit
    #[arg(long)]
    regs: bool,

    /// Write the trace as JSON instead of one write per line
    #[arg(short, long)]
    json: bool,

    /// Trace output file, gzipped when it ends in .gz (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_region(s: &str) -> Result<Region, String> {
    match s.to_ascii_lowercase().as_str() {
        "ntsc" => Ok(Region::Ntsc),
        "pal" => Ok(Region::Pal),
        "dendy" => Ok(Region::Dendy),
        _ => Err(format!("unknown region: {}", s)),
    }
}

#[derive(Serialize)]
struct Trace<'a> {
    chip: &'a str,
    region: Region,
    rate: u32,
    samples: usize,
    peak: i32,
    writes: &'a [RegisterWrite],
}

fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(io::stdout().lock()));
    };
    let file = BufWriter::new(File::create(path)?);
    let gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if gzip {
        Ok(Box::new(GzEncoder::new(file, Compression::default())))
    } else {
        Ok(Box::new(file))
    }
}

fn main() -> Result<(), chipcore::Error> {
    env_logger::init();
    let args = Args::parse();

    if args.list_chips {
        for name in chipcore::list_chips() {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => ChipConfig::load(path)?,
        None => ChipConfig::default(),
    };
    if let Some(region) = args.region {
        config.region = region;
    }
    config.dump_writes = true;

    let mut song = SongData::new();
    let mut ins = Instrument::new("cli");
    if let Some(vol) = &args.vol_macro {
        ins = ins.with_macro(MacroKind::Volume, MacroTable::new(vol.clone()));
    }
    let ins_id = song.add_instrument(ins);
    let context: Arc<dyn EngineContext> = Arc::new(song);

    let channels = chip_channels(&args.chip)?;
    let mut chip = create_dispatch(&args.chip, context, channels, &config)?;

    if args.regs {
        for (name, addr) in chip.register_sheet() {
            println!("{:<12} {:04X}", name, addr);
        }
        return Ok(());
    }

    let samples_per_tick = args
        .samples_per_tick
        .unwrap_or(chip.rate() as usize / 60)
        .max(1);
    let mut left = vec![0i16; samples_per_tick];
    let mut right = vec![0i16; samples_per_tick];
    let mut peak = 0i32;
    let mut samples = 0usize;

    let mut render = |chip: &mut dyn chipcore::ChipDispatch| {
        chip.tick();
        chip.acquire(&mut left, &mut right, 0, samples_per_tick);
        peak = left.iter().fold(peak, |p, &s| p.max((s as i32).abs()));
        samples += samples_per_tick;
    };

    chip.dispatch(Command::instrument(args.channel, ins_id));
    for &note in &args.notes {
        chip.dispatch(Command::note_on(args.channel, note));
        for _ in 0..args.ticks_per_note {
            render(chip.as_mut());
        }
    }
    chip.dispatch(Command::note_off(args.channel));
    render(chip.as_mut());

    let writes = chip.write_queue_mut().drain();
    let mut out = open_output(args.output.as_deref())?;
    if args.json {
        let trace = Trace {
            chip: chip.name(),
            region: config.region,
            rate: chip.rate(),
            samples,
            peak,
            writes: &writes,
        };
        serde_json::to_writer_pretty(&mut out, &trace)?;
        writeln!(out)?;
    } else {
        for w in &writes {
            writeln!(out, "{:08X}={:04X}", w.addr, w.val)?;
        }
    }
    out.flush()?;
    drop(out);

    eprintln!(
        "{}: {} writes, {} samples at {} Hz, peak {}",
        chip.name(),
        writes.len(),
        samples,
        chip.rate(),
        peak
    );
    chip.quit();
    Ok(())
}
