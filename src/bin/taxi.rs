//! Utility for viewing and capturing TAXI streams.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use taxi_stream::render::{Levels, DEFAULT_GAIN, DEFAULT_LEVEL};
use taxi_stream::session::CaptureSession;
use taxi_stream::source::{FileSource, RawSink};

#[derive(Parser, Debug)]
#[command(name = "taxi", about = "Utility for TAXI streams")]
struct Args {
    /// File or FIFO to read raw stream data from
    #[arg(short = 'f', long, default_value = "log.bin")]
    input: PathBuf,

    /// Write the raw stream verbatim to this file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Write each decoded frame as a PNG into this directory
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Black level subtracted from every sample before scaling
    #[arg(long, default_value_t = DEFAULT_LEVEL)]
    level: i32,

    /// Gain applied after level subtraction
    #[arg(long, default_value_t = DEFAULT_GAIN)]
    gain: f32,

    /// Increase verbosity of logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    simplelog::TermLogger::init(
        if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let source = FileSource::open(&args.input).await?;

    let mut session = CaptureSession::new(source);
    if let Some(path) = &args.output {
        session = session.with_raw_sink(RawSink::create(path).await?);
    }

    if let Some(dir) = &args.frames {
        std::fs::create_dir_all(dir)?;
    }

    let levels = Levels::new(args.level, args.gain);
    let frames_dir = args.frames.clone();
    let mut index = 0u64;
    let mut save_error = None;

    let capture = session.run(|frame| {
        if let Some(dir) = &frames_dir {
            let path = dir.join(format!("frame_{index:05}.png"));
            if let Err(e) = levels.colormap(&frame).save(&path) {
                save_error.get_or_insert(e);
            }
        }
        index += 1;
    });

    // The loop runs until the source ends; ctrl-c cuts it short, losing any
    // bytes read but not yet decoded.
    tokio::select! {
        stats = capture => {
            let stats = stats?;
            info!("{} frames from {} bytes", stats.frames, stats.bytes);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
        }
    }

    if let Some(e) = save_error {
        return Err(e.into());
    }
    Ok(())
}
