extern crate replay;
extern crate failure;
extern crate structopt;
#[macro_use] extern crate log;
extern crate simple_logger;

use log::LevelFilter;
use replay::graph::{CoordinateAdapter, Coordinates, IdentityAdapter, ScaleAdapter};
use replay::output::trace::{event_report, sample, write_trace, SampleConfig};
use replay::*;
use std::path::PathBuf;
use structopt::StructOpt;

/// Replay -- reconstruct train movements from a simulation log
#[derive(StructOpt, Debug)]
#[structopt(name="replay")]
struct Opt {
    /// Verbose mode (-v, -vv, -vvv)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,

    /// Scenario file with the track graph, the trains and their events
    #[structopt(parse(from_os_str))]
    scenario: PathBuf,

    /// Seconds between samples
    #[structopt(short = "s", long = "step", default_value = "1.0")]
    step: f64,

    /// Start of the sampling window in seconds
    #[structopt(long = "from")]
    from: Option<f64>,

    /// End of the sampling window in seconds
    #[structopt(long = "to")]
    to: Option<f64>,

    /// Only replay this train
    #[structopt(short = "t", long = "train")]
    train: Option<String>,

    /// Scale coordinates by this factor
    #[structopt(long = "scale")]
    scale: Option<f64>,

    /// Output trace file (default: standard output)
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<PathBuf>,

    /// Print the events of each train with their warnings
    #[structopt(short = "e", long = "events")]
    events: bool,
}

fn run(opt :&Opt) -> AppResult<()> {
    let scenario = get_scenario(&opt.scenario)?;

    let trains = scenario.trains.iter()
        .filter(|t| opt.train.as_ref().map(|n| n == t.name()).unwrap_or(true))
        .collect::<Vec<_>>();
    if let Some(ref name) = opt.train {
        if trains.is_empty() {
            return Err(ReplayError::InvalidArgument(format!("unknown train {}", name)).into());
        }
    }

    if opt.events {
        for train in &trains {
            print!("{}", event_report(train)?);
        }
    }

    let config = SampleConfig {
        step: seconds_to_millis(opt.step),
        from: opt.from.map(seconds_to_millis),
        to: opt.to.map(seconds_to_millis),
    };
    let adapter: Box<dyn CoordinateAdapter> = match opt.scale {
        Some(scale) => Box::new(ScaleAdapter { scale, offset: Coordinates::new(0.0, 0.0) }),
        None => Box::new(IdentityAdapter),
    };

    use std::fs::File;
    use std::io::{self, BufWriter, Write};
    let mut writer: Box<dyn Write> = match opt.output {
        Some(ref path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };
    for train in &trains {
        let rows = sample(train, &config)?;
        info!("Train {}: {} events, {} samples", train.name(), train.timeline().events().len(), rows.len());
        write_trace(&mut writer, &rows, &*adapter)?;
    }
    writer.flush()?;

    Ok(())
}

pub fn main() {
    let opt = Opt::from_args();
    let level = match opt.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = simple_logger::SimpleLogger::new().with_level(level).init() {
        println!("Error:\n{}", e);
        std::process::exit(1);
    }
    debug!("{:?}", opt);

    match run(&opt) {
        Ok(()) => {},
        Err(e) => {
            println!("Error:\n{}", e.as_fail());
            std::process::exit(1);
        },
    }
}
