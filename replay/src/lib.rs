//! Replay -- reconstruction of train movements from a simulation log.
//!
//! Every train owns a `timeline::Timeline`: an append-only list of the events
//! read from the log and the `snapshot::Snapshot` each of them produced. The
//! state of a train at an arbitrary time is found by `train::Train::get_state`,
//! which interpolates between the two recorded snapshots around that time.

extern crate smallvec;
extern crate ordered_float;
extern crate regex;
extern crate failure;
#[macro_use] extern crate failure_derive;
#[macro_use] extern crate log;

#[cfg(test)] #[macro_use] extern crate approx;

pub mod graph;
pub mod position;
pub mod snapshot;
pub mod timeline;
pub mod train;

pub mod input;
pub mod output;

#[cfg(test)]
mod tests;

/// Time in milliseconds.
pub type Time = i64;

/// Time of the synthetic state every train starts out in, before its
/// initialization event.
pub const INIT_STATE_TIME: Time = -1;

pub const MILLIS_PER_SECOND: f64 = 1000.0;

/// Distances closer than this are considered equal when checking whether a
/// train has reached the end of an edge.
pub const TOLERANCE: f64 = 1e-4;

/// Out of range values saturate at the ends of the `Time` range.
pub fn seconds_to_millis(seconds: f64) -> Time {
    (seconds * MILLIS_PER_SECOND).round() as Time
}

/// Contract violations. Anomalies in the log data itself are not errors,
/// they are recorded as warnings on the event (see `timeline::Event`).
#[derive(Debug, Fail, Clone, PartialEq)]
pub enum ReplayError {
    #[fail(display = "invalid argument: {}", _0)]
    InvalidArgument(String),
    #[fail(display = "illegal state: {}", _0)]
    IllegalState(String),
}

use std::path::Path;
pub type AppResult<T> = Result<T, failure::Error>;

pub fn read_file(f :&Path) -> AppResult<String> {
  use std::fs::File;
  use std::io::prelude::*;
  use std::io::BufReader;

  let file = File::open(f)?;
  let mut file = BufReader::new(&file);
  let mut contents = String::new();
  file.read_to_string(&mut contents)?;
  Ok(contents)
}

use input::scenario::Scenario;
pub fn get_scenario(s :&Path) -> AppResult<Scenario> {
    let contents = read_file(s)?;
    get_scenario_string(&contents)
}

pub fn get_scenario_string(s :&str) -> AppResult<Scenario> {
    let scenario = input::scenario::parse_scenario(s)?;
    info!("Loaded {} nodes, {} edges and {} trains",
          scenario.graph.nodes().len(), scenario.graph.edges().len(), scenario.trains.len());
    Ok(scenario)
}
