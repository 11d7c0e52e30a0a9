use std::io;

use failure;

use crate::graph::CoordinateAdapter;
use crate::snapshot::Snapshot;
use crate::train::Train;
use crate::{ReplayError, Time, INIT_STATE_TIME};

/// Which states of a train to sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SampleConfig {
    /// Milliseconds between samples.
    pub step: Time,
    /// Defaults to the first event of the train.
    pub from: Option<Time>,
    /// Defaults to the last event of the train.
    pub to: Option<Time>,
}

impl Default for SampleConfig {
    fn default() -> SampleConfig {
        SampleConfig { step: 1000, from: None, to: None }
    }
}

/// State of `train` at every `config.step` in the sampling window.
pub fn sample(train: &Train, config: &SampleConfig) -> Result<Vec<Snapshot>, ReplayError> {
    if config.step <= 0 {
        return Err(ReplayError::InvalidArgument(format!("sampling step {} is not positive", config.step)));
    }
    let snapshots = train.timeline().snapshots();
    let first = snapshots.get(1).map(|s| s.time()).unwrap_or(INIT_STATE_TIME);
    let from = config.from.unwrap_or(first).max(INIT_STATE_TIME);
    let to = config.to.unwrap_or(train.timeline().last().time());
    debug!("Sampling train {} from {} to {} every {}", train.name(), from, to, config.step);

    let mut rows = Vec::new();
    let mut hint: Option<&Snapshot> = None;
    let mut time = from;
    while time <= to {
        let state = match hint {
            Some(h) => train.get_state_from(time, h)?,
            None => train.get_state(time)?,
        };
        hint = snapshots.get(state.index());
        rows.push(state);
        time = match time.checked_add(config.step) {
            Some(t) => t,
            None => break,
        };
    }
    Ok(rows)
}

/// Print one sampled state per line on the following format:
/// `trainname time speed terminated x,y x,y ...`, with the points of the
/// train from front to back, or `-` when the train is not placed yet.
pub fn write_trace<W: io::Write, A: CoordinateAdapter + ?Sized>(out: &mut W, rows: &[Snapshot], adapter: &A)
                                                               -> io::Result<()> {
    for row in rows {
        write!(out, "{} {} {:.3} {}", row.train(), row.time(), row.speed(), row.is_terminated())?;
        match row.position() {
            Some(p) => for c in p.positions(adapter) {
                write!(out, " {:.3},{:.3}", c.x, c.y)?;
            },
            None => write!(out, " -")?,
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Events of one train with their warnings, one event per line on the
/// format `trainname time event description`.
pub fn event_report(train: &Train) -> Result<String, failure::Error> {
    use std::fmt::Write;
    let mut s = String::new();
    for ev in train.timeline().events() {
        write!(s, "{} {}", train.name(), ev)?;
        if ev.requested_time != ev.time {
            write!(s, " (logged at {})", ev.requested_time)?;
        }
        write!(s, "\n")?;
        for w in &ev.warnings {
            write!(s, "  warning: {}\n", w)?;
        }
    }
    Ok(s)
}
