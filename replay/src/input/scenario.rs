use std::collections::HashMap;

use regex::Regex;

use crate::graph::{Coordinates, Graph};
use crate::train::{Train, TrainParams};
use crate::{seconds_to_millis, ReplayError};

pub const DEFAULT_COLOR: &str = "gray";

#[derive(Debug)]
pub struct Scenario {
    pub graph: Graph,
    /// In order of declaration.
    pub trains: Vec<Train>,
}

impl Scenario {
    pub fn train(&self, name: &str) -> Option<&Train> {
        self.trains.iter().find(|t| t.name() == name)
    }
}

#[derive(Debug, Fail)]
pub enum ParseError {
    #[fail(display = "error in regular expression: {}", _0)]
    RegexError(String),
    #[fail(display = "line {}: error converting number {:?}", _0, _1)]
    NumberError(usize, String),
    #[fail(display = "line {}: unknown {} {:?}", _0, _1, _2)]
    UnknownName(usize, &'static str, String),
    #[fail(display = "line {}: {}", _0, _1)]
    Rejected(usize, ReplayError),
    #[fail(display = "line {}: unrecognized input: {}", _0, _1)]
    Unrecognized(usize, String),
}

fn regex(re: &str) -> Result<Regex, ParseError> {
    Regex::new(re).map_err(|e| ParseError::RegexError(format!("{:?}", e)))
}

fn number(line: usize, s: &str) -> Result<f64, ParseError> {
    s.parse::<f64>().map_err(|_e| ParseError::NumberError(line, s.to_string()))
}

fn known<'a, T>(line: usize, kind: &'static str, name: &str, x: Option<&'a T>) -> Result<&'a T, ParseError> {
    x.ok_or_else(|| ParseError::UnknownName(line, kind, name.to_string()))
}

/// Parses the scenario format: the track graph, the trains, and the event
/// log of each train. Times are in seconds. Text after `#` is ignored.
///
/// * node n1 0.0 0.0
/// * edge e1 n1 n2 50.0
/// * train t1 length=10.0 color=red
/// * 0.0 t1 init e1 [towards n2]
/// * 2.5 t1 speed 10.0 4.0
/// * 3.0 t1 move 2.0
/// * 4.0 t1 reach e2 3.0
/// * 5.0 t1 leave e1 7.0
/// * 9.0 t1 terminate 1.0
///
pub fn parse_scenario(input: &str) -> Result<Scenario, ParseError> {
    let node_re = regex(r"^node\s+(?P<name>\S+)\s+(?P<x>\S+)\s+(?P<y>\S+)$")?;
    let edge_re = regex(r"^edge\s+(?P<name>\S+)\s+(?P<a>\S+)\s+(?P<b>\S+)\s+(?P<len>\S+)$")?;
    let train_re = regex(r"(?x) ^ train \s+ (?P<name>\S+) \s+
            length \s* = \s* (?P<len>\S+)
            (?: \s+ color \s* = \s* (?P<color>\S+) )?
            $")?;
    let event_re = regex(r"^(?P<time>-?[\d\.]+)\s+(?P<train>\S+)\s+(?P<action>\w+)(?P<args>(?:\s+\S+)*)$")?;

    let mut graph = Graph::new();
    let mut trains: Vec<Train> = Vec::new();
    let mut train_names: HashMap<String, usize> = HashMap::new();

    for (i, line) in input.lines().enumerate() {
        let lineno = i + 1;
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let rejected = |e: ReplayError| ParseError::Rejected(lineno, e);

        if let Some(groups) = node_re.captures(line) {
            let coordinates = Coordinates::new(number(lineno, &groups["x"])?, number(lineno, &groups["y"])?);
            graph.add_node(&groups["name"], coordinates).map_err(rejected)?;
            continue;
        }
        if let Some(groups) = edge_re.captures(line) {
            let length = number(lineno, &groups["len"])?;
            for n in &[&groups["a"], &groups["b"]] {
                known(lineno, "node", n, graph.node(n))?;
            }
            graph.add_edge(&groups["name"], &groups["a"], &groups["b"], length).map_err(rejected)?;
            continue;
        }
        if let Some(groups) = train_re.captures(line) {
            let name = &groups["name"];
            if train_names.contains_key(name) {
                return Err(rejected(ReplayError::InvalidArgument(format!("train {} is already defined", name))));
            }
            let params = TrainParams {
                length: number(lineno, &groups["len"])?,
                color: groups.name("color").map(|c| c.as_str()).unwrap_or(DEFAULT_COLOR).to_string(),
            };
            train_names.insert(name.to_string(), trains.len());
            trains.push(Train::new(name, params).map_err(rejected)?);
            continue;
        }
        if let Some(groups) = event_re.captures(line) {
            let time = seconds_to_millis(number(lineno, &groups["time"])?);
            let train = *known(lineno, "train", &groups["train"], train_names.get(&groups["train"]))?;
            let timeline = trains[train].timeline_mut();
            let edge = |name: &str| known(lineno, "edge", name, graph.edge(name));
            let args: Vec<&str> = groups["args"].split_whitespace().collect();

            let result = match (&groups["action"], args.as_slice()) {
                ("init", [e]) => timeline.init(time, edge(*e)?),
                ("init", [e, "towards", n]) => {
                    let exit = known(lineno, "node", n, graph.node(n))?;
                    timeline.init_towards(time, edge(*e)?, exit)
                }
                ("speed", [d, v]) => timeline.speed(time, number(lineno, d)?, number(lineno, v)?),
                ("move", [d]) => timeline.move_by(time, number(lineno, d)?),
                ("reach", [e, d]) => timeline.reach(time, edge(*e)?, number(lineno, d)?),
                ("leave", [e, d]) => timeline.leave(time, edge(*e)?, number(lineno, d)?),
                ("terminate", [d]) => timeline.terminate(time, number(lineno, d)?),
                _ => return Err(ParseError::Unrecognized(lineno, line.to_string())),
            };
            result.map_err(rejected)?;
            continue;
        }
        return Err(ParseError::Unrecognized(lineno, line.to_string()));
    }

    Ok(Scenario { graph, trains })
}
