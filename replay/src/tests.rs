use crate::*;
use crate::input::scenario::ParseError;
use crate::output::trace::{sample, SampleConfig};

//  n1 --e1(40)-- n2 --e2(10)-- n3 --e3(50)-- n4
const JOURNEY: &str = "
    node n1 0 0
    node n2 40 0
    node n3 50 0
    node n4 100 0
    edge e1 n1 n2 40
    edge e2 n2 n3 10
    edge e3 n3 n4 50

    train t1 length=20
    0 t1 init e1
    2 t1 speed 20 10
    3 t1 reach e2 5
    4 t1 reach e3 5
    5 t1 leave e1 10
    6 t1 leave e2 12
    8 t1 speed 20 0
    9 t1 terminate 0
";

#[test]
fn test_journey() {
    let scenario = get_scenario_string(JOURNEY).unwrap();
    let train = scenario.train("t1").unwrap();
    assert!(train.timeline().events().iter().all(|e| e.warnings.is_empty()));
    assert_eq!(train.timeline().last().total_distance(), 72.0);

    let rows = sample(train, &SampleConfig { step: 100, ..Default::default() }).unwrap();
    assert_eq!(rows.len(), 91);
    let mut distance = 0.0;
    for row in &rows {
        let p = row.position().unwrap();
        assert_abs_diff_eq!(p.span(), 20.0, epsilon = 1e-6);
        assert!(row.total_distance() >= distance);
        distance = row.total_distance();
        assert_eq!(row.is_terminated(), row.time() == 9_000);
    }
}

#[test]
fn test_journey_front_edges() {
    use maplit::*;
    let scenario = get_scenario_string(JOURNEY).unwrap();
    let train = scenario.train("t1").unwrap();

    let fronts = hashmap!{ 1_000 => "e1", 3_500 => "e2", 4_500 => "e3", 7_000 => "e3" };
    for (&time, &edge) in &fronts {
        let state = train.get_state(time).unwrap();
        assert_eq!(state.position().unwrap().front_edge().name, edge, "at {}", time);
    }

    let state = train.get_state(4_500).unwrap();
    assert_abs_diff_eq!(state.speed(), 10.0, epsilon = 1e-9);
    let points = state.position().unwrap().positions(&graph::IdentityAdapter);
    let expected = [(55.0, 0.0), (50.0, 0.0), (40.0, 0.0), (35.0, 0.0)];
    assert_eq!(points.len(), expected.len());
    for (p, &(x, y)) in points.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(p.x, x, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, y, epsilon = 1e-9);
    }
}

#[test]
fn test_hinted_queries_follow_the_journey() {
    let scenario = get_scenario_string(JOURNEY).unwrap();
    let train = scenario.train("t1").unwrap();
    let mut previous = train.get_state(0).unwrap();
    for time in (0..10_000).step_by(37).chain((0..10_000).rev().step_by(53)) {
        let state = train.get_state_from(time, &previous).unwrap();
        assert_eq!(state, train.get_state(time).unwrap());
        previous = state;
    }
}

#[test]
fn test_event_ordering_from_log() {
    let scenario = get_scenario_string("
        node a 0 0
        node b 50 0
        edge e a b 50
        train t length=10
        0     t init e
        0.010 t speed 10 20
        0.005 t speed 10 10
    ").unwrap();
    let events = scenario.train("t").unwrap().timeline().events();
    assert!(events[1].warnings.is_empty());
    assert_eq!(events[1].time, 10);
    assert_eq!(events[2].time, 10);
    assert_eq!(events[2].requested_time, 5);
    assert!(!events[2].warnings.is_empty());
}

#[test]
fn test_speed_from_log() {
    let scenario = get_scenario_string("
        node a 0 0
        node b 50 0
        edge e a b 50
        train t length=10
        0  t init e
        20 t speed 5 0
    ").unwrap();
    let state = scenario.train("t").unwrap().get_state(12_000).unwrap();
    assert_abs_diff_eq!(state.speed(), 0.25, epsilon = 0.01);
}

#[test]
fn test_parse_errors_are_reported() {
    let err = get_scenario_string("node a 0 0\nnode a 1 1").unwrap_err();
    match err.downcast_ref::<ParseError>() {
        Some(&ParseError::Rejected(2, ReplayError::InvalidArgument(_))) => {},
        e => panic!("unexpected {:?}", e),
    }
    assert!(format!("{}", err).starts_with("line 2:"));
}

#[test]
fn test_huge_log_times() {
    let scenario = get_scenario_string("
        node a 0 0
        node b 50 0
        edge e a b 50
        train t length=10
        -1               t init e
        9300000000000000 t move 1
    ").unwrap();
    let train = scenario.train("t").unwrap();
    assert_eq!(train.timeline().last().time(), Time::max_value());
    let state = train.get_state(0).unwrap();
    assert!(state.is_initialized());
    assert!(state.total_distance() < 1e-9);
    assert_eq!(train.get_state(Time::max_value()).unwrap().total_distance(), 1.0);
}
