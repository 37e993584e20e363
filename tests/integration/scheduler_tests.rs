//! End-to-end scheduler behaviour: conflicts, groups, decorators,
//! triggers, pulses and fault isolation with the mock robot.

use robocmd::app::events::SchedulerEvent;
use robocmd::command::{CommandExt, CommandState, ParallelGroup, SequentialGroup};
use robocmd::pulse::PulseSignal;
use robocmd::{CommandFault, ResourceId, Scheduler};

use crate::mock_hw::{MockLift, RecordingSink, TestRobot, traced};

fn setup() -> (Scheduler<TestRobot>, TestRobot, ResourceId, ResourceId) {
    let mut scheduler = Scheduler::new();
    let lift = scheduler.register_resource("lift").unwrap();
    let claw = scheduler.register_resource("claw").unwrap();
    let robot = TestRobot::new(lift, MockLift::at(0.0));
    (scheduler, robot, lift, claw)
}

fn run(scheduler: &mut Scheduler<TestRobot>, robot: &mut TestRobot, ticks: u32) {
    for _ in 0..ticks {
        robot.advance();
        scheduler.tick(robot);
    }
}

#[test]
fn overlapping_claim_interrupts_holder_before_initialize() {
    let (mut s, mut robot, lift, claw) = setup();
    let c1 = s.add(traced("c1", None).requiring(lift).requiring(claw));
    let c2 = s.add(traced("c2", None).requiring(claw));
    s.schedule(c1).unwrap();
    run(&mut s, &mut robot, 2);

    robot.trace.clear();
    s.schedule(c2).unwrap();
    run(&mut s, &mut robot, 1);

    assert_eq!(robot.trace, ["c1:end(true)", "c2:init", "c2:exec@3"]);
    // Every claim of the evicted command is released, not only the contested one.
    assert_eq!(s.requiring(lift), None);
    assert_eq!(s.requiring(claw), Some(c2));
}

#[test]
fn sequential_children_never_overlap() {
    let (mut s, mut robot, _, _) = setup();
    let group = SequentialGroup::new(vec![
        traced("A", Some(2)).boxed(),
        traced("B", Some(2)).boxed(),
        traced("C", Some(2)).boxed(),
    ]);
    let id = s.add(group);
    s.schedule(id).unwrap();
    run(&mut s, &mut robot, 10);

    let execs: Vec<_> = robot
        .trace
        .iter()
        .filter_map(|l| l.split_once(":exec@"))
        .collect();
    assert_eq!(
        execs,
        [("A", "1"), ("A", "2"), ("B", "3"), ("B", "4"), ("C", "5"), ("C", "6")]
    );

    let a_end = robot.trace.iter().position(|l| l == "A:end(false)").unwrap();
    let b_first = robot.trace.iter().position(|l| l == "B:exec@3").unwrap();
    assert!(a_end < b_first);
    assert_eq!(s.state(id), Some(CommandState::Ended));
}

#[test]
fn sequential_cancel_interrupts_only_active_child() {
    let (mut s, mut robot, _, _) = setup();
    let id = s.add(traced("A", Some(1)).and_then(traced("B", None)).and_then(traced("C", None)));
    s.schedule(id).unwrap();
    run(&mut s, &mut robot, 3);
    s.cancel(id).unwrap();
    run(&mut s, &mut robot, 1);

    assert_eq!(robot.trace_of("B").last(), Some(&"B:end(true)"));
    assert!(robot.trace_of("C").is_empty());
}

#[test]
fn parallel_all_latches_finished_children() {
    let (mut s, mut robot, _, _) = setup();
    let id = s.add(traced("A", Some(3)).along_with(traced("B", Some(5))));
    s.schedule(id).unwrap();

    for tick in 1..=5 {
        run(&mut s, &mut robot, 1);
        let running = s.state(id) == Some(CommandState::Running);
        assert_eq!(running, tick < 5, "tick {tick}");
    }

    assert_eq!(robot.trace_of("A:exec").last(), Some(&"A:exec@3"));
    assert_eq!(robot.trace_of("A:end"), ["A:end(false)"]);
    assert_eq!(robot.trace_of("B:end"), ["B:end(false)"]);
}

#[test]
fn race_interrupts_the_loser() {
    let (mut s, mut robot, _, _) = setup();
    let id = s.add(ParallelGroup::race(vec![
        traced("fast", Some(2)).boxed(),
        traced("slow", None).boxed(),
    ]));
    s.schedule(id).unwrap();
    run(&mut s, &mut robot, 3);

    assert_eq!(robot.trace_of("fast:end"), ["fast:end(false)"]);
    assert_eq!(robot.trace_of("slow:end"), ["slow:end(true)"]);
    assert_eq!(s.state(id), Some(CommandState::Ended));
}

#[test]
fn deadline_ends_with_its_distinguished_child() {
    let (mut s, mut robot, _, _) = setup();
    let id = s.add(traced("drive", Some(4)).deadline_with(traced("intake", None)));
    s.schedule(id).unwrap();
    run(&mut s, &mut robot, 6);

    assert_eq!(robot.trace_of("intake:exec").len(), 4);
    assert_eq!(robot.trace_of("intake:end"), ["intake:end(true)"]);
}

#[test]
fn timeout_interrupts_after_one_second() {
    let (mut s, mut robot, _, _) = setup();
    let id = s.add(traced("spin", None).with_timeout(1.0));
    s.schedule(id).unwrap();

    // Initialized at t = 0.02, so the ceiling lands around t = 1.02 (tick 51).
    run(&mut s, &mut robot, 49);
    assert!(s.is_scheduled(id));
    run(&mut s, &mut robot, 3);
    assert!(!s.is_scheduled(id));
    run(&mut s, &mut robot, 10);

    assert_eq!(robot.trace_of("spin:end"), ["spin:end(true)"]);
}

#[test]
fn until_stops_on_predicate() {
    let (mut s, mut robot, _, _) = setup();
    let id = s.add(traced("creep", None).until(|r: &TestRobot| r.button_b));
    s.schedule(id).unwrap();
    run(&mut s, &mut robot, 3);
    robot.button_b = true;
    run(&mut s, &mut robot, 1);
    assert_eq!(robot.trace_of("creep:end"), ["creep:end(true)"]);
}

#[test]
fn and_trigger_fires_once_when_both_first_true() {
    let (mut s, mut robot, _, _) = setup();
    let id = s.add(traced("score", Some(1)));
    let a = s.add_condition(|r: &TestRobot| r.button_a);
    let b = s.add_condition(|r: &TestRobot| r.button_b);
    s.on_true(a.and(b), id).unwrap();

    let script = [
        (false, false),
        (true, false),
        (false, true),
        (true, true),
        (true, true),
        (true, false),
    ];
    for (a, b) in script {
        robot.button_a = a;
        robot.button_b = b;
        run(&mut s, &mut robot, 1);
    }
    assert_eq!(robot.trace_of("score:init"), ["score:init"]);
    assert_eq!(robot.trace_of("score:exec"), ["score:exec@4"]);
}

#[test]
fn bindings_fire_in_registration_order() {
    let (mut s, mut robot, lift, _) = setup();
    let first = s.add(traced("first", None).requiring(lift));
    let second = s.add(traced("second", None).requiring(lift));
    let button = s.add_condition(|r: &TestRobot| r.button_a);
    s.on_true(button.clone(), first).unwrap();
    s.on_true(button, second).unwrap();

    run(&mut s, &mut robot, 1);
    robot.button_a = true;
    run(&mut s, &mut robot, 1);

    // Same-tick claims resolve as "last claim wins".
    assert_eq!(s.requiring(lift), Some(second));
    assert_eq!(robot.trace_of("first"), ["first:init", "first:end(true)"]);
}

#[test]
fn countdown_rumble_pulses_three_times() {
    let (mut s, mut robot, _, _) = setup();
    let endgame = s.add_condition(|r: &TestRobot| r.now >= 1.0);
    s.bind_pulse(endgame, PulseSignal::bounded(3, 0.2, 0.2), |r: &mut TestRobot, on| {
        r.rumble.push(on);
    });

    run(&mut s, &mut robot, 150);

    // Ticks 1..=49 are before the edge; tick 50 (t = 1.0) arms the signal.
    let after_edge = &robot.rumble[49..];
    let on_ticks: Vec<usize> = after_edge
        .iter()
        .enumerate()
        .filter_map(|(i, on)| on.then_some(i))
        .collect();
    let expected: Vec<usize> = (0..10).chain(20..30).chain(40..50).collect();
    assert_eq!(on_ticks, expected);
    assert!(robot.rumble[..49].iter().all(|on| !on));
}

#[test]
fn faulting_command_does_not_stop_the_tick() {
    let (mut s, mut robot, lift, _) = setup();
    let sink = RecordingSink::default();
    s.set_event_sink(sink.clone());

    let bad = s.add(
        robocmd::command::RunCommand::new(|_: &mut TestRobot| {
            Err(CommandFault::Failed("encoder unplugged"))
        })
        .requiring(lift)
        .named("Bad"),
    );
    let good = s.add(traced("good", None));
    s.schedule(bad).unwrap();
    s.schedule(good).unwrap();
    run(&mut s, &mut robot, 3);

    assert_eq!(robot.trace_of("good:exec").len(), 3);
    assert_eq!(s.state(bad), Some(CommandState::Ended));
    assert_eq!(s.requiring(lift), None);
    assert_eq!(s.metrics().fault_count, 1);

    let events = sink.events.borrow();
    assert!(events.iter().any(|e| matches!(
        e,
        SchedulerEvent::Fault { name: "Bad", fault: CommandFault::Failed("encoder unplugged"), .. }
    )));
    assert!(events.contains(&SchedulerEvent::Interrupted { id: bad, name: "Bad" }));
}

#[test]
fn metrics_track_ticks_and_active_commands() {
    let (mut s, mut robot, _, _) = setup();
    let id = s.add(traced("idle", None));
    s.schedule(id).unwrap();
    run(&mut s, &mut robot, 4);
    let m = s.metrics();
    assert_eq!(m.ticks, 4);
    assert_eq!(m.active_commands, 1);
    assert_eq!(m.fault_count, 0);
}

#[test]
fn log_sink_handles_every_event_kind() {
    let (mut s, mut robot, lift, _) = setup();
    s.set_event_sink(robocmd::adapters::LogEventSink::new());
    let a = s.add(traced("a", None).requiring(lift));
    let b = s.add(traced("b", Some(1)).requiring(lift));
    let bad = s.add(
        robocmd::command::InstantCommand::new(|_: &mut TestRobot| Err(CommandFault::Failed("boom")))
            .named("Bad"),
    );
    for id in [a, b, bad] {
        s.schedule(id).unwrap();
    }
    run(&mut s, &mut robot, 2);
    s.set_enabled(false);
    run(&mut s, &mut robot, 1);

    assert_eq!(robot.trace_of("a"), ["a:init", "a:end(true)"]);
    assert_eq!(s.metrics().fault_count, 1);
    assert_eq!(s.metrics().conflict_count, 1);
}
