//! Lift control-mode arbitration driven through the scheduler.

use robocmd::error::SafetyTrip;
use robocmd::subsystem::{ControlMode, LiftManualControl, MoveLift};
use robocmd::{CommandId, ResourceId, Scheduler};

use crate::mock_hw::{MockLift, TestRobot};

struct Rig {
    scheduler: Scheduler<TestRobot>,
    robot: TestRobot,
    lift: ResourceId,
    manual: CommandId,
}

impl Rig {
    fn new(hw: MockLift) -> Self {
        let mut scheduler = Scheduler::new();
        let lift = scheduler.register_resource("lift").unwrap();
        let manual = scheduler.add(LiftManualControl::new(lift, 0.1, |r: &TestRobot| {
            r.operator_axis
        }));
        scheduler.set_default_command(lift, manual).unwrap();
        Self {
            scheduler,
            robot: TestRobot::new(lift, hw),
            lift,
            manual,
        }
    }

    fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.robot.advance();
            self.scheduler.tick(&mut self.robot);
        }
    }
}

#[test]
fn set_target_clamps_into_soft_limits() {
    let mut rig = Rig::new(MockLift::at(10.0));
    rig.robot.lift.set_target(150.0);
    assert_eq!(rig.robot.lift.target(), 120.0);
    assert_eq!(rig.robot.lift.mode(), ControlMode::Automatic);

    rig.robot.lift.set_target(-5.0);
    assert_eq!(rig.robot.lift.target(), 0.0);
}

#[test]
fn manual_drive_into_soft_max_is_cut_off() {
    let mut rig = Rig::new(MockLift::at(119.0));
    rig.robot.operator_axis = 1.0;
    // Tick 1 starts the default, tick 2 executes it.
    rig.run(2);

    assert_eq!(rig.robot.lift.mode(), ControlMode::Manual);
    assert_eq!(rig.robot.lift.last_output(), 0.0);
    assert_eq!(rig.robot.lift.interlock_trip(), Some(SafetyTrip::UpperSoftLimit));

    // Driving away from the limit is allowed.
    rig.robot.operator_axis = -0.5;
    rig.run(1);
    assert_eq!(rig.robot.lift.last_output(), -0.5);
}

#[test]
fn axis_inside_deadband_leaves_automatic_mode() {
    let mut rig = Rig::new(MockLift::at(30.0));
    rig.robot.lift.set_target(30.0);
    rig.robot.operator_axis = 0.05;
    rig.run(5);
    assert_eq!(rig.robot.lift.mode(), ControlMode::Automatic);
    assert_eq!(rig.robot.lift.target(), 30.0);
}

#[test]
fn releasing_manual_holds_current_position() {
    let mut rig = Rig::new(MockLift::moving(50.0, 20.0));
    rig.robot.operator_axis = 0.5;
    rig.run(11);
    assert_eq!(rig.robot.lift.mode(), ControlMode::Manual);
    assert!(rig.robot.lift.hardware().position > 50.0);

    rig.robot.operator_axis = 0.0;
    rig.run(1);
    assert_eq!(rig.robot.lift.mode(), ControlMode::Automatic);
    let held = rig.robot.lift.target();
    assert!(held > 50.0);

    rig.run(50);
    assert_eq!(rig.robot.lift.target(), held);
    assert!((rig.robot.lift.hardware().position - held).abs() < 1.0);
}

#[test]
fn move_lift_interrupts_default_and_default_resumes() {
    let mut rig = Rig::new(MockLift::moving(0.0, 30.0));
    rig.run(1);
    assert_eq!(rig.scheduler.requiring(rig.lift), Some(rig.manual));

    let preset = rig.scheduler.add(MoveLift::new(rig.lift, 60.0, false));
    rig.scheduler.schedule(preset).unwrap();
    rig.run(1);
    assert_eq!(rig.scheduler.requiring(rig.lift), Some(preset));

    let mut ticks = 0;
    while rig.scheduler.is_scheduled(preset) && ticks < 500 {
        rig.run(1);
        ticks += 1;
    }
    assert!(!rig.scheduler.is_scheduled(preset), "lift never reached target");
    assert!((rig.robot.lift.hardware().position - 60.0).abs() <= 1.0);

    // The default restarts once the resource is idle.
    assert_eq!(rig.scheduler.requiring(rig.lift), Some(rig.manual));
    // With the axis released it does not disturb the preset target.
    rig.run(5);
    assert_eq!(rig.robot.lift.target(), 60.0);
    assert_eq!(rig.robot.lift.mode(), ControlMode::Automatic);
}

#[test]
fn instant_move_only_sets_target() {
    let mut rig = Rig::new(MockLift::at(0.0));
    let preset = rig.scheduler.add(MoveLift::new(rig.lift, 45.0, true));
    rig.scheduler.schedule(preset).unwrap();
    rig.run(1);
    assert!(!rig.scheduler.is_scheduled(preset));
    assert_eq!(rig.robot.lift.target(), 45.0);
    assert!(rig.robot.lift.hardware().outputs.last().is_some_and(|o| *o > 0.0));
}

#[test]
fn disabling_while_driving_manually_stops_open_loop_output() {
    let mut rig = Rig::new(MockLift::moving(50.0, 20.0));
    rig.robot.operator_axis = 0.5;
    rig.run(6);
    assert_eq!(rig.robot.lift.mode(), ControlMode::Manual);
    assert_eq!(rig.robot.lift.last_output(), 0.5);

    rig.scheduler.set_enabled(false);
    rig.run(1);
    assert_eq!(rig.scheduler.requiring(rig.lift), None);
    assert_eq!(rig.robot.lift.mode(), ControlMode::Automatic);
    let held = rig.robot.lift.target();

    rig.run(50);
    assert_eq!(rig.robot.lift.target(), held);
    let recent = &rig.robot.lift.hardware().outputs;
    assert!(recent[recent.len() - 5..].iter().all(|o| o.abs() < 0.5));
    assert!((rig.robot.lift.hardware().position - held).abs() < 1.0);
}

#[test]
fn cancelling_manual_control_holds_position() {
    let mut rig = Rig::new(MockLift::moving(30.0, 20.0));
    rig.robot.operator_axis = -0.4;
    rig.run(4);
    assert_eq!(rig.robot.lift.mode(), ControlMode::Manual);

    // Axis still deflected: the release comes from the command ending.
    rig.scheduler.cancel(rig.manual).unwrap();
    rig.robot.advance();
    rig.scheduler.tick(&mut rig.robot);
    assert_eq!(rig.robot.lift.mode(), ControlMode::Automatic);
}
