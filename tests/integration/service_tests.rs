//! Match flow through the robot service: Disabled → Autonomous → Teleop.

use robocmd::app::commands::ServiceCommand;
use robocmd::app::events::SchedulerEvent;
use robocmd::app::service::{RobotMode, RobotService};
use robocmd::command::{CommandExt, CommandState, RunCommand, WaitCommand};
use robocmd::config::RobotConfig;
use robocmd::subsystem::{LiftManualControl, MoveLift};
use robocmd::{CommandId, ConfigError, ResourceId};

use crate::mock_hw::{MockLift, RecordingSink, TestRobot};

struct Match {
    service: RobotService<TestRobot>,
    robot: TestRobot,
    lift: ResourceId,
    manual: CommandId,
    routine: CommandId,
    sink: RecordingSink,
}

impl Match {
    fn new(config: RobotConfig) -> Self {
        let mut service = RobotService::new(config);
        let sink = RecordingSink::default();
        let scheduler = service.scheduler_mut();
        scheduler.set_event_sink(sink.clone());
        let lift = scheduler.register_resource("lift").unwrap();

        let manual = scheduler.add(LiftManualControl::new(lift, 0.1, |r: &TestRobot| {
            r.operator_axis
        }));
        scheduler.set_default_command(lift, manual).unwrap();

        let endgame = scheduler.add_condition(|r: &TestRobot| r.now >= 2.0);
        let alert = service.config().alerts[0].signal();
        service
            .scheduler_mut()
            .bind_pulse(endgame, alert, |r: &mut TestRobot, on| r.rumble.push(on));

        let routine = service.add_routine(
            "LeftConeGrabCube",
            MoveLift::new(lift, 100.0, true)
                .and_then(WaitCommand::new(0.2))
                .and_then(MoveLift::new(lift, 20.0, false))
                .with_name("LeftConeGrabCube"),
        );

        Self {
            service,
            robot: TestRobot::new(lift, MockLift::moving(0.0, 40.0)),
            lift,
            manual,
            routine,
            sink,
        }
    }

    fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.robot.advance();
            self.service.tick(&mut self.robot);
        }
    }

    fn owner(&self) -> Option<CommandId> {
        self.service.scheduler().requiring(self.lift)
    }
}

#[test]
fn nothing_runs_while_disabled() {
    let mut m = Match::new(RobotConfig::default());
    m.run(10);
    assert_eq!(m.owner(), None);
    assert!(m.robot.lift.hardware().outputs.iter().all(|o| *o == 0.0));
}

#[test]
fn autonomous_routine_then_teleop_default() {
    let mut m = Match::new(RobotConfig::default());
    m.service
        .handle_command(ServiceCommand::SelectAutonomous("LeftConeGrabCube".into()))
        .unwrap();
    m.service
        .handle_command(ServiceCommand::SetMode(RobotMode::Autonomous))
        .unwrap();
    m.run(1);
    assert_eq!(m.owner(), Some(m.routine));
    assert_eq!(m.robot.lift.target(), 100.0);

    // The wait keeps the first preset alive for a few ticks, then the
    // second preset drives down to 20.
    m.run(20);
    assert_eq!(m.robot.lift.target(), 20.0);

    m.service.set_mode(RobotMode::Teleop);
    m.run(1);
    assert_eq!(
        m.service.scheduler().state(m.routine),
        Some(CommandState::Ended)
    );
    assert_eq!(m.owner(), Some(m.manual));

    m.robot.operator_axis = 0.5;
    m.run(2);
    assert!(m.robot.lift.last_output() > 0.0);

    let events = m.sink.events.borrow();
    assert!(events.contains(&SchedulerEvent::EnabledChanged(true)));
    assert!(events.contains(&SchedulerEvent::Interrupted {
        id: m.routine,
        name: "LeftConeGrabCube",
    }));
}

#[test]
fn unselected_autonomous_does_nothing() {
    let mut m = Match::new(RobotConfig::default());
    assert_eq!(
        m.service.select_autonomous("RightConeGrabCube"),
        Err(ConfigError::UnknownRoutine)
    );
    m.service.set_mode(RobotMode::Autonomous);
    m.run(5);
    assert_eq!(
        m.service.scheduler().state(m.routine),
        Some(CommandState::Idle)
    );
    // Only the lift default is holding the mechanism.
    assert_eq!(m.owner(), Some(m.manual));
}

#[test]
fn disabling_keeps_disabled_safe_commands() {
    let mut m = Match::new(RobotConfig::default());
    let heartbeat = m.service.scheduler_mut().add(
        RunCommand::new(|r: &mut TestRobot| {
            r.trace.push(String::from("beat"));
            Ok(())
        })
        .ignoring_disable(true)
        .named("Heartbeat"),
    );
    m.service.set_mode(RobotMode::Teleop);
    m.service.scheduler_mut().schedule(heartbeat).unwrap();
    m.run(3);
    assert_eq!(m.owner(), Some(m.manual));

    m.service.set_mode(RobotMode::Disabled);
    m.run(3);
    assert_eq!(m.owner(), None);
    assert_eq!(m.robot.trace.len(), 6);
    assert!(m.service.scheduler().is_scheduled(heartbeat));
}

#[test]
fn endgame_alert_from_json_config() {
    let json = r#"{
        "alerts": [
            { "name": "endgame", "mode": { "bounded": { "count": 2, "pulse_secs": 0.1, "gap_secs": 0.1 } } }
        ]
    }"#;
    let config = RobotConfig::from_json(json).unwrap();
    let mut m = Match::new(config);
    m.run(150);

    // Armed at tick 100 (t = 2.0): two pulses of five ticks each.
    let on = m.robot.rumble.iter().filter(|on| **on).count();
    assert_eq!(on, 10);
    assert!(m.robot.rumble[99..104].iter().all(|on| *on));
    assert!(m.robot.rumble[104..109].iter().all(|on| !on));
}

#[test]
fn cancel_all_clears_everything() {
    let mut m = Match::new(RobotConfig::default());
    m.service.select_autonomous("LeftConeGrabCube").unwrap();
    m.service.set_mode(RobotMode::Autonomous);
    m.run(2);
    m.service.handle_command(ServiceCommand::CancelAll).unwrap();
    m.run(1);
    assert_eq!(
        m.service.scheduler().state(m.routine),
        Some(CommandState::Ended)
    );
    // The default comes straight back for the idle lift.
    assert_eq!(m.owner(), Some(m.manual));
}
