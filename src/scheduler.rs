//! Cooperative command scheduler.
//!
//! One explicitly constructed instance is owned by the outer control
//! loop, which calls [`Scheduler::tick`] once per fixed control period.
//! Nothing in a tick blocks; multi-tick behaviour is a finish predicate
//! polled every tick.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Scheduler::tick                        │
//! │                                                              │
//! │  1. sample conditions ──▶ poll bindings ──▶ request queue    │
//! │  2. pulse signals     ──▶ sink(robot, on/off)                │
//! │  3. request queue     ──▶ evict conflicting owners           │
//! │                           (end(true)) ──▶ initialize         │
//! │  4. active commands   ──▶ execute ──▶ is_finished            │
//! │                           ──▶ end(false) + release           │
//! │  5. idle resources    ──▶ initialize default commands        │
//! │  6. robot.run_subsystems(dt)                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command callback runs behind `catch_unwind`.  A callback that
//! returns `Err` or panics only takes down its own command, which is
//! ended with `interrupted = true`; the rest of the tick proceeds.

use std::panic::{self, AssertUnwindSafe};

use log::{debug, error, info, warn};

use crate::app::events::SchedulerEvent;
use crate::app::ports::{ConditionSource, EventSink, RobotContext};
use crate::command::{Command, CommandId, CommandState, ResourceId, ResourceSet};
use crate::diagnostics::{FaultLog, FaultRecord, SchedulerMetrics};
use crate::error::{CommandFault, ConfigError};
use crate::pulse::PulseSignal;
use crate::trigger::{Binding, BindingAction, BindingKind, ConditionId, Trigger};

const MAX_RESOURCES: usize = ResourceId::MAX;

/// Raw condition sampled once per tick.
pub type ConditionFn<R> = Box<dyn FnMut(&R) -> bool>;

/// Receives a pulse signal's output each tick.
pub type PulseSink<R> = Box<dyn FnMut(&mut R, bool)>;

// ═══════════════════════════════════════════════════════════════
//  Internal bookkeeping
// ═══════════════════════════════════════════════════════════════

struct Slot<R> {
    command: Box<dyn Command<R>>,
    state: CommandState,
    /// Snapshotted at registration.
    requirements: ResourceSet,
    name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Schedule(CommandId),
    Cancel(CommandId),
}

struct PulseBinding<R> {
    trigger: Trigger,
    signal: PulseSignal,
    sink: PulseSink<R>,
}

/// Run a command callback, turning a panic into a [`CommandFault`].
fn guarded<T>(f: impl FnOnce() -> Result<T, CommandFault>) -> Result<T, CommandFault> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("unknown panic");
            Err(CommandFault::panicked(message))
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// Owns every registered command, the resource table, triggers and
/// default commands.
pub struct Scheduler<R> {
    slots: Vec<Slot<R>>,
    /// Running command holding each resource.
    owners: [Option<CommandId>; MAX_RESOURCES],
    defaults: [Option<CommandId>; MAX_RESOURCES],
    resource_names: heapless::Vec<&'static str, MAX_RESOURCES>,
    /// Running commands in scheduling order.
    active: Vec<CommandId>,
    /// Submissions and cancellations awaiting the next tick.
    requests: Vec<Request>,
    conditions: Vec<ConditionFn<R>>,
    samples: Vec<bool>,
    bindings: Vec<Binding>,
    pulses: Vec<PulseBinding<R>>,
    enabled: bool,
    faults: FaultLog,
    metrics: SchedulerMetrics,
    sink: Option<Box<dyn EventSink>>,
    last_tick_at: Option<f64>,
}

impl<R> Default for Scheduler<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Scheduler<R> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            owners: [None; MAX_RESOURCES],
            defaults: [None; MAX_RESOURCES],
            resource_names: heapless::Vec::new(),
            active: Vec::new(),
            requests: Vec::new(),
            conditions: Vec::new(),
            samples: Vec::new(),
            bindings: Vec::new(),
            pulses: Vec::new(),
            enabled: true,
            faults: FaultLog::new(),
            metrics: SchedulerMetrics::default(),
            sink: None,
            last_tick_at: None,
        }
    }

    /// Route structured events to `sink` in addition to the log.
    pub fn set_event_sink(&mut self, sink: impl EventSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    // ── Resources ─────────────────────────────────────────────────

    /// Register an exclusive-access mechanism.
    pub fn register_resource(&mut self, name: &'static str) -> Result<ResourceId, ConfigError> {
        if self.resource_names.is_full() {
            warn!("Scheduler: cannot register '{}', resource table full", name);
            return Err(ConfigError::TooManyResources);
        }
        let id = ResourceId::new(self.resource_names.len());
        self.resource_names
            .push(name)
            .map_err(|_| ConfigError::TooManyResources)?;
        info!("Scheduler: registered '{}' as {}", name, id);
        Ok(id)
    }

    pub fn resource_name(&self, resource: ResourceId) -> Option<&'static str> {
        self.resource_names.get(resource.index()).copied()
    }

    /// Running command that currently owns `resource`.
    pub fn requiring(&self, resource: ResourceId) -> Option<CommandId> {
        self.owners.get(resource.index()).copied().flatten()
    }

    // ── Command registry ──────────────────────────────────────────

    /// Hand a command to the scheduler.  It stays Idle until scheduled.
    pub fn add(&mut self, command: impl Command<R> + 'static) -> CommandId {
        let id = CommandId(self.slots.len());
        let requirements = command.requirements();
        let name = command.name();
        if requirements
            .iter()
            .any(|r| r.index() >= self.resource_names.len())
        {
            warn!("Scheduler: '{}' requires an unregistered resource", name);
        }
        self.slots.push(Slot {
            command: Box::new(command),
            state: CommandState::Idle,
            requirements,
            name,
        });
        id
    }

    pub fn state(&self, id: CommandId) -> Option<CommandState> {
        self.slots.get(id.0).map(|s| s.state)
    }

    pub fn name(&self, id: CommandId) -> Option<&'static str> {
        self.slots.get(id.0).map(|s| s.name)
    }

    pub fn is_scheduled(&self, id: CommandId) -> bool {
        self.state(id).is_some_and(CommandState::is_active)
    }

    /// Running commands in scheduling order.
    pub fn active(&self) -> &[CommandId] {
        &self.active
    }

    /// Submit a command.  It is initialized during the next tick,
    /// evicting whatever holds its resources.  Scheduling a command that
    /// is already scheduled or running does nothing.
    pub fn schedule(&mut self, id: CommandId) -> Result<(), ConfigError> {
        let slot = self.slots.get_mut(id.0).ok_or(ConfigError::UnknownCommand)?;
        if !slot.state.is_active() {
            slot.state = CommandState::Scheduled;
            self.requests.push(Request::Schedule(id));
        }
        Ok(())
    }

    /// Cancel a command.  A running command receives `end(true)` at the
    /// next tick; a scheduled one is withdrawn without ever starting.
    pub fn cancel(&mut self, id: CommandId) -> Result<(), ConfigError> {
        let slot = self.slots.get_mut(id.0).ok_or(ConfigError::UnknownCommand)?;
        match slot.state {
            CommandState::Scheduled => {
                slot.state = CommandState::Idle;
                self.requests.retain(|r| *r != Request::Schedule(id));
            }
            CommandState::Running => {
                let request = Request::Cancel(id);
                if !self.requests.contains(&request) {
                    self.requests.push(request);
                }
            }
            CommandState::Idle | CommandState::Ended => {}
        }
        Ok(())
    }

    /// Cancel every scheduled and running command.
    pub fn cancel_all(&mut self) {
        for index in 0..self.slots.len() {
            let _ = self.cancel(CommandId(index));
        }
    }

    // ── Default commands ──────────────────────────────────────────

    /// Register the command that runs whenever `resource` is idle.
    ///
    /// The default must itself require `resource`; otherwise the
    /// resource is left without a default.
    pub fn set_default_command(
        &mut self,
        resource: ResourceId,
        id: CommandId,
    ) -> Result<(), ConfigError> {
        if resource.index() >= self.resource_names.len() {
            warn!("Scheduler: default for unknown {}", resource);
            return Err(ConfigError::UnknownResource);
        }
        let Some(slot) = self.slots.get(id.0) else {
            warn!("Scheduler: default {} is not registered", id);
            return Err(ConfigError::UnknownCommand);
        };
        if !slot.requirements.contains(resource) {
            warn!(
                "Scheduler: default '{}' does not require '{}', no default kept",
                slot.name, self.resource_names[resource.index()]
            );
            self.defaults[resource.index()] = None;
            return Err(ConfigError::DefaultMissingRequirement);
        }
        debug!(
            "Scheduler: '{}' is the default for '{}'",
            slot.name, self.resource_names[resource.index()]
        );
        self.defaults[resource.index()] = Some(id);
        Ok(())
    }

    pub fn default_command(&self, resource: ResourceId) -> Option<CommandId> {
        self.defaults.get(resource.index()).copied().flatten()
    }

    // ── Enable / disable ──────────────────────────────────────────

    /// While disabled, commands that do not run when disabled are
    /// interrupted at the next tick and are never started.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            info!("Scheduler: {}", if enabled { "enabled" } else { "disabled" });
            self.emit(&SchedulerEvent::EnabledChanged(enabled));
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    // ── Triggers ──────────────────────────────────────────────────

    /// Register a raw condition.  It is sampled once per tick.
    pub fn add_condition(&mut self, condition: impl FnMut(&R) -> bool + 'static) -> Trigger {
        let id = ConditionId(self.conditions.len());
        self.conditions.push(Box::new(condition));
        self.samples.push(false);
        Trigger::source(id)
    }

    /// Register a hardware boolean input as a condition.
    pub fn add_condition_source(&mut self, mut source: impl ConditionSource + 'static) -> Trigger {
        self.add_condition(move |_| source.read_boolean_condition())
    }

    /// Bind `trigger` to `id` with the given edge policy.  Bindings fire
    /// in registration order.
    pub fn bind(
        &mut self,
        trigger: Trigger,
        kind: BindingKind,
        id: CommandId,
    ) -> Result<(), ConfigError> {
        if id.0 >= self.slots.len() {
            warn!("Scheduler: binding to unregistered {} ignored", id);
            return Err(ConfigError::UnknownCommand);
        }
        self.bindings.push(Binding::new(trigger, kind, id));
        Ok(())
    }

    pub fn on_true(&mut self, trigger: Trigger, id: CommandId) -> Result<(), ConfigError> {
        self.bind(trigger, BindingKind::OnTrue, id)
    }

    pub fn on_false(&mut self, trigger: Trigger, id: CommandId) -> Result<(), ConfigError> {
        self.bind(trigger, BindingKind::OnFalse, id)
    }

    pub fn while_true(&mut self, trigger: Trigger, id: CommandId) -> Result<(), ConfigError> {
        self.bind(trigger, BindingKind::WhileTrue, id)
    }

    pub fn while_false(&mut self, trigger: Trigger, id: CommandId) -> Result<(), ConfigError> {
        self.bind(trigger, BindingKind::WhileFalse, id)
    }

    pub fn toggle_on_true(&mut self, trigger: Trigger, id: CommandId) -> Result<(), ConfigError> {
        self.bind(trigger, BindingKind::ToggleOnTrue, id)
    }

    /// Drive `signal` from `trigger` every tick and write its output
    /// through `sink`.
    pub fn bind_pulse(
        &mut self,
        trigger: Trigger,
        signal: PulseSignal,
        sink: impl FnMut(&mut R, bool) + 'static,
    ) {
        self.pulses.push(PulseBinding {
            trigger,
            signal,
            sink: Box::new(sink),
        });
    }

    // ── Diagnostics ───────────────────────────────────────────────

    pub fn faults(&self) -> &FaultLog {
        &self.faults
    }

    pub fn metrics(&self) -> SchedulerMetrics {
        SchedulerMetrics {
            active_commands: self.active.len(),
            fault_count: self.faults.total(),
            ..self.metrics
        }
    }

    // ── Internal ──────────────────────────────────────────────────

    /// A sink that panics is dropped; events after that go to the log only.
    fn emit(&mut self, event: &SchedulerEvent) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if panic::catch_unwind(AssertUnwindSafe(|| sink.emit(event))).is_err() {
            error!("Scheduler: event sink panicked, detaching it");
            self.sink = None;
        }
    }

    fn record_fault(&mut self, id: CommandId, fault: CommandFault) {
        let name = self.slots[id.0].name;
        error!("Scheduler: '{}' ({}) faulted: {}", name, id, fault);
        self.faults
            .record(FaultRecord::new(self.metrics.ticks, id, name, &fault));
        self.emit(&SchedulerEvent::Fault { id, name, fault });
    }

    fn apply(&mut self, action: BindingAction) {
        let result = match action {
            BindingAction::Schedule(id) => self.schedule(id),
            BindingAction::Cancel(id) => self.cancel(id),
            BindingAction::Toggle(id) if self.is_scheduled(id) => self.cancel(id),
            BindingAction::Toggle(id) => self.schedule(id),
        };
        if let Err(e) = result {
            warn!("Scheduler: binding action failed: {}", e);
        }
    }

    /// End a running command and release its resources.
    fn finish(&mut self, id: CommandId, robot: &mut R, interrupted: bool) {
        let slot = &mut self.slots[id.0];
        let result = guarded(|| slot.command.end(robot, interrupted));
        slot.state = CommandState::Ended;
        let (name, requirements) = (slot.name, slot.requirements);

        for resource in requirements.iter() {
            let owner = &mut self.owners[resource.index()];
            if *owner == Some(id) {
                *owner = None;
            }
        }
        self.active.retain(|a| *a != id);

        if interrupted {
            debug!("Scheduler: '{}' ({}) interrupted", name, id);
            self.emit(&SchedulerEvent::Interrupted { id, name });
        } else {
            debug!("Scheduler: '{}' ({}) finished", name, id);
            self.emit(&SchedulerEvent::Finished { id, name });
        }
        if let Err(fault) = result {
            self.record_fault(id, fault);
        }
    }

    /// Initialize a scheduled command, evicting conflicting owners first.
    fn start(&mut self, id: CommandId, robot: &mut R) {
        let slot = &mut self.slots[id.0];
        if slot.state != CommandState::Scheduled {
            return;
        }
        if !self.enabled && !slot.command.runs_when_disabled() {
            debug!("Scheduler: '{}' not started while disabled", slot.name);
            slot.state = CommandState::Idle;
            return;
        }

        let requirements = slot.requirements;
        for resource in requirements.iter() {
            let Some(holder) = self.owners[resource.index()] else {
                continue;
            };
            debug!(
                "Scheduler: '{}' takes {} from '{}'",
                self.slots[id.0].name, resource, self.slots[holder.0].name
            );
            self.metrics.conflict_count = self.metrics.conflict_count.saturating_add(1);
            self.emit(&SchedulerEvent::ResourceConflict {
                resource,
                evicted: holder,
                by: id,
            });
            self.finish(holder, robot, true);
        }

        let slot = &mut self.slots[id.0];
        let name = slot.name;
        match guarded(|| slot.command.initialize(robot)) {
            Ok(()) => {
                slot.state = CommandState::Running;
                for resource in requirements.iter() {
                    self.owners[resource.index()] = Some(id);
                }
                self.active.push(id);
                debug!("Scheduler: '{}' ({}) initialized", name, id);
                self.emit(&SchedulerEvent::Initialized { id, name });
            }
            Err(fault) => {
                self.record_fault(id, fault);
                let slot = &mut self.slots[id.0];
                let result = guarded(|| slot.command.end(robot, true));
                slot.state = CommandState::Ended;
                self.emit(&SchedulerEvent::Interrupted { id, name });
                if let Err(fault) = result {
                    self.record_fault(id, fault);
                }
            }
        }
    }
}

impl<R: RobotContext> Scheduler<R> {
    /// Run one control period.  Never propagates a command fault.
    pub fn tick(&mut self, robot: &mut R) {
        self.metrics.ticks = self.metrics.ticks.wrapping_add(1);
        let now = match panic::catch_unwind(AssertUnwindSafe(|| robot.now_secs())) {
            Ok(now) => now,
            Err(_) => {
                error!("Scheduler: clock panicked, reusing last tick time");
                self.last_tick_at.unwrap_or(0.0)
            }
        };
        let dt = self.last_tick_at.map_or(0.0, |t| (now - t).max(0.0));
        self.last_tick_at = Some(now);

        self.poll_triggers(robot);
        self.update_pulses(robot, now);
        self.process_requests(robot);
        self.run_active(robot);
        self.start_defaults(robot);

        if panic::catch_unwind(AssertUnwindSafe(|| robot.run_subsystems(dt))).is_err() {
            error!("Scheduler: subsystem periodic panicked");
        }
    }

    fn poll_triggers(&mut self, robot: &R) {
        for (index, condition) in self.conditions.iter_mut().enumerate() {
            self.samples[index] = panic::catch_unwind(AssertUnwindSafe(|| condition(robot)))
                .unwrap_or_else(|_| {
                    error!("Scheduler: condition #{} panicked, reading false", index);
                    false
                });
        }
        for index in 0..self.bindings.len() {
            if let Some(action) = self.bindings[index].poll(&self.samples) {
                self.apply(action);
            }
        }
    }

    fn update_pulses(&mut self, robot: &mut R, now: f64) {
        for pulse in &mut self.pulses {
            let condition = pulse.trigger.evaluate(&self.samples);
            let output = pulse.signal.update(condition, now);
            if panic::catch_unwind(AssertUnwindSafe(|| (pulse.sink)(robot, output))).is_err() {
                error!("Scheduler: pulse sink panicked");
            }
        }
    }

    fn process_requests(&mut self, robot: &mut R) {
        if !self.enabled {
            let mut index = 0;
            while index < self.active.len() {
                let id = self.active[index];
                if self.slots[id.0].command.runs_when_disabled() {
                    index += 1;
                } else {
                    self.finish(id, robot, true);
                }
            }
        }

        let mut requests = core::mem::take(&mut self.requests);
        for request in requests.drain(..) {
            match request {
                Request::Schedule(id) => self.start(id, robot),
                Request::Cancel(id) if self.slots[id.0].state == CommandState::Running => {
                    self.finish(id, robot, true);
                }
                Request::Cancel(_) => {}
            }
        }
        self.requests = requests;
    }

    fn run_active(&mut self, robot: &mut R) {
        let mut index = 0;
        while index < self.active.len() {
            let id = self.active[index];
            let slot = &mut self.slots[id.0];
            let outcome = guarded(|| {
                slot.command.execute(robot)?;
                Ok(slot.command.is_finished(robot))
            });
            match outcome {
                Ok(false) => index += 1,
                Ok(true) => self.finish(id, robot, false),
                Err(fault) => {
                    self.record_fault(id, fault);
                    self.finish(id, robot, true);
                }
            }
        }
    }

    fn start_defaults(&mut self, robot: &mut R) {
        for index in 0..self.resource_names.len() {
            let Some(id) = self.defaults[index] else {
                continue;
            };
            if self.owners[index].is_some() {
                continue;
            }
            let slot = &mut self.slots[id.0];
            if slot.state.is_active()
                || (!self.enabled && !slot.command.runs_when_disabled())
                || slot
                    .requirements
                    .iter()
                    .any(|r| self.owners[r.index()].is_some())
            {
                continue;
            }
            slot.state = CommandState::Scheduled;
            self.start(id, robot);
        }
    }
}
