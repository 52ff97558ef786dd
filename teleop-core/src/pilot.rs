//! TeleopLoop: connects a controller report source to a vehicle backend.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use t1d_proto::{decode, decode_prefixed, ControllerState};

use crate::backend::VehicleBackend;
use crate::config::TeleopConfig;
use crate::gate::CommandGate;
use crate::input::{ConnectionStatus, InputError, ReportSource};
use crate::machine::{ControlError, FlightStateMachine};
use crate::mapper::CommandMapper;
use crate::shaper::{Actions, ButtonAction, InputSample, InputShaper, MAX_ACTIONS};
use crate::telemetry::Telemetry;
use crate::types::{FlightCommand, FlightState};

/// Outcome of one control tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// State after the backend was advanced.
    pub state: FlightState,
    /// Button actions fired this tick.
    pub actions: Actions,
    /// RC command accepted by the vehicle this tick.
    pub sent: Option<FlightCommand>,
    /// Report was discarded or the controller is gone.
    pub input_error: Option<InputError>,
    /// Actions or RC dispatches the state machine refused.
    pub errors: Vec<ControlError, { MAX_ACTIONS + 1 }>,
}

/// The per-tick control pipeline.
///
/// read latest report -> decode -> shape -> dispatch actions -> map ->
/// rate gate -> `set_rc` -> advance backend.
///
/// Owns the filter memory and the state machine exclusively, so a single
/// task drives it without locking.
pub struct TeleopLoop<S, B> {
    source: S,
    machine: FlightStateMachine<B>,
    shaper: InputShaper,
    mapper: CommandMapper,
    gate: CommandGate,
    report_id: Option<u8>,
    controller: ConnectionStatus,
    /// Controller came back mid-flight; RC waits for a fresh report.
    rearm_pending: bool,
    last_command: Option<FlightCommand>,
}

impl<S: ReportSource, B: VehicleBackend> TeleopLoop<S, B> {
    /// Create a loop from a report source, a backend and configuration.
    pub fn new(source: S, backend: B, config: &TeleopConfig) -> Self {
        Self {
            source,
            machine: FlightStateMachine::new(backend, config.policy),
            shaper: InputShaper::new(config.shaper, config.bindings),
            mapper: CommandMapper::new(config.channel_map),
            gate: CommandGate::new(config.command_interval),
            report_id: config.report_id,
            controller: ConnectionStatus::Disconnected,
            rearm_pending: false,
            last_command: None,
        }
    }

    /// Connect the backend.
    pub fn connect(&mut self) -> Result<(), ControlError> {
        self.machine.connect()
    }

    /// Run one control tick at `now`, `dt` after the previous one.
    pub fn tick(&mut self, now: Instant, dt: Duration) -> TickReport {
        let mut report = TickReport::default();

        let status = self.source.connection_status();
        let reconnected = status == ConnectionStatus::Connected
            && self.controller != ConnectionStatus::Connected;
        if status != self.controller {
            log::info!("controller {:?}", status);
            self.controller = status;
        }

        let decoded = match status {
            ConnectionStatus::Connected => match self.source.latest_report() {
                Some(raw) => match self.decode(&raw) {
                    Ok(state) => Some(state),
                    Err(e) => {
                        log::debug!("discarding report: {:?}", e);
                        report.input_error = Some(e);
                        None
                    }
                },
                None => None,
            },
            _ => {
                report.input_error = Some(InputError::Disconnected);
                None
            }
        };
        let sample = match (status, decoded.as_ref()) {
            (ConnectionStatus::Connected, Some(state)) => InputSample::Report(state),
            (ConnectionStatus::Connected, None) => InputSample::NoNewReport,
            _ => InputSample::Disconnected,
        };

        if reconnected && self.machine.state() == FlightState::Flying {
            // Sticks held before the drop are stale.
            self.shaper.reset_axes();
            self.rearm_pending = true;
        }
        let fresh = matches!(sample, InputSample::Report(_));

        let rc_before = self.shaper.shaped().rc_enabled;
        let airborne = self.machine.state().is_airborne();
        report.actions = self.shaper.update(sample, airborne);

        if self.rearm_pending {
            if status != ConnectionStatus::Connected
                || self.machine.state() != FlightState::Flying
            {
                self.rearm_pending = false;
            } else if fresh {
                log::info!("controller back, RC re-armed");
                self.rearm_pending = false;
                self.shaper.set_rc_enabled(true);
            }
        }

        for &action in report.actions.iter() {
            if let Err(e) = self.dispatch(action) {
                let _ = report.errors.push(e);
            }
        }

        // Authority just dropped mid-flight: stop the vehicle drifting on
        // its last command.
        if rc_before && !self.shaper.shaped().rc_enabled && self.machine.state().accepts_rc() {
            if let Err(e) = self.machine.hover() {
                let _ = report.errors.push(e);
            }
        }

        let command = self
            .mapper
            .command(self.shaper.shaped(), self.shaper.speed(), self.machine.state());
        if let Some(cmd) = command {
            if self.gate.try_pass(now) {
                match self.machine.set_rc(cmd) {
                    Ok(()) => {
                        self.last_command = Some(cmd);
                        report.sent = Some(cmd);
                    }
                    Err(e) => {
                        let _ = report.errors.push(e);
                    }
                }
            }
        }

        report.state = self.machine.advance(seconds(dt));
        report
    }

    /// One shutdown step: revoke RC, land once flying, advance.
    ///
    /// Call repeatedly until the returned state is no longer airborne or the
    /// grace period runs out.
    pub fn shutdown_step(&mut self, dt: Duration) -> FlightState {
        self.shaper.set_rc_enabled(false);
        if self.machine.state() == FlightState::Flying {
            if let Err(e) = self.machine.land() {
                log::warn!("shutdown land failed: {:?}", e);
            }
        }
        self.machine.advance(seconds(dt))
    }

    /// Current telemetry snapshot.
    pub fn telemetry(&self) -> Telemetry {
        let backend = self.machine.backend();
        Telemetry {
            state: self.machine.state(),
            battery: backend.battery(),
            pose: backend.pose(),
            speed_tenths: self.shaper.speed().tenths(),
            rc_enabled: self.shaper.shaped().rc_enabled,
            last_command: self.last_command,
            controller: self.controller,
        }
    }

    #[inline]
    pub fn state(&self) -> FlightState {
        self.machine.state()
    }

    pub fn machine(&self) -> &FlightStateMachine<B> {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut FlightStateMachine<B> {
        &mut self.machine
    }

    pub fn shaper(&self) -> &InputShaper {
        &self.shaper
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Decompose the loop into its report source and backend.
    pub fn into_parts(self) -> (S, B) {
        (self.source, self.machine.into_backend())
    }

    fn decode(&self, raw: &[u8]) -> Result<ControllerState, InputError> {
        let state = match self.report_id {
            Some(id) => decode_prefixed(raw, id)?,
            None => decode(raw)?,
        };
        Ok(state)
    }

    fn dispatch(&mut self, action: ButtonAction) -> Result<(), ControlError> {
        match action {
            ButtonAction::Takeoff => {
                self.machine.takeoff()?;
                self.shaper.set_rc_enabled(true);
            }
            ButtonAction::Land => {
                self.machine.land()?;
                self.shaper.set_rc_enabled(false);
            }
            ButtonAction::Emergency => {
                self.shaper.set_rc_enabled(false);
                self.machine.emergency()?;
            }
            ButtonAction::Hover => self.machine.hover()?,
            // Applied by the shaper.
            ButtonAction::SpeedDown | ButtonAction::SpeedUp => {}
        }
        Ok(())
    }
}

fn seconds(dt: Duration) -> f32 {
    dt.as_micros() as f32 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::config::DEFAULT_CONFIG;
    use crate::input::RawReport;
    use crate::shaper::Axis;
    use crate::sim::{SimConfig, Simulator, DEFAULT_SIM_CONFIG};
    use std::collections::VecDeque;
    use t1d_proto::{Buttons, ReportBuilder, INPUT_REPORT_ID};

    struct MockSource {
        reports: VecDeque<RawReport>,
        status: ConnectionStatus,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                reports: VecDeque::new(),
                status: ConnectionStatus::Connected,
            }
        }

        fn push(&mut self, bytes: &[u8]) {
            self.reports.push_back(RawReport::from_slice(bytes).unwrap());
        }

        fn press(&mut self, builder: ReportBuilder) {
            self.push(&builder.build());
        }
    }

    impl ReportSource for MockSource {
        fn latest_report(&mut self) -> Option<RawReport> {
            self.reports.pop_front()
        }

        fn connection_status(&self) -> ConnectionStatus {
            self.status
        }
    }

    const TICK: Duration = Duration::from_millis(50);

    struct Harness {
        teleop: TeleopLoop<MockSource, Simulator>,
        now: Instant,
    }

    impl Harness {
        fn new(sim: SimConfig) -> Self {
            let mut teleop =
                TeleopLoop::new(MockSource::new(), Simulator::new(sim), &DEFAULT_CONFIG);
            teleop.connect().unwrap();
            Self {
                teleop,
                now: Instant::from_secs(1),
            }
        }

        fn tick(&mut self) -> TickReport {
            self.now += TICK;
            self.teleop.tick(self.now, TICK)
        }

        fn tap(&mut self, buttons: Buttons) -> TickReport {
            self.teleop.source_mut().press(ReportBuilder::new().buttons(buttons));
            let report = self.tick();
            self.teleop.source_mut().press(ReportBuilder::new());
            self.tick();
            report
        }

        fn fly(&mut self) {
            self.tick_with(ReportBuilder::new());
            self.tap(Buttons::A);
            while self.teleop.state() != FlightState::Flying {
                self.tick();
            }
        }

        fn tick_with(&mut self, builder: ReportBuilder) -> TickReport {
            self.teleop.source_mut().press(builder);
            self.tick()
        }
    }

    #[test]
    fn test_takeoff_button_flies() {
        let mut h = Harness::new(DEFAULT_SIM_CONFIG);
        h.tick_with(ReportBuilder::new());
        let report = h.tap(Buttons::A);
        assert_eq!(report.actions.as_slice(), &[ButtonAction::Takeoff]);
        assert_eq!(report.state, FlightState::TakingOff);
        assert!(h.teleop.telemetry().rc_enabled);

        for _ in 0..40 {
            h.tick();
        }
        assert_eq!(h.teleop.state(), FlightState::Flying);
    }

    #[test]
    fn test_sticks_drive_vehicle_when_flying() {
        let mut h = Harness::new(DEFAULT_SIM_CONFIG);
        h.fly();

        let mut sent = 0;
        for _ in 0..20 {
            let report = h.tick_with(ReportBuilder::new().right_stick(1023, 0));
            if let Some(cmd) = report.sent {
                assert!(cmd.roll > 0);
                assert!(cmd.pitch > 0);
                sent += 1;
            }
        }
        // 50 ms ticks against a 50 ms gate.
        assert_eq!(sent, 20);
        let cmd = h.teleop.telemetry().last_command.unwrap();
        assert!(cmd.roll <= 50 && cmd.pitch <= 50);
    }

    #[test]
    fn test_no_commands_before_flying() {
        let mut h = Harness::new(DEFAULT_SIM_CONFIG);
        for _ in 0..10 {
            let report = h.tick_with(ReportBuilder::new().left_stick(0, 0));
            assert!(report.sent.is_none());
        }
        assert_eq!(h.teleop.state(), FlightState::Connected);
    }

    #[test]
    fn test_gate_limits_rate_on_fast_ticks() {
        let mut h = Harness::new(DEFAULT_SIM_CONFIG);
        h.fly();

        let fast = Duration::from_millis(10);
        let mut sent = 0;
        for _ in 0..100 {
            h.teleop.source_mut().press(ReportBuilder::new().right_stick(1023, 512));
            h.now += fast;
            if h.teleop.tick(h.now, fast).sent.is_some() {
                sent += 1;
            }
        }
        // One second of ticks at 100 Hz.
        assert!((19..=21).contains(&sent), "{sent}");
    }

    #[test]
    fn test_emergency_button() {
        let mut h = Harness::new(DEFAULT_SIM_CONFIG);
        h.fly();
        let report = h.tap(Buttons::X);
        assert_eq!(report.actions.as_slice(), &[ButtonAction::Emergency]);
        // Next advance after the stop already reconciled to Connected.
        assert_eq!(report.state, FlightState::Connected);
        assert!(!h.teleop.telemetry().rc_enabled);
        assert_eq!(h.teleop.telemetry().altitude(), 0.0);
    }

    #[test]
    fn test_land_button() {
        let mut h = Harness::new(DEFAULT_SIM_CONFIG);
        h.fly();
        let report = h.tap(Buttons::B);
        assert_eq!(report.state, FlightState::Landing);
        for _ in 0..60 {
            h.tick();
        }
        assert_eq!(h.teleop.state(), FlightState::Connected);
    }

    #[test]
    fn test_malformed_report_is_discarded() {
        let mut h = Harness::new(DEFAULT_SIM_CONFIG);
        h.teleop.source_mut().push(&[0u8; 5]);
        let report = h.tick();
        assert!(matches!(report.input_error, Some(InputError::Malformed(_))));
        assert!(report.actions.is_empty());
    }

    #[test]
    fn test_prefixed_reports() {
        let config = TeleopConfig {
            report_id: Some(INPUT_REPORT_ID),
            ..DEFAULT_CONFIG
        };
        let mut teleop = TeleopLoop::new(MockSource::new(), Simulator::default(), &config);
        teleop.connect().unwrap();

        let mut now = Instant::from_secs(1);
        let mut step = |teleop: &mut TeleopLoop<MockSource, Simulator>, bytes: &[u8]| {
            now += TICK;
            teleop.source_mut().push(bytes);
            teleop.tick(now, TICK)
        };

        step(&mut teleop, &ReportBuilder::new().build_prefixed(INPUT_REPORT_ID));
        // Wrong report ID: dropped, no takeoff.
        let report = step(
            &mut teleop,
            &ReportBuilder::new().buttons(Buttons::A).build_prefixed(0x42),
        );
        assert!(report.actions.is_empty());
        assert!(report.input_error.is_some());

        let report = step(
            &mut teleop,
            &ReportBuilder::new().buttons(Buttons::A).build_prefixed(INPUT_REPORT_ID),
        );
        assert_eq!(report.actions.as_slice(), &[ButtonAction::Takeoff]);
    }

    #[test]
    fn test_disconnect_revokes_rc_and_hovers() {
        let mut h = Harness::new(DEFAULT_SIM_CONFIG);
        h.fly();
        for _ in 0..5 {
            h.tick_with(ReportBuilder::new().right_stick(1023, 512));
        }
        assert!(h.teleop.machine().backend().velocity()[0] > 0.0);

        h.teleop.source_mut().status = ConnectionStatus::Disconnected;
        let report = h.tick();
        assert_eq!(report.input_error, Some(InputError::Disconnected));
        assert!(report.sent.is_none());
        assert!(!h.teleop.telemetry().rc_enabled);
        assert_eq!(h.teleop.machine().backend().velocity(), [0.0; 4]);
        assert_eq!(h.teleop.state(), FlightState::Flying);

        // Reconnect re-arms RC while still flying, once a fresh report
        // is in.
        h.teleop.source_mut().status = ConnectionStatus::Connected;
        h.tick_with(ReportBuilder::new());
        assert!(h.teleop.telemetry().rc_enabled);
    }

    #[test]
    fn test_reconnect_does_not_replay_held_sticks() {
        let mut h = Harness::new(DEFAULT_SIM_CONFIG);
        h.fly();
        for _ in 0..30 {
            h.tick_with(ReportBuilder::new().right_stick(1023, 512));
        }
        assert!(h.teleop.shaper().shaped().axis(Axis::RightX) > 0.9);

        h.teleop.source_mut().status = ConnectionStatus::Disconnected;
        h.tick();
        assert_eq!(h.teleop.machine().backend().velocity(), [0.0; 4]);

        // Back, but nothing queued yet.
        h.teleop.source_mut().status = ConnectionStatus::Connected;
        let report = h.tick();
        assert!(report.sent.is_none());
        assert!(!h.teleop.telemetry().rc_enabled);
        assert_eq!(h.teleop.shaper().shaped().axes, [0.0; 4]);
        assert_eq!(h.teleop.machine().backend().velocity(), [0.0; 4]);

        // Sticks released on the controller: first command is neutral.
        let report = h.tick_with(ReportBuilder::new());
        assert!(h.teleop.telemetry().rc_enabled);
        assert_eq!(report.sent, Some(FlightCommand::NEUTRAL));
        assert_eq!(h.teleop.machine().backend().velocity(), [0.0; 4]);
    }

    #[test]
    fn test_reconnect_after_landing_stays_disarmed() {
        let mut h = Harness::new(DEFAULT_SIM_CONFIG);
        h.fly();
        h.teleop.source_mut().status = ConnectionStatus::Disconnected;
        h.tick();
        h.teleop.machine_mut().land().unwrap();
        for _ in 0..60 {
            h.tick();
        }
        assert_eq!(h.teleop.state(), FlightState::Connected);

        h.teleop.source_mut().status = ConnectionStatus::Connected;
        for _ in 0..3 {
            let report = h.tick_with(ReportBuilder::new().right_stick(1023, 512));
            assert!(report.sent.is_none());
        }
        assert!(!h.teleop.telemetry().rc_enabled);
    }

    #[test]
    fn test_held_button_at_connect_does_nothing() {
        let mut h = Harness::new(DEFAULT_SIM_CONFIG);
        for _ in 0..5 {
            let report = h.tick_with(ReportBuilder::new().buttons(Buttons::A));
            assert!(report.actions.is_empty());
        }
        assert_eq!(h.teleop.state(), FlightState::Connected);
    }

    #[test]
    fn test_shutdown_lands() {
        let mut h = Harness::new(SimConfig {
            landing_speed: 2.0,
            ..DEFAULT_SIM_CONFIG
        });
        h.fly();
        let mut state = h.teleop.state();
        for _ in 0..40 {
            state = h.teleop.shutdown_step(TICK);
            if !state.is_airborne() {
                break;
            }
        }
        assert_eq!(state, FlightState::Connected);
        let (_, sim) = h.teleop.into_parts();
        assert_eq!(sim.position()[2], 0.0);
    }
}
