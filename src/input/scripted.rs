use embassy_time::{Duration, Instant, Timer};
use t1d_proto::{pack, AnalogStick, Buttons, ControllerState};
use teleop_core::ConnectionStatus;

use super::slot::ReportSlot;

/// Interval between reports while a step is held (BLE notification rate).
pub const REPORT_INTERVAL: Duration = Duration::from_millis(10);

/// One controller pose held for a while.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptStep {
    pub hold: Duration,
    pub state: ControllerState,
}

impl ScriptStep {
    /// Hands off the controller for `hold_ms`.
    pub const fn idle(hold_ms: u64) -> Self {
        Self {
            hold: Duration::from_millis(hold_ms),
            state: ControllerState::neutral(),
        }
    }

    pub const fn buttons(mut self, buttons: Buttons) -> Self {
        self.state.buttons = buttons;
        self
    }

    pub const fn left_stick(mut self, x: u16, y: u16) -> Self {
        self.state.left_stick = AnalogStick::new(x, y);
        self
    }

    pub const fn right_stick(mut self, x: u16, y: u16) -> Self {
        self.state.right_stick = AnalogStick::new(x, y);
        self
    }
}

/// Short demo flight: take off, fly forward, turn, land.
pub fn demo_script() -> &'static [ScriptStep] {
    static SCRIPT: [ScriptStep; 11] = [
        ScriptStep::idle(500),
        ScriptStep::idle(100).buttons(Buttons::A),
        ScriptStep::idle(2500),
        ScriptStep::idle(100).buttons(Buttons::R1),
        ScriptStep::idle(100),
        ScriptStep::idle(1500).right_stick(512, 0),
        ScriptStep::idle(1500).left_stick(1023, 512),
        ScriptStep::idle(1000).left_stick(512, 200),
        ScriptStep::idle(500),
        ScriptStep::idle(100).buttons(Buttons::B),
        ScriptStep::idle(2500),
    ];
    &SCRIPT
}

/// Controller stand-in that replays a fixed script into a [`ReportSlot`].
pub struct ScriptedController {
    script: &'static [ScriptStep],
    pairing: Duration,
}

impl ScriptedController {
    pub fn new(script: &'static [ScriptStep]) -> Self {
        Self {
            script,
            pairing: Duration::from_millis(200),
        }
    }

    /// Time spent in [`ConnectionStatus::Connecting`] before the first report.
    pub fn with_pairing(mut self, pairing: Duration) -> Self {
        self.pairing = pairing;
        self
    }

    /// Total script length, excluding pairing.
    pub fn duration(&self) -> Duration {
        self.script
            .iter()
            .fold(Duration::from_ticks(0), |acc, step| acc + step.hold)
    }

    /// Pair, then publish each step's report until its hold time runs out.
    ///
    /// Leaves the slot disconnected when the script ends.
    pub async fn run(&self, slot: &ReportSlot) {
        slot.set_status(ConnectionStatus::Connecting);
        Timer::after(self.pairing).await;
        slot.set_status(ConnectionStatus::Connected);
        log::info!("controller paired, playing {} steps", self.script.len());

        for step in self.script {
            let report = pack(&step.state);
            let until = Instant::now() + step.hold;
            while Instant::now() < until {
                slot.publish(&report);
                Timer::after(REPORT_INTERVAL).await;
            }
        }

        slot.set_status(ConnectionStatus::Disconnected);
        log::info!("script finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use t1d_proto::decode;
    use teleop_core::ReportSource;

    #[test]
    fn test_script_steps_are_const() {
        let step = ScriptStep::idle(100).buttons(Buttons::A).right_stick(1023, 0);
        assert_eq!(step.hold, Duration::from_millis(100));
        assert!(step.state.buttons.is_pressed(Buttons::A));
        assert_eq!(step.state.right_stick, AnalogStick::new(1023, 0));
        assert_eq!(step.state.left_stick, AnalogStick::CENTERED);
    }

    #[test]
    fn test_demo_script_takes_off_and_lands() {
        let script = demo_script();
        assert!(script.iter().any(|s| s.state.buttons.is_pressed(Buttons::A)));
        assert!(script.last().map(|s| s.state.buttons.is_empty()).unwrap_or(false));
        let controller = ScriptedController::new(script);
        assert_eq!(controller.duration(), Duration::from_millis(10_400));
    }

    #[test]
    fn test_run_publishes_and_disconnects() {
        static SCRIPT: [ScriptStep; 1] = [ScriptStep::idle(30).buttons(Buttons::Y)];

        let slot = ReportSlot::new();
        let controller = ScriptedController::new(&SCRIPT).with_pairing(Duration::from_millis(1));
        block_on(controller.run(&slot));

        assert_eq!(slot.status(), ConnectionStatus::Disconnected);
        let raw = slot.reader().latest_report().unwrap();
        assert_eq!(decode(&raw).unwrap().buttons, Buttons::Y);
    }
}
