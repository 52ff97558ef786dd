//! Input shaping: deadband, low-pass smoothing, button edges, speed scaling.
//!
//! The shaper owns all state that has to survive between ticks: the filter
//! memory, the previous button vector and the operator's speed setting. A fresh
//! [`InputShaper`] is fully deterministic, so tests build one per case.

use heapless::Vec;
use t1d_proto::{Buttons, ControllerState};

/// Largest accepted smoothing factor. 1.0 would freeze the filter.
pub const MAX_SMOOTHING: f32 = 0.99;

/// Most actions a single tick can produce (one per binding).
pub const MAX_ACTIONS: usize = 6;

/// Actions fired on one tick, in binding order.
pub type Actions = Vec<ButtonAction, MAX_ACTIONS>;

/// Stick axis index into [`ShapedInput::axes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
}

/// Filter and speed parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShaperConfig {
    /// Magnitudes below this snap to exactly zero.
    pub deadband: f32,
    /// EMA weight of the previous value, in [0, 1). 0 disables smoothing.
    pub smoothing: f32,
    /// Speed multiplier at startup, in tenths (1..=10).
    pub initial_speed_tenths: u8,
}

/// Default shaping: 3% deadband, heavy smoothing, half speed.
pub const DEFAULT_SHAPER_CONFIG: ShaperConfig = ShaperConfig {
    deadband: 0.03,
    smoothing: 0.8,
    initial_speed_tenths: 5,
};

impl Default for ShaperConfig {
    fn default() -> Self {
        DEFAULT_SHAPER_CONFIG
    }
}

/// Discrete operator action triggered by a button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonAction {
    Takeoff,
    Land,
    Emergency,
    /// Zero all channels and hold position.
    Hover,
    SpeedDown,
    SpeedUp,
}

/// Which button fires which action.
///
/// Layouts differ between controllers and operators, so this is configuration.
/// A binding of [`Buttons::NONE`] disables that action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActionBindings {
    pub takeoff: Buttons,
    pub land: Buttons,
    pub emergency: Buttons,
    pub hover: Buttons,
    pub speed_down: Buttons,
    pub speed_up: Buttons,
}

/// Face buttons for flight, shoulder buttons for speed.
///
/// - A -> Takeoff
/// - B -> Land
/// - X -> Emergency stop
/// - Y -> Hover
/// - L1 / R1 -> Speed down / up
pub const DEFAULT_BINDINGS: ActionBindings = ActionBindings {
    takeoff: Buttons::A,
    land: Buttons::B,
    emergency: Buttons::X,
    hover: Buttons::Y,
    speed_down: Buttons::L1,
    speed_up: Buttons::R1,
};

impl Default for ActionBindings {
    fn default() -> Self {
        DEFAULT_BINDINGS
    }
}

impl ActionBindings {
    /// Bindings in the order their actions are emitted.
    fn table(&self) -> [(ButtonAction, Buttons); MAX_ACTIONS] {
        [
            (ButtonAction::Takeoff, self.takeoff),
            (ButtonAction::Land, self.land),
            (ButtonAction::Emergency, self.emergency),
            (ButtonAction::Hover, self.hover),
            (ButtonAction::SpeedDown, self.speed_down),
            (ButtonAction::SpeedUp, self.speed_up),
        ]
    }
}

/// Operator speed setting, stored in tenths so steps never drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpeedMultiplier(u8);

impl SpeedMultiplier {
    pub const MIN_TENTHS: u8 = 1;
    pub const MAX_TENTHS: u8 = 10;

    #[must_use]
    pub fn from_tenths(tenths: u8) -> Self {
        Self(tenths.clamp(Self::MIN_TENTHS, Self::MAX_TENTHS))
    }

    #[inline]
    #[must_use]
    pub fn tenths(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub fn as_f32(self) -> f32 {
        self.0 as f32 / 10.0
    }

    pub fn increase(&mut self) {
        self.0 = (self.0 + 1).min(Self::MAX_TENTHS);
    }

    pub fn decrease(&mut self) {
        self.0 = self.0.saturating_sub(1).max(Self::MIN_TENTHS);
    }
}

/// Previous button vector for rising-edge detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeState {
    /// Nothing seen yet; the next sample is recorded without firing.
    Uninitialized,
    Tracking(Buttons),
}

/// Filtered stick values plus the RC authority flag.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShapedInput {
    /// Indexed by [`Axis`], each in [-1.0, 1.0].
    pub axes: [f32; 4],
    /// RC commands may be sent. Only ever true while airborne.
    pub rc_enabled: bool,
}

impl ShapedInput {
    #[inline]
    #[must_use]
    pub fn axis(&self, axis: Axis) -> f32 {
        self.axes[axis as usize]
    }
}

/// What the control loop observed from the controller this tick.
#[derive(Debug, Clone, Copy)]
pub enum InputSample<'a> {
    /// A freshly decoded report.
    Report(&'a ControllerState),
    /// Controller connected, no report since the last tick.
    NoNewReport,
    /// Controller transport is not connected.
    Disconnected,
}

/// Stateful input shaping stage.
#[derive(Debug, Clone)]
pub struct InputShaper {
    config: ShaperConfig,
    bindings: ActionBindings,
    shaped: ShapedInput,
    /// Last deadbanded raw sample, reused while no new report arrives.
    last_raw: Option<[f32; 4]>,
    edges: EdgeState,
    speed: SpeedMultiplier,
}

impl InputShaper {
    /// Create a shaper. `smoothing` is clamped to [0, [`MAX_SMOOTHING`]].
    #[must_use]
    pub fn new(config: ShaperConfig, bindings: ActionBindings) -> Self {
        let config = ShaperConfig {
            deadband: config.deadband.max(0.0),
            smoothing: config.smoothing.clamp(0.0, MAX_SMOOTHING),
            ..config
        };
        Self {
            speed: SpeedMultiplier::from_tenths(config.initial_speed_tenths),
            config,
            bindings,
            shaped: ShapedInput::default(),
            last_raw: None,
            edges: EdgeState::Uninitialized,
        }
    }

    /// Run one shaping step.
    ///
    /// `airborne` gates takeoff/land edges and RC authority. Speed actions
    /// are applied here; the others are returned for the state machine.
    pub fn update(&mut self, sample: InputSample<'_>, airborne: bool) -> Actions {
        let mut actions = Actions::new();

        match sample {
            InputSample::Report(state) => {
                let raw = self.deadband_all(state.normalized_axes());
                self.last_raw = Some(raw);
                self.filter(raw);
                actions = self.edge_actions(state.buttons, airborne);
            }
            InputSample::NoNewReport => {
                if let Some(raw) = self.last_raw {
                    self.filter(raw);
                }
            }
            InputSample::Disconnected => {
                // Hold the filter. A reconnect mid-press must not fire.
                self.last_raw = None;
                self.edges = EdgeState::Uninitialized;
                self.shaped.rc_enabled = false;
            }
        }

        if !airborne {
            self.shaped.rc_enabled = false;
        }

        actions
    }

    /// Drop the filter memory, so shaping restarts from centered sticks.
    pub fn reset_axes(&mut self) {
        self.shaped.axes = [0.0; 4];
        self.last_raw = None;
    }

    /// Grant or revoke RC authority after a takeoff/land/emergency outcome.
    pub fn set_rc_enabled(&mut self, enabled: bool) {
        self.shaped.rc_enabled = enabled;
    }

    #[inline]
    #[must_use]
    pub fn shaped(&self) -> &ShapedInput {
        &self.shaped
    }

    #[inline]
    #[must_use]
    pub fn speed(&self) -> SpeedMultiplier {
        self.speed
    }

    #[inline]
    #[must_use]
    pub fn edge_state(&self) -> EdgeState {
        self.edges
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ShaperConfig {
        &self.config
    }

    fn deadband(&self, v: f32) -> f32 {
        let tau = self.config.deadband;
        if v > -tau && v < tau {
            0.0
        } else {
            v
        }
    }

    fn deadband_all(&self, raw: [f32; 4]) -> [f32; 4] {
        raw.map(|v| self.deadband(v))
    }

    fn filter(&mut self, raw: [f32; 4]) {
        let alpha = self.config.smoothing;
        for (i, &r) in raw.iter().enumerate() {
            let filtered = alpha * self.shaped.axes[i] + (1.0 - alpha) * r;
            self.shaped.axes[i] = self.deadband(filtered.clamp(-1.0, 1.0));
        }
    }

    fn rising_edges(&mut self, current: Buttons) -> Buttons {
        match self.edges {
            EdgeState::Uninitialized => {
                self.edges = EdgeState::Tracking(current);
                Buttons::NONE
            }
            EdgeState::Tracking(previous) => {
                self.edges = EdgeState::Tracking(current);
                current.rising_since(previous)
            }
        }
    }

    fn edge_actions(&mut self, buttons: Buttons, airborne: bool) -> Actions {
        let rising = self.rising_edges(buttons);
        let mut actions = Actions::new();
        if rising.is_empty() {
            return actions;
        }

        for (action, binding) in self.bindings.table() {
            if binding.is_empty() || !rising.contains(binding) {
                continue;
            }
            let armed = match action {
                ButtonAction::Takeoff => !airborne,
                ButtonAction::Land | ButtonAction::Hover => airborne,
                ButtonAction::Emergency => true,
                ButtonAction::SpeedDown => {
                    self.speed.decrease();
                    log::info!("speed {}%", self.speed.tenths() as u16 * 10);
                    true
                }
                ButtonAction::SpeedUp => {
                    self.speed.increase();
                    log::info!("speed {}%", self.speed.tenths() as u16 * 10);
                    true
                }
            };
            if armed {
                // Capacity equals the number of bindings.
                let _ = actions.push(action);
            }
        }
        actions
    }
}

impl Default for InputShaper {
    fn default() -> Self {
        Self::new(DEFAULT_SHAPER_CONFIG, DEFAULT_BINDINGS)
    }
}
