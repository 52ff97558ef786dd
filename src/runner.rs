//! Async control loop around [`TeleopLoop`].

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker, Timer};
use teleop_core::{ReportSource, TeleopConfig, TeleopLoop, TelemetrySink, VehicleBackend};

/// Drive `teleop` at `config.tick_interval` until `stop` is signaled.
///
/// Each tick measures the real elapsed time and passes it on, so a late tick
/// integrates the backend over the actual gap. Telemetry goes to `sink`
/// every `config.telemetry_interval`.
pub async fn run<S, B, T>(
    teleop: &mut TeleopLoop<S, B>,
    sink: &mut T,
    config: &TeleopConfig,
    stop: &Signal<CriticalSectionRawMutex, ()>,
) where
    S: ReportSource,
    B: VehicleBackend,
    T: TelemetrySink,
{
    let mut ticker = Ticker::every(config.tick_interval);
    let mut last = Instant::now();
    let mut last_telemetry = last;
    log::info!(
        "control loop running, tick {} ms, rc every {} ms",
        config.tick_interval.as_millis(),
        config.command_interval.as_millis()
    );

    loop {
        if let Either::Second(()) = select(ticker.next(), stop.wait()).await {
            break;
        }

        let now = Instant::now();
        let report = teleop.tick(now, now - last);
        last = now;

        if let Some(cmd) = report.sent {
            log::trace!("rc {:?}", cmd);
        }
        for e in report.errors.iter() {
            log::debug!("tick error: {:?}", e);
        }

        if now - last_telemetry >= config.telemetry_interval {
            last_telemetry = now;
            if let Err(e) = sink.publish(&teleop.telemetry()) {
                log::warn!("telemetry dropped: {:?}", e);
            }
        }
    }
    log::info!("control loop stopped in {:?}", teleop.state());
}

/// Best-effort landing, then hand back the source and backend.
///
/// Keeps advancing the backend every `step` until it is on the ground or
/// `grace` has passed. This is the one deliberate wait in shutdown.
pub async fn land_and_release<S, B>(
    mut teleop: TeleopLoop<S, B>,
    grace: Duration,
    step: Duration,
) -> (S, B)
where
    S: ReportSource,
    B: VehicleBackend,
{
    let start = Instant::now();
    let mut last = start;

    if teleop.state().is_airborne() {
        log::info!("landing before shutdown");
    }
    while teleop.state().is_airborne() && Instant::now() - start < grace {
        Timer::after(step).await;
        let now = Instant::now();
        teleop.shutdown_step(now - last);
        last = now;
    }

    if teleop.state().is_airborne() {
        log::warn!("still {:?} after {} ms grace", teleop.state(), grace.as_millis());
    }
    teleop.into_parts()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ReportSlot;
    use embassy_futures::block_on;
    use embassy_futures::join::join;
    use t1d_proto::{Buttons, ReportBuilder};
    use teleop_core::{
        ConnectionStatus, FlightState, SimConfig, Simulator, Telemetry, TelemetryError,
        DEFAULT_CONFIG, DEFAULT_SIM_CONFIG,
    };

    #[derive(Default)]
    struct CountingSink {
        published: usize,
        last: Option<Telemetry>,
    }

    impl TelemetrySink for CountingSink {
        fn publish(&mut self, telemetry: &Telemetry) -> Result<(), TelemetryError> {
            self.published += 1;
            self.last = Some(*telemetry);
            Ok(())
        }
    }

    /// Sink whose consumer never keeps up.
    #[derive(Default)]
    struct RejectingSink {
        attempts: usize,
    }

    impl TelemetrySink for RejectingSink {
        fn publish(&mut self, _telemetry: &Telemetry) -> Result<(), TelemetryError> {
            self.attempts += 1;
            Err(TelemetryError)
        }
    }

    fn fast_sim() -> Simulator {
        Simulator::new(SimConfig {
            takeoff_speed: 10.0,
            landing_speed: 10.0,
            ..DEFAULT_SIM_CONFIG
        })
    }

    fn test_config() -> TeleopConfig {
        TeleopConfig {
            tick_interval: Duration::from_millis(10),
            telemetry_interval: Duration::from_millis(50),
            ..DEFAULT_CONFIG
        }
    }

    #[test]
    fn test_run_stops_on_signal() {
        let slot = ReportSlot::new();
        let config = test_config();
        let mut teleop = TeleopLoop::new(slot.reader(), fast_sim(), &config);
        teleop.connect().unwrap();

        let stop = Signal::new();
        stop.signal(());
        let mut sink = CountingSink::default();
        block_on(run(&mut teleop, &mut sink, &config, &stop));
        assert_eq!(teleop.state(), FlightState::Connected);
    }

    #[test]
    fn test_run_flies_then_lands_on_shutdown() {
        let slot = ReportSlot::new();
        slot.set_status(ConnectionStatus::Connected);
        let config = test_config();
        let mut teleop = TeleopLoop::new(slot.reader(), fast_sim(), &config);
        teleop.connect().unwrap();

        let stop = Signal::new();
        let mut sink = CountingSink::default();

        let operator = async {
            slot.publish(&ReportBuilder::new().build());
            Timer::after_millis(100).await;
            slot.publish(&ReportBuilder::new().buttons(Buttons::A).build());
            Timer::after_millis(100).await;
            slot.publish(&ReportBuilder::new().build());
            Timer::after_millis(400).await;
            stop.signal(());
        };
        block_on(join(run(&mut teleop, &mut sink, &config, &stop), operator));

        assert_eq!(teleop.state(), FlightState::Flying);
        assert!(sink.published >= 1);
        assert_eq!(sink.last.unwrap().controller, ConnectionStatus::Connected);

        let (_, sim) = block_on(land_and_release(
            teleop,
            config.shutdown_grace,
            config.tick_interval,
        ));
        assert!(!sim.is_flying());
        assert_eq!(sim.position()[2], 0.0);
    }

    #[test]
    fn test_rejected_telemetry_does_not_stop_loop() {
        let slot = ReportSlot::new();
        slot.set_status(ConnectionStatus::Connected);
        let config = test_config();
        let mut teleop = TeleopLoop::new(slot.reader(), fast_sim(), &config);
        teleop.connect().unwrap();

        let stop = Signal::new();
        let mut sink = RejectingSink::default();
        let operator = async {
            Timer::after_millis(300).await;
            stop.signal(());
        };
        block_on(join(run(&mut teleop, &mut sink, &config, &stop), operator));

        assert!(sink.attempts >= 2, "{}", sink.attempts);
        assert_eq!(teleop.state(), FlightState::Connected);
    }

    #[test]
    fn test_release_when_grounded_is_immediate() {
        let slot = ReportSlot::new();
        let teleop = TeleopLoop::new(slot.reader(), fast_sim(), &DEFAULT_CONFIG);
        let start = Instant::now();
        let (_, sim) = block_on(land_and_release(
            teleop,
            Duration::from_secs(2),
            Duration::from_millis(10),
        ));
        assert!(Instant::now() - start < Duration::from_secs(1));
        assert!(!sim.is_flying());
    }
}
