use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{error, info};
use static_cell::StaticCell;
use t1d_teleop::input::demo_script;
use t1d_teleop::{
    land_and_release, run, LogTelemetrySink, ReportSlot, ScriptedController, Simulator,
    SlotReader, TeleopLoop, VehicleBackend, CONFIG,
};
use teleop_core::DEFAULT_SIM_CONFIG;

/// Latest controller report, written by the input task and read by the control task.
static REPORT_SLOT: StaticCell<ReportSlot> = StaticCell::new();

/// Stop request for the control loop.
static STOP_SIGNAL: StaticCell<Signal<CriticalSectionRawMutex, ()>> = StaticCell::new();

/// Raised once the vehicle is released.
static DONE_SIGNAL: StaticCell<Signal<CriticalSectionRawMutex, ()>> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("T1d teleop starting...");

    let slot: &'static ReportSlot = REPORT_SLOT.init(ReportSlot::new());
    let stop: &'static _ = STOP_SIGNAL.init(Signal::new());
    let done: &'static _ = DONE_SIGNAL.init(Signal::new());

    // --- Vehicle Setup ---
    let mut teleop = TeleopLoop::new(slot.reader(), Simulator::new(DEFAULT_SIM_CONFIG), &CONFIG);
    if let Err(e) = teleop.connect() {
        error!("Vehicle connect failed: {:?}", e);
        std::process::exit(1);
    }

    // --- Controller Setup ---
    let controller = ScriptedController::new(demo_script());

    spawner.spawn(input_task(controller, slot, stop)).unwrap();
    spawner.spawn(control_task(teleop, stop, done)).unwrap();

    info!("T1d teleop initialized, waiting for controller...");
    done.wait().await;
    std::process::exit(0);
}

/// Input task - replays the controller script into the report slot.
#[embassy_executor::task]
async fn input_task(
    controller: ScriptedController,
    slot: &'static ReportSlot,
    stop: &'static Signal<CriticalSectionRawMutex, ()>,
) {
    controller.run(slot).await;
    // No controller left to fly with.
    stop.signal(());
}

/// Control task - runs the teleop loop, then lands and releases the vehicle.
#[embassy_executor::task]
async fn control_task(
    mut teleop: TeleopLoop<SlotReader<'static>, Simulator>,
    stop: &'static Signal<CriticalSectionRawMutex, ()>,
    done: &'static Signal<CriticalSectionRawMutex, ()>,
) {
    let mut sink = LogTelemetrySink::new();
    run(&mut teleop, &mut sink, &CONFIG, stop).await;

    let (_, sim) = land_and_release(teleop, CONFIG.shutdown_grace, CONFIG.tick_interval).await;
    let pose = sim.pose().unwrap_or_default();
    info!(
        "Vehicle released at ({:.2}, {:.2}, {:.2}), battery {}%, {} telemetry lines",
        pose.position[0],
        pose.position[1],
        pose.position[2],
        sim.battery(),
        sink.published()
    );
    done.signal(());
}
