use teleop_core::{Telemetry, TelemetryError, TelemetrySink};

/// Telemetry sink that writes one log line per snapshot.
#[derive(Debug, Default)]
pub struct LogTelemetrySink {
    published: u32,
}

impl LogTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots written so far.
    pub fn published(&self) -> u32 {
        self.published
    }
}

impl TelemetrySink for LogTelemetrySink {
    fn publish(&mut self, t: &Telemetry) -> Result<(), TelemetryError> {
        let (yaw, pos) = match t.pose {
            Some(p) => (p.yaw_deg, p.position),
            None => (0.0, [0.0; 3]),
        };
        log::info!(
            "{:?} bat {}% pos ({:.2}, {:.2}, {:.2}) yaw {:.0} speed {}% rc {} ctrl {:?}",
            t.state,
            t.battery,
            pos[0],
            pos[1],
            pos[2],
            yaw,
            t.speed_tenths as u16 * 10,
            if t.rc_enabled { "on" } else { "off" },
            t.controller,
        );
        if let Some(cmd) = t.last_command {
            log::debug!(
                "last rc r{} p{} t{} y{}",
                cmd.roll,
                cmd.pitch,
                cmd.throttle,
                cmd.yaw
            );
        }
        self.published = self.published.wrapping_add(1);
        Ok(())
    }
}
