use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use teleop_core::{ConnectionStatus, RawReport, ReportSource};

/// Single latest-report slot shared between the transport and the control loop.
///
/// The transport side calls [`publish`](Self::publish) from its notification
/// handler; the control loop reads through a [`SlotReader`]. Using Signal
/// instead of Channel provides "latest value wins" semantics: an unread
/// report is overwritten, never queued.
pub struct ReportSlot {
    latest: Signal<CriticalSectionRawMutex, RawReport>,
    status: Mutex<CriticalSectionRawMutex, Cell<ConnectionStatus>>,
}

impl ReportSlot {
    pub const fn new() -> Self {
        Self {
            latest: Signal::new(),
            status: Mutex::new(Cell::new(ConnectionStatus::Disconnected)),
        }
    }

    /// Store a report, replacing any unread one.
    ///
    /// Returns `false` if the report does not fit and was dropped.
    pub fn publish(&self, report: &[u8]) -> bool {
        match RawReport::from_slice(report) {
            Ok(raw) => {
                self.latest.signal(raw);
                true
            }
            Err(()) => {
                log::warn!("dropping oversized report ({} bytes)", report.len());
                false
            }
        }
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        self.status.lock(|s| s.set(status));
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.lock(|s| s.get())
    }

    /// Control-loop side of the slot.
    pub fn reader(&self) -> SlotReader<'_> {
        SlotReader { slot: self }
    }
}

impl Default for ReportSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// [`ReportSource`] reading from a [`ReportSlot`].
#[derive(Clone, Copy)]
pub struct SlotReader<'a> {
    slot: &'a ReportSlot,
}

impl ReportSource for SlotReader<'_> {
    fn latest_report(&mut self) -> Option<RawReport> {
        self.slot.latest.try_take()
    }

    fn connection_status(&self) -> ConnectionStatus {
        self.slot.status()
    }
}
