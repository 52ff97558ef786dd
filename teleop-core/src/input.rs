//! Controller report source trait and error types.

use heapless::Vec;
use t1d_proto::MalformedReport;

/// Largest raw report a source hands to the control loop.
pub const MAX_REPORT_LEN: usize = 32;

/// Raw report bytes as delivered by the controller transport.
pub type RawReport = Vec<u8, MAX_REPORT_LEN>;

/// Controller transport link state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    /// Discovery or pairing in progress.
    Connecting,
    Connected,
}

/// Error type for input handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputError {
    /// Report rejected by the decoder and discarded.
    Malformed(MalformedReport),
    /// Controller transport is not connected.
    Disconnected,
}

impl From<MalformedReport> for InputError {
    fn from(err: MalformedReport) -> Self {
        InputError::Malformed(err)
    }
}

/// Non-blocking source of controller reports.
///
/// This trait abstracts the controller transport (BLE notifications, a test
/// script, a replay file). Implementations keep a single latest-report slot:
/// a newer report overwrites an unread one, nothing is queued.
pub trait ReportSource {
    /// Take the most recent report, if one arrived since the last call.
    fn latest_report(&mut self) -> Option<RawReport>;

    /// Current transport link state.
    fn connection_status(&self) -> ConnectionStatus;
}

impl<T: ReportSource + ?Sized> ReportSource for &mut T {
    fn latest_report(&mut self) -> Option<RawReport> {
        (**self).latest_report()
    }

    fn connection_status(&self) -> ConnectionStatus {
        (**self).connection_status()
    }
}
