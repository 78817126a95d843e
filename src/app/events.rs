//! Outbound application events.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log them, write report lines to the
//! serial link, or both.

use heapless::String;

use crate::acquisition::Mode;

/// Longest report line: a config dump with every threshold set.
pub const REPORT_LEN: usize = 384;

pub type ReportLine = String<REPORT_LEN>;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller has started.
    Started,

    /// The heater moved between two known modes.
    ModeChanged { from: Mode, to: Mode },

    /// Indicator lines went silent.
    PowerLost,

    /// Indicator lines came back after silence.
    PowerBack,

    /// The error LED has been blinking for longer than the dwell.
    ErrorRaised,

    /// The error LED stopped blinking.
    ErrorCleared,

    /// The override was asserted.  `zone` is set for temperature triggers.
    ForcedOn { zone: Option<u8> },

    /// The override was released.
    ForceReleased,

    /// Configuration was changed over the serial link.
    ConfigChanged,

    /// Hot-water mode outlasted the configured limit.
    HotWaterTimeout,

    /// A fault has persisted; ask the host to power-cycle the heater.
    ResetRequest,

    /// A formatted dump line for the serial link.
    Report(ReportLine),
}
