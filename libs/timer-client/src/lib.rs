//! Countdown widget driver for the post display timer.
//!
//! The driver owns one widget's countdown: it asks the timer API to start,
//! ticks once a second, pauses while the tab is hidden, and finalizes with the
//! server when the counter reaches zero.

pub mod backend;
pub mod document;
pub mod driver;
pub mod error;
pub mod view;

pub use backend::{HttpBackend, TimerBackend};
pub use document::DocumentContext;
pub use driver::{CountdownDriver, DriverOptions, DriverState, TickOutcome};
pub use error::ClientError;
pub use view::WidgetView;
