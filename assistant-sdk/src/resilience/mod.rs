//! Resilience patterns for the assistant client
//!
//! The remote run is asynchronous and offers no callback channel, so the
//! only resilience pattern needed is a bounded poll-until-complete loop:
//! - `PollPolicy`: attempt budget plus delay schedule, injectable
//! - `FixedInterval` / `ExponentialPolicy`: the stock schedules
//! - `RunPoller`: the loop itself

mod poll;

pub use poll::{ExponentialPolicy, FixedInterval, PollPolicy, RunPoller, TerminalStatePolicy};
