mod clock;
mod runner;

pub use clock::{Clock, ManualClock, SystemClock};
pub use runner::{IntervalRunner, RunnerHandle};
