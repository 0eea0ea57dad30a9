/// Monitoring engine - everything between a timer firing and a verdict
///
/// - `prober`: one reachability probe over an HTTP method fallback chain
/// - `retry`: bounded attempts per check cycle, producing a single verdict
/// - `registry`: which services currently own a timer
/// - `scheduler`: start/pause/resume lifecycle of the per-service timers
/// - `transition`: persisting a verdict and deciding whether to alert
pub mod prober;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod transition;

pub use prober::{HttpProber, Probe, ProbeMethod, ProbeOutcome};
pub use registry::TimerRegistry;
pub use retry::{RetryController, Verdict};
pub use scheduler::Scheduler;
pub use transition::TransitionHandler;
