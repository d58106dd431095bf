pub mod evaluator;
pub mod geometry;
pub mod reference;
pub mod throttle;

pub use evaluator::{DeviationReport, PostureEvaluator, PostureStatus};
pub use reference::ReferenceStore;
pub use throttle::{AlertAction, AlertPolicy, AlertThrottler, ThrottleState};
