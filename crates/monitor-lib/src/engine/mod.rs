//! Rule evaluation and alert lifecycle tracking

mod evaluator;
mod tracker;

pub use evaluator::{evaluate, Evaluation};
pub use tracker::{AlertState, AlertStateTracker};
