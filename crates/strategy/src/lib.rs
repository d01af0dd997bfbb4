pub mod context;
pub mod evaluator;

pub use context::SignalContext;
pub use evaluator::{evaluate, evaluate_traced, Rule, RULES};
