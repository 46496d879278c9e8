pub mod brew;
pub mod envelope;
pub mod executor;
pub mod registry;
pub mod tokenizer;
pub mod updater;

pub use brew::HomebrewClient;
pub use envelope::{CommandOutput, CommandResult};
pub use registry::{PackageSource, ToolDescriptor, ToolRegistry};
pub use tokenizer::tokenize;
pub use updater::{plan_from_outdated, UpdateCandidate, UpdatePlan, UpdateReconciler};
