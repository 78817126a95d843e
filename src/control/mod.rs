//! Override policy, activity statistics and reset supervision.

pub mod activity;
pub mod force;
pub mod reset;

pub use activity::{ActivityStats, History};
pub use force::{ForceEngine, ForceReason};
pub use reset::{ResetInputs, ResetSupervisor};
