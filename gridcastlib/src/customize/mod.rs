//! Viewer customization: override records, the engine that applies them and
//! the edit-control markers rendered for them.

pub mod controls;
pub mod engine;
pub mod overrides;

pub use engine::apply_customizations;
pub use overrides::{find_table_customization, OverrideColumn, OverrideSet};
