pub mod column;
pub mod nav_plan;

pub use column::{Column, ColumnItems, ColumnStack, ColumnType, SortSpec};
pub use nav_plan::{advance_nav_plan_after_load, AdvanceOutcome, AwaitKind, NavDriller, NavPlan, NavTarget};
