//! Domain model for the task catalogue.
//!
//! Tasks, categories and user preferences live here together with the pure
//! filter and sort engine and the statistics value types. Nothing in this
//! module performs I/O.

mod category;
mod error;
mod filter;
mod ids;
mod insights;
mod preferences;
mod task;
mod update;
mod version;

pub use category::{Category, normalize_category_name};
pub use error::{NotFoundError, ValidationError};
pub use filter::{
    CategoryFilter, DateRange, FilterState, SortDirection, SortField, SortSpec, TaskMatcher,
    matches, sort_tasks,
};
pub use ids::{CategoryId, TaskId};
pub use insights::{PriorityCounts, TaskNavigationContext, TaskStatistics};
pub use preferences::{Theme, UserPreferences, ViewMode};
pub use task::{NewTask, PersistedTaskData, Priority, Task, normalize_tag, normalize_title};
pub use update::{FieldPatch, TagsPatch, TaskUpdate};
pub use version::DataVersion;
