//! On-call planning: slot catalog, declared preferences, hours balancing,
//! slot assignment and conflict detection.

pub mod config;
pub mod conflicts;
pub mod db;
pub mod engine;
pub mod error;
pub mod hours;
pub mod repository;
pub mod roster;
pub mod schema;
pub mod slots;
pub mod store;
pub mod summary;

pub use conflicts::{Conflict, find_conflicts};
pub use engine::{BalancingPolicy, Cover, DualAssignment, Schedule, assign_dual, assign_fallback, build_schedule};
pub use hours::{HoursLedger, HoursTotal, compute_hours};
pub use schema::{DateRange, DayPlan, Declaration, Priority, SlotLabels, StandardTemplate};
pub use slots::{Slot, SlotClass};
