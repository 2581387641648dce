//! Record store and query engine for a hostel dashboard.
//!
//! One generic `RecordStore` serves complaints, maintenance requests,
//! notices, visitors and rooms. Every mutation produces a new collection
//! and writes it back to a key-value backend (memory, SQLite, or JSON
//! files) exactly once. Queries and aggregates are pure functions over the
//! current collection.

pub mod aggregates;
pub mod assist;
pub mod clock;
pub mod config;
pub mod desk;
pub mod errors;
pub mod kinds;
pub mod operations;
pub mod query;
pub mod record;
pub mod session;
pub mod storage;
pub mod surface;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Backend, DeskConfig};
pub use desk::Desk;
pub use errors::{DeskError, Result};
pub use operations::{DeskContext, RecordStore};
pub use query::{Criteria, DateRange, Scope, SortKey};
