//!  Storage is organized through [event_store::FileEventStore].
//!  The basic idea is:
//!   - There is a directory with all the records.
//!   - Every local calendar day gets its own partition file with one JSON record per line.
//!   - A `sequence` file remembers the last id handed out. Holding its lock serializes appends.

pub mod entities;
pub mod event_store;
