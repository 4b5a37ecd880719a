pub mod artifact;
pub mod case_table;
pub mod controller;
pub mod dynamic;
pub mod runner;
pub mod snapshotable;
pub mod snapshoter;
pub mod stateful_suite;
