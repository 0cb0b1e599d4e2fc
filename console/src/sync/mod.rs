//! Snapshot synchronization: store, syncer and poll scheduling

pub mod scheduler;
pub mod store;
pub mod syncer;
