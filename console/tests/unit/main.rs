//! Integration tests for fleetconsole

mod fakes;
mod test_actions;
mod test_sync;
