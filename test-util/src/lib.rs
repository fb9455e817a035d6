//! Utilities for integration tests: a scripted in-process mock PED.

mod mock_ped;

pub use mock_ped::MockPed;
