#![forbid(unsafe_code)]

pub mod common;
pub mod gate;
pub mod participant;
pub mod scenario;
pub mod stimulus;
pub mod timeline;
pub mod trial;

pub use common::{ContractViolation, ReasonCodeId, SchemaVersion, Validate};
