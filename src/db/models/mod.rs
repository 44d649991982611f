//! Database models split into domain-specific modules.

pub mod common;
pub mod consultation;
pub mod medical_record;
pub mod patient;
pub mod professional;
pub mod system_log;
pub mod unit;
pub mod user;

pub use common::*;
pub use consultation::*;
pub use medical_record::*;
pub use patient::*;
pub use professional::*;
pub use system_log::*;
pub use unit::*;
pub use user::*;
