//! Control parameters and the per-tick parameter bus

pub mod bus;
pub mod control;

pub use bus::{ParameterBus, ParameterMap};
pub use control::ControlParam;
