//! Drive-signal shaping for active devices.

pub mod duty;
