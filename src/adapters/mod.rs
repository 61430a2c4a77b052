//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                      |
//! |------------|---------------|----------------------------------|
//! | `console`  | FrameSink     | ASCII tank frames on any `Write` |
//! | `gpio`     | ActuatorPort  | embedded-hal enable pins + PWM   |
//! |            | SwitchInput   | embedded-hal float-switch inputs |
//! | `log_sink` | EventSink     | `log` facade                     |
//! | `sim`      | SensorPort    | host-side readings               |
//! |            | ActuatorPort  | recorded outputs                 |

pub mod console;
pub mod gpio;
pub mod log_sink;
pub mod sim;
