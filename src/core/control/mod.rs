// Control module - Modem line pulses, breaks and the command mode driving them
pub mod actuator;
pub mod interpreter;

pub use actuator::{ControlLineActuator, ControlLines};
pub use interpreter::{Command, CommandInterpreter, CommandOutcome};
