use crate::core::clock::Clock;
use crate::core::control::actuator::{ControlLineActuator, ControlLines};
use crate::domain::error::{IoContext, RelayError, RelayResult};
use crate::domain::pulse::{Line, PulseSpec};
use std::io::{ErrorKind, Read};
use std::time::Duration;
use tracing::{debug, info};

/// Longest command line accepted before giving up on it
const MAX_LINE: usize = 1024;

/// One parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pulse(Line, Option<PulseSpec>),
    Break(u32),
    Go,
    Exit,
}

impl Command {
    /// Parse a single line (without its terminator).
    pub fn parse(line: &str, default_pulse: Duration) -> RelayResult<Self> {
        let mut words = line.split_whitespace();
        let keyword = words.next();
        let argument = words.next();
        if words.next().is_some() {
            return Err(RelayError::UnknownCommand(line.to_string()));
        }

        match (keyword, argument) {
            (Some("dtr"), Some(spec)) => Ok(Command::Pulse(Line::Dtr, PulseSpec::parse(spec, default_pulse)?)),
            (Some("rts"), Some(spec)) => Ok(Command::Pulse(Line::Rts, PulseSpec::parse(spec, default_pulse)?)),
            (Some("break"), Some(ms)) => ms
                .parse::<u32>()
                .map(Command::Break)
                .map_err(|_| RelayError::config(format!("Invalid break duration '{}'", ms))),
            (Some("go"), None) => Ok(Command::Go),
            (Some("exit"), None) => Ok(Command::Exit),
            _ => Err(RelayError::UnknownCommand(line.to_string())),
        }
    }
}

/// How the command phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Continue into the relay
    Go,
    /// Stop the program without relaying
    Exit,
}

/// Line oriented command mode that runs before the relay starts.
///
/// Input is consumed one byte at a time so nothing past the `go` line is
/// swallowed before the relay takes over the same descriptor.
pub struct CommandInterpreter<'a, C: Clock> {
    actuator: &'a ControlLineActuator<C>,
    default_pulse: Duration,
}

impl<'a, C: Clock> CommandInterpreter<'a, C> {
    pub fn new(actuator: &'a ControlLineActuator<C>, default_pulse: Duration) -> Self {
        Self {
            actuator,
            default_pulse,
        }
    }

    pub fn run<R: Read, L: ControlLines>(&self, input: &mut R, lines: &mut L) -> RelayResult<CommandOutcome> {
        loop {
            let line = read_line(input)?.ok_or(RelayError::InputClosed)?;
            debug!("Command: {:?}", line);

            match Command::parse(&line, self.default_pulse)? {
                Command::Pulse(Line::Dtr, spec) => self.actuator.pulse(lines, spec, None)?,
                Command::Pulse(Line::Rts, spec) => self.actuator.pulse(lines, None, spec)?,
                Command::Break(ms) => self.actuator.send_break(lines, ms)?,
                Command::Go => return Ok(CommandOutcome::Go),
                Command::Exit => {
                    info!("Exit requested");
                    return Ok(CommandOutcome::Exit);
                }
            }
        }
    }
}

/// Read up to and excluding `\n`. Returns `None` at a clean end of input
/// with nothing buffered.
fn read_line<R: Read>(input: &mut R) -> RelayResult<Option<String>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) if line.is_empty() => return Ok(None),
            Ok(0) => break,
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => {
                if line.len() == MAX_LINE {
                    return Err(RelayError::UnknownCommand(String::from_utf8_lossy(&line).into_owned()));
                }
                line.push(byte[0]);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).op("read stdin"),
        }
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}
