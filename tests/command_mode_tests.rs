use nix::unistd::pipe;
use serelay::core::clock::{ManualClock, SystemClock};
use serelay::core::control::{CommandInterpreter, CommandOutcome, ControlLineActuator, ControlLines};
use serelay::core::relay::{Pacing, Relay, RelayExit, RelayOptions};
use serelay::domain::pulse::Polarity;
use serelay::{RelayError, RelayResult};
use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

/// Tracks the simulated state of both modem lines
#[derive(Debug, Default)]
struct FakeLines {
    dtr_asserted: Option<bool>,
    rts_asserted: Option<bool>,
    history: Vec<(Option<Polarity>, Option<Polarity>)>,
    breaks: Vec<u32>,
}

impl ControlLines for FakeLines {
    fn set_lines(&mut self, dtr: Option<Polarity>, rts: Option<Polarity>) -> RelayResult<()> {
        if let Some(p) = dtr {
            self.dtr_asserted = Some(p == Polarity::Assert);
        }
        if let Some(p) = rts {
            self.rts_asserted = Some(p == Polarity::Assert);
        }
        self.history.push((dtr, rts));
        Ok(())
    }

    fn send_break(&mut self, duration_ms: u32) -> RelayResult<()> {
        self.breaks.push(duration_ms);
        Ok(())
    }
}

const DEFAULT_PULSE: Duration = Duration::from_millis(1);

/// Command mode scripts fed through the interpreter
#[cfg(test)]
mod command_mode_tests {
    use super::*;

    #[test]
    fn test_dtr_plus_then_go() {
        let actuator = ControlLineActuator::new(ManualClock::new());
        let interpreter = CommandInterpreter::new(&actuator, DEFAULT_PULSE);
        let mut lines = FakeLines::default();
        let mut input: &[u8] = b"dtr +\ngo\n";

        let outcome = interpreter.run(&mut input, &mut lines).unwrap();

        assert_eq!(outcome, CommandOutcome::Go);
        assert_eq!(
            lines.history,
            vec![
                (Some(Polarity::Assert), None),
                (Some(Polarity::Deassert), None),
            ]
        );
        assert_eq!(lines.rts_asserted, None);
    }

    #[test]
    fn test_unknown_command_is_fatal() {
        let actuator = ControlLineActuator::new(ManualClock::new());
        let interpreter = CommandInterpreter::new(&actuator, DEFAULT_PULSE);
        let mut lines = FakeLines::default();
        let mut input: &[u8] = b"foo\ngo\n";

        let err = interpreter.run(&mut input, &mut lines).unwrap_err();

        assert!(matches!(err, RelayError::UnknownCommand(ref text) if text == "foo"));
        assert!(lines.history.is_empty());
    }

    #[test]
    fn test_exit_stops_before_relay() {
        let actuator = ControlLineActuator::new(ManualClock::new());
        let interpreter = CommandInterpreter::new(&actuator, DEFAULT_PULSE);
        let mut lines = FakeLines::default();
        let mut input: &[u8] = b"rts -30\nbreak 0\nexit\ngo\n";

        let outcome = interpreter.run(&mut input, &mut lines).unwrap();

        assert_eq!(outcome, CommandOutcome::Exit);
        assert_eq!(lines.rts_asserted, Some(true));
        assert_eq!(lines.breaks, vec![0]);
    }

    #[test]
    fn test_end_of_input_without_go() {
        let actuator = ControlLineActuator::new(ManualClock::new());
        let interpreter = CommandInterpreter::new(&actuator, DEFAULT_PULSE);
        let mut lines = FakeLines::default();
        let mut input: &[u8] = b"dtr -\n";

        let err = interpreter.run(&mut input, &mut lines).unwrap_err();

        assert!(matches!(err, RelayError::InputClosed));
        assert!(err.is_silent());
        assert_eq!(lines.dtr_asserted, Some(true));
    }

    #[test]
    fn test_negative_pulse_real_time() {
        let actuator = ControlLineActuator::new(SystemClock);
        let mut lines = FakeLines::default();
        let started = Instant::now();

        actuator
            .pulse(&mut lines, serelay::domain::PulseSpec::from_millis(-50), None)
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(lines.dtr_asserted, Some(true));
    }

    #[test]
    fn test_relay_sees_input_after_go() {
        let (read_end, write_end) = pipe().unwrap();
        let mut writer = File::from(write_end);
        writer.write_all(b"go\nhello").unwrap();
        drop(writer);

        let mut console_in = File::from(read_end);
        let actuator = ControlLineActuator::new(ManualClock::new());
        let interpreter = CommandInterpreter::new(&actuator, DEFAULT_PULSE);
        let mut lines = FakeLines::default();
        assert_eq!(
            interpreter.run(&mut console_in, &mut lines).unwrap(),
            CommandOutcome::Go
        );

        let (device, mut device_peer) = UnixStream::pair().unwrap();
        let mut relay = Relay::new(
            console_in,
            Vec::new(),
            device,
            "test-device",
            &RelayOptions {
                escape: true,
                pacing: Pacing::Unthrottled,
                read_chunk: 64,
            },
            SystemClock,
        );
        let exit = relay.run().unwrap();
        assert!(matches!(exit, RelayExit::ConsoleClosed | RelayExit::ConsoleHangup));
        drop(relay);

        let mut received = Vec::new();
        device_peer.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"hello");
    }
}
