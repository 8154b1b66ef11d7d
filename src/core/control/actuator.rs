use crate::core::clock::Clock;
use crate::domain::error::RelayResult;
use crate::domain::pulse::{Polarity, PulseSpec};
use tracing::info;

/// Device side of modem control: line state changes and break generation.
pub trait ControlLines {
    /// Drive DTR and/or RTS in one commit. `None` leaves a line untouched.
    fn set_lines(&mut self, dtr: Option<Polarity>, rts: Option<Polarity>) -> RelayResult<()>;

    /// Hold the line in break condition. Zero selects the driver's default
    /// short break.
    fn send_break(&mut self, duration_ms: u32) -> RelayResult<()>;
}

/// Performs timed pulses on the modem control lines.
///
/// Calls block for the whole pulse; they are only made during setup or from
/// the command interpreter, never from inside the relay loop.
pub struct ControlLineActuator<C: Clock> {
    clock: C,
}

impl<C: Clock> ControlLineActuator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Pulse DTR and RTS within one shared timing window.
    ///
    /// Each requested line is driven to its pulse polarity, held for the
    /// longer of the two durations, then driven to the opposite state.
    pub fn pulse<L: ControlLines>(
        &self,
        lines: &mut L,
        dtr: Option<PulseSpec>,
        rts: Option<PulseSpec>,
    ) -> RelayResult<()> {
        if dtr.is_none() && rts.is_none() {
            return Ok(());
        }
        if let Some(spec) = dtr {
            info!("Pulsing DTR {}", spec);
        }
        if let Some(spec) = rts {
            info!("Pulsing RTS {}", spec);
        }

        lines.set_lines(dtr.map(|p| p.polarity), rts.map(|p| p.polarity))?;

        let window = dtr
            .iter()
            .chain(rts.iter())
            .map(|p| p.duration)
            .max()
            .unwrap_or_default();
        self.clock.sleep(window);

        lines.set_lines(
            dtr.map(|p| p.polarity.opposite()),
            rts.map(|p| p.polarity.opposite()),
        )
    }

    pub fn send_break<L: ControlLines>(&self, lines: &mut L, duration_ms: u32) -> RelayResult<()> {
        info!("Sending break ({} ms)", duration_ms);
        lines.send_break(duration_ms)
    }
}
