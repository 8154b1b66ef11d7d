use crate::cli::args::Args;
use crate::cli::settings::Settings;
use crate::core::clock::SystemClock;
use crate::core::control::{CommandInterpreter, CommandOutcome, ControlLineActuator};
use crate::core::relay::{Relay, RelayExit};
use crate::domain::error::{RelayError, RelayResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::console::{self, ConsoleMode};
use crate::infrastructure::device::DeviceSession;
use crate::infrastructure::lock::DeviceLock;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::shutdown::Shutdown;
use tracing::info;

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Relayed(RelayExit),
    /// `exit` given in command mode
    ExitCommand,
    PortsListed,
}

/// Execute CLI command
pub fn execute_command(args: Args) -> RelayResult<RunOutcome> {
    let config = ConfigManager::new().load_config(args.config.as_deref())?;
    init_logging(args.verbose, &config.log_level)?;

    if args.list {
        list_ports()?;
        return Ok(RunOutcome::PortsListed);
    }

    let settings = Settings::resolve(&args, &config)?;
    let shutdown = Shutdown::new();
    let result = run_session(&settings, &shutdown);
    shutdown.run();
    result
}

fn run_session(settings: &Settings, shutdown: &Shutdown) -> RelayResult<RunOutcome> {
    shutdown.register_console(ConsoleMode::capture()?);
    shutdown.install_signal_handler()?;
    shutdown.register_lock(DeviceLock::acquire(&settings.lock_dir, &settings.device)?);

    let mut device = DeviceSession::open(&settings.device, settings.device_options())?;

    let actuator = ControlLineActuator::new(SystemClock);
    actuator.pulse(&mut device, settings.dtr, settings.rts)?;
    if let Some(ms) = settings.break_ms {
        actuator.send_break(&mut device, ms)?;
    }

    let (mut console_in, console_out) = console::streams()?;

    if settings.commands {
        let interpreter = CommandInterpreter::new(&actuator, settings.default_pulse);
        if interpreter.run(&mut console_in, &mut device)? == CommandOutcome::Exit {
            return Ok(RunOutcome::ExitCommand);
        }
    }

    shutdown.enter_relay_mode(settings.raw_console)?;

    info!("Connected.");
    if settings.escape {
        info!("Use '<Enter>~.' sequence to exit.");
    }

    let device_name = settings.device.display().to_string();
    let mut relay = Relay::new(
        console_in,
        console_out,
        &mut device,
        device_name,
        &settings.relay_options(),
        SystemClock,
    );
    relay.run().map(RunOutcome::Relayed)
}

fn list_ports() -> RelayResult<()> {
    let ports = serialport::available_ports().map_err(RelayError::Serial)?;
    if ports.is_empty() {
        info!("No serial ports found");
    }
    for port in ports {
        println!("{}", port.port_name);
    }
    Ok(())
}
