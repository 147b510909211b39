//! Serial command protocol.
//!
//! Bytes from the serial link are assembled into CR-terminated lines by
//! [`LineAssembler`], parsed into a [`Command`] by [`parse`], and configuration
//! commands are applied by [`apply_config`]. Commands that drive the race
//! (`R*`) and identification (`V`) are executed by the controller.
//!
//! | Line        | Meaning                                         |
//! |-------------|-------------------------------------------------|
//! | `A[n]`      | query / set tie allowance (ticks)               |
//! | `R`         | reset                                           |
//! | `RA`        | force finish (repeat result outside a race)     |
//! | `RL`        | live lane sensor levels                         |
//! | `RP`        | repeat last result line                         |
//! | `RR` / `RS` | gate ready / started level                      |
//! | `RT`        | sensor test mode                                |
//! | `OD[n]`     | decimal places (3..=5)                          |
//! | `OL[n]`     | lane label table (0..=3)                        |
//! | `OM[n]`     | mask lane n, `0` clears all masks               |
//! | `ON[n]`     | lane count (1..=8)                              |
//! | `OP[n]`     | position label table (0..=3)                    |
//! | `OR[n]`     | auto-reset delay (seconds)                      |
//! | `OF` `OV` `OW` | accepted for compatibility, no effect        |
//! | `V`         | identification                                  |

use derby_errors::{ProtocolError, ProtocolResult};
use derby_timing::{Lanes, RaceConfig};

/// Longest accepted command line, excluding the terminator.
pub const MAX_LINE_LEN: usize = 48;

/// Reply to every successful setter.
pub const OK_REPLY: &str = "OK";

/// Assembles serial bytes into command lines.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: String,
    overflowed: bool,
}

impl LineAssembler {
    /// Empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: String::with_capacity(MAX_LINE_LEN),
            overflowed: false,
        }
    }

    /// Feed one byte.
    ///
    /// Returns a complete line on CR. LF is ignored. A line that grew past
    /// [`MAX_LINE_LEN`] is discarded and reported as
    /// [`ProtocolError::LineTooLong`] when its CR arrives.
    pub fn push(&mut self, byte: u8) -> Option<ProtocolResult<String>> {
        match byte {
            b'\r' => {
                let line = core::mem::take(&mut self.buffer);
                if core::mem::take(&mut self.overflowed) {
                    Some(Err(ProtocolError::LineTooLong { max: MAX_LINE_LEN }))
                } else {
                    Some(Ok(line))
                }
            }
            b'\n' => None,
            _ if self.overflowed => None,
            _ if self.buffer.len() >= MAX_LINE_LEN => {
                self.buffer.clear();
                self.overflowed = true;
                None
            }
            _ => {
                self.buffer.push(char::from(byte));
                None
            }
        }
    }

    /// Feed a chunk of bytes, collecting every completed line.
    pub fn extend(&mut self, bytes: &[u8]) -> Vec<ProtocolResult<String>> {
        bytes.iter().filter_map(|&byte| self.push(byte)).collect()
    }
}

/// `R` selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceCommand {
    /// `R`
    Reset,
    /// `RA`
    ForceFinish,
    /// `RL`
    LaneLevels,
    /// `RP`
    RepeatResult,
    /// `RR`
    GateReady,
    /// `RS`
    GateStarted,
    /// `RT`
    Test,
}

/// `O` options. `None` arguments are queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionCommand {
    /// `OD`
    DecimalPlaces(Option<u8>),
    /// `OL`
    LaneLabel(Option<u8>),
    /// `OM`
    Mask(Option<u8>),
    /// `ON`
    LaneCount(Option<u8>),
    /// `OP`
    PositionLabel(Option<u8>),
    /// `OR`
    AutoReset(Option<u32>),
    /// `OF`, `OV`, `OW`: race-management compatibility, always `OK`.
    Compatibility(char),
}

/// A parsed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `A[n]`
    TieAllowance(Option<u32>),
    /// `R[x]`
    Race(RaceCommand),
    /// `Ox[n]`
    Option(OptionCommand),
    /// `V`
    Version,
}

/// Parse one command line. Leading and trailing whitespace is ignored and
/// command letters are case-insensitive.
///
/// # Errors
///
/// Any [`ProtocolError`] other than `Config`; the caller answers `?`.
///
/// ```
/// use derby_controller::protocol::{parse, Command, OptionCommand};
///
/// assert_eq!(parse("od3"), Ok(Command::Option(OptionCommand::DecimalPlaces(Some(3)))));
/// assert!(parse("OD33").is_err());
/// ```
pub fn parse(line: &str) -> ProtocolResult<Command> {
    let mut chars = line.trim().chars();
    let command = chars
        .next()
        .ok_or(ProtocolError::Empty)?
        .to_ascii_uppercase();
    let rest = chars.as_str();

    match command {
        'A' => Ok(Command::TieAllowance(number("A", rest)?)),
        'R' => parse_race(rest).map(Command::Race),
        'O' => parse_option(rest).map(Command::Option),
        'V' if rest.is_empty() => Ok(Command::Version),
        'V' => Err(ProtocolError::invalid_argument("V", rest)),
        other => Err(ProtocolError::UnknownCommand(other)),
    }
}

fn parse_race(rest: &str) -> ProtocolResult<RaceCommand> {
    let mut chars = rest.chars();
    let Some(selector) = chars.next() else {
        return Ok(RaceCommand::Reset);
    };
    if !chars.as_str().is_empty() {
        return Err(ProtocolError::invalid_argument("R", rest));
    }
    match selector.to_ascii_uppercase() {
        'A' => Ok(RaceCommand::ForceFinish),
        'L' => Ok(RaceCommand::LaneLevels),
        'P' => Ok(RaceCommand::RepeatResult),
        'R' => Ok(RaceCommand::GateReady),
        'S' => Ok(RaceCommand::GateStarted),
        'T' => Ok(RaceCommand::Test),
        other => Err(ProtocolError::UnknownSelector {
            command: 'R',
            selector: other,
        }),
    }
}

fn parse_option(rest: &str) -> ProtocolResult<OptionCommand> {
    let mut chars = rest.chars();
    let selector = chars
        .next()
        .ok_or(ProtocolError::MissingSelector('O'))?
        .to_ascii_uppercase();
    let argument = chars.as_str();

    match selector {
        'D' => digit("OD", argument).map(OptionCommand::DecimalPlaces),
        'L' => digit("OL", argument).map(OptionCommand::LaneLabel),
        'M' => digit("OM", argument).map(OptionCommand::Mask),
        'N' => digit("ON", argument).map(OptionCommand::LaneCount),
        'P' => digit("OP", argument).map(OptionCommand::PositionLabel),
        'R' => number("OR", argument).map(OptionCommand::AutoReset),
        'F' | 'V' | 'W' => Ok(OptionCommand::Compatibility(selector)),
        other => Err(ProtocolError::UnknownSelector {
            command: 'O',
            selector: other,
        }),
    }
}

/// Empty, or exactly one ASCII digit.
fn digit(command: &'static str, argument: &str) -> ProtocolResult<Option<u8>> {
    let mut bytes = argument.bytes();
    match (bytes.next(), bytes.next()) {
        (None, _) => Ok(None),
        (Some(byte @ b'0'..=b'9'), None) => Ok(Some(byte - b'0')),
        _ => Err(ProtocolError::invalid_argument(command, argument)),
    }
}

/// Empty, or ASCII digits fitting in a `u32`.
fn number(command: &'static str, argument: &str) -> ProtocolResult<Option<u32>> {
    if argument.is_empty() {
        return Ok(None);
    }
    if !argument.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ProtocolError::invalid_argument(command, argument));
    }
    argument
        .parse()
        .map(Some)
        .map_err(|_| ProtocolError::invalid_argument(command, argument))
}

/// Execute a configuration command (`A` or `O*`) and return its reply.
///
/// Queries reply with the current value; setters reply [`OK_REPLY`]. Every
/// change is fully applied before this returns.
///
/// # Errors
///
/// [`ProtocolError::Config`] if the value is rejected; the configuration is
/// unchanged. Race and version commands are not configuration and yield
/// [`ProtocolError::UnknownCommand`].
pub fn apply_config(
    command: Command,
    config: &mut RaceConfig,
    lanes: &mut Lanes,
) -> ProtocolResult<String> {
    let reply = match command {
        Command::TieAllowance(None) => config.tie_allowance().to_string(),
        Command::TieAllowance(Some(ticks)) => {
            config.set_tie_allowance(ticks);
            OK_REPLY.to_string()
        }
        Command::Option(option) => apply_option(option, config, lanes)?,
        Command::Race(_) => return Err(ProtocolError::UnknownCommand('R')),
        Command::Version => return Err(ProtocolError::UnknownCommand('V')),
    };
    Ok(reply)
}

fn apply_option(
    option: OptionCommand,
    config: &mut RaceConfig,
    lanes: &mut Lanes,
) -> ProtocolResult<String> {
    let ok = || OK_REPLY.to_string();
    let reply = match option {
        OptionCommand::DecimalPlaces(None) => config.decimal_places().to_string(),
        OptionCommand::DecimalPlaces(Some(places)) => {
            config.set_decimal_places(places)?;
            ok()
        }
        OptionCommand::LaneLabel(None) => config.lane_symbol().to_string(),
        OptionCommand::LaneLabel(Some(index)) => {
            config.set_lane_label_index(index)?;
            ok()
        }
        OptionCommand::Mask(None) => lanes.masked_numbers(config.lanes()),
        OptionCommand::Mask(Some(0)) => {
            lanes.clear_masks();
            ok()
        }
        OptionCommand::Mask(Some(number)) => {
            lanes.mask(number, config.lane_count())?;
            ok()
        }
        OptionCommand::LaneCount(None) => config.lane_count().to_string(),
        OptionCommand::LaneCount(Some(count)) => {
            config.set_lane_count(count)?;
            ok()
        }
        OptionCommand::PositionLabel(None) => config.position_symbol().to_string(),
        OptionCommand::PositionLabel(Some(index)) => {
            config.set_position_label_index(index)?;
            ok()
        }
        OptionCommand::AutoReset(None) => config.auto_reset_delay_secs().to_string(),
        OptionCommand::AutoReset(Some(secs)) => {
            config.set_auto_reset_delay_secs(secs);
            ok()
        }
        OptionCommand::Compatibility(_) => ok(),
    };
    Ok(reply)
}
