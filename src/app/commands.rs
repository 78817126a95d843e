//! Inbound commands from the serial link.
//!
//! Every command starts with the attention prefix `!C`.  Dumps are one
//! character and execute as soon as it arrives; commands with an argument
//! collect it until `\r`, `\n` or the next `!`.
//!
//! ```text
//!  Idle ──'!'──▶ Attention ──'C'──▶ Command ──'?' 'C' 'Z' 'S'──▶ emit
//!                                      │
//!                                      └─'F' 'P' 'D' 'H' 'T' 'R'──▶ Argument ──'\r' '\n' '!'──▶ emit
//! ```
//!
//! Anything unexpected drops back to `Idle`, so the parser resyncs at the
//! next `!`.

use core::fmt;

use heapless::String;
use log::warn;

use crate::config::{ForceMode, ThresholdKind};
use crate::sensors::temperature::Temp;

/// Longest argument accepted, e.g. `9A-12.25`.
pub const MAX_ARG_LEN: usize = 16;

/// Commands that the serial link can send into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `!C?`
    DumpState,
    /// `!CC`
    DumpConfig,
    /// `!CZ`
    DumpZones,
    /// `!CS`, activity statistics
    DumpStats,
    /// `!CF<n>`
    SetForce(ForceMode),
    /// `!CP<n>`, minutes
    SetPeriod(u8),
    /// `!CD<n>`, minutes
    SetDuration(u8),
    /// `!CH<n>`, minutes
    SetHotWater(u8),
    /// `!CT<z><A|B|P>[temp]`; an empty temperature clears the threshold.
    SetThreshold {
        zone: u8,
        kind: ThresholdKind,
        temp: Temp,
    },
    /// `!CR<z>:<temp>`
    Received { zone: u8, temp: Temp },
}

/// A command was understood but cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    ZoneOutOfRange(u8),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZoneOutOfRange(z) => write!(f, "zone {} out of range", z),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgCommand {
    Force,
    Period,
    Duration,
    HotWater,
    Threshold,
    Received,
}

impl ArgCommand {
    const fn from_letter(c: u8) -> Option<Self> {
        match c {
            b'F' => Some(Self::Force),
            b'P' => Some(Self::Period),
            b'D' => Some(Self::Duration),
            b'H' => Some(Self::HotWater),
            b'T' => Some(Self::Threshold),
            b'R' => Some(Self::Received),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Idle,
    Attention,
    Command,
    Argument(ArgCommand),
}

/// Byte-fed command parser.
#[derive(Debug)]
pub struct CommandParser {
    state: ParseState,
    arg: String<MAX_ARG_LEN>,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandParser {
    pub const fn new() -> Self {
        Self {
            state: ParseState::Idle,
            arg: String::new(),
        }
    }

    /// Feed one byte; returns a command when one is complete.
    pub fn feed(&mut self, b: u8) -> Option<Command> {
        match self.state {
            ParseState::Idle => {
                if b == b'!' {
                    self.state = ParseState::Attention;
                }
                None
            }
            ParseState::Attention => {
                self.state = match b {
                    b'C' => ParseState::Command,
                    b'!' => ParseState::Attention,
                    _ => ParseState::Idle,
                };
                None
            }
            ParseState::Command => {
                self.state = ParseState::Idle;
                match b {
                    b'?' => Some(Command::DumpState),
                    b'C' => Some(Command::DumpConfig),
                    b'Z' => Some(Command::DumpZones),
                    b'S' => Some(Command::DumpStats),
                    b'!' => {
                        self.state = ParseState::Attention;
                        None
                    }
                    _ => {
                        if let Some(cmd) = ArgCommand::from_letter(b) {
                            self.arg.clear();
                            self.state = ParseState::Argument(cmd);
                        }
                        None
                    }
                }
            }
            ParseState::Argument(cmd) => match b {
                b'\r' | b'\n' | b'!' => {
                    self.state = if b == b'!' {
                        ParseState::Attention
                    } else {
                        ParseState::Idle
                    };
                    let parsed = parse_argument(cmd, &self.arg);
                    if parsed.is_none() {
                        warn!("malformed {:?} argument {:?}", cmd, self.arg.as_str());
                    }
                    parsed
                }
                _ if b.is_ascii_graphic() => {
                    if self.arg.push(b as char).is_err() {
                        warn!("{:?} argument too long, dropped", cmd);
                        self.state = ParseState::Idle;
                    }
                    None
                }
                _ => {
                    warn!("unexpected byte 0x{:02x} in {:?} argument", b, cmd);
                    self.state = ParseState::Idle;
                    None
                }
            },
        }
    }
}

fn parse_argument(cmd: ArgCommand, arg: &str) -> Option<Command> {
    match cmd {
        ArgCommand::Force => {
            let n: u32 = parse_digits(arg)?;
            Some(Command::SetForce(ForceMode::from_u8(
                u8::try_from(n).unwrap_or(u8::MAX),
            )))
        }
        ArgCommand::Period => Some(Command::SetPeriod(parse_digits(arg)?)),
        ArgCommand::Duration => Some(Command::SetDuration(parse_digits(arg)?)),
        ArgCommand::HotWater => Some(Command::SetHotWater(parse_digits(arg)?)),
        ArgCommand::Threshold => {
            let split = arg.find(|c: char| !c.is_ascii_digit())?;
            let zone = parse_digits(&arg[..split])?;
            let rest = &arg.as_bytes()[split..];
            let kind = ThresholdKind::from_letter(rest[0])?;
            let value = &arg[split + 1..];
            let temp = if value.is_empty() {
                Temp::INVALID
            } else {
                value.parse().ok()?
            };
            Some(Command::SetThreshold { zone, kind, temp })
        }
        ArgCommand::Received => {
            let (zone, value) = arg.split_once(':')?;
            Some(Command::Received {
                zone: parse_digits(zone)?,
                temp: value.parse().ok()?,
            })
        }
    }
}

/// Unsigned decimal, digits only.
fn parse_digits<T: core::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
