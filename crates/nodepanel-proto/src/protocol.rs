//! Wire types for the node's `/json/…` API.
//!
//! The firmware is loose about scalar encodings: show numbers arrive as `5`
//! or `"05"`, flags as `true`, `1` or `"1"`. Decoding accepts all of them;
//! encoding always emits numbers.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::NodeError;

/// Highest show number the player addresses.
pub const SHOW_MAX: u32 = 99;

pub const ACTION_RESOURCE: &str = "action";
pub const DMX_PORTS: &str = "dmx/portstatus";
pub const RDM_PORTS: &str = "rdm/portstatus";
pub const SHOW_STATUS: &str = "showfile/status";
pub const SHOW_DIRECTORY: &str = "showfile/directory";
pub const DISPLAY: &str = "display";
/// The node's list of `.txt` configuration blocks.
pub const CONFIG_DIRECTORY: &str = "directory";

// ── Ports ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "in")]
    Input,
    #[serde(alias = "out")]
    Output,
    #[default]
    Disabled,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
            Direction::Disabled => "disabled",
        }
    }
}

/// One entry of a port-list endpoint. `port` is the device-assigned key
/// (a letter); the rest is static.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortIdentity {
    pub port: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
}

impl PortIdentity {
    pub fn new(port: impl Into<String>, direction: Direction) -> Self {
        Self {
            port: port.into(),
            direction,
            speed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxCounters {
    #[serde(default)]
    pub packets: u64,
    #[serde(default)]
    pub slots: u64,
}

/// Body of `dmx/status?X`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmxPortStatus {
    #[serde(default)]
    pub sent: DmxCounters,
    #[serde(default)]
    pub received: DmxCounters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdmDiscovery {
    #[serde(default)]
    pub full: u32,
    #[serde(default)]
    pub incremental: u32,
}

/// Body of `rdm/tod?X`: the table of devices found on one port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdmTod {
    #[serde(default)]
    pub tod: Vec<String>,
    #[serde(default)]
    pub discovery: RdmDiscovery,
}

// ── Shows ─────────────────────────────────────────────────────────────────────

/// A show number in `0..=99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShowId(u8);

impl ShowId {
    pub fn new(n: u32) -> Result<Self, NodeError> {
        if n > SHOW_MAX {
            return Err(NodeError::InvalidShow(n));
        }
        Ok(Self(n as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl Serialize for ShowId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for ShowId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        show_from_value::<D::Error>(Value::deserialize(d)?)?
            .ok_or_else(|| de::Error::custom("expected a show number"))
    }
}

fn show_from_value<E: de::Error>(v: Value) -> Result<Option<ShowId>, E> {
    let n = match v {
        Value::Null => return Ok(None),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| E::custom(format!("bad show number {}", n)))?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case("none") {
                return Ok(None);
            }
            s.parse::<u64>()
                .map_err(|_| E::custom(format!("bad show number {:?}", s)))?
        }
        other => return Err(E::custom(format!("bad show value {}", other))),
    };
    u32::try_from(n)
        .ok()
        .and_then(|n| ShowId::new(n).ok())
        .map(Some)
        .ok_or_else(|| E::custom(format!("show {} out of range", n)))
}

fn de_show<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ShowId>, D::Error> {
    show_from_value(Value::deserialize(d)?)
}

pub(crate) fn de_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "off" | "false" | "no" => Ok(false),
            "1" | "on" | "true" | "yes" => Ok(true),
            other => Err(de::Error::custom(format!("bad flag {:?}", other))),
        },
        other => Err(de::Error::custom(format!("bad flag {}", other))),
    }
}

/// Player state as reported by `showfile/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
    Recording,
}

impl<'de> Deserialize<'de> for PlaybackStatus {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        match s.trim().to_ascii_lowercase().as_str() {
            "stopped" | "idle" | "ended" => Ok(Self::Stopped),
            "playing" | "running" => Ok(Self::Playing),
            "paused" => Ok(Self::Paused),
            "recording" => Ok(Self::Recording),
            other => Err(de::Error::custom(format!("unknown player status {:?}", other))),
        }
    }
}

impl PlaybackStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Recording => "Recording",
        }
    }

    /// Whether the node is expected to honour `cmd` from this state.
    /// Advisory only: commands are always submitted and the node decides.
    pub fn accepts(self, cmd: PlayCommand) -> bool {
        match cmd {
            PlayCommand::Start => self != Self::Recording,
            PlayCommand::Stop => matches!(self, Self::Playing | Self::Paused),
            PlayCommand::Resume => self == Self::Paused,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowStatus {
    #[serde(default, deserialize_with = "de_show")]
    pub show: Option<ShowId>,
    #[serde(default)]
    pub status: PlaybackStatus,
    #[serde(rename = "loop", default, deserialize_with = "de_flag")]
    pub looping: bool,
}

/// Body of `showfile/directory`, in node order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowDirectory {
    #[serde(default)]
    pub shows: Vec<ShowId>,
}

// ── Actions ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayCommand {
    Start,
    Stop,
    Resume,
}

/// A boolean the firmware expects as `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(pub bool);

impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(self.0))
    }
}

/// One `/json/action` body. Externally tagged, so `Action::Show(5)` encodes
/// as `{"show":5}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Show(ShowId),
    Status(PlayCommand),
    Loop(Flag),
    Identify(Flag),
    Display(Flag),
    Rdm(Flag),
    Reboot(Flag),
}
