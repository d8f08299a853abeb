//! Core protocol types: Target, Opcode, ParamKind, Color.

use crate::command::ValidationError;

/// Highest accepted color code.
pub const MAX_COLOR: i32 = 9;

/// Maximum number of parameters a command can carry.
pub const MAX_PARAMS: usize = 2;

/// Holoprojector group addressed by a command.
///
/// Selectors are single letters on the wire and are accepted in either case:
///
/// ```
/// use holo_proto::Target;
///
/// assert_eq!(Target::from_selector("f"), Some(Target::Front));
/// assert_eq!(Target::from_selector("A"), Some(Target::All));
/// assert_eq!(Target::from_selector("x"), None);
/// assert_eq!(Target::from_selector("FR"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Target {
    /// Front holoprojector (`F`).
    Front,
    /// Rear holoprojector (`R`).
    Rear,
    /// Top holoprojector (`T`).
    Top,
    /// All holoprojectors (`A`).
    All,
}

impl Target {
    /// Parse a one-character selector string, case-insensitive.
    ///
    /// Returns `None` for empty or multi-character input.
    #[must_use]
    pub fn from_selector(selector: &str) -> Option<Self> {
        let mut chars = selector.chars();
        let first = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        Self::from_char(first)
    }

    /// Parse a selector character, case-insensitive.
    #[inline]
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'F' => Some(Self::Front),
            'R' => Some(Self::Rear),
            'T' => Some(Self::Top),
            'A' => Some(Self::All),
            _ => None,
        }
    }

    /// Uppercase wire byte for this target.
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Front => b'F',
            Self::Rear => b'R',
            Self::Top => b'T',
            Self::All => b'A',
        }
    }

    /// Uppercase wire character for this target.
    #[inline]
    #[must_use]
    pub const fn as_char(self) -> char {
        self.as_byte() as char
    }
}

impl TryFrom<&str> for Target {
    type Error = ValidationError;

    fn try_from(selector: &str) -> Result<Self, Self::Error> {
        Self::from_selector(selector).ok_or(ValidationError::InvalidTarget)
    }
}

impl TryFrom<char> for Target {
    type Error = ValidationError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Self::from_char(c).ok_or(ValidationError::InvalidTarget)
    }
}

impl core::fmt::Display for Target {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Operation requested from the peripheral.
///
/// The wire codes are fixed by the peripheral firmware and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    /// Hold a color (`O6`).
    SetColor,
    /// Pulse a color (`O3`).
    Pulse,
    /// Rainbow light sequence (`007`).
    Rainbow,
    /// Stop all servos and lights (`S4`).
    StopAll,
    /// Stop lights only (`S5`).
    StopLights,
    /// Stop servos only (`S7`).
    StopServos,
    /// Trigger the Leia sequence (`S1`).
    Leia,
    /// Periodic status query (`QD`).
    StatusQuery,
}

impl Opcode {
    /// Wire code for this opcode.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::SetColor => "O6",
            Self::Pulse => "O3",
            Self::Rainbow => "007",
            Self::StopAll => "S4",
            Self::StopLights => "S5",
            Self::StopServos => "S7",
            Self::Leia => "S1",
            Self::StatusQuery => "QD",
        }
    }

    /// Whether the command is prefixed with a target selector.
    #[must_use]
    pub const fn is_targeted(self) -> bool {
        matches!(self, Self::SetColor | Self::Pulse | Self::Rainbow)
    }

    /// Positional parameter schema, in wire order.
    #[must_use]
    pub const fn schema(self) -> &'static [ParamKind] {
        match self {
            Self::SetColor | Self::Pulse => &[ParamKind::Color, ParamKind::Duration],
            Self::Rainbow => &[ParamKind::Duration],
            _ => &[],
        }
    }

    /// Number of leading schema parameters that must be present.
    #[must_use]
    pub const fn required_params(self) -> usize {
        match self {
            Self::SetColor | Self::Pulse => 1,
            _ => 0,
        }
    }
}

/// Kind of a positional command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamKind {
    /// Color code, `0..=9` (0 is random).
    Color,
    /// Duration in whole seconds, `>= 0`.
    Duration,
}

impl ParamKind {
    /// Check a raw value against this parameter's domain.
    pub fn check(self, value: i32) -> Result<u32, ValidationError> {
        match self {
            Self::Color if (0..=MAX_COLOR).contains(&value) => Ok(value as u32),
            Self::Color => Err(ValidationError::ColorOutOfRange),
            Self::Duration => u32::try_from(value).map_err(|_| ValidationError::NegativeDuration),
        }
    }
}

/// Named color codes understood by the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Color {
    Random = 0,
    Red = 1,
    Yellow = 2,
    Green = 3,
    Cyan = 4,
    Blue = 5,
    Magenta = 6,
    Orange = 7,
    Purple = 8,
    White = 9,
}

impl Color {
    /// Numeric wire code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl From<Color> for i32 {
    fn from(color: Color) -> Self {
        color.code()
    }
}
