//! Validated commands and the single validation entry point.

use heapless::Vec;

use crate::types::{Opcode, Target, MAX_PARAMS};

/// Reason a command was rejected before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// Selector is not one of `F`, `R`, `T`, `A` (any case).
    InvalidTarget,
    /// Targeted opcode given without a selector.
    MissingTarget,
    /// Global opcode given a selector.
    UnexpectedTarget,
    /// Color outside `0..=9`.
    ColorOutOfRange,
    /// Duration below zero.
    NegativeDuration,
    /// A required parameter is absent.
    MissingParameter,
    /// More parameters than the opcode accepts.
    TooManyParameters,
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidTarget => write!(f, "invalid target selector"),
            Self::MissingTarget => write!(f, "missing target selector"),
            Self::UnexpectedTarget => write!(f, "opcode takes no target"),
            Self::ColorOutOfRange => write!(f, "color out of range"),
            Self::NegativeDuration => write!(f, "negative duration"),
            Self::MissingParameter => write!(f, "missing parameter"),
            Self::TooManyParameters => write!(f, "too many parameters"),
        }
    }
}

/// Checked parameter list, at most [`MAX_PARAMS`] entries.
pub type Params = Vec<u32, MAX_PARAMS>;

/// A command that passed validation and can be serialized.
///
/// Commands are transient: build one, serialize or send it, drop it.
/// The only way to obtain one is through [`validate_command`] or the
/// named constructors, so every `Command` is well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    target: Option<Target>,
    opcode: Opcode,
    params: Params,
}

/// Validate raw command input.
///
/// `selector` is the one-letter target (any case) for targeted opcodes and
/// must be `None` for global ones. `params` are checked positionally against
/// [`Opcode::schema`].
///
/// # Example
///
/// ```
/// use holo_proto::{validate_command, Opcode, Target, ValidationError};
///
/// let cmd = validate_command(Some("r"), Opcode::SetColor, &[5, 10]).unwrap();
/// assert_eq!(cmd.target(), Some(Target::Rear));
/// assert_eq!(cmd.params(), &[5, 10]);
///
/// assert_eq!(
///     validate_command(Some("r"), Opcode::SetColor, &[12]),
///     Err(ValidationError::ColorOutOfRange)
/// );
/// ```
pub fn validate_command(
    selector: Option<&str>,
    opcode: Opcode,
    params: &[i32],
) -> Result<Command, ValidationError> {
    let target = match (opcode.is_targeted(), selector) {
        (true, Some(s)) => Some(Target::try_from(s)?),
        (true, None) => return Err(ValidationError::MissingTarget),
        (false, Some(_)) => return Err(ValidationError::UnexpectedTarget),
        (false, None) => None,
    };

    let schema = opcode.schema();
    if params.len() < opcode.required_params() {
        return Err(ValidationError::MissingParameter);
    }
    if params.len() > schema.len() {
        return Err(ValidationError::TooManyParameters);
    }

    let mut checked = Params::new();
    for (kind, &value) in schema.iter().zip(params) {
        checked
            .push(kind.check(value)?)
            .map_err(|_| ValidationError::TooManyParameters)?;
    }

    Ok(Command {
        target,
        opcode,
        params: checked,
    })
}

impl Command {
    /// Hold a color on `selector`, optionally for `duration` seconds.
    pub fn set_color(
        selector: &str,
        color: i32,
        duration: Option<i32>,
    ) -> Result<Self, ValidationError> {
        Self::colored(selector, Opcode::SetColor, color, duration)
    }

    /// Pulse a color on `selector`, optionally for `duration` seconds.
    pub fn pulse(selector: &str, color: i32, duration: Option<i32>) -> Result<Self, ValidationError> {
        Self::colored(selector, Opcode::Pulse, color, duration)
    }

    /// Rainbow sequence on `selector`, optionally for `duration` seconds.
    pub fn rainbow(selector: &str, duration: Option<i32>) -> Result<Self, ValidationError> {
        match duration {
            Some(t) => validate_command(Some(selector), Opcode::Rainbow, &[t]),
            None => validate_command(Some(selector), Opcode::Rainbow, &[]),
        }
    }

    /// Stop all servos and lights.
    #[must_use]
    pub fn stop() -> Self {
        Self::global(Opcode::StopAll)
    }

    /// Stop lights only.
    #[must_use]
    pub fn stop_lights() -> Self {
        Self::global(Opcode::StopLights)
    }

    /// Stop servos only.
    #[must_use]
    pub fn stop_servos() -> Self {
        Self::global(Opcode::StopServos)
    }

    /// Trigger the Leia sequence.
    #[must_use]
    pub fn leia() -> Self {
        Self::global(Opcode::Leia)
    }

    /// Periodic status query.
    #[must_use]
    pub fn status_query() -> Self {
        Self::global(Opcode::StatusQuery)
    }

    /// Target selector, `None` for global opcodes.
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<Target> {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Checked parameters in wire order.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[u32] {
        &self.params
    }

    fn colored(
        selector: &str,
        opcode: Opcode,
        color: i32,
        duration: Option<i32>,
    ) -> Result<Self, ValidationError> {
        match duration {
            Some(t) => validate_command(Some(selector), opcode, &[color, t]),
            None => validate_command(Some(selector), opcode, &[color]),
        }
    }

    fn global(opcode: Opcode) -> Self {
        Self {
            target: None,
            opcode,
            params: Params::new(),
        }
    }
}
