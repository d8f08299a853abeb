//! Builder pattern API for constructing commands.
//!
//! Raw inputs are collected first and validated once, in [`CommandBuilder::build`].
//!
//! # Example
//!
//! ```
//! use holo_proto::{CommandBuilder, Opcode, Serialize};
//!
//! let mut buf = [0u8; 32];
//! let len = CommandBuilder::new(Opcode::SetColor)
//!     .target("t")
//!     .param(4)
//!     .duration(Some(8))
//!     .build()
//!     .unwrap()
//!     .serialize(&mut buf)
//!     .unwrap();
//! assert_eq!(&buf[..len], b"TO64|8\n");
//! ```

use heapless::Vec;

use crate::command::{validate_command, Command, ValidationError};
use crate::types::{Color, Opcode, MAX_PARAMS};

/// Fluent builder for a single [`Command`].
#[derive(Debug, Clone)]
pub struct CommandBuilder<'a> {
    opcode: Opcode,
    selector: Option<&'a str>,
    params: Vec<i32, MAX_PARAMS>,
    overflow: bool,
}

impl<'a> CommandBuilder<'a> {
    /// Start building a command for `opcode`.
    #[must_use]
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            selector: None,
            params: Vec::new(),
            overflow: false,
        }
    }

    /// Set the target selector (`F`, `R`, `T`, `A`, any case).
    #[must_use]
    pub fn target(mut self, selector: &'a str) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Append a raw positional parameter.
    #[must_use]
    pub fn param(mut self, value: i32) -> Self {
        if self.params.push(value).is_err() {
            self.overflow = true;
        }
        self
    }

    /// Append a named color.
    #[must_use]
    pub fn color(self, color: Color) -> Self {
        self.param(color.code())
    }

    /// Append a duration if one is given.
    #[must_use]
    pub fn duration(self, seconds: Option<i32>) -> Self {
        match seconds {
            Some(t) => self.param(t),
            None => self,
        }
    }

    /// Validate the collected input.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn build(self) -> Result<Command, ValidationError> {
        if self.overflow {
            return Err(ValidationError::TooManyParameters);
        }
        validate_command(self.selector, self.opcode, &self.params)
    }
}
