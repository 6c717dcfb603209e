//! Compiler flags applied to every translation unit of a project.
//!
//! Flags are kept only in tokenized form. The flat string the user edits
//! is parsed once on assignment and rebuilt with shell quoting on save.

use crate::error::{CdkError, CdkResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerFlagSet {
    args: Vec<String>,
}

impl CompilerFlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize a shell-style flag string.
    pub fn parse(flags: &str) -> CdkResult<Self> {
        match shlex::split(flags) {
            Some(args) => Ok(Self { args }),
            None => Err(CdkError::FlagParse {
                flags: flags.to_string(),
                reason: "unbalanced quotes or trailing escape".to_string(),
            }),
        }
    }

    /// Replace the flag set from a string.
    ///
    /// On a parse failure the current flags are left untouched.
    pub fn set(&mut self, flags: &str) -> CdkResult<bool> {
        let parsed = Self::parse(flags)?;
        if parsed == *self {
            return Ok(false);
        }
        *self = parsed;
        Ok(true)
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn clear(&mut self) {
        self.args.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Flat, shell-quoted form for persistence.
    pub fn to_command_line(&self) -> String {
        shlex::try_join(self.args.iter().map(String::as_str))
            .unwrap_or_else(|_| self.args.join(" "))
    }
}
