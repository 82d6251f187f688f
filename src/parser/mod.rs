// View DSL Parser Module

pub mod ast;
pub mod command;
pub mod lexer;
pub mod pipeline;

use anyhow::{anyhow, Result};

// Public API re-exports
pub use ast::{Arrange, Command, ViewSpec};
pub use pipeline::parse_view_spec;

/// Parse a view description, reporting where parsing stopped on failure.
pub fn parse_view(input: &str) -> Result<ViewSpec> {
    match parse_view_spec(input) {
        Ok((_, spec)) => Ok(spec),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(anyhow!(
            "Parse error at '{}' ({:?})",
            e.input.trim(),
            e.code
        )),
        Err(nom::Err::Incomplete(_)) => Err(anyhow!("Parse error: incomplete view description")),
    }
}
