//! Line-based prompts for interactive agent creation

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::warn;

use crate::rl::HyperParameters;

/// Ask for a value, showing `default` in brackets
///
/// An empty line keeps the default, and so does input that does not parse.
pub fn prompt_or_default<T, R, W>(reader: &mut R, writer: &mut W, label: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    R: BufRead,
    W: Write,
{
    write!(writer, "{label} [{default}]: ").context("Failed to write prompt")?;
    writer.flush().context("Failed to flush prompt")?;

    let mut line = String::new();
    reader.read_line(&mut line).context("Failed to read input")?;
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return Ok(default);
    }

    match trimmed.parse() {
        Ok(value) => Ok(value),
        Err(_) => {
            warn!(field = label, input = trimmed, "unparseable input, keeping default");
            writeln!(writer, "  not a valid number, using {default}")
                .context("Failed to write prompt")?;
            Ok(default)
        }
    }
}

/// Walk through every hyperparameter, starting from `defaults`
pub fn prompt_hyperparameters<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    defaults: &HyperParameters,
) -> Result<HyperParameters> {
    Ok(HyperParameters {
        learning_rate: prompt_or_default(reader, writer, "Learning rate", defaults.learning_rate)?,
        discount_factor: prompt_or_default(
            reader,
            writer,
            "Discount factor",
            defaults.discount_factor,
        )?,
        exploration_rate: prompt_or_default(
            reader,
            writer,
            "Exploration rate",
            defaults.exploration_rate,
        )?,
        exploration_decay: prompt_or_default(
            reader,
            writer,
            "Exploration decay",
            defaults.exploration_decay,
        )?,
        min_exploration_rate: prompt_or_default(
            reader,
            writer,
            "Minimum exploration rate",
            defaults.min_exploration_rate,
        )?,
    })
}
