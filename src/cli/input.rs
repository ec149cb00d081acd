//! Collecting the identifiers to watch

use crate::models::Identifier;
use crate::Result;
use dialoguer::Input;

/// Split whitespace-separated input into identifiers, dropping duplicates
/// (first occurrence wins)
pub fn parse_identifiers<S: AsRef<str>>(inputs: &[S]) -> Vec<Identifier> {
    let mut ids: Vec<Identifier> = Vec::new();
    for token in inputs.iter().flat_map(|s| s.as_ref().split_whitespace()) {
        if !ids.iter().any(|id| id == token) {
            ids.push(token.to_string());
        }
    }
    ids
}

/// Use the identifiers given on the command line, or ask for them
pub fn collect_identifiers(args: &[String]) -> Result<Vec<Identifier>> {
    if !args.is_empty() {
        return Ok(parse_identifiers(args));
    }

    let line: String = Input::new()
        .with_prompt("Enter tracking ids separated by space")
        .allow_empty(true)
        .interact_text()?;

    Ok(parse_identifiers(&[line]))
}
