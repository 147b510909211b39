//! Output formatting for CLI responses

use anyhow::Error;
use colored::Colorize;
use serde_json::json;

use crate::demo::Heat;
use crate::error::CliError;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": format!("{error:#}"),
            "type": error_type_name(error),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".yellow(), cause);
    }
}

fn error_type_name(error: &Error) -> &'static str {
    match error.downcast_ref::<CliError>() {
        Some(CliError::InvalidConfiguration(_)) => "InvalidConfiguration",
        Some(CliError::TrackCommand(_)) => "TrackCommand",
        Some(CliError::IoError(_)) => "IoError",
        Some(CliError::JsonError(_)) => "JsonError",
        Some(CliError::YamlError(_)) => "YamlError",
        None => "Other",
    }
}

/// Print a demo heat: the serial transcript, then the two display boards.
pub fn print_heat(heat: &Heat, json: bool, show_displays: bool) {
    if json {
        let output = json!({
            "success": true,
            "transcript": heat.transcript,
            "times": heat.times,
            "positions": heat.positions,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format heat as JSON: {e}"),
        }
        return;
    }

    for line in &heat.transcript {
        println!("{line}");
    }
    if show_displays {
        println!("{} {}", "times:    ".bold(), board(&heat.times));
        println!("{} {}", "positions:".bold(), board(&heat.positions));
    }
}

fn board(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| format!("[{cell:>4}]"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_pads_cells() {
        let cells = vec!["3.12".to_string(), "dnF".to_string(), String::new()];
        assert_eq!(board(&cells), "[3.12] [ dnF] [    ]");
    }

    #[test]
    fn error_type_sees_through_context() {
        let err = anyhow::Error::from(CliError::TrackCommand("go".to_string())).context("reading stdin");
        assert_eq!(error_type_name(&err), "TrackCommand");
    }
}
