use crate::curve::Marker;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// One entry of the ordered roster. Only the address is consumed; it is
/// carried on markers for display and export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub address: String,
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load an account roster: one address per line. Blank lines and `#`
/// comments are skipped; order is preserved and duplicates are kept.
pub fn load_roster(path: &Path) -> Result<Vec<Account>, DataError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_roster(&contents))
}

fn parse_roster(contents: &str) -> Vec<Account> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| Account {
            address: line.to_string(),
        })
        .collect()
}

/// Shorten a long address for list display: first six and last four
/// characters around an ellipsis.
pub fn short_address(address: &str) -> String {
    const HEAD: usize = 6;
    const TAIL: usize = 4;

    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= HEAD + TAIL + 1 {
        return address.to_string();
    }

    let head: String = chars[..HEAD].iter().collect();
    let tail: String = chars[chars.len() - TAIL..].iter().collect();
    format!("{head}…{tail}")
}

#[derive(Serialize)]
struct ScheduleEntry<'a> {
    index: usize,
    address: &'a str,
    delay_secs: f64,
}

/// Write the current schedule as pretty JSON, one record per marker in
/// store order.
pub fn export_schedule(path: &Path, markers: &[Marker]) -> Result<(), DataError> {
    let entries: Vec<ScheduleEntry<'_>> = markers
        .iter()
        .map(|marker| ScheduleEntry {
            index: marker.index,
            address: &marker.address,
            delay_secs: marker.delay_secs,
        })
        .collect();

    let json = serde_json::to_string_pretty(&entries)?;
    std::fs::write(path, json)?;
    Ok(())
}
