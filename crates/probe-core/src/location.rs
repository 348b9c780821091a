//! Parsing of the `from` clause.

use crate::history::HistoryRef;
use crate::Result;

/// Location used when no `from` clause is given.
pub const DEFAULT_LOCATION: &str = "world";

/// What a `from` clause selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSelector {
    /// Reuse the probes of a measurement from the session history.
    History(HistoryRef),
    /// Plain location selectors passed to the API as they are.
    Magic(Vec<String>),
}

/// Parse a `from` clause.
///
/// A comma-separated list is always a list of plain selectors; only a single
/// token can be a history reference.
pub fn parse_from(from: &str) -> Result<LocationSelector> {
    let from = from.trim();
    if from.is_empty() {
        return Ok(LocationSelector::Magic(vec![DEFAULT_LOCATION.to_string()]));
    }

    let parts: Vec<&str> = from
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if let [single] = parts.as_slice() {
        if let Some(reference) = HistoryRef::parse(single)? {
            return Ok(LocationSelector::History(reference));
        }
    }

    Ok(LocationSelector::Magic(
        parts.into_iter().map(str::to_string).collect(),
    ))
}
