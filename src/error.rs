//! Failure taxonomy for layout loading and pick routing.

use thiserror::Error;

use crate::domain::Coordinate;

/// Malformed layout, shelf registry, or configuration file.
///
/// Raised at startup only; the process must not serve requests after one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Layout grid is empty")]
    EmptyGrid,

    #[error("Layout grid is not rectangular: row {row} has {found} cells, expected {expected}")]
    NotRectangular {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unrecognised layout cell {cell:?} at ({row},{col})")]
    InvalidCell { row: usize, col: usize, cell: char },

    #[error("{what} at ({coord}) is outside the {rows}x{cols} layout")]
    OutOfBounds {
        what: String,
        coord: Coordinate,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while routing a single pick request.
///
/// Every variant aborts the request; no partial route is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickError {
    #[error("Unknown SKU: {0}")]
    UnknownSku(String),

    #[error("No walkable route between stop {from} and stop {to}")]
    UnreachableStop { from: String, to: String },

    #[error("No walkable path from ({start}) to ({goal})")]
    NoPathFound { start: Coordinate, goal: Coordinate },
}

impl PickError {
    /// Stable error kind used in API responses.
    ///
    /// ```
    /// use warehouse_picking::error::PickError;
    ///
    /// assert_eq!(PickError::UnknownSku("Z9".into()).kind(), "UnknownSKU");
    /// ```
    pub fn kind(&self) -> &'static str {
        match self {
            PickError::UnknownSku(_) => "UnknownSKU",
            PickError::UnreachableStop { .. } => "UnreachableStop",
            PickError::NoPathFound { .. } => "NoPathFound",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_names_both_stops() {
        let err = PickError::UnreachableStop {
            from: "depot".into(),
            to: "C3".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("depot"));
        assert!(msg.contains("C3"));
    }

    #[test]
    fn test_out_of_bounds_message() {
        let err = ConfigError::OutOfBounds {
            what: "Shelf A1".into(),
            coord: Coordinate::new(12, 3),
            rows: 10,
            cols: 20,
        };
        assert_eq!(err.to_string(), "Shelf A1 at (12,3) is outside the 10x20 layout");
    }
}
