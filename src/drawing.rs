//! Drawing events — the unit of collaboration.
//!
//! DESIGN
//! ======
//! A `DrawingEvent` is one finished stroke, shape, text placement, or clear
//! action. Events are append-only: the server validates them once on the
//! way in and never rewrites them afterwards. Field names on the wire are
//! camelCase to match what browser clients send.

use serde::{Deserialize, Serialize};

use crate::message::ErrorCode;

/// Layer id used by `clear` events that wipe every layer.
pub const ALL_LAYERS: &str = "all";

// =============================================================================
// TYPES
// =============================================================================

/// What a drawing event does to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Draw,
    Erase,
    Shape,
    Text,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A single drawing action with its geometry and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub tool: String,
    pub points: Vec<Point>,
    pub color: String,
    pub size: f64,
    /// Percentage, `0..=100`.
    pub opacity: f64,
    pub layer_id: String,
    pub user_id: i64,
    /// Milliseconds since Unix epoch, as stamped by the client.
    pub timestamp: i64,
}

/// The `data` document of a board: its ordered event log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardData {
    #[serde(default)]
    pub events: Vec<DrawingEvent>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DrawingError {
    #[error("{0:?} event requires at least one point")]
    EmptyPoints(EventKind),
    #[error("point {index} is not a finite coordinate")]
    NonFinitePoint { index: usize },
    #[error("size must be a non-negative number, got {0}")]
    InvalidSize(f64),
    #[error("opacity must be within 0..=100, got {0}")]
    InvalidOpacity(f64),
}

impl ErrorCode for DrawingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPoints(_) => "E_EMPTY_POINTS",
            Self::NonFinitePoint { .. } => "E_BAD_POINT",
            Self::InvalidSize(_) => "E_BAD_SIZE",
            Self::InvalidOpacity(_) => "E_BAD_OPACITY",
        }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

impl DrawingEvent {
    /// Check the structural invariants of an incoming event.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: a non-clear event without
    /// points, a non-finite coordinate, a negative size, or an opacity
    /// outside `0..=100`.
    pub fn validate(&self) -> Result<(), DrawingError> {
        if self.points.is_empty() && self.kind != EventKind::Clear {
            return Err(DrawingError::EmptyPoints(self.kind));
        }
        if let Some(index) = self
            .points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(DrawingError::NonFinitePoint { index });
        }
        if !self.size.is_finite() || self.size < 0.0 {
            return Err(DrawingError::InvalidSize(self.size));
        }
        if !(0.0..=100.0).contains(&self.opacity) {
            return Err(DrawingError::InvalidOpacity(self.opacity));
        }
        Ok(())
    }

    /// Whether this is a clear that applies to every layer.
    #[must_use]
    pub fn clears_all_layers(&self) -> bool {
        self.kind == EventKind::Clear && self.layer_id == ALL_LAYERS
    }
}

impl BoardData {
    /// Validate every event in the log.
    ///
    /// # Errors
    ///
    /// Returns the position and error of the first invalid event.
    pub fn validate(&self) -> Result<(), (usize, DrawingError)> {
        for (index, event) in self.events.iter().enumerate() {
            event.validate().map_err(|e| (index, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "drawing_test.rs"]
mod tests;
