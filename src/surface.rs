//! Surface replay — turns a board's event log into what a canvas shows.
//!
//! DESIGN
//! ======
//! Replay mirrors the browser canvas: paint-like events add a stroke to
//! their layer, erasers add a destination-out stroke on top, and `clear`
//! drops strokes (every layer for `layerId == "all"`, otherwise only the
//! named layer). Replay never touches the log itself; a clear stays in the
//! log as an ordinary entry.

use serde::Serialize;

use crate::drawing::{DrawingEvent, EventKind, Point};

/// Stroke color used for erasers; the compositing op is what removes pixels.
const ERASER_COLOR: &str = "#FFFFFF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Composite {
    SourceOver,
    DestinationOut,
}

/// One visible mark on the surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub kind: EventKind,
    pub tool: String,
    pub layer_id: String,
    pub points: Vec<Point>,
    pub color: String,
    pub width: f64,
    /// Canvas alpha, `0.0..=1.0`.
    pub alpha: f64,
    pub composite: Composite,
    pub user_id: i64,
}

/// Replayed drawing surface, strokes in paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Surface {
    pub strokes: Vec<Stroke>,
    /// Number of log entries consumed, including clears.
    pub applied: usize,
}

impl Surface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay a whole log from an empty surface.
    #[must_use]
    pub fn replay<'a>(events: impl IntoIterator<Item = &'a DrawingEvent>) -> Self {
        let mut surface = Self::new();
        for event in events {
            surface.apply(event);
        }
        surface
    }

    /// Apply one event on top of the current surface.
    pub fn apply(&mut self, event: &DrawingEvent) {
        self.applied += 1;
        match event.kind {
            EventKind::Clear if event.clears_all_layers() => self.strokes.clear(),
            EventKind::Clear => self.strokes.retain(|s| s.layer_id != event.layer_id),
            EventKind::Erase => self.strokes.push(Stroke {
                kind: event.kind,
                tool: event.tool.clone(),
                layer_id: event.layer_id.clone(),
                points: event.points.clone(),
                color: ERASER_COLOR.to_owned(),
                width: event.size,
                alpha: 1.0,
                composite: Composite::DestinationOut,
                user_id: event.user_id,
            }),
            EventKind::Draw | EventKind::Shape | EventKind::Text => self.strokes.push(Stroke {
                kind: event.kind,
                tool: event.tool.clone(),
                layer_id: event.layer_id.clone(),
                points: event.points.clone(),
                color: event.color.clone(),
                width: event.size,
                alpha: (event.opacity / 100.0).clamp(0.0, 1.0),
                composite: Composite::SourceOver,
                user_id: event.user_id,
            }),
        }
    }

    /// Strokes on one layer, in paint order.
    pub fn layer<'a>(&'a self, layer_id: &'a str) -> impl Iterator<Item = &'a Stroke> + 'a {
        self.strokes.iter().filter(move |s| s.layer_id == layer_id)
    }
}

#[cfg(test)]
#[path = "surface_test.rs"]
mod tests;
