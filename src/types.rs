//! Shared boundary types for the FTL playback system.
//!
//! This module defines the two key data contracts:
//! - Schedule Builder → Engine: `Schedule` of `BulletEvent`s per frame
//! - Engine → Renderer (per tick): `LiveEntity` snapshots in a `Viewport`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Schedule Builder → Engine boundary
// ---------------------------------------------------------------------------

/// "Bullet `uid` is, as of this frame, at this position with this heading and speed."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletEvent {
    pub uid: i64,
    pub position: (f64, f64),
    pub direction_degrees: f64,
    pub speed: f64,
}

/// Frame number → events for that frame, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub frames: BTreeMap<u64, Vec<BulletEvent>>,
}

impl Schedule {
    /// Replace the event list for `frame`. A repeated frame number wins over
    /// any earlier one; lists are never merged.
    pub fn insert(&mut self, frame: u64, events: Vec<BulletEvent>) -> Option<Vec<BulletEvent>> {
        self.frames.insert(frame, events)
    }

    pub fn events_at(&self, frame: u64) -> Option<&[BulletEvent]> {
        self.frames.get(&frame).map(Vec::as_slice)
    }

    /// Highest scheduled frame number, or 0 for an empty schedule.
    pub fn last_frame(&self) -> u64 {
        self.frames.keys().next_back().copied().unwrap_or(0)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn event_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Engine → Renderer boundary
// ---------------------------------------------------------------------------

/// The play area as the renderer sees it: a `width` × `height` pixel square
/// with the simulation origin at its centre and the vertical axis inverted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub bullet_radius: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: 800.0,
            height: 800.0,
            bullet_radius: 5.0,
        }
    }
}

impl Viewport {
    /// Out-of-view band around the viewport; a bullet is retired only once it
    /// has fully left the visible area.
    pub fn margin(&self) -> f64 {
        2.0 * self.bullet_radius
    }

    pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (self.width / 2.0 + x, self.height / 2.0 - y)
    }

    /// Inclusive test against the viewport grown by `margin()` on all sides.
    /// NaN coordinates are never in bounds.
    pub fn contains_with_margin(&self, sx: f64, sy: f64) -> bool {
        let m = self.margin();
        (-m..=self.width + m).contains(&sx) && (-m..=self.height + m).contains(&sy)
    }

    pub fn contains(&self, sx: f64, sy: f64) -> bool {
        (0.0..=self.width).contains(&sx) && (0.0..=self.height).contains(&sy)
    }
}

/// Immutable per-tick snapshot of one live projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveEntity {
    pub uid: i64,
    /// Simulation space.
    pub x: f64,
    pub y: f64,
    /// Viewport space (centre origin, y down).
    pub screen_x: f64,
    pub screen_y: f64,
}
