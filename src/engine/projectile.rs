use std::f64::consts::TAU;

use crate::types::{BulletEvent, LiveEntity, Viewport};

/// A live projectile, keyed by `uid` in the engine's registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileEntity {
    pub uid: i64,
    pub x: f64,
    pub y: f64,
    /// Radians in `[0, 2π)`; 0 points along +x, counter-clockwise positive.
    pub heading: f64,
    pub speed: f64,
}

impl ProjectileEntity {
    pub fn from_event(event: &BulletEvent) -> Self {
        let mut entity = ProjectileEntity {
            uid: event.uid,
            x: 0.0,
            y: 0.0,
            heading: 0.0,
            speed: 0.0,
        };
        entity.overwrite(event);
        entity
    }

    /// Replace position, heading and speed with the event's values. Nothing
    /// of the previous state is kept.
    pub fn overwrite(&mut self, event: &BulletEvent) {
        let (x, y) = event.position;
        self.x = x;
        self.y = y;
        self.heading = heading_from_degrees(event.direction_degrees);
        self.speed = event.speed;
    }

    /// Move along the heading for `dt` units of simulated time.
    pub fn advance(&mut self, dt: f64) {
        self.x += self.speed * dt * self.heading.cos();
        self.y += self.speed * dt * self.heading.sin();
    }

    pub fn snapshot(&self, viewport: &Viewport) -> LiveEntity {
        let (screen_x, screen_y) = viewport.to_screen(self.x, self.y);
        LiveEntity {
            uid: self.uid,
            x: self.x,
            y: self.y,
            screen_x,
            screen_y,
        }
    }
}

/// Degrees to radians, normalized into `[0, 2π)`.
pub fn heading_from_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round tiny negative inputs up to exactly 360.
    let wrapped = if wrapped >= 360.0 { 0.0 } else { wrapped };
    let radians = wrapped.to_radians();
    if radians >= TAU { 0.0 } else { radians }
}
