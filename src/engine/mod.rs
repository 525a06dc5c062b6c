//! Engine — the playback state machine.
//!
//! Owns the live projectile registry and advances it one discrete tick per
//! `step()`: scheduled events are applied, every projectile moves one unit
//! of simulated time, and projectiles that leave the viewport (plus margin)
//! are retired.
//!
//! The engine never deals with terminals, wall-clock time, or pacing.

pub mod projectile;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::{info, trace};

use crate::types::{LiveEntity, Schedule, Viewport};
use projectile::ProjectileEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Scripted frames remain.
    Running,
    /// Every scripted frame has been applied; projectiles are still live.
    Draining,
    /// Nothing scripted and nothing live. Terminal.
    Finished,
}

/// The outcome of one `step()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Survivors of this tick, ordered by `uid`.
    pub entities: Vec<LiveEntity>,
    pub finished: bool,
}

pub struct PlaybackEngine {
    schedule: Schedule,
    registry: BTreeMap<i64, ProjectileEntity>,
    cursor: u64,
    last_frame: u64,
    viewport: Viewport,
    state: PlaybackState,
}

impl PlaybackEngine {
    pub fn new(schedule: Schedule) -> Self {
        Self::with_viewport(schedule, Viewport::default())
    }

    pub fn with_viewport(schedule: Schedule, viewport: Viewport) -> Self {
        let last_frame = schedule.last_frame();
        Self {
            schedule,
            registry: BTreeMap::new(),
            cursor: 0,
            last_frame,
            viewport,
            state: PlaybackState::Running,
        }
    }

    /// Advance exactly one tick.
    ///
    /// Once finished, further calls change nothing and report an empty field.
    pub fn step(&mut self) -> Tick {
        if self.state == PlaybackState::Finished {
            return Tick {
                entities: Vec::new(),
                finished: true,
            };
        }

        self.apply_scheduled_events();
        let entities = self.advance_and_cull();

        self.cursor += 1;
        self.state = if self.cursor <= self.last_frame {
            PlaybackState::Running
        } else if self.registry.is_empty() {
            PlaybackState::Finished
        } else {
            PlaybackState::Draining
        };

        let finished = self.state == PlaybackState::Finished;
        if finished {
            info!(ticks = self.cursor, "playback finished");
        }

        Tick { entities, finished }
    }

    /// Create-or-update, strictly in document order.
    fn apply_scheduled_events(&mut self) {
        let Some(events) = self.schedule.events_at(self.cursor) else {
            return;
        };

        for event in events {
            match self.registry.entry(event.uid) {
                Entry::Vacant(slot) => {
                    trace!(uid = event.uid, frame = self.cursor, "projectile created");
                    slot.insert(ProjectileEntity::from_event(event));
                }
                Entry::Occupied(mut slot) => {
                    trace!(uid = event.uid, frame = self.cursor, "projectile updated");
                    slot.get_mut().overwrite(event);
                }
            }
        }
    }

    fn advance_and_cull(&mut self) -> Vec<LiveEntity> {
        let viewport = self.viewport;
        let frame = self.cursor;
        let mut live = Vec::with_capacity(self.registry.len());

        self.registry.retain(|&uid, projectile| {
            projectile.advance(1.0);
            let snapshot = projectile.snapshot(&viewport);
            if viewport.contains_with_margin(snapshot.screen_x, snapshot.screen_y) {
                live.push(snapshot);
                true
            } else {
                trace!(uid, frame, "projectile left the play area");
                false
            }
        });

        live
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == PlaybackState::Finished
    }

    /// The frame number the next `step()` will apply.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn last_frame(&self) -> u64 {
        self.last_frame
    }

    pub fn live_count(&self) -> usize {
        self.registry.len()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Read-only view of the registry, ordered by `uid`.
    pub fn entities(&self) -> Vec<LiveEntity> {
        self.registry
            .values()
            .map(|p| p.snapshot(&self.viewport))
            .collect()
    }
}
