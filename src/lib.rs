//! Scripted bullet-pattern playback.
//!
//! A document of per-frame bullet facts is parsed and validated into a
//! [`types::Schedule`]; a [`engine::PlaybackEngine`] then replays it one tick
//! at a time, and the [`player::Player`] drives that engine in a terminal.

pub mod config;
pub mod engine;
pub mod error;
pub mod player;
pub mod renderer;
pub mod source;
pub mod types;

pub use engine::{PlaybackEngine, PlaybackState, Tick};
pub use error::FtlError;
pub use source::{build_schedule, load_schedule, parse_document};
