//! Procedural audio: ambience, heartbeat, scream and collect cues synthesized
//! on demand. Split into pure cue planning (`cues`) and a thin WebAudio
//! backend (`engine`); the haunt scheduler never reaches in here, games
//! forward its events.

pub mod cues;
mod engine;

pub use cues::AudioConfig;
pub use engine::AudioEngine;
