//! Cue planning: every sound the engine can make, described as data.
//!
//! A `VoicePlan` is a complete recipe for one voice (waveform, frequency and
//! gain breakpoints, optional lowpass and wobble) which the WebAudio backend
//! renders into nodes. Keeping the recipes pure means the randomized parts
//! (melody notes, reschedule delays) run off a seedable rng and the envelope
//! invariants are checkable under plain `cargo test`.

use rand::Rng;
use rand::rngs::StdRng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Sawtooth,
}

/// How an `AudioParam` reaches `value` at `at_s` (seconds from voice start).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ramp {
    Set,
    Linear,
    Exponential,
}

#[derive(Clone, Copy, Debug)]
pub struct Breakpoint {
    pub at_s: f64,
    pub value: f64,
    pub ramp: Ramp,
}

/// Slow pitch modulation layered on a voice (the scream's metallic wobble).
#[derive(Clone, Copy, Debug)]
pub struct Wobble {
    pub rate_hz: f64,
    pub depth_hz: f64,
}

/// One voice, fully described. `stop_at_s == None` marks a sustained voice
/// that idles until `stop_all`; everything else self-terminates.
#[derive(Clone, Debug)]
pub struct VoicePlan {
    pub waveform: Waveform,
    pub freq: Vec<Breakpoint>,
    pub gain: Vec<Breakpoint>,
    pub lowpass_hz: Option<f64>,
    pub wobble: Option<Wobble>,
    pub stop_at_s: Option<f64>,
}

impl VoicePlan {
    pub fn is_one_shot(&self) -> bool {
        self.stop_at_s.is_some()
    }

    /// A one-shot envelope must fall monotonically to silence before the
    /// voice is torn down. Gain numbers themselves are tuning, not invariants.
    pub fn fades_to_silence(&self) -> bool {
        let Some(stop) = self.stop_at_s else {
            return false;
        };
        let Some(last) = self.gain.last() else {
            return false;
        };
        let monotone = self.gain.windows(2).all(|w| w[1].value < w[0].value);
        monotone && last.value <= 0.002 && last.at_s <= stop
    }
}

// --- Cue recipes -------------------------------------------------------------

/// Tuning constants for every cue. Numbers carried from the prototype; only
/// the envelope shapes are load-bearing.
#[derive(Clone, Copy, Debug)]
pub struct AudioConfig {
    pub master_gain: f64,
    pub drone_hz: f64,
    pub drone_gain: f64,
    pub drone_lowpass_hz: f64,
    pub heartbeat_gain: f64,
    pub scream_gain: f64,
    pub collect_gain: f64,
    pub melody_gain: f64,
    /// Random reschedule window for the melodic voice, ms.
    pub melody_delay_ms: (f64, f64),
    /// Enable the delay-feedback spatial blur on the mix bus.
    pub blur: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_gain: 1.0,
            drone_hz: 55.0,
            drone_gain: 0.1,
            drone_lowpass_hz: 150.0,
            heartbeat_gain: 0.5,
            scream_gain: 0.2,
            collect_gain: 0.1,
            melody_gain: 0.06,
            melody_delay_ms: (2_000.0, 5_000.0),
            blur: false,
        }
    }
}

/// A-minor low register; the melodic voice wanders over these.
const MELODY_HZ: [f64; 7] = [110.0, 130.81, 146.83, 164.81, 174.61, 196.0, 220.0];

/// Deep sustained drone; idles until `stop_all`.
pub fn ambience_drone(cfg: &AudioConfig) -> VoicePlan {
    VoicePlan {
        waveform: Waveform::Sawtooth,
        freq: vec![Breakpoint {
            at_s: 0.0,
            value: cfg.drone_hz,
            ramp: Ramp::Set,
        }],
        gain: vec![Breakpoint {
            at_s: 0.0,
            value: cfg.drone_gain,
            ramp: Ramp::Set,
        }],
        lowpass_hz: Some(cfg.drone_lowpass_hz),
        wobble: None,
        stop_at_s: None,
    }
}

/// Short percussive thump, pitch sweeping down.
pub fn heartbeat(cfg: &AudioConfig) -> VoicePlan {
    VoicePlan {
        waveform: Waveform::Sine,
        freq: vec![
            Breakpoint {
                at_s: 0.0,
                value: 60.0,
                ramp: Ramp::Set,
            },
            Breakpoint {
                at_s: 0.1,
                value: 10.0,
                ramp: Ramp::Exponential,
            },
        ],
        gain: vec![
            Breakpoint {
                at_s: 0.0,
                value: cfg.heartbeat_gain,
                ramp: Ramp::Set,
            },
            Breakpoint {
                at_s: 0.15,
                value: 0.001,
                ramp: Ramp::Exponential,
            },
        ],
        lowpass_hz: None,
        wobble: None,
        stop_at_s: Some(0.2),
    }
}

/// Metallic upward scratch with a slow pitch wobble.
pub fn scream(cfg: &AudioConfig) -> VoicePlan {
    VoicePlan {
        waveform: Waveform::Sawtooth,
        freq: vec![
            Breakpoint {
                at_s: 0.0,
                value: 100.0,
                ramp: Ramp::Set,
            },
            Breakpoint {
                at_s: 0.4,
                value: 800.0,
                ramp: Ramp::Linear,
            },
        ],
        gain: vec![
            Breakpoint {
                at_s: 0.0,
                value: cfg.scream_gain,
                ramp: Ramp::Set,
            },
            Breakpoint {
                at_s: 0.8,
                value: 0.0,
                ramp: Ramp::Linear,
            },
        ],
        lowpass_hz: None,
        wobble: Some(Wobble {
            rate_hz: 8.0,
            depth_hz: 30.0,
        }),
        stop_at_s: Some(1.0),
    }
}

/// Bright pickup confirmation.
pub fn collect(cfg: &AudioConfig) -> VoicePlan {
    VoicePlan {
        waveform: Waveform::Sine,
        freq: vec![
            Breakpoint {
                at_s: 0.0,
                value: 600.0,
                ramp: Ramp::Set,
            },
            Breakpoint {
                at_s: 0.1,
                value: 1_200.0,
                ramp: Ramp::Linear,
            },
        ],
        gain: vec![
            Breakpoint {
                at_s: 0.0,
                value: cfg.collect_gain,
                ramp: Ramp::Set,
            },
            Breakpoint {
                at_s: 0.2,
                value: 0.0,
                ramp: Ramp::Linear,
            },
        ],
        lowpass_hz: None,
        wobble: None,
        stop_at_s: Some(0.2),
    }
}

fn melody_note(cfg: &AudioConfig, rng: &mut StdRng) -> VoicePlan {
    let hz = MELODY_HZ[rng.gen_range(0..MELODY_HZ.len())];
    VoicePlan {
        waveform: Waveform::Sine,
        freq: vec![Breakpoint {
            at_s: 0.0,
            value: hz,
            ramp: Ramp::Set,
        }],
        gain: vec![
            Breakpoint {
                at_s: 0.0,
                value: cfg.melody_gain,
                ramp: Ramp::Set,
            },
            Breakpoint {
                at_s: 1.8,
                value: 0.001,
                ramp: Ramp::Exponential,
            },
        ],
        lowpass_hz: None,
        wobble: None,
        stop_at_s: Some(2.0),
    }
}

// --- Melodic loop ------------------------------------------------------------

/// The self-rescheduling melodic voice behind the ambience. Not a fixed-length
/// cue: after every note it picks a new random delay, and it must die as a
/// unit on `stop_all`. Cancellation is just clearing the pending due time;
/// the loop is driven from the frame tick, so no callback can outlive it.
#[derive(Debug, Default)]
pub struct MelodySequencer {
    next_due_ms: Option<f64>,
}

impl MelodySequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> bool {
        self.next_due_ms.is_some()
    }

    pub fn arm(&mut self, now_ms: f64, cfg: &AudioConfig, rng: &mut StdRng) {
        let (lo, hi) = cfg.melody_delay_ms;
        self.next_due_ms = Some(now_ms + rng.gen_range(lo..hi));
    }

    pub fn cancel(&mut self) {
        self.next_due_ms = None;
    }

    /// Returns the note to play when the delay has elapsed, rescheduling
    /// itself for the next one.
    pub fn tick(&mut self, now_ms: f64, cfg: &AudioConfig, rng: &mut StdRng) -> Option<VoicePlan> {
        let due = self.next_due_ms?;
        if now_ms < due {
            return None;
        }
        self.arm(now_ms, cfg, rng);
        Some(melody_note(cfg, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn one_shot_envelopes_fade_to_silence() {
        let cfg = AudioConfig::default();
        for plan in [heartbeat(&cfg), scream(&cfg), collect(&cfg)] {
            assert!(plan.is_one_shot());
            assert!(plan.fades_to_silence(), "{plan:?}");
        }
    }

    #[test]
    fn drone_is_sustained() {
        let cfg = AudioConfig::default();
        let drone = ambience_drone(&cfg);
        assert!(!drone.is_one_shot());
        assert!(!drone.fades_to_silence());
    }

    #[test]
    fn melody_reschedules_within_window() {
        let cfg = AudioConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut seq = MelodySequencer::new();
        seq.arm(0.0, &cfg, &mut rng);
        let mut fired = 0;
        let mut last_fire_ms = 0.0;
        let mut now = 0.0;
        while fired < 10 {
            now += 16.0;
            if let Some(note) = seq.tick(now, &cfg, &mut rng) {
                let gap = now - last_fire_ms;
                assert!(
                    gap >= 2_000.0 && gap <= 5_000.0 + 16.0,
                    "reschedule gap {gap} outside window"
                );
                assert!(note.fades_to_silence());
                last_fire_ms = now;
                fired += 1;
            }
            assert!(now < 60_000.0, "melody loop stalled");
        }
    }

    #[test]
    fn cancelled_melody_never_fires() {
        let cfg = AudioConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut seq = MelodySequencer::new();
        seq.arm(0.0, &cfg, &mut rng);
        seq.cancel();
        assert!(!seq.pending());
        for i in 1..=2_000 {
            assert!(seq.tick(i as f64 * 16.0, &cfg, &mut rng).is_none());
        }
    }
}
