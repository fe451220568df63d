//! WebAudio rendering of `VoicePlan`s.
//!
//! Everything routes through one master gain (the mix bus), optionally through
//! a delay-feedback blur that stands in for room reverberation. If the
//! `AudioContext` cannot be constructed (headless test, browser without
//! audio, native target), every call silently no-ops; that is the only
//! defensive branch in the crate. One-shot voices are scheduled with their
//! stop time up front and never tracked; only sustained drones are kept so
//! `stop_all` can tear them down.

use rand::rngs::StdRng;
use web_sys::{
    AudioContext, AudioContextState, AudioParam, BiquadFilterType, GainNode, OscillatorNode,
    OscillatorType,
};

use super::cues::{self, AudioConfig, Breakpoint, MelodySequencer, Ramp, VoicePlan, Waveform};

struct SustainedVoice {
    osc: OscillatorNode,
    gain: GainNode,
}

pub struct AudioEngine {
    cfg: AudioConfig,
    ctx: Option<AudioContext>,
    master: Option<GainNode>,
    sustained: Vec<SustainedVoice>,
    melody: MelodySequencer,
}

impl AudioEngine {
    pub fn new(cfg: AudioConfig) -> Self {
        let ctx = acquire_context();
        let master = ctx.as_ref().and_then(|c| build_bus(c, &cfg));
        Self {
            // Without a bus there is nothing to render into; drop the context
            // so every path takes the silent branch.
            ctx: if master.is_some() { ctx } else { None },
            master,
            cfg,
            sustained: Vec::new(),
            melody: MelodySequencer::new(),
        }
    }

    /// Autoplay policies suspend fresh contexts until a user gesture; the
    /// host calls this from its start button.
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }
    }

    /// Start the sustained drone and arm the melodic loop. The loop is armed
    /// even without a context: planning is pure, only synthesis is skipped.
    pub fn play_ambience(&mut self, now_ms: f64, rng: &mut StdRng) {
        if let Some(voice) = self.render(&cues::ambience_drone(&self.cfg)) {
            self.sustained.push(voice);
        }
        self.melody.arm(now_ms, &self.cfg, rng);
    }

    pub fn play_heartbeat(&self) {
        self.render(&cues::heartbeat(&self.cfg));
    }

    pub fn play_scream(&self) {
        self.render(&cues::scream(&self.cfg));
    }

    pub fn play_collect(&self) {
        self.render(&cues::collect(&self.cfg));
    }

    /// Per-frame drive for the melodic loop.
    pub fn tick(&mut self, now_ms: f64, rng: &mut StdRng) {
        if let Some(note) = self.melody.tick(now_ms, &self.cfg, rng) {
            self.render(&note);
        }
    }

    /// Terminate every sustained voice and cancel the melodic rescheduler.
    /// One-shots in flight finish on their own envelopes. Idempotent.
    pub fn stop_all(&mut self) {
        self.melody.cancel();
        for voice in self.sustained.drain(..) {
            if let Some(ctx) = &self.ctx {
                let t = ctx.current_time();
                let g = voice.gain.gain();
                let _ = g.cancel_scheduled_values(t);
                let _ = g.set_value_at_time(g.value(), t);
                let _ = g.linear_ramp_to_value_at_time(0.0001, t + 0.05);
                let _ = voice.osc.stop_with_when(t + 0.06);
            }
        }
    }

    pub fn sustained_voices(&self) -> usize {
        self.sustained.len()
    }

    pub fn melody_pending(&self) -> bool {
        self.melody.pending()
    }

    /// Build the node graph for one plan. Returns the handle only for
    /// sustained voices; one-shots already carry their stop time.
    fn render(&self, plan: &VoicePlan) -> Option<SustainedVoice> {
        let ctx = self.ctx.as_ref()?;
        let master = self.master.as_ref()?;
        let t0 = ctx.current_time();

        let osc = ctx.create_oscillator().ok()?;
        osc.set_type(match plan.waveform {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
        });
        let gain = ctx.create_gain().ok()?;
        apply(&osc.frequency(), &plan.freq, t0);
        apply(&gain.gain(), &plan.gain, t0);

        if let Some(hz) = plan.lowpass_hz {
            let filter = ctx.create_biquad_filter().ok()?;
            filter.set_type(BiquadFilterType::Lowpass);
            filter.frequency().set_value(hz as f32);
            osc.connect_with_audio_node(&filter).ok()?;
            filter.connect_with_audio_node(&gain).ok()?;
        } else {
            osc.connect_with_audio_node(&gain).ok()?;
        }
        gain.connect_with_audio_node(master).ok()?;

        if let Some(w) = plan.wobble {
            let mod_osc = ctx.create_oscillator().ok()?;
            mod_osc.frequency().set_value(w.rate_hz as f32);
            let mod_gain = ctx.create_gain().ok()?;
            mod_gain.gain().set_value(w.depth_hz as f32);
            mod_osc.connect_with_audio_node(&mod_gain).ok()?;
            mod_gain.connect_with_audio_param(&osc.frequency()).ok()?;
            mod_osc.start_with_when(t0).ok()?;
            if let Some(stop) = plan.stop_at_s {
                mod_osc.stop_with_when(t0 + stop).ok()?;
            }
        }

        osc.start_with_when(t0).ok()?;
        match plan.stop_at_s {
            Some(stop) => {
                osc.stop_with_when(t0 + stop).ok()?;
                None
            }
            None => Some(SustainedVoice { osc, gain }),
        }
    }
}

fn apply(param: &AudioParam, points: &[Breakpoint], t0: f64) {
    for bp in points {
        let v = bp.value as f32;
        let t = t0 + bp.at_s;
        let _ = match bp.ramp {
            Ramp::Set => param.set_value_at_time(v, t),
            Ramp::Linear => param.linear_ramp_to_value_at_time(v, t),
            Ramp::Exponential => param.exponential_ramp_to_value_at_time(v, t),
        };
    }
}

/// Master gain into the destination, with the optional blur send:
/// master → delay → wet → destination, delay feeding back into itself.
fn build_bus(ctx: &AudioContext, cfg: &AudioConfig) -> Option<GainNode> {
    let master = ctx.create_gain().ok()?;
    master.gain().set_value(cfg.master_gain as f32);
    master.connect_with_audio_node(&ctx.destination()).ok()?;
    if cfg.blur {
        let delay = ctx.create_delay().ok()?;
        delay.delay_time().set_value(0.21);
        let feedback = ctx.create_gain().ok()?;
        feedback.gain().set_value(0.35);
        let wet = ctx.create_gain().ok()?;
        wet.gain().set_value(0.25);
        master.connect_with_audio_node(&delay).ok()?;
        delay.connect_with_audio_node(&feedback).ok()?;
        feedback.connect_with_audio_node(&delay).ok()?;
        delay.connect_with_audio_node(&wet).ok()?;
        wet.connect_with_audio_node(&ctx.destination()).ok()?;
    }
    Some(master)
}

#[cfg(target_arch = "wasm32")]
fn acquire_context() -> Option<AudioContext> {
    AudioContext::new().ok()
}

#[cfg(not(target_arch = "wasm32"))]
fn acquire_context() -> Option<AudioContext> {
    None
}
