//! The manor: 2D side-scrolling variant.
//!
//! The host pans a 4000px world with CSS transforms and draws the flashlight
//! overlay; this object owns everything behavioral. Each frame the host calls
//! `tick` with the clock, cursor, camera and viewport, then reads the outputs
//! back. Aiming the beam at the Lady drains sanity; hiding in the dark
//! restores it slowly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wasm_bindgen::prelude::*;

use crate::audio::{AudioConfig, AudioEngine};
use crate::haunt::{HauntConfig, HauntEvent, HauntInput, HauntScheduler, Placement};
use crate::{GamePhase, log, quiz};

const MIND_BROKEN: &str = "Your mind has broken.";

/// Tuning constants, carried from the prototype unchanged. The drain/regen
/// rates are per tick (one animation frame), not per second.
#[derive(Clone, Copy, Debug)]
pub struct ManorConfig {
    pub world_width: f64,
    pub doll_margin: f64,
    pub base_dolls: u32,
    pub drain_per_tick: f64,
    pub regen_hidden: f64,
    pub regen_idle: f64,
    pub aim_radius: f64,
    pub quiz_penalty: f64,
    pub beam_radius: f64,
    pub beam_flicker_radius: f64,
    pub beam_flicker_chance: f64,
    pub lady_screen_halfwidth: f64,
}

impl Default for ManorConfig {
    fn default() -> Self {
        Self {
            world_width: 4_000.0,
            doll_margin: 200.0,
            base_dolls: 2,
            drain_per_tick: 1.5,
            regen_hidden: 0.05,
            regen_idle: 0.02,
            aim_radius: 400.0,
            quiz_penalty: 20.0,
            beam_radius: 250.0,
            beam_flicker_radius: 240.0,
            beam_flicker_chance: 0.05,
            lady_screen_halfwidth: 60.0,
        }
    }
}

fn haunt_config(cfg: &ManorConfig) -> HauntConfig {
    HauntConfig {
        delay_range_ms: (3_000.0, 8_000.0),
        dwell_ms: Some(4_000.0),
        placement: Placement::NearView {
            spread: 500.0,
            min_x: 100.0,
            max_x: cfg.world_width - 200.0,
        },
        cadence_tiers: [(150.0, 250.0), (400.0, 400.0), (800.0, 1_000.0)],
        extra_scream_chance: 0.03,
        pursuit: None,
    }
}

#[wasm_bindgen]
pub struct ManorGame {
    cfg: ManorConfig,
    phase: GamePhase,
    level: u32,
    sanity: f64,
    dolls: Vec<f64>,
    dolls_found: u32,
    dolls_needed: u32,
    flashlight_on: bool,
    hurt: bool,
    beam_radius: f64,
    death_cause: Option<&'static str>,
    haunt: HauntScheduler,
    audio: AudioEngine,
    rng: StdRng,
    last_now: f64,
    started: bool,
}

#[wasm_bindgen]
impl ManorGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ManorGame {
        Self::build(StdRng::from_entropy())
    }

    /// Reproducible run for tests and demo recordings.
    pub fn with_seed(seed: u32) -> ManorGame {
        Self::build(StdRng::seed_from_u64(seed as u64))
    }

    /// Advance one frame. `camera_x` is the world translation the host applies
    /// (0 or negative, as with a CSS translateX).
    pub fn tick(
        &mut self,
        now_ms: f64,
        cursor_x: f64,
        cursor_y: f64,
        camera_x: f64,
        viewport_w: f64,
        viewport_h: f64,
    ) {
        self.last_now = now_ms;
        if !self.started {
            self.started = true;
            self.haunt.reset(now_ms, &mut self.rng);
            self.audio.resume();
            self.audio.play_ambience(now_ms, &mut self.rng);
        }
        self.audio.tick(now_ms, &mut self.rng);
        if self.phase != GamePhase::Playing {
            return;
        }

        self.beam_radius = if self.flashlight_on {
            if self.rng.gen_range(0.0..1.0) < self.cfg.beam_flicker_chance {
                self.cfg.beam_flicker_radius
            } else {
                self.cfg.beam_radius
            }
        } else {
            0.0
        };

        // The Lady's sprite is anchored at the vertical center of the view;
        // distance to the cursor is measured on screen, like the beam itself.
        let mut dist = None;
        let mut on_screen = false;
        if let Some(lady) = self.haunt.antagonist() {
            let screen_x = lady.x + camera_x;
            on_screen = screen_x > -self.cfg.lady_screen_halfwidth
                && screen_x < viewport_w + self.cfg.lady_screen_halfwidth;
            let dx = cursor_x - screen_x;
            let dy = cursor_y - viewport_h / 2.0;
            dist = Some((dx * dx + dy * dy).sqrt());
        }

        let input = HauntInput {
            view_x: viewport_w / 2.0 - camera_x,
            player: (cursor_x, cursor_y),
            dist,
        };
        let events = self.haunt.tick(now_ms, &input, &mut self.rng);
        self.apply_events(&events);

        let active = self.haunt.antagonist().is_some();
        if active && on_screen && self.flashlight_on && dist.is_some_and(|d| d < self.cfg.aim_radius)
        {
            self.sanity -= self.cfg.drain_per_tick;
            self.hurt = true;
        } else {
            self.hurt = false;
            if active && !self.flashlight_on {
                self.sanity += self.cfg.regen_hidden;
            } else if !active {
                self.sanity += self.cfg.regen_idle;
            }
        }
        self.sanity = self.sanity.clamp(0.0, 100.0);
        if self.sanity <= 0.0 {
            self.game_over(MIND_BROKEN);
        }
    }

    pub fn toggle_flashlight(&mut self) {
        if self.phase == GamePhase::Playing {
            self.flashlight_on = !self.flashlight_on;
        }
    }

    /// Pick up the doll at `index` (host resolves which sprite was clicked).
    /// Needs the beam on; nothing is found in the dark.
    pub fn try_collect(&mut self, index: usize) -> bool {
        if self.phase != GamePhase::Playing || !self.flashlight_on || index >= self.dolls.len() {
            return false;
        }
        self.dolls.remove(index);
        self.dolls_found += 1;
        self.audio.play_collect();
        if self.dolls_found >= self.dolls_needed {
            self.open_quiz();
        }
        true
    }

    /// Quiz submission. Correct advances the level; wrong drains sanity and
    /// leaves all timers untouched.
    pub fn submit_answer(&mut self, answer: &str) -> bool {
        if self.phase != GamePhase::Quiz {
            return false;
        }
        if quiz::check_answer(self.level, answer) {
            self.advance_level();
            true
        } else {
            self.sanity = (self.sanity - self.cfg.quiz_penalty).clamp(0.0, 100.0);
            if self.sanity <= 0.0 {
                self.game_over(MIND_BROKEN);
            }
            false
        }
    }

    // --- Outputs -------------------------------------------------------------

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn sanity(&self) -> f64 {
        self.sanity
    }

    /// Status-bar band: "calm" above 50, "strained" above 20, else "critical".
    pub fn sanity_band(&self) -> String {
        if self.sanity > 50.0 {
            "calm"
        } else if self.sanity > 20.0 {
            "strained"
        } else {
            "critical"
        }
        .into()
    }

    pub fn dolls_found(&self) -> u32 {
        self.dolls_found
    }

    pub fn dolls_needed(&self) -> u32 {
        self.dolls_needed
    }

    /// World x of every uncollected doll, in collection-index order.
    pub fn doll_positions(&self) -> Vec<f64> {
        self.dolls.clone()
    }

    pub fn flashlight_on(&self) -> bool {
        self.flashlight_on
    }

    /// Current beam radius in px; 0 while the flashlight is off. Carries the
    /// occasional one-frame flicker.
    pub fn beam_radius(&self) -> f64 {
        self.beam_radius
    }

    pub fn hurt(&self) -> bool {
        self.hurt
    }

    pub fn lady_visible(&self) -> bool {
        self.haunt.antagonist().is_some()
    }

    pub fn lady_x(&self) -> f64 {
        self.haunt.antagonist().map_or(0.0, |a| a.x)
    }

    pub fn heartbeat_bpm(&self) -> f64 {
        self.haunt.bpm()
    }

    pub fn riddle(&self) -> String {
        quiz::riddle_for_level(self.level).question.into()
    }

    pub fn death_cause(&self) -> Option<String> {
        self.death_cause.map(Into::into)
    }

    pub fn world_width(&self) -> f64 {
        self.cfg.world_width
    }
}

impl ManorGame {
    fn build(rng: StdRng) -> ManorGame {
        let cfg = ManorConfig::default();
        let mut game = ManorGame {
            haunt: HauntScheduler::new(haunt_config(&cfg)),
            audio: AudioEngine::new(AudioConfig::default()),
            cfg,
            phase: GamePhase::Playing,
            level: 1,
            sanity: 100.0,
            dolls: Vec::new(),
            dolls_found: 0,
            dolls_needed: 0,
            flashlight_on: true,
            hurt: false,
            beam_radius: cfg.beam_radius,
            death_cause: None,
            rng,
            last_now: 0.0,
            started: false,
        };
        game.spawn_dolls();
        game
    }

    fn spawn_dolls(&mut self) {
        self.dolls_found = 0;
        self.dolls_needed = self.cfg.base_dolls + self.level;
        let lo = self.cfg.doll_margin;
        let hi = self.cfg.world_width - self.cfg.doll_margin;
        let mut dolls = Vec::with_capacity(self.dolls_needed as usize);
        for _ in 0..self.dolls_needed {
            dolls.push(self.rng.gen_range(lo..hi));
        }
        self.dolls = dolls;
    }

    fn apply_events(&mut self, events: &[HauntEvent]) {
        for e in events {
            match e {
                HauntEvent::Manifested { x, .. } => {
                    log(&format!("the lady manifests at x={x:.0}"));
                }
                HauntEvent::Retreated => log("the lady retreats"),
                HauntEvent::ScreamCue => self.audio.play_scream(),
                HauntEvent::HeartbeatCue { .. } => self.audio.play_heartbeat(),
                // No pursuit in the manor.
                HauntEvent::Caught => {}
            }
        }
    }

    fn open_quiz(&mut self) {
        self.phase = GamePhase::Quiz;
        self.hurt = false;
        self.haunt.cancel_all();
        log("all dolls found; the riddle bars the way");
    }

    fn advance_level(&mut self) {
        self.level += 1;
        self.spawn_dolls();
        self.phase = GamePhase::Playing;
        self.haunt.reset(self.last_now, &mut self.rng);
    }

    fn game_over(&mut self, cause: &'static str) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.death_cause = Some(cause);
        self.hurt = false;
        self.haunt.cancel_all();
        self.audio.stop_all();
        log(cause);
    }
}

impl Default for ManorGame {
    fn default() -> Self {
        Self::new()
    }
}
