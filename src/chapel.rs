//! The chapel: first-person pursuit variant.
//!
//! The host owns the scene graph, pointer-lock camera and movement; it feeds
//! the player's ground-plane position in every frame. Here the Lady does not
//! wait to be looked at: once manifested she walks straight at the player,
//! faster every level and permanently faster for every wrong riddle answer.
//! Contact ends the run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wasm_bindgen::prelude::*;

use crate::audio::{AudioConfig, AudioEngine};
use crate::haunt::{
    HauntConfig, HauntEvent, HauntInput, HauntScheduler, Placement, PursuitConfig,
};
use crate::{GamePhase, log, quiz};

const CAUGHT: &str = "She caught you.";

#[derive(Clone, Copy, Debug)]
pub struct ChapelConfig {
    /// Square arena half-extent; world bounds are ±this on both axes.
    pub arena_half: f64,
    pub doll_margin: f64,
    pub base_dolls: u32,
    /// Spawn ring radius shrinks per level down to the minimum.
    pub spawn_radius_base: f64,
    pub spawn_radius_step: f64,
    pub spawn_radius_min: f64,
    pub base_speed: f64,
    pub speed_per_level: f64,
    pub penalty_speed: f64,
    pub contact_dist: f64,
    pub collect_dist: f64,
}

impl Default for ChapelConfig {
    fn default() -> Self {
        Self {
            arena_half: 40.0,
            doll_margin: 4.0,
            base_dolls: 2,
            spawn_radius_base: 26.0,
            spawn_radius_step: 2.0,
            spawn_radius_min: 10.0,
            base_speed: 6.0,
            speed_per_level: 0.8,
            penalty_speed: 3.0,
            contact_dist: 1.5,
            collect_dist: 2.0,
        }
    }
}

fn haunt_config(cfg: &ChapelConfig) -> HauntConfig {
    HauntConfig {
        delay_range_ms: (4_000.0, 9_000.0),
        // She gives up the chase after a while and melts away; the cycle
        // re-arms like in the manor.
        dwell_ms: Some(12_000.0),
        placement: Placement::Ring {
            center: (0.0, 0.0),
            radius: cfg.spawn_radius_base,
        },
        cadence_tiers: [(8.0, 250.0), (18.0, 400.0), (30.0, 1_000.0)],
        extra_scream_chance: 0.03,
        pursuit: Some(PursuitConfig {
            contact_dist: cfg.contact_dist,
            bounds: (-cfg.arena_half, cfg.arena_half, -cfg.arena_half, cfg.arena_half),
            max_step_ms: 100.0,
        }),
    }
}

#[wasm_bindgen]
pub struct ChapelGame {
    cfg: ChapelConfig,
    phase: GamePhase,
    level: u32,
    dolls: Vec<(f64, f64)>,
    dolls_found: u32,
    dolls_needed: u32,
    /// Sum of wrong-answer speed penalties; never decreases.
    escalation: f64,
    player: (f64, f64),
    death_cause: Option<&'static str>,
    haunt: HauntScheduler,
    audio: AudioEngine,
    rng: StdRng,
    last_now: f64,
    started: bool,
}

#[wasm_bindgen]
impl ChapelGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ChapelGame {
        Self::build(StdRng::from_entropy())
    }

    /// Reproducible run for tests and demo recordings.
    pub fn with_seed(seed: u32) -> ChapelGame {
        Self::build(StdRng::seed_from_u64(seed as u64))
    }

    /// Advance one frame with the player's ground-plane position.
    pub fn tick(&mut self, now_ms: f64, player_x: f64, player_z: f64) {
        self.last_now = now_ms;
        self.player = (player_x, player_z);
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

        let input = HauntInput {
            view_x: 0.0,
            player: self.player,
            dist: None,
        };
        let events = self.haunt.tick(now_ms, &input, &mut self.rng);
        for e in &events {
            match e {
                HauntEvent::Manifested { x, y } => {
                    log(&format!("she is here ({x:.1}, {y:.1})"));
                }
                HauntEvent::Retreated => log("she melts into the dark"),
                HauntEvent::ScreamCue => self.audio.play_scream(),
                HauntEvent::HeartbeatCue { .. } => self.audio.play_heartbeat(),
                HauntEvent::Caught => self.game_over(CAUGHT),
            }
        }
    }

    /// Pick up the doll at `index`; only works within reach.
    pub fn try_collect(&mut self, index: usize) -> bool {
        if self.phase != GamePhase::Playing || index >= self.dolls.len() {
            return false;
        }
        let (dx, dz) = (
            self.player.0 - self.dolls[index].0,
            self.player.1 - self.dolls[index].1,
        );
        if (dx * dx + dz * dz).sqrt() > self.cfg.collect_dist {
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

    /// Quiz submission. Wrong answers make her permanently faster; nothing
    /// else changes and no timers move.
    pub fn submit_answer(&mut self, answer: &str) -> bool {
        if self.phase != GamePhase::Quiz {
            return false;
        }
        if quiz::check_answer(self.level, answer) {
            self.advance_level();
            true
        } else {
            self.escalation += self.cfg.penalty_speed;
            self.haunt.escalate(self.cfg.penalty_speed);
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

    pub fn dolls_found(&self) -> u32 {
        self.dolls_found
    }

    pub fn dolls_needed(&self) -> u32 {
        self.dolls_needed
    }

    /// Uncollected doll positions flattened as [x0, z0, x1, z1, ...].
    pub fn doll_positions(&self) -> Vec<f64> {
        self.dolls.iter().flat_map(|&(x, z)| [x, z]).collect()
    }

    pub fn lady_visible(&self) -> bool {
        self.haunt.antagonist().is_some()
    }

    pub fn lady_x(&self) -> f64 {
        self.haunt.antagonist().map_or(0.0, |a| a.x)
    }

    pub fn lady_z(&self) -> f64 {
        self.haunt.antagonist().map_or(0.0, |a| a.y)
    }

    /// Her current walking speed, units/s (0 while dormant).
    pub fn lady_speed(&self) -> f64 {
        self.haunt.antagonist().map_or(0.0, |a| a.speed)
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

    pub fn arena_half(&self) -> f64 {
        self.cfg.arena_half
    }
}

impl ChapelGame {
    fn build(rng: StdRng) -> ChapelGame {
        let cfg = ChapelConfig::default();
        let mut game = ChapelGame {
            haunt: HauntScheduler::new(haunt_config(&cfg)),
            audio: AudioEngine::new(AudioConfig::default()),
            cfg,
            phase: GamePhase::Playing,
            level: 1,
            dolls: Vec::new(),
            dolls_found: 0,
            dolls_needed: 0,
            escalation: 0.0,
            player: (0.0, 0.0),
            death_cause: None,
            rng,
            last_now: 0.0,
            started: false,
        };
        game.configure_level();
        game.spawn_dolls();
        game
    }

    /// Spawn ring and walking speed both scale with level; escalation from
    /// wrong answers is carried on top for the rest of the run.
    fn configure_level(&mut self) {
        let radius = (self.cfg.spawn_radius_base
            - self.cfg.spawn_radius_step * (self.level - 1) as f64)
            .max(self.cfg.spawn_radius_min);
        self.haunt.set_placement(Placement::Ring {
            center: (0.0, 0.0),
            radius,
        });
        self.haunt.set_spawn_speed(
            self.cfg.base_speed + self.cfg.speed_per_level * self.level as f64 + self.escalation,
        );
    }

    fn spawn_dolls(&mut self) {
        self.dolls_found = 0;
        self.dolls_needed = self.cfg.base_dolls + self.level;
        let extent = self.cfg.arena_half - self.cfg.doll_margin;
        let mut dolls = Vec::with_capacity(self.dolls_needed as usize);
        for _ in 0..self.dolls_needed {
            dolls.push((
                self.rng.gen_range(-extent..extent),
                self.rng.gen_range(-extent..extent),
            ));
        }
        self.dolls = dolls;
    }

    fn open_quiz(&mut self) {
        self.phase = GamePhase::Quiz;
        self.haunt.cancel_all();
        log("all dolls found; the riddle bars the way");
    }

    fn advance_level(&mut self) {
        self.level += 1;
        self.configure_level();
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
        self.haunt.cancel_all();
        self.audio.stop_all();
        log(cause);
    }
}

impl Default for ChapelGame {
    fn default() -> Self {
        Self::new()
    }
}
