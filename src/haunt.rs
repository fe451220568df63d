//! The Lady's haunting cycle.
//!
//! A `HauntScheduler` decides when the Lady appears, where, and for how long,
//! and emits cue events the owning game forwards to the audio engine. Timers
//! are kept in an explicit queue keyed by a monotonically increasing cycle id:
//! cancelling is "bump the id", and entries from a superseded cycle are
//! discarded before they can fire. This replaces the usual setTimeout chains
//! and makes every property of the cycle drivable from a plain test loop.

use rand::Rng;
use rand::rngs::StdRng;

// --- Phases & events ---------------------------------------------------------

/// State machine over the Lady's presence. `Retreating` is transient (she is
/// gone the same tick she starts to leave); `Caught` is terminal until the
/// scheduler is reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HauntPhase {
    Dormant,
    Manifesting,
    Retreating,
    Caught,
}

/// What happened during a tick, in order. The scheduler never touches audio
/// itself; the game drains these and triggers cues.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HauntEvent {
    Manifested { x: f64, y: f64 },
    Retreated,
    HeartbeatCue { interval_ms: f64 },
    ScreamCue,
    /// Pursuit contact: the Lady reached the player. Emitted at most once per
    /// cycle; the scheduler freezes in `Caught` until reset.
    Caught,
}

/// Where a manifestation materializes.
#[derive(Clone, Copy, Debug)]
pub enum Placement {
    /// Near the current viewpoint center in world x, with a uniform random
    /// offset of up to `spread` either way, clamped to `[min_x, max_x]`.
    NearView { spread: f64, min_x: f64, max_x: f64 },
    /// On a circle around a fixed point (the chapel floor).
    Ring { center: (f64, f64), radius: f64 },
}

// --- Configuration -----------------------------------------------------------

/// Movement rules for the pursuing variant.
#[derive(Clone, Copy, Debug)]
pub struct PursuitConfig {
    /// Distance below which the run ends.
    pub contact_dist: f64,
    /// World rectangle the Lady may never leave: (min_x, max_x, min_y, max_y).
    pub bounds: (f64, f64, f64, f64),
    /// Cap on the per-tick time step so a backgrounded tab cannot teleport her.
    pub max_step_ms: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct HauntConfig {
    /// Uniform range for the dormant delay before the next manifestation.
    pub delay_range_ms: (f64, f64),
    /// Fixed dwell before she retreats on her own. `None` means she stays
    /// until contact (pursuit variant).
    pub dwell_ms: Option<f64>,
    pub placement: Placement,
    /// Heartbeat tiers, nearest first: fire every `interval_ms` while the
    /// distance to the Lady is below `dist_below`. Beyond the last tier the
    /// heart is quiet.
    pub cadence_tiers: [(f64, f64); 3],
    /// Chance per heartbeat of an extra scream cue.
    pub extra_scream_chance: f64,
    pub pursuit: Option<PursuitConfig>,
}

// --- Antagonist & timers -----------------------------------------------------

/// The manifested Lady. Owned exclusively by the scheduler; present iff the
/// phase is `Manifesting` or `Caught`, and always within world bounds.
#[derive(Clone, Copy, Debug)]
pub struct Antagonist {
    pub x: f64,
    pub y: f64,
    pub spawned_at_ms: f64,
    pub speed: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerKind {
    Manifest,
    Despawn,
}

#[derive(Clone, Copy, Debug)]
struct Scheduled {
    cycle: u64,
    due_ms: f64,
    kind: TimerKind,
}

/// Per-tick inputs from the owning game.
#[derive(Clone, Copy, Debug, Default)]
pub struct HauntInput {
    /// World-space x the player is currently looking at (manor spawns near it).
    pub view_x: f64,
    /// Player (or cursor) position used for pursuit steering.
    pub player: (f64, f64),
    /// Distance player↔Lady when the game measures it in a space the
    /// scheduler cannot see (the manor measures cursor-to-sprite on screen).
    /// Pursuit ignores this and uses world distance.
    pub dist: Option<f64>,
}

// --- Scheduler ---------------------------------------------------------------

pub struct HauntScheduler {
    cfg: HauntConfig,
    phase: HauntPhase,
    cycle: u64,
    pending: Vec<Scheduled>,
    antagonist: Option<Antagonist>,
    /// Speed the next manifestation spawns with. Quiz penalties raise it
    /// permanently in the pursuit variant.
    spawn_speed: f64,
    last_beat_ms: f64,
    last_tick_ms: f64,
    bpm: f64,
}

impl HauntScheduler {
    pub fn new(cfg: HauntConfig) -> Self {
        Self {
            cfg,
            phase: HauntPhase::Dormant,
            cycle: 0,
            pending: Vec::new(),
            antagonist: None,
            spawn_speed: 0.0,
            last_beat_ms: 0.0,
            last_tick_ms: 0.0,
            bpm: 0.0,
        }
    }

    pub fn phase(&self) -> HauntPhase {
        self.phase
    }

    pub fn antagonist(&self) -> Option<&Antagonist> {
        self.antagonist.as_ref()
    }

    /// Displayed heartbeat rate; 0 while the heart is quiet.
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Live (current-cycle) timer counts as (manifest, despawn). Never more
    /// than one of each.
    pub fn pending_timer_counts(&self) -> (usize, usize) {
        let count = |kind: TimerKind| {
            self.pending
                .iter()
                .filter(|s| s.cycle == self.cycle && s.kind == kind)
                .count()
        };
        (count(TimerKind::Manifest), count(TimerKind::Despawn))
    }

    pub fn set_spawn_speed(&mut self, speed: f64) {
        self.spawn_speed = speed;
    }

    pub fn set_placement(&mut self, placement: Placement) {
        self.cfg.placement = placement;
    }

    /// Permanently raise the pursuit speed (wrong quiz answer). Applies to a
    /// currently manifested Lady as well as all future spawns.
    pub fn escalate(&mut self, amount: f64) {
        self.spawn_speed += amount;
        if let Some(a) = self.antagonist.as_mut() {
            a.speed += amount;
        }
    }

    /// Clear everything and re-arm the dormant delay under a fresh cycle.
    /// Called on level start and whenever she retreats.
    pub fn reset(&mut self, now_ms: f64, rng: &mut StdRng) {
        self.supersede();
        self.last_tick_ms = now_ms;
        let (lo, hi) = self.cfg.delay_range_ms;
        let delay = rng.gen_range(lo..hi);
        self.schedule(TimerKind::Manifest, now_ms + delay);
    }

    /// Clear everything without re-arming. Idempotent; used on quiz open and
    /// game over.
    pub fn cancel_all(&mut self) {
        self.supersede();
    }

    fn supersede(&mut self) {
        self.cycle += 1;
        self.pending.clear();
        self.antagonist = None;
        self.phase = HauntPhase::Dormant;
        self.bpm = 0.0;
    }

    fn schedule(&mut self, kind: TimerKind, due_ms: f64) {
        // At most one pending timer per kind.
        self.pending.retain(|s| s.kind != kind);
        self.pending.push(Scheduled {
            cycle: self.cycle,
            due_ms,
            kind,
        });
    }

    /// Advance the cycle. Call once per animation frame while the run is
    /// live; returns the events of this tick in order.
    pub fn tick(&mut self, now_ms: f64, input: &HauntInput, rng: &mut StdRng) -> Vec<HauntEvent> {
        let mut events = Vec::new();
        let dt_ms = (now_ms - self.last_tick_ms).max(0.0);
        self.last_tick_ms = now_ms;

        if self.phase == HauntPhase::Caught {
            return events;
        }

        // Drop timers from superseded cycles, then fire what is due.
        self.pending.retain(|s| s.cycle == self.cycle);
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due_ms <= now_ms {
                let t = self.pending.remove(i);
                match t.kind {
                    TimerKind::Manifest => self.manifest(now_ms, input, rng, &mut events),
                    TimerKind::Despawn => self.retreat(now_ms, rng, &mut events),
                }
                // A fired timer may have superseded the queue; start over.
                i = 0;
            } else {
                i += 1;
            }
        }

        if self.phase == HauntPhase::Manifesting {
            self.pursue(dt_ms, input, &mut events);
        }
        if self.phase == HauntPhase::Manifesting {
            self.beat(now_ms, input, rng, &mut events);
        }
        events
    }

    fn manifest(
        &mut self,
        now_ms: f64,
        input: &HauntInput,
        rng: &mut StdRng,
        events: &mut Vec<HauntEvent>,
    ) {
        let (x, y) = match self.cfg.placement {
            Placement::NearView {
                spread,
                min_x,
                max_x,
            } => {
                let offset = rng.gen_range(-spread..spread);
                ((input.view_x + offset).clamp(min_x, max_x), 0.0)
            }
            Placement::Ring { center, radius } => {
                let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                (
                    center.0 + radius * angle.cos(),
                    center.1 + radius * angle.sin(),
                )
            }
        };
        self.phase = HauntPhase::Manifesting;
        self.antagonist = Some(Antagonist {
            x,
            y,
            spawned_at_ms: now_ms,
            speed: self.spawn_speed,
        });
        self.last_beat_ms = now_ms;
        if let Some(dwell) = self.cfg.dwell_ms {
            self.schedule(TimerKind::Despawn, now_ms + dwell);
        }
        events.push(HauntEvent::Manifested { x, y });
        events.push(HauntEvent::ScreamCue);
    }

    fn retreat(&mut self, now_ms: f64, rng: &mut StdRng, events: &mut Vec<HauntEvent>) {
        self.phase = HauntPhase::Retreating;
        events.push(HauntEvent::Retreated);
        // Immediate: clear presence and re-arm the dormant delay.
        self.reset(now_ms, rng);
    }

    fn pursue(&mut self, dt_ms: f64, input: &HauntInput, events: &mut Vec<HauntEvent>) {
        let Some(p) = self.cfg.pursuit else {
            return;
        };
        let Some(a) = self.antagonist.as_mut() else {
            return;
        };
        let dt = dt_ms.min(p.max_step_ms) / 1000.0;
        let (px, py) = input.player;
        let (dx, dy) = (px - a.x, py - a.y);
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > f64::EPSILON {
            let step = (a.speed * dt).min(dist);
            a.x += dx / dist * step;
            a.y += dy / dist * step;
        }
        let (min_x, max_x, min_y, max_y) = p.bounds;
        a.x = a.x.clamp(min_x, max_x);
        a.y = a.y.clamp(min_y, max_y);

        let (ndx, ndy) = (px - a.x, py - a.y);
        if (ndx * ndx + ndy * ndy).sqrt() <= p.contact_dist {
            self.phase = HauntPhase::Caught;
            self.pending.clear();
            self.bpm = 0.0;
            events.push(HauntEvent::Caught);
        }
    }

    fn beat(
        &mut self,
        now_ms: f64,
        input: &HauntInput,
        rng: &mut StdRng,
        events: &mut Vec<HauntEvent>,
    ) {
        let dist = match (self.cfg.pursuit, self.antagonist.as_ref()) {
            // Pursuit measures true world distance.
            (Some(_), Some(a)) => {
                let (dx, dy) = (input.player.0 - a.x, input.player.1 - a.y);
                (dx * dx + dy * dy).sqrt()
            }
            _ => match input.dist {
                Some(d) => d,
                None => return,
            },
        };
        // Cadence is derived fresh every tick; it is never stored state.
        let Some(interval_ms) = self.cadence_ms(dist) else {
            self.bpm = 0.0;
            return;
        };
        if now_ms - self.last_beat_ms >= interval_ms {
            self.last_beat_ms = now_ms;
            self.bpm = 60_000.0 / interval_ms;
            events.push(HauntEvent::HeartbeatCue { interval_ms });
            if rng.gen_range(0.0..1.0) < self.cfg.extra_scream_chance {
                events.push(HauntEvent::ScreamCue);
            }
        }
    }

    fn cadence_ms(&self, dist: f64) -> Option<f64> {
        self.cfg
            .cadence_tiers
            .iter()
            .find(|(below, _)| dist < *below)
            .map(|(_, interval)| *interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn manor_cfg() -> HauntConfig {
        HauntConfig {
            delay_range_ms: (3_000.0, 8_000.0),
            dwell_ms: Some(4_000.0),
            placement: Placement::NearView {
                spread: 500.0,
                min_x: 100.0,
                max_x: 3_800.0,
            },
            cadence_tiers: [(150.0, 250.0), (400.0, 400.0), (800.0, 1_000.0)],
            extra_scream_chance: 0.03,
            pursuit: None,
        }
    }

    #[test]
    fn manifest_position_respects_world_bounds() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut h = HauntScheduler::new(manor_cfg());
            h.reset(0.0, &mut rng);
            // View centered at the far left edge: offsets would go negative.
            let input = HauntInput {
                view_x: 0.0,
                ..Default::default()
            };
            let mut now = 0.0;
            loop {
                now += 16.0;
                let events = h.tick(now, &input, &mut rng);
                if let Some(HauntEvent::Manifested { x, .. }) = events.first() {
                    assert!((100.0..=3_800.0).contains(x), "spawn x {x} out of bounds");
                    break;
                }
                assert!(now < 10_000.0, "no manifestation within delay range");
            }
        }
    }

    #[test]
    fn cadence_tiers_map_distance_to_interval() {
        let h = HauntScheduler::new(manor_cfg());
        assert_eq!(h.cadence_ms(50.0), Some(250.0));
        assert_eq!(h.cadence_ms(300.0), Some(400.0));
        assert_eq!(h.cadence_ms(799.0), Some(1_000.0));
        assert_eq!(h.cadence_ms(800.0), None);
    }

    #[test]
    fn stale_timers_never_fire_after_cancel() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut h = HauntScheduler::new(manor_cfg());
        h.reset(0.0, &mut rng);
        h.cancel_all();
        // Step far past the longest possible delay: nothing may happen.
        let input = HauntInput::default();
        for i in 1..=1_000 {
            let events = h.tick(i as f64 * 16.0, &input, &mut rng);
            assert!(events.is_empty());
            assert_eq!(h.phase(), HauntPhase::Dormant);
        }
        assert_eq!(h.pending_timer_counts(), (0, 0));
    }
}
