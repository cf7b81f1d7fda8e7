// Ripple field: transient radial waves spawned by the pointer.
// Each live ripple displaces nearby sample positions along the ring it
// radiates; waves fade as they grow and die once they leave the surface.

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::time::Duration;

/// Hard cap on concurrent ripples; spawning beyond it evicts the oldest.
pub const MAX_RIPPLES: usize = 10;
/// Pointer travel (surface px) required between two move-spawned ripples.
pub const MOVE_SPAWN_DISTANCE: f32 = 20.0;
/// Ring spacing in multiples of the cell size.
pub const WAVELENGTH_CELLS: f32 = 3.5;

const CLICK_AMPLITUDE: f32 = 18.0;
const CLICK_SPEED: f32 = 300.0;

// ----------------------------- tiny RNG (no external crate) -----------------------------

/// Deterministic xorshift32; only used to vary move ripples a little.
#[derive(Clone, Debug)]
pub struct Rng32 {
    state: u32,
}

impl Rng32 {
    pub fn from_seed(seed: u32) -> Self {
        Self { state: seed | 1 }
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform [0,1)
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / ((1u32 << 24) as f32)
    }
}

// ----------------------------- ripples ------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct RippleSource {
    pub id: u64,           // spawn order
    pub origin_x: f32,     // surface px
    pub origin_y: f32,
    pub born_at: Duration, // clock offset when spawned
    pub amplitude: f32,    // peak displacement in px
    pub speed: f32,        // wavefront expansion in px/sec
    pub wavelength: f32,   // ring spacing in px
    pub max_radius: f32,   // radius at which the ripple dies
}

impl RippleSource {
    /// Current wavefront radius.
    #[inline]
    pub fn radius_at(&self, now: Duration) -> f32 {
        now.saturating_sub(self.born_at).as_secs_f32() * self.speed
    }

    #[inline]
    pub fn is_alive(&self, now: Duration) -> bool {
        self.radius_at(now) < self.max_radius
    }
}

/// Bounded FIFO of live ripples.
#[derive(Clone, Debug)]
pub struct RippleField {
    ripples: VecDeque<RippleSource>,
    capacity: usize,
    next_id: u64,
    wavelength: f32,
    max_radius: f32,
}

impl Default for RippleField {
    fn default() -> Self {
        Self::new(MAX_RIPPLES)
    }
}

impl RippleField {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ripples: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 0,
            wavelength: 8.0 * WAVELENGTH_CELLS,
            max_radius: 0.0,
        }
    }

    /// Surface geometry used for ripples spawned from now on.
    pub fn set_geometry(&mut self, width_px: usize, height_px: usize, cell_size: u32) {
        self.wavelength = cell_size.max(1) as f32 * WAVELENGTH_CELLS;
        self.max_radius = (width_px as f32).hypot(height_px as f32);
    }

    pub fn wavelength(&self) -> f32 {
        self.wavelength
    }

    pub fn max_radius(&self) -> f32 {
        self.max_radius
    }

    /// Add a ripple at (x,y). Evicts the oldest one first when full.
    pub fn spawn(&mut self, x: f32, y: f32, amplitude: f32, speed: f32, now: Duration) -> u64 {
        if self.ripples.len() >= self.capacity {
            self.ripples.pop_front();
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ripples.push_back(RippleSource {
            id,
            origin_x: x,
            origin_y: y,
            born_at: now,
            amplitude,
            speed,
            wavelength: self.wavelength,
            max_radius: self.max_radius,
        });
        id
    }

    /// Drop every ripple whose wavefront reached its max radius.
    pub fn prune(&mut self, now: Duration) {
        self.ripples.retain(|r| r.is_alive(now));
    }

    /// Summed displacement of all nearby wavefronts at (x,y).
    pub fn displacement_at(&self, x: f32, y: f32, now: Duration) -> (f32, f32) {
        let (mut sx, mut sy) = (0.0f32, 0.0f32);
        for r in &self.ripples {
            let radius = r.radius_at(now);
            let dx = x - r.origin_x;
            let dy = y - r.origin_y;
            let mut dist = (dx * dx + dy * dy).sqrt();
            if dist < 1e-3 {
                dist = 1e-3;
            }
            let diff = dist - radius;
            if diff.abs() >= r.wavelength * 2.0 {
                continue;
            }
            let falloff = if r.max_radius > 0.0 { (1.0 - radius / r.max_radius).max(0.0) } else { 0.0 };
            let mag = (diff / r.wavelength * PI).sin() * r.amplitude * falloff;
            sx += dx / dist * mag;
            sy += dy / dist * mag;
        }
        (sx, sy)
    }

    pub fn len(&self) -> usize {
        self.ripples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ripples.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RippleSource> {
        self.ripples.iter()
    }

    pub fn clear(&mut self) {
        self.ripples.clear();
    }
}

// ----------------------------- pointer input ------------------------------------

/// Suppresses move-ripples until the pointer travelled far enough.
#[derive(Clone, Debug)]
pub struct PointerThrottle {
    last: (f32, f32),
    min_distance: f32,
}

impl Default for PointerThrottle {
    fn default() -> Self {
        Self::new(MOVE_SPAWN_DISTANCE)
    }
}

impl PointerThrottle {
    pub fn new(min_distance: f32) -> Self {
        Self { last: (-999.0, -999.0), min_distance }
    }

    /// Returns true (and records the position) when a ripple may spawn here.
    pub fn admit(&mut self, x: f32, y: f32) -> bool {
        let (lx, ly) = self.last;
        if (x - lx).hypot(y - ly) < self.min_distance {
            return false;
        }
        self.last = (x, y);
        true
    }
}

/// Amplitude and speed for a pointer-move ripple.
pub fn move_preset(rng: &mut Rng32) -> (f32, f32) {
    (5.0 + rng.next_f32() * 3.0, 220.0 + rng.next_f32() * 60.0)
}

/// Amplitude and speed for a click ripple.
pub fn click_preset() -> (f32, f32) {
    (CLICK_AMPLITUDE, CLICK_SPEED)
}
