//! Particle-population states: `dirty` (dust) and `stained` (stains).
//!
//! A population is a fixed-size set of particles attached to the owner's
//! top face. Particles are never destroyed; cleaning stashes them and
//! setting the state again reactivates them. The boolean value is derived
//! from the active fraction with a strict comparison:
//! `active_count > total_count * threshold`.
//!
//! ```text
//!            set(true)                 sweep drops active fraction
//!  Inactive ───────────▶ Active ───────────────────────────▶ Inactive
//!      ▲                   │                                     │
//!      └──── set(false) ───┘◀──────────── set(true) ─────────────┘
//! ```
//!
//! Each tick an active population is swept by every other object carrying
//! an enabled `cleaning_tool` (for stains, only soaked cleaners count): the
//! cleaner's box is inflated and every particle strictly inside it is
//! stashed.

// glam operators are float math and cannot overflow.
#![allow(clippy::arithmetic_side_effects)]

use objstate_types::{Aabb, DVec3, ObjectId, StateKind};
use rand::{Rng, RngCore};
use tracing::{debug, warn};

use crate::context::{StateContext, StateReader};
use crate::error::StateError;

/// `active > total * threshold`, the boundary rule for "still dirty".
#[allow(clippy::cast_precision_loss)]
pub fn exceeds_threshold(active: usize, total: usize, threshold: f64) -> bool {
    active as f64 > total as f64 * threshold
}

/// One particle, positioned relative to the owner's box center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Offset from the owner's bounding-box center.
    pub offset: DVec3,
    /// Whether the particle is attached (not stashed).
    pub active: bool,
}

/// A fixed-size pool of particles.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticlePopulation {
    particles: Vec<Particle>,
}

impl ParticlePopulation {
    /// Allocate `count` active particles spread over the top face of `aabb`.
    pub fn layout(rng: &mut dyn RngCore, count: usize, aabb: &Aabb) -> Self {
        let half = aabb.half_extents();
        let particles = (0..count)
            .map(|_| Particle {
                offset: random_offset(rng, half),
                active: true,
            })
            .collect();
        Self { particles }
    }

    /// Scatter every particle to a fresh random position on `aabb`'s top face.
    pub fn relayout(&mut self, rng: &mut dyn RngCore, aabb: &Aabb) {
        let half = aabb.half_extents();
        for particle in &mut self.particles {
            particle.offset = random_offset(rng, half);
        }
    }

    /// Number of particles, active or not.
    pub fn total(&self) -> usize {
        self.particles.len()
    }

    /// Number of attached particles.
    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.active).count()
    }

    /// All particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Reattach every particle.
    pub fn activate_all(&mut self) {
        for particle in &mut self.particles {
            particle.active = true;
        }
    }

    /// Detach every particle.
    pub fn stash_all(&mut self) {
        for particle in &mut self.particles {
            particle.active = false;
        }
    }

    /// Detach every active particle strictly inside `region`, with particle
    /// positions measured from `anchor`. Returns how many were stashed.
    pub fn stash_inside(&mut self, region: &Aabb, anchor: DVec3) -> usize {
        let mut stashed = 0usize;
        for particle in self.particles.iter_mut().filter(|p| p.active) {
            if region.strictly_contains_point(anchor + particle.offset) {
                particle.active = false;
                stashed = stashed.saturating_add(1);
            }
        }
        stashed
    }

    /// Whether the active fraction is above `threshold`.
    pub fn exceeds(&self, threshold: f64) -> bool {
        exceeds_threshold(self.active_count(), self.total(), threshold)
    }
}

fn random_offset(rng: &mut dyn RngCore, half: DVec3) -> DVec3 {
    DVec3::new(symmetric(rng, half.x), symmetric(rng, half.y), half.z)
}

fn symmetric(rng: &mut dyn RngCore, half: f64) -> f64 {
    if half > 0.0 {
        rng.random_range(-half..=half)
    } else {
        0.0
    }
}

/// Which particle system a population models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleFamily {
    /// Dust: swept by any enabled cleaner, keeps its first layout.
    Dust,
    /// Stains: swept only by soaked cleaners, scattered anew each time it is
    /// set.
    Stain,
}

impl ParticleFamily {
    /// The state kind this family backs.
    pub const fn state(self) -> StateKind {
        match self {
            Self::Dust => StateKind::Dirty,
            Self::Stain => StateKind::Stained,
        }
    }
}

/// Tunables for one particle state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSettings {
    /// Particles allocated on first activation.
    pub count: usize,
    /// Clean/dirty boundary fraction.
    pub threshold: f64,
    /// Cleaner box inflation fraction per axis.
    pub inflation: f64,
}

/// A `dirty` or `stained` state.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleState {
    owner: ObjectId,
    family: ParticleFamily,
    settings: ParticleSettings,
    value: bool,
    population: Option<ParticlePopulation>,
    allocations: u32,
}

impl ParticleState {
    /// An inactive state with no population yet.
    pub const fn new(owner: ObjectId, family: ParticleFamily, settings: ParticleSettings) -> Self {
        Self {
            owner,
            family,
            settings,
            value: false,
            population: None,
            allocations: 0,
        }
    }

    /// Which family this is.
    pub const fn family(&self) -> ParticleFamily {
        self.family
    }

    /// Current value.
    pub const fn value(&self) -> bool {
        self.value
    }

    /// Tunables this state was created with.
    pub const fn settings(&self) -> ParticleSettings {
        self.settings
    }

    /// The population, once allocated.
    pub const fn population(&self) -> Option<&ParticlePopulation> {
        self.population.as_ref()
    }

    /// How many times a population was allocated (at most once).
    pub const fn allocations(&self) -> u32 {
        self.allocations
    }

    /// Activate (`true`) or stash (`false`) the population.
    ///
    /// The first activation allocates the population over the owner's box.
    /// Later activations reuse it; stains are scattered anew when the state
    /// goes from inactive to active.
    pub fn set(&mut self, value: bool, ctx: &mut StateContext<'_>) -> Result<(), StateError> {
        if !value {
            if let Some(population) = self.population.as_mut() {
                population.stash_all();
            }
            self.value = false;
            return Ok(());
        }

        let aabb = ctx.own_aabb()?;
        match self.population.as_mut() {
            Some(population) => {
                if self.family == ParticleFamily::Stain && !self.value {
                    population.relayout(ctx.rng, &aabb);
                }
                population.activate_all();
            }
            None => {
                self.population = Some(ParticlePopulation::layout(ctx.rng, self.settings.count, &aabb));
                self.allocations = self.allocations.saturating_add(1);
                debug!(
                    object = %self.owner,
                    state = %self.family.state(),
                    count = self.settings.count,
                    "Particle population allocated"
                );
            }
        }
        self.value = true;
        Ok(())
    }

    /// Sweep the population with every qualifying cleaner, then recompute
    /// the value. Does nothing while inactive.
    pub fn update(&mut self, ctx: &mut StateContext<'_>) -> Result<(), StateError> {
        if !self.value {
            return Ok(());
        }
        let Some(population) = self.population.as_mut() else {
            return Ok(());
        };

        let anchor = ctx.own_aabb()?.center();
        let reader = ctx.reader;
        for cleaner in reader.objects_with_state(StateKind::CleaningTool) {
            if cleaner == self.owner {
                continue;
            }
            let inflation = self.settings.inflation;
            let region = match qualifying_region(&reader, cleaner, self.family, inflation) {
                Ok(Some(region)) => region,
                Ok(None) => continue,
                Err(err) => {
                    warn!(
                        object = %self.owner,
                        cleaner = %cleaner,
                        state = %self.family.state(),
                        error = %err,
                        "Cleaner skipped"
                    );
                    continue;
                }
            };
            let stashed = population.stash_inside(&region, anchor);
            if stashed > 0 {
                debug!(
                    object = %self.owner,
                    cleaner = %cleaner,
                    state = %self.family.state(),
                    stashed,
                    "Particles cleaned"
                );
            }
        }

        self.value = population.exceeds(self.settings.threshold);
        if !self.value {
            debug!(object = %self.owner, state = %self.family.state(), "Object is clean");
        }
        Ok(())
    }
}

/// The inflated box of `cleaner` if it currently sweeps `family`, `None`
/// when it does not qualify or lacks a needed state.
fn qualifying_region(
    reader: &StateReader<'_>,
    cleaner: ObjectId,
    family: ParticleFamily,
    inflation: f64,
) -> Result<Option<Aabb>, StateError> {
    if !optional_flag(reader.flag(cleaner, StateKind::CleaningTool))? {
        return Ok(None);
    }
    if family == ParticleFamily::Stain && !optional_flag(reader.flag(cleaner, StateKind::Soaked))? {
        return Ok(None);
    }
    match reader.aabb(cleaner) {
        Ok(aabb) => Ok(Some(aabb.inflated(inflation))),
        Err(err) if err.is_missing_dependency() => Ok(None),
        Err(err) => Err(err),
    }
}

/// A flag read where a missing state means `false`.
fn optional_flag(read: Result<bool, StateError>) -> Result<bool, StateError> {
    match read {
        Ok(value) => Ok(value),
        Err(err) if err.is_missing_dependency() => Ok(false),
        Err(err) => Err(err),
    }
}
