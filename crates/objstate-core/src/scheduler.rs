//! Per-tick update scheduling.
//!
//! One pass per tick:
//!
//! 1. **Snapshot** -- copy the state-kind index so the pass sees a fixed
//!    object set. Objects added or removed afterwards are seen next tick.
//! 2. **Invalidate** -- drop every memoized value in one sweep, before any
//!    state is read.
//! 3. **Update** -- walk the global dependency order once; for each state
//!    kind, run the update hook of every object in the snapshot carrying
//!    it. Dependencies are therefore refreshed before their dependents on
//!    every object.
//!
//! A hook that reports a missing dependency counts as "does not apply" and
//! is logged at debug level. Any other failure is logged, recorded in the
//! [`TickSummary`], and does not stop the pass.

use objstate_physics::PhysicsBackend;
use objstate_states::{StateContext, StateError, StateReader, StatesConfig};
use objstate_types::{ObjectId, StateKind};
use rand::RngCore;
use tracing::{debug, warn};

use crate::scene::Scene;

/// A hook that failed during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFailure {
    /// The object whose state failed.
    pub object: ObjectId,
    /// The failing state.
    pub state: StateKind,
    /// What went wrong.
    pub error: StateError,
}

/// Summary of one update pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Hooks that ran to completion.
    pub updates: usize,
    /// Hooks skipped because a dependency was missing.
    pub missing_dependencies: usize,
    /// Hooks that failed for any other reason.
    pub failures: Vec<UpdateFailure>,
}

/// Run one update pass over `scene` in `order`.
pub fn run_state_updates(
    scene: &mut Scene,
    physics: &dyn PhysicsBackend,
    order: &[StateKind],
    config: &StatesConfig,
    rng: &mut dyn RngCore,
    tick: u64,
) -> TickSummary {
    let snapshot = scene.index_snapshot();
    scene.invalidate_caches();

    let mut summary = TickSummary {
        tick,
        ..TickSummary::default()
    };

    for kind in order {
        let Some(objects) = snapshot.get(kind) else {
            continue;
        };
        for object in objects {
            let Some(mut instance) = scene.take_state(*object, *kind) else {
                continue;
            };
            let result = {
                let reader = StateReader::new(&*scene, physics, config);
                let mut ctx = StateContext::new(*object, reader, &mut *rng, tick);
                instance.update(&mut ctx)
            };
            scene.restore_state(*object, instance);

            match result {
                Ok(()) => summary.updates = summary.updates.saturating_add(1),
                Err(err) if err.is_missing_dependency() => {
                    debug!(object = %object, state = %kind, error = %err, "Update skipped");
                    summary.missing_dependencies = summary.missing_dependencies.saturating_add(1);
                }
                Err(err) => {
                    warn!(object = %object, state = %kind, error = %err, "State update failed");
                    summary.failures.push(UpdateFailure {
                        object: *object,
                        state: *kind,
                        error: err,
                    });
                }
            }
        }
    }

    debug!(
        tick,
        updates = summary.updates,
        missing = summary.missing_dependencies,
        failures = summary.failures.len(),
        "State update pass complete"
    );
    summary
}
