//! Constrained random placement ("sample kinematics").
//!
//! Setting a placeable relation such as `inside` to `true` does not write a
//! boolean anywhere. The placer moves the object until the relation
//! predicate holds, by rejection search:
//!
//! 1. Perturb the prior orientation by a small random yaw.
//! 2. Sample a position for the object's box within the target's box (for
//!    `on_top`, over the target's footprint with the bottom on its top face).
//! 3. Commit the pose and settle the engine for a bounded number of
//!    substeps.
//! 4. Accept if the predicate holds and the object penetrates no body other
//!    than the target deeper than the configured tolerance.
//!
//! The first accepted candidate wins. When the attempt budget runs out, the
//! object's prior pose is restored and [`StateError::PlacementFailure`] is
//! returned.

// glam operators are float math and cannot overflow.
#![allow(clippy::arithmetic_side_effects)]

use objstate_physics::PhysicsBackend;
use objstate_types::{Aabb, DQuat, DVec3, ObjectId, Pose, StateKind};
use rand::{Rng, RngCore};
use tracing::{info, trace, warn};

use crate::config::{KinematicsConfig, PlacementConfig};
use crate::error::StateError;
use crate::kinematics::{is_placeable, relation_holds};

/// An accepted placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Candidates tried, including the accepted one.
    pub attempts: u32,
    /// Pose of the object after settling.
    pub pose: Pose,
}

/// Rejection-search placer for `inside` and `on_top`.
#[derive(Debug, Clone, Copy)]
pub struct RelativeStatePlacer<'a> {
    placement: &'a PlacementConfig,
    kinematics: &'a KinematicsConfig,
}

impl<'a> RelativeStatePlacer<'a> {
    /// Create a placer with the given tunables.
    pub const fn new(placement: &'a PlacementConfig, kinematics: &'a KinematicsConfig) -> Self {
        Self {
            placement,
            kinematics,
        }
    }

    /// Move `object` so that `relation(object, target)` holds.
    ///
    /// # Errors
    ///
    /// - [`StateError::UnsupportedOperation`] if `relation` cannot be
    ///   placed, or `object` and `target` are the same.
    /// - [`StateError::PlacementFailure`] if no candidate was accepted.
    /// - [`StateError::Physics`] if the backend fails; the prior pose is
    ///   restored on a best-effort basis.
    pub fn place(
        &self,
        physics: &mut dyn PhysicsBackend,
        rng: &mut dyn RngCore,
        relation: StateKind,
        object: ObjectId,
        target: ObjectId,
    ) -> Result<Placement, StateError> {
        if !is_placeable(relation) {
            return Err(StateError::unsupported(
                relation,
                "relation can only be queried, not placed",
            ));
        }
        if object == target {
            return Err(StateError::unsupported(
                relation,
                "an object cannot be placed relative to itself",
            ));
        }

        let prior = physics.pose(object)?;
        match self.search(physics, rng, relation, object, target, prior) {
            Ok(Some(placement)) => {
                info!(
                    object = %object,
                    target = %target,
                    state = %relation,
                    attempts = placement.attempts,
                    "Placement succeeded"
                );
                Ok(placement)
            }
            Ok(None) => {
                physics.set_pose(object, prior)?;
                warn!(
                    object = %object,
                    target = %target,
                    state = %relation,
                    attempts = self.placement.max_attempts,
                    "Placement failed, prior pose restored"
                );
                Err(StateError::PlacementFailure {
                    object,
                    relation,
                    target,
                    attempts: self.placement.max_attempts,
                })
            }
            Err(err) => {
                if let Err(restore) = physics.set_pose(object, prior) {
                    warn!(object = %object, error = %restore, "Could not restore prior pose");
                }
                Err(err)
            }
        }
    }

    fn search(
        &self,
        physics: &mut dyn PhysicsBackend,
        rng: &mut dyn RngCore,
        relation: StateKind,
        object: ObjectId,
        target: ObjectId,
        prior: Pose,
    ) -> Result<Option<Placement>, StateError> {
        let target_box = physics.aabb(target)?;

        for attempt in 1..=self.placement.max_attempts {
            let orientation = DQuat::from_rotation_z(self.sample_yaw(rng)) * prior.orientation;

            // Commit the orientation first so the rotated box size is known.
            physics.set_pose(
                object,
                Pose {
                    position: prior.position,
                    orientation,
                },
            )?;
            let rotated = physics.aabb(object)?;
            let origin_offset = prior.position - rotated.center();

            let center = sample_center(rng, relation, &target_box, rotated.half_extents());
            let candidate = Pose {
                position: center + origin_offset,
                orientation,
            };
            physics.set_pose(object, candidate)?;
            physics.step(self.placement.settle_substeps);

            if self.accepts(physics, relation, object, target)? {
                return Ok(Some(Placement {
                    attempts: attempt,
                    pose: physics.pose(object)?,
                }));
            }
            trace!(object = %object, attempt, "Placement candidate rejected");
        }

        Ok(None)
    }

    fn sample_yaw(&self, rng: &mut dyn RngCore) -> f64 {
        let jitter = self.placement.orientation_jitter.abs();
        if jitter > 0.0 {
            rng.random_range(-jitter..=jitter)
        } else {
            0.0
        }
    }

    fn accepts(
        &self,
        physics: &dyn PhysicsBackend,
        relation: StateKind,
        object: ObjectId,
        target: ObjectId,
    ) -> Result<bool, StateError> {
        let own = physics.aabb(object)?;
        let other = physics.aabb(target)?;
        if !relation_holds(relation, &own, &other, self.kinematics) {
            return Ok(false);
        }
        let clear = physics
            .contacts(object)?
            .iter()
            .filter(|contact| contact.body_b != target)
            .all(|contact| contact.penetration_depth <= self.placement.max_penetration);
        Ok(clear)
    }
}

/// Sample a center for a box of `half` extents relative to `target`.
fn sample_center(rng: &mut dyn RngCore, relation: StateKind, target: &Aabb, half: DVec3) -> DVec3 {
    let x = sample_axis(rng, target.min.x, target.max.x, half.x);
    let y = sample_axis(rng, target.min.y, target.max.y, half.y);
    let z = if relation == StateKind::OnTop {
        target.max.z + half.z
    } else {
        sample_axis(rng, target.min.z, target.max.z, half.z)
    };
    DVec3::new(x, y, z)
}

/// A coordinate keeping `[c - half, c + half]` within `[min, max]`, or the
/// midpoint when the interval is too small.
fn sample_axis(rng: &mut dyn RngCore, min: f64, max: f64, half: f64) -> f64 {
    let lo = min + half;
    let hi = max - half;
    if lo < hi {
        rng.random_range(lo..=hi)
    } else {
        (min + max) * 0.5
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use objstate_physics::KinematicWorld;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::kinematics::{inside, on_top};

    struct Fixture {
        world: KinematicWorld,
        cabinet: ObjectId,
        cup: ObjectId,
    }

    fn fixture(cup_half: f64) -> Fixture {
        let mut world = KinematicWorld::new();
        let cabinet = ObjectId::new();
        let cup = ObjectId::new();
        world
            .add_box(
                cabinet,
                DVec3::new(0.5, 0.4, 0.6),
                Pose::from_position(DVec3::new(0.0, 0.0, 0.6)),
            )
            .unwrap();
        world
            .add_box(
                cup,
                DVec3::splat(cup_half),
                Pose::from_position(DVec3::new(3.0, 0.0, cup_half)),
            )
            .unwrap();
        Fixture { world, cabinet, cup }
    }

    #[test]
    fn inside_placement_makes_predicate_true() {
        let Fixture {
            mut world,
            cabinet,
            cup,
        } = fixture(0.05);
        let placement_cfg = PlacementConfig::default();
        let kinematics_cfg = KinematicsConfig::default();
        let placer = RelativeStatePlacer::new(&placement_cfg, &kinematics_cfg);
        let mut rng = SmallRng::seed_from_u64(42);

        let placement = placer
            .place(&mut world, &mut rng, StateKind::Inside, cup, cabinet)
            .unwrap();

        assert!(placement.attempts >= 1);
        assert!(inside(
            &world.aabb(cup).unwrap(),
            &world.aabb(cabinet).unwrap()
        ));
        assert_eq!(world.pose(cup).unwrap(), placement.pose);
    }

    #[test]
    fn on_top_placement_rests_on_top_face() {
        let Fixture {
            mut world,
            cabinet,
            cup,
        } = fixture(0.05);
        let placement_cfg = PlacementConfig::default();
        let kinematics_cfg = KinematicsConfig::default();
        let placer = RelativeStatePlacer::new(&placement_cfg, &kinematics_cfg);
        let mut rng = SmallRng::seed_from_u64(7);

        placer
            .place(&mut world, &mut rng, StateKind::OnTop, cup, cabinet)
            .unwrap();

        assert!(on_top(
            &world.aabb(cup).unwrap(),
            &world.aabb(cabinet).unwrap(),
            kinematics_cfg.contact_tolerance
        ));
    }

    #[test]
    fn oversized_object_fails_and_restores_prior_pose() {
        let Fixture {
            mut world,
            cabinet,
            cup,
        } = fixture(2.0);
        let before = world.pose(cup).unwrap();
        let placement_cfg = PlacementConfig {
            max_attempts: 5,
            ..PlacementConfig::default()
        };
        let kinematics_cfg = KinematicsConfig::default();
        let placer = RelativeStatePlacer::new(&placement_cfg, &kinematics_cfg);
        let mut rng = SmallRng::seed_from_u64(1);

        let err = placer
            .place(&mut world, &mut rng, StateKind::Inside, cup, cabinet)
            .unwrap_err();

        assert_eq!(
            err,
            StateError::PlacementFailure {
                object: cup,
                relation: StateKind::Inside,
                target: cabinet,
                attempts: 5,
            }
        );
        assert_eq!(world.pose(cup).unwrap(), before);
    }

    #[test]
    fn query_only_relations_are_unsupported() {
        let Fixture {
            mut world,
            cabinet,
            cup,
        } = fixture(0.05);
        let placement_cfg = PlacementConfig::default();
        let kinematics_cfg = KinematicsConfig::default();
        let placer = RelativeStatePlacer::new(&placement_cfg, &kinematics_cfg);
        let mut rng = SmallRng::seed_from_u64(3);

        let err = placer
            .place(&mut world, &mut rng, StateKind::NextTo, cup, cabinet)
            .unwrap_err();
        assert!(matches!(err, StateError::UnsupportedOperation { .. }));

        let err = placer
            .place(&mut world, &mut rng, StateKind::Inside, cup, cup)
            .unwrap_err();
        assert!(matches!(err, StateError::UnsupportedOperation { .. }));
    }

    #[test]
    fn blocked_by_third_body_is_rejected() {
        let Fixture {
            mut world,
            cabinet,
            cup,
        } = fixture(0.3);
        // Fill the cabinet with a body the cup would have to penetrate.
        let filler = ObjectId::new();
        world
            .add_box(
                filler,
                DVec3::new(0.45, 0.35, 0.55),
                Pose::from_position(DVec3::new(0.0, 0.0, 0.6)),
            )
            .unwrap();
        let placement_cfg = PlacementConfig {
            max_attempts: 10,
            orientation_jitter: 0.0,
            ..PlacementConfig::default()
        };
        let kinematics_cfg = KinematicsConfig::default();
        let placer = RelativeStatePlacer::new(&placement_cfg, &kinematics_cfg);
        let mut rng = SmallRng::seed_from_u64(11);

        let err = placer
            .place(&mut world, &mut rng, StateKind::Inside, cup, cabinet)
            .unwrap_err();
        assert!(matches!(err, StateError::PlacementFailure { attempts: 10, .. }));
    }
}
