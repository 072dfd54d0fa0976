//! Read access to the scene and physics while states update.
//!
//! States never hold references to other objects. Everything they learn
//! about the world goes through a [`StateReader`]: the scene (via
//! [`SceneView`]), the physics backend, and the state configuration.
//! Update and set hooks additionally receive a [`StateContext`] carrying
//! the owning object, the tick number, and the simulation RNG.

use objstate_physics::PhysicsBackend;
use objstate_types::{Aabb, ContactPoint, ObjectId, Pose, StateKind, StateValue, ValueKind};
use rand::RngCore;

use crate::config::StatesConfig;
use crate::error::StateError;
use crate::instance::StateInstance;
use crate::state_set::ObjectStateSet;

/// What a state may see of the scene.
pub trait SceneView {
    /// The state set of `object`, if the object is live.
    fn states_of(&self, object: ObjectId) -> Option<&ObjectStateSet>;

    /// Every live object carrying `kind`, in a stable order.
    fn objects_with_state(&self, kind: StateKind) -> Vec<ObjectId>;
}

/// Read-only handle over the scene, the physics engine, and configuration.
#[derive(Clone, Copy)]
pub struct StateReader<'a> {
    /// Scene the states live in.
    pub scene: &'a dyn SceneView,
    /// Physics engine for geometry queries.
    pub physics: &'a dyn PhysicsBackend,
    /// Tunables for every state family.
    pub config: &'a StatesConfig,
}

impl<'a> StateReader<'a> {
    /// Bundle a reader.
    pub fn new(
        scene: &'a dyn SceneView,
        physics: &'a dyn PhysicsBackend,
        config: &'a StatesConfig,
    ) -> Self {
        Self {
            scene,
            physics,
            config,
        }
    }

    /// The instance of `kind` on `object`.
    ///
    /// # Errors
    ///
    /// [`StateError::UnknownObject`] if the object is not live,
    /// [`StateError::MissingDependencyValue`] if it lacks the state.
    pub fn instance(&self, object: ObjectId, kind: StateKind) -> Result<&'a StateInstance, StateError> {
        self.scene
            .states_of(object)
            .ok_or(StateError::UnknownObject(object))?
            .get(kind)
            .ok_or(StateError::MissingDependencyValue {
                object,
                state: kind,
            })
    }

    /// Current value of an absolute state.
    ///
    /// # Errors
    ///
    /// As [`Self::instance`], plus whatever the state itself reports.
    pub fn value(&self, object: ObjectId, kind: StateKind) -> Result<StateValue, StateError> {
        self.instance(object, kind)?.value(self)
    }

    /// Current value of a relative state between `object` and `target`.
    ///
    /// # Errors
    ///
    /// As [`Self::instance`], plus whatever the state itself reports.
    pub fn relation(
        &self,
        object: ObjectId,
        kind: StateKind,
        target: ObjectId,
    ) -> Result<bool, StateError> {
        self.instance(object, kind)?.relation(target, self)
    }

    /// Boolean value of an absolute state.
    ///
    /// # Errors
    ///
    /// As [`Self::value`], or [`StateError::ValueKindMismatch`].
    pub fn flag(&self, object: ObjectId, kind: StateKind) -> Result<bool, StateError> {
        let value = self.value(object, kind)?;
        value.as_bool().ok_or(StateError::ValueKindMismatch {
            state: kind,
            expected: ValueKind::Bool,
            actual: value.kind(),
        })
    }

    /// Scalar value of an absolute state.
    ///
    /// # Errors
    ///
    /// As [`Self::value`], or [`StateError::ValueKindMismatch`].
    pub fn float(&self, object: ObjectId, kind: StateKind) -> Result<f64, StateError> {
        let value = self.value(object, kind)?;
        value.as_float().ok_or(StateError::ValueKindMismatch {
            state: kind,
            expected: ValueKind::Float,
            actual: value.kind(),
        })
    }

    /// Bounding box of `object` through its `aabb` state.
    ///
    /// # Errors
    ///
    /// As [`Self::value`].
    pub fn aabb(&self, object: ObjectId) -> Result<Aabb, StateError> {
        let value = self.value(object, StateKind::Aabb)?;
        value.as_aabb().copied().ok_or(StateError::ValueKindMismatch {
            state: StateKind::Aabb,
            expected: ValueKind::Aabb,
            actual: value.kind(),
        })
    }

    /// Pose of `object` through its `pose` state.
    ///
    /// # Errors
    ///
    /// As [`Self::value`].
    pub fn pose(&self, object: ObjectId) -> Result<Pose, StateError> {
        let value = self.value(object, StateKind::Pose)?;
        value.as_pose().copied().ok_or(StateError::ValueKindMismatch {
            state: StateKind::Pose,
            expected: ValueKind::Pose,
            actual: value.kind(),
        })
    }

    /// Contacts of `object` through its `contact_bodies` state.
    ///
    /// # Errors
    ///
    /// As [`Self::value`].
    pub fn contacts(&self, object: ObjectId) -> Result<Vec<ContactPoint>, StateError> {
        match self.value(object, StateKind::ContactBodies)? {
            StateValue::Contacts(contacts) => Ok(contacts),
            other => Err(StateError::ValueKindMismatch {
                state: StateKind::ContactBodies,
                expected: ValueKind::Contacts,
                actual: other.kind(),
            }),
        }
    }

    /// Every live object carrying `kind`.
    pub fn objects_with_state(&self, kind: StateKind) -> Vec<ObjectId> {
        self.scene.objects_with_state(kind)
    }
}

/// Everything an update or set hook receives.
pub struct StateContext<'a> {
    /// The object whose state is running.
    pub owner: ObjectId,
    /// Scene and physics access.
    pub reader: StateReader<'a>,
    /// Simulation RNG.
    pub rng: &'a mut dyn RngCore,
    /// Tick number being evaluated.
    pub tick: u64,
}

impl<'a> StateContext<'a> {
    /// Bundle a context.
    pub fn new(owner: ObjectId, reader: StateReader<'a>, rng: &'a mut dyn RngCore, tick: u64) -> Self {
        Self {
            owner,
            reader,
            rng,
            tick,
        }
    }

    /// Bounding box of the owner.
    ///
    /// # Errors
    ///
    /// As [`StateReader::aabb`].
    pub fn own_aabb(&self) -> Result<Aabb, StateError> {
        self.reader.aabb(self.owner)
    }

    /// Boolean value of one of the owner's other states, or `None` if the
    /// owner does not carry it.
    ///
    /// # Errors
    ///
    /// Any error other than a missing state.
    pub fn own_optional_flag(&self, kind: StateKind) -> Result<Option<bool>, StateError> {
        match self.reader.flag(self.owner, kind) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_missing_dependency() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
