//! The demo kitchen scene.
//!
//! A table with a dusty plate and a stained shirt, a sink, a sponge, a rag,
//! and a stove with an apple on it. Scripted actions move the cleaners onto
//! the dirty objects part-way through the run so that state transitions
//! show up in the logs.

use std::collections::BTreeMap;

use objstate_core::Simulator;
use objstate_physics::KinematicWorld;
use objstate_states::AbilityParams;
use objstate_types::{Ability, DVec3, ObjectId, Pose, StateKind, StateValue};
use serde_json::json;
use tracing::info;

use crate::error::EngineError;

/// Tick at which the rag is laid on the plate.
const RAG_TICK: u64 = 5;

/// Tick at which the soaked sponge is laid on the shirt.
const SPONGE_TICK: u64 = 10;

/// Identifiers of the demo objects.
#[derive(Debug, Clone, Copy)]
pub struct DemoScene {
    /// Static furniture everything else rests on.
    pub table: ObjectId,
    /// Dusty until the rag covers it.
    pub plate: ObjectId,
    /// Stained until a soaked cleaner covers it.
    pub shirt: ObjectId,
    /// Dry cleaning tool.
    pub rag: ObjectId,
    /// Cleaning tool that soaks in the sink.
    pub sponge: ObjectId,
    /// Water source.
    pub sink: ObjectId,
    /// Heat source behind a switch.
    pub stove: ObjectId,
    /// Cooks on the stove.
    pub apple: ObjectId,
}

/// One body to create.
struct Body<'a> {
    name: &'a str,
    abilities: BTreeMap<Ability, AbilityParams>,
    center: DVec3,
    half_extents: DVec3,
}

fn plain(list: &[Ability]) -> BTreeMap<Ability, AbilityParams> {
    list.iter().map(|a| (*a, AbilityParams::new())).collect()
}

fn spawn(sim: &mut Simulator<KinematicWorld>, body: Body<'_>) -> Result<ObjectId, EngineError> {
    let id = ObjectId::new();
    sim.physics_mut()
        .add_box(id, body.half_extents, Pose::from_position(body.center))?;
    sim.import_object(id, body.name, body.abilities, true)?;
    Ok(id)
}

/// Create the bodies, import them, and arrange the starting layout.
///
/// # Errors
///
/// Returns an error if a body cannot be added or a placement fails.
pub fn build(sim: &mut Simulator<KinematicWorld>) -> Result<DemoScene, EngineError> {
    let table = spawn(
        sim,
        Body {
            name: "table",
            abilities: BTreeMap::new(),
            center: DVec3::new(0.0, 0.0, 0.4),
            half_extents: DVec3::new(1.0, 0.6, 0.4),
        },
    )?;
    let plate = spawn(
        sim,
        Body {
            name: "plate",
            abilities: plain(&[Ability::Dustable]),
            center: DVec3::new(5.0, 0.0, 0.01),
            half_extents: DVec3::new(0.12, 0.12, 0.01),
        },
    )?;
    let shirt = spawn(
        sim,
        Body {
            name: "shirt",
            abilities: plain(&[Ability::Scrubbable]),
            center: DVec3::new(5.0, 2.0, 0.005),
            half_extents: DVec3::new(0.1, 0.1, 0.005),
        },
    )?;
    let rag = spawn(
        sim,
        Body {
            name: "rag",
            abilities: plain(&[Ability::CleaningTool]),
            center: DVec3::new(6.0, 0.0, 0.01),
            half_extents: DVec3::new(0.15, 0.15, 0.01),
        },
    )?;
    let sponge = spawn(
        sim,
        Body {
            name: "sponge",
            abilities: plain(&[Ability::CleaningTool, Ability::Soakable]),
            center: DVec3::new(7.0, 0.0, 0.03),
            half_extents: DVec3::new(0.05, 0.05, 0.03),
        },
    )?;
    let sink = spawn(
        sim,
        Body {
            name: "sink",
            abilities: plain(&[Ability::WaterSource]),
            center: DVec3::new(3.0, 0.0, 0.3),
            half_extents: DVec3::splat(0.3),
        },
    )?;

    let mut stove_params = AbilityParams::new();
    stove_params.insert("temperature".to_owned(), json!(220.0));
    stove_params.insert("distance_threshold".to_owned(), json!(0.5));
    let stove = spawn(
        sim,
        Body {
            name: "stove",
            abilities: BTreeMap::from([
                (Ability::HeatSource, stove_params),
                (Ability::Toggleable, AbilityParams::new()),
            ]),
            center: DVec3::new(-3.0, 0.0, 0.45),
            half_extents: DVec3::new(0.3, 0.3, 0.45),
        },
    )?;
    let apple = spawn(
        sim,
        Body {
            name: "apple",
            abilities: plain(&[Ability::Cookable, Ability::Burnable]),
            center: DVec3::new(8.0, 0.0, 0.04),
            half_extents: DVec3::splat(0.04),
        },
    )?;

    sim.set_relation(plate, StateKind::OnTop, table, true)?;
    sim.set_relation(shirt, StateKind::OnTop, table, true)?;
    sim.set_relation(sponge, StateKind::Inside, sink, true)?;
    sim.set_relation(apple, StateKind::OnTop, stove, true)?;
    sim.set_state(plate, StateKind::Dirty, true)?;
    sim.set_state(shirt, StateKind::Stained, true)?;
    sim.set_state(stove, StateKind::ToggledOn, true)?;

    info!(objects = sim.scene().len(), "Demo scene built");
    Ok(DemoScene {
        table,
        plate,
        shirt,
        rag,
        sponge,
        sink,
        stove,
        apple,
    })
}

/// Run the scripted action due at `tick`, if any.
///
/// # Errors
///
/// Returns an error if a placement fails.
pub fn scripted_actions(
    sim: &mut Simulator<KinematicWorld>,
    scene: &DemoScene,
    tick: u64,
) -> Result<(), EngineError> {
    match tick {
        RAG_TICK => {
            sim.set_relation(scene.rag, StateKind::OnTop, scene.plate, true)?;
            info!(tick, "Rag laid on the plate");
        }
        SPONGE_TICK => {
            sim.set_relation(scene.sponge, StateKind::OnTop, scene.shirt, true)?;
            info!(tick, "Sponge laid on the shirt");
        }
        _ => {}
    }
    Ok(())
}

/// A state whose changes are logged.
#[derive(Debug, Clone)]
struct Watched {
    name: &'static str,
    object: ObjectId,
    state: StateKind,
    last: Option<StateValue>,
}

/// Logs a line whenever a watched state changes value.
#[derive(Debug, Clone)]
pub struct Watcher {
    watched: Vec<Watched>,
}

impl Watcher {
    /// Watch the interesting boolean states of the demo scene.
    pub fn new(scene: &DemoScene) -> Self {
        let entries = [
            ("plate", scene.plate, StateKind::Dirty),
            ("shirt", scene.shirt, StateKind::Stained),
            ("sponge", scene.sponge, StateKind::Soaked),
            ("stove", scene.stove, StateKind::HeatSource),
            ("apple", scene.apple, StateKind::Cooked),
            ("apple", scene.apple, StateKind::Burnt),
        ];
        Self {
            watched: entries
                .into_iter()
                .map(|(name, object, state)| Watched {
                    name,
                    object,
                    state,
                    last: None,
                })
                .collect(),
        }
    }

    /// Compare every watched state with its previous value.
    pub fn report(&mut self, sim: &Simulator<KinematicWorld>) {
        let tick = sim.tick_count();
        for entry in &mut self.watched {
            let Ok(value) = sim.get_state(entry.object, entry.state) else {
                continue;
            };
            if entry.last.as_ref() != Some(&value) {
                info!(
                    tick,
                    object = entry.name,
                    state = %entry.state,
                    value = ?value,
                    "State changed"
                );
                entry.last = Some(value);
            }
        }
    }
}
