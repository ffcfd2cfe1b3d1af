//! Headless Collision Demo
//!
//! Runs a small arena through the collision pipeline without a window:
//! - A ring of asteroids drifting towards the center
//! - An immovable wall they get pushed out of
//! - Pickups that only collide with the player
//! - Per-frame statistics logged, debug geometry flattened to line vertices
//!
//! Usage: `collision_demo [config.toml|config.ron]`
//! Set `RUST_LOG=info` (or `debug` for per-frame pipeline logs).

use collision2d::foundation::logging;
use collision2d::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

// Arena settings
const NUM_ASTEROIDS: usize = 12;
const RING_RADIUS: f32 = 12.0;
const ASTEROID_RADIUS: f32 = 1.2;
const ASTEROID_SPEED: f32 = 4.0;

// Simulation settings
const FRAMES: u64 = 240;
const DELTA_TIME: f32 = 1.0 / 60.0;
const REPORT_EVERY: u64 = 60;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("shape: {0}")]
    Shape(#[from] ShapeError),
}

struct Body {
    handle: ColliderHandle,
    transform: Rc<RefCell<Transform2D>>,
    velocity: Vec2,
    spin: f32,
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading simulation config from {}", path);
            SimulationConfig::load_from_file(&path)?
        }
        None => SimulationConfig {
            broadphase: BroadphaseKind::UniformGrid { cell_size: 4.0 },
            ..Default::default()
        },
    };

    let mut simulation = CollisionSimulation::from_config(&config)?;
    let mut rng = StdRng::seed_from_u64(7);
    let bodies = spawn_asteroids(&mut simulation, &mut rng)?;

    let wall = Transform2D::identity().shared();
    let wall_handle = simulation.create_collider(
        wall,
        Shape::rectangle(0.5, 4.0)?.shared(),
        BoundingVolumeKind::Aabb,
    );
    if let Some(collider) = simulation.collider_mut(wall_handle) {
        collider.set_immovable(true);
        collider.set_layers(CollisionLayers::ENVIRONMENT, CollisionLayers::all());
    }

    let pickups = spawn_pickups(&mut simulation)?;

    let hits = Rc::new(RefCell::new(0_usize));
    let counter = Rc::clone(&hits);
    simulation.subscribe_narrowphase(Box::new(move |result: &NarrowphaseResult| {
        if result.depth > 0.0 {
            *counter.borrow_mut() += 1;
        }
        Propagation::Continue
    }));

    let mut visualizer = CollisionDebugVisualizer::new();
    visualizer.show_pairs = true;
    visualizer.draw_marker("origin", Point2::origin());

    for frame in 1..=FRAMES {
        for body in &bodies {
            let mut transform = body.transform.borrow_mut();
            transform.translate(body.velocity * DELTA_TIME);
            transform.rotate(body.spin * DELTA_TIME);
        }

        // Halfway through, retire the pickups
        if frame == FRAMES / 2 {
            for handle in &pickups {
                if let Err(e) = simulation.destroy_collider(*handle) {
                    log::warn!("Could not remove pickup: {}", e);
                }
            }
        }

        let stats = simulation.update();

        visualizer.draw_simulation(&simulation);
        let vertices = visualizer.line_vertices();
        visualizer.update(DELTA_TIME);

        if frame % REPORT_EVERY == 0 {
            log::info!(
                "Frame {}: {} colliders, {} candidate pairs, {} filtered, {} results, {} debug vertices",
                stats.frame,
                simulation.len(),
                stats.candidate_pairs,
                stats.filtered_pairs,
                stats.narrowphase_results,
                vertices.len()
            );
        }
    }

    for body in &bodies {
        if simulation.is_colliding(body.handle) {
            log::debug!("{:?} still touching at {:?}", body.handle, body.transform.borrow().position());
        }
    }

    log::info!(
        "Finished {} frames with {} penetrating contacts",
        simulation.frame(),
        hits.borrow()
    );
    Ok(())
}

fn spawn_asteroids(simulation: &mut CollisionSimulation, rng: &mut StdRng) -> Result<Vec<Body>, DemoError> {
    let mut bodies = Vec::with_capacity(NUM_ASTEROIDS);
    for i in 0..NUM_ASTEROIDS {
        let angle = std::f32::consts::TAU * i as f32 / NUM_ASTEROIDS as f32;
        let position = Vec2::new(angle.cos(), angle.sin()) * RING_RADIUS;
        let transform = Transform2D::from_position(position)
            .with_rotation(rng.gen_range(0.0..std::f32::consts::TAU))
            .shared();
        let sides = rng.gen_range(5..9);
        let shape = Shape::regular_polygon(sides, ASTEROID_RADIUS)?.shared();

        // Odd asteroids get circles to exercise both volume kinds
        let kind = if i % 2 == 0 { BoundingVolumeKind::Aabb } else { BoundingVolumeKind::Circle };
        let handle = simulation.create_collider(transform.clone(), shape, kind);
        if let Some(collider) = simulation.collider_mut(handle) {
            collider.set_layers(CollisionLayers::ENEMY, CollisionLayers::ENEMY | CollisionLayers::ENVIRONMENT);
        }

        bodies.push(Body {
            handle,
            transform,
            velocity: -position.normalize() * ASTEROID_SPEED * rng.gen_range(0.5..1.0),
            spin: rng.gen_range(-1.0..1.0),
        });
    }
    Ok(bodies)
}

fn spawn_pickups(simulation: &mut CollisionSimulation) -> Result<Vec<ColliderHandle>, DemoError> {
    let shape = Shape::square(0.3)?.shared();
    let mut handles = Vec::new();
    for x in [-6.0, 6.0] {
        let transform = Transform2D::from_position(Vec2::new(x, 6.0)).shared();
        let handle = simulation.create_collider(transform, shape.clone(), BoundingVolumeKind::Circle);
        if let Some(collider) = simulation.collider_mut(handle) {
            collider.set_layers(CollisionLayers::PICKUP, CollisionLayers::PLAYER);
        }
        handles.push(handle);
    }
    Ok(handles)
}
