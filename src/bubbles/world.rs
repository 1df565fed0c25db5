//! Physics World
//!
//! One rigid body per bubble inside a box of four static walls. Bodies are
//! slightly smaller than the drawn bubble so neighbours overlap a little
//! before they push each other apart.

use rand::Rng;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::layout::{LayoutBounds, Placement};

/// Physics tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub restitution: f32,
    pub friction: f32,
    /// Air resistance
    pub linear_damping: f32,
    pub density: f32,
    /// Collider radius as a share of the visual radius
    pub body_radius_ratio: f32,
    /// Magnitude of the random push applied each frame
    pub drift_force: f32,
    /// Max initial speed per axis, px/s
    pub initial_speed: f32,
    /// Frames per second; also the integration step
    pub frame_rate: u32,
    pub wall_thickness: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            restitution: 0.2,
            friction: 0.0,
            linear_damping: 0.9,
            density: 0.5,
            body_radius_ratio: 0.85,
            drift_force: 120_000.0,
            initial_speed: 90.0,
            frame_rate: 60,
            wall_thickness: 200.0,
        }
    }
}

/// Position of one bubble for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BubbleFrame {
    /// Index into the token list the layout was built from
    pub index: usize,
    pub size: f64,
    /// Top-left corner
    pub x: f64,
    pub y: f64,
}

impl BubbleFrame {
    /// CSS transform for the bubble element
    pub fn transform_css(&self) -> String {
        format!("translate3d({:.2}px, {:.2}px, 0) scale(1)", self.x, self.y)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }
}

struct BubbleBody {
    index: usize,
    size: f64,
    handle: RigidBodyHandle,
}

/// Rapier world holding the bubble bodies
pub struct BubbleWorld {
    config: PhysicsConfig,
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    query_pipeline: QueryPipeline,
    bubbles: Vec<BubbleBody>,
    steps: u64,
}

impl BubbleWorld {
    /// Build the world from initial placements.
    ///
    /// Each body starts at its placement with a random velocity of up to
    /// `initial_speed` per axis.
    pub fn new<R: Rng + ?Sized>(
        bounds: &LayoutBounds,
        placements: &[Placement],
        config: PhysicsConfig,
        rng: &mut R,
    ) -> Self {
        let mut params = IntegrationParameters::default();
        params.dt = 1.0 / config.frame_rate.max(1) as Real;

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        for wall in walls(bounds.width as Real, bounds.height as Real, config.wall_thickness) {
            colliders.insert(wall);
        }

        let speed = config.initial_speed;
        let bubbles = placements
            .iter()
            .map(|p| {
                let velocity = vector![
                    rng.gen_range(-1.0..=1.0) * speed,
                    rng.gen_range(-1.0..=1.0) * speed
                ];
                let body = RigidBodyBuilder::dynamic()
                    .translation(vector![p.x as Real, p.y as Real])
                    .linvel(velocity)
                    .linear_damping(config.linear_damping)
                    .lock_rotations()
                    .build();
                let handle = bodies.insert(body);

                let radius = (p.size as Real / 2.0) * config.body_radius_ratio;
                let collider = ColliderBuilder::ball(radius)
                    .restitution(config.restitution)
                    .friction(config.friction)
                    .density(config.density)
                    .build();
                colliders.insert_with_parent(collider, handle, &mut bodies);

                BubbleBody { index: p.index, size: p.size, handle }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Physics world created with {} bodies ({}x{})",
            bubbles.len(),
            bounds.width,
            bounds.height
        );

        Self {
            config,
            gravity: vector![0.0, 0.0],
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            bubbles,
            steps: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Number of physics steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Replace the accumulated force on every body with a push in a random direction
    pub fn apply_drift<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let magnitude = self.config.drift_force;
        for bubble in &self.bubbles {
            if let Some(body) = self.bodies.get_mut(bubble.handle) {
                let angle: Real = rng.gen_range(0.0..std::f32::consts::TAU);
                body.reset_forces(true);
                body.add_force(vector![angle.cos() * magnitude, angle.sin() * magnitude], true);
            }
        }
    }

    /// Advance the simulation by one frame
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
        self.steps += 1;
    }

    /// Current top-left position of every bubble
    pub fn frames(&self) -> Vec<BubbleFrame> {
        self.bubbles
            .iter()
            .filter_map(|b| {
                let body = self.bodies.get(b.handle)?;
                let t = body.translation();
                Some(BubbleFrame {
                    index: b.index,
                    size: b.size,
                    x: t.x as f64 - b.size / 2.0,
                    y: t.y as f64 - b.size / 2.0,
                })
            })
            .collect()
    }
}

/// Four static boxes whose inner faces line up with the viewport edges
fn walls(width: Real, height: Real, thickness: Real) -> [Collider; 4] {
    let half = thickness / 2.0;
    let long_x = width / 2.0 + thickness;
    let long_y = height / 2.0 + thickness;
    [
        // top and bottom
        ColliderBuilder::cuboid(long_x, half).translation(vector![width / 2.0, -half]).build(),
        ColliderBuilder::cuboid(long_x, half).translation(vector![width / 2.0, height + half]).build(),
        // left and right
        ColliderBuilder::cuboid(half, long_y).translation(vector![-half, height / 2.0]).build(),
        ColliderBuilder::cuboid(half, long_y).translation(vector![width + half, height / 2.0]).build(),
    ]
}
