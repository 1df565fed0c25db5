//! Bubble animation: rapier2d world and the per-frame driver

pub mod world;
pub mod animator;

pub use world::{BubbleFrame, BubbleWorld, PhysicsConfig};
pub use animator::{BubbleAnimator, FrameSink, LatestFrame, PauseHandle};
