//! Bubble Animator
//!
//! Drives a [`BubbleWorld`] frame by frame and mirrors body positions onto a
//! [`FrameSink`]. While paused the frame loop keeps ticking but the world is
//! frozen.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::world::{BubbleFrame, BubbleWorld};

/// Receives bubble positions once per frame
pub trait FrameSink: Send {
    fn write_frames(&mut self, frames: &[BubbleFrame]);
}

/// Sink that keeps only the latest frame
#[derive(Debug, Default, Clone)]
pub struct LatestFrame {
    pub frames: Vec<BubbleFrame>,
    pub writes: u64,
}

impl FrameSink for LatestFrame {
    fn write_frames(&mut self, frames: &[BubbleFrame]) {
        self.frames.clear();
        self.frames.extend_from_slice(frames);
        self.writes += 1;
    }
}

/// Shared pause switch, e.g. held by the token detail view
#[derive(Debug, Clone, Default)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    pub fn pause(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owns the physics world for one layout
pub struct BubbleAnimator {
    world: BubbleWorld,
    pause: PauseHandle,
    rng: StdRng,
    frames: u64,
}

impl BubbleAnimator {
    pub fn new(world: BubbleWorld, pause: PauseHandle) -> Self {
        Self { world, pause, rng: StdRng::from_entropy(), frames: 0 }
    }

    /// Use a fixed seed for the drift forces
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    pub fn world(&self) -> &BubbleWorld {
        &self.world
    }

    /// Frames produced so far, paused ones included
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Run one animation frame. Returns false when the world was paused.
    pub fn tick(&mut self, sink: &mut dyn FrameSink) -> bool {
        self.frames += 1;
        let stepped = if self.pause.is_paused() {
            false
        } else {
            self.world.apply_drift(&mut self.rng);
            self.world.step();
            true
        };
        sink.write_frames(&self.world.frames());
        stepped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubbles::world::PhysicsConfig;
    use crate::domain::layout::{compute_sizes, place_bubbles, LayoutBounds, SizingConfig};
    use crate::domain::token::fixtures::token;
    use crate::domain::token::SizeMetric;

    fn animator() -> BubbleAnimator {
        let bounds = LayoutBounds::for_viewport(600.0, 600.0, &SizingConfig::default());
        let tokens: Vec<_> = (0..6).map(|i| token(&format!("B{}", i), Some(10f64.powi(i + 3)), None)).collect();
        let plan = compute_sizes(&tokens, SizeMetric::MarketCap, bounds);
        let mut rng = StdRng::seed_from_u64(5);
        let placements = place_bubbles(&plan, &mut rng);
        let world = BubbleWorld::new(&bounds, &placements, PhysicsConfig::default(), &mut rng);
        BubbleAnimator::new(world, PauseHandle::default()).with_seed(9)
    }

    #[test]
    fn test_tick_writes_every_frame() {
        let mut anim = animator();
        let mut sink = LatestFrame::default();

        assert!(anim.tick(&mut sink));
        assert!(anim.tick(&mut sink));
        assert_eq!(sink.writes, 2);
        assert_eq!(sink.frames.len(), 6);
        assert_eq!(anim.world().steps(), 2);
    }

    #[test]
    fn test_paused_world_is_frozen() {
        let mut anim = animator();
        let mut sink = LatestFrame::default();
        for _ in 0..10 {
            anim.tick(&mut sink);
        }

        let pause = anim.pause_handle();
        pause.pause();
        let frozen = sink.frames.clone();
        for _ in 0..10 {
            assert!(!anim.tick(&mut sink));
        }
        assert_eq!(sink.frames, frozen);
        assert_eq!(anim.world().steps(), 10);
        assert_eq!(anim.frame_count(), 20);

        pause.resume();
        assert!(anim.tick(&mut sink));
        assert_eq!(anim.world().steps(), 11);
    }
}
