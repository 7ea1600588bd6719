use crate::foundation::core::{Affine, Canvas, Vec2};

const SCALE_AMPLITUDE: f64 = 0.05;
const SCALE_RATE: f64 = 0.0002;
const PAN_AMPLITUDE_PX: f64 = 20.0;
const PAN_RATE: f64 = 0.0001;

/// Slow zoom/pan applied to a scene background.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneTransform {
    /// Uniform zoom factor, always within `[0.95, 1.05]`.
    pub scale: f64,
    /// Horizontal offset in pixels, always within `[-20, 20]`.
    pub pan_x: f64,
}

impl SceneTransform {
    /// Affine that zooms about the canvas centre and then pans horizontally.
    pub fn to_affine(self, canvas: Canvas) -> Affine {
        let c = canvas.center().to_vec2();
        Affine::translate(c + Vec2::new(self.pan_x, 0.0))
            * Affine::scale(self.scale)
            * Affine::translate(-c)
    }
}

/// Deterministic background motion at `elapsed_ms` since the scene became visible.
///
/// Periodic: the zoom repeats every `10000 * PI` ms (its distance from 1.0 every `5000 * PI`
/// ms) and the pan every `20000 * PI` ms.
pub fn transform(elapsed_ms: f64) -> SceneTransform {
    SceneTransform {
        scale: 1.0 + SCALE_AMPLITUDE * (elapsed_ms * SCALE_RATE).sin(),
        pan_x: PAN_AMPLITUDE_PX * (elapsed_ms * PAN_RATE).sin(),
    }
}

/// Tracks the time origin of the visible scene.
///
/// The origin moves whenever the observed scene index changes, so motion restarts per scene
/// rather than running from the start of playback or recording.
#[derive(Clone, Copy, Debug, Default)]
pub struct Animator {
    scene: Option<usize>,
    origin_ms: u64,
}

impl Animator {
    /// Fresh animator with no scene observed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Note the visible scene at `now_ms` and return elapsed time since it became visible.
    pub fn observe(&mut self, scene_index: usize, now_ms: u64) -> f64 {
        if self.scene != Some(scene_index) {
            self.scene = Some(scene_index);
            self.origin_ms = now_ms;
        }
        now_ms.saturating_sub(self.origin_ms) as f64
    }

    /// Forget the observed scene; the next observation starts a new origin.
    pub fn reset(&mut self) {
        self.scene = None;
        self.origin_ms = 0;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ken_burns.rs"]
mod tests;
