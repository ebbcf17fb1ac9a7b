//! Two-sided card flip driven by a continuous rotation.
//!
//! The host's animation facility interpolates `orientation` toward `target`
//! and feeds each intermediate value back through [`FlipController::set_orientation`].
//! Which face is drawn is always derived from the current orientation; the
//! swap happens at the edge-on midpoint.

use shared::domain::CardFace;

pub const FRONT_ORIENTATION: f64 = 0.0;
pub const BACK_ORIENTATION: f64 = 180.0;
pub const EDGE_ON_ORIENTATION: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipController {
    orientation: f64,
    target: f64,
}

impl Default for FlipController {
    fn default() -> Self {
        Self::new(false)
    }
}

impl FlipController {
    pub fn new(flipped: bool) -> Self {
        let resting = if flipped {
            BACK_ORIENTATION
        } else {
            FRONT_ORIENTATION
        };
        Self {
            orientation: resting,
            target: resting,
        }
    }

    /// Current rotation in degrees, within `[0, 180]`.
    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    /// Resting orientation the host should animate toward.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Retargets to the opposite extreme of the last request. The current,
    /// possibly intermediate, orientation is kept so the host animates from
    /// where the card is right now.
    pub fn toggle(&mut self) -> f64 {
        self.target = if self.target >= EDGE_ON_ORIENTATION {
            FRONT_ORIENTATION
        } else {
            BACK_ORIENTATION
        };
        self.target
    }

    /// Accepts an interpolated value from the host. Out of range values are
    /// clamped and non-finite values ignored.
    pub fn set_orientation(&mut self, orientation: f64) {
        if orientation.is_finite() {
            self.orientation = orientation.clamp(FRONT_ORIENTATION, BACK_ORIENTATION);
        }
    }

    /// Snaps back to the unflipped resting state.
    pub fn reset(&mut self) {
        *self = Self::new(false);
    }

    pub fn face_visible(&self) -> CardFace {
        face_for_orientation(self.orientation)
    }

    pub fn is_flipped(&self) -> bool {
        self.target == BACK_ORIENTATION
    }

    pub fn is_animating(&self) -> bool {
        self.orientation != self.target
    }

    pub fn front_opacity(&self) -> f64 {
        match self.face_visible() {
            CardFace::Front => 1.0,
            CardFace::Back => 0.0,
        }
    }

    pub fn back_opacity(&self) -> f64 {
        1.0 - self.front_opacity()
    }

    /// Fixed counter-rotation for back content so it reads upright once the
    /// card has turned past edge-on.
    pub fn back_face_rotation(&self) -> f64 {
        BACK_ORIENTATION
    }
}

pub fn face_for_orientation(orientation: f64) -> CardFace {
    if orientation < EDGE_ON_ORIENTATION {
        CardFace::Front
    } else {
        CardFace::Back
    }
}

#[cfg(test)]
#[path = "tests/flip_tests.rs"]
mod tests;
