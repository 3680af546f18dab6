use super::body::BodyRegion;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Arm positions read from one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureState {
    pub left_arm_up: bool,
    pub right_arm_up: bool,
    /// False when no body or no measurable torso was found
    pub is_gesture: bool,
}

impl GestureState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn both_arms_up(&self) -> bool {
        self.is_gesture && self.left_arm_up && self.right_arm_up
    }
}

/// Calls an arm "up" when its band span is a large enough fraction of the torso span
#[derive(Debug, Clone, Copy)]
pub struct GestureClassifier {
    arm_to_torso_ratio: f32,
}

impl GestureClassifier {
    pub fn new(arm_to_torso_ratio: f32) -> Self {
        Self { arm_to_torso_ratio }
    }

    pub fn classify(&self, body: &BodyRegion) -> GestureState {
        let span = match body.span() {
            Some(span) => span,
            None => return GestureState::none(),
        };

        let torso_width = span.torso_width();
        if torso_width == 0 {
            trace!("Torso has no width, no gesture");
            return GestureState::none();
        }

        let left_ratio = span.left_arm_width() as f32 / torso_width as f32;
        let right_ratio = span.right_arm_width() as f32 / torso_width as f32;

        trace!(
            "Arm ratios left {:.2} right {:.2} (need > {:.2})",
            left_ratio,
            right_ratio,
            self.arm_to_torso_ratio
        );

        GestureState {
            left_arm_up: left_ratio > self.arm_to_torso_ratio,
            right_arm_up: right_ratio > self.arm_to_torso_ratio,
            is_gesture: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::body::BodySpan;

    fn body(left: usize, torso: usize, right: usize, end: usize) -> BodyRegion {
        BodyRegion::Body(BodySpan {
            left_arm_start: left,
            torso_start: torso,
            right_arm_start: right,
            body_end: end,
            band_width_pixels: 8,
            total_intensity: 0,
        })
    }

    #[test]
    fn test_no_body_is_no_gesture() {
        let classifier = GestureClassifier::new(0.4);
        assert_eq!(classifier.classify(&BodyRegion::NoBody), GestureState::none());
    }

    #[test]
    fn test_zero_width_torso_is_no_gesture() {
        let classifier = GestureClassifier::new(0.4);
        let state = classifier.classify(&body(3, 3, 3, 3));
        assert!(!state.is_gesture);
        assert!(!state.left_arm_up);
        assert!(!state.right_arm_up);
    }

    #[test]
    fn test_ratio_equal_to_threshold_is_down() {
        // left arm 2 bands, torso 5 bands: ratio is exactly 0.4
        let classifier = GestureClassifier::new(0.4);
        let state = classifier.classify(&body(0, 2, 7, 7));
        assert!(state.is_gesture);
        assert!(!state.left_arm_up);
        assert!(!state.right_arm_up);
    }

    #[test]
    fn test_ratio_above_threshold_is_up() {
        // left arm 3 bands, torso 5 bands: ratio 0.6
        let classifier = GestureClassifier::new(0.4);
        let state = classifier.classify(&body(0, 3, 8, 8));
        assert!(state.is_gesture);
        assert!(state.left_arm_up);
        assert!(!state.right_arm_up);
    }

    #[test]
    fn test_both_arms_up() {
        let classifier = GestureClassifier::new(0.4);
        let state = classifier.classify(&body(0, 3, 8, 11));
        assert!(state.left_arm_up);
        assert!(state.right_arm_up);
        assert!(state.both_arms_up());
    }

    #[test]
    fn test_torso_only_body_is_gesture_with_arms_down() {
        let classifier = GestureClassifier::new(0.4);
        let state = classifier.classify(&body(4, 4, 9, 9));
        assert!(state.is_gesture);
        assert!(!state.left_arm_up && !state.right_arm_up);
    }
}
