//! Debug markings drawn onto a detection mask.

use crate::analyzer::{BodyRegion, DetectionResult, GestureState};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

const MARK: Luma<u8> = Luma([255]);

const BODY_BAR_Y: i32 = 20;
const TORSO_BAR_Y: i32 = 30;
const BAR_THICKNESS: u32 = 5;

const LEFT_MARKER_X: i32 = 100;
const RIGHT_MARKER_X: i32 = 130;
const ARM_UP_Y: i32 = 100;
const ARM_DOWN_Y: i32 = 130;
const MARKER_RADIUS: i32 = 10;

/// Horizontal bars over the whole body (y=20) and the torso (y=30)
pub fn draw_body_positions(mask: &mut GrayImage, body: &BodyRegion) {
    if let Some(span) = body.span() {
        let (body_start, body_end) = span.body_pixels();
        draw_bar(mask, body_start, body_end, BODY_BAR_Y);

        let (torso_start, torso_end) = span.torso_pixels();
        draw_bar(mask, torso_start, torso_end, TORSO_BAR_Y);
    }
}

/// One circle per arm, raised when the arm is up, over a reference line at y=115
pub fn draw_gestures(mask: &mut GrayImage, gesture: &GestureState) {
    if !gesture.is_gesture {
        return;
    }

    let left_y = if gesture.left_arm_up { ARM_UP_Y } else { ARM_DOWN_Y };
    let right_y = if gesture.right_arm_up { ARM_UP_Y } else { ARM_DOWN_Y };

    draw_marker(mask, (LEFT_MARKER_X, left_y));
    draw_marker(mask, (RIGHT_MARKER_X, right_y));
    draw_line_segment_mut(mask, (80.0, 115.0), (150.0, 115.0), MARK);
}

/// Mask annotated with every marking that applies to `result`
pub fn annotate(result: &DetectionResult) -> GrayImage {
    let mut canvas = result.motion_mask.clone();
    if let Some(body) = &result.body {
        draw_body_positions(&mut canvas, body);
    }
    if let Some(gesture) = &result.gesture {
        draw_gestures(&mut canvas, gesture);
    }
    canvas
}

fn draw_bar(mask: &mut GrayImage, x_start: u32, x_end: u32, y: i32) {
    let width = x_end.saturating_sub(x_start);
    if width == 0 {
        return;
    }
    let top = y - (BAR_THICKNESS as i32) / 2;
    draw_filled_rect_mut(
        mask,
        Rect::at(x_start as i32, top).of_size(width, BAR_THICKNESS),
        MARK,
    );
}

fn draw_marker(mask: &mut GrayImage, center: (i32, i32)) {
    // 3px outline
    for radius in MARKER_RADIUS - 1..=MARKER_RADIUS + 1 {
        draw_hollow_circle_mut(mask, center, radius, MARK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::BodySpan;

    fn body() -> BodyRegion {
        BodyRegion::Body(BodySpan {
            left_arm_start: 2,
            torso_start: 4,
            right_arm_start: 6,
            body_end: 9,
            band_width_pixels: 16,
            total_intensity: 0,
        })
    }

    #[test]
    fn test_body_bars_follow_band_indices() {
        let mut mask = GrayImage::new(320, 240);
        draw_body_positions(&mut mask, &body());

        // whole body covers columns 32..160 at y=20
        assert_eq!(mask.get_pixel(32, 20)[0], 255);
        assert_eq!(mask.get_pixel(159, 20)[0], 255);
        assert_eq!(mask.get_pixel(31, 20)[0], 0);
        assert_eq!(mask.get_pixel(160, 20)[0], 0);

        // torso covers columns 64..112 at y=30
        assert_eq!(mask.get_pixel(64, 30)[0], 255);
        assert_eq!(mask.get_pixel(111, 30)[0], 255);
        assert_eq!(mask.get_pixel(40, 30)[0], 0);
    }

    #[test]
    fn test_no_body_draws_nothing() {
        let mut mask = GrayImage::new(64, 64);
        draw_body_positions(&mut mask, &BodyRegion::NoBody);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_markers_reflect_arm_state() {
        let mut mask = GrayImage::new(200, 200);
        let gesture = GestureState {
            left_arm_up: true,
            right_arm_up: false,
            is_gesture: true,
        };
        draw_gestures(&mut mask, &gesture);

        // top of the left circle sits at y=90, the right one at y=120
        assert_eq!(mask.get_pixel(100, 90)[0], 255);
        assert_eq!(mask.get_pixel(130, 120)[0], 255);
        assert_eq!(mask.get_pixel(130, 90)[0], 0);
        assert_eq!(mask.get_pixel(115, 115)[0], 255);
    }

    #[test]
    fn test_non_gesture_draws_nothing() {
        let mut mask = GrayImage::new(200, 200);
        draw_gestures(&mut mask, &GestureState::none());
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_drawing_is_clipped_to_small_masks() {
        let mut mask = GrayImage::new(40, 40);
        draw_body_positions(&mut mask, &body());
        draw_gestures(
            &mut mask,
            &GestureState {
                left_arm_up: true,
                right_arm_up: true,
                is_gesture: true,
            },
        );
        assert_eq!(mask.get_pixel(35, 20)[0], 255);
    }
}
