use super::FrameSource;
use crate::error::Result;
use crate::frame::FrameData;

use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::time::SystemTime;
use tracing::{debug, trace};

const BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);
const FIGURE: Rgb<u8> = Rgb([220, 200, 180]);

/// Figure poses, named by the side of the mirrored image the detector sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Empty,
    ArmsDown,
    LeftArmUp,
    RightArmUp,
    BothArmsUp,
}

impl Pose {
    fn left_arm(&self) -> bool {
        matches!(self, Pose::LeftArmUp | Pose::BothArmsUp)
    }

    fn right_arm(&self) -> bool {
        matches!(self, Pose::RightArmUp | Pose::BothArmsUp)
    }
}

/// Generates a plain background followed by a block figure moving its arms
pub struct SyntheticSource {
    width: u32,
    height: u32,
    poses: Vec<Pose>,
    position: usize,
}

impl SyntheticSource {
    /// Empty scene first, then `frames - 1` poses cycling through every arm position
    pub fn new(width: u32, height: u32, frames: usize) -> Self {
        const CYCLE: [Pose; 4] = [
            Pose::ArmsDown,
            Pose::BothArmsUp,
            Pose::LeftArmUp,
            Pose::RightArmUp,
        ];

        let mut poses = Vec::with_capacity(frames);
        if frames > 0 {
            poses.push(Pose::Empty);
        }
        poses.extend(CYCLE.iter().copied().cycle().take(frames.saturating_sub(1)));

        Self::with_poses(width, height, poses)
    }

    pub fn with_poses(width: u32, height: u32, poses: Vec<Pose>) -> Self {
        debug!(
            "Synthetic source {}x{} with {} frames",
            width,
            height,
            poses.len()
        );
        Self {
            width,
            height,
            poses,
            position: 0,
        }
    }

    /// Render one pose as the camera would deliver it (unmirrored)
    pub fn render(width: u32, height: u32, pose: Pose) -> RgbImage {
        let mut view = RgbImage::from_pixel(width, height, BACKGROUND);

        if pose != Pose::Empty {
            let w = width as f32;
            let h = height as f32;
            let mut fill = |x0: f32, x1: f32, y0: f32, y1: f32| {
                let left = (x0 * w) as i32;
                let top = (y0 * h) as i32;
                let rect_w = ((x1 - x0) * w) as u32;
                let rect_h = ((y1 - y0) * h) as u32;
                if rect_w > 0 && rect_h > 0 {
                    draw_filled_rect_mut(
                        &mut view,
                        Rect::at(left, top).of_size(rect_w, rect_h),
                        FIGURE,
                    );
                }
            };

            // head and torso
            fill(0.46875, 0.53125, 0.083_333, 0.25);
            fill(0.40625, 0.59375, 0.25, 1.0);

            // arms held out sideways
            if pose.left_arm() {
                fill(0.25625, 0.40625, 0.291_667, 0.458_333);
            }
            if pose.right_arm() {
                fill(0.59375, 0.74375, 0.291_667, 0.458_333);
            }
        }

        imageops::flip_horizontal(&view)
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<FrameData>> {
        let pose = match self.poses.get(self.position) {
            Some(pose) => *pose,
            None => return Ok(None),
        };

        let id = self.position as u64;
        self.position += 1;
        trace!("Synthetic frame {} pose {:?}", id, pose);

        let image = Self::render(self.width, self.height, pose);
        Ok(Some(FrameData::from_rgb_image(id, SystemTime::now(), image)))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
