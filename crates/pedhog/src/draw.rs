//! Detection overlay rendering.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detector::Detection;
use crate::window::{WIN_HEIGHT, WIN_WIDTH};

/// Outline colour of detection windows.
pub const DETECTION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline every detection window on `image` with a one-pixel green rectangle.
pub fn draw_detections(image: &mut RgbImage, detections: &[Detection]) {
    for det in detections {
        let rect = Rect::at(det.x as i32, 0).of_size(WIN_WIDTH as u32, WIN_HEIGHT as u32);
        draw_hollow_rect_mut(image, rect, DETECTION_COLOR);
    }
}
