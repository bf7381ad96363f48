//! Shared synthetic images and datasets for unit tests.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FIGURE: Rgb<u8> = Rgb([35, 30, 45]);

/// Image filled with one colour.
pub(crate) fn solid_image(w: u32, h: u32, rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(w, h, Rgb(rgb))
}

/// Uniform RGB noise, reproducible from `seed`.
pub(crate) fn noise_image(w: u32, h: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(w, h, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
}

/// Textured background: soft horizontal bands plus low-amplitude noise.
pub(crate) fn background_image(w: u32, h: u32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let period = rng.gen_range(17..41);
    RgbImage::from_fn(w, h, |_, y| {
        let band = if (y / period) % 2 == 0 { 170 } else { 200 };
        let v = band + rng.gen_range(0..12u8);
        Rgb([v, v.saturating_sub(8), v.saturating_sub(15)])
    })
}

/// Draw a stick-figure pedestrian whose 80x200 window starts at column `x`.
pub(crate) fn draw_pedestrian(img: &mut RgbImage, x: i32) {
    draw_filled_circle_mut(img, (x + 40, 24), 12, FIGURE);
    draw_filled_rect_mut(img, Rect::at(x + 26, 38).of_size(28, 84), FIGURE);
    draw_filled_rect_mut(img, Rect::at(x + 18, 42).of_size(6, 60), FIGURE);
    draw_filled_rect_mut(img, Rect::at(x + 56, 42).of_size(6, 60), FIGURE);
    draw_filled_rect_mut(img, Rect::at(x + 28, 122).of_size(10, 74), FIGURE);
    draw_filled_rect_mut(img, Rect::at(x + 42, 122).of_size(10, 74), FIGURE);
}

/// A `w x h` crop holding one pedestrian on a plain light background.
pub(crate) fn pedestrian_image(w: u32, h: u32) -> RgbImage {
    let mut img = solid_image(w, h, [205, 200, 190]);
    draw_pedestrian(&mut img, (w as i32 - 80) / 2);
    img
}

/// Background scene with pedestrians at the given pixel columns.
pub(crate) fn scene_image(w: u32, h: u32, pedestrians: &[i32], seed: u64) -> RgbImage {
    let mut img = background_image(w, h, seed);
    for &x in pedestrians {
        draw_pedestrian(&mut img, x);
    }
    img
}

/// Write a training root with `positive/` and `negative/` subdirectories.
pub(crate) fn write_training_dir(root: &Path, positives: usize, negatives: usize, seed: u64) {
    let pos = root.join("positive");
    let neg = root.join("negative");
    std::fs::create_dir_all(&pos).unwrap();
    std::fs::create_dir_all(&neg).unwrap();
    for i in 0..positives {
        scene_image(80, 200, &[0], seed + 1000 + i as u64)
            .save(pos.join(format!("ped_{i:03}.png")))
            .unwrap();
    }
    for i in 0..negatives {
        background_image(240, 320, seed + i as u64)
            .save(neg.join(format!("bg_{i:03}.png")))
            .unwrap();
    }
}
