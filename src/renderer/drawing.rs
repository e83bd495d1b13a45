use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

pub fn horizontal_line(image: &mut RgbaImage, x: u32, y: u32, width: u32, colour: Rgba<u8>) {
    draw_line_segment_mut(
        image,
        (x as f32, y as f32),
        ((x + width) as f32, y as f32),
        colour,
    );
}

pub fn frame(image: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, colour: Rgba<u8>) {
    draw_hollow_rect_mut(image, Rect::at(x, y).of_size(width, height), colour);
}

/// Connects consecutive points with straight segments.
pub fn polyline(image: &mut RgbaImage, points: &[(f32, f32)], colour: Rgba<u8>) {
    match points {
        [] => {}
        [single] => draw_line_segment_mut(image, *single, *single, colour),
        _ => {
            for pair in points.windows(2) {
                draw_line_segment_mut(image, pair[0], pair[1], colour);
            }
        }
    }
}
