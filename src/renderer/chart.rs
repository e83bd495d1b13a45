use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use std::io::Cursor;

use crate::error::AppError;
use crate::models::{Metric, Sample};
use crate::renderer::colours::Colours;
use crate::renderer::drawing;

const MARGIN: u32 = 10;

/// Line chart of the samples, one line per metric on a 0-100 scale.
pub fn history_chart(samples: &[Sample], width: u32, height: u32) -> RgbaImage {
    let width = width.max(MARGIN * 4);
    let height = height.max(MARGIN * 4);
    let colours = Colours::default();

    let mut image = RgbaImage::from_pixel(width, height, colours.background);

    let plot_width = width - 2 * MARGIN;
    let plot_height = height - 2 * MARGIN;

    // Grid at 25% steps
    for step in 1..4 {
        let y = MARGIN + plot_height * step / 4;
        drawing::horizontal_line(&mut image, MARGIN, y, plot_width, colours.grid);
    }
    drawing::frame(
        &mut image,
        MARGIN as i32,
        MARGIN as i32,
        plot_width,
        plot_height,
        colours.border,
    );

    let x_step = if samples.len() > 1 {
        plot_width as f32 / (samples.len() - 1) as f32
    } else {
        0.0
    };

    for metric in Metric::ALL {
        let points: Vec<(f32, f32)> = samples
            .iter()
            .enumerate()
            .map(|(i, sample)| {
                let value = sample.value(metric).clamp(0.0, 100.0);
                let x = MARGIN as f32 + i as f32 * x_step;
                let y = MARGIN as f32 + (100.0 - value) / 100.0 * plot_height as f32;
                (x, y)
            })
            .collect();
        drawing::polyline(&mut image, &points, colours.metric(metric));
    }

    image
}

pub fn encode_png(image: RgbaImage) -> Result<Vec<u8>, AppError> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .map_err(|e| AppError::Io(std::io::Error::other(format!("failed to encode chart: {e}"))))?;
    Ok(bytes.into_inner())
}
