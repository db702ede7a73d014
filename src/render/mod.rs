#![cfg(feature = "image")]

use crate::cube::Composite;
use crate::error::{CubeError, CubeResult};
use image::{Rgba, RgbaImage};
use std::path::Path;
use tracing::*;

mod stretch;

pub use stretch::{percentile, Stretch, FLAT_LEVEL};

/// Percentiles clipped when contrast enhancement is on.
pub const CONTRAST_PERCENTILES: (f64, f64) = (2.0, 98.0);

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Renders one or more composites to an 8-bit RGBA image.
///
/// Several composites are tiled left to right, wrapping after
/// `columns` frames. No-data pixels are transparent.
#[derive(Debug)]
pub struct Renderer<'a> {
    frames: &'a [Composite],
    contrast: bool,
    columns: usize,
    percentiles: (f64, f64),
}

impl Composite {
    pub fn renderer(&self) -> Renderer<'_> {
        Renderer::new(std::slice::from_ref(self))
    }
}

impl<'a> Renderer<'a> {
    pub fn new(frames: &'a [Composite]) -> Self {
        Self {
            frames,
            contrast: false,
            columns: frames.len().max(1),
            percentiles: CONTRAST_PERCENTILES,
        }
    }

    /// Clip outliers before scaling, for a punchier image.
    pub fn with_contrast(mut self, contrast: bool) -> Self {
        self.contrast = contrast;
        self
    }

    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    pub fn with_percentiles(mut self, low: f64, high: f64) -> Self {
        self.percentiles = (low.min(high), low.max(high));
        self
    }

    /// Per channel scaling shared by every frame.
    pub fn stretches(&self) -> [Stretch; 3] {
        let (low, high) = if self.contrast {
            self.percentiles
        } else {
            (0.0, 100.0)
        };
        [0, 1, 2].map(|channel| {
            let mut values = Vec::new();
            for frame in self.frames {
                let (height, width) = frame.dimensions();
                for y in 0..height {
                    for x in 0..width {
                        if !frame.is_nodata(y, x) {
                            values.push(frame.pixels[[y, x, channel]]);
                        }
                    }
                }
            }
            Stretch::from_percentiles(&values, low, high)
        })
    }

    pub fn render(&self) -> CubeResult<RgbaImage> {
        let Some(first) = self.frames.first() else {
            return Err(CubeError::NoDataFound("no composites to render".to_string()));
        };
        let (height, width) = first.dimensions();
        if let Some(other) = self.frames.iter().find(|f| f.dimensions() != (height, width)) {
            let (h, w) = other.dimensions();
            return Err(CubeError::ShapeMismatch {
                expected: vec![height, width],
                found: vec![h, w],
            });
        }

        let n = self.frames.len();
        let columns = self.columns.min(n);
        let rows = (n + columns - 1) / columns;
        let stretches = self.stretches();
        debug!(
            "Rendering {n} frame(s) of {width}x{height} as {columns}x{rows}, contrast {}: {stretches:?}",
            self.contrast
        );

        let mut image = RgbaImage::new((columns * width) as u32, (rows * height) as u32);
        for (i, frame) in self.frames.iter().enumerate() {
            let left = (i % columns) * width;
            let top = (i / columns) * height;
            for y in 0..height {
                for x in 0..width {
                    let pixel = if frame.is_nodata(y, x) {
                        TRANSPARENT
                    } else {
                        Rgba([
                            stretches[0].apply(frame.pixels[[y, x, 0]]),
                            stretches[1].apply(frame.pixels[[y, x, 1]]),
                            stretches[2].apply(frame.pixels[[y, x, 2]]),
                            255,
                        ])
                    };
                    image.put_pixel((left + x) as u32, (top + y) as u32, pixel);
                }
            }
        }
        Ok(image)
    }

    /// Render and write to `path`; the format follows the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CubeResult<()> {
        let image = self.render()?;
        image.save(path.as_ref())?;
        info!("Image saved to {}", path.as_ref().display());
        Ok(())
    }
}

/// Renderer over a batch of composites, e.g. every time step of a cube.
pub fn renderer(frames: &[Composite]) -> Renderer<'_> {
    Renderer::new(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ndarray::Array3;

    fn composite(f: impl Fn(usize, usize, usize) -> i16) -> Composite {
        Composite {
            time: Utc.with_ymd_and_hms(2019, 1, 1, 10, 0, 0).unwrap(),
            nodata: -9999,
            pixels: Array3::from_shape_fn((4, 5, 3), |(y, x, c)| f(y, x, c)),
        }
    }

    #[test]
    fn single_frame_dimensions() {
        let frame = composite(|y, x, _| (y * 5 + x) as i16);
        let image = frame.renderer().render().unwrap();
        assert_eq!(image.dimensions(), (5, 4));
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(4, 3), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn nodata_is_transparent() {
        let frame = composite(|y, x, c| if y == 1 && x == 2 && c == 1 { -9999 } else { 100 });
        let image = frame.renderer().render().unwrap();
        assert_eq!(image.get_pixel(2, 1)[3], 0);
        assert_eq!(image.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn contrast_clips_outliers() {
        // one hot pixel would otherwise compress everything else to black
        let frame = composite(|y, x, _| if y == 0 && x == 0 { 30000 } else { (x * 100) as i16 });
        let plain = frame.renderer().render().unwrap();
        let enhanced = frame
            .renderer()
            .with_contrast(true)
            .with_percentiles(2.0, 90.0)
            .render()
            .unwrap();
        assert!(plain.get_pixel(4, 2)[0] < 10);
        assert_eq!(enhanced.get_pixel(4, 2)[0], 255);
        assert_eq!(enhanced.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn constant_frames_render_grey() {
        // an unmasked overcast scene
        let frame = composite(|_, _, _| 7500);
        let grey = Rgba([FLAT_LEVEL, FLAT_LEVEL, FLAT_LEVEL, 255]);
        let plain = frame.renderer().render().unwrap();
        let enhanced = frame.renderer().with_contrast(true).render().unwrap();
        assert!(plain.pixels().all(|p| *p == grey));
        assert!(enhanced.pixels().all(|p| *p == grey));
    }

    #[test]
    fn batches_tile_with_wrapping() {
        let frames: Vec<Composite> = (0..5).map(|i| composite(move |_, _, _| i * 10)).collect();
        let image = renderer(&frames).with_columns(2).render().unwrap();
        assert_eq!(image.dimensions(), (10, 12));
        // the unused sixth cell stays transparent
        assert_eq!(image.get_pixel(9, 11)[3], 0);
        assert_eq!(image.get_pixel(0, 8)[3], 255);
    }

    #[test]
    fn empty_batch_is_an_error() {
        assert!(matches!(
            renderer(&[]).render(),
            Err(CubeError::NoDataFound(_))
        ));
    }
}
