use super::RasterCube;
use crate::error::{CubeError, CubeResult};
use crate::quality::QualityMask;
use ndarray::{Axis, Zip};

impl RasterCube {
    /// Copy of the cube with every band set to the no-data value wherever
    /// `mask` is `false`.
    pub fn masked(&self, mask: &QualityMask) -> CubeResult<RasterCube> {
        let (_, times, height, width) = self.shape();
        let (t, y, x) = mask.shape();
        if (t, y, x) != (times, height, width) {
            return Err(CubeError::ShapeMismatch {
                expected: vec![times, height, width],
                found: vec![t, y, x],
            });
        }

        let nodata = self.nodata;
        let mut data = self.data.clone();
        for mut band in data.axis_iter_mut(Axis(0)) {
            Zip::from(&mut band)
                .and(&mask.view())
                .for_each(|value, &keep| {
                    if !keep {
                        *value = nodata;
                    }
                });
        }

        Ok(self.with_data(data))
    }
}
