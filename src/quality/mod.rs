// Pixel quality
//   Decoding of the Landsat Level-2 `pixel_qa` band into closed categories,
//   predicates over those categories, and boolean masks built from them.

use crate::error::{CubeError, CubeResult};
use ndarray::{Array3, ArrayView3, Axis};
use tracing::*;

pub mod flags;
mod predicate;

pub use flags::{
    Category, CirrusConfidence, Clear, Cloud, CloudConfidence, CloudShadow, Flag, NoData, Snow,
    TerrainOcclusion, Water, RESERVED_BITS,
};
pub use predicate::{QualityPredicate, Requirement};

/// Every field of one `pixel_qa` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelQuality {
    pub nodata: NoData,
    pub clear: Clear,
    pub water: Water,
    pub cloud_shadow: CloudShadow,
    pub snow: Snow,
    pub cloud: Cloud,
    pub cloud_confidence: CloudConfidence,
    pub cirrus_confidence: CirrusConfidence,
    pub terrain_occlusion: TerrainOcclusion,
}

impl PixelQuality {
    pub fn decode(value: u16) -> CubeResult<Self> {
        if value & RESERVED_BITS != 0 {
            return Err(CubeError::UnknownCategory(format!(
                "pixel_qa value {value} sets reserved bits"
            )));
        }
        Ok(Self {
            nodata: field(value)?,
            clear: field(value)?,
            water: field(value)?,
            cloud_shadow: field(value)?,
            snow: field(value)?,
            cloud: field(value)?,
            cloud_confidence: field(value)?,
            cirrus_confidence: field(value)?,
            terrain_occlusion: field(value)?,
        })
    }

    pub fn encode(&self) -> u16 {
        let fields: [(Flag, u16); 9] = [
            (Flag::NoData, self.nodata.into()),
            (Flag::Clear, self.clear.into()),
            (Flag::Water, self.water.into()),
            (Flag::CloudShadow, self.cloud_shadow.into()),
            (Flag::Snow, self.snow.into()),
            (Flag::Cloud, self.cloud.into()),
            (Flag::CloudConfidence, self.cloud_confidence.into()),
            (Flag::CirrusConfidence, self.cirrus_confidence.into()),
            (Flag::TerrainOcclusion, self.terrain_occlusion.into()),
        ];
        fields
            .iter()
            .fold(0, |packed, (flag, value)| packed | flag.encode(*value))
    }
}

fn field<C: Category>(value: u16) -> CubeResult<C> {
    let bits = C::FLAG.extract(value);
    C::try_from_primitive(bits)
        .map_err(|_| CubeError::UnknownCategory(format!("{}: {bits}", C::FLAG)))
}

/// Raw `pixel_qa` values indexed `(time, y, x)`.
#[derive(Clone, Debug, PartialEq)]
pub struct QualityBand {
    data: Array3<u16>,
}

impl QualityBand {
    pub fn new(data: Array3<u16>) -> Self {
        Self { data }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn view(&self) -> ArrayView3<u16> {
        self.data.view()
    }

    pub fn get(&self, time: usize, y: usize, x: usize) -> Option<u16> {
        self.data.get((time, y, x)).copied()
    }
}

/// Boolean mask indexed `(time, y, x)`, `true` where a pixel is usable.
#[derive(Clone, Debug, PartialEq)]
pub struct QualityMask {
    data: Array3<bool>,
}

impl QualityMask {
    pub fn new(data: Array3<bool>) -> Self {
        Self { data }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn view(&self) -> ArrayView3<bool> {
        self.data.view()
    }

    pub fn get(&self, time: usize, y: usize, x: usize) -> Option<bool> {
        self.data.get((time, y, x)).copied()
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|keep| **keep).count()
    }

    /// Fraction of usable pixels in each time step.
    pub fn clear_fraction(&self) -> Vec<f64> {
        self.data
            .axis_iter(Axis(0))
            .map(|step| {
                let total = step.len();
                if total == 0 {
                    return 0.0;
                }
                step.iter().filter(|keep| **keep).count() as f64 / total as f64
            })
            .collect()
    }
}

/// Evaluate `predicate` for every pixel of `quality`.
pub fn make_mask(quality: &QualityBand, predicate: &QualityPredicate) -> CubeResult<QualityMask> {
    let mut mask = Array3::from_elem(quality.shape(), false);
    for (keep, value) in mask.iter_mut().zip(quality.data.iter()) {
        *keep = predicate.matches(*value)?;
    }
    let mask = QualityMask::new(mask);
    debug!(
        "Mask [{predicate}] keeps {} of {} pixels",
        mask.count(),
        mask.data.len()
    );
    Ok(mask)
}
