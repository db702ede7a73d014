use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// Bits 11-15 of `pixel_qa` carry no category. A value setting any of them
/// did not come from a known quality encoding.
pub const RESERVED_BITS: u16 = 0xF800;

/// Fields packed into the Landsat Level-2 `pixel_qa` band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    NoData,
    Clear,
    Water,
    CloudShadow,
    Snow,
    Cloud,
    CloudConfidence,
    CirrusConfidence,
    TerrainOcclusion,
}

const CONFIDENCE_LABELS: &[&str] = &["none", "low", "medium", "high"];

impl Flag {
    pub const ALL: [Flag; 9] = [
        Flag::NoData,
        Flag::Clear,
        Flag::Water,
        Flag::CloudShadow,
        Flag::Snow,
        Flag::Cloud,
        Flag::CloudConfidence,
        Flag::CirrusConfidence,
        Flag::TerrainOcclusion,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Flag::NoData => "nodata",
            Flag::Clear => "clear",
            Flag::Water => "water",
            Flag::CloudShadow => "cloud_shadow",
            Flag::Snow => "snow",
            Flag::Cloud => "cloud",
            Flag::CloudConfidence => "cloud_confidence",
            Flag::CirrusConfidence => "cirrus_confidence",
            Flag::TerrainOcclusion => "terrain_occlusion",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }

    /// `(shift, width)` of the field within the packed value.
    pub fn bits(&self) -> (u16, u16) {
        match self {
            Flag::NoData => (0, 1),
            Flag::Clear => (1, 1),
            Flag::Water => (2, 1),
            Flag::CloudShadow => (3, 1),
            Flag::Snow => (4, 1),
            Flag::Cloud => (5, 1),
            Flag::CloudConfidence => (6, 2),
            Flag::CirrusConfidence => (8, 2),
            Flag::TerrainOcclusion => (10, 1),
        }
    }

    /// Category labels, indexed by the encoded field value.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Flag::NoData => &["data", "no_data"],
            Flag::Clear => &["no_clear_land", "clear_land"],
            Flag::Water => &["no_water", "water"],
            Flag::CloudShadow => &["no_cloud_shadow", "cloud_shadow"],
            Flag::Snow => &["no_snow", "snow"],
            Flag::Cloud => &["no_cloud", "cloud"],
            Flag::CloudConfidence | Flag::CirrusConfidence => CONFIDENCE_LABELS,
            Flag::TerrainOcclusion => &["no_occlusion", "occlusion"],
        }
    }

    pub fn value_of(&self, label: &str) -> Option<u16> {
        self.labels()
            .iter()
            .position(|l| *l == label)
            .map(|i| i as u16)
    }

    pub fn extract(&self, value: u16) -> u16 {
        let (shift, width) = self.bits();
        (value >> shift) & ((1 << width) - 1)
    }

    pub fn encode(&self, field: u16) -> u16 {
        let (shift, width) = self.bits();
        (field & ((1 << width) - 1)) << shift
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A typed category of one [`Flag`].
pub trait Category: Copy + Into<u16> + TryFromPrimitive<Primitive = u16> {
    const FLAG: Flag;

    fn label(self) -> &'static str {
        let value: u16 = self.into();
        Self::FLAG.labels()[value as usize]
    }
}

macro_rules! category {
    ($name:ident, $flag:expr, { $($variant:ident = $value:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
        #[repr(u16)]
        pub enum $name {
            $($variant = $value),+
        }

        impl Category for $name {
            const FLAG: Flag = $flag;
        }
    };
}

category!(NoData, Flag::NoData, { Data = 0, Fill = 1 });
category!(Clear, Flag::Clear, { NoClearLand = 0, ClearLand = 1 });
category!(Water, Flag::Water, { NoWater = 0, Water = 1 });
category!(CloudShadow, Flag::CloudShadow, { NoCloudShadow = 0, CloudShadow = 1 });
category!(Snow, Flag::Snow, { NoSnow = 0, Snow = 1 });
category!(Cloud, Flag::Cloud, { NoCloud = 0, Cloud = 1 });
category!(CloudConfidence, Flag::CloudConfidence, { NoConfidence = 0, Low = 1, Medium = 2, High = 3 });
category!(CirrusConfidence, Flag::CirrusConfidence, { NoConfidence = 0, Low = 1, Medium = 2, High = 3 });
category!(TerrainOcclusion, Flag::TerrainOcclusion, { NoOcclusion = 0, Occlusion = 1 });
