use super::flags::{Category, Cloud, CloudShadow, Flag, NoData, Snow, RESERVED_BITS};
use crate::error::{CubeError, CubeResult};
use std::fmt;
use std::str::FromStr;

/// One `flag == category` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Requirement {
    flag: Flag,
    value: u16,
}

impl Requirement {
    /// Fails with `UnknownCategory` when `value` is not a category of `flag`.
    pub fn new(flag: Flag, value: u16) -> CubeResult<Self> {
        if value as usize >= flag.labels().len() {
            return Err(CubeError::UnknownCategory(format!(
                "{flag} has no category {value}"
            )));
        }
        Ok(Self { flag, value })
    }

    pub fn flag(&self) -> Flag {
        self.flag
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn matches(&self, quality: u16) -> bool {
        self.flag.extract(quality) == self.value
    }
}

impl<C: Category> From<C> for Requirement {
    fn from(category: C) -> Self {
        Self {
            flag: C::FLAG,
            value: category.into(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.flag.labels()[self.value as usize];
        write!(f, "{}={}", self.flag, label)
    }
}

impl FromStr for Requirement {
    type Err = CubeError;

    /// Parses `flag=category`, e.g. `cloud=no_cloud`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((flag, label)) = s.split_once('=') else {
            return Err(CubeError::UnknownCategory(s.to_string()));
        };
        let flag = Flag::from_name(flag.trim())
            .ok_or_else(|| CubeError::UnknownCategory(format!("unknown flag '{}'", flag.trim())))?;
        let label = label.trim();
        let value = flag
            .value_of(label)
            .ok_or_else(|| CubeError::UnknownCategory(format!("{flag} has no category '{label}'")))?;
        Ok(Self { flag, value })
    }
}

/// Conjunction of [`Requirement`]s over the `pixel_qa` band.
///
/// A pixel passes when every requirement holds. The empty predicate passes
/// every recognised pixel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityPredicate {
    requirements: Vec<Requirement>,
}

impl QualityPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R: Into<Requirement>>(mut self, requirement: R) -> Self {
        self.requirements.push(requirement.into());
        self
    }

    /// Valid data with no cloud, cloud shadow or snow.
    pub fn clear_sky() -> Self {
        Self::new()
            .with(NoData::Data)
            .with(Cloud::NoCloud)
            .with(CloudShadow::NoCloudShadow)
            .with(Snow::NoSnow)
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Whether a raw `pixel_qa` value satisfies the predicate.
    ///
    /// Fails for values outside the known encoding rather than guessing.
    pub fn matches(&self, quality: u16) -> CubeResult<bool> {
        if quality & RESERVED_BITS != 0 {
            return Err(CubeError::UnknownCategory(format!(
                "pixel_qa value {quality} sets reserved bits"
            )));
        }
        Ok(self.requirements.iter().all(|r| r.matches(quality)))
    }
}

impl FromStr for QualityPredicate {
    type Err = CubeError;

    /// Parses comma separated requirements, e.g. `cloud=no_cloud,snow=no_snow`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let requirements = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Requirement::from_str)
            .collect::<CubeResult<Vec<_>>>()?;
        Ok(Self { requirements })
    }
}

impl fmt::Display for QualityPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.requirements.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::flags::CloudConfidence;

    #[test]
    fn single_flag_predicate() {
        let predicate = QualityPredicate::new().with(Cloud::NoCloud);
        assert!(predicate.matches(322).unwrap());
        // cloud bit set, high confidence
        assert!(!predicate.matches(480).unwrap());
    }

    #[test]
    fn requirements_are_conjoined() {
        let predicate = QualityPredicate::new()
            .with(Cloud::NoCloud)
            .with(CloudConfidence::Low);
        assert!(predicate.matches(322).unwrap());
        // no cloud, but no confidence bits set
        assert!(!predicate.matches(2).unwrap());
    }

    #[test]
    fn reserved_bits_fail_loudly() {
        let predicate = QualityPredicate::new().with(Cloud::NoCloud);
        assert!(matches!(
            predicate.matches(1 << 12),
            Err(CubeError::UnknownCategory(_))
        ));
        assert!(QualityPredicate::new().matches(0x8000).is_err());
    }

    #[test]
    fn parses_from_text() {
        let predicate: QualityPredicate = "cloud=no_cloud, snow=no_snow".parse().unwrap();
        assert_eq!(
            predicate,
            QualityPredicate::new().with(Cloud::NoCloud).with(Snow::NoSnow)
        );
        assert_eq!(predicate.to_string(), "cloud=no_cloud,snow=no_snow");
    }

    #[test]
    fn unknown_names_fail_to_parse() {
        assert!(matches!(
            "haze=none".parse::<QualityPredicate>(),
            Err(CubeError::UnknownCategory(_))
        ));
        assert!(matches!(
            "cloud=cumulus".parse::<QualityPredicate>(),
            Err(CubeError::UnknownCategory(_))
        ));
        assert!("cloud".parse::<QualityPredicate>().is_err());
    }

    #[test]
    fn out_of_range_categories_are_rejected() {
        assert!(matches!(
            Requirement::new(Flag::Cloud, 7),
            Err(CubeError::UnknownCategory(_))
        ));
        assert!(Requirement::new(Flag::CloudConfidence, 4).is_err());
        let high = Requirement::new(Flag::CirrusConfidence, 3).unwrap();
        assert_eq!(high, Requirement::from(crate::quality::flags::CirrusConfidence::High));
        assert_eq!(high.to_string(), "cirrus_confidence=high");
    }

    #[test]
    fn clear_sky_rejects_fill_and_snow() {
        let predicate = QualityPredicate::clear_sky();
        assert!(predicate.matches(322).unwrap());
        assert!(!predicate.matches(1).unwrap());
        assert!(!predicate.matches(16).unwrap());
        assert!(!predicate.matches(8).unwrap());
    }
}
