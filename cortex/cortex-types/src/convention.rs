//! Dataset conventions.

use std::fmt;
use std::str::FromStr;

use crate::ConventionError;

/// The acquisition protocol a volume or surface was produced by.
///
/// Each convention fixes the axis order, clipping and normalization that
/// relate raw data to the model frame. The set is closed: unknown tags are
/// rejected when parsed, so downstream code never has to handle a fallback.
///
/// # Example
///
/// ```
/// use cortex_types::DatasetConvention;
///
/// assert_eq!("adni".parse::<DatasetConvention>().unwrap(), DatasetConvention::Adni);
/// assert_eq!(DatasetConvention::Hcp.to_string(), "hcp");
/// assert!("foo".parse::<DatasetConvention>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DatasetConvention {
    /// Human Connectome Project, FreeSurfer surfaces on 256³ conformed volumes.
    #[default]
    Hcp,
    /// ADNI, volumes registered to MNI-152 space.
    Adni,
    /// Developing HCP (neonatal), native dHCP structural pipeline space.
    Dhcp,
}

impl DatasetConvention {
    /// All supported conventions.
    pub const ALL: [Self; 3] = [Self::Hcp, Self::Adni, Self::Dhcp];

    /// Returns the lowercase tag used in configs and file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hcp => "hcp",
            Self::Adni => "adni",
            Self::Dhcp => "dhcp",
        }
    }
}

impl fmt::Display for DatasetConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetConvention {
    type Err = ConventionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hcp" => Ok(Self::Hcp),
            "adni" => Ok(Self::Adni),
            "dhcp" => Ok(Self::Dhcp),
            other => Err(ConventionError::invalid(other)),
        }
    }
}

impl TryFrom<&str> for DatasetConvention {
    type Error = ConventionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tags() {
        assert_eq!("hcp".parse::<DatasetConvention>().unwrap(), DatasetConvention::Hcp);
        assert_eq!("adni".parse::<DatasetConvention>().unwrap(), DatasetConvention::Adni);
        assert_eq!("dhcp".parse::<DatasetConvention>().unwrap(), DatasetConvention::Dhcp);
    }

    #[test]
    fn test_parse_unknown_tag() {
        let err = "foo".parse::<DatasetConvention>().unwrap_err();
        assert_eq!(err, ConventionError::InvalidConvention("foo".to_string()));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("HCP".parse::<DatasetConvention>().is_err());
        assert!("".parse::<DatasetConvention>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for convention in DatasetConvention::ALL {
            let tag = convention.to_string();
            assert_eq!(tag.parse::<DatasetConvention>().unwrap(), convention);
        }
    }

    #[test]
    fn test_try_from() {
        assert_eq!(DatasetConvention::try_from("dhcp"), Ok(DatasetConvention::Dhcp));
        assert!(DatasetConvention::try_from("mni").is_err());
    }

    #[test]
    fn test_default_is_hcp() {
        assert_eq!(DatasetConvention::default(), DatasetConvention::Hcp);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_lowercase_tags() {
        let json = serde_json::to_string(&DatasetConvention::Adni).unwrap();
        assert_eq!(json, "\"adni\"");

        let parsed: DatasetConvention = serde_json::from_str("\"dhcp\"").unwrap();
        assert_eq!(parsed, DatasetConvention::Dhcp);

        assert!(serde_json::from_str::<DatasetConvention>("\"foo\"").is_err());
    }
}
