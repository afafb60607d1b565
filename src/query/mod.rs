//! # Query Normalizer
//!
//! Raw URL path segments cannot contain the spaces and parentheses the
//! canonical upstream enumeration values use (`Linux/UNIX (Amazon VPC)`,
//! `Heavy Utilization`, ...), so short human-friendly prefixes stand in for
//! them. This module turns those raw tokens into canonical filter values and
//! builds the canonical cache key — the cache's only consistency mechanism:
//! two requests with equivalent filters after normalization must produce
//! identical keys.
//!
//! An absent filter component always normalizes to `None` (match-all) before
//! any prefix matching. Anything that is neither a recognized prefix nor a
//! canonical enumeration value fails with `InvalidArgument`.

use crate::core::error::{OfferingError, OfferingResult};

pub const LINUX_PREFIX: &str = "linux";
pub const WINDOWS_PREFIX: &str = "windows";
pub const AMAZON_VPC_SUFFIX: &str = "vpc";

pub const HEAVY_PREFIX: &str = "heavy";
pub const MEDIUM_PREFIX: &str = "medium";
pub const LIGHT_PREFIX: &str = "light";

/// Separates multi-value instanceType path segments
pub const INSTANCE_TYPE_SEPARATOR: char = ',';

/// Canonical EC2 reserved-instance product descriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductDescription {
    LinuxUnix,
    LinuxUnixAmazonVpc,
    Windows,
    WindowsAmazonVpc,
}

impl ProductDescription {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinuxUnix => "Linux/UNIX",
            Self::LinuxUnixAmazonVpc => "Linux/UNIX (Amazon VPC)",
            Self::Windows => "Windows",
            Self::WindowsAmazonVpc => "Windows (Amazon VPC)",
        }
    }

    /// Strict enumeration validation of a canonical value
    pub fn from_value(value: &str) -> OfferingResult<Self> {
        match value {
            "Linux/UNIX" => Ok(Self::LinuxUnix),
            "Linux/UNIX (Amazon VPC)" => Ok(Self::LinuxUnixAmazonVpc),
            "Windows" => Ok(Self::Windows),
            "Windows (Amazon VPC)" => Ok(Self::WindowsAmazonVpc),
            other => Err(OfferingError::invalid_argument(
                "productDescription",
                format!("unrecognized value '{}'", other),
            )),
        }
    }
}

/// Canonical EC2 reserved-instance offering types (utilization tiers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferingType {
    HeavyUtilization,
    MediumUtilization,
    LightUtilization,
}

impl OfferingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeavyUtilization => "Heavy Utilization",
            Self::MediumUtilization => "Medium Utilization",
            Self::LightUtilization => "Light Utilization",
        }
    }

    /// Strict enumeration validation of a canonical value
    pub fn from_value(value: &str) -> OfferingResult<Self> {
        match value {
            "Heavy Utilization" => Ok(Self::HeavyUtilization),
            "Medium Utilization" => Ok(Self::MediumUtilization),
            "Light Utilization" => Ok(Self::LightUtilization),
            other => Err(OfferingError::invalid_argument(
                "offeringType",
                format!("unrecognized value '{}'", other),
            )),
        }
    }
}

/// Instance types the upstream recognizes
pub const INSTANCE_TYPES: &[&str] = &[
    "t1.micro",
    "m1.small",
    "m1.medium",
    "m1.large",
    "m1.xlarge",
    "m3.medium",
    "m3.large",
    "m3.xlarge",
    "m3.2xlarge",
    "m2.xlarge",
    "m2.2xlarge",
    "m2.4xlarge",
    "cr1.8xlarge",
    "i2.xlarge",
    "i2.2xlarge",
    "i2.4xlarge",
    "i2.8xlarge",
    "hi1.4xlarge",
    "hs1.8xlarge",
    "c1.medium",
    "c1.xlarge",
    "c3.large",
    "c3.xlarge",
    "c3.2xlarge",
    "c3.4xlarge",
    "c3.8xlarge",
    "cc1.4xlarge",
    "cc2.8xlarge",
    "g2.2xlarge",
    "cg1.4xlarge",
];

/// A URI-appropriate EC2 product description parser
///
/// `linux`-prefixed tokens map to `Linux/UNIX`, or to the Amazon-VPC-scoped
/// variant when the token ends with `vpc`; symmetric rule for `windows`.
/// Everything else must already be a canonical enumeration value.
pub fn normalize_product_description(raw: Option<&str>) -> OfferingResult<Option<String>> {
    let Some(value) = raw else {
        return Ok(None);
    };

    let canonical = if value.starts_with(LINUX_PREFIX) {
        if value.ends_with(AMAZON_VPC_SUFFIX) {
            ProductDescription::LinuxUnixAmazonVpc
        } else {
            ProductDescription::LinuxUnix
        }
    } else if value.starts_with(WINDOWS_PREFIX) {
        if value.ends_with(AMAZON_VPC_SUFFIX) {
            ProductDescription::WindowsAmazonVpc
        } else {
            ProductDescription::Windows
        }
    } else {
        ProductDescription::from_value(value)?
    };

    Ok(Some(canonical.as_str().to_string()))
}

/// A URI-appropriate EC2 offering type parser
///
/// `heavy`/`medium`/`light`-prefixed tokens map to the corresponding
/// utilization tier; everything else must be a canonical enumeration value.
pub fn normalize_offering_type(raw: Option<&str>) -> OfferingResult<Option<String>> {
    let Some(value) = raw else {
        return Ok(None);
    };

    let canonical = if value.starts_with(HEAVY_PREFIX) {
        OfferingType::HeavyUtilization
    } else if value.starts_with(MEDIUM_PREFIX) {
        OfferingType::MediumUtilization
    } else if value.starts_with(LIGHT_PREFIX) {
        OfferingType::LightUtilization
    } else {
        OfferingType::from_value(value)?
    };

    Ok(Some(canonical.as_str().to_string()))
}

/// Validate a single instance type against the known enumeration
///
/// No prefix aliasing here: instance types are short enough to spell out.
pub fn normalize_instance_type(raw: Option<&str>) -> OfferingResult<Option<String>> {
    let Some(value) = raw else {
        return Ok(None);
    };

    if INSTANCE_TYPES.contains(&value) {
        Ok(Some(value.to_string()))
    } else {
        Err(OfferingError::invalid_argument(
            "instanceType",
            format!("unrecognized value '{}'", value),
        ))
    }
}

/// Parse a raw instanceType path segment into validated tokens
///
/// The segment may carry several comma-separated values; trailing separator
/// characters are trimmed, each token is validated independently, token order
/// is preserved, and duplicates are kept.
pub fn parse_instance_types(raw: Option<&str>) -> OfferingResult<Option<Vec<String>>> {
    let Some(value) = raw else {
        return Ok(None);
    };

    let trimmed = value.trim_end_matches(INSTANCE_TYPE_SEPARATOR);
    let mut tokens = Vec::new();
    for token in trimmed.split(INSTANCE_TYPE_SEPARATOR) {
        if let Some(token) = normalize_instance_type(Some(token.trim()))? {
            tokens.push(token);
        }
    }

    Ok(Some(tokens))
}

/// A fully-normalized filter tuple for one upstream query round
///
/// `instance_type` holds at most a single token here; multi-value requests
/// are decomposed into one filter per token before fetching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferingFilter {
    pub availability_zone: Option<String>,
    pub product_description: Option<String>,
    pub offering_type: Option<String>,
    pub instance_type: Option<String>,
}

/// Build the canonical cache key from the normalized filter components
///
/// Each component is single-quoted and the four are space-joined in fixed
/// order; absent components render as empty quotes, so the tuple stays
/// unambiguous. Instance-type tokens enter the key normalized and re-joined,
/// so differently-delimited spellings of the same token list share an entry.
pub fn cache_key(
    availability_zone: Option<&str>,
    product_description: Option<&str>,
    offering_type: Option<&str>,
    instance_types: Option<&[String]>,
) -> String {
    let instance_type = instance_types.map(|tokens| tokens.join(","));
    format!(
        "'{}' '{}' '{}' '{}'",
        availability_zone.unwrap_or(""),
        product_description.unwrap_or(""),
        offering_type.unwrap_or(""),
        instance_type.as_deref().unwrap_or(""),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_input_short_circuits_to_none() {
        assert_eq!(normalize_product_description(None).unwrap(), None);
        assert_eq!(normalize_offering_type(None).unwrap(), None);
        assert_eq!(normalize_instance_type(None).unwrap(), None);
        assert_eq!(parse_instance_types(None).unwrap(), None);
    }

    #[test]
    fn test_product_description_prefix_aliases() {
        assert_eq!(
            normalize_product_description(Some("linux")).unwrap().as_deref(),
            Some("Linux/UNIX")
        );
        assert_eq!(
            normalize_product_description(Some("linuxvpc")).unwrap().as_deref(),
            Some("Linux/UNIX (Amazon VPC)")
        );
        assert_eq!(
            normalize_product_description(Some("linux-vpc")).unwrap().as_deref(),
            Some("Linux/UNIX (Amazon VPC)")
        );
        assert_eq!(
            normalize_product_description(Some("windows")).unwrap().as_deref(),
            Some("Windows")
        );
        assert_eq!(
            normalize_product_description(Some("windowsvpc")).unwrap().as_deref(),
            Some("Windows (Amazon VPC)")
        );
    }

    #[test]
    fn test_product_description_canonical_passthrough() {
        assert_eq!(
            normalize_product_description(Some("Windows (Amazon VPC)"))
                .unwrap()
                .as_deref(),
            Some("Windows (Amazon VPC)")
        );
    }

    #[test]
    fn test_product_description_rejects_unknown_value() {
        let err = normalize_product_description(Some("solaris")).unwrap_err();
        assert!(matches!(
            err,
            OfferingError::InvalidArgument {
                field: "productDescription",
                ..
            }
        ));
    }

    #[test]
    fn test_offering_type_prefix_aliases() {
        assert_eq!(
            normalize_offering_type(Some("heavy")).unwrap().as_deref(),
            Some("Heavy Utilization")
        );
        assert_eq!(
            normalize_offering_type(Some("medium")).unwrap().as_deref(),
            Some("Medium Utilization")
        );
        assert_eq!(
            normalize_offering_type(Some("light")).unwrap().as_deref(),
            Some("Light Utilization")
        );
        assert!(normalize_offering_type(Some("turbo")).is_err());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["linux", "linuxvpc", "windows", "windowsvpc"] {
            let once = normalize_product_description(Some(raw)).unwrap().unwrap();
            let twice = normalize_product_description(Some(&once)).unwrap().unwrap();
            assert_eq!(once, twice);
        }
        for raw in ["heavy", "medium", "light"] {
            let once = normalize_offering_type(Some(raw)).unwrap().unwrap();
            let twice = normalize_offering_type(Some(&once)).unwrap().unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_instance_type_validation() {
        assert_eq!(
            normalize_instance_type(Some("t1.micro")).unwrap().as_deref(),
            Some("t1.micro")
        );
        assert!(normalize_instance_type(Some("t9.mega")).is_err());
    }

    #[test]
    fn test_parse_multi_value_instance_types() {
        let tokens = parse_instance_types(Some("t1.micro,m1.small")).unwrap().unwrap();
        assert_eq!(tokens, vec!["t1.micro", "m1.small"]);
    }

    #[test]
    fn test_parse_trims_trailing_separator() {
        let tokens = parse_instance_types(Some("t1.micro,")).unwrap().unwrap();
        assert_eq!(tokens, vec!["t1.micro"]);
    }

    #[test]
    fn test_parse_preserves_order_and_duplicates() {
        let tokens = parse_instance_types(Some("m1.small,t1.micro,m1.small"))
            .unwrap()
            .unwrap();
        assert_eq!(tokens, vec!["m1.small", "t1.micro", "m1.small"]);
    }

    #[test]
    fn test_parse_rejects_unknown_token() {
        assert!(parse_instance_types(Some("t1.micro,bogus")).is_err());
    }

    #[test]
    fn test_cache_key_layout() {
        let tokens = vec!["t1.micro".to_string(), "m1.small".to_string()];
        let key = cache_key(
            Some("us-east-1a"),
            Some("Linux/UNIX"),
            Some("Heavy Utilization"),
            Some(&tokens),
        );
        assert_eq!(key, "'us-east-1a' 'Linux/UNIX' 'Heavy Utilization' 't1.micro,m1.small'");

        let unfiltered = cache_key(Some("us-east-1a"), None, None, None);
        assert_eq!(unfiltered, "'us-east-1a' '' '' ''");
    }

    #[test]
    fn test_key_determinism_across_alias_spellings() {
        // "linux" and the canonical label are the same filter after
        // normalization, so they must share a cache key.
        let via_alias = cache_key(
            Some("us-east-1a"),
            normalize_product_description(Some("linux")).unwrap().as_deref(),
            normalize_offering_type(Some("heavy")).unwrap().as_deref(),
            None,
        );
        let via_canonical = cache_key(
            Some("us-east-1a"),
            normalize_product_description(Some("Linux/UNIX")).unwrap().as_deref(),
            normalize_offering_type(Some("Heavy Utilization")).unwrap().as_deref(),
            None,
        );
        assert_eq!(via_alias, via_canonical);
    }

    #[test]
    fn test_key_determinism_across_token_spellings() {
        let a = parse_instance_types(Some("t1.micro,m1.small")).unwrap().unwrap();
        let b = parse_instance_types(Some("t1.micro, m1.small,")).unwrap().unwrap();
        assert_eq!(
            cache_key(Some("us-east-1a"), None, None, Some(&a)),
            cache_key(Some("us-east-1a"), None, None, Some(&b)),
        );
    }
}
