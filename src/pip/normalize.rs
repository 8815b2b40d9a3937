//! Region normalization.
//!
//! Sub-state boundary files mix two property layouts:
//! - city style: `ST` holds the USPS abbreviation, `HOUSEUNITS` the housing count
//! - county style: `STATE` holds the FIPS code, or `STATE_NAME` the full name
//!
//! Each record is classified into one [`PropertySchema`] and turned into a
//! [`Region`], or skipped when no owning state can be worked out.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::BuildError;
use crate::models::states::{state_from_abbrev, state_from_fips};
use crate::models::{Region, DEFAULT_WEIGHT};
use crate::source::{to_boundary, RawFeature};

pub const NAME_KEY: &str = "NAME";
const CITY_STATE_KEY: &str = "ST";
const COUNTY_FIPS_KEY: &str = "STATE";
const COUNTY_STATE_NAME_KEY: &str = "STATE_NAME";
const WEIGHT_KEY: &str = "HOUSEUNITS";
const COMMUNITY_ID_KEY: &str = "Community_ID";

/// Property layout of a raw record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySchema {
    City {
        abbrev: String,
    },
    County {
        fips: Option<String>,
        state_name: Option<String>,
    },
    Unresolvable,
}

impl PropertySchema {
    pub fn detect(feature: &RawFeature) -> Self {
        if feature.has_property(CITY_STATE_KEY) {
            return PropertySchema::City {
                abbrev: feature.property_str(CITY_STATE_KEY).unwrap_or_default(),
            };
        }

        let fips = feature.property_str(COUNTY_FIPS_KEY);
        let state_name = feature.property_str(COUNTY_STATE_NAME_KEY);
        if fips.is_none() && state_name.is_none() {
            PropertySchema::Unresolvable
        } else {
            PropertySchema::County { fips, state_name }
        }
    }

    /// Full name of the owning state, if the schema carries a usable one
    pub fn state(&self) -> Option<String> {
        match self {
            PropertySchema::City { abbrev } => state_from_abbrev(abbrev).map(str::to_string),
            PropertySchema::County { fips, state_name } => fips
                .as_deref()
                .and_then(state_from_fips)
                .map(str::to_string)
                .or_else(|| state_name.clone()),
            PropertySchema::Unresolvable => None,
        }
    }
}

/// Why a record was left out of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingName,
    UnresolvableState,
}

#[derive(Debug, Clone)]
pub enum Normalized {
    Region(Region),
    Skipped(SkipReason),
}

/// Counts from a normalization run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub kept: usize,
    pub missing_name: usize,
    pub unresolvable_state: usize,
}

impl NormalizeReport {
    pub fn skipped(&self) -> usize {
        self.missing_name + self.unresolvable_state
    }
}

/// Normalize one raw record.
///
/// Geometry problems are fatal for the whole build. Records without a name
/// or without a resolvable state are skipped.
pub fn normalize_feature(feature: &RawFeature, position: usize) -> Result<Normalized, BuildError> {
    let boundary = to_boundary(feature, position)?;

    // Records without NAME are dropped rather than failing the build.
    let Some(name) = feature.property_str(NAME_KEY) else {
        warn!("Skipping feature {}: no {} property", position, NAME_KEY);
        return Ok(Normalized::Skipped(SkipReason::MissingName));
    };

    let schema = PropertySchema::detect(feature);
    let Some(state) = schema.state() else {
        debug!("Skipping {}: cannot resolve state from {:?}", name, schema);
        return Ok(Normalized::Skipped(SkipReason::UnresolvableState));
    };

    let weight = feature
        .property_f64(WEIGHT_KEY)
        .filter(|w| w.is_finite())
        .map(|w| w as i64)
        .unwrap_or(DEFAULT_WEIGHT);

    Ok(Normalized::Region(Region::new(
        name,
        state,
        boundary,
        weight,
        feature.property_str(COMMUNITY_ID_KEY),
    )))
}

/// Normalize a whole feature set, keeping input order.
pub fn normalize_all(features: &[RawFeature]) -> Result<(Vec<Region>, NormalizeReport), BuildError> {
    info!("Normalizing {} region features...", features.len());

    let normalized = features
        .par_iter()
        .enumerate()
        .map(|(position, feature)| normalize_feature(feature, position))
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = NormalizeReport::default();
    let mut regions = Vec::with_capacity(normalized.len());
    for item in normalized {
        match item {
            Normalized::Region(region) => {
                report.kept += 1;
                regions.push(region);
            }
            Normalized::Skipped(SkipReason::MissingName) => report.missing_name += 1,
            Normalized::Skipped(SkipReason::UnresolvableState) => report.unresolvable_state += 1,
        }
    }

    info!(
        "Normalized {} regions, skipped {} ({} without name, {} without state)",
        report.kept,
        report.skipped(),
        report.missing_name,
        report.unresolvable_state
    );

    Ok((regions, report))
}
