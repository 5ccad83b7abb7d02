use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::geo::{extract_heading, is_valid_latitude, is_valid_longitude, public_url};
use crate::similarity::ScoredCandidate;
use crate::store::RecordMetadata;

/// Validated latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A ranked, geolocated search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationResult {
    pub image_url: String,
    #[serde(rename = "score")]
    pub similarity_score: f32,
    pub coordinates: Coordinates,
    pub heading: String,
    pub public_url: String,
}

/// Why a candidate was left out of the results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Index has no metadata row; the store invariant should prevent this
    MissingRow,
    MissingCoordinate,
    NonNumericCoordinate,
    NonFiniteCoordinate,
    OutOfRange,
    EmptyImageUrl,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingRow => "no metadata row",
            Self::MissingCoordinate => "missing coordinate",
            Self::NonNumericCoordinate => "non-numeric coordinate",
            Self::NonFiniteCoordinate => "non-finite coordinate",
            Self::OutOfRange => "coordinates out of range",
            Self::EmptyImageUrl => "empty image url",
        };
        f.write_str(text)
    }
}

/// Assembled results plus the candidates that were dropped
#[derive(Debug, Default)]
pub struct AssemblyReport {
    pub results: Vec<LocationResult>,
    pub skipped: Vec<(usize, SkipReason)>,
}

fn parse_coordinate(raw: Option<&str>) -> Result<f64, SkipReason> {
    let text = raw.map(str::trim).filter(|s| !s.is_empty());
    let value: f64 = text
        .ok_or(SkipReason::MissingCoordinate)?
        .parse()
        .map_err(|_| SkipReason::NonNumericCoordinate)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SkipReason::NonFiniteCoordinate)
    }
}

/// Turn one candidate into a result, or say why it cannot be one
pub fn assemble_one(
    candidate: &ScoredCandidate,
    metadata: &[RecordMetadata],
) -> Result<LocationResult, SkipReason> {
    let row = metadata.get(candidate.index).ok_or(SkipReason::MissingRow)?;

    let latitude = parse_coordinate(row.latitude.as_deref())?;
    let longitude = parse_coordinate(row.longitude.as_deref())?;
    if !is_valid_latitude(latitude) || !is_valid_longitude(longitude) {
        return Err(SkipReason::OutOfRange);
    }

    let image_url = row.image_url.trim();
    if image_url.is_empty() {
        return Err(SkipReason::EmptyImageUrl);
    }

    Ok(LocationResult {
        image_url: image_url.to_string(),
        similarity_score: candidate.score,
        coordinates: Coordinates {
            latitude,
            longitude,
        },
        heading: extract_heading(image_url),
        public_url: public_url(latitude, longitude),
    })
}

/// Assemble every candidate, keeping input order and recording skips
pub fn assemble_report(
    candidates: &[ScoredCandidate],
    metadata: &[RecordMetadata],
) -> AssemblyReport {
    let mut report = AssemblyReport {
        results: Vec::with_capacity(candidates.len()),
        skipped: Vec::new(),
    };

    for candidate in candidates {
        match assemble_one(candidate, metadata) {
            Ok(result) => report.results.push(result),
            Err(reason) => {
                if reason == SkipReason::MissingRow {
                    warn!(
                        "Candidate {} has no metadata row ({} rows)",
                        candidate.index,
                        metadata.len()
                    );
                } else {
                    debug!("Skipping result {}: {}", candidate.index, reason);
                }
                report.skipped.push((candidate.index, reason));
            }
        }
    }

    report
}

pub fn assemble(candidates: &[ScoredCandidate], metadata: &[RecordMetadata]) -> Vec<LocationResult> {
    assemble_report(candidates, metadata).results
}
