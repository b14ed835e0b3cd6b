//! Segment catalog. Static descriptive text for each segment, used by presentation code.
//!
//! The classifier never reads this table.

use crate::domain::entities::Segment;
use serde::Serialize;

/// Label shown for customers without a segment.
pub const NOT_SEGMENTED: &str = "Not Segmented";

/// Descriptive metadata for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentProfile {
    pub segment: Segment,
    pub name: &'static str,
    pub description: &'static str,
    pub characteristics: &'static [&'static str],
    pub recommendations: &'static [&'static str],
}

static CATALOG: [SegmentProfile; 4] = [
    SegmentProfile {
        segment: Segment::YoungSaver,
        name: "Young Saver",
        description: "Young individuals starting their financial journey",
        characteristics: &[
            "Age: 18-30 years",
            "Low to medium income",
            "Growing savings",
            "Digital banking preference",
        ],
        recommendations: &[
            "Start a savings plan",
            "Explore student/young professional accounts",
            "Consider investment options for beginners",
        ],
    },
    SegmentProfile {
        segment: Segment::EstablishedProfessional,
        name: "Established Professional",
        description: "Mid-career professionals with stable income",
        characteristics: &[
            "Age: 30-50 years",
            "Stable and growing income",
            "Multiple financial goals",
            "Investing for future",
        ],
        recommendations: &[
            "Maximize retirement contributions",
            "Explore investment portfolios",
            "Consider premium banking services",
        ],
    },
    SegmentProfile {
        segment: Segment::MortgageSeeker,
        name: "Mortgage Seeker",
        description: "Individuals looking to purchase property",
        characteristics: &[
            "Age: 25-40 years",
            "Stable employment",
            "Good credit history",
            "Saving for down payment",
        ],
        recommendations: &[
            "Check mortgage eligibility",
            "Explore first-time homebuyer programs",
            "Improve credit score if needed",
        ],
    },
    SegmentProfile {
        segment: Segment::RetiredAffluent,
        name: "Retired & Affluent",
        description: "Retired individuals with significant assets",
        characteristics: &[
            "Age: 60+ years",
            "Substantial savings and investments",
            "Focus on wealth preservation",
            "Estate planning",
        ],
        recommendations: &[
            "Review retirement withdrawal strategy",
            "Estate planning services",
            "Wealth management options",
        ],
    },
];

/// Read-only lookup over the static catalog.
pub struct SegmentCatalog;

impl SegmentCatalog {
    pub fn profile(segment: Segment) -> &'static SegmentProfile {
        // CATALOG holds one entry per variant, in declaration order.
        &CATALOG[segment as usize]
    }

    pub fn all() -> &'static [SegmentProfile] {
        &CATALOG
    }

    /// Human-readable name, or "Not Segmented".
    pub fn display_name(segment: Option<Segment>) -> &'static str {
        segment.map_or(NOT_SEGMENTED, |s| Self::profile(s).name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_segment_has_its_own_entry() {
        for seg in Segment::ALL {
            assert_eq!(SegmentCatalog::profile(seg).segment, seg);
        }
        assert_eq!(SegmentCatalog::all().len(), Segment::ALL.len());
    }

    #[test]
    fn display_names() {
        assert_eq!(
            SegmentCatalog::display_name(Some(Segment::RetiredAffluent)),
            "Retired & Affluent"
        );
        assert_eq!(SegmentCatalog::display_name(None), "Not Segmented");
    }

    #[test]
    fn profiles_carry_characteristics_and_recommendations() {
        let p = SegmentCatalog::profile(Segment::MortgageSeeker);
        assert_eq!(p.characteristics.len(), 4);
        assert_eq!(p.recommendations[0], "Check mortgage eligibility");
    }
}
