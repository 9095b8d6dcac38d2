//! Mapping RFM triplets to named customer segments

use std::fmt;

use crate::data::{aggregate_customers, Transaction};
use crate::model::{score_customers, RfmScore, Triplet};

/// Named customer segment
///
/// Variants are declared in rule priority order, with the catch-all last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    LostChurned,
    SlippingAway,
    NewCustomers,
    PotentialChurners,
    Active,
    Loyal,
    Undefined,
}

impl Segment {
    pub const ALL: [Segment; 7] = [
        Segment::LostChurned,
        Segment::SlippingAway,
        Segment::NewCustomers,
        Segment::PotentialChurners,
        Segment::Active,
        Segment::Loyal,
        Segment::Undefined,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Segment::LostChurned => "Lost/Churned Customer",
            Segment::SlippingAway => "Slipping Away, Cannot Lose",
            Segment::NewCustomers => "New Customers",
            Segment::PotentialChurners => "Potential Churners",
            Segment::Active => "Active",
            Segment::Loyal => "Loyal",
            Segment::Undefined => "Cannot Be Defined / Other",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Triplets that resolve to one segment
#[derive(Debug, Clone, Copy)]
pub struct SegmentRule {
    pub segment: Segment,
    pub triplets: &'static [&'static str],
}

impl SegmentRule {
    pub fn matches(&self, code: &str) -> bool {
        self.triplets.contains(&code)
    }
}

/// Segment for triplets no rule claims
pub const DEFAULT_SEGMENT: Segment = Segment::Undefined;

/// Classification rules in priority order; the first match wins.
pub const SEGMENT_RULES: &[SegmentRule] = &[
    SegmentRule {
        segment: Segment::LostChurned,
        triplets: &["111", "112", "121", "122", "123", "132", "211", "212", "114", "141"],
    },
    SegmentRule {
        segment: Segment::SlippingAway,
        triplets: &["133", "134", "143", "244", "334", "343", "344", "144"],
    },
    SegmentRule {
        segment: Segment::NewCustomers,
        triplets: &["311", "411", "331"],
    },
    SegmentRule {
        segment: Segment::PotentialChurners,
        triplets: &["222", "231", "221", "223", "233", "322"],
    },
    SegmentRule {
        segment: Segment::Active,
        triplets: &["323", "333", "321", "341", "422", "332", "432"],
    },
    SegmentRule {
        segment: Segment::Loyal,
        triplets: &["433", "434", "443", "444"],
    },
];

/// Resolve a triplet against [`SEGMENT_RULES`]
pub fn classify(triplet: &Triplet) -> Segment {
    classify_with(SEGMENT_RULES, triplet)
}

/// Resolve a triplet against an ordered rule list
pub fn classify_with(rules: &[SegmentRule], triplet: &Triplet) -> Segment {
    let code = triplet.to_string();
    rules
        .iter()
        .find(|rule| rule.matches(&code))
        .map_or(DEFAULT_SEGMENT, |rule| rule.segment)
}

/// Parse and resolve a triplet code such as `"433"`
///
/// Codes that cannot come out of quartile scoring (`"999"`, `"43"`) are
/// rejected rather than falling through to the default segment.
pub fn classify_code(code: &str) -> crate::Result<Segment> {
    let triplet: Triplet = code.parse()?;
    Ok(classify(&triplet))
}

/// Per-customer classification result
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSegment {
    pub customer_id: String,
    pub recency: i64,
    pub frequency: u64,
    pub monetary: i64,
    pub score: RfmScore,
    pub segment: Segment,
}

impl CustomerSegment {
    pub fn triplet(&self) -> Triplet {
        self.score.triplet()
    }
}

/// Run aggregation, quartile scoring and segmentation over a transaction set
///
/// Rows are sorted by customer identifier; identical input always yields
/// identical output.
pub fn segment_customers(transactions: &[Transaction]) -> crate::Result<Vec<CustomerSegment>> {
    let customers = aggregate_customers(transactions)?;
    let rows: Vec<CustomerSegment> = score_customers(customers)
        .into_iter()
        .map(|scored| {
            let segment = classify(&scored.score.triplet());
            CustomerSegment {
                customer_id: scored.aggregate.customer_id,
                recency: scored.aggregate.recency,
                frequency: scored.aggregate.frequency,
                monetary: scored.aggregate.monetary,
                score: scored.score,
                segment,
            }
        })
        .collect();

    let undefined = rows.iter().filter(|r| r.segment == DEFAULT_SEGMENT).count();
    tracing::info!(
        customers = rows.len(),
        undefined,
        "classified customers into segments"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RfmError;
    use std::collections::HashSet;

    fn all_codes() -> Vec<String> {
        let mut codes = Vec::new();
        for r in 1..=4 {
            for f in 1..=4 {
                for m in 1..=4 {
                    codes.push(format!("{r}{f}{m}"));
                }
            }
        }
        codes
    }

    #[test]
    fn test_known_triplets() {
        assert_eq!(classify_code("433").unwrap(), Segment::Loyal);
        assert_eq!(classify_code("111").unwrap(), Segment::LostChurned);
        assert_eq!(classify_code("344").unwrap(), Segment::SlippingAway);
        assert_eq!(classify_code("411").unwrap(), Segment::NewCustomers);
        assert_eq!(classify_code("233").unwrap(), Segment::PotentialChurners);
        assert_eq!(classify_code("432").unwrap(), Segment::Active);
    }

    #[test]
    fn test_unmapped_triplet_defaults() {
        assert_eq!(classify_code("424").unwrap(), Segment::Undefined);
        assert_eq!(classify_code("113").unwrap(), Segment::Undefined);
    }

    #[test]
    fn test_out_of_range_triplet_rejected() {
        let err = classify_code("999").unwrap_err();
        assert_eq!(
            err.downcast_ref::<RfmError>(),
            Some(&RfmError::InvalidTriplet("999".to_string()))
        );
        assert!(classify_code("4330").is_err());
    }

    #[test]
    fn test_rule_table_is_well_formed() {
        let mut seen = HashSet::new();
        for rule in SEGMENT_RULES {
            assert_ne!(rule.segment, DEFAULT_SEGMENT);
            for code in rule.triplets {
                assert!(code.parse::<Triplet>().is_ok(), "{code}");
                assert!(seen.insert(*code), "{code} claimed twice");
            }
        }
        assert_eq!(seen.len(), 38);

        let defaulted = all_codes()
            .iter()
            .filter(|c| classify_code(c).unwrap() == DEFAULT_SEGMENT)
            .count();
        assert_eq!(defaulted, 64 - 38);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let overlapping = [
            SegmentRule {
                segment: Segment::Active,
                triplets: &["433"],
            },
            SegmentRule {
                segment: Segment::Loyal,
                triplets: &["433", "444"],
            },
        ];
        let loyal: Triplet = "433".parse().unwrap();
        let other: Triplet = "444".parse().unwrap();
        assert_eq!(classify_with(&overlapping, &loyal), Segment::Active);
        assert_eq!(classify_with(&overlapping, &other), Segment::Loyal);
        assert_eq!(classify_with(&[], &loyal), DEFAULT_SEGMENT);
    }

    #[test]
    fn test_segment_labels() {
        let labels: Vec<&str> = Segment::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels.first(), Some(&"Lost/Churned Customer"));
        assert_eq!(labels.last(), Some(&"Cannot Be Defined / Other"));
        assert_eq!(Segment::SlippingAway.to_string(), "Slipping Away, Cannot Lose");
    }
}
