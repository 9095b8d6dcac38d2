//! Quartile-based RFM scoring
//!
//! Each dimension is ranked independently and split into four ordinal buckets
//! the way SQL `NTILE(4)` does: with `N` customers, `q = N / 4` and `r = N % 4`,
//! the first `r` buckets hold `q + 1` customers and the rest hold `q`.
//! Bucketing is by rank, not by value thresholds.
//!
//! Directions are chosen so that 4 is always the most desirable score:
//! recency is ranked descending (the most recent customers land in bucket 4),
//! frequency and monetary ascending (the largest values land in bucket 4).
//!
//! Ties are broken by customer identifier, ascending, in every dimension.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::data::CustomerAggregate;
use crate::error::RfmError;

/// Number of buckets per dimension
pub const QUARTILES: usize = 4;

/// Score in `1..=4` along one dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quartile(u8);

impl Quartile {
    pub fn new(value: u8) -> Result<Self, RfmError> {
        if (1..=QUARTILES as u8).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RfmError::InvalidQuartile(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Recency, frequency and monetary quartiles of one customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RfmScore {
    pub recency: Quartile,
    pub frequency: Quartile,
    pub monetary: Quartile,
}

impl RfmScore {
    pub fn triplet(&self) -> Triplet {
        Triplet([self.recency, self.frequency, self.monetary])
    }
}

/// Scores concatenated in (recency, frequency, monetary) order, e.g. `433`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triplet([Quartile; 3]);

impl Triplet {
    pub fn quartiles(&self) -> [Quartile; 3] {
        self.0
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, fq, m] = self.0;
        write!(f, "{}{}{}", r.get(), fq.get(), m.get())
    }
}

impl FromStr for Triplet {
    type Err = RfmError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let invalid = || RfmError::InvalidTriplet(code.to_string());
        let bytes = code.as_bytes();
        if bytes.len() != 3 {
            return Err(invalid());
        }

        let mut quartiles = [Quartile(1); 3];
        for (slot, b) in quartiles.iter_mut().zip(bytes) {
            if !b.is_ascii_digit() {
                return Err(invalid());
            }
            *slot = Quartile::new(b - b'0').map_err(|_| invalid())?;
        }
        Ok(Self(quartiles))
    }
}

/// Customer aggregate with its quartile scores
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCustomer {
    pub aggregate: CustomerAggregate,
    pub score: RfmScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortDirection {
    Ascending,
    Descending,
}

/// 1-based NTILE bucket of the element at `position` in a ranking of `total`
pub fn ntile(position: usize, total: usize, buckets: usize) -> usize {
    debug_assert!(position < total && buckets > 0);
    let base = total / buckets;
    let larger = total % buckets;
    let head = larger * (base + 1);
    if position < head {
        position / (base + 1) + 1
    } else {
        larger + (position - head) / base + 1
    }
}

fn rank_quartiles<K, F>(customers: &[CustomerAggregate], key: F, direction: SortDirection) -> Vec<Quartile>
where
    K: Ord,
    F: Fn(&CustomerAggregate) -> K,
{
    let mut order: Vec<usize> = (0..customers.len()).collect();
    order.sort_by(|&a, &b| {
        let by_value = key(&customers[a]).cmp(&key(&customers[b]));
        let by_value = match direction {
            SortDirection::Ascending => by_value,
            SortDirection::Descending => by_value.reverse(),
        };
        match by_value {
            Ordering::Equal => customers[a].customer_id.cmp(&customers[b].customer_id),
            other => other,
        }
    });

    let total = customers.len();
    let mut scores = vec![Quartile(1); total];
    for (position, &index) in order.iter().enumerate() {
        scores[index] = Quartile(ntile(position, total, QUARTILES) as u8);
    }
    scores
}

/// Assign recency, frequency and monetary quartiles to every customer
///
/// Output order matches input order.
pub fn score_customers(customers: Vec<CustomerAggregate>) -> Vec<ScoredCustomer> {
    let recency = rank_quartiles(&customers, |c| c.recency, SortDirection::Descending);
    let frequency = rank_quartiles(&customers, |c| c.frequency, SortDirection::Ascending);
    let monetary = rank_quartiles(&customers, |c| c.monetary, SortDirection::Ascending);

    tracing::debug!(customers = customers.len(), "scored customers into quartiles");

    customers
        .into_iter()
        .enumerate()
        .map(|(i, aggregate)| ScoredCustomer {
            aggregate,
            score: RfmScore {
                recency: recency[i],
                frequency: frequency[i],
                monetary: monetary[i],
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn customer(id: &str, recency: i64, frequency: u64, monetary: i64) -> CustomerAggregate {
        CustomerAggregate {
            customer_id: id.to_string(),
            recency,
            frequency,
            monetary,
            last_order: NaiveDate::from_ymd_opt(2005, 5, 31).unwrap(),
        }
    }

    fn bucket_sizes(scores: &[Quartile]) -> [usize; 4] {
        let mut sizes = [0; 4];
        for q in scores {
            sizes[q.get() as usize - 1] += 1;
        }
        sizes
    }

    #[test]
    fn test_ntile_bucket_sizes() {
        for total in 1..=50 {
            let mut sizes = [0usize; 4];
            for position in 0..total {
                let bucket = ntile(position, total, 4);
                assert!((1..=4).contains(&bucket));
                sizes[bucket - 1] += 1;
            }
            assert_eq!(sizes.iter().sum::<usize>(), total);
            for &size in &sizes {
                assert!(size == total / 4 || size == total.div_ceil(4), "total {total}: {sizes:?}");
            }
            // Larger buckets come first
            assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    fn test_ntile_small_inputs() {
        assert_eq!(ntile(0, 1, 4), 1);
        assert_eq!((0..3).map(|p| ntile(p, 3, 4)).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!((0..6).map(|p| ntile(p, 6, 4)).collect::<Vec<_>>(), vec![1, 1, 2, 2, 3, 4]);
    }

    #[test]
    fn test_score_directions() {
        let customers = vec![
            customer("a", 300, 1, 100),
            customer("b", 200, 2, 200),
            customer("c", 100, 3, 300),
            customer("d", 0, 4, 400),
        ];
        let scored = score_customers(customers);

        let triplets: Vec<String> = scored.iter().map(|s| s.score.triplet().to_string()).collect();
        // Oldest, least frequent, lowest spend scores 1 everywhere
        assert_eq!(triplets, vec!["111", "222", "333", "444"]);
    }

    #[test]
    fn test_ties_broken_by_customer_id() {
        let customers = vec![
            customer("d", 10, 1, 50),
            customer("b", 10, 1, 50),
            customer("a", 10, 1, 50),
            customer("c", 10, 1, 50),
        ];
        let scored = score_customers(customers);

        let monetary: Vec<(&str, u8)> = scored
            .iter()
            .map(|s| (s.aggregate.customer_id.as_str(), s.score.monetary.get()))
            .collect();
        assert_eq!(monetary, vec![("d", 4), ("b", 2), ("a", 1), ("c", 3)]);

        // Recency ties use the same ascending identifier order
        let recency: Vec<u8> = scored.iter().map(|s| s.score.recency.get()).collect();
        assert_eq!(recency, vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_scores_in_range_and_balanced() {
        let customers: Vec<CustomerAggregate> = (0..37)
            .map(|i| customer(&format!("c{i:02}"), (i * 7 % 11) as i64, (i % 5 + 1) as u64, (i * 13 % 17) as i64))
            .collect();
        let scored = score_customers(customers);

        for dimension in [
            scored.iter().map(|s| s.score.recency).collect::<Vec<_>>(),
            scored.iter().map(|s| s.score.frequency).collect::<Vec<_>>(),
            scored.iter().map(|s| s.score.monetary).collect::<Vec<_>>(),
        ] {
            assert!(dimension.iter().all(|q| (1..=4).contains(&q.get())));
            assert_eq!(bucket_sizes(&dimension), [10, 9, 9, 9]);
        }
    }

    #[test]
    fn test_score_is_deterministic() {
        let customers: Vec<CustomerAggregate> = (0..20)
            .map(|i| customer(&format!("c{i}"), (i % 3) as i64, 1, (i % 4) as i64))
            .collect();
        let first = score_customers(customers.clone());
        let second = score_customers(customers);
        assert_eq!(first, second);
    }

    #[test]
    fn test_score_empty() {
        assert!(score_customers(Vec::new()).is_empty());
    }

    #[test]
    fn test_quartile_bounds() {
        assert!(Quartile::new(1).is_ok());
        assert!(Quartile::new(4).is_ok());
        assert_eq!(Quartile::new(0), Err(RfmError::InvalidQuartile(0)));
        assert_eq!(Quartile::new(5), Err(RfmError::InvalidQuartile(5)));
    }

    #[test]
    fn test_triplet_parse() {
        let triplet: Triplet = "433".parse().unwrap();
        assert_eq!(triplet.to_string(), "433");
        assert_eq!(triplet.quartiles()[0].get(), 4);

        for bad in ["999", "043", "43", "4334", "4a3", ""] {
            assert_eq!(
                bad.parse::<Triplet>(),
                Err(RfmError::InvalidTriplet(bad.to_string())),
                "{bad}"
            );
        }
    }
}
