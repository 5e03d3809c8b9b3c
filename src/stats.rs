use std::collections::HashMap;

use crate::models::{DomainStats, ProbeResult};

/// `round(100 * up / total)` with ties going to the even neighbour, in
/// exact integer arithmetic. A domain with no probes reports 0.
pub fn availability_percent(up: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let up = up.min(total) as u128;
    let total = total as u128;
    let scaled = 100 * up;
    let quotient = scaled / total;
    let twice_remainder = 2 * (scaled % total);

    let rounded = if twice_remainder > total || (twice_remainder == total && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    };
    rounded as u8
}

/// Per-cycle accumulator. Domains keep the order in which they were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleStats {
    domains: Vec<(String, DomainStats)>,
    index: HashMap<String, usize>,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &ProbeResult) {
        let slot = match self.index.get(&result.domain) {
            Some(&slot) => slot,
            None => {
                self.domains
                    .push((result.domain.clone(), DomainStats::default()));
                let slot = self.domains.len() - 1;
                self.index.insert(result.domain.clone(), slot);
                slot
            }
        };
        self.domains[slot].1.record(result.status);
    }

    pub fn get(&self, domain: &str) -> Option<&DomainStats> {
        self.index.get(domain).map(|&slot| &self.domains[slot].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DomainStats)> {
        self.domains
            .iter()
            .map(|(domain, stats)| (domain.as_str(), stats))
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn total_probes(&self) -> usize {
        self.domains.iter().map(|(_, s)| s.total_count).sum()
    }

    pub fn total_up(&self) -> usize {
        self.domains.iter().map(|(_, s)| s.up_count).sum()
    }
}

pub fn aggregate<'a>(results: impl IntoIterator<Item = &'a ProbeResult>) -> CycleStats {
    let mut stats = CycleStats::new();
    for result in results {
        stats.record(result);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use std::time::Duration;

    fn up(domain: &str) -> ProbeResult {
        ProbeResult::up(domain, Duration::from_millis(5))
    }

    fn down(domain: &str) -> ProbeResult {
        ProbeResult::down(domain, ProbeError::Timeout, Duration::from_millis(500))
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(availability_percent(1, 3), 33);
        assert_eq!(availability_percent(2, 3), 67);
        assert_eq!(availability_percent(1, 8), 12);
        assert_eq!(availability_percent(3, 8), 38);
        assert_eq!(availability_percent(5, 8), 62);
        assert_eq!(availability_percent(1, 2), 50);
        assert_eq!(availability_percent(1, 200), 0);
        assert_eq!(availability_percent(3, 200), 2);
    }

    #[test]
    fn percent_stays_in_range() {
        for total in 1..=64 {
            for up in 0..=total {
                let pct = availability_percent(up, total);
                assert!(pct <= 100);
                let exact = 100.0 * up as f64 / total as f64;
                assert!((pct as f64 - exact).abs() <= 0.5 + 1e-9);
            }
        }
        assert_eq!(availability_percent(0, 0), 0);
        assert_eq!(availability_percent(4, 4), 100);
    }

    #[test]
    fn one_entry_per_domain_and_counts_sum_to_results() {
        let results = vec![
            up("a.test"),
            down("b.test"),
            up("a.test"),
            down("a.test"),
            up("c.test"),
        ];
        let stats = aggregate(&results);

        assert_eq!(stats.len(), 3);
        assert_eq!(stats.total_probes(), results.len());
        assert_eq!(stats.total_up(), 3);
        assert_eq!(
            stats.get("a.test"),
            Some(&DomainStats {
                up_count: 2,
                total_count: 3
            })
        );
        assert_eq!(stats.get("a.test").unwrap().availability_percent(), 67);
        assert_eq!(stats.get("b.test").unwrap().availability_percent(), 0);
    }

    #[test]
    fn domains_keep_first_seen_order() {
        let results = vec![up("z.test"), up("a.test"), down("z.test"), up("m.test")];
        let order: Vec<_> = aggregate(&results).iter().map(|(d, _)| d.to_string()).collect();
        assert_eq!(order, ["z.test", "a.test", "m.test"]);
    }

    #[test]
    fn counts_do_not_depend_on_result_order() {
        let mut results = vec![up("a.test"), down("a.test"), down("b.test"), up("b.test")];
        let forward = aggregate(&results);
        results.reverse();
        let backward = aggregate(&results);
        for (domain, stats) in forward.iter() {
            assert_eq!(backward.get(domain), Some(stats));
        }
    }

    #[test]
    fn empty_cycle_has_no_domains() {
        let stats = aggregate(&Vec::<ProbeResult>::new());
        assert!(stats.is_empty());
        assert_eq!(stats.total_probes(), 0);
    }
}
