//! A single reusable bisection abstraction shared by the Version Bisector
//! (C4) and the Pass Bisector (C5), parameterized by `(probe, skip_budget)`
//! over an index range — rather than duplicating the binary-search-with-
//! skip-budget logic twice.

use trace2pass_domain::Verdict3;

/// One probed index and what it returned, for the auditable decision log.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRecord {
    pub index: usize,
    pub verdict: Verdict3,
    pub wall_time_ms: u64,
}

/// Outcome of a bounded binary search for the pass/fail boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum BisectionOutcome {
    /// `boundary` is the smallest index at which the probe fails; every
    /// index below it passes.
    Bounded { boundary: usize },
    /// The skip budget for indeterminate probes was exhausted before a
    /// boundary could be established.
    Unbisectable,
}

/// Result of a full bisection run: the final outcome plus the complete
/// probe log, in probe order, for auditability.
#[derive(Debug, Clone, PartialEq)]
pub struct BisectionResult {
    pub outcome: BisectionOutcome,
    pub log: Vec<ProbeRecord>,
}

/// Binary-search for the pass→fail boundary over `[good, bad]`.
///
/// Preconditions (checked by the caller via a sanity pass, not here):
/// `probe(good)` is `Pass` and `probe(bad)` is `Fail`. Invariant maintained
/// throughout: every index `<= good` passes, every index `>= bad` fails.
///
/// When a probe is `Indeterminate`, the index is skipped and an adjacent
/// index is tried instead, up to `skip_budget` total skips across the
/// whole run; exceeding the budget reports `Unbisectable`.
pub async fn run_bisection<F, Fut>(
    mut good: usize,
    mut bad: usize,
    skip_budget: u32,
    mut probe: F,
) -> BisectionResult
where
    F: FnMut(usize) -> Fut,
    Fut: std::future::Future<Output = (Verdict3, u64)>,
{
    let mut log = Vec::new();
    let mut skips_used = 0u32;

    while bad - good > 1 {
        let mut mid = good + (bad - good) / 2;

        let (verdict, wall_time_ms) = loop {
            let (verdict, wall_time_ms) = probe(mid).await;
            log.push(ProbeRecord {
                index: mid,
                verdict,
                wall_time_ms,
            });

            if verdict != Verdict3::Indeterminate {
                break (verdict, wall_time_ms);
            }

            skips_used += 1;
            if skips_used > skip_budget {
                return BisectionResult {
                    outcome: BisectionOutcome::Unbisectable,
                    log,
                };
            }

            let candidate = mid + 1;
            if candidate >= bad {
                return BisectionResult {
                    outcome: BisectionOutcome::Unbisectable,
                    log,
                };
            }
            mid = candidate;
        };

        match verdict {
            Verdict3::Pass => good = mid,
            Verdict3::Fail => bad = mid,
            Verdict3::Indeterminate => unreachable!("loop above only exits on a decisive verdict"),
        }
    }

    BisectionResult {
        outcome: BisectionOutcome::Bounded { boundary: bad },
        log,
    }
}
