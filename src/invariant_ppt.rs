//! Runtime invariant assertions with contract tracking behind the `ppt`
//! feature.
//!
//! Call sites assert an invariant by id; with `ppt` enabled every id that
//! held at least once is recorded, and a contract test can then require that
//! a scenario actually exercised the invariants it claims to.

#[cfg(feature = "ppt")]
use lazy_static::lazy_static;
#[cfg(feature = "ppt")]
use std::collections::HashSet;
#[cfg(feature = "ppt")]
use std::sync::Mutex;

/// Every accepted edge leaves the graph a legal DAG.
pub const GRAPH_LEGALITY: u32 = 1;
/// Illegal edges (cycles) are rejected, never silently dropped.
pub const GRAPH_REJECTS_INVALID: u32 = 2;
/// A compiled plan covers every node exactly once, in dependency order.
pub const PLAN_SOUNDNESS: u32 = 3;
/// The switch's bypass path is fully pre-wired at construction.
pub const SWITCH_TOPOLOGY: u32 = 4;
/// The two switching gains always target complementary levels.
pub const GAINS_COMPLEMENTARY: u32 = 5;

#[cfg(feature = "ppt")]
lazy_static! {
    static ref ASSERTED: Mutex<HashSet<u32>> = Mutex::new(HashSet::new());
}

/// Check an invariant, recording the id when it holds and panicking with the
/// id, message, and call site when it does not.
#[cfg(feature = "ppt")]
pub(crate) fn assert_invariant(id: u32, condition: bool, message: &str, site: Option<&str>) {
    if !condition {
        match site {
            Some(site) => panic!("invariant {} violated at {}: {}", id, site, message),
            None => panic!("invariant {} violated: {}", id, message),
        }
    }
    ASSERTED.lock().unwrap().insert(id);
}

/// Check an invariant, panicking with the message when it does not hold.
#[cfg(not(feature = "ppt"))]
pub fn assert_invariant(_id: u32, condition: bool, message: &str, _site: Option<&str>) {
    if !condition {
        panic!("invariant violated: {}", message);
    }
}

/// Require that every listed invariant was asserted since the log was last
/// cleared; panics naming the scenario and the ids that never fired.
#[cfg(feature = "ppt")]
pub fn contract_test(scenario: &str, required: &[u32]) {
    let asserted = ASSERTED.lock().unwrap();
    let missing: Vec<u32> = required
        .iter()
        .copied()
        .filter(|id| !asserted.contains(id))
        .collect();
    drop(asserted);
    if !missing.is_empty() {
        panic!(
            "scenario '{}' never exercised invariants {:?}",
            scenario, missing
        );
    }
}

/// No-op without the `ppt` feature.
#[cfg(not(feature = "ppt"))]
pub fn contract_test(_scenario: &str, _required: &[u32]) {}

/// Forget every recorded invariant id.
#[cfg(feature = "ppt")]
pub fn clear_invariant_log() {
    ASSERTED.lock().unwrap().clear();
}

/// No-op without the `ppt` feature.
#[cfg(not(feature = "ppt"))]
pub fn clear_invariant_log() {}
