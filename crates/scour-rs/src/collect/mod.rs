//! Collection: the redaction executor and the automatic strategies that
//! feed it.
//!
//! 1. **[`executor`]** — the single transcript mutation point. Every prune,
//!    manual or automatic, routes through [`collect`] so that idempotence
//!    and the statistics invariants hold globally.
//!
//! 2. **[`strategies`]** — three independent passes (deduplication,
//!    supersede-writes, purge-stale-errors) that scan the session cache and
//!    propose call identifiers for collection without operator instruction.

pub mod executor;
pub mod strategies;

pub use executor::{
    CollectOutcome, CollectRequest, DISTILLED_PREFIX, PRUNED_INPUT_PLACEHOLDER,
    PRUNED_OUTPUT_PLACEHOLDER, apply_marked, collect,
};
pub use strategies::run_automatic_pass;
