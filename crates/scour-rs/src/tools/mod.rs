//! Agent-facing tool surfaces.
//!
//! The engine exposes one tool to the model: `prune`, which references
//! entries of the prunable-tools listing by numeric id. Outer conveniences
//! (distill, compress) are host-side callers of the same executor and live
//! with the host; only the prune surface itself is defined here.

pub mod prune;

pub use prune::{PruneArgs, PruneItem, PruneOutput, run_prune};
