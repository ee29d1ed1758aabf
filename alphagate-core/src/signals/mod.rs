//! Signal components and the composite FSS score.
//!
//! Each component maps trailing price history to a score in [0, 100]
//! (50 = neutral), or `None` when the warmup window has not elapsed.
//! The composite is a weighted average over the components that produced
//! a score, with weights renormalized over that subset.

pub mod composite;
pub mod mean_reversion;
pub mod momentum;

pub use composite::CompositeScorer;
pub use mean_reversion::MeanReversionSignal;
pub use momentum::MomentumSignal;
