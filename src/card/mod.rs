//! Profile-card and welcome-banner composition.
//!
//! Options are resolved once into an [`effective::EffectiveStyle`], assets are prefetched in
//! parallel, every layer compiles to a plan, and the CPU backend composites the plans in order.

pub mod builtin;
pub mod effective;
pub mod format;
pub mod layers;
pub mod model;
pub mod options;
pub mod pipeline;
pub mod provider;
pub mod scale;
pub mod text_fit;
pub mod welcome;
