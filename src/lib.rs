//! Cardsmith composes profile cards and welcome banners into PNG images.
//!
//! Rendering is plan-based and runs on the CPU:
//!
//! - Resolve a [`CardSpec`] and [`StyleOptions`] into one effective style
//! - Compile each layer into a [`LayerPlan`](render::plan::LayerPlan)
//! - Rasterize and composite the plans with [`CpuBackend`](render::cpu::CpuBackend)
//!
//! [`CardRenderer`] wires these steps to an [`ImageLoader`] and a shared [`FontRegistry`].
#![forbid(unsafe_code)]

mod foundation;

/// Image, colour and font collaborators.
pub mod assets;
/// Card model, options and layer generators.
pub mod card;
/// Plans, CPU backend and pixel kernels.
pub mod render;

pub use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8, RoundedRect, Vec2};
pub use crate::foundation::error::{CardError, CardResult};

pub use crate::assets::decode::PreparedImage;
pub use crate::assets::fonts::{FontRegistry, FontSpec};
pub use crate::assets::loader::{FsImageLoader, ImageLoader, ImageRef, MemoryImageLoader};
pub use crate::card::model::{CardSpec, Identity};
pub use crate::card::options::{RankOptions, StyleOptions, WelcomeOptions};
pub use crate::card::pipeline::CardRenderer;
pub use crate::card::provider::{JsonProfileProvider, ProfileProvider};
