//! Typographic halftone renderer.
//!
//! An image is sampled into a coarse luminance grid, each cell is drawn as a
//! character from a density ramp, and pointer-spawned ripples displace where
//! cells sample from. See [`renderer::HalftoneRenderer`] for the frame driver.

pub mod compositor;
pub mod config;
pub mod draw;
pub mod error;
pub mod fade;
pub mod font;
pub mod gamma;
pub mod renderer;
pub mod ripple;
pub mod sampler;
pub mod types;

pub use compositor::{Canvas, FrameStats, GlyphCompositor};
pub use error::Error;
pub use renderer::{HalftoneRenderer, Lifecycle, RenderOptions};
pub use ripple::RippleField;
pub use sampler::{ImageSource, LuminanceSampler};
pub use types::{FrameBuffer, LuminanceGrid, Rgb};
