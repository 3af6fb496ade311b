//! ProRev Render Library
//!
//! Scene construction for the whiteboard and image encoding for camera
//! captures. The default implementation uses Vello for GPU-accelerated
//! rendering.

mod encode;
mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use encode::{DEFAULT_JPEG_QUALITY, decode_rgba, encode_jpeg};
pub use renderer::{BoardLayout, RenderContext, Renderer, RendererError};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloRenderer;
