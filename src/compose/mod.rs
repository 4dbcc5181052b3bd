//! Overlay/group compositing and the mask engine.

pub mod mask;
pub mod overlay;

pub use mask::{Mask, MaskSource, apply_mask};
pub use overlay::{Group, Layer, LayerContent, LayerContext, group, overlay, render_content};
