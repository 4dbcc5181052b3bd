//! Asset builder, operation dispatch and the renderer that ties the backends together.

pub mod asset;
pub mod dispatch;
pub mod renderer;

pub use asset::{Asset, AssetSource, MAX_NESTING_DEPTH};
pub use dispatch::{Degradation, Dispatcher, ImageBuffer, RenderReport};
pub use renderer::{Rendered, Renderer, RendererOpts};
