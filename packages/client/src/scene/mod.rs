//! Client-side replica of the shared canvas.

mod canvas_object;
mod image;
mod reconciler;
mod state;

pub use canvas_object::{CanvasObject, DEFAULT_OBJECT_SIZE, Mold};
pub use image::{AssetFetcher, HttpAssetFetcher, ImageHandle, ImageSource, resolve_image};
pub use reconciler::{ImageReadyCallback, RedrawCallback, SceneReconciler};
pub use state::Scene;
