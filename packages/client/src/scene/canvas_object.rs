//! Canvas objects and the mold records they are placed from.

use serde::{Deserialize, Serialize};

use katagami_shared::{id::generate_id, protocol::MoldId};

use super::image::ImageHandle;

/// Width and height used when a mold record has none.
pub const DEFAULT_OBJECT_SIZE: f64 = 100.0;

fn default_size() -> f64 {
    DEFAULT_OBJECT_SIZE
}

fn default_scale() -> f64 {
    1.0
}

/// Mold record as served by the mold API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mold {
    pub id: MoldId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub svg_path: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
}

/// A placed instance of a mold on the shared canvas.
///
/// This is also the `object` payload of `canvas_object_added`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasObject {
    pub id: String,
    #[serde(default)]
    pub mold_id: Option<MoldId>,
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_size")]
    pub width: f64,
    #[serde(default = "default_size")]
    pub height: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub svg_path: Option<String>,
    /// Decoded asset, attached once image resolution completes
    #[serde(skip)]
    pub image: Option<ImageHandle>,
}

impl CanvasObject {
    /// Place `mold` at `(x, y)` with a freshly generated id.
    pub fn from_mold(mold: &Mold, x: f64, y: f64) -> Self {
        Self {
            id: generate_id("obj"),
            mold_id: Some(mold.id.clone()),
            name: mold.name.clone(),
            x,
            y,
            width: positive_or_default(mold.width),
            height: positive_or_default(mold.height),
            scale: 1.0,
            rotation: 0.0,
            svg_path: mold.svg_path.clone().filter(|p| !p.is_empty()),
            image: None,
        }
    }
}

fn positive_or_default(value: Option<f64>) -> f64 {
    value.filter(|v| *v > 0.0).unwrap_or(DEFAULT_OBJECT_SIZE)
}
