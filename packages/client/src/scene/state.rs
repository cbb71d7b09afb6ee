//! Pure scene state: the ordered list of canvas objects.
//!
//! Every operation is keyed by object id and tolerates ids it does not know.

use super::{canvas_object::CanvasObject, image::ImageHandle};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    objects: Vec<CanvasObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `object` unless an object with the same id already exists.
    pub fn add(&mut self, object: CanvasObject) -> bool {
        if self.contains(&object.id) {
            return false;
        }
        self.objects.push(object);
        true
    }

    /// Overwrite position, rotation and scale. `false` if the id is unknown.
    pub fn move_object(&mut self, id: &str, x: f64, y: f64, rotation: f64, scale: f64) -> bool {
        let Some(object) = self.objects.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        object.x = x;
        object.y = y;
        object.rotation = rotation;
        object.scale = scale;
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<CanvasObject> {
        let index = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(index))
    }

    /// Remove every object, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.objects.len();
        self.objects.clear();
        count
    }

    pub fn attach_image(&mut self, id: &str, image: ImageHandle) -> Option<&CanvasObject> {
        let object = self.objects.iter_mut().find(|o| o.id == id)?;
        object.image = Some(image);
        Some(object)
    }

    pub fn get(&self, id: &str) -> Option<&CanvasObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn objects(&self) -> &[CanvasObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
