//! Scene reconciler: merges local edits and peers' events into one scene.
//!
//! Local edits are applied first and then sent; they are never rolled back.
//! Remote events are applied by object id, so a `moved` for an unknown object or
//! a duplicate `added` changes nothing. With several editors the last `moved`
//! received wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde_json::Value;

use katagami_shared::protocol::{ServerMessage, UserId};

use crate::{
    error::ListenerError,
    transport::{ClientTransport, ListenerId},
};

use super::{
    canvas_object::{CanvasObject, Mold},
    image::{AssetFetcher, resolve_image},
    state::Scene,
};

/// Called with a snapshot of the scene after every applied remote mutation.
pub type RedrawCallback = Arc<dyn Fn(&[CanvasObject]) + Send + Sync>;

/// Called when an object's image has been attached.
pub type ImageReadyCallback = Arc<dyn Fn(&CanvasObject) + Send + Sync>;

/// Remote event types the reconciler applies.
const CANVAS_EVENTS: [&str; 4] = [
    "canvas_object_added",
    "canvas_object_moved",
    "canvas_object_removed",
    "canvas_cleared",
];

struct Inner {
    transport: ClientTransport,
    fetcher: Arc<dyn AssetFetcher>,
    local_user_id: Option<UserId>,
    scene: Mutex<Scene>,
    on_redraw: Mutex<Option<RedrawCallback>>,
    on_image_ready: Mutex<Option<ImageReadyCallback>>,
    subscriptions: Mutex<Vec<(&'static str, ListenerId)>>,
}

/// Single writer of the local scene.
#[derive(Clone)]
pub struct SceneReconciler {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SceneReconciler {
    /// `local_user_id` is used to drop echoes of this session's own events.
    pub fn new(
        transport: ClientTransport,
        fetcher: Arc<dyn AssetFetcher>,
        local_user_id: Option<UserId>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                fetcher,
                local_user_id,
                scene: Mutex::new(Scene::new()),
                on_redraw: Mutex::new(None),
                on_image_ready: Mutex::new(None),
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn set_on_redraw<F>(&self, callback: F)
    where
        F: Fn(&[CanvasObject]) + Send + Sync + 'static,
    {
        *lock(&self.inner.on_redraw) = Some(Arc::new(callback));
    }

    pub fn set_on_image_ready<F>(&self, callback: F)
    where
        F: Fn(&CanvasObject) + Send + Sync + 'static,
    {
        *lock(&self.inner.on_image_ready) = Some(Arc::new(callback));
    }

    /// Subscribe to the transport's canvas events.
    pub fn attach(&self) {
        let mut subscriptions = lock(&self.inner.subscriptions);
        if !subscriptions.is_empty() {
            return;
        }
        for event in CANVAS_EVENTS {
            // Weak: the transport's listeners must not keep the reconciler alive
            let weak: Weak<Inner> = Arc::downgrade(&self.inner);
            let id = self.inner.transport.on(event, move |payload: &Value| {
                let Some(inner) = weak.upgrade() else {
                    return Ok(());
                };
                let message: ServerMessage = serde_json::from_value(payload.clone())
                    .map_err(|e| ListenerError::new(format!("invalid {}: {}", event, e)))?;
                SceneReconciler { inner }.apply_remote(message);
                Ok(())
            });
            subscriptions.push((event, id));
        }
    }

    /// Remove the subscriptions made by [`SceneReconciler::attach`].
    pub fn detach(&self) {
        let mut subscriptions = lock(&self.inner.subscriptions);
        for (event, id) in subscriptions.drain(..) {
            self.inner.transport.off(event, id);
        }
    }

    /// Place `mold` at `(x, y)` and announce the new object.
    pub fn place_mold(&self, mold: &Mold, x: f64, y: f64) -> CanvasObject {
        let object = CanvasObject::from_mold(mold, x, y);
        lock(&self.inner.scene).add(object.clone());
        self.spawn_image_resolution(&object);

        match serde_json::to_value(&object) {
            Ok(payload) => {
                self.inner.transport.notify_canvas_object_added(payload);
            }
            Err(e) => tracing::error!("Failed to encode object '{}': {}", object.id, e),
        }
        object
    }

    /// Move a local object and announce it. `false` if the id is unknown.
    pub fn move_object(&self, id: &str, x: f64, y: f64) -> bool {
        let transform = {
            let mut scene = lock(&self.inner.scene);
            let Some((rotation, scale)) = scene.get(id).map(|o| (o.rotation, o.scale)) else {
                return false;
            };
            scene.move_object(id, x, y, rotation, scale);
            (rotation, scale)
        };
        self.inner
            .transport
            .notify_canvas_object_moved(id, x, y, transform.0, transform.1);
        true
    }

    /// Remove a local object and announce it. `false` if the id is unknown.
    pub fn remove_object(&self, id: &str) -> bool {
        if lock(&self.inner.scene).remove(id).is_none() {
            return false;
        }
        self.inner.transport.notify_canvas_object_removed(id);
        true
    }

    /// Clear the local scene and announce it.
    pub fn clear(&self) {
        lock(&self.inner.scene).clear();
        self.inner.transport.notify_canvas_cleared();
    }

    /// Apply a peer's event. Returns `true` if the scene changed.
    pub fn apply_remote(&self, message: ServerMessage) -> bool {
        if let (Some(local), Some(origin)) = (self.inner.local_user_id, message.origin_user_id())
            && local == origin
        {
            tracing::debug!("Ignoring echo of own '{}'", message.message_type());
            return false;
        }

        let mut resolve = None;
        let changed = {
            let mut scene = lock(&self.inner.scene);
            match message {
                ServerMessage::CanvasObjectAdded { object, .. } => {
                    match serde_json::from_value::<CanvasObject>(object) {
                        Ok(object) => {
                            let added = scene.add(object.clone());
                            if added {
                                resolve = Some(object);
                            }
                            added
                        }
                        Err(e) => {
                            tracing::warn!("Ignoring invalid canvas object: {}", e);
                            false
                        }
                    }
                }
                ServerMessage::CanvasObjectMoved {
                    object_id,
                    x,
                    y,
                    rotation,
                    scale,
                    ..
                } => scene.move_object(&object_id, x, y, rotation, scale),
                ServerMessage::CanvasObjectRemoved { object_id, .. } => {
                    scene.remove(&object_id).is_some()
                }
                ServerMessage::CanvasCleared { .. } => {
                    scene.clear();
                    true
                }
                _ => false,
            }
        };

        if let Some(object) = resolve {
            self.spawn_image_resolution(&object);
        }
        if changed {
            self.redraw();
        }
        changed
    }

    /// Snapshot of the current scene.
    pub fn objects(&self) -> Vec<CanvasObject> {
        lock(&self.inner.scene).objects().to_vec()
    }

    pub fn object(&self, id: &str) -> Option<CanvasObject> {
        lock(&self.inner.scene).get(id).cloned()
    }

    pub fn transport(&self) -> &ClientTransport {
        &self.inner.transport
    }

    fn redraw(&self) {
        let callback = lock(&self.inner.on_redraw).clone();
        if let Some(callback) = callback {
            let snapshot = self.objects();
            callback(&snapshot);
        }
    }

    fn spawn_image_resolution(&self, object: &CanvasObject) {
        let Some(path) = object.svg_path.clone() else {
            return;
        };
        let id = object.id.clone();
        let weak = Arc::downgrade(&self.inner);
        let fetcher = self.inner.fetcher.clone();

        tokio::spawn(async move {
            let image = match resolve_image(fetcher.as_ref(), &path).await {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!("Failed to load asset '{}' for '{}': {}", path, id, e);
                    return;
                }
            };
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let attached = lock(&inner.scene).attach_image(&id, image).cloned();
            let callback = lock(&inner.on_image_ready).clone();
            if let (Some(object), Some(callback)) = (attached, callback) {
                callback(&object);
            }
        });
    }
}
