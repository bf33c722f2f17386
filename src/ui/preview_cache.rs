// Tile preview loading for the confirmation grid
// Decodes on the worker pool, uploads on the main thread, caches textures

use gdk4::Texture;
use gtk4::prelude::*;
use gtk4::{gdk, glib, Picture};
use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::OnceLock;
use std::time::Duration;

use imgtriage::thumbnails::{PreviewPool, DEFAULT_WORKERS};

const TEXTURE_CACHE_ENTRIES: NonZeroUsize = match NonZeroUsize::new(512) {
    Some(n) => n,
    None => unreachable!(),
};
const POLL_INTERVAL: Duration = Duration::from_millis(16);

const PLACEHOLDER_EDGE: u32 = 64;
const PLACEHOLDER_RGBA: [u8; 4] = [0x1f, 0x29, 0x37, 0xff];

fn upload_rgba(rgba: Vec<u8>, width: u32, height: u32, stride: usize) -> Option<Texture> {
    if width == 0
        || height == 0
        || stride < width as usize * 4
        || rgba.len() < stride * height as usize
    {
        return None;
    }
    let memory = gdk::MemoryTexture::new(
        width as i32,
        height as i32,
        gdk::MemoryFormat::R8g8b8a8,
        &glib::Bytes::from_owned(rgba),
        stride,
    );
    Some(memory.upcast())
}

/// Flat tile-coloured texture shown until a preview arrives.
fn placeholder_texture() -> Option<&'static Texture> {
    static PLACEHOLDER: OnceLock<Option<Texture>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| {
            let rgba = PLACEHOLDER_RGBA.repeat((PLACEHOLDER_EDGE * PLACEHOLDER_EDGE) as usize);
            let stride = PLACEHOLDER_EDGE as usize * PLACEHOLDER_RGBA.len();
            upload_rgba(rgba, PLACEHOLDER_EDGE, PLACEHOLDER_EDGE, stride)
        })
        .as_ref()
}

struct LoaderState {
    pool: PreviewPool,
    waiters: HashMap<PathBuf, Vec<glib::WeakRef<Picture>>>,
    cache: lru::LruCache<PathBuf, Texture>,
}

/// Feeds decoded previews into `Picture`s on the main thread.
pub struct PreviewLoader {
    state: RefCell<LoaderState>,
}

impl PreviewLoader {
    /// Creates a loader and starts polling its pool from the main loop.
    /// Polling stops once the last strong reference is dropped.
    pub fn new(max_edge: u32) -> Rc<Self> {
        let loader = Rc::new(Self {
            state: RefCell::new(LoaderState {
                pool: PreviewPool::new(DEFAULT_WORKERS, max_edge),
                waiters: HashMap::new(),
                cache: lru::LruCache::new(TEXTURE_CACHE_ENTRIES),
            }),
        });

        let loader_weak = Rc::downgrade(&loader);
        glib::timeout_add_local(POLL_INTERVAL, move || {
            if let Some(loader) = loader_weak.upgrade() {
                loader.process_results();
                glib::ControlFlow::Continue
            } else {
                glib::ControlFlow::Break
            }
        });

        loader
    }

    /// Shows the preview of `path` in `picture`, now if cached, else when decoded.
    pub fn load_into(&self, picture: &Picture, path: &Path) {
        let mut state = self.state.borrow_mut();

        if let Some(texture) = state.cache.get(path) {
            picture.set_paintable(Some(texture));
            return;
        }

        picture.set_paintable(placeholder_texture());
        state.pool.request(path);
        state
            .waiters
            .entry(path.to_path_buf())
            .or_default()
            .push(picture.downgrade());
    }

    /// Stops waiting for `path`; a queued decode for it is skipped.
    pub fn cancel(&self, path: &Path) {
        let mut state = self.state.borrow_mut();
        if state.waiters.remove(path).is_some() {
            state.pool.cancel(path);
        }
    }

    fn process_results(&self) {
        let results = {
            let mut state = self.state.borrow_mut();
            let results = state.pool.drain();
            if !results.is_empty() {
                tracing::trace!(
                    decoded = results.len(),
                    pending = state.pool.pending_count(),
                    "Previews ready"
                );
            }
            results
        };
        for result in results {
            let texture = result.preview.and_then(|p| {
                let stride = p.stride();
                upload_rgba(p.rgba, p.width, p.height, stride)
            });

            let waiters = {
                let mut state = self.state.borrow_mut();
                if let Some(ref texture) = texture {
                    state.cache.put(result.path.clone(), texture.clone());
                }
                state.waiters.remove(&result.path).unwrap_or_default()
            };

            let Some(texture) = texture else {
                continue;
            };
            for waiter in waiters {
                if let Some(picture) = waiter.upgrade() {
                    picture.set_paintable(Some(&texture));
                }
            }
        }
    }
}
