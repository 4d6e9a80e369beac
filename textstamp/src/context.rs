// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt::{Debug, Formatter};
use core::sync::atomic::{AtomicU64, Ordering};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread;

use crate::cache::BitmapCache;
use crate::epoch::FontReadiness;
use crate::fingerprint::CacheKey;
use crate::layout::MeasureCache;
use crate::pipeline::{self, RasterLimits};
use crate::queue::{Admission, Listener, QueueTask, RenderQueue};
use crate::style::RenderOptions;
use crate::surface::{BitmapHandle, SurfaceProvider};

/// Options for a [`RenderContext`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContextOptions {
    /// The maximum number of bitmaps kept in the cache.
    ///
    /// The default value is 256.
    pub bitmap_capacity: usize,

    /// The maximum number of text measurements kept between renders.
    ///
    /// The default value is 4096.
    pub measure_capacity: usize,

    /// Bounds on the size of rendered bitmaps.
    pub limits: RasterLimits,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            bitmap_capacity: 256,
            measure_capacity: 4096,
            limits: RasterLimits::default(),
        }
    }
}

/// The state shared by every fragment of one canvas: the surface provider, the bitmap cache,
/// the render queue and the font epoch.
///
/// Cloning a context is cheap and yields a handle to the same state.
///
/// Renders run on a single worker thread, one at a time and in request order. The thread is
/// started on demand and exits once the queue is empty.
pub struct RenderContext<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for RenderContext<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> Debug for RenderContext<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderContext")
            .field("options", &self.inner.options)
            .field("readiness", &self.inner.readiness)
            .field("queue", &*self.inner.lock_queue())
            .field("renders", &self.inner.renders.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

struct Inner<P> {
    provider: P,
    options: ContextOptions,
    readiness: FontReadiness,
    queue: Mutex<RenderQueue>,
    measure: Mutex<MeasureCache>,
    idle: Condvar,
    renders: AtomicU64,
}

impl<P> Inner<P> {
    fn lock_queue(&self) -> MutexGuard<'_, RenderQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sync_measure_cache(&self, epoch: u64) {
        match self.measure.try_lock() {
            Ok(mut cache) => cache.sync_epoch(epoch),
            Err(TryLockError::Poisoned(cache)) => cache.into_inner().sync_epoch(epoch),
            // The worker syncs the cache before its next render.
            Err(TryLockError::WouldBlock) => {}
        }
    }

    /// Moves to a new font epoch with `bump` and clears the caches.
    ///
    /// The epoch changes while the queue is locked, so no result can be cached under the old
    /// epoch after the clear.
    fn invalidate(&self, bump: impl FnOnce(&FontReadiness) -> Option<u64>) -> Option<u64> {
        let epoch = {
            let mut queue = self.lock_queue();
            let epoch = bump(&self.readiness)?;
            queue.cache_mut().clear();
            epoch
        };
        self.sync_measure_cache(epoch);
        Some(epoch)
    }

    /// Stores the result of `task` and returns the listeners waiting for it.
    fn finish(&self, task: &QueueTask, result: Option<&BitmapHandle>) -> Vec<Listener> {
        let mut queue = self.lock_queue();
        let epoch = self.readiness.epoch();
        queue.complete(task, result, epoch)
    }
}

impl<P: SurfaceProvider> Inner<P> {
    fn render(&self, task: &QueueTask) -> Option<BitmapHandle> {
        let mut measure = self.measure.lock().unwrap_or_else(PoisonError::into_inner);
        measure.sync_epoch(self.readiness.epoch());
        self.renders.fetch_add(1, Ordering::Relaxed);
        let result = catch_unwind(AssertUnwindSafe(|| {
            pipeline::render(
                &self.provider,
                &mut measure,
                &task.options,
                &self.options.limits,
            )
        }));
        match result {
            Ok(Ok(handle)) => Some(handle),
            Ok(Err(err)) => {
                log::warn!("failed to render {}: {err}", task.key);
                None
            }
            Err(_) => {
                log::warn!("render of {} panicked", task.key);
                None
            }
        }
    }

    fn run_worker(&self) {
        log::debug!("render worker started");
        loop {
            let Some(task) = self.lock_queue().next_task() else {
                break;
            };
            let result = self.render(&task);
            for listener in self.finish(&task, result.as_ref()) {
                notify(listener, result.clone());
            }
        }
        log::debug!("render worker stopped");
        self.idle.notify_all();
    }
}

fn notify(listener: Listener, result: Option<BitmapHandle>) {
    if catch_unwind(AssertUnwindSafe(move || listener(result))).is_err() {
        log::warn!("render listener panicked");
    }
}

impl<P: SurfaceProvider + Send + Sync + 'static> RenderContext<P> {
    /// Creates a context rendering with `provider`.
    pub fn new(provider: P, options: ContextOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                options,
                readiness: FontReadiness::new(),
                queue: Mutex::new(RenderQueue::new(options.bitmap_capacity)),
                measure: Mutex::new(MeasureCache::new(options.measure_capacity)),
                idle: Condvar::new(),
                renders: AtomicU64::new(0),
            }),
        }
    }

    /// Requests a bitmap for `options`, computing its key in the current font epoch.
    ///
    /// Returns the key the bitmap is stored under. See [`request`](Self::request).
    pub fn request_options(
        &self,
        options: RenderOptions,
        on_ready: impl FnOnce(Option<BitmapHandle>) + Send + 'static,
    ) -> CacheKey {
        let key = self.key_for(&options);
        self.request(key.clone(), options, on_ready);
        key
    }

    /// Requests the bitmap for `key`, which must have been computed from `options`.
    ///
    /// If the bitmap is cached, `on_ready` is called before this returns. Otherwise it is
    /// called from the render thread once the bitmap has been rendered, with `None` if
    /// rendering failed. Concurrent requests for the same key share a single render.
    pub fn request(
        &self,
        key: CacheKey,
        options: RenderOptions,
        on_ready: impl FnOnce(Option<BitmapHandle>) + Send + 'static,
    ) {
        if let Some((handle, listener)) = self.admit(key, options, Box::new(on_ready)) {
            notify(listener, Some(handle));
        }
    }

    /// Returns the cached bitmap for `key`, or requests it if there is none.
    ///
    /// Unlike [`request`](Self::request), a cache hit is returned directly and `on_ready` is
    /// dropped without being called. The lookup counts once in the cache statistics.
    pub fn cached_or_request(
        &self,
        key: CacheKey,
        options: RenderOptions,
        on_ready: impl FnOnce(Option<BitmapHandle>) + Send + 'static,
    ) -> Option<BitmapHandle> {
        self.admit(key, options, Box::new(on_ready))
            .map(|(handle, _)| handle)
    }

    fn admit(
        &self,
        key: CacheKey,
        options: RenderOptions,
        listener: Listener,
    ) -> Option<(BitmapHandle, Listener)> {
        let epoch = self.inner.readiness.epoch();
        let admission = self.inner.lock_queue().admit(key, options, epoch, listener);
        match admission {
            Admission::Ready(handle, listener) => Some((handle, listener)),
            Admission::Joined | Admission::Enqueued {
                spawn_worker: false,
            } => None,
            Admission::Enqueued { spawn_worker: true } => {
                self.spawn_worker();
                None
            }
        }
    }

    fn spawn_worker(&self) {
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("textstamp-render".into())
            .spawn(move || inner.run_worker());
        if let Err(err) = spawned {
            log::error!("failed to spawn render worker, rendering inline: {err}");
            self.inner.run_worker();
        }
    }
}

impl<P> RenderContext<P> {
    /// The surface provider.
    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    /// The options this context was created with.
    pub fn options(&self) -> &ContextOptions {
        &self.inner.options
    }

    /// The current font epoch.
    pub fn epoch(&self) -> u64 {
        self.inner.readiness.epoch()
    }

    /// The cache key of `options` in the current font epoch.
    pub fn key_for(&self, options: &RenderOptions) -> CacheKey {
        CacheKey::new(options, self.epoch())
    }

    /// Returns the cached bitmap for `key`, if any, and marks it as recently used.
    pub fn cached(&self, key: &CacheKey) -> Option<BitmapHandle> {
        self.inner.lock_queue().cache_mut().get(key)
    }

    /// Calls `f` with the bitmap cache.
    pub fn with_cache<R>(&self, f: impl FnOnce(&BitmapCache) -> R) -> R {
        f(self.inner.lock_queue().cache())
    }

    /// Blocks until no render is queued or running and the worker has exited.
    pub fn wait_idle(&self) {
        let mut queue = self.inner.lock_queue();
        while !queue.is_idle() {
            queue = self
                .inner
                .idle
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Records that the initial font set has loaded.
    ///
    /// The first call invalidates every cached bitmap and measurement. Later calls do
    /// nothing. Returns whether the caches were invalidated.
    pub fn mark_fonts_stable(&self) -> bool {
        self.inner
            .invalidate(|readiness| readiness.mark_stable().then(|| readiness.epoch()))
            .is_some()
    }

    /// Records that a face was added to the font set, invalidating every cached bitmap and
    /// measurement. Returns the new font epoch.
    ///
    /// Bitmaps that are already displayed stay valid until they are replaced.
    pub fn font_loaded(&self) -> u64 {
        self.inner
            .invalidate(|readiness| Some(readiness.font_loaded()))
            .unwrap_or_else(|| self.epoch())
    }

    /// The number of times the render pipeline has run.
    pub fn pipeline_runs(&self) -> u64 {
        self.inner.renders.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use peniko::Blob;

    use super::*;
    use crate::surface::{EncodedBitmap, ImageFormat};
    use crate::tests::utils::context;

    fn bitmap() -> BitmapHandle {
        BitmapHandle::new(EncodedBitmap {
            format: ImageFormat::Native,
            width: 1,
            height: 1,
            scale: 1.0,
            data: Blob::new(Arc::new(vec![0_u8; 4])),
        })
    }

    #[test]
    fn results_finished_after_font_load_are_not_cached() {
        let cx = context(8);
        let options = RenderOptions::new("a", 40.0, 20.0);
        let task = QueueTask {
            key: cx.key_for(&options),
            options,
            epoch: cx.epoch(),
        };
        assert_eq!(cx.font_loaded(), 1);

        let listeners = cx.inner.finish(&task, Some(&bitmap()));
        assert!(listeners.is_empty(), "nobody was waiting");
        assert!(cx.with_cache(|cache| cache.is_empty()), "epoch moved on");
    }

    #[test]
    fn invalidation_clears_under_the_new_epoch() {
        let cx = context(8);
        let options = RenderOptions::new("a", 40.0, 20.0);
        let key = cx.key_for(&options);
        cx.inner.lock_queue().cache_mut().insert(key.clone(), bitmap());

        let epoch = cx.inner.invalidate(|readiness| {
            assert!(
                cx.inner.queue.try_lock().is_err(),
                "the queue is locked while the epoch moves"
            );
            Some(readiness.font_loaded())
        });
        assert_eq!(epoch, Some(1));
        assert!(cx.cached(&key).is_none());
        assert!(cx.inner.invalidate(|_| None).is_none(), "no bump, no epoch");
    }
}
