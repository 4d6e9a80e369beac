// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt::{Debug, Formatter};
use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::cache::BitmapCache;
use crate::fingerprint::CacheKey;
use crate::style::RenderOptions;
use crate::surface::BitmapHandle;

/// Callback receiving the result of a render request.
///
/// `None` means the fragment could not be rendered and should be shown as plain text.
pub type Listener = Box<dyn FnOnce(Option<BitmapHandle>) + Send + 'static>;

/// A pending render.
#[derive(Clone, Debug)]
pub struct QueueTask {
    /// The fingerprint the result is stored under.
    pub key: CacheKey,
    /// What to render.
    pub options: RenderOptions,
    /// The font epoch the key was computed in.
    pub epoch: u64,
}

/// The outcome of [`RenderQueue::admit`].
pub(crate) enum Admission {
    /// The bitmap is cached. The listener should be called right away.
    Ready(BitmapHandle, Listener),
    /// A task for the same key is already queued or running.
    Joined,
    /// A new task was queued.
    Enqueued {
        /// Whether the caller must start a worker.
        spawn_worker: bool,
    },
}

/// The bitmap cache together with the render work waiting to fill it.
///
/// This holds the bookkeeping only. It does not render or call listeners itself, so that a
/// [`RenderContext`](crate::RenderContext) can do both outside of its lock. There is at most
/// one task per key; later requests for the same key wait on the first one.
pub struct RenderQueue {
    cache: BitmapCache,
    tasks: VecDeque<QueueTask>,
    waiters: HashMap<CacheKey, Vec<Listener>>,
    running: bool,
}

impl Debug for RenderQueue {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderQueue")
            .field("cache", &self.cache)
            .field("tasks", &self.tasks.len())
            .field("in_flight", &self.waiters.len())
            .field("running", &self.running)
            .finish()
    }
}

impl RenderQueue {
    /// Creates an idle queue in front of a cache of `capacity` bitmaps.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: BitmapCache::new(capacity),
            tasks: VecDeque::new(),
            waiters: HashMap::new(),
            running: false,
        }
    }

    /// The bitmap cache.
    pub fn cache(&self) -> &BitmapCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut BitmapCache {
        &mut self.cache
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Whether a task for `key` is queued or running.
    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.waiters.contains_key(key)
    }

    /// Whether a worker is processing tasks.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether no task is queued or running and no worker is active.
    pub fn is_idle(&self) -> bool {
        !self.running && self.tasks.is_empty() && self.waiters.is_empty()
    }

    pub(crate) fn admit(
        &mut self,
        key: CacheKey,
        options: RenderOptions,
        epoch: u64,
        listener: Listener,
    ) -> Admission {
        if let Some(handle) = self.cache.get(&key) {
            return Admission::Ready(handle, listener);
        }
        if let Some(waiters) = self.waiters.get_mut(&key) {
            waiters.push(listener);
            log::trace!("joined in-flight render of {key}");
            return Admission::Joined;
        }
        self.waiters.insert(key.clone(), vec![listener]);
        self.tasks.push_back(QueueTask {
            key,
            options,
            epoch,
        });
        let spawn_worker = !self.running;
        self.running = true;
        Admission::Enqueued { spawn_worker }
    }

    /// Takes the oldest task. When there is none, the worker is marked as stopped.
    pub(crate) fn next_task(&mut self) -> Option<QueueTask> {
        let task = self.tasks.pop_front();
        if task.is_none() {
            self.running = false;
        }
        task
    }

    /// Finishes `task` and returns the listeners to notify.
    ///
    /// A successful result is cached only if the font epoch has not moved on since the task
    /// was queued. Waiters receive it either way.
    pub(crate) fn complete(
        &mut self,
        task: &QueueTask,
        result: Option<&BitmapHandle>,
        current_epoch: u64,
    ) -> Vec<Listener> {
        if let Some(handle) = result {
            if task.epoch == current_epoch {
                self.cache.insert(task.key.clone(), handle.clone());
            } else {
                log::debug!(
                    "not caching {} from epoch {}, now {current_epoch}",
                    task.key,
                    task.epoch
                );
            }
        }
        self.waiters.remove(&task.key).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use peniko::Blob;

    use super::*;
    use crate::surface::{EncodedBitmap, ImageFormat};

    fn request(text: &str) -> (CacheKey, RenderOptions) {
        let options = RenderOptions::new(text, 10.0, 10.0);
        (CacheKey::new(&options, 0), options)
    }

    fn counting_listener(count: &Arc<AtomicUsize>) -> Listener {
        let count = Arc::clone(count);
        Box::new(move |result| {
            if result.is_some() {
                count.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

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
    fn identical_requests_share_one_task() {
        let mut queue = RenderQueue::new(8);
        let count = Arc::new(AtomicUsize::new(0));
        let (key, options) = request("a");
        for i in 0..3 {
            let admission =
                queue.admit(key.clone(), options.clone(), 0, counting_listener(&count));
            match (i, admission) {
                (0, Admission::Enqueued { spawn_worker }) => assert!(spawn_worker, "first"),
                (_, Admission::Joined) => {}
                _ => panic!("unexpected admission for request {i}"),
            }
        }
        assert_eq!(queue.pending(), 1);

        let task = queue.next_task().expect("one task");
        let handle = bitmap();
        let listeners = queue.complete(&task, Some(&handle), 0);
        assert_eq!(listeners.len(), 3);
        for listener in listeners {
            listener(Some(handle.clone()));
        }
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(queue.cache().contains(&key), "result was cached");
        assert!(queue.next_task().is_none());
        assert!(queue.is_idle());
    }

    #[test]
    fn second_key_does_not_spawn_while_running() {
        let mut queue = RenderQueue::new(8);
        let count = Arc::new(AtomicUsize::new(0));
        let (a, options_a) = request("a");
        let (b, options_b) = request("b");
        assert!(matches!(
            queue.admit(a, options_a, 0, counting_listener(&count)),
            Admission::Enqueued { spawn_worker: true }
        ));
        assert!(matches!(
            queue.admit(b, options_b, 0, counting_listener(&count)),
            Admission::Enqueued {
                spawn_worker: false
            }
        ));
        let first = queue.next_task().expect("a");
        assert_eq!(first.options.text.as_ref(), "a", "tasks run in order");
    }

    #[test]
    fn stale_results_are_delivered_but_not_cached() {
        let mut queue = RenderQueue::new(8);
        let count = Arc::new(AtomicUsize::new(0));
        let (key, options) = request("a");
        let _ = queue.admit(key.clone(), options, 0, counting_listener(&count));
        let task = queue.next_task().expect("a");
        let listeners = queue.complete(&task, Some(&bitmap()), 1);
        assert_eq!(listeners.len(), 1);
        assert!(!queue.cache().contains(&key), "stale epoch");
    }

    #[test]
    fn cached_keys_are_ready() {
        let mut queue = RenderQueue::new(8);
        let (key, options) = request("a");
        queue.cache_mut().insert(key.clone(), bitmap());
        let count = Arc::new(AtomicUsize::new(0));
        assert!(matches!(
            queue.admit(key, options, 0, counting_listener(&count)),
            Admission::Ready(..)
        ));
        assert_eq!(queue.pending(), 0);
    }
}
