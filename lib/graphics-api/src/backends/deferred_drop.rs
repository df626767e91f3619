//! Frame-indexed deferred destruction of GPU objects.
//!
//! A native object may still be referenced by command buffers the GPU has
//! not finished executing, so dropping the last CPU handle must not destroy
//! it immediately. [`Drc`] is a reference-counted handle whose payload, on
//! last drop, is sent to the [`DeferredDropper`] instead of being destroyed.
//! Once per frame the owner calls [`DeferredDropper::flush`]: freshly
//! retired objects land in the current frame's bucket and the bucket that
//! is `frame_capacity` frames old is drained, at which point the GPU is
//! known to be done with its contents.

#![allow(unsafe_code)]

use std::any::Any;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use crossbeam_channel::{unbounded, Receiver, Sender};

type GarbageObject = Box<dyn Any + Send>;

struct DeferredDropperInner {
    frame_capacity: usize,
    frame_index: usize,
    buckets: Vec<Vec<GarbageObject>>,
}

/// The collector. Cheap to clone; every [`Drc`] holds a channel into it.
#[derive(Clone)]
pub struct DeferredDropper {
    inner: Arc<Mutex<DeferredDropperInner>>,
    sender: Sender<GarbageObject>,
    receiver: Receiver<GarbageObject>,
}

impl DeferredDropper {
    /// `frame_capacity` is the maximum number of frames the GPU may be
    /// behind the CPU (the swapchain's frames-in-flight count).
    pub fn new(frame_capacity: usize) -> Self {
        assert!(frame_capacity > 0);
        let (sender, receiver) = unbounded();
        Self {
            inner: Arc::new(Mutex::new(DeferredDropperInner {
                frame_capacity,
                frame_index: 0,
                buckets: (0..frame_capacity).map(|_| Vec::new()).collect(),
            })),
            sender,
            receiver,
        }
    }

    /// Wraps a value into a deferred-dropping refcounted handle.
    pub fn new_drc<T: Send + 'static>(&self, data: T) -> Drc<T> {
        Drc {
            inner: Arc::new(DrcInner {
                data: ManuallyDrop::new(data),
                sender: self.sender.clone(),
            }),
        }
    }

    /// Advances the frame: collects everything retired since the last call
    /// into the current bucket and destroys the bucket that has aged past
    /// the in-flight window.
    pub fn flush(&self) {
        let mut inner = self.inner.lock().unwrap();

        let current = inner.frame_index;
        while let Ok(object) = self.receiver.try_recv() {
            inner.buckets[current].push(object);
        }

        let next = (inner.frame_index + 1) % inner.frame_capacity;
        inner.buckets[next].clear();
        inner.frame_index = next;
    }

    /// Destroys everything immediately. Legal only once the device is idle.
    pub fn destroy(&self) {
        let mut inner = self.inner.lock().unwrap();
        for bucket in &mut inner.buckets {
            bucket.clear();
        }
        while let Ok(object) = self.receiver.try_recv() {
            drop(object);
        }
    }
}

impl Drop for DeferredDropperInner {
    fn drop(&mut self) {
        for bucket in &self.buckets {
            assert!(bucket.is_empty(), "deferred dropper torn down with live garbage");
        }
    }
}

struct DrcInner<T: Send + 'static> {
    data: ManuallyDrop<T>,
    sender: Sender<GarbageObject>,
}

impl<T: Send + 'static> Drop for DrcInner<T> {
    fn drop(&mut self) {
        // Safety: data is never touched again after take; the payload moves
        // into the garbage channel in one piece.
        let data = unsafe { ManuallyDrop::take(&mut self.data) };
        // A send can only fail when the dropper itself is gone, which means
        // the device is being torn down and immediate destruction is fine.
        let _ = self.sender.send(Box::new(data));
    }
}

/// A deferred-dropping `Arc`: clone to share, the payload outlives the last
/// clone by `frame_capacity` frames.
pub struct Drc<T: Send + 'static> {
    inner: Arc<DrcInner<T>>,
}

impl<T: Send + 'static> Clone for Drc<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Deref for Drc<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.inner.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn destruction_is_deferred_by_the_frame_window() {
        let dropper = DeferredDropper::new(3);
        let drops = Arc::new(AtomicUsize::new(0));

        let handle = dropper.new_drc(DropCounter(drops.clone()));
        let second = handle.clone();
        drop(handle);
        drop(second);
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        // The object enters the current bucket on the first flush and is
        // only destroyed once that bucket comes around again.
        dropper.flush();
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        dropper.flush();
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        dropper.flush();
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clones_share_one_payload() {
        let dropper = DeferredDropper::new(2);
        let drops = Arc::new(AtomicUsize::new(0));

        let handle = dropper.new_drc(DropCounter(drops.clone()));
        let clones: Vec<_> = (0..8).map(|_| handle.clone()).collect();
        drop(handle);
        drop(clones);

        for _ in 0..2 {
            dropper.flush();
        }
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn destroy_drains_everything() {
        let dropper = DeferredDropper::new(4);
        let drops = Arc::new(AtomicUsize::new(0));
        drop(dropper.new_drc(DropCounter(drops.clone())));
        dropper.flush();
        drop(dropper.new_drc(DropCounter(drops.clone())));

        dropper.destroy();
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }
}
