//! Viewport tracking for scroll containers.
//!
//! The tracker owns the latest `(scroll_offset, viewport_height)` sample of one
//! container. Hosts implement [`ScrollContainer`] for their scroll primitive; the
//! GTK front end implements it for `gtk4::Adjustment`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

/// Latest sampled viewport of a scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportState {
    /// Distance scrolled from the top, never negative
    pub scroll_offset: f64,
    /// Visible height of the container, 0 until measured
    pub viewport_height: f64,
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// A host scroll container that reports its offset and visible height.
///
/// Handlers run synchronously on the host's event loop; the container
/// delivers whatever rate of events it likes, including coalesced ones.
pub trait ScrollContainer {
    /// Token returned by the connect calls, consumed by `disconnect`.
    type Listener;

    fn scroll_offset(&self) -> f64;
    fn viewport_height(&self) -> f64;
    fn connect_scroll(&self, handler: Box<dyn Fn(f64)>) -> Self::Listener;
    fn connect_resize(&self, handler: Box<dyn Fn(f64)>) -> Self::Listener;
    fn disconnect(&self, listener: Self::Listener);
}

/// Callback invoked with the new state after every scroll or resize.
pub type ViewportChangedCallback = Rc<dyn Fn(ViewportState)>;

/// Tracks scroll offset and visible height of one container.
#[derive(Clone, Default)]
pub struct ViewportTracker {
    state: Rc<Cell<ViewportState>>,
}

impl std::fmt::Debug for ViewportTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportTracker")
            .field("state", &self.state.get())
            .finish()
    }
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ViewportState {
        self.state.get()
    }

    /// Records a new scroll offset and returns the updated state.
    pub fn on_scroll(&self, offset: f64) -> ViewportState {
        let mut state = self.state.get();
        state.scroll_offset = sanitize(offset);
        self.state.set(state);
        state
    }

    /// Records a new visible height and returns the updated state.
    pub fn on_resize(&self, height: f64) -> ViewportState {
        let mut state = self.state.get();
        state.viewport_height = sanitize(height);
        self.state.set(state);
        state
    }

    /// Subscribes to `container` and samples it immediately.
    ///
    /// `on_change` runs once right away with the sampled state so the first
    /// render is correct before any scroll event arrives, then after every
    /// scroll or resize. The returned subscription disconnects on drop.
    pub fn attach<C, F>(&self, container: &C, on_change: F) -> ViewportSubscription<C>
    where
        C: ScrollContainer + Clone,
        F: Fn(ViewportState) + 'static,
    {
        let on_change: ViewportChangedCallback = Rc::new(on_change);

        let tracker = self.clone();
        let notify = on_change.clone();
        let scroll = container.connect_scroll(Box::new(move |offset| {
            let state = tracker.on_scroll(offset);
            trace!(offset = state.scroll_offset, "viewport scrolled");
            notify(state);
        }));

        let tracker = self.clone();
        let notify = on_change.clone();
        let resize = container.connect_resize(Box::new(move |height| {
            let state = tracker.on_resize(height);
            trace!(height = state.viewport_height, "viewport resized");
            notify(state);
        }));

        self.on_scroll(container.scroll_offset());
        let state = self.on_resize(container.viewport_height());
        on_change(state);

        ViewportSubscription {
            inner: RefCell::new(Some((container.clone(), vec![scroll, resize]))),
        }
    }
}

/// Live subscription of a tracker to a container.
pub struct ViewportSubscription<C: ScrollContainer> {
    inner: RefCell<Option<(C, Vec<C::Listener>)>>,
}

impl<C: ScrollContainer> ViewportSubscription<C> {
    /// Disconnects every handler. Calling it again is a no-op.
    pub fn detach(&self) {
        let Some((container, listeners)) = self.inner.borrow_mut().take() else {
            return;
        };
        for listener in listeners {
            container.disconnect(listener);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.inner.borrow().is_some()
    }
}

impl<C: ScrollContainer> Drop for ViewportSubscription<C> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeInner {
        offset: Cell<f64>,
        height: Cell<f64>,
        next_id: Cell<u32>,
        scroll: RefCell<HashMap<u32, Box<dyn Fn(f64)>>>,
        resize: RefCell<HashMap<u32, Box<dyn Fn(f64)>>>,
    }

    #[derive(Clone, Default)]
    struct FakeContainer(Rc<FakeInner>);

    impl FakeContainer {
        fn scroll_to(&self, offset: f64) {
            self.0.offset.set(offset);
            for handler in self.0.scroll.borrow().values() {
                handler(offset);
            }
        }

        fn resize_to(&self, height: f64) {
            self.0.height.set(height);
            for handler in self.0.resize.borrow().values() {
                handler(height);
            }
        }

        fn listener_count(&self) -> usize {
            self.0.scroll.borrow().len() + self.0.resize.borrow().len()
        }

        fn next_id(&self) -> u32 {
            let id = self.0.next_id.get();
            self.0.next_id.set(id + 1);
            id
        }
    }

    impl ScrollContainer for FakeContainer {
        type Listener = u32;

        fn scroll_offset(&self) -> f64 {
            self.0.offset.get()
        }

        fn viewport_height(&self) -> f64 {
            self.0.height.get()
        }

        fn connect_scroll(&self, handler: Box<dyn Fn(f64)>) -> u32 {
            let id = self.next_id();
            self.0.scroll.borrow_mut().insert(id, handler);
            id
        }

        fn connect_resize(&self, handler: Box<dyn Fn(f64)>) -> u32 {
            let id = self.next_id();
            self.0.resize.borrow_mut().insert(id, handler);
            id
        }

        fn disconnect(&self, listener: u32) {
            self.0.scroll.borrow_mut().remove(&listener);
            self.0.resize.borrow_mut().remove(&listener);
        }
    }

    #[test]
    fn test_attach_samples_immediately() {
        let container = FakeContainer::default();
        container.0.offset.set(300.0);
        container.0.height.set(624.0);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let tracker = ViewportTracker::new();
        let _sub = tracker.attach(&container, move |s| seen_clone.borrow_mut().push(s));

        let expected = ViewportState {
            scroll_offset: 300.0,
            viewport_height: 624.0,
        };
        assert_eq!(tracker.state(), expected);
        assert_eq!(*seen.borrow(), vec![expected]);
    }

    #[test]
    fn test_scroll_and_resize_update_state() {
        let container = FakeContainer::default();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let tracker = ViewportTracker::new();
        let _sub = tracker.attach(&container, move |_| count_clone.set(count_clone.get() + 1));

        container.scroll_to(1560.0);
        container.resize_to(400.0);

        assert_eq!(tracker.state().scroll_offset, 1560.0);
        assert_eq!(tracker.state().viewport_height, 400.0);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_negative_and_nan_samples_clamp_to_zero() {
        let tracker = ViewportTracker::new();
        assert_eq!(tracker.on_scroll(-20.0).scroll_offset, 0.0);
        assert_eq!(tracker.on_resize(f64::NAN).viewport_height, 0.0);
    }

    #[test]
    fn test_detach_is_idempotent_and_stops_updates() {
        let container = FakeContainer::default();
        let tracker = ViewportTracker::new();
        let sub = tracker.attach(&container, |_| {});
        assert_eq!(container.listener_count(), 2);

        sub.detach();
        sub.detach();
        assert!(!sub.is_attached());
        assert_eq!(container.listener_count(), 0);

        container.scroll_to(900.0);
        assert_eq!(tracker.state().scroll_offset, 0.0);
    }

    #[test]
    fn test_drop_detaches() {
        let container = FakeContainer::default();
        {
            let tracker = ViewportTracker::new();
            let _sub = tracker.attach(&container, |_| {});
            assert_eq!(container.listener_count(), 2);
        }
        assert_eq!(container.listener_count(), 0);
    }

    #[test]
    fn test_repeated_attach_cycles_do_not_leak() {
        let container = FakeContainer::default();
        for _ in 0..5 {
            let tracker = ViewportTracker::new();
            let sub = tracker.attach(&container, |_| {});
            sub.detach();
        }
        assert_eq!(container.listener_count(), 0);
    }
}
