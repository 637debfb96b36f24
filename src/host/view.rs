//! Container view that hosts at most one surface.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::event::{Rect, Size};
use crate::surface::SharedSurface;

/// Unique identifier for a host container
pub type HostId = u64;

static NEXT_HOST_ID: AtomicU64 = AtomicU64::new(1);

/// A container's child slot
type HostSlot = RefCell<Option<SharedSurface>>;

/// Non-owning back-reference from a surface to its container's slot
pub(crate) struct HostLink {
    pub(crate) id: HostId,
    slot: Weak<HostSlot>,
}

/// A host container that fills its bounds with a single surface.
///
/// Hosting a surface detaches whatever was hosted before, and removes the
/// new surface from any other container that held it.
pub struct SurfaceHost {
    id: HostId,
    bounds: Size,
    slot: Rc<HostSlot>,
}

impl SurfaceHost {
    pub fn new(bounds: Size) -> Self {
        Self {
            id: NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed),
            bounds,
            slot: Rc::new(RefCell::new(None)),
        }
    }

    pub fn id(&self) -> HostId {
        self.id
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// Install `surface` as the only child, filling the bounds
    pub fn host_surface(&mut self, surface: &SharedSurface) {
        if let Some(current) = self.slot.borrow().as_ref() {
            if Rc::ptr_eq(current, surface) {
                return;
            }
        }
        self.dismantle();

        let previous = {
            let mut s = surface.borrow_mut();
            let previous = s.take_superview();
            s.set_superview(Some(HostLink {
                id: self.id,
                slot: Rc::downgrade(&self.slot),
            }));
            s.set_frame(Rect::from_size(self.bounds));
            previous
        };
        // Take it out of the old container before it lands here
        if let Some(link) = previous {
            debug!("Surface moved from host {} to {}", link.id, self.id);
            if let Some(old_slot) = link.slot.upgrade() {
                let released = old_slot.borrow_mut().take();
                drop(released);
            }
        }
        *self.slot.borrow_mut() = Some(surface.clone());
    }

    /// Hosted children; zero or one
    pub fn subviews(&self) -> Vec<SharedSurface> {
        self.slot.borrow().iter().cloned().collect()
    }

    pub fn hosted(&self) -> Option<SharedSurface> {
        self.slot.borrow().clone()
    }

    /// Re-fit the hosted surface to the bounds
    pub fn layout(&self) {
        if let Some(surface) = self.hosted() {
            surface.borrow_mut().set_frame(Rect::from_size(self.bounds));
        }
    }

    /// Resize the container.
    ///
    /// The surface gets an explicit size update before layout so the engine
    /// sees the new size even if no layout pass follows.
    pub fn set_bounds(&mut self, bounds: Size) {
        if bounds != self.bounds {
            self.bounds = bounds;
            if let Some(surface) = self.hosted() {
                surface.borrow_mut().update_size(bounds);
            }
        }
        self.layout();
    }

    /// Detach the hosted surface, if any. The surface itself is not destroyed
    /// while other holders keep it.
    pub fn dismantle(&mut self) {
        let hosted = self.slot.borrow_mut().take();
        if let Some(surface) = hosted {
            surface.borrow_mut().set_superview(None);
        }
    }
}

impl Drop for SurfaceHost {
    fn drop(&mut self) {
        self.dismantle();
    }
}
