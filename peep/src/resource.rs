use std_alloc::boxed::Box;
use std_alloc::string::String;

use crate::link::Addrd;
use crate::platform::{Message, PlatformTypes};

/// A request handler; invoked synchronously during dispatch with the
/// correspondent's address and the request.
///
/// Handlers do not return the response — they (or the application code
/// they notify) later call [`Core::reply`](crate::core::Core::reply)
/// with the request, which is what makes deferred ("separate") responses
/// possible on a single thread.
pub type Handler<P> = Box<dyn FnMut(&Addrd<Message<P>>)>;

/// Claim ticket for a registered resource, used to unregister it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ResourceHandle(pub(crate) usize);

struct Entry<P: PlatformTypes> {
  path: String,
  handler: Handler<P>,
}

/// A fixed-capacity table mapping URI paths to request handlers.
///
/// A registered path matches a request path that is character-for-
/// character equal, or that continues it directly below a `/`
/// (subtree match): `"storage"` serves `"storage"` and
/// `"storage/mote1"` but not `"storages"`.
pub struct Registry<P: PlatformTypes, const N: usize> {
  slots: [Option<Entry<P>>; N],
}

impl<P: PlatformTypes, const N: usize> core::fmt::Debug for Registry<P, N> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_list()
     .entries(self.slots
                  .iter()
                  .flatten()
                  .map(|e| e.path.as_str()))
     .finish()
  }
}

impl<P: PlatformTypes, const N: usize> Default for Registry<P, N> {
  fn default() -> Self {
    Self::new()
  }
}

impl<P: PlatformTypes, const N: usize> Registry<P, N> {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self { slots: core::array::from_fn(|_| None) }
  }

  /// Register `handler` to serve `path` (and the subtree below it).
  ///
  /// Yields `None` when every slot is taken.
  pub fn register(&mut self, path: &str, handler: Handler<P>) -> Option<ResourceHandle> {
    let ix = self.slots.iter().position(|slot| slot.is_none())?;
    self.slots[ix] = Some(Entry { path: path.into(),
                                  handler });
    Some(ResourceHandle(ix))
  }

  /// Free a slot. Yields whether the handle referred to a live
  /// registration.
  pub fn unregister(&mut self, handle: ResourceHandle) -> bool {
    match self.slots.get_mut(handle.0) {
      | Some(slot) => slot.take().is_some(),
      | None => false,
    }
  }

  /// Invoke every handler whose path matches the request's Uri-Path.
  /// Yields the number of handlers that fired.
  pub fn dispatch(&mut self, req: &Addrd<Message<P>>) -> usize {
    let path = req.data().opts.uri_path();

    self.slots
        .iter_mut()
        .flatten()
        .filter(|e| Self::matches(&e.path, &path))
        .map(|e| (e.handler)(req))
        .count()
  }

  fn matches(registered: &str, requested: &str) -> bool {
    match requested.strip_prefix(registered) {
      | Some("") => true,
      | Some(rest) => rest.starts_with('/'),
      | None => false,
    }
  }
}
