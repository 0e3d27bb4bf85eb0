use gc::{Gc, GcCell, Trace};

/// Mutable cell on the garbage-collected heap. The runtime graph is
/// cyclic (closure -> environment -> closure, instance -> class ->
/// method closure), so these handles are traced rather than
/// reference-counted.
pub type Shared<T> = Gc<GcCell<T>>;

pub fn create_shared<T: Trace>(val: T) -> Shared<T> {
    Gc::new(GcCell::new(val))
}
