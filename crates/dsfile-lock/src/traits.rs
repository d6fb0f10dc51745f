use crate::error::LockResult;
use crate::identity::LockIdentity;

/// A cross-process exclusivity token.
///
/// Implementations must satisfy these invariants:
/// - `acquire` returns immediately: `Ok` when the lock is now held by this
///   locker, `Err` when someone else holds it. Acquiring a lock this locker
///   already holds is a no-op.
/// - `release` is safe to call any number of times, held or not.
/// - The token is released when the locker is dropped.
pub trait Locker: Send + 'static {
    /// Try to take exclusive ownership of the identity.
    fn acquire(&mut self) -> LockResult<()>;

    /// Give up ownership, if held.
    fn release(&mut self);

    /// Whether this locker currently holds its identity.
    fn is_held(&self) -> bool;

    /// The identity this locker guards.
    fn identity(&self) -> LockIdentity;
}

impl Locker for Box<dyn Locker> {
    fn acquire(&mut self) -> LockResult<()> {
        (**self).acquire()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn is_held(&self) -> bool {
        (**self).is_held()
    }

    fn identity(&self) -> LockIdentity {
        (**self).identity()
    }
}
