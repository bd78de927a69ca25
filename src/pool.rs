use crate::{permits::Permits, Error, PoolConfig, Rejected, Reset, Result};
use crossbeam_queue::ArrayQueue;
use std::{
    fmt,
    mem::{forget, MaybeUninit},
    ops::{Deref, DerefMut},
    ptr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a pool.
///
/// Every object checked out of a pool remembers this identity, which is how
/// [`BoundedPool::release`] tells its own objects from foreign ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(u64);

impl PoolId {
    fn next() -> Self {
        PoolId(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// An object checked out of a [`BoundedPool`].
///
/// It must go back through [`BoundedPool::release`]. Dropping it instead
/// destroys the object and the pool stays one object short for the rest of
/// its life.
#[must_use = "a checked out object that is never released shrinks the pool for good"]
#[derive(Debug)]
pub struct Pooled<T> {
    obj: T,
    owner: PoolId,
}

impl<T> Pooled<T> {
    fn new(obj: T, owner: PoolId) -> Self {
        Pooled { obj, owner }
    }

    /// Identity of the pool this object was checked out of.
    pub fn owner(&self) -> PoolId {
        self.owner
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.obj
    }
}

impl<T> DerefMut for Pooled<T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.obj
    }
}

impl<T> AsRef<T> for Pooled<T> {
    #[inline(always)]
    fn as_ref(&self) -> &T {
        &self.obj
    }
}

/// A bounded, blocking object pool.
///
/// The pool takes ownership of a fixed set of objects at construction and
/// never creates or destroys objects afterwards. Callers check objects out,
/// waiting when none are left, and every returned object is reset before
/// anyone else can take it.
///
/// Objects are handed out in FIFO order: the object returned longest ago is
/// checked out first. Waiters get no fairness guarantee beyond each release
/// waking exactly one of them.
#[derive(Debug)]
pub struct BoundedPool<T> {
    id: PoolId,
    capacity: usize,
    storage: ArrayQueue<T>,
    permits: Permits,
    config: PoolConfig,
}

impl<T> BoundedPool<T> {
    /// Wraps the pool with an atomic reference counter, enabling the use of
    /// [`Self::get_rc`] to obtain guards that own a handle to the pool
    /// instead of borrowing it.
    pub fn to_rc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Identity stamped on every object checked out of this pool.
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Label used in log events and errors.
    pub fn label(&self) -> &str {
        &self.config.label
    }

    /// Configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of objects the pool manages, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of objects currently sitting in the pool.
    pub fn available(&self) -> usize {
        self.storage.len()
    }

    /// Number of objects currently held by callers.
    pub fn checked_out(&self) -> usize {
        self.capacity - self.available()
    }

    /// Checks if every object is checked out.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Removes an object from storage once a permit has been granted.
    fn take(&self) -> T {
        match self.storage.pop() {
            Some(obj) => {
                tracing::trace!(
                    pool = %self.config.label,
                    available = self.storage.len(),
                    "object checked out"
                );
                obj
            }
            None => unreachable!("checkout permit granted while storage is empty"),
        }
    }

    /// Waits for a checkout permit with no bound.
    fn wait_forever(&self) {
        if !self.permits.try_take() {
            tracing::trace!(pool = %self.config.label, "pool exhausted, waiting");
            self.permits.take();
        }
    }

    /// Waits for a checkout permit, up to `deadline` when one is given.
    fn wait(&self, deadline: Option<Instant>) -> Result<()> {
        let Some(deadline) = deadline else {
            self.wait_forever();
            return Ok(());
        };
        if self.permits.try_take() {
            return Ok(());
        }
        tracing::trace!(pool = %self.config.label, ?deadline, "pool exhausted, waiting");
        let started = Instant::now();
        if self.permits.take_until(deadline) {
            return Ok(());
        }
        let waited = started.elapsed();
        tracing::debug!(pool = %self.config.label, ?waited, "timed out waiting for an object");
        Err(Error::Timeout {
            pool: self.config.label.to_string(),
            waited,
        })
    }

    fn deadline_after(timeout: Duration) -> Option<Instant> {
        // Too far in the future to represent is the same as no deadline.
        Instant::now().checked_add(timeout)
    }
}

impl<T: Reset> BoundedPool<T> {
    /// Creates a pool that owns `objects`.
    ///
    /// The capacity is the number of objects given and never changes.
    pub fn new(objects: impl IntoIterator<Item = T>) -> Self {
        Self::with_config(objects, PoolConfig::default())
    }

    /// Creates a pool that owns `objects`, using `config`.
    pub fn with_config(objects: impl IntoIterator<Item = T>, config: PoolConfig) -> Self {
        let objects: Vec<T> = objects.into_iter().collect();
        let capacity = objects.len();
        // ArrayQueue rejects a zero capacity; an empty pool simply never
        // stores anything.
        let storage = ArrayQueue::new(capacity.max(1));
        for obj in objects {
            if storage.push(obj).is_err() {
                unreachable!("pool storage sized below its initial object count");
            }
        }
        tracing::debug!(pool = %config.label, capacity, "pool created");
        BoundedPool {
            id: PoolId::next(),
            capacity,
            storage,
            permits: Permits::new(capacity),
            config,
        }
    }

    /// Checks an object out, blocking the calling thread until one is
    /// available.
    ///
    /// This never fails, but it waits forever if every object stays checked
    /// out. Use [`Self::acquire_timeout`] when that is not acceptable.
    pub fn acquire(&self) -> Pooled<T> {
        self.wait_forever();
        Pooled::new(self.take(), self.id)
    }

    /// Checks an object out if one is available right now.
    pub fn try_acquire(&self) -> Option<Pooled<T>> {
        self.permits
            .try_take()
            .then(|| Pooled::new(self.take(), self.id))
    }

    /// Checks an object out, waiting at most `timeout`.
    ///
    /// Returns [`Error::Timeout`] if nothing was returned to the pool in
    /// time. The pool is left untouched in that case.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<Pooled<T>> {
        self.wait(Self::deadline_after(timeout))?;
        Ok(Pooled::new(self.take(), self.id))
    }

    /// Checks an object out, waiting no later than `deadline`.
    pub fn acquire_deadline(&self, deadline: Instant) -> Result<Pooled<T>> {
        self.wait(Some(deadline))?;
        Ok(Pooled::new(self.take(), self.id))
    }

    /// Returns a checked out object to the pool.
    ///
    /// The object is reset, stored, and then exactly one waiting caller, if
    /// any, is woken. Objects checked out of another pool are refused and
    /// handed back inside the [`Rejected`] error.
    pub fn release(&self, pooled: Pooled<T>) -> std::result::Result<(), Rejected<T>> {
        if pooled.owner != self.id {
            tracing::warn!(
                pool = %self.config.label,
                id = %self.id,
                owner = %pooled.owner,
                "refused release of a foreign object"
            );
            let error = Error::ForeignObject {
                pool: self.id,
                owner: pooled.owner,
            };
            return Err(Rejected::new(error, pooled));
        }
        self.restore(pooled.obj);
        Ok(())
    }

    /// Resets `obj`, stores it and publishes its permit.
    ///
    /// If [`Reset::reset`] panics, the object is still stored and its permit
    /// published before the panic carries on, so the pool keeps its size.
    fn restore(&self, obj: T) {
        let mut returning = Returning {
            pool: self,
            obj: Some(obj),
        };
        if let Some(obj) = returning.obj.as_mut() {
            obj.reset();
        }
    }

    fn store(&self, obj: T) {
        if self.storage.push(obj).is_err() {
            unreachable!("more objects returned than the pool owns");
        }
        self.permits.add();
        tracing::trace!(
            pool = %self.config.label,
            available = self.storage.len(),
            "object returned"
        );
    }

    /// Checks an object out behind a guard that returns it on drop.
    ///
    /// Waits up to [`PoolConfig::acquire_timeout`], or forever when no
    /// timeout is configured.
    pub fn get(&self) -> Result<RefGuard<'_, T>> {
        self.wait(self.config.acquire_timeout.and_then(Self::deadline_after))?;
        Ok(RefGuard::new(self.take(), self))
    }

    /// Like [`Self::get`], but fails immediately with `None` when the pool
    /// is exhausted.
    pub fn try_get(&self) -> Option<RefGuard<'_, T>> {
        self.permits
            .try_take()
            .then(|| RefGuard::new(self.take(), self))
    }

    /// Checks an object out behind a guard that holds an arc reference to
    /// the owning pool. The guard is not tied to a borrow of the pool, so it
    /// can be moved freely between threads.
    ///
    /// Waits up to [`PoolConfig::acquire_timeout`], or forever when no
    /// timeout is configured.
    pub fn get_rc(self: Arc<Self>) -> Result<RcGuard<T>> {
        self.wait(self.config.acquire_timeout.and_then(Self::deadline_after))?;
        Ok(RcGuard::new(self.take(), self))
    }

    /// Like [`Self::get_rc`], but fails immediately with `None` when the
    /// pool is exhausted.
    pub fn try_get_rc(self: Arc<Self>) -> Option<RcGuard<T>> {
        if !self.permits.try_take() {
            return None;
        }
        let obj = self.take();
        Some(RcGuard::new(obj, self))
    }
}

/// Puts an object back into its pool when dropped, even while unwinding out
/// of a panicking reset.
struct Returning<'a, T: Reset> {
    pool: &'a BoundedPool<T>,
    obj: Option<T>,
}

impl<'a, T: Reset> Drop for Returning<'a, T> {
    fn drop(&mut self) {
        if let Some(obj) = self.obj.take() {
            if std::thread::panicking() {
                tracing::warn!(
                    pool = %self.pool.config.label,
                    "reset panicked, object returned without a clean reset"
                );
            }
            self.pool.store(obj);
        }
    }
}

impl<T> Drop for BoundedPool<T> {
    fn drop(&mut self) {
        let outstanding = self.checked_out();
        if outstanding > 0 {
            tracing::debug!(
                pool = %self.config.label,
                outstanding,
                "pool dropped while objects are still checked out"
            );
        }
    }
}

/// A guard over an object checked out of a borrowed pool.
///
/// The object is reset and returned to the pool when the guard is dropped.
pub struct RefGuard<'a, T: Reset> {
    obj: MaybeUninit<T>,
    pool: &'a BoundedPool<T>,
}

impl<'a, T: Reset> RefGuard<'a, T> {
    fn new(obj: T, pool: &'a BoundedPool<T>) -> Self {
        RefGuard {
            obj: MaybeUninit::new(obj),
            pool,
        }
    }

    /// Consumes the guard without returning the object, handing it back as
    /// a [`Pooled`] value that must later go through
    /// [`BoundedPool::release`].
    pub fn into_pooled(self) -> Pooled<T> {
        let owner = self.pool.id;
        // Safety: the object is initialized until the guard is dropped, and
        // forgetting the guard keeps Drop from reading it a second time.
        let obj = unsafe { self.obj.as_ptr().read() };
        forget(self);
        Pooled::new(obj, owner)
    }
}

impl<'a, T: Reset> Deref for RefGuard<'a, T> {
    type Target = T;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        unsafe { &*self.obj.as_ptr() }
    }
}

impl<'a, T: Reset> DerefMut for RefGuard<'a, T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.obj.as_mut_ptr() }
    }
}

impl<'a, T: Reset> Drop for RefGuard<'a, T> {
    fn drop(&mut self) {
        // Safety: the object is moved out exactly once, here.
        self.pool.restore(unsafe { ptr::read(self.obj.as_ptr()) });
    }
}

impl<'a, T: Reset + fmt::Debug> fmt::Debug for RefGuard<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
impl<'a, T: Reset + fmt::Display> fmt::Display for RefGuard<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}
impl<'a, T: Reset + PartialEq> PartialEq for RefGuard<'a, T> {
    #[inline]
    fn eq(&self, other: &RefGuard<'a, T>) -> bool {
        self.deref().eq(other)
    }
}
impl<'a, T: Reset> std::borrow::Borrow<T> for RefGuard<'a, T> {
    #[inline(always)]
    fn borrow(&self) -> &T {
        self
    }
}
impl<'a, T: Reset> AsRef<T> for RefGuard<'a, T> {
    #[inline(always)]
    fn as_ref(&self) -> &T {
        self
    }
}

/// A guard over an object checked out of an [`Arc`]-shared pool.
///
/// The object is reset and returned to the pool when the guard is dropped.
pub struct RcGuard<T: Reset> {
    obj: MaybeUninit<T>,
    pool: Arc<BoundedPool<T>>,
}

impl<T: Reset> RcGuard<T> {
    fn new(obj: T, pool: Arc<BoundedPool<T>>) -> Self {
        RcGuard {
            obj: MaybeUninit::new(obj),
            pool,
        }
    }

    /// Consumes the guard without returning the object, handing it back as
    /// a [`Pooled`] value that must later go through
    /// [`BoundedPool::release`].
    pub fn into_pooled(mut self) -> Pooled<T> {
        let owner = self.pool.id;
        // Safety: the object is initialized until the guard is dropped, and
        // forgetting the guard keeps Drop from reading it a second time.
        let obj = unsafe { self.obj.as_ptr().read() };
        // Safety: the arc is dropped exactly once here; forget below skips
        // the field drop glue.
        unsafe { ptr::drop_in_place(&mut self.pool) }
        forget(self);
        Pooled::new(obj, owner)
    }
}

impl<T: Reset> Deref for RcGuard<T> {
    type Target = T;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        unsafe { &*self.obj.as_ptr() }
    }
}

impl<T: Reset> DerefMut for RcGuard<T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.obj.as_mut_ptr() }
    }
}

impl<T: Reset> Drop for RcGuard<T> {
    fn drop(&mut self) {
        // Safety: the object is moved out exactly once, here.
        self.pool.restore(unsafe { ptr::read(self.obj.as_ptr()) });
    }
}

impl<T: Reset + fmt::Debug> fmt::Debug for RcGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
impl<T: Reset + fmt::Display> fmt::Display for RcGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}
impl<T: Reset + PartialEq> PartialEq for RcGuard<T> {
    #[inline]
    fn eq(&self, other: &RcGuard<T>) -> bool {
        self.deref().eq(other)
    }
}
impl<T: Reset> std::borrow::Borrow<T> for RcGuard<T> {
    #[inline(always)]
    fn borrow(&self) -> &T {
        self
    }
}
impl<T: Reset> AsRef<T> for RcGuard<T> {
    #[inline(always)]
    fn as_ref(&self) -> &T {
        self
    }
}
