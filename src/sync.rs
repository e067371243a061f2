use std::convert::Infallible;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::compute::{Compute, Fallible, FallibleRecursive, Plain, Recur, Recursive};
use crate::key::{Keyer, Structural};
use crate::store::{Stats, Store};

/// A memoizing wrapper that can be shared across threads.
///
/// Same contract as [`Memo`](crate::Memo), with one documented
/// concurrency policy: the store lock is held only across lookup and
/// insert, never while the computation runs. Two threads that miss on
/// the same key therefore both run the computation; the first result
/// stored wins and the later duplicate is discarded. Per-key
/// serialization is deliberately not provided. Because no lock is held
/// during the computation, reentrant recursion through [`Recur`] cannot
/// deadlock.
pub struct SyncMemo<In, Out, F, K = Structural> {
    /// The private key → result store.
    store: RwLock<Store<Out>>,
    /// Calls served from the store.
    hits: AtomicUsize,
    /// Calls that invoked the underlying computation.
    misses: AtomicUsize,
    /// The key-derivation strategy.
    keyer: K,
    /// The wrapped computation.
    func: F,
    marker: PhantomData<fn(In)>,
}

impl<In, Out, F> SyncMemo<In, Out, Plain<F>>
where
    F: Fn(In) -> Out,
{
    /// Wrap a function.
    pub fn new(func: F) -> Self {
        Self::with(Structural, Plain(func))
    }
}

impl<In, Out, F> SyncMemo<In, Out, Recursive<F>>
where
    F: Fn(Recur<'_, In, Out>, In) -> Out,
{
    /// Wrap a recursive function.
    pub fn recursive(func: F) -> Self {
        Self::with(Structural, Recursive(func))
    }
}

impl<In, Out, E, F> SyncMemo<In, Out, Fallible<F>>
where
    F: Fn(In) -> Result<Out, E>,
{
    /// Wrap a fallible function.
    pub fn fallible(func: F) -> Self {
        Self::with(Structural, Fallible(func))
    }
}

impl<In, Out, E, F> SyncMemo<In, Out, FallibleRecursive<F, E>>
where
    F: Fn(Recur<'_, In, Out, E>, In) -> Result<Out, E>,
{
    /// Wrap a fallible recursive function.
    pub fn fallible_recursive(func: F) -> Self {
        Self::with(Structural, FallibleRecursive(func, PhantomData))
    }
}

impl<In, Out, F, K> SyncMemo<In, Out, F, K> {
    /// Wrap an arbitrary [`Compute`] implementation with an arbitrary
    /// key-derivation strategy.
    pub fn with(keyer: K, func: F) -> Self {
        Self {
            store: RwLock::new(Store::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            keyer,
            func,
            marker: PhantomData,
        }
    }

    /// Replace the key-derivation strategy.
    ///
    /// Only meaningful directly after construction, before any result is
    /// stored.
    pub fn keyed<K2>(self, keyer: K2) -> SyncMemo<In, Out, F, K2> {
        SyncMemo {
            store: self.store,
            hits: self.hits,
            misses: self.misses,
            keyer,
            func: self.func,
            marker: PhantomData,
        }
    }

    /// Hit and miss counts since construction.
    ///
    /// Under concurrent duplicate work, `misses` counts every invocation
    /// of the computation, including those whose result was discarded.
    pub fn stats(&self) -> Stats {
        Stats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// The number of distinct argument lists stored.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// Whether no result has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<In, Out, F, K> SyncMemo<In, Out, F, K>
where
    Out: Clone,
    F: Compute<In, Out>,
    K: Keyer<In>,
{
    /// Call the wrapped computation, re-using a stored result if one
    /// exists for the derived key.
    pub fn call(&self, args: In) -> Out
    where
        F: Compute<In, Out, Error = Infallible>,
    {
        match self.try_call(args) {
            Ok(output) => output,
            Err(error) => match error {},
        }
    }

    /// Like [`call`](Self::call), for fallible computations.
    ///
    /// Failures and panics propagate unchanged and leave the store
    /// untouched.
    pub fn try_call(&self, args: In) -> Result<Out, F::Error> {
        let key = self.keyer.derive(&args);

        // The read guard is dropped at the end of the `if let`, before
        // the computation runs.
        if let Some(hit) = self.store.read().lookup(key) {
            let output = hit.clone();
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(output);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        let inner = |sub: In| self.try_call(sub);
        let output = self.func.compute(Recur { inner: &inner }, args)?;

        // A concurrent call with the same arguments may have stored a
        // result in the meantime. The store keeps the first one; return
        // what it holds so all observers agree.
        Ok(self.store.write().insert(key, output).clone())
    }
}

impl<In, Out, F, K> Debug for SyncMemo<In, Out, F, K> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("SyncMemo")
            .field("entries", &self.store.read().len())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
