use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;

use crate::compute::{Compute, Fallible, FallibleRecursive, Plain, Recur, Recursive};
use crate::key::{Keyer, Structural};
use crate::store::{Stats, Store};

/// Wrap a function in a memoizing wrapper with structural keys.
///
/// The returned wrapper behaves like the function itself, except that a
/// repeated call with an identical argument list returns the stored
/// result instead of recomputing it.
///
/// ```
/// use memofn::memoize;
///
/// let add = memoize(|(a, b): (i32, i32)| a + b);
/// assert_eq!(add.call((1, 2)), 3);
/// assert_eq!(add.call((1, 2)), 3);
/// assert_eq!(add.call((2, 1)), 3);
/// assert_eq!(add.stats().misses, 2);
/// ```
pub fn memoize<In, Out, F>(func: F) -> Memo<In, Out, Plain<F>>
where
    F: Fn(In) -> Out,
{
    Memo::new(func)
}

/// Wrap a recursive function in a memoizing wrapper with structural keys.
///
/// The function receives a [`Recur`] handle and must route its recursive
/// calls through it; each distinct sub-argument list is then cached
/// independently.
pub fn memoize_recursive<In, Out, F>(func: F) -> Memo<In, Out, Recursive<F>>
where
    F: Fn(Recur<'_, In, Out>, In) -> Out,
{
    Memo::recursive(func)
}

/// A memoizing wrapper around a single computation.
///
/// Each wrapper owns a private key → result store, created empty at
/// construction time and only ever growing: a result, once stored, is
/// never updated or removed for the lifetime of the wrapper. Two wrappers
/// over the same function share nothing.
///
/// The wrapped computation is assumed to be pure. For an impure
/// computation the wrapper's behavior is unspecified beyond the store
/// semantics themselves: whichever result is stored first for a key is
/// returned for all later calls with that key.
///
/// ```
/// use memofn::Memo;
///
/// let fib = Memo::recursive(|fib, (n,): (u64,)| {
///     if n < 2 { n } else { fib.call((n - 1,)) + fib.call((n - 2,)) }
/// });
///
/// assert_eq!(fib.call((10,)), 55);
/// assert_eq!(fib.stats().misses, 11);
/// ```
pub struct Memo<In, Out, F, K = Structural> {
    /// The private key → result store.
    store: RefCell<Store<Out>>,
    /// Hit and miss counts since construction.
    stats: Cell<Stats>,
    /// Whether the most recent call was served from the store.
    last_was_hit: Cell<bool>,
    /// The key-derivation strategy.
    keyer: K,
    /// The wrapped computation.
    func: F,
    marker: PhantomData<fn(In)>,
}

impl<In, Out, F> Memo<In, Out, Plain<F>>
where
    F: Fn(In) -> Out,
{
    /// Wrap a function.
    pub fn new(func: F) -> Self {
        Self::with(Structural, Plain(func))
    }
}

impl<In, Out, F> Memo<In, Out, Recursive<F>>
where
    F: Fn(Recur<'_, In, Out>, In) -> Out,
{
    /// Wrap a recursive function.
    ///
    /// The function must route its recursive calls through the [`Recur`]
    /// handle it receives, so that they re-enter the memoized entry
    /// point.
    pub fn recursive(func: F) -> Self {
        Self::with(Structural, Recursive(func))
    }
}

impl<In, Out, E, F> Memo<In, Out, Fallible<F>>
where
    F: Fn(In) -> Result<Out, E>,
{
    /// Wrap a fallible function.
    ///
    /// A failure propagates to the caller unchanged and is never stored;
    /// a later call with the same arguments re-attempts the computation.
    pub fn fallible(func: F) -> Self {
        Self::with(Structural, Fallible(func))
    }
}

impl<In, Out, E, F> Memo<In, Out, FallibleRecursive<F, E>>
where
    F: Fn(Recur<'_, In, Out, E>, In) -> Result<Out, E>,
{
    /// Wrap a fallible recursive function.
    pub fn fallible_recursive(func: F) -> Self {
        Self::with(Structural, FallibleRecursive(func, PhantomData))
    }
}

impl<In, Out, F, K> Memo<In, Out, F, K> {
    /// Wrap an arbitrary [`Compute`] implementation with an arbitrary
    /// key-derivation strategy.
    pub fn with(keyer: K, func: F) -> Self {
        Self {
            store: RefCell::new(Store::new()),
            stats: Cell::new(Stats::default()),
            last_was_hit: Cell::new(false),
            keyer,
            func,
            marker: PhantomData,
        }
    }

    /// Replace the key-derivation strategy.
    ///
    /// Only meaningful directly after construction: keys derived by
    /// different strategies are unrelated, so an already populated store
    /// would be orphaned. The store of the returned wrapper is the one
    /// this wrapper owned.
    pub fn keyed<K2>(self, keyer: K2) -> Memo<In, Out, F, K2> {
        Memo {
            store: self.store,
            stats: self.stats,
            last_was_hit: self.last_was_hit,
            keyer,
            func: self.func,
            marker: PhantomData,
        }
    }

    /// Hit and miss counts since construction.
    pub fn stats(&self) -> Stats {
        self.stats.get()
    }

    /// Whether the most recent call was served from the store.
    pub fn last_was_hit(&self) -> bool {
        self.last_was_hit.get()
    }

    /// The number of distinct argument lists stored.
    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    /// Whether no result has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register_hit(&self) {
        let mut stats = self.stats.get();
        stats.hits += 1;
        self.stats.set(stats);
        self.last_was_hit.set(true);
    }

    fn register_miss(&self) {
        let mut stats = self.stats.get();
        stats.misses += 1;
        self.stats.set(stats);
    }
}

impl<In, Out, F, K> Memo<In, Out, F, K>
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
    /// A failure propagates unchanged and leaves the store untouched, so
    /// a retry with the same arguments re-attempts the computation. The
    /// same holds if the computation panics: the store is only written
    /// after a successful return.
    pub fn try_call(&self, args: In) -> Result<Out, F::Error> {
        let key = self.keyer.derive(&args);

        // The borrow ends with the `if let`, before the computation runs,
        // so that reentrant calls through `Recur` can borrow the store
        // again.
        if let Some(hit) = self.store.borrow().lookup(key) {
            let output = hit.clone();
            self.register_hit();
            return Ok(output);
        }

        self.register_miss();

        let inner = |sub: In| self.try_call(sub);
        let result = self.func.compute(Recur { inner: &inner }, args);

        // Set after the computation so that hits recorded by nested
        // recursive calls do not mask the outer miss.
        self.last_was_hit.set(false);

        let output = result?;
        self.store.borrow_mut().insert(key, output.clone());
        Ok(output)
    }
}

impl<In, Out, F, K> Debug for Memo<In, Out, F, K> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Memo")
            .field("entries", &self.store.borrow().len())
            .field("stats", &self.stats.get())
            .finish_non_exhaustive()
    }
}
