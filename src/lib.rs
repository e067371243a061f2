//! Function-result memoization.
//!
//! A [`Memo`] wraps a function and behaves like it, except that a
//! repeated call with an identical argument list is served from a
//! private key → result store instead of recomputing. The store is owned
//! by the wrapper, grows without bound, and lives exactly as long as the
//! wrapper does: there is no eviction, no expiry and no invalidation.
//!
//! The wrapped function is assumed to be pure. The only observable
//! differences between the wrapper and the bare function are latency,
//! how often the function body runs, and — for key-derivation strategies
//! that can collide — potentially wrong results on colliding argument
//! lists. The default [`Structural`] strategy hashes a canonical,
//! arity-tagged encoding of the argument tuple with a 128-bit hash, so
//! collisions are a theoretical rather than practical concern; a custom
//! [`Keyer`] carries its own correctness burden.
//!
//! Recursive functions memoize their sub-calls by routing them through
//! the [`Recur`] handle:
//!
//! ```
//! use memofn::Memo;
//!
//! let fib = Memo::recursive(|fib, (n,): (u64,)| {
//!     if n < 2 { n } else { fib.call((n - 1,)) + fib.call((n - 2,)) }
//! });
//!
//! assert_eq!(fib.call((25,)), 75025);
//! assert_eq!(fib.stats().misses, 26);
//! ```
//!
//! [`SyncMemo`] is the same wrapper behind a lock, for sharing across
//! threads.

mod compute;
mod hash;
mod input;
mod key;
mod memo;
mod store;
mod sync;

pub use crate::compute::{Compute, Fallible, FallibleRecursive, Plain, Recur, Recursive};
pub use crate::hash::hash;
pub use crate::input::{ArgList, ByAddr};
pub use crate::key::{KeyFn, Keyer, Structural};
pub use crate::memo::{Memo, memoize, memoize_recursive};
pub use crate::store::Stats;
pub use crate::sync::SyncMemo;
