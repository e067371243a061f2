use crate::hash::hash;
use crate::input::ArgList;

/// A key-derivation strategy for an argument list type.
///
/// The derived key must be a total, deterministic function of the list:
/// equal argument lists must derive equal keys within one process run.
/// Distinct lists that derive the same key are silently served each
/// other's cached results, so a custom strategy trades correctness for
/// whatever it gains — see the crate-level notes on collision hazards.
pub trait Keyer<In> {
    /// Derive the cache key for one invocation's argument list.
    fn derive(&self, args: &In) -> u128;
}

/// The default key-derivation strategy.
///
/// Hashes the canonical, arity-tagged encoding of the argument list with
/// 128-bit SipHash-1-3. Distinct lists colliding in the 128-bit hash
/// space remain a theoretical hazard; with a high-quality 128-bit hash
/// the risk is an acceptable minimum, the same trade made for hash-based
/// equality elsewhere in the ecosystem.
#[derive(Debug, Default, Copy, Clone)]
pub struct Structural;

impl<In: ArgList> Keyer<In> for Structural {
    #[inline]
    fn derive(&self, args: &In) -> u128 {
        hash(args)
    }
}

/// Key derivation through a caller-supplied function.
///
/// The escape hatch for argument types the structural strategy cannot
/// faithfully encode. The function carries the full correctness burden:
/// two lists it maps to the same key are indistinguishable to the cache.
#[derive(Debug, Copy, Clone)]
pub struct KeyFn<F>(pub F);

impl<In, F> Keyer<In> for KeyFn<F>
where
    F: Fn(&In) -> u128,
{
    #[inline]
    fn derive(&self, args: &In) -> u128 {
        (self.0)(args)
    }
}
