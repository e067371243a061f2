use std::convert::Infallible;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;

/// A computation wrapped by a memoizing wrapper.
///
/// This is the single seam through which a wrapper invokes the underlying
/// function. Recursive computations re-enter the wrapper through the
/// `recur` handle instead of calling themselves directly, so every
/// distinct sub-call argument list is cached on its own as the recursion
/// unwinds.
///
/// Callers rarely implement this by hand; the [`Plain`], [`Recursive`],
/// [`Fallible`] and [`FallibleRecursive`] adapters cover ordinary
/// closures and are produced by the wrapper constructors.
pub trait Compute<In, Out> {
    /// The failure type of the computation.
    ///
    /// [`Infallible`] for computations that always produce a result.
    type Error;

    /// Run the computation for one argument list.
    fn compute(
        &self,
        recur: Recur<'_, In, Out, Self::Error>,
        args: In,
    ) -> Result<Out, Self::Error>;
}

/// Re-enters the memoized entry point from inside the wrapped computation.
///
/// A sub-call through this handle goes through the same lookup as an
/// outer call and uses the same store, while the outer call for a
/// different key is still on the stack.
pub struct Recur<'a, In, Out, E = Infallible> {
    pub(crate) inner: &'a dyn Fn(In) -> Result<Out, E>,
}

impl<In, Out> Recur<'_, In, Out> {
    /// Call the memoized entry point for a sub-argument list.
    #[inline]
    pub fn call(&self, args: In) -> Out {
        match (self.inner)(args) {
            Ok(output) => output,
            Err(error) => match error {},
        }
    }
}

impl<In, Out, E> Recur<'_, In, Out, E> {
    /// Call the memoized entry point for a sub-argument list, propagating
    /// a failed sub-computation.
    #[inline]
    pub fn try_call(&self, args: In) -> Result<Out, E> {
        (self.inner)(args)
    }
}

impl<In, Out, E> Copy for Recur<'_, In, Out, E> {}

impl<In, Out, E> Clone for Recur<'_, In, Out, E> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<In, Out, E> Debug for Recur<'_, In, Out, E> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad("Recur(..)")
    }
}

/// An infallible computation that does not recurse through the wrapper.
pub struct Plain<F>(pub(crate) F);

impl<In, Out, F> Compute<In, Out> for Plain<F>
where
    F: Fn(In) -> Out,
{
    type Error = Infallible;

    #[inline]
    fn compute(
        &self,
        _: Recur<'_, In, Out, Infallible>,
        args: In,
    ) -> Result<Out, Infallible> {
        Ok((self.0)(args))
    }
}

/// An infallible computation that recurses through the wrapper.
pub struct Recursive<F>(pub(crate) F);

impl<In, Out, F> Compute<In, Out> for Recursive<F>
where
    F: Fn(Recur<'_, In, Out>, In) -> Out,
{
    type Error = Infallible;

    #[inline]
    fn compute(
        &self,
        recur: Recur<'_, In, Out, Infallible>,
        args: In,
    ) -> Result<Out, Infallible> {
        Ok((self.0)(recur, args))
    }
}

/// A fallible computation that does not recurse through the wrapper.
pub struct Fallible<F>(pub(crate) F);

impl<In, Out, E, F> Compute<In, Out> for Fallible<F>
where
    F: Fn(In) -> Result<Out, E>,
{
    type Error = E;

    #[inline]
    fn compute(&self, _: Recur<'_, In, Out, E>, args: In) -> Result<Out, E> {
        (self.0)(args)
    }
}

/// A fallible computation that recurses through the wrapper.
pub struct FallibleRecursive<F, E>(pub(crate) F, pub(crate) PhantomData<fn(E)>);

impl<In, Out, E, F> Compute<In, Out> for FallibleRecursive<F, E>
where
    F: Fn(Recur<'_, In, Out, E>, In) -> Result<Out, E>,
{
    type Error = E;

    #[inline]
    fn compute(&self, recur: Recur<'_, In, Out, E>, args: In) -> Result<Out, E> {
        (self.0)(recur, args)
    }
}
