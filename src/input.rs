use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;

/// An ordered argument list.
///
/// This is implemented for tuples up to length twelve whose elements are
/// hashable. The unary case is spelled `(x,)`.
///
/// Values without a faithful structural encoding (closures, trait objects,
/// cyclic structures) have no `Hash` impl and are rejected at compile time.
/// To key such an argument by identity instead, wrap it in [`ByAddr`].
pub trait ArgList {
    /// The number of arguments in the list.
    const LEN: usize;

    /// Write a canonical encoding of the list into a hasher.
    ///
    /// The arity is written before the elements, so lists of different
    /// lengths never produce prefix-aligned hash streams.
    fn feed<H: Hasher>(&self, state: &mut H);
}

macro_rules! arg_list {
    ($len:literal; $($param:tt $idx:tt),*) => {
        impl<$($param: Hash),*> ArgList for ($($param,)*) {
            const LEN: usize = $len;

            fn feed<__H: Hasher>(&self, state: &mut __H) {
                state.write_usize(Self::LEN);
                $(self.$idx.hash(state);)*
            }
        }
    };
}

arg_list! { 0; }
arg_list! { 1; A 0 }
arg_list! { 2; A 0, B 1 }
arg_list! { 3; A 0, B 1, C 2 }
arg_list! { 4; A 0, B 1, C 2, D 3 }
arg_list! { 5; A 0, B 1, C 2, D 3, E 4 }
arg_list! { 6; A 0, B 1, C 2, D 3, E 4, F 5 }
arg_list! { 7; A 0, B 1, C 2, D 3, E 4, F 5, G 6 }
arg_list! { 8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7 }
arg_list! { 9; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8 }
arg_list! { 10; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9 }
arg_list! { 11; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10 }
arg_list! { 12; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10, L 11 }

/// An identity handle for a reference-shaped argument.
///
/// Hashes and compares by address rather than by structural content. Use
/// this for arguments that are not meaningfully comparable by value, for
/// example large context objects or resources identified by their handle.
///
/// The same value at two different addresses derives two different keys,
/// and a new value at a recycled address derives the old key. The caller
/// is responsible for keeping an address stable for as long as it stands
/// in for the value.
pub struct ByAddr<'a, T: ?Sized>(pub &'a T);

impl<T: ?Sized> ByAddr<'_, T> {
    /// The address this handle is keyed by.
    pub fn addr(&self) -> usize {
        std::ptr::from_ref(self.0).addr()
    }
}

impl<T: ?Sized> Deref for ByAddr<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<T: ?Sized> Copy for ByAddr<'_, T> {}

impl<T: ?Sized> Clone for ByAddr<'_, T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Hash for ByAddr<'_, T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.addr());
    }
}

impl<T: ?Sized> Eq for ByAddr<'_, T> {}

impl<T: ?Sized> PartialEq for ByAddr<'_, T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: ?Sized> Debug for ByAddr<'_, T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad("ByAddr(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash;

    #[test]
    fn test_arity_separates_prefix_aligned_lists() {
        // Without the arity tag, both lists would feed the same bytes.
        assert_ne!(hash(&(1u64,)), hash(&(1u64, ())));
    }

    #[test]
    fn test_by_addr_ignores_content() {
        let a = String::from("same");
        let b = String::from("same");
        assert_eq!(ByAddr(&a), ByAddr(&a));
        assert_ne!(hash(&(ByAddr(&a),)), hash(&(ByAddr(&b),)));
    }
}
