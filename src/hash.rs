use siphasher::sip128::{Hasher128, SipHasher13};

use crate::input::ArgList;

/// Produce a 128-bit hash of an argument list's canonical encoding.
#[inline]
pub fn hash<T: ArgList>(args: &T) -> u128 {
    let mut state = SipHasher13::new();
    args.feed(&mut state);
    state.finish128().as_u128()
}
