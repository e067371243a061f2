use std::cell::Cell;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};

use memofn::{ByAddr, KeyFn, Memo, SyncMemo, hash, memoize, memoize_recursive};
use quickcheck_macros::quickcheck;

macro_rules! test {
    (miss: $memo:expr, $call:expr, $result:expr) => {{
        assert_eq!($call, $result);
        assert!(!$memo.last_was_hit());
    }};
    (hit: $memo:expr, $call:expr, $result:expr) => {{
        assert_eq!($call, $result);
        assert!($memo.last_was_hit());
    }};
}

/// Test basic memoization.
#[test]
fn test_basic() {
    let empty = memoize(|(): ()| format!("The world is {}", "big"));
    let double = memoize(|(x,): (u32,)| 2 * x);
    let sum = memoize(|(a, b): (u32, u32)| a + b);

    test!(miss: empty, empty.call(()), "The world is big");
    test!(hit: empty, empty.call(()), "The world is big");
    test!(hit: empty, empty.call(()), "The world is big");

    test!(miss: double, double.call((2,)), 4);
    test!(miss: double, double.call((4,)), 8);
    test!(hit: double, double.call((2,)), 4);

    test!(miss: sum, sum.call((2, 4)), 6);
    test!(miss: sum, sum.call((2, 3)), 5);
    test!(hit: sum, sum.call((2, 3)), 5);
    test!(miss: sum, sum.call((4, 2)), 6);

    assert_eq!(sum.len(), 3);
}

/// A repeated call runs the function exactly once and returns the same
/// result both times.
#[test]
fn test_hit_does_not_reinvoke() {
    let calls = Cell::new(0);
    let expensive = memoize(|(n,): (u64,)| {
        calls.set(calls.get() + 1);
        (0..n).sum::<u64>()
    });

    let first = expensive.call((1000,));
    let second = expensive.call((1000,));
    assert_eq!(first, 499500);
    assert_eq!(first, second);
    assert_eq!(calls.get(), 1);
    assert_eq!(expensive.stats().hits, 1);
    assert_eq!(expensive.stats().misses, 1);
}

/// Swapped argument order is a different argument list, hence a
/// different key, even when the result happens to coincide.
#[test]
fn test_argument_order_is_part_of_the_key() {
    let calls = Cell::new(0);
    let add = memoize(|(a, b): (i32, i32)| {
        calls.set(calls.get() + 1);
        a + b
    });

    test!(miss: add, add.call((1, 2)), 3);
    assert_eq!(calls.get(), 1);
    test!(hit: add, add.call((1, 2)), 3);
    assert_eq!(calls.get(), 1);
    test!(miss: add, add.call((2, 1)), 3);
    assert_eq!(calls.get(), 2);
}

/// Argument lists of different lengths never derive the same key, even
/// when their element hash streams would prefix-align.
#[test]
fn test_arity_never_collides() {
    assert_ne!(hash(&(1u64,)), hash(&(1u64, 2u64)));
    assert_ne!(hash(&()), hash(&((),)));
    // A `(u32, u32)` list feeds the same eight bytes as this `(u64,)`
    // list; the arity tag still separates them.
    assert_ne!(hash(&(1u32, 0u32)), hash(&(1u64,)));
}

/// Struct-valued arguments are keyed by their `Hash` impl, which fixes
/// the field order at the type level: equal values always collide onto
/// the same key deliberately, distinct values do not.
#[test]
fn test_struct_arguments() {
    #[derive(Hash)]
    struct Point {
        x: i32,
        y: i32,
    }

    let norm = memoize(|(p,): (Point,)| p.x * p.x + p.y * p.y);

    test!(miss: norm, norm.call((Point { x: 1, y: 2 },)), 5);
    test!(hit: norm, norm.call((Point { x: 1, y: 2 },)), 5);
    test!(miss: norm, norm.call((Point { x: 2, y: 1 },)), 5);
}

/// A failed computation is not remembered; a retry with the same
/// arguments re-attempts it.
#[test]
fn test_failure_not_cached() {
    let calls = Cell::new(0);
    let parse = Memo::fallible(|(s,): (&str,)| {
        calls.set(calls.get() + 1);
        s.parse::<i32>().map_err(|_| "not a number")
    });

    assert_eq!(parse.try_call(("nope",)), Err("not a number"));
    assert_eq!(parse.try_call(("nope",)), Err("not a number"));
    assert_eq!(calls.get(), 2);
    assert_eq!(parse.len(), 0);

    assert_eq!(parse.try_call(("42",)), Ok(42));
    assert_eq!(parse.try_call(("42",)), Ok(42));
    assert_eq!(calls.get(), 3);
    assert_eq!(parse.len(), 1);
}

/// A panicking computation leaves the store untouched as well.
#[test]
fn test_panic_not_cached() {
    let first = Cell::new(true);
    let flaky = memoize(|(n,): (u32,)| {
        if first.replace(false) {
            panic!("flaky");
        }
        n + 1
    });

    let result = catch_unwind(AssertUnwindSafe(|| flaky.call((1,))));
    assert!(result.is_err());
    assert_eq!(flaky.len(), 0);

    // The retry recomputes instead of replaying a phantom entry.
    test!(miss: flaky, flaky.call((1,)), 2);
    test!(hit: flaky, flaky.call((1,)), 2);
    assert_eq!(flaky.stats().misses, 2);
}

/// Recursive calls routed through the wrapper turn exponential naive
/// recursion into one computation per distinct argument.
#[test]
fn test_recursive_fibonacci() {
    let calls = Cell::new(0);
    let fib = memoize_recursive(|fib, (n,): (u64,)| {
        calls.set(calls.get() + 1);
        if n < 2 { n } else { fib.call((n - 1,)) + fib.call((n - 2,)) }
    });

    assert_eq!(fib.call((10,)), 55);
    // One invocation of the body per n in 0..=10.
    assert_eq!(calls.get(), 11);
    assert_eq!(fib.stats().misses, 11);
    assert_eq!(fib.len(), 11);

    test!(hit: fib, fib.call((10,)), 55);
    test!(hit: fib, fib.call((7,)), 13);
    test!(miss: fib, fib.call((11,)), 89);
    assert_eq!(calls.get(), 12);
}

/// Two wrappers over the same function own independent stores.
#[test]
fn test_independent_stores() {
    let calls = Cell::new(0);
    let body = |(a, b): (i32, i32)| {
        calls.set(calls.get() + 1);
        a * b
    };

    let one = memoize(body);
    let two = memoize(body);

    test!(miss: one, one.call((3, 4)), 12);
    assert_eq!(calls.get(), 1);

    // A hit in `one` must not suppress the call in `two`.
    test!(miss: two, two.call((3, 4)), 12);
    assert_eq!(calls.get(), 2);

    test!(hit: one, one.call((3, 4)), 12);
    test!(hit: two, two.call((3, 4)), 12);
    assert_eq!(calls.get(), 2);
}

/// A caller-supplied key function is honored, including a deliberately
/// colliding one: the wrapper then serves the wrong result silently.
/// This is the documented collision hazard made visible.
#[test]
fn test_custom_keyer_collision() {
    let constant = memoize(|(n,): (u32,)| n * 10).keyed(KeyFn(|_: &(u32,)| 0u128));

    test!(miss: constant, constant.call((1,)), 10);
    // Different arguments, same key: the stored result wins.
    test!(hit: constant, constant.call((2,)), 10);
    assert_eq!(constant.len(), 1);
}

/// Identity handles key by address, not by content.
#[test]
fn test_by_addr_identity_keys() {
    let a = String::from("context");
    let b = String::from("context");

    let calls = Cell::new(0);
    let measure = memoize(|(ctx, n): (ByAddr<String>, usize)| {
        calls.set(calls.get() + 1);
        ctx.len() + n
    });

    test!(miss: measure, measure.call((ByAddr(&a), 1)), 8);
    test!(hit: measure, measure.call((ByAddr(&a), 1)), 8);
    // Equal content at a different address is a different key.
    test!(miss: measure, measure.call((ByAddr(&b), 1)), 8);
    assert_eq!(calls.get(), 2);
}

/// Fallible recursion: failures propagate through the whole chain and no
/// prefix of the failed chain is stored as a success.
#[test]
fn test_fallible_recursion() {
    let sum = Memo::fallible_recursive(|sum, (n,): (u64,)| {
        if n == 13 {
            return Err("thirteen");
        }
        if n == 0 { Ok(0) } else { Ok(n + sum.try_call((n - 1,))?) }
    });

    assert_eq!(sum.try_call((12,)), Ok(78));
    assert_eq!(sum.stats().misses, 13);
    assert_eq!(sum.len(), 13);

    // Descends 15 → 14 → 13, fails there; 14 and 15 are not stored.
    assert_eq!(sum.try_call((15,)), Err("thirteen"));
    assert_eq!(sum.len(), 13);

    // The failing argument itself is re-attempted, not replayed.
    assert_eq!(sum.try_call((13,)), Err("thirteen"));
    assert!(!sum.last_was_hit());

    test!(hit: sum, sum.try_call((12,)), Ok(78));
}

/// Threads sharing one wrapper all observe the same stored result for a
/// key; duplicate concurrent work is allowed, duplicate entries are not.
#[test]
fn test_sync_shared_key() {
    let slow = SyncMemo::new(|(n,): (u64,)| {
        std::thread::sleep(std::time::Duration::from_millis(10));
        n * 2
    });

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8).map(|_| s.spawn(|| slow.call((21,)))).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }
    });

    let stats = slow.stats();
    assert_eq!(slow.len(), 1);
    assert!(stats.misses >= 1);
    assert_eq!(stats.hits + stats.misses, 8);

    assert_eq!(slow.call((21,)), 42);
}

/// The shared wrapper with distinct keys per thread.
#[test]
fn test_sync_distinct_keys() {
    let square = SyncMemo::new(|(n,): (u64,)| n * n);

    std::thread::scope(|s| {
        for n in 0..8 {
            let square = &square;
            s.spawn(move || assert_eq!(square.call((n,)), n * n));
        }
    });

    assert_eq!(square.len(), 8);
}

/// Recursion through a shared wrapper must not deadlock: no lock is held
/// while the computation runs.
#[test]
fn test_sync_recursive() {
    let fib = SyncMemo::recursive(|fib, (n,): (u64,)| {
        if n < 2 { n } else { fib.call((n - 1,)) + fib.call((n - 2,)) }
    });

    assert_eq!(fib.call((20,)), 6765);
    assert_eq!(fib.stats().misses, 21);

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| assert_eq!(fib.call((30,)), 832040));
        }
    });
    assert_eq!(fib.len(), 31);
}

/// The wrapper agrees with the bare function on arbitrary inputs, and
/// runs it once per distinct argument list.
#[quickcheck]
fn prop_agrees_with_direct(inputs: Vec<(i32, i32)>) -> bool {
    let add = memoize(|(a, b): (i32, i32)| i64::from(a) + i64::from(b));

    for &(a, b) in &inputs {
        if add.call((a, b)) != i64::from(a) + i64::from(b) {
            return false;
        }
    }

    let distinct: HashSet<_> = inputs.iter().collect();
    add.stats().misses == distinct.len() && add.len() == distinct.len()
}

/// Key derivation is deterministic within a process run.
#[quickcheck]
fn prop_key_deterministic(a: u64, b: String, c: Vec<u8>) -> bool {
    hash(&(a, b.clone(), c.clone())) == hash(&(a, b, c))
}
