//! Multi-lock acquisition.
//!
//! Taking several mutexes in a fixed order deadlocks as soon as two
//! threads disagree about the order. These helpers never block while
//! holding a lock: they try every lock, and on contention release all of
//! them, back off and start over.
//!
//! Back-off spins with [`std::hint::spin_loop`] for a few rounds, then
//! yields the thread. The wait per round is capped.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Mutex;
//! use dcm_memory::lock_pair;
//!
//! let a = Mutex::new(1);
//! let b = Mutex::new(String::from("x"));
//! let (ga, gb) = lock_pair(&a, &b).unwrap();
//! assert_eq!(*ga, 1);
//! assert_eq!(*gb, "x");
//! ```

use std::sync::{Mutex, MutexGuard, TryLockError};

use tracing::trace;

use crate::{MemoryError, MemoryResult};

const SPIN_LIMIT: u32 = 6;
const YIELD_LIMIT: u32 = 10;

/// Bounded exponential back-off.
#[derive(Debug, Default)]
struct Backoff {
    step: u32,
}

impl Backoff {
    fn snooze(&mut self) {
        if self.step <= SPIN_LIMIT {
            for _ in 0..(1u32 << self.step) {
                std::hint::spin_loop();
            }
        } else {
            std::thread::yield_now();
        }
        if self.step <= YIELD_LIMIT {
            self.step += 1;
        }
    }
}

enum Attempt<G> {
    Locked(G),
    Busy,
}

fn try_one<'a, T>(
    mutex: &'a Mutex<T>,
    what: &'static str,
) -> MemoryResult<Attempt<MutexGuard<'a, T>>> {
    match mutex.try_lock() {
        Ok(guard) => Ok(Attempt::Locked(guard)),
        Err(TryLockError::WouldBlock) => Ok(Attempt::Busy),
        Err(TryLockError::Poisoned(_)) => Err(MemoryError::LockPoisoned(what)),
    }
}

/// Locks two mutexes without risk of lock-order deadlock.
///
/// # Errors
///
/// - [`MemoryError::DuplicateLock`] if both arguments are the same mutex
/// - [`MemoryError::LockPoisoned`] if either mutex is poisoned
pub fn lock_pair<'a, A, B>(
    a: &'a Mutex<A>,
    b: &'a Mutex<B>,
) -> MemoryResult<(MutexGuard<'a, A>, MutexGuard<'a, B>)> {
    if std::ptr::addr_eq(a as *const Mutex<A>, b as *const Mutex<B>) {
        return Err(MemoryError::DuplicateLock { index: 1 });
    }

    let mut backoff = Backoff::default();
    let mut retries = 0u32;
    loop {
        if let Attempt::Locked(ga) = try_one(a, "lock_pair")? {
            if let Attempt::Locked(gb) = try_one(b, "lock_pair")? {
                if retries > 0 {
                    trace!(retries, "lock_pair acquired after contention");
                }
                return Ok((ga, gb));
            }
        }
        retries += 1;
        backoff.snooze();
    }
}

/// Locks every mutex in `mutexes`, all or nothing.
///
/// Guards are returned in argument order.
///
/// # Errors
///
/// - [`MemoryError::DuplicateLock`] if a mutex appears twice
/// - [`MemoryError::LockPoisoned`] if any mutex is poisoned
pub fn lock_all<'a, T>(mutexes: &[&'a Mutex<T>]) -> MemoryResult<Vec<MutexGuard<'a, T>>> {
    for (i, m) in mutexes.iter().enumerate() {
        if mutexes[..i].iter().any(|other| std::ptr::eq(*other, *m)) {
            return Err(MemoryError::DuplicateLock { index: i });
        }
    }

    let mut backoff = Backoff::default();
    let mut guards = Vec::with_capacity(mutexes.len());
    'retry: loop {
        for &m in mutexes {
            match try_one(m, "lock_all")? {
                Attempt::Locked(guard) => guards.push(guard),
                Attempt::Busy => {
                    guards.clear();
                    backoff.snooze();
                    continue 'retry;
                }
            }
        }
        return Ok(guards);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lock_pair_duplicate() {
        let m = Mutex::new(0);
        assert!(matches!(
            lock_pair(&m, &m),
            Err(MemoryError::DuplicateLock { .. })
        ));
    }

    #[test]
    fn test_lock_all_order() {
        let locks: Vec<Mutex<u32>> = (0..4).map(Mutex::new).collect();
        let refs: Vec<&Mutex<u32>> = locks.iter().collect();
        let guards = lock_all(&refs).unwrap();
        let values: Vec<u32> = guards.iter().map(|g| **g).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_lock_all_duplicate() {
        let a = Mutex::new(1);
        let b = Mutex::new(2);
        let result = lock_all(&[&a, &b, &a]);
        assert!(matches!(result, Err(MemoryError::DuplicateLock { index: 2 })));
    }

    #[test]
    fn test_poisoned() {
        let m = Arc::new(Mutex::new(0));
        let other = Mutex::new(0);
        let poisoner = Arc::clone(&m);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();
        let result = lock_pair(&other, &*m);
        assert!(matches!(result, Err(MemoryError::LockPoisoned(_))));
    }

    #[test]
    fn test_opposite_order_no_deadlock() {
        let a = Arc::new(Mutex::new(0u64));
        let b = Arc::new(Mutex::new(0u64));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let (a, b) = (Arc::clone(&a), Arc::clone(&b));
                thread::spawn(move || {
                    for _ in 0..500 {
                        if i % 2 == 0 {
                            let (mut x, mut y) = lock_pair(&*a, &*b).unwrap();
                            *x += 1;
                            *y += 1;
                        } else {
                            let (mut y, mut x) = lock_pair(&*b, &*a).unwrap();
                            *x += 1;
                            *y += 1;
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*a.lock().unwrap(), 2000);
        assert_eq!(*b.lock().unwrap(), 2000);
    }
}
