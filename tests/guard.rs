mod common;

use bpool::*;
use common::Probe;
use std::{sync::Arc, thread, time::Duration};

#[test]
fn test_get() {
    let pool = BoundedPool::new(vec![Probe::new('a')]);
    {
        let mut guard = pool.get().unwrap();
        guard.dirty = true;
        assert_eq!(guard.id, 'a');
        assert_eq!(pool.checked_out(), 1);
    }
    assert_eq!(pool.available(), 1);
    let guard = pool.try_get().unwrap();
    assert!(!guard.dirty);
    assert_eq!(guard.resets(), 1);
}

#[test]
fn test_try_get_exhausted() {
    let pool = BoundedPool::new(vec![String::from("x")]);
    let guard = pool.try_get().unwrap();
    assert_eq!(*guard, "x");
    assert!(pool.try_get().is_none());
    drop(guard);
    assert_eq!(*pool.try_get().unwrap(), "");
}

#[test]
fn test_get_honors_configured_timeout() {
    let pool = BoundedPool::with_config(
        vec![Probe::new('a')],
        PoolConfig::new()
            .with_label("guarded")
            .with_acquire_timeout(Duration::from_millis(10)),
    );
    let _held = pool.get().unwrap();
    assert!(matches!(pool.get(), Err(Error::Timeout { .. })));
    assert_eq!(pool.checked_out(), 1);
}

#[test]
fn test_get_into_pooled() {
    let pool = BoundedPool::new(vec![Probe::new('a')]);
    let mut guard = pool.get().unwrap();
    guard.dirty = true;
    let pooled = guard.into_pooled();
    assert_eq!(pooled.owner(), pool.id());
    assert_eq!(pooled.resets(), 0);
    assert_eq!(pool.available(), 0);
    pool.release(pooled).unwrap();
    assert_eq!(pool.available(), 1);
}

#[test]
fn test_get_rc() {
    let pool = BoundedPool::new(vec![vec![1u8, 2, 3]]).to_rc();
    let guard = pool.clone().get_rc().unwrap();
    assert_eq!(*guard, vec![1, 2, 3]);
    assert!(pool.clone().try_get_rc().is_none());
    drop(guard);
    assert!(pool.clone().try_get_rc().unwrap().is_empty());
}

#[test]
fn test_get_rc_into_pooled() {
    let pool = BoundedPool::new(vec![Probe::new('a')]).to_rc();
    let pooled = pool.clone().get_rc().unwrap().into_pooled();
    assert_eq!(Arc::strong_count(&pool), 1);
    pool.release(pooled).unwrap();
    assert_eq!(pool.available(), 1);
}

#[test]
fn test_get_rc_across_threads() {
    let pool = BoundedPool::new((0..2).map(|_| Vec::<usize>::new())).to_rc();
    let handles: Vec<_> = (0..6)
        .map(|i| {
            let pool = pool.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let mut buf = pool.clone().get_rc().unwrap();
                    assert!(buf.is_empty());
                    buf.push(i);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(pool.available(), 2);
}

#[test]
fn test_guard_forwards_traits() {
    let pool = BoundedPool::new(vec![String::from("a"), String::from("a")]);
    let first = pool.get().unwrap();
    let second = pool.get().unwrap();
    assert_eq!(first, second);
    assert_eq!(format!("{first}"), "a");
    assert_eq!(format!("{second:?}"), "\"a\"");
    let s: &String = first.as_ref();
    assert_eq!(s, "a");
}
