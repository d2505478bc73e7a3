// Re-entering a map from user code that runs inside one of its operations
// is caught in debug builds.
use chained_hashmap::{ChainedHashMap, Disposer, Global, Visit};
use std::cell::Cell;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::rc::Rc;

#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

type Map = ChainedHashMap<ReentryKey, i32, ConstBuildHasher>;

struct ReentryKey {
    id: &'static str,
    map: *const Map,
    trigger: bool,
}

impl PartialEq for ReentryKey {
    fn eq(&self, other: &Self) -> bool {
        if self.id == other.id {
            return true;
        }
        if other.trigger {
            // Attempt to re-enter the same map during probing.
            unsafe {
                let m = &*other.map;
                let _ = m.contains_key(self.id);
            }
        }
        false
    }
}
impl Eq for ReentryKey {}
impl Hash for ReentryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl std::borrow::Borrow<str> for ReentryKey {
    fn borrow(&self) -> &str {
        self.id
    }
}

fn key(id: &'static str) -> ReentryKey {
    ReentryKey {
        id,
        map: std::ptr::null(),
        trigger: false,
    }
}

#[cfg(debug_assertions)]
#[test]
fn reentry_from_eq_during_get_panics() {
    let mut m: Map = ChainedHashMap::with_hasher(1, ConstBuildHasher).unwrap();
    m.set(key("a"), 1).unwrap();

    let query = ReentryKey {
        id: "b",
        map: &m as *const _,
        trigger: true,
    };
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = m.get(&query);
    }));
    assert!(res.is_err(), "expected reentrancy to panic in debug builds");

    // The guard was released during unwinding; the map is usable again.
    assert_eq!(m.get_value("a"), Some(&1));
    assert!(m.remove("a"));
}

#[test]
fn plain_lookups_do_not_trip_the_guard() {
    let mut m: Map = ChainedHashMap::with_hasher(2, ConstBuildHasher).unwrap();
    m.set(key("a"), 1).unwrap();
    m.set(key("b"), 2).unwrap();
    assert_eq!(m.get_value("b"), Some(&2));
    assert!(m.get(&key("c")).is_none());
}

// A disposer that calls back into the map it belongs to once armed.
struct ReentryDisposer {
    map: Rc<Cell<*const DisposingMap>>,
}

type DisposingMap = ChainedHashMap<u32, u32, RandomState, Global, ReentryDisposer>;

impl Disposer<u32, u32> for ReentryDisposer {
    fn dispose_value(&self, _value: u32) {
        let map = self.map.get();
        if !map.is_null() {
            unsafe {
                let _ = (*map).contains_key(&0u32);
            }
        }
    }
}

// Runs `op` with the disposer armed and returns the panic message, if any.
// The disposer is disarmed before returning so teardown stays quiet.
#[cfg(debug_assertions)]
fn reenter_while_disposing(op: impl FnOnce(&mut DisposingMap)) -> Option<String> {
    let cell = Rc::new(Cell::new(std::ptr::null()));
    let disposer = ReentryDisposer { map: cell.clone() };
    let mut m = ChainedHashMap::create(4, RandomState::new(), Global, disposer).unwrap();
    for i in 0..4 {
        m.set(i, i).unwrap();
    }
    cell.set(&m as *const _);
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| op(&mut m)));
    cell.set(std::ptr::null());
    res.err().map(|p| p.downcast_ref::<String>().cloned().unwrap_or_default())
}

// Every path that disposes does so while still holding the guard.
#[cfg(debug_assertions)]
#[test]
fn reentry_from_disposer_panics_on_every_disposing_path() {
    let cases: [(&str, fn(&mut DisposingMap)); 4] = [
        ("set", |m| {
            m.set(1, 10).unwrap();
        }),
        ("remove", |m| {
            m.remove(&2u32);
        }),
        ("for_each", |m| m.for_each(|_, _| Visit::REMOVE)),
        ("clear", |m| m.clear()),
    ];
    for (op, run) in cases {
        let msg = reenter_while_disposing(run)
            .unwrap_or_else(|| panic!("`{op}` let the disposer re-enter"));
        assert!(msg.contains(&format!("`{op}`")), "{msg}");
        assert!(msg.contains("`contains_key`"), "{msg}");
    }
}

// `take` never reaches the disposer, so an armed disposer stays silent.
#[test]
fn take_does_not_dispose() {
    let cell = Rc::new(Cell::new(std::ptr::null()));
    let disposer = ReentryDisposer { map: cell.clone() };
    let mut m: DisposingMap = ChainedHashMap::create(4, RandomState::new(), Global, disposer).unwrap();
    m.set(3, 30).unwrap();
    cell.set(&m as *const _);
    assert_eq!(m.take(&3u32), Some((3, 30)));
    cell.set(std::ptr::null());
    assert!(m.is_empty());
}
