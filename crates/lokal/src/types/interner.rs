//! Process-wide cache of joined key strings.
//!
//! Every distinct segment sequence is joined at most once; later keys with the
//! same segments share the cached `Arc<str>`.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use lokal_semantics::SEPARATOR;
use parking_lot::RwLock;

/// Entries kept before the cache stops growing.
const MAX_INTERNED: usize = 16_384;

type Segments = Box<[Arc<str>]>;

static INTERNED: LazyLock<RwLock<HashMap<Segments, Arc<str>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Returns the joined form of `segments`, reusing a cached copy when present.
pub(crate) fn intern(segments: &[Arc<str>]) -> Arc<str> {
    if let Some(joined) = INTERNED.read().get(segments) {
        return Arc::clone(joined);
    }

    let joined: Arc<str> = Arc::from(join(segments));
    let mut cache = INTERNED.write();
    if let Some(existing) = cache.get(segments) {
        return Arc::clone(existing);
    }
    if cache.len() < MAX_INTERNED {
        cache.insert(segments.into(), Arc::clone(&joined));
    }
    joined
}

fn join(segments: &[Arc<str>]) -> String {
    let len = segments.iter().map(|s| s.len() + 1).sum::<usize>();
    let mut joined = String::with_capacity(len);
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            joined.push(SEPARATOR);
        }
        joined.push_str(segment);
    }
    joined
}
