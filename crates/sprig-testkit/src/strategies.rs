//! Property test strategies for Sprig types

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use sprig_core::LOOPBACK_ADDRS;

/// A single non-empty URL path segment.
pub fn arb_segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,7}"
}

/// Route segments stored innermost first; empty segments included.
pub fn arb_route_context() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(prop_oneof![1 => Just(String::new()), 4 => arb_segment()], 0..5)
}

/// A route pattern with optional surrounding slashes.
pub fn arb_pattern() -> impl Strategy<Value = String> {
    (any::<bool>(), arb_segment(), any::<bool>()).prop_map(|(lead, segment, trail)| {
        format!(
            "{}{segment}{}",
            if lead { "/" } else { "" },
            if trail { "/" } else { "" }
        )
    })
}

/// One of the loopback identifiers.
pub fn arb_local_addr() -> impl Strategy<Value = String> {
    proptest::sample::select(LOOPBACK_ADDRS.to_vec()).prop_map(str::to_string)
}

/// A public IPv4 address; never loopback.
pub fn arb_remote_addr() -> impl Strategy<Value = String> {
    (1u8..=223, any::<u8>(), any::<u8>(), 1u8..=254)
        .prop_filter("loopback range", |(a, ..)| *a != 127)
        .prop_map(|(a, b, c, d)| format!("{a}.{b}.{c}.{d}"))
}
