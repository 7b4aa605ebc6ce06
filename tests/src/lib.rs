//! # Curbside Test Suite
//!
//! Cross-subsystem scenarios driven through the same wiring the runtime
//! uses: one room router, one presence registry, in-memory stores.
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # Wired market, socket-less clients
//! └── integration/
//!     ├── location_flow.rs    # vendor moves, feed and room routing
//!     ├── order_flow.rs       # placement, transitions, degraded mode
//!     ├── fanout.rs           # slow subscribers, bounded delivery
//!     └── connection_flow.rs  # subscriptions, teardown, presence
//! ```
//!
//! ```bash
//! cargo test -p cs-tests
//! cargo test -p cs-tests integration::fanout
//! ```

pub mod fixtures;
pub mod integration;
