//! Short-lived persistence for quotes and booking events.
//!
//! Nothing here is durable: quotes live for one browser session (or a short
//! server-side retention window) and booking events only long enough for the
//! client poller to collect them. The stores are injectable so the HTTP layer
//! and tests can swap implementations freely.

pub mod booking;
pub mod quote;
pub mod ttl;

pub use booking::{BookingRecord, BookingStore};
pub use quote::{InMemoryQuoteStore, QuoteMirror, QuoteStore, QuoteStoreError};
pub use ttl::{spawn_sweeper, TtlConfig, TtlMap};
