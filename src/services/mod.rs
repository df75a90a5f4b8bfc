//! In-process services shared by every request.
//!
//! Both structures are instance-local and ephemeral: they start empty and
//! are never persisted or shared between gateway instances.

mod rate_limiter;
mod response_cache;

pub use rate_limiter::{RateLimitPolicy, SlidingWindowLimiter};
pub use response_cache::{CacheEntry, ResponseCache};
