//! Cache port with hierarchical keys and an in-memory adapter.
//!
//! Cached payloads are opaque bytes; callers serialize domain records before
//! handing them over. Keys are path strings mirroring the
//! owner → project → environment → object hierarchy, so a write can name the
//! exact list and entity entries it invalidates.
//!
//! # Example
//!
//! ```ignore
//! let key = CacheKey::object(&owner.project("p").environment("e"), &code);
//! if let Some(bytes) = cache.get(&key).await? {
//!     // hit
//! }
//! cache.flush(&[key]).await?;
//! ```

pub mod key;
pub mod memory;
pub mod read;
pub mod traits;

pub use key::CacheKey;
pub use memory::InMemoryCacheBackend;
pub use read::{CacheRead, ReadSource};
pub use traits::{CacheBackend, CacheResult, CacheStats};
