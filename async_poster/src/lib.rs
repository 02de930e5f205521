//! Generate async wrappers for synchronous methods at compile time.
//!
//! Annotate an inherent impl block or a trait with [`poster`] and every
//! eligible synchronous method gains a companion wrapper (named
//! `{method}Async` by default) that runs the original call on the blocking
//! worker pool and immediately returns the pending handle:
//!
//! ```norun
//! #[derive(Clone)]
//! struct Calculator;
//!
//! #[poster]
//! impl Calculator {
//!     pub fn add(&self, a: i32, b: i32) -> i32 { a + b }
//! }
//!
//! // generated: pub fn addAsync(&self, a: i32, b: i32)
//! //                -> async_poster::runtime::JoinHandle<i32>
//! let sum = Calculator.addAsync(1, 2).await?;
//! ```
//!
//! Panics inside the original surface through the returned handle as a
//! `JoinError`, never synchronously at the call site. Instance wrappers clone
//! the receiver into the deferred closure, so annotated types must be
//! `Clone + Send + 'static`.

pub use async_poster_internal::{async_method, async_method_ignore, poster};

/// Execution substrate referenced by generated wrappers by absolute path.
pub mod runtime {
    pub use tokio::task::{spawn_blocking, JoinHandle};
}
