//! Long-lived, bounded worker pool.
//!
//! A [`WorkerPool`] owns a fixed number of tokio tasks that pull
//! [`QueueEntry`]s off one shared channel and run them through a
//! [`JobHandler`]. Callers submit work through a cheap [`Client`] and get a
//! oneshot receiver back for each job.

mod client;
mod entry;
mod handler;
mod worker;

pub use client::Client;
pub use entry::{JobId, QueueEntry};
pub use handler::JobHandler;
pub use worker::{PoolConfig, WorkerPool};
