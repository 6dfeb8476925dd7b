#![doc = include_str!("../README.md")]

pub mod batch;
pub mod error;
pub mod model;
pub mod service;
pub mod store;
pub mod work;

pub use batch::{
    BatchConfig, BatchCoordinator, BatchError, BatchHandle, BatchResult, FailureCause,
    ItemFailure, ItemOutcome, ItemProcessor, RunId,
};
pub use error::{Error, Result};
pub use model::{FieldError, Item, ItemId, NewItem, STATUS_NEW, STATUS_PROCESSED};
pub use service::ItemService;
pub use store::{InMemoryStore, ItemStore, StoreError};
