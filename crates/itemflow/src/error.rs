use thiserror::Error;

use crate::batch::BatchError;
use crate::model::{FieldError, ItemId};
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Item not found with id: {0}")]
    ItemNotFound(ItemId),

    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Worker pool is closed")]
    PoolClosed,
}

pub type Result<T> = std::result::Result<T, Error>;

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
