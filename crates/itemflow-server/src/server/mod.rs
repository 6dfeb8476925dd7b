mod config;
mod init;
mod runs;
mod state;
pub mod data_models;
pub mod routes;
pub mod utils;

pub use init::{init_router, RouterArgs};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use itemflow::{BatchError, FieldError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
	#[error("Internal server error: `{0}`")]
	InternalError(#[from] anyhow::Error),

	#[error("Validation failed")]
	Validation(Vec<FieldError>),

	#[error("Item not found")]
	ItemNotFound,

	#[error("Batch run not found")]
	RunNotFound,

	#[error("Batch processing failed: {0}")]
	BatchFailed(#[from] BatchError),
}

impl From<itemflow::Error> for ServerError {
	fn from(err: itemflow::Error) -> Self {
		match err {
			itemflow::Error::Validation(errors) => ServerError::Validation(errors),
			itemflow::Error::ItemNotFound(_) => ServerError::ItemNotFound,
			itemflow::Error::Batch(err) => ServerError::BatchFailed(err),
			err => ServerError::InternalError(err.into()),
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		match self {
			ServerError::InternalError(err) => {
				tracing::error!("{err:#}");
				(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
			}
			ServerError::Validation(errors) => {
				let messages = errors.iter().map(ToString::to_string).collect::<Vec<_>>();
				(StatusCode::BAD_REQUEST, Json(messages)).into_response()
			}
			ServerError::ItemNotFound | ServerError::RunNotFound => StatusCode::NOT_FOUND.into_response(),
			ServerError::BatchFailed(err) => {
				(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
			}
		}
	}
}
