// SPDX-License-Identifier: Apache-2.0

use crate::{ApiError, ApiErrorCode};

#[must_use]
pub fn map_error(error: &ApiError) -> u16 {
    match error.code {
        ApiErrorCode::MissingField
        | ApiErrorCode::InvalidField
        | ApiErrorCode::InvalidRequestBody
        | ApiErrorCode::InvalidQrPayload
        | ApiErrorCode::InvalidAction
        | ApiErrorCode::InsufficientStock => 400,
        ApiErrorCode::ProductNotFound => 404,
        ApiErrorCode::ProductInactive | ApiErrorCode::DuplicateProduct => 409,
        ApiErrorCode::NotReady => 503,
        ApiErrorCode::StorageFailure | ApiErrorCode::Internal => 500,
    }
}
