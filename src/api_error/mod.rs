//! API error normalization
//!
//! Converts every failed request (transport failure or HTTP error response)
//! into one canonical [`ApiError`] shape, and decomposes backend
//! field-validation payloads into [`FieldErrors`].
//!
//! # Overview
//!
//! - [`normalize`] picks a human message from the body and applies fixed
//!   messages for 401, 403, 404, 429 and 5xx responses
//! - [`parse_fields`] maps a validation payload to per-field messages
//! - [`humanize_fields`] flattens those messages into one line
//!
//! Everything here is a pure function and never fails.

mod fields;
mod normalize;

pub use fields::{humanize_fields, parse_fields, FieldErrors, NON_FIELD_KEY};
pub use normalize::{error_message, normalize, ApiError, FailedRequest, UNKNOWN_ERROR_MESSAGE};
