//! Decode and validate HTTP request bodies into typed forms.
//!
//! This crate turns the body of an [`http::Request`] into a caller-defined structure and then
//! validates that structure, nested components first.
//!
//! # Features
//!
//! - Content type dispatch between JSON, `application/x-www-form-urlencoded` and
//!   `multipart/form-data` bodies
//! - A form decoder mapping flat, possibly repeated keys onto struct fields, with embedded
//!   (flattened) and nested (`parent.child`) structures; field metadata is cached per type
//! - Depth-first, fail-fast validation through the [`Validate`] and [`Fields`] traits
//! - A shared, runtime adjustable upload ceiling with per-type overrides
//!
//! # Example
//!
//! ```no_run
//! use http::Request;
//! use http_body_util::Full;
//! use bytes::Bytes;
//! use micro_form::{BoxError, Form, Validate};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize, Form)]
//! struct Signup {
//!     #[form(required)]
//!     name: String,
//!     age: u8,
//!     #[serde(flatten)]
//!     #[form(embed)]
//!     contact: Contact,
//! }
//!
//! #[derive(Debug, Default, Deserialize, Form)]
//! struct Contact {
//!     email: String,
//! }
//!
//! impl Validate for Signup {
//!     fn validate(&self) -> Result<(), BoxError> {
//!         if self.age < 18 {
//!             return Err("must be an adult".into());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Validate for Contact {
//!     fn validate(&self) -> Result<(), BoxError> {
//!         if !self.email.contains('@') {
//!             return Err("invalid email".into());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! async fn handle(req: Request<Full<Bytes>>) -> String {
//!     match micro_form::validate_request::<Signup, _>(req).await {
//!         Ok(signup) => format!("welcome {}", signup.name),
//!         Err(e) => format!("rejected: {e}"),
//!     }
//! }
//! ```

// lets the derive output name `::micro_form` from inside this crate
extern crate self as micro_form;

mod body;
mod error;
mod upload;
mod validate;
mod validator;

pub mod decode;

pub use decode::{Decode, FieldDecoder, FormValue, FormValues, Schema, SchemaBuilder};
pub use error::{BoxError, DecodeError, FormError};
pub use upload::{DEFAULT_MAX_FORM_SIZE, DEFAULT_MAX_UPLOAD_SIZE, Limits, UploadPolicy};
pub use validate::{Fields, Validate, validate};
pub use validator::{BodyKind, Validator, ValidatorBuilder};

#[cfg(feature = "derive")]
pub use micro_form_derive::{Fields, Form};

use bytes::Bytes;
use http::Request;
use http_body::Body;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;

/// A structure that can be decoded from any supported body and validated.
///
/// Implemented for every type with `#[derive(Form)]`, a [`Validate`] impl and a `Default`.
pub trait Form: Decode + Fields + Validate + Default + 'static {}

impl<T> Form for T where T: Decode + Fields + Validate + Default + 'static {}

static GLOBAL_VALIDATOR: Lazy<Validator> = Lazy::new(Validator::new);

/// Decodes the request body according to its content type and validates the result,
/// see [`Validator::validate_request`].
pub async fn validate_request<T, B>(req: Request<B>) -> Result<T, FormError>
where
    T: Form + DeserializeOwned,
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    GLOBAL_VALIDATOR.validate_request(req).await
}

/// Decodes the request body as JSON and validates the result
pub async fn validate_json<T, B>(req: Request<B>) -> Result<T, FormError>
where
    T: DeserializeOwned + Validate + Fields,
    B: Body,
    B::Error: Into<BoxError>,
{
    GLOBAL_VALIDATOR.validate_json(req).await
}

/// Decodes the request body as an urlencoded form and validates the result
pub async fn validate_form<T, B>(req: Request<B>) -> Result<T, FormError>
where
    T: Form,
    B: Body,
    B::Error: Into<BoxError>,
{
    GLOBAL_VALIDATOR.validate_form(req).await
}

/// Decodes the request body as `multipart/form-data` and validates the result
pub async fn validate_multipart<T, B>(req: Request<B>) -> Result<T, FormError>
where
    T: Form,
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    GLOBAL_VALIDATOR.validate_multipart(req).await
}

/// Sets the process-wide multipart upload ceiling in bytes
pub fn set_max_upload_size(size: u64) {
    GLOBAL_VALIDATOR.policy().set_max_upload_size(size);
}

/// Returns the process-wide multipart upload ceiling in bytes
pub fn max_upload_size() -> u64 {
    GLOBAL_VALIDATOR.policy().max_upload_size()
}
