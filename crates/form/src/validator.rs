//! Body dispatch: pick a decoder from the request's content type, decode, then validate.

use crate::body::{parse_urlencoded, read_multipart, read_to_bytes_limited};
use crate::upload::{Limits, UploadPolicy};
use crate::{BoxError, DecodeError, FieldDecoder, Fields, Form, FormError, FormValues, Validate};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, Request};
use http_body::Body;
use mime::Mime;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, trace};

/// The body formats a request can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Multipart,
    /// `application/x-www-form-urlencoded`, also used for any other or missing content type,
    /// in which case the body is not read
    UrlEncoded,
}

impl BodyKind {
    /// Selects the body format from the `Content-Type` header.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, FormError> {
        let Some(value) = headers.get(CONTENT_TYPE) else {
            return Ok(BodyKind::UrlEncoded);
        };
        let value = value.to_str().map_err(FormError::malformed_content_type)?;
        if value.trim().is_empty() {
            return Ok(BodyKind::UrlEncoded);
        }

        let media_type = value.parse::<Mime>().map_err(FormError::malformed_content_type)?;
        let essence = media_type.essence_str();
        if essence.eq_ignore_ascii_case(mime::APPLICATION_JSON.essence_str()) {
            Ok(BodyKind::Json)
        } else if essence.eq_ignore_ascii_case(mime::MULTIPART_FORM_DATA.essence_str()) {
            Ok(BodyKind::Multipart)
        } else {
            Ok(BodyKind::UrlEncoded)
        }
    }
}

/// Decodes request bodies into forms and validates them.
///
/// A `Validator` owns the schema cache and the upload limits, so independent validators never
/// share state. The free functions of this crate use a process-wide instance, see
/// [`Validator::global`].
///
/// # Example
/// ```
/// use bytes::Bytes;
/// use http::Request;
/// use http_body_util::Full;
/// use micro_form::{BoxError, Form, Validate, Validator};
///
/// #[derive(Debug, Default, serde::Deserialize, Form)]
/// struct Login {
///     #[form(required)]
///     user: String,
///     remember: bool,
/// }
///
/// impl Validate for Login {
///     fn validate(&self) -> Result<(), BoxError> {
///         if self.user.contains(' ') {
///             return Err("user must not contain spaces".into());
///         }
///         Ok(())
///     }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let validator = Validator::builder().max_form_size(1024).build();
/// let request = Request::post("/login")
///     .header("content-type", "application/x-www-form-urlencoded")
///     .body(Full::new(Bytes::from_static(b"user=zava&remember=on")))
///     .unwrap();
///
/// let login: Login = validator.validate_request(request).await.unwrap();
/// assert_eq!(login.user, "zava");
/// assert!(login.remember);
/// # });
/// ```
#[derive(Default)]
pub struct Validator {
    decoder: FieldDecoder,
    policy: UploadPolicy,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    /// Returns the process-wide validator used by the free functions of this crate
    pub fn global() -> &'static Validator {
        &crate::GLOBAL_VALIDATOR
    }

    pub fn decoder(&self) -> &FieldDecoder {
        &self.decoder
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Decodes the request body according to its content type and validates the result.
    ///
    /// Missing or unrecognized content types go through [`validate_form`](Self::validate_form),
    /// which only reads urlencoded bodies; a content type that cannot be parsed fails with
    /// [`FormError::MalformedContentType`] before the body is read.
    pub async fn validate_request<T, B>(&self, req: Request<B>) -> Result<T, FormError>
    where
        T: Form + DeserializeOwned,
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let kind = BodyKind::from_headers(req.headers()).inspect_err(|e| debug!(cause = %e, "reject request body"))?;
        trace!(?kind, "dispatch request body");
        match kind {
            BodyKind::Json => self.validate_json(req).await,
            BodyKind::Multipart => self.validate_multipart(req).await,
            BodyKind::UrlEncoded => self.validate_form(req).await,
        }
    }

    /// Decodes the request body as JSON and validates the result.
    ///
    /// The body is capped at the policy's form size.
    pub async fn validate_json<T, B>(&self, req: Request<B>) -> Result<T, FormError>
    where
        T: DeserializeOwned + Validate + Fields,
        B: Body,
        B::Error: Into<BoxError>,
    {
        let bytes = read_to_bytes_limited(req.into_body(), self.policy.max_form_size()).await?;
        let form = serde_json::from_slice::<T>(&bytes).map_err(DecodeError::from)?;
        checked(form)
    }

    /// Decodes the request body as an urlencoded form and validates the result.
    ///
    /// Only `POST`, `PUT` and `PATCH` bodies sent as `application/x-www-form-urlencoded` are
    /// read; anything else decodes an empty form.
    pub async fn validate_form<T, B>(&self, req: Request<B>) -> Result<T, FormError>
    where
        T: Form,
        B: Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        let values = if has_form_body(&parts.method) && is_urlencoded(&parts.headers) {
            let bytes = read_to_bytes_limited(body, self.policy.max_form_size()).await?;
            parse_urlencoded(&bytes)?
        } else {
            trace!(method = %parts.method, "no urlencoded body, decode an empty form");
            FormValues::new()
        };
        self.decode_values(&values)
    }

    /// Decodes the request body as `multipart/form-data` and validates the result.
    ///
    /// The body may not exceed `T::MAX_UPLOAD_SIZE`, or the policy's upload size when the type
    /// sets none. File parts are skipped.
    pub async fn validate_multipart<T, B>(&self, req: Request<B>) -> Result<T, FormError>
    where
        T: Form,
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let limit = self.policy.upload_limit_for(T::MAX_UPLOAD_SIZE);
        let (parts, body) = req.into_parts();
        let content_type = parts.headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).unwrap_or_default();
        let values = read_multipart(content_type, body, limit).await?;
        self.decode_values(&values)
    }

    /// Decodes already parsed form values into a new `T` and validates it
    pub fn decode_values<T: Form>(&self, values: &FormValues) -> Result<T, FormError> {
        let mut form = T::default();
        self.decoder.decode(&mut form, values).inspect_err(|e| debug!(cause = %e, "failed to decode form"))?;
        checked(form)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("limits", &self.policy.limits())
            .field("cached_schemas", &self.decoder.cached_schemas())
            .finish()
    }
}

fn has_form_body(method: &Method) -> bool {
    method == Method::POST || method == Method::PUT || method == Method::PATCH
}

fn is_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Mime>().ok())
        .is_some_and(|media_type| {
            media_type.essence_str().eq_ignore_ascii_case(mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
        })
}

fn checked<T>(form: T) -> Result<T, FormError>
where
    T: Validate + Fields,
{
    match crate::validate(&form) {
        Ok(()) => Ok(form),
        Err(e) => {
            debug!(cause = %e, "form rejected");
            Err(FormError::Invalid(e))
        }
    }
}

#[derive(Debug, Default)]
pub struct ValidatorBuilder {
    limits: Limits,
    ignore_unknown_keys: bool,
}

impl ValidatorBuilder {
    fn new() -> Self {
        Self::default()
    }

    pub fn max_upload_size(mut self, size: u64) -> Self {
        self.limits.max_upload_size = size;
        self
    }

    pub fn max_form_size(mut self, size: u64) -> Self {
        self.limits.max_form_size = size;
        self
    }

    pub fn ignore_unknown_keys(mut self, ignore: bool) -> Self {
        self.ignore_unknown_keys = ignore;
        self
    }

    pub fn build(self) -> Validator {
        Validator {
            decoder: FieldDecoder::new().ignore_unknown_keys(self.ignore_unknown_keys),
            policy: UploadPolicy::new(self.limits),
        }
    }
}
