use std::error::Error as StdError;
use thiserror::Error;

/// A type-erased error, as returned by [`Validate::validate`](crate::Validate::validate).
pub type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("malformed content type: {reason}")]
    MalformedContentType { reason: String },

    #[error("decode error: {source}")]
    Decode {
        #[from]
        source: DecodeError,
    },

    #[error("upload size exceed the limit {limit}")]
    UploadTooLarge { limit: u64 },

    /// The error returned by a form's own `validate`, kept as is.
    #[error(transparent)]
    Invalid(BoxError),
}

impl FormError {
    pub fn malformed_content_type<S: ToString>(str: S) -> Self {
        Self::MalformedContentType { reason: str.to_string() }
    }

    pub fn upload_too_large(limit: u64) -> Self {
        Self::UploadTooLarge { limit }
    }

    pub fn invalid<E: Into<BoxError>>(e: E) -> Self {
        Self::Invalid(e.into())
    }

    /// Returns true if the form was decoded but rejected by a `validate` call
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Returns the validation error, if this is one
    pub fn into_invalid(self) -> Option<BoxError> {
        match self {
            Self::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid json body: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid urlencoded body: {source}")]
    UrlEncoded {
        #[from]
        source: serde_urlencoded::de::Error,
    },

    #[error("invalid multipart body: {source}")]
    Multipart {
        #[from]
        source: multer::Error,
    },

    #[error("failed to read body: {source}")]
    Body { source: BoxError },

    #[error("form body size exceed the limit {limit}")]
    TooLarge { limit: u64 },

    #[error("invalid value for field `{key}`: {source}")]
    InvalidField { key: String, source: BoxError },

    #[error("unknown field `{key}`")]
    UnknownField { key: String },

    #[error("missing required field `{key}`")]
    MissingField { key: String },
}

impl DecodeError {
    pub fn body<E: Into<BoxError>>(e: E) -> Self {
        Self::Body { source: e.into() }
    }

    pub fn too_large(limit: u64) -> Self {
        Self::TooLarge { limit }
    }

    pub fn invalid_field<S: ToString, E: Into<BoxError>>(key: S, e: E) -> Self {
        Self::InvalidField { key: key.to_string(), source: e.into() }
    }

    pub fn unknown_field<S: ToString>(key: S) -> Self {
        Self::UnknownField { key: key.to_string() }
    }

    pub fn missing_field<S: ToString>(key: S) -> Self {
        Self::MissingField { key: key.to_string() }
    }
}
