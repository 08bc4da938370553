//! Reading request bodies into the shapes the decoders consume.
//!
//! Every function takes the body by value, so it is released once decoding finishes,
//! whatever the outcome.

use crate::{BoxError, DecodeError, FormError, FormValues};
use bytes::Bytes;
use http_body::Body;
use http_body_util::{BodyDataStream, BodyExt, LengthLimitError, Limited};
use multer::{Constraints, Multipart, SizeLimit};

/// Reads the whole body, failing once more than `limit` bytes arrived.
pub(crate) async fn read_to_bytes_limited<B>(body: B, limit: u64) -> Result<Bytes, DecodeError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let limited = Limited::new(body, usize::try_from(limit).unwrap_or(usize::MAX));
    match limited.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(DecodeError::too_large(limit)),
        Err(e) => Err(DecodeError::body(e)),
    }
}

/// Parses an `application/x-www-form-urlencoded` body.
pub(crate) fn parse_urlencoded(bytes: &[u8]) -> Result<FormValues, DecodeError> {
    let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(bytes)?;
    Ok(pairs.into_iter().collect())
}

/// Collects the text parts of a `multipart/form-data` body, skipping file parts.
pub(crate) async fn read_multipart<B>(content_type: &str, body: B, limit: u64) -> Result<FormValues, FormError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let boundary = multer::parse_boundary(content_type).map_err(DecodeError::from)?;
    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(limit));
    let mut multipart = Multipart::with_constraints(BodyDataStream::new(body), boundary, constraints);

    let mut values = FormValues::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, limit))? {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let text = field.text().await.map_err(|e| multipart_error(e, limit))?;
        values.append(name, text);
    }
    Ok(values)
}

fn multipart_error(e: multer::Error, limit: u64) -> FormError {
    match e {
        multer::Error::StreamSizeExceeded { .. } => FormError::upload_too_large(limit),
        multer::Error::StreamReadFailed(source) => DecodeError::body(source).into(),
        e => DecodeError::from(e).into(),
    }
}
