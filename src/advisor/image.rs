use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Serialize, Serializer};

/// Content type assumed when the client sends bare base64 without a data-URL header.
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// An uploaded image, decoded and checked to be `image/*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageError {
    message: String,
}

impl ImageError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ImageError {}

impl ImagePayload {
    /// Parses `data:image/png;base64,AAAA` or a bare base64 string.
    pub fn from_data_url(input: &str) -> Result<Self, ImageError> {
        let input = input.trim();
        let (content_type, encoded) = match input.split_once(',') {
            Some((header, payload)) => (parse_header(header)?, payload),
            None => (DEFAULT_CONTENT_TYPE.to_string(), input),
        };

        if encoded.is_empty() {
            return Err(ImageError::new("image payload is empty"));
        }

        let bytes = BASE64
            .decode(encoded)
            .map_err(|err| ImageError::new(format!("image payload is not valid base64: {err}")))?;

        Ok(Self {
            content_type,
            bytes,
        })
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Raw base64 payload without any data-URL prefix.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.to_base64())
    }
}

impl Serialize for ImagePayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_data_url())
    }
}

fn parse_header(header: &str) -> Result<String, ImageError> {
    let Some(meta) = header.strip_prefix("data:") else {
        return Err(ImageError::new("image must be a data URL or bare base64"));
    };
    let Some(media) = meta.strip_suffix(";base64") else {
        return Err(ImageError::new("image data URL must be base64 encoded"));
    };

    let parsed: mime::Mime = media
        .parse()
        .map_err(|_| ImageError::new(format!("unrecognised image content type: {media}")))?;
    if parsed.type_() != mime::IMAGE {
        return Err(ImageError::new(format!(
            "only image uploads are supported (got {media})"
        )));
    }

    Ok(parsed.essence_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_data_url_prefix() {
        let payload = ImagePayload::from_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(payload.content_type(), "image/png");
        assert_eq!(payload.bytes(), b"hello");
        assert_eq!(payload.to_base64(), "aGVsbG8=");
    }

    #[test]
    fn bare_base64_defaults_to_jpeg() {
        let payload = ImagePayload::from_data_url("aGVsbG8=").unwrap();
        assert_eq!(payload.content_type(), "image/jpeg");
        assert_eq!(payload.to_data_url(), "data:image/jpeg;base64,aGVsbG8=");
    }

    #[test]
    fn rejects_non_image_types() {
        let err = ImagePayload::from_data_url("data:application/pdf;base64,aGVsbG8=").unwrap_err();
        assert!(err.message().contains("only image uploads"));
    }

    #[test]
    fn rejects_invalid_payloads() {
        assert!(ImagePayload::from_data_url("data:image/png;base64,").is_err());
        assert!(ImagePayload::from_data_url("data:image/png;base64,@@@").is_err());
        assert!(ImagePayload::from_data_url("data:image/png,aGVsbG8=").is_err());
    }

    #[test]
    fn serializes_as_data_url() {
        let payload = ImagePayload::from_data_url("data:image/gif;base64,aGk=").unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, "data:image/gif;base64,aGk=");
    }
}
