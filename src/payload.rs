//! Data-URI image payloads: the Base64 blobs the app used to store inline
//! in the thumbnail column.
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Marker every inline image payload starts with. Doubles as the client
/// side of the `LIKE 'data:image%'` selection filter.
pub const PREFIX: &str = "data:image";

/// Why a payload could not be decoded. Always a per-row failure, never a
/// setup failure: the row is counted and skipped.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("data-uri marker present but no comma delimiter")]
    MissingComma,
    #[error("empty base64 payload")]
    Empty,
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// True when the value still carries an inline payload rather than a
/// storage pointer.
pub fn is_data_uri(value: &str) -> bool {
    value.starts_with(PREFIX)
}

/// Decode an image payload to raw bytes.
///
/// A data URI is split once on the first comma and the remainder decoded;
/// anything else is treated as bare Base64.
pub fn decode(value: &str) -> Result<Vec<u8>, DecodeError> {
    let b64 = if is_data_uri(value) {
        value.split_once(',').ok_or(DecodeError::MissingComma)?.1
    } else {
        value
    };
    let b64 = b64.trim();
    if b64.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(BASE64.decode(b64)?)
}

/// Render raw image bytes as a data URI, e.g. `encode(bytes, "jpeg")`.
pub fn encode(bytes: &[u8], subtype: &str) -> String {
    format!("data:image/{};base64,{}", subtype, BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_round_trips_the_trailing_payload() {
        let bytes = b"\xff\xd8\xff\xe0 fake jpeg";
        let uri = encode(bytes, "jpeg");
        assert_eq!(decode(&uri).unwrap(), bytes);
    }

    #[test]
    fn bare_base64_is_accepted() {
        let b64 = BASE64.encode(b"payload");
        assert_eq!(decode(&b64).unwrap(), b"payload");
    }

    #[test]
    fn marker_without_comma_fails() {
        assert!(matches!(
            decode("data:image/jpeg;base64"),
            Err(DecodeError::MissingComma)
        ));
    }

    #[test]
    fn empty_payload_fails() {
        assert!(matches!(decode("data:image/jpeg;base64,"), Err(DecodeError::Empty)));
        assert!(matches!(decode(""), Err(DecodeError::Empty)));
    }

    #[test]
    fn invalid_base64_fails() {
        assert!(matches!(
            decode("data:image/jpeg;base64,not!!valid@@"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn storage_pointers_are_not_data_uris() {
        assert!(is_data_uri("data:image/png;base64,AAAA"));
        assert!(!is_data_uri("/api/images/13.jpg"));
    }
}
