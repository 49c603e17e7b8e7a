//! Base64 data URIs used by file transfer calls
//!
//! `copyFileFrom` returns one, `copyFileTo` expects one:
//! `data:application/zip;base64,UEsDBBQAAAg...`

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Encode bytes as a base64 data URI
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Decoded data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Decode a base64 data URI
pub fn decode(uri: &str) -> anyhow::Result<DataUri> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow::anyhow!("not a data URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("data URI has no payload separator"))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| anyhow::anyhow!("only base64 data URIs are supported"))?;

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| anyhow::anyhow!("Base64 decode failed: {}", e))?;

    Ok(DataUri {
        mime: if mime.is_empty() {
            "application/octet-stream".to_string()
        } else {
            mime.to_string()
        },
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode("text/plain", b"hi"), "data:text/plain;base64,aGk=");
    }

    #[test]
    fn test_decode() {
        let uri = decode("data:application/json;base64,eyJhIjoxfQ==").unwrap();
        assert_eq!(uri.mime, "application/json");
        assert_eq!(uri.bytes, br#"{"a":1}"#);

        let bare = decode("data:;base64,aGk=").unwrap();
        assert_eq!(bare.mime, "application/octet-stream");
    }

    #[test]
    fn test_decode_rejects() {
        assert!(decode("http://example.com").is_err());
        assert!(decode("data:text/plain,hello").is_err());
        assert!(decode("data:text/plain;base64").is_err());
        assert!(decode("data:text/plain;base64,@@@").is_err());
    }
}
