//! Image hosting: store PNG bytes, get back a reference string.

use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::error::{QuoteError, Result};

const VOID_CAT_URL: &str = "https://void.cat/upload?cli=true";

pub trait Uploader {
    fn store(&self, png: &[u8]) -> Result<String>;
}

/// void.cat anonymous upload; the response body is the file reference
pub struct VoidCatUploader {
    url: String,
    timeout: Duration,
}

impl VoidCatUploader {
    pub fn new(timeout: Duration) -> Self {
        Self::with_url(VOID_CAT_URL, timeout)
    }

    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

impl Uploader for VoidCatUploader {
    fn store(&self, png: &[u8]) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| QuoteError::Upload(format!("Failed to create client: {}", e)))?;

        let response = client
            .post(&self.url)
            .header("V-Content-Type", "image/png")
            .header("V-Full-Digest", content_digest(png))
            .header("V-Filename", "image.png")
            .body(png.to_vec())
            .send()
            .map_err(|e| QuoteError::Upload(format!("Failed to send: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| QuoteError::Upload(format!("Failed to read body: {}", e)))?;
        if !status.is_success() {
            return Err(QuoteError::Upload(format!("{} - {}", status, body.trim())));
        }

        reference_from_body(&body)
    }
}

/// Lowercase hex SHA-256 of the payload
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn reference_from_body(body: &str) -> Result<String> {
    let reference = body.trim();
    if reference.is_empty() || reference.contains(char::is_whitespace) {
        return Err(QuoteError::Upload(format!(
            "unusable response: {:?}",
            reference
        )));
    }
    Ok(reference.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_digest() {
        assert_eq!(
            content_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_reference_from_body() {
        assert_eq!(
            reference_from_body("https://void.cat/d/AbC\n").unwrap(),
            "https://void.cat/d/AbC"
        );
        assert!(reference_from_body("  \n").is_err());
        assert!(reference_from_body("<html> error page </html>").is_err());
    }
}
