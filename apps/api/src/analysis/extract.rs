//! Uploaded document → plain text.

use thiserror::Error;

/// Largest upload accepted, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("file exceeds {MAX_UPLOAD_BYTES} bytes")]
    TooLarge,

    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("text file is not valid UTF-8")]
    Encoding,
}

impl DocumentKind {
    /// Decides by content type first, then by file extension.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Result<Self, ExtractError> {
        let content_type = content_type.map(|c| c.trim().to_ascii_lowercase());
        match content_type.as_deref() {
            Some("application/pdf") => return Ok(Self::Pdf),
            Some(c) if c.starts_with("text/plain") => return Ok(Self::PlainText),
            _ => {}
        }

        let extension = file_name
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("txt") => Ok(Self::PlainText),
            _ => Err(ExtractError::Unsupported(
                content_type
                    .or_else(|| file_name.map(str::to_string))
                    .unwrap_or_else(|| "unknown".to_string()),
            )),
        }
    }
}

/// CPU-bound for PDFs. Async callers must run it inside `tokio::task::spawn_blocking`.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ExtractError::TooLarge);
    }

    let text = match kind {
        DocumentKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?
        }
        DocumentKind::PlainText => {
            String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::Encoding)?
        }
    };

    Ok(tidy_whitespace(&text))
}

/// Collapses runs of spaces and blank lines left behind by PDF extraction.
fn tidy_whitespace(text: &str) -> String {
    let mut lines = Vec::new();
    let mut previous_blank = true;
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        let blank = line.is_empty();
        if !(blank && previous_blank) {
            lines.push(line);
        }
        previous_blank = blank;
    }
    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_content_type() {
        assert_eq!(
            DocumentKind::detect(Some("application/pdf"), Some("cv.bin")).unwrap(),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::detect(Some("text/plain; charset=utf-8"), None).unwrap(),
            DocumentKind::PlainText
        );
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        assert_eq!(
            DocumentKind::detect(Some("application/octet-stream"), Some("Resume.PDF")).unwrap(),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::detect(None, Some("resume.txt")).unwrap(),
            DocumentKind::PlainText
        );
        assert!(matches!(
            DocumentKind::detect(Some("image/png"), Some("photo.png")),
            Err(ExtractError::Unsupported(t)) if t == "image/png"
        ));
    }

    #[test]
    fn test_plain_text_is_tidied() {
        let raw = "  Jane   Doe  \n\n\n\nExperience\n   Acme  ";
        let text = extract_text(DocumentKind::PlainText, raw.as_bytes()).unwrap();
        assert_eq!(text, "Jane Doe\n\nExperience\nAcme");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        assert!(matches!(
            extract_text(DocumentKind::PlainText, &[0xff, 0xfe, 0x00]),
            Err(ExtractError::Encoding)
        ));
    }

    #[test]
    fn test_oversized_upload_is_rejected() {
        let bytes = vec![b'a'; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            extract_text(DocumentKind::PlainText, &bytes),
            Err(ExtractError::TooLarge)
        ));
    }

    #[test]
    fn test_garbage_pdf_is_an_error() {
        assert!(matches!(
            extract_text(DocumentKind::Pdf, b"definitely not a pdf"),
            Err(ExtractError::Pdf(_))
        ));
    }
}
