use bytes::Bytes;
use thiserror::Error;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Only PDF files are supported")]
    NotPdf,

    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),

    #[error("PDF contains no extractable text")]
    NoText,
}

/// Extracts plain text from an uploaded PDF.
/// Parsing is CPU-bound and runs on the blocking pool.
pub async fn extract_pdf_text(content: Bytes) -> Result<String, DocumentError> {
    if !content.starts_with(PDF_MAGIC) {
        return Err(DocumentError::NotPdf);
    }

    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&content))
        .await
        .map_err(|e| DocumentError::Extraction(e.to_string()))?
        .map_err(|e| DocumentError::Extraction(e.to_string()))?;

    let text = normalize_whitespace(&text);
    if text.is_empty() {
        return Err(DocumentError::NoText);
    }
    Ok(text)
}

/// Collapses runs of blank lines and trims trailing spaces left by PDF layout.
fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}
