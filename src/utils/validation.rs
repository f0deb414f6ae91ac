//! Upload validation for invoice files. Only PDFs are accepted; everything
//! is checked before a single byte reaches a collaborator.

/// File extensions accepted for upload
const ALLOWED_EXTENSIONS: &[&str] = &["pdf"];

/// MIME types a browser may report for a PDF upload
const ALLOWED_MIME_TYPES: &[&str] = &["application/pdf", "application/octet-stream"];

/// Magic bytes of a PDF file: `%PDF`
const PDF_MAGIC: &[u8] = &[0x25, 0x50, 0x44, 0x46];

/// Longest file name we store as an object key
const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn err(code: &'static str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        code,
        message: message.into(),
    }
}

/// Strip any path components and control characters from a client-supplied
/// file name. The result is the bare name used as the object key and the
/// table row name.
pub fn sanitize_filename(raw: &str) -> Result<String, ValidationError> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();

    if name.is_empty() {
        return Err(err("empty_filename", "file name is empty"));
    }
    if name.starts_with('.') {
        return Err(err("hidden_filename", "file name may not start with a dot"));
    }
    if name.len() > MAX_FILENAME_LEN {
        return Err(err(
            "filename_too_long",
            format!("file name exceeds {} characters", MAX_FILENAME_LEN),
        ));
    }

    Ok(name)
}

/// Validate an upload before any storage or table call is made.
/// `header` is the first bytes of the payload for the magic check.
pub fn validate_upload(
    filename: &str,
    content_type: Option<&str>,
    size: usize,
    header: &[u8],
    max_size: usize,
) -> Result<(), ValidationError> {
    let extension = filename
        .rsplit('.')
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(err(
            "extension_not_allowed",
            format!("only PDF files are accepted, got '.{}'", extension),
        ));
    }

    if let Some(ct) = content_type {
        let ct = ct.split(';').next().unwrap_or(ct).trim().to_lowercase();
        if !ALLOWED_MIME_TYPES.contains(&ct.as_str()) {
            return Err(err(
                "mime_not_allowed",
                format!("content type '{}' is not a PDF", ct),
            ));
        }
    }

    if !header.starts_with(PDF_MAGIC) {
        return Err(err(
            "magic_mismatch",
            "file content does not look like a PDF",
        ));
    }

    validate_file_size(size, max_size)
}

pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(err(
            "file_too_large",
            format!("file size {} exceeds the limit of {} bytes", size, max_size),
        ));
    }
    Ok(())
}
