//! Input validation for outgoing requests and local files

/// Extensions the service can extract text from
pub const SUPPORTED_ATTACHMENT_EXTENSIONS: &[&str] = &["pdf", "txt", "doc", "docx"];

/// Upload size limit per attachment
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Validates an attachment before it is queued for sending
pub fn validate_attachment(filename: &str, size: usize) -> Result<(), String> {
    if filename.trim().is_empty() {
        return Err("Attachment name cannot be empty".to_string());
    }

    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or_else(|| format!("Attachment '{}' has no file extension", filename))?;
    if !SUPPORTED_ATTACHMENT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(format!(
            "Unsupported attachment type '.{}' (expected one of: {})",
            ext,
            SUPPORTED_ATTACHMENT_EXTENSIONS.join(", ")
        ));
    }

    if size == 0 {
        return Err(format!("Attachment '{}' is empty", filename));
    }
    if size > MAX_ATTACHMENT_BYTES {
        return Err(format!(
            "Attachment '{}' is too large (max {} MB)",
            filename,
            MAX_ATTACHMENT_BYTES / (1024 * 1024)
        ));
    }

    Ok(())
}

/// MIME type sent for a supported attachment, by extension
pub fn attachment_mime(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Validates the chat service base URL (scheme + host, no trailing path noise)
pub fn validate_api_base_url(url: &str) -> Result<String, String> {
    let url = url.trim();
    if url.is_empty() {
        return Err("Service URL cannot be empty".to_string());
    }

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| "Service URL must start with http:// or https://".to_string())?;

    let host = rest.split('/').next().unwrap_or("");
    if host.is_empty() {
        return Err("Service URL has no host".to_string());
    }
    if host.contains(char::is_whitespace) {
        return Err("Service URL cannot contain spaces".to_string());
    }

    Ok(url.trim_end_matches('/').to_string())
}

/// Sanitize a filename to be filesystem-safe
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned.to_string()
    }
}
