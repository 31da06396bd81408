//! Image attachments carried inline as `data:` URIs.

use std::fs;
use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};

use gemchat_core::error::{ChatError, Result};

/// Infers the MIME type from the file extension.
fn infer_mime_type(path: &Path) -> mime_guess::Mime {
    mime_guess::from_path(path).first_or_octet_stream()
}

/// Reads an image file and encodes it as `data:<mime>;base64,<payload>`.
///
/// Only `image/*` types are accepted, matching the chat input's file picker.
pub fn image_data_uri(path: &Path) -> Result<String> {
    let mime = infer_mime_type(path);
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err(ChatError::validation(format!(
            "Not an image: {} ({})",
            path.display(),
            mime
        )));
    }

    let bytes = fs::read(path)
        .map_err(|e| ChatError::io(format!("Failed to read {}: {}", path.display(), e)))?;
    if bytes.is_empty() {
        return Err(ChatError::validation(format!("Empty file: {}", path.display())));
    }

    Ok(format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(&bytes)))
}
