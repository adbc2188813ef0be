use base64::{engine::general_purpose, Engine as _};

/// MIME type sniffed from file content, if recognisable.
pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn is_supported_upload(mime_type: &str) -> bool {
    matches!(mime_type, "image/jpeg" | "image/png")
}

/// Inline data URI for the vision request. The payload is always labelled
/// JPEG; vision endpoints sniff the actual bytes.
pub fn encode_image_data_uri(image_bytes: &[u8]) -> String {
    let encoded = general_purpose::STANDARD.encode(image_bytes);
    format!("data:image/jpeg;base64,{encoded}")
}
