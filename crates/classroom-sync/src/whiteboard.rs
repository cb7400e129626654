//! Shared whiteboard: one image per room, last writer wins.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use classroom_common::{ClientEvent, RoomError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhiteboardState {
    image_data: Option<String>,
    last_writer: Option<String>,
}

impl WhiteboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the board with our own image and return the broadcast for it.
    /// An empty image changes nothing.
    pub fn set_local(&mut self, image: String, username: &str) -> Option<ClientEvent> {
        if image.is_empty() {
            return None;
        }
        self.image_data = Some(image.clone());
        self.last_writer = Some(username.to_string());
        Some(ClientEvent::WhiteboardImage {
            image_url: image,
            username: username.to_string(),
        })
    }

    /// Overwrite with a received image. Returns `false` for an empty payload.
    pub fn apply_remote(&mut self, image: String, writer: String) -> bool {
        if image.is_empty() {
            debug!(writer = %writer, "Ignoring empty whiteboard update");
            return false;
        }
        self.image_data = Some(image);
        self.last_writer = Some(writer);
        true
    }

    pub fn image(&self) -> Option<&str> {
        self.image_data.as_deref()
    }

    pub fn last_writer(&self) -> Option<&str> {
        self.last_writer.as_deref()
    }

    pub fn clear(&mut self) {
        self.image_data = None;
        self.last_writer = None;
    }
}

/// MIME type for an image path, by extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Read an image file into a `data:` URI suitable for `set_local`.
pub async fn load_image_file(path: &Path) -> Result<String, RoomError> {
    let bytes = tokio::fs::read(path).await?;
    if bytes.is_empty() {
        return Err(RoomError::Other(format!(
            "image file is empty: {}",
            path.display()
        )));
    }
    Ok(format!(
        "data:{};base64,{}",
        mime_for_path(path),
        STANDARD.encode(bytes)
    ))
}
