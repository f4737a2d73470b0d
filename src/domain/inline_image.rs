use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/png";

#[derive(Debug, thiserror::Error)]
pub enum InlineImageError {
    #[error("malformed data uri")]
    MalformedDataUri,
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Raw image bytes plus their MIME type, as exchanged with the image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn from_base64(mime_type: Option<&str>, data: &str) -> Result<Self, InlineImageError> {
        let bytes = STANDARD.decode(data.trim())?;
        Ok(Self::new(mime_type.unwrap_or(DEFAULT_IMAGE_MIME_TYPE), bytes))
    }

    /// Accepts either `data:<mime>;base64,<payload>` or a bare base64 payload.
    pub fn parse(input: &str) -> Result<Self, InlineImageError> {
        let Some(rest) = input.strip_prefix("data:") else {
            return Self::from_base64(None, input);
        };

        let (header, payload) = rest
            .split_once(',')
            .ok_or(InlineImageError::MalformedDataUri)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(InlineImageError::MalformedDataUri)?;
        let mime_type = (!mime_type.is_empty()).then_some(mime_type);

        Self::from_base64(mime_type, payload)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Markdown block appended to an assistant message that carries this image.
    pub fn to_markdown(&self) -> String {
        format!("\n\n![Generated Image]({})", self.to_data_uri())
    }
}
