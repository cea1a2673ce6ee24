use crate::{ExportError, ExportOptions, Manuscript};

/// Something which can turn a manuscript into pdf bytes.
///
/// Each export calls `render_pdf` once and blocks until it returns;
/// an implementation must have released every scratch file and subordinate process
/// it acquired by the time it does, whether it succeeded or not.
pub trait PdfRenderer: Send + Sync {
    /// short name for logs
    fn name(&self) -> &'static str;

    /// Render the complete pdf; nothing partial is ever returned
    fn render_pdf(
        &self,
        manuscript: &Manuscript,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, ExportError>;
}

/// The payload of an export
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactBody {
    #[allow(missing_docs)]
    Pdf(Vec<u8>),
    #[allow(missing_docs)]
    Html(String),
}

/// The finished result of an export, with the filename it should be saved under
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedArtifact {
    #[allow(missing_docs)]
    pub body: ArtifactBody,
    /// `<sanitized title>.pdf` or `<sanitized title>.html`
    pub filename: String,
}

impl RenderedArtifact {
    /// A pdf artifact
    pub fn pdf<S: Into<String>>(bytes: Vec<u8>, filename: S) -> Self {
        RenderedArtifact {
            body: ArtifactBody::Pdf(bytes),
            filename: filename.into(),
        }
    }

    /// An html artifact
    pub fn html<S: Into<String>>(text: String, filename: S) -> Self {
        RenderedArtifact {
            body: ArtifactBody::Html(text),
            filename: filename.into(),
        }
    }

    /// Mime type to serve this artifact with
    pub fn content_type(&self) -> &'static str {
        match self.body {
            ArtifactBody::Pdf(_) => "application/pdf",
            ArtifactBody::Html(_) => "text/html; charset=utf-8",
        }
    }

    /// Whether this is a binary payload
    pub fn is_binary(&self) -> bool {
        matches!(self.body, ArtifactBody::Pdf(_))
    }

    #[allow(missing_docs)]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.body {
            ArtifactBody::Pdf(bytes) => bytes,
            ArtifactBody::Html(text) => text.as_bytes(),
        }
    }

    #[allow(missing_docs)]
    pub fn into_bytes(self) -> Vec<u8> {
        match self.body {
            ArtifactBody::Pdf(bytes) => bytes,
            ArtifactBody::Html(text) => text.into_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        let pdf = RenderedArtifact::pdf(b"%PDF-1.7".to_vec(), "a.pdf");
        assert_eq!(pdf.content_type(), "application/pdf");
        assert!(pdf.is_binary());
        let html = RenderedArtifact::html("<html></html>".into(), "a.html");
        assert!(html.content_type().starts_with("text/html"));
        assert_eq!(html.as_bytes(), b"<html></html>");
        assert_eq!(html.into_bytes(), b"<html></html>".to_vec());
    }
}
