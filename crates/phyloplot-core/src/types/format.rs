//! Output formats supported by the external renderer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Image format of the rendered tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Portable Network Graphics.
    #[default]
    Png,
    /// Portable Document Format.
    Pdf,
    /// Scalable Vector Graphics.
    Svg,
    /// Tagged Image File Format.
    Tiff,
}

impl OutputFormat {
    /// All formats, in the order they are offered to users.
    pub const ALL: [OutputFormat; 4] = [Self::Png, Self::Pdf, Self::Svg, Self::Tiff];

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Svg => "svg",
            Self::Tiff => "tiff",
        }
    }

    /// MIME type of an artifact in this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
            Self::Svg => "image/svg+xml",
            Self::Tiff => "image/tiff",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Returned when a string names none of the supported formats.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported output format '{0}' (expected one of png, pdf, svg, tiff)")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == normalized)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}
