/*!
 * Per-format constants for the supported container families.
 *
 * A format is a tagged variant, not a trait object: every format-dependent
 * decision in the pipeline is a `match` on `DocumentFormat`.
 */

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::container::{WorkingArea, MIMETYPE_ENTRY};

pub const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const ODF_OFFICE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
pub const ODF_TEXT_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";
pub const ODF_STYLE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:style:1.0";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

const ODT_MIMETYPE: &str = "application/vnd.oasis.opendocument.text";

/// How text leaves are grouped into translation units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One unit per text leaf, keeps run boundaries
    Leaf,
    /// One unit per paragraph, written into the first leaf
    Paragraph,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf => f.write_str("leaf"),
            Self::Paragraph => f.write_str("paragraph"),
        }
    }
}

impl FromStr for Granularity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "leaf" | "run" => Ok(Self::Leaf),
            "paragraph" | "merge" => Ok(Self::Paragraph),
            _ => Err(anyhow!("Invalid granularity: {} (expected 'leaf' or 'paragraph')", s)),
        }
    }
}

/// Supported container families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Office Open XML word-processing document
    Docx,
    /// OpenDocument text
    Odt,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "docx" | "docm" | "dotx" => Some(Self::Docx),
            "odt" | "ott" => Some(Self::Odt),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Detect the format from the extracted archive itself
    pub fn detect(area: &WorkingArea) -> Option<Self> {
        if area.has_part(MIMETYPE_ENTRY) {
            let mimetype = area.read_part(MIMETYPE_ENTRY).ok()?;
            if String::from_utf8_lossy(&mimetype).trim().starts_with(ODT_MIMETYPE) {
                return Some(Self::Odt);
            }
        }
        if area.has_part(Self::Docx.primary_part()) {
            return Some(Self::Docx);
        }
        if area.has_part(Self::Odt.primary_part()) {
            return Some(Self::Odt);
        }
        None
    }

    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Odt => "odt",
        }
    }

    /// Part holding the document body
    pub fn primary_part(&self) -> &'static str {
        match self {
            Self::Docx => "word/document.xml",
            Self::Odt => "content.xml",
        }
    }

    /// Headers, footers and notes that can be translated on request
    pub fn is_auxiliary_part(&self, name: &str) -> bool {
        match self {
            Self::Docx => {
                let Some(file) = name.strip_prefix("word/") else {
                    return false;
                };
                if file.contains('/') || !file.ends_with(".xml") {
                    return false;
                }
                file.starts_with("header")
                    || file.starts_with("footer")
                    || file == "footnotes.xml"
                    || file == "endnotes.xml"
            }
            Self::Odt => name == "styles.xml",
        }
    }

    /// Parts to translate, primary part first
    pub fn target_parts(&self, area: &WorkingArea, include_auxiliary: bool) -> Vec<String> {
        let mut parts = vec![self.primary_part().to_string()];
        if include_auxiliary {
            parts.extend(
                area.part_names()
                    .filter(|name| self.is_auxiliary_part(name))
                    .map(str::to_string),
            );
        }
        parts
    }

    /// Namespace of text leaves and paragraphs
    pub fn text_namespace(&self) -> &'static str {
        match self {
            Self::Docx => WORDPROCESSING_NS,
            Self::Odt => ODF_TEXT_NS,
        }
    }

    /// Local names of elements whose character data is translated
    pub fn text_leaves(&self) -> &'static [&'static str] {
        match self {
            Self::Docx => &["t"],
            Self::Odt => &["p", "h", "span", "a"],
        }
    }

    /// Local names of paragraph-like elements
    pub fn paragraphs(&self) -> &'static [&'static str] {
        match self {
            Self::Docx => &["p"],
            Self::Odt => &["p", "h"],
        }
    }

    pub fn default_granularity(&self) -> Granularity {
        match self {
            Self::Docx => Granularity::Paragraph,
            Self::Odt => Granularity::Leaf,
        }
    }
}
