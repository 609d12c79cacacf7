/*!
 * Container validator and repackager.
 *
 * Patched parts are serialized into the working area and parsed again
 * before anything is repackaged, so a broken part never reaches an output
 * archive.
 */

use std::path::Path;

use log::debug;

use crate::container::{ContainerStore, WorkingArea};
use crate::errors::{PipelineError, ValidationError, XmlError};
use crate::xml::{first_illegal_char, XmlDocument};

/// Serialize `doc` and confirm the bytes parse back as XML
pub fn serialize_checked(part: &str, doc: &XmlDocument) -> Result<Vec<u8>, ValidationError> {
    let bytes = doc.to_bytes().map_err(|source| ValidationError {
        part: part.to_string(),
        source,
    })?;
    check_well_formed(part, &bytes)?;
    Ok(bytes)
}

/// Well-formedness check on raw part bytes
///
/// The parser does not police character legality, so the text is also
/// scanned against the XML 1.0 `Char` production.
pub fn check_well_formed(part: &str, bytes: &[u8]) -> Result<(), ValidationError> {
    let invalid = |source| ValidationError {
        part: part.to_string(),
        source,
    };
    XmlDocument::parse_bytes(bytes).map_err(invalid)?;
    let text = std::str::from_utf8(bytes).map_err(|e| invalid(XmlError::Encoding(e.to_string())))?;
    if let Some((position, c)) = first_illegal_char(text) {
        return Err(invalid(XmlError::Malformed {
            position: position as u64,
            message: format!("character U+{:04X} is not allowed in XML", c as u32),
        }));
    }
    Ok(())
}

/// Writes validated parts back and rebuilds the archive
pub struct ContainerValidator<'a> {
    store: &'a ContainerStore,
}

impl<'a> ContainerValidator<'a> {
    pub fn new(store: &'a ContainerStore) -> Self {
        Self { store }
    }

    /// Serialize every modified part into the working area and validate it.
    /// Nothing is written unless all parts pass.
    pub fn write_parts(&self, area: &WorkingArea, parts: &[(String, &XmlDocument)]) -> Result<(), PipelineError> {
        let mut serialized = Vec::with_capacity(parts.len());
        for (name, doc) in parts {
            serialized.push((name, serialize_checked(name, doc)?));
        }
        for (name, bytes) in serialized {
            area.write_part(name, &bytes)?;
            debug!("Wrote validated part '{}' ({} bytes)", name, bytes.len());
        }
        Ok(())
    }

    /// Validate, write back and repackage into `output_path`
    pub fn finalize(
        &self,
        area: &WorkingArea,
        parts: &[(String, &XmlDocument)],
        output_path: &Path,
    ) -> Result<(), PipelineError> {
        self.write_parts(area, parts)?;
        self.store.repackage(area, output_path)?;
        Ok(())
    }
}
