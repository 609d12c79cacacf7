/*!
 * Structural patcher: writes unit results back into their recorded slots
 * and applies paragraph direction for right-to-left targets.
 */

use log::debug;

use crate::xml::{TextPosition, TextSlot, XmlDocument};

use super::direction;
use super::format::{DocumentFormat, WORDPROCESSING_NS, XML_NS};
use super::indexer::TextUnit;

/// What a patch pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchSummary {
    /// Slots whose character data changed
    pub slots_written: usize,
    /// Paragraphs whose direction metadata changed
    pub paragraphs_marked: usize,
}

impl PatchSummary {
    pub fn changed(&self) -> bool {
        self.slots_written > 0 || self.paragraphs_marked > 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StructuralPatcher {
    format: DocumentFormat,
}

impl StructuralPatcher {
    pub fn new(format: DocumentFormat) -> Self {
        Self { format }
    }

    /// Write every unit's output text to its own slot; merged slots are blanked
    ///
    /// A unit whose translation equals its original (failed units included)
    /// is skipped, so its runs keep their own text.
    pub fn patch(&self, doc: &mut XmlDocument, units: &[TextUnit], rtl: bool) -> PatchSummary {
        let mut summary = PatchSummary::default();

        for unit in units {
            let Some(translated) = unit.translated_text.as_deref() else {
                continue;
            };
            if translated == unit.original_text {
                continue;
            }
            if self.write_slot(doc, unit.position, translated) {
                summary.slots_written += 1;
            }
            for &slot in &unit.merged {
                if self.write_slot(doc, slot, "") {
                    summary.slots_written += 1;
                }
            }
        }

        if rtl {
            summary.paragraphs_marked = direction::apply_rtl(self.format, doc);
        }
        debug!(
            "Patched {} slots, marked {} paragraphs right-to-left",
            summary.slots_written, summary.paragraphs_marked
        );
        summary
    }

    fn write_slot(&self, doc: &mut XmlDocument, position: TextPosition, text: &str) -> bool {
        if doc.slot_text(position) == text {
            return false;
        }
        doc.set_slot_text(position, text);

        // Word drops edge whitespace of w:t unless it is marked preserved
        if self.format == DocumentFormat::Docx
            && position.slot == TextSlot::Text
            && text.trim() != text
            && doc.is_named(position.node, WORDPROCESSING_NS, "t")
            && doc.attribute_ns(position.node, XML_NS, "space") != Some("preserve")
        {
            doc.set_attribute(position.node, "xml:space", "preserve");
        }
        true
    }
}
