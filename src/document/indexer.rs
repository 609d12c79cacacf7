/*!
 * Text-unit indexer.
 *
 * Walks one part in document order and binds every translatable piece of
 * character data to the exact slot it came from. In leaf mode every
 * non-blank slot becomes its own unit. In paragraph mode the slots of a
 * paragraph are concatenated into one unit; the result is later written to
 * the first slot and the remaining slots are blanked.
 */

use crate::xml::{NodeId, TextPosition, WalkEvent, XmlDocument};

use super::format::{DocumentFormat, Granularity};

/// One translatable span bound to its position in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    /// Sequence number within the part
    pub id: usize,
    /// Slot receiving the translated text
    pub position: TextPosition,
    /// Further slots merged into this unit, blanked on patch
    pub merged: Vec<TextPosition>,
    pub original_text: String,
    pub translated_text: Option<String>,
}

impl TextUnit {
    fn new(id: usize, position: TextPosition, merged: Vec<TextPosition>, original_text: String) -> Self {
        Self {
            id,
            position,
            merged,
            original_text,
            translated_text: None,
        }
    }

    /// All slots this unit covers, in document order
    pub fn positions(&self) -> impl Iterator<Item = TextPosition> + '_ {
        std::iter::once(self.position).chain(self.merged.iter().copied())
    }

    /// Text the patcher will write
    pub fn output_text(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.original_text)
    }
}

/// Slots collected for one open paragraph
struct ParagraphSlots {
    paragraph: NodeId,
    slots: Vec<TextPosition>,
}

/// Produces text units for one part
#[derive(Debug, Clone, Copy)]
pub struct TextUnitIndexer {
    format: DocumentFormat,
    granularity: Granularity,
}

impl TextUnitIndexer {
    pub fn new(format: DocumentFormat, granularity: Granularity) -> Self {
        Self { format, granularity }
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    fn is_text_leaf(&self, doc: &XmlDocument, id: NodeId) -> bool {
        let namespace = self.format.text_namespace();
        self.format
            .text_leaves()
            .iter()
            .any(|local| doc.is_named(id, namespace, local))
    }

    fn is_paragraph(&self, doc: &XmlDocument, id: NodeId) -> bool {
        let namespace = self.format.text_namespace();
        self.format
            .paragraphs()
            .iter()
            .any(|local| doc.is_named(id, namespace, local))
    }

    /// Ordered text units of `doc`
    pub fn index(&self, doc: &XmlDocument) -> Vec<TextUnit> {
        let merge = self.granularity == Granularity::Paragraph;
        let mut units = Vec::new();
        let mut open: Vec<ParagraphSlots> = Vec::new();

        for event in doc.walk(doc.root()) {
            match event {
                WalkEvent::Enter(id) => {
                    if !doc.is_element(id) {
                        continue;
                    }
                    if merge && self.is_paragraph(doc, id) {
                        open.push(ParagraphSlots {
                            paragraph: id,
                            slots: Vec::new(),
                        });
                    }
                    if self.is_text_leaf(doc, id) {
                        let slot = TextPosition::text(id);
                        match open.last_mut() {
                            Some(paragraph) if merge => paragraph.slots.push(slot),
                            _ => push_leaf(doc, &mut units, slot),
                        }
                    }
                }
                WalkEvent::Exit(id) => {
                    if merge && open.last().is_some_and(|p| p.paragraph == id) {
                        if let Some(paragraph) = open.pop() {
                            push_merged(doc, &mut units, paragraph.slots);
                        }
                    }
                    if id == doc.root() || doc.node(id).tail.is_empty() {
                        continue;
                    }

                    // A tail is character data of the parent element
                    let slot = TextPosition::tail(id);
                    let in_text_leaf = doc.parent(id).is_some_and(|parent| self.is_text_leaf(doc, parent));
                    match open.last_mut() {
                        Some(paragraph) if merge && in_text_leaf => paragraph.slots.push(slot),
                        _ => push_leaf(doc, &mut units, slot),
                    }
                }
            }
        }

        units
    }
}

fn push_leaf(doc: &XmlDocument, units: &mut Vec<TextUnit>, slot: TextPosition) {
    let text = doc.slot_text(slot);
    if text.trim().is_empty() {
        return;
    }
    units.push(TextUnit::new(units.len(), slot, Vec::new(), text.to_string()));
}

fn push_merged(doc: &XmlDocument, units: &mut Vec<TextUnit>, slots: Vec<TextPosition>) {
    let mut slots = slots.into_iter().filter(|&slot| !doc.slot_text(slot).is_empty());
    let Some(first) = slots.next() else {
        return;
    };
    let merged: Vec<TextPosition> = slots.collect();

    let mut text = doc.slot_text(first).to_string();
    for &slot in &merged {
        text.push_str(doc.slot_text(slot));
    }
    if text.trim().is_empty() {
        return;
    }
    units.push(TextUnit::new(units.len(), first, merged, text));
}
