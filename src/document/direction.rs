/*!
 * Paragraph direction metadata for right-to-left targets.
 *
 * Both patches are idempotent: a second pass over an already patched part
 * finds every flag in place and changes nothing.
 */

use std::collections::{HashMap, HashSet};

use crate::xml::{NodeId, XmlDocument};

use super::format::{DocumentFormat, ODF_OFFICE_NS, ODF_STYLE_NS, ODF_TEXT_NS, WORDPROCESSING_NS};

/// `w:pPr` children the schema orders after `w:bidi`
const PPR_AFTER_BIDI: &[&str] = &[
    "adjustRightInd",
    "snapToGrid",
    "spacing",
    "ind",
    "contextualSpacing",
    "mirrorIndents",
    "suppressOverlap",
    "jc",
    "textDirection",
    "textAlignment",
    "textboxTightWrap",
    "outlineLvl",
    "divId",
    "cnfStyle",
    "rPr",
    "sectPr",
    "pPrChange",
];

/// Style given to paragraphs that had none
pub const ODF_RTL_STYLE: &str = "RTL_Style";
const ODF_RTL_PREFIX: &str = "RTL_";
const ODF_WRITING_MODE: &str = "rl-tb";

/// Mark every paragraph of the part right-to-left.
/// Returns the number of paragraphs whose metadata changed.
pub fn apply_rtl(format: DocumentFormat, doc: &mut XmlDocument) -> usize {
    match format {
        DocumentFormat::Docx => apply_docx_bidi(doc),
        DocumentFormat::Odt => apply_odt_writing_mode(doc),
    }
}

fn apply_docx_bidi(doc: &mut XmlDocument) -> usize {
    let mut changed = 0;
    for paragraph in doc.elements_named(WORDPROCESSING_NS, "p") {
        let mut touched = false;

        let properties = match doc.find_child(paragraph, WORDPROCESSING_NS, "pPr") {
            Some(properties) => properties,
            None => {
                let name = doc.qualify(paragraph, WORDPROCESSING_NS, "w", "pPr");
                touched = true;
                doc.insert_element(paragraph, 0, &name)
            }
        };

        let bidi = match doc.find_child(properties, WORDPROCESSING_NS, "bidi") {
            Some(bidi) => bidi,
            None => {
                let index = doc
                    .children(properties)
                    .iter()
                    .position(|&child| {
                        doc.namespace(child) == Some(WORDPROCESSING_NS)
                            && doc.local_name(child).is_some_and(|local| PPR_AFTER_BIDI.contains(&local))
                    })
                    .unwrap_or(doc.children(properties).len());
                let name = doc.qualify(properties, WORDPROCESSING_NS, "w", "bidi");
                touched = true;
                doc.insert_element(properties, index, &name)
            }
        };

        let value = doc.qualify(bidi, WORDPROCESSING_NS, "w", "val");
        touched |= doc.set_attribute(bidi, &value, "on");
        if touched {
            changed += 1;
        }
    }
    changed
}

fn apply_odt_writing_mode(doc: &mut XmlDocument) -> usize {
    let mut paragraphs = doc.elements_named(ODF_TEXT_NS, "p");
    paragraphs.extend(doc.elements_named(ODF_TEXT_NS, "h"));
    if paragraphs.is_empty() {
        return 0;
    }
    paragraphs.sort();

    let automatic = automatic_styles(doc);
    let mut styles: HashMap<String, NodeId> = doc
        .child_elements(automatic)
        .filter(|&style| doc.is_named(style, ODF_STYLE_NS, "style"))
        .filter_map(|style| {
            doc.attribute_ns(style, ODF_STYLE_NS, "name")
                .map(|name| (name.to_string(), style))
        })
        .collect();

    let mut marked_styles: HashSet<NodeId> = HashSet::new();
    let mut changed = 0;
    for paragraph in paragraphs {
        let current = doc
            .attribute_ns(paragraph, ODF_TEXT_NS, "style-name")
            .map(str::to_string);

        let (style, retarget) = match current {
            Some(name) if styles.contains_key(&name) => (styles[&name], None),
            Some(name) => {
                let derived = format!("{}{}", ODF_RTL_PREFIX, name);
                let style = derived_style(doc, automatic, &mut styles, &derived, Some(&name));
                (style, Some(derived))
            }
            None => {
                let style = derived_style(doc, automatic, &mut styles, ODF_RTL_STYLE, None);
                (style, Some(ODF_RTL_STYLE.to_string()))
            }
        };

        let mut touched = false;
        if let Some(target) = retarget {
            let attribute = doc.qualify(paragraph, ODF_TEXT_NS, "text", "style-name");
            touched |= doc.set_attribute(paragraph, &attribute, &target);
        }
        if marked_styles.insert(style) {
            touched |= set_writing_mode(doc, style);
        }
        if touched {
            changed += 1;
        }
    }
    changed
}

/// The part's `office:automatic-styles`, created before the body when absent
fn automatic_styles(doc: &mut XmlDocument) -> NodeId {
    let root = doc.root();
    if let Some(existing) = doc.find_child(root, ODF_OFFICE_NS, "automatic-styles") {
        return existing;
    }
    let index = doc
        .children(root)
        .iter()
        .position(|&child| {
            doc.is_named(child, ODF_OFFICE_NS, "body") || doc.is_named(child, ODF_OFFICE_NS, "master-styles")
        })
        .unwrap_or(doc.children(root).len());
    let name = doc.qualify(root, ODF_OFFICE_NS, "office", "automatic-styles");
    doc.insert_element(root, index, &name)
}

fn derived_style(
    doc: &mut XmlDocument,
    automatic: NodeId,
    styles: &mut HashMap<String, NodeId>,
    name: &str,
    parent: Option<&str>,
) -> NodeId {
    if let Some(&existing) = styles.get(name) {
        return existing;
    }
    let element = doc.qualify(automatic, ODF_STYLE_NS, "style", "style");
    let style = doc.append_element(automatic, &element);
    let name_attribute = doc.qualify(style, ODF_STYLE_NS, "style", "name");
    doc.set_attribute(style, &name_attribute, name);
    let family = doc.qualify(style, ODF_STYLE_NS, "style", "family");
    doc.set_attribute(style, &family, "paragraph");
    if let Some(parent) = parent {
        let parent_attribute = doc.qualify(style, ODF_STYLE_NS, "style", "parent-style-name");
        doc.set_attribute(style, &parent_attribute, parent);
    }
    styles.insert(name.to_string(), style);
    style
}

fn set_writing_mode(doc: &mut XmlDocument, style: NodeId) -> bool {
    let (properties, created) = match doc.find_child(style, ODF_STYLE_NS, "paragraph-properties") {
        Some(properties) => (properties, false),
        None => {
            let name = doc.qualify(style, ODF_STYLE_NS, "style", "paragraph-properties");
            (doc.insert_element(style, 0, &name), true)
        }
    };
    let attribute = doc.qualify(properties, ODF_STYLE_NS, "style", "writing-mode");
    doc.set_attribute(properties, &attribute, ODF_WRITING_MODE) || created
}
