/*!
 * XML document model used by the document pipeline.
 */

pub mod tree;

pub use tree::{
    first_illegal_char, is_xml_char, Attribute, NodeId, NodeKind, TextPosition, TextSlot, WalkEvent, XmlDocument, XmlNode,
};
