//! Generic XML document store: arena tree, parser and serializer.

pub mod dom;
pub mod parser;
pub mod writer;

pub use dom::{XmlAttribute, XmlDocument, XmlNode, XmlNodeData, XmlNodeId, local_name};
pub use parser::{parse_file, parse_str, unescape};
pub use writer::{XHTML11_DOCTYPE, escape_attr, escape_text, serialize, serialize_node};
