use crate::xml::{escape_attr, escape_text};

use super::{BookInfo, Resource};

/// Build `metadata.opf`.
///
/// The manifest lists the NCX, the stylesheet, one `idN` item per page in
/// reading order and then any extra resources. The spine follows the pages.
pub fn generate_opf(info: &BookInfo, pages: &[String], resources: &[Resource]) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );
    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape_text(&info.title)
    ));
    opf.push_str(&format!(
        "    <dc:creator opf:role=\"aut\">{}</dc:creator>\n",
        escape_text(&info.creator)
    ));
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape_text(&info.language)
    ));
    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape_text(&info.identifier)
    ));
    opf.push_str("  </metadata>\n  <manifest>\n");

    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );
    opf.push_str("    <item id=\"css\" href=\"songbook.css\" media-type=\"text/css\"/>\n");
    for (i, href) in pages.iter().enumerate() {
        opf.push_str(&format!(
            "    <item id=\"id{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
            i + 1,
            escape_attr(href)
        ));
    }
    for (i, resource) in resources.iter().enumerate() {
        opf.push_str(&format!(
            "    <item id=\"res{}\" href=\"{}\" media-type=\"{}\"/>\n",
            i + 1,
            escape_attr(&resource.href),
            escape_attr(&resource.media_type)
        ));
    }

    opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");
    for i in 1..=pages.len() {
        opf.push_str(&format!("    <itemref idref=\"id{i}\"/>\n"));
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}
