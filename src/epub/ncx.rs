use crate::xml::{escape_attr, escape_text};

use super::{BookInfo, TocEntry};

/// Build `toc.ncx` with one nested `navPoint` per entry, numbered in
/// document order.
pub fn generate_ncx(info: &BookInfo, toc: &[TocEntry]) -> String {
    let mut ncx = String::new();
    let depth = toc.iter().map(TocEntry::depth).max().unwrap_or(1);

    ncx.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1" xml:lang="{}">
  <head>
    <meta name="dtb:uid" content="{}"/>
    <meta name="dtb:depth" content="{depth}"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{}</text>
  </docTitle>
  <navMap>
    <navLabel>
      <text>{}</text>
    </navLabel>
"#,
        escape_attr(&info.language),
        escape_attr(&info.identifier),
        escape_text(&info.title),
        escape_text(&info.toc_title),
    ));

    let mut play_order = 1;
    for entry in toc {
        write_nav_point(&mut ncx, entry, &mut play_order, 2);
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn write_nav_point(ncx: &mut String, entry: &TocEntry, play_order: &mut usize, indent: usize) {
    let pad = "  ".repeat(indent);

    ncx.push_str(&format!(
        "{pad}<navPoint id=\"num_{play_order}\" playOrder=\"{play_order}\">\n"
    ));
    ncx.push_str(&format!(
        "{pad}  <navLabel>\n{pad}    <text>{}</text>\n{pad}  </navLabel>\n",
        escape_text(&entry.title)
    ));
    ncx.push_str(&format!(
        "{pad}  <content src=\"{}\"/>\n",
        escape_attr(&entry.href)
    ));

    *play_order += 1;
    for child in &entry.children {
        write_nav_point(ncx, child, play_order, indent + 1);
    }

    ncx.push_str(&format!("{pad}</navPoint>\n"));
}
