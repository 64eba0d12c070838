use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;

pub const MIMETYPE: &str = "application/epub+zip";

pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="metadata.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// Stylesheet written when the output directory has none.
pub const SONGBOOK_CSS: &str = r#"body {
  font-family: serif;
  margin: 0 1em;
}

h1 {
  font-size: 1.6em;
  margin-bottom: 0.2em;
}

p.authors {
  font-size: 0.8em;
  font-style: italic;
  margin-top: 0;
}

p.verse,
p.chorus {
  margin: 1em 0;
}

p.chorus {
  margin-left: 2em;
}

table {
  border-collapse: collapse;
  margin: 0;
}

td {
  padding: 0;
  white-space: pre;
  vertical-align: bottom;
}

tr.chords_above td {
  font-size: 0.8em;
  font-weight: bold;
}

table.chords_beside td.chords {
  font-size: 0.8em;
  font-weight: bold;
  padding-left: 1em;
}

p.links ul {
  list-style: none;
  padding-left: 0;
}
"#;

/// Stable `urn:uuid:` identifier for a book.
///
/// Derived from the SHA-1 of user and title so repeated builds of the same
/// songbook keep the same identity.
pub fn book_identifier(username: &str, title: &str) -> String {
    let mut hasher = sha1_smol::Sha1::new();
    hasher.update(username.as_bytes());
    hasher.update(b"\0");
    hasher.update(title.as_bytes());
    let digest = hasher.digest().bytes();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    // Name-based UUID, version 5, RFC 4122 variant.
    bytes[6] = (bytes[6] & 0x0f) | 0x50;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "urn:uuid:{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Zip an output directory into an EPUB file.
///
/// The target file is skipped if it lives inside `dir`.
pub fn write_epub<P: AsRef<Path>, Q: AsRef<Path>>(dir: P, path: Q) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let target = fs::canonicalize(path.as_ref())?;

    let files: Vec<PathBuf> = collect_files(dir.as_ref())?
        .into_iter()
        .filter(|f| fs::canonicalize(dir.as_ref().join(f)).ok().as_ref() != Some(&target))
        .collect();
    write_files(dir.as_ref(), &files, file)
}

/// Zip an output directory into any [`Write`] + [`Seek`] destination.
pub fn write_epub_to_writer<W: Write + Seek>(dir: &Path, writer: W) -> Result<()> {
    let files = collect_files(dir)?;
    write_files(dir, &files, writer)
}

fn write_files<W: Write + Seek>(dir: &Path, files: &[PathBuf], writer: W) -> Result<()> {
    let mut zip = ZipWriter::new(writer);

    let options_stored =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let options_deflate =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    // mimetype must be the first entry and uncompressed
    zip.start_file("mimetype", options_stored)?;
    zip.write_all(MIMETYPE.as_bytes())?;

    for relative in files {
        let name = zip_name(relative);
        if name == "mimetype" {
            continue;
        }
        zip.start_file(name.as_str(), options_deflate)?;
        zip.write_all(&fs::read(dir.join(relative))?)?;
    }

    zip.finish()?;
    Ok(())
}

/// All regular files below `dir`, relative to it, in sorted order.
fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut pending = vec![PathBuf::new()];
    while let Some(relative) = pending.pop() {
        let mut entries: Vec<_> =
            fs::read_dir(dir.join(&relative))?.collect::<std::io::Result<_>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let path = relative.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

fn zip_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn test_identifier_is_stable() {
        let a = book_identifier("alice", "My Songbook");
        assert_eq!(a, book_identifier("alice", "My Songbook"));
        assert_ne!(a, book_identifier("bob", "My Songbook"));
        assert!(a.starts_with("urn:uuid:"));
        assert_eq!(a.len(), "urn:uuid:".len() + 36);
        assert_eq!(&a[23..24], "5");
    }

    #[test]
    fn test_zip_has_mimetype_first_and_stored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("META-INF")).unwrap();
        fs::create_dir_all(dir.path().join("text")).unwrap();
        fs::write(dir.path().join("mimetype"), MIMETYPE).unwrap();
        fs::write(dir.path().join("META-INF/container.xml"), CONTAINER_XML).unwrap();
        fs::write(dir.path().join("text/sng_a.xhtml"), "<html/>").unwrap();

        let mut buffer = Cursor::new(Vec::new());
        write_epub_to_writer(dir.path(), &mut buffer).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(buffer.into_inner())).unwrap();
        assert_eq!(archive.len(), 3);
        {
            let first = archive.by_index(0).unwrap();
            assert_eq!(first.name(), "mimetype");
            assert_eq!(first.compression(), zip::CompressionMethod::Stored);
        }
        let mut page = String::new();
        archive
            .by_name("text/sng_a.xhtml")
            .unwrap()
            .read_to_string(&mut page)
            .unwrap();
        assert_eq!(page, "<html/>");
    }

    #[test]
    fn test_epub_inside_output_dir_is_not_zipped_into_itself() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("metadata.opf"), "<package/>").unwrap();
        let target = dir.path().join("book.epub");
        write_epub(dir.path(), &target).unwrap();

        let archive = zip::ZipArchive::new(File::open(&target).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"metadata.opf"));
        assert!(!names.contains(&"book.epub"));
    }
}
