/*!
 * Common test utilities for the yadtwai test suite
 */

use anyhow::Result;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use yadtwai::pipeline::{DocumentTranslator, PipelineOptions};
use yadtwai::providers::mock::MockProvider;

pub const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Default Extension="png" ContentType="image/png"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"</Types>"#
);

/// Bytes that are not valid UTF-8 and must survive untouched
pub const IMAGE_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0xff, 0x00, 0xfe];

pub const ODT_MIMETYPE: &str = "application/vnd.oasis.opendocument.text";

pub const ODT_STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" "#,
    r#"xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" "#,
    r#"xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0">"#,
    r#"<office:master-styles><style:master-page style:name="Standard">"#,
    r#"<style:header><text:p>Page header</text:p></style:header>"#,
    r#"</style:master-page></office:master-styles></office:document-styles>"#
);

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    std::fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Route library logs to the test harness output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Wrap paragraphs in a minimal `word/document.xml`
pub fn docx_document(paragraphs: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
        ),
        paragraphs
    )
}

/// Wrap body content in a minimal ODF `content.xml`
pub fn odt_content(body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" "#,
            r#"xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" "#,
            r#"xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" "#,
            r#"xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" office:version="1.3">"#,
            r#"<office:automatic-styles/>"#,
            r#"<office:body><office:text>{}</office:text></office:body></office:document-content>"#
        ),
        body
    )
}

/// Write a zip archive with the given entries in order
pub fn build_archive(path: &Path, entries: &[(&str, &[u8], CompressionMethod)]) -> Result<PathBuf> {
    let mut zip = ZipWriter::new(File::create(path)?);
    for (name, bytes, method) in entries {
        let options = SimpleFileOptions::default().compression_method(*method);
        zip.start_file(*name, options)?;
        zip.write_all(bytes)?;
    }
    zip.finish()?;
    Ok(path.to_path_buf())
}

/// Creates a DOCX container: content types, body, header and an image
pub fn create_test_docx(dir: &Path, filename: &str, document_xml: &str) -> Result<PathBuf> {
    let header = concat!(
        r#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
        r#"<w:p><w:r><w:t>Header text</w:t></w:r></w:p></w:hdr>"#
    );
    build_archive(
        &dir.join(filename),
        &[
            ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes(), CompressionMethod::Deflated),
            ("word/document.xml", document_xml.as_bytes(), CompressionMethod::Deflated),
            ("word/header1.xml", header.as_bytes(), CompressionMethod::Deflated),
            ("word/media/image1.png", IMAGE_BYTES, CompressionMethod::Stored),
        ],
    )
}

/// Creates an ODT container with the mimetype entry stored first
pub fn create_test_odt(dir: &Path, filename: &str, content_xml: &str) -> Result<PathBuf> {
    let manifest = concat!(
        r#"<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0">"#,
        r#"<manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.text"/>"#,
        r#"</manifest:manifest>"#
    );
    build_archive(
        &dir.join(filename),
        &[
            ("mimetype", ODT_MIMETYPE.as_bytes(), CompressionMethod::Stored),
            ("content.xml", content_xml.as_bytes(), CompressionMethod::Deflated),
            ("styles.xml", ODT_STYLES_XML.as_bytes(), CompressionMethod::Deflated),
            ("META-INF/manifest.xml", manifest.as_bytes(), CompressionMethod::Deflated),
            ("Pictures/image1.png", IMAGE_BYTES, CompressionMethod::Stored),
        ],
    )
}

/// Every entry of an archive as (name, bytes, compression), in order
pub fn read_entries(path: &Path) -> Result<Vec<(String, Vec<u8>, CompressionMethod)>> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        entries.push((entry.name().to_string(), bytes, entry.compression()));
    }
    Ok(entries)
}

/// One entry of an archive as text
pub fn read_entry(path: &Path, name: &str) -> Result<String> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut entry = archive.by_name(name)?;
    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    Ok(text)
}

/// Pipeline options with a private working root inside `dir`
pub fn test_options(dir: &Path) -> PipelineOptions {
    PipelineOptions {
        working_dir: Some(dir.join("work")),
        ..PipelineOptions::default()
    }
}

/// Document translator backed by a mock provider
pub fn mock_translator(provider: MockProvider, options: PipelineOptions) -> DocumentTranslator {
    DocumentTranslator::new(Arc::new(provider), options)
}

/// Whether a working directory still holds any run's working area
pub fn working_areas_left(dir: &Path) -> bool {
    std::fs::read_dir(dir.join("work"))
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
