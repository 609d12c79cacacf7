/*!
 * End-to-end ODT translation tests
 */

use yadtwai::document::{DocumentFormat, Granularity};
use yadtwai::pipeline::PipelineOptions;
use yadtwai::providers::mock::MockProvider;
use zip::CompressionMethod;

use crate::common;

const BODY: &str = concat!(
    r#"<text:h text:outline-level="1">Title</text:h>"#,
    r#"<text:p>Plain <text:span>bold</text:span> tail</text:p>"#,
    r#"<text:p/>"#
);

#[tokio::test]
async fn test_run_withDefaultGranularity_shouldTranslateLeavesAndTails() {
    common::init_logging();
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_odt(temp_dir.path(), "notes.odt", &common::odt_content(BODY)).unwrap();
    let output = temp_dir.path().join("notes.de.odt");

    let provider = MockProvider::working();
    let report = common::mock_translator(provider.clone(), common::test_options(temp_dir.path()))
        .run(&input, &output, "de")
        .await
        .unwrap();

    assert_eq!(report.format, DocumentFormat::Odt);
    assert_eq!(report.granularity, Granularity::Leaf);
    assert_eq!(report.unit_count(), 4);
    assert_eq!(provider.request_count(), 4);
    assert!(!report.rtl_applied);

    let content = common::read_entry(&output, "content.xml").unwrap();
    assert!(content.contains(r#"<text:h text:outline-level="1">[TRANSLATED to de] Title</text:h>"#));
    assert!(content.contains("<text:p>[TRANSLATED to de] Plain <text:span>[TRANSLATED to de] bold</text:span>"));
    assert!(content.contains("<text:p/>"));
    assert!(!content.contains("writing-mode"));
}

#[tokio::test]
async fn test_run_shouldWriteMimetypeFirstAndStored() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_odt(temp_dir.path(), "notes.odt", &common::odt_content(BODY)).unwrap();
    let output = temp_dir.path().join("notes.fr.odt");

    common::mock_translator(MockProvider::working(), common::test_options(temp_dir.path()))
        .run(&input, &output, "fr")
        .await
        .unwrap();

    let entries = common::read_entries(&output).unwrap();
    assert_eq!(entries[0].0, "mimetype");
    assert_eq!(entries[0].1, common::ODT_MIMETYPE.as_bytes());
    assert_eq!(entries[0].2, CompressionMethod::Stored);

    let styles = entries.iter().find(|e| e.0 == "styles.xml").unwrap();
    assert_eq!(styles.1, common::ODT_STYLES_XML.as_bytes());
    let picture = entries.iter().find(|e| e.0 == "Pictures/image1.png").unwrap();
    assert_eq!(picture.1, common::IMAGE_BYTES);
}

#[tokio::test]
async fn test_run_withAuxiliaryParts_shouldTranslateStyles() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_odt(temp_dir.path(), "notes.odt", &common::odt_content(BODY)).unwrap();
    let output = temp_dir.path().join("notes.pt.odt");

    let options = PipelineOptions {
        include_auxiliary_parts: true,
        ..common::test_options(temp_dir.path())
    };
    let report = common::mock_translator(MockProvider::working(), options)
        .run(&input, &output, "pt")
        .await
        .unwrap();

    assert_eq!(report.parts.len(), 2);
    let styles = common::read_entry(&output, "styles.xml").unwrap();
    assert!(styles.contains("<text:p>[TRANSLATED to pt] Page header</text:p>"));
}

#[tokio::test]
async fn test_run_withParagraphGranularity_shouldMergeSpans() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_odt(temp_dir.path(), "notes.odt", &common::odt_content(BODY)).unwrap();
    let output = temp_dir.path().join("notes.nl.odt");

    let options = PipelineOptions {
        granularity: Some(Granularity::Paragraph),
        ..common::test_options(temp_dir.path())
    };
    let report = common::mock_translator(MockProvider::working(), options)
        .run(&input, &output, "nl")
        .await
        .unwrap();

    assert_eq!(report.unit_count(), 2);
    let content = common::read_entry(&output, "content.xml").unwrap();
    assert!(content.contains("<text:p>[TRANSLATED to nl] Plain bold tail<text:span/></text:p>"));
}

#[tokio::test]
async fn test_run_withHebrewTarget_shouldSetRightToLeftWritingMode() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_odt(temp_dir.path(), "notes.odt", &common::odt_content(BODY)).unwrap();
    let output = temp_dir.path().join("notes.he.odt");

    let report = common::mock_translator(MockProvider::working(), common::test_options(temp_dir.path()))
        .run(&input, &output, "heb")
        .await
        .unwrap();

    assert!(report.rtl_applied);
    assert_eq!(report.parts[0].paragraphs_marked, 3);
    let content = common::read_entry(&output, "content.xml").unwrap();
    assert!(content.contains(r#"style:writing-mode="rl-tb""#));
    assert_eq!(content.matches(r#"text:style-name="RTL_Style""#).count(), 3);
}

#[tokio::test]
async fn test_run_withForcedLeftToRight_shouldSkipDirection() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_odt(temp_dir.path(), "notes.odt", &common::odt_content(BODY)).unwrap();
    let output = temp_dir.path().join("notes.ar.odt");

    let options = PipelineOptions {
        force_rtl: Some(false),
        ..common::test_options(temp_dir.path())
    };
    let report = common::mock_translator(MockProvider::working(), options)
        .run(&input, &output, "ar")
        .await
        .unwrap();

    assert!(!report.rtl_applied);
    assert!(!common::read_entry(&output, "content.xml").unwrap().contains("writing-mode"));
}

#[tokio::test]
async fn test_run_withOdtRenamedToZip_shouldDetectFormatFromMimetype() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_odt(temp_dir.path(), "notes.zip", &common::odt_content(BODY)).unwrap();
    let output = temp_dir.path().join("notes.fr.zip");

    let report = common::mock_translator(MockProvider::working(), common::test_options(temp_dir.path()))
        .run(&input, &output, "fr")
        .await
        .unwrap();
    assert_eq!(report.format, DocumentFormat::Odt);
    assert_eq!(report.unit_count(), 4);
}
