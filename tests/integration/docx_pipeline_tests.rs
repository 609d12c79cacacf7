/*!
 * End-to-end DOCX translation tests
 */

use yadtwai::container::ContainerStore;
use yadtwai::document::{ContainerValidator, Granularity};
use yadtwai::errors::{ContainerError, PipelineError, RunStage, XmlError};
use yadtwai::xml::{TextPosition, XmlDocument};
use yadtwai::pipeline::PipelineOptions;
use yadtwai::providers::mock::MockProvider;

use crate::common;

const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const RUNS_PARAGRAPH: &str = concat!(
    r#"<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r>"#,
    r#"<w:r><w:rPr><w:b/></w:rPr><w:t>world</w:t></w:r></w:p>"#
);

#[tokio::test]
async fn test_run_withDefaultGranularity_shouldMergeRunsIntoFirstLeaf() {
    common::init_logging();
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_docx(temp_dir.path(), "hello.docx", &common::docx_document(RUNS_PARAGRAPH)).unwrap();
    let output = temp_dir.path().join("hello.fr.docx");

    let provider = MockProvider::working();
    let translator = common::mock_translator(provider.clone(), common::test_options(temp_dir.path()));
    let report = translator.run(&input, &output, "fr").await.unwrap();

    assert_eq!(report.granularity, Granularity::Paragraph);
    assert_eq!(report.unit_count(), 1);
    assert_eq!(report.warning_count(), 0);
    assert_eq!(provider.request_count(), 1);

    let document = common::read_entry(&output, "word/document.xml").unwrap();
    assert!(document.contains(r#"<w:t xml:space="preserve">[TRANSLATED to fr] Hello world</w:t>"#));
    assert!(document.contains(r#"<w:rPr><w:b/></w:rPr><w:t/>"#));
    assert!(!document.contains("w:bidi"));
}

#[tokio::test]
async fn test_run_withLeafGranularity_shouldTranslateEveryRunInPlace() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_docx(temp_dir.path(), "hello.docx", &common::docx_document(RUNS_PARAGRAPH)).unwrap();
    let output = temp_dir.path().join("hello.fr.docx");

    let provider = MockProvider::working();
    let options = PipelineOptions {
        granularity: Some(Granularity::Leaf),
        ..common::test_options(temp_dir.path())
    };
    let report = common::mock_translator(provider.clone(), options)
        .run(&input, &output, "fr")
        .await
        .unwrap();

    assert_eq!(report.unit_count(), 2);
    assert_eq!(provider.request_count(), 2);
    let document = common::read_entry(&output, "word/document.xml").unwrap();
    assert!(document.contains(r#"<w:t xml:space="preserve">[TRANSLATED to fr] Hello </w:t>"#));
    assert!(document.contains(r#"<w:rPr><w:b/></w:rPr><w:t>[TRANSLATED to fr] world</w:t>"#));
}

#[tokio::test]
async fn test_run_shouldKeepOtherEntriesByteIdenticalAndInOrder() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_docx(temp_dir.path(), "hello.docx", &common::docx_document(RUNS_PARAGRAPH)).unwrap();
    let output = temp_dir.path().join("hello.de.docx");

    common::mock_translator(MockProvider::working(), common::test_options(temp_dir.path()))
        .run(&input, &output, "de")
        .await
        .unwrap();

    let before = common::read_entries(&input).unwrap();
    let after = common::read_entries(&output).unwrap();
    let names_before: Vec<&str> = before.iter().map(|e| e.0.as_str()).collect();
    let names_after: Vec<&str> = after.iter().map(|e| e.0.as_str()).collect();
    assert_eq!(names_before, names_after);

    for (original, translated) in before.iter().zip(after.iter()) {
        if original.0 == "word/document.xml" {
            assert_ne!(original.1, translated.1);
        } else {
            assert_eq!(original.1, translated.1, "entry {} changed", original.0);
        }
    }
    let image = after.iter().find(|e| e.0 == "word/media/image1.png").unwrap();
    assert_eq!(image.1, common::IMAGE_BYTES);
    assert_eq!(image.2, zip::CompressionMethod::Stored);
}

#[tokio::test]
async fn test_run_withAuxiliaryParts_shouldTranslateHeaders() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_docx(temp_dir.path(), "hello.docx", &common::docx_document(RUNS_PARAGRAPH)).unwrap();
    let output = temp_dir.path().join("hello.es.docx");

    let options = PipelineOptions {
        include_auxiliary_parts: true,
        ..common::test_options(temp_dir.path())
    };
    let report = common::mock_translator(MockProvider::working(), options)
        .run(&input, &output, "es")
        .await
        .unwrap();

    let names: Vec<&str> = report.parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["word/document.xml", "word/header1.xml"]);
    let header = common::read_entry(&output, "word/header1.xml").unwrap();
    assert!(header.contains("[TRANSLATED to es] Header text"));
}

#[tokio::test]
async fn test_run_withArabicTarget_shouldMarkEveryParagraphBidi() {
    let temp_dir = common::create_temp_dir().unwrap();
    let paragraphs = format!(
        r#"{}<w:p/><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>Centered</w:t></w:r></w:p>"#,
        RUNS_PARAGRAPH
    );
    let input = common::create_test_docx(temp_dir.path(), "bidi.docx", &common::docx_document(&paragraphs)).unwrap();
    let output = temp_dir.path().join("bidi.ar.docx");

    let report = common::mock_translator(MockProvider::working(), common::test_options(temp_dir.path()))
        .run(&input, &output, "ar")
        .await
        .unwrap();

    assert!(report.rtl_applied);
    assert_eq!(report.parts[0].paragraphs_marked, 3);
    let document = common::read_entry(&output, "word/document.xml").unwrap();
    assert_eq!(document.matches(r#"<w:bidi w:val="on"/>"#).count(), 3);
    assert!(document.contains(r#"<w:p><w:pPr><w:bidi w:val="on"/></w:pPr></w:p>"#));
    assert!(document.contains(r#"<w:pPr><w:bidi w:val="on"/><w:jc w:val="center"/></w:pPr>"#));
}

#[tokio::test]
async fn test_run_onAlreadyMarkedDocument_shouldLeaveDirectionUnchanged() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_docx(temp_dir.path(), "empty.docx", &common::docx_document("<w:p/><w:p/>")).unwrap();
    let first = temp_dir.path().join("empty.he.docx");
    let second = temp_dir.path().join("empty.he.he.docx");

    let translator = common::mock_translator(MockProvider::working(), common::test_options(temp_dir.path()));
    let report = translator.run(&input, &first, "he").await.unwrap();
    assert_eq!(report.parts[0].paragraphs_marked, 2);

    let report = translator.run(&first, &second, "he").await.unwrap();
    assert_eq!(report.parts[0].paragraphs_marked, 0);
    assert!(!report.parts[0].rewritten);
    assert_eq!(
        common::read_entry(&first, "word/document.xml").unwrap(),
        common::read_entry(&second, "word/document.xml").unwrap()
    );
}

#[tokio::test]
async fn test_run_withThirdOfFiveUnitsFailing_shouldKeepItsOriginalText() {
    let temp_dir = common::create_temp_dir().unwrap();
    let paragraphs: String = ["First", "Second", "Third", "Fourth", "Fifth"]
        .iter()
        .map(|text| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text))
        .collect();
    let input = common::create_test_docx(temp_dir.path(), "five.docx", &common::docx_document(&paragraphs)).unwrap();
    let output = temp_dir.path().join("five.it.docx");

    let options = PipelineOptions {
        max_concurrent_requests: 1,
        ..common::test_options(temp_dir.path())
    };
    let report = common::mock_translator(MockProvider::failing_on_requests(&[3]), options)
        .run(&input, &output, "it")
        .await
        .unwrap();

    assert_eq!(report.unit_count(), 5);
    assert_eq!(report.translated_count(), 4);
    assert_eq!(report.warning_count(), 1);
    assert_eq!(report.parts[0].failures[0].unit_id, 2);
    assert!(report.parts[0].first_error.as_deref().unwrap().contains("request #3"));

    let document = common::read_entry(&output, "word/document.xml").unwrap();
    assert!(document.contains("<w:t>Third</w:t>"));
    assert!(document.contains("<w:t>[TRANSLATED to it] Second</w:t>"));
    assert!(document.contains("<w:t>[TRANSLATED to it] Fifth</w:t>"));
}

#[tokio::test]
async fn test_run_withEveryUnitFailing_shouldCopyDocumentUnchanged() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_docx(temp_dir.path(), "hello.docx", &common::docx_document(RUNS_PARAGRAPH)).unwrap();
    let output = temp_dir.path().join("hello.fr.docx");

    let report = common::mock_translator(MockProvider::failing(), common::test_options(temp_dir.path()))
        .run(&input, &output, "fr")
        .await
        .unwrap();

    assert_eq!(report.warning_count(), 1);
    assert!(!report.parts[0].rewritten);
    let before = common::read_entries(&input).unwrap();
    let after = common::read_entries(&output).unwrap();
    assert_eq!(
        before.iter().map(|e| &e.1).collect::<Vec<_>>(),
        after.iter().map(|e| &e.1).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_run_withMalformedDocument_shouldFailWithoutOutput() {
    let temp_dir = common::create_temp_dir().unwrap();
    let broken = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p></w:body></w:document>"#;
    let input = common::create_test_docx(temp_dir.path(), "broken.docx", broken).unwrap();
    let output = temp_dir.path().join("broken.fr.docx");

    let provider = MockProvider::working();
    let error = common::mock_translator(provider.clone(), common::test_options(temp_dir.path()))
        .run(&input, &output, "fr")
        .await
        .unwrap_err();

    match &error {
        PipelineError::MalformedPart { part, .. } => assert_eq!(part, "word/document.xml"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(error.stage(), RunStage::Indexed);
    assert_eq!(provider.request_count(), 0);
    assert!(!output.exists());
    assert!(!common::working_areas_left(temp_dir.path()));
}

#[tokio::test]
async fn test_run_withNonArchiveInput_shouldReturnContainerError() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = temp_dir.path().join("plain.docx");
    std::fs::write(&input, "just text").unwrap();

    let error = common::mock_translator(MockProvider::working(), common::test_options(temp_dir.path()))
        .run(&input, &temp_dir.path().join("plain.fr.docx"), "fr")
        .await
        .unwrap_err();
    assert!(matches!(error, PipelineError::Container(ContainerError::Unreadable { .. })));
}

#[tokio::test]
async fn test_run_withArchiveMissingBody_shouldReturnUnsupportedFormat() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::build_archive(
        &temp_dir.path().join("hollow.docx"),
        &[(
            "[Content_Types].xml",
            common::CONTENT_TYPES_XML.as_bytes(),
            zip::CompressionMethod::Deflated,
        )],
    )
    .unwrap();
    let output = temp_dir.path().join("hollow.fr.docx");

    let error = common::mock_translator(MockProvider::working(), common::test_options(temp_dir.path()))
        .run(&input, &output, "fr")
        .await
        .unwrap_err();
    assert!(matches!(error, PipelineError::UnsupportedFormat(_)));
    assert!(!output.exists());
    assert!(!common::working_areas_left(temp_dir.path()));
}

#[tokio::test]
async fn test_run_withUnknownTargetLanguage_shouldReturnConfigurationError() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_docx(temp_dir.path(), "hello.docx", &common::docx_document(RUNS_PARAGRAPH)).unwrap();

    let error = common::mock_translator(MockProvider::working(), common::test_options(temp_dir.path()))
        .run(&input, &temp_dir.path().join("hello.xx.docx"), "zz")
        .await
        .unwrap_err();
    assert!(matches!(error, PipelineError::Configuration(_)));
}

#[tokio::test]
async fn test_run_withConcurrentRuns_shouldUseSeparateWorkingAreas() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_docx(temp_dir.path(), "hello.docx", &common::docx_document(RUNS_PARAGRAPH)).unwrap();
    let translator = common::mock_translator(MockProvider::slow(20), common::test_options(temp_dir.path()));

    let first_output = temp_dir.path().join("hello.fr.docx");
    let second_output = temp_dir.path().join("hello.de.docx");
    let (first, second) = tokio::join!(
        translator.run(&input, &first_output, "fr"),
        translator.run(&input, &second_output, "de"),
    );
    assert_ne!(first.unwrap().run_id, second.unwrap().run_id);
    assert!(common::read_entry(&first_output, "word/document.xml").unwrap().contains("to fr"));
    assert!(common::read_entry(&second_output, "word/document.xml").unwrap().contains("to de"));
    assert!(!common::working_areas_left(temp_dir.path()));
}

#[tokio::test]
async fn test_run_withControlCharactersInAnswer_shouldKeepOriginalText() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_docx(temp_dir.path(), "hello.docx", &common::docx_document(RUNS_PARAGRAPH)).unwrap();
    let output = temp_dir.path().join("hello.fr.docx");

    let provider = MockProvider::working().with_custom_response(|_| "Bonjour\u{1}\u{B}monde".to_string());
    let report = common::mock_translator(provider, common::test_options(temp_dir.path()))
        .run(&input, &output, "fr")
        .await
        .unwrap();

    assert_eq!(report.warning_count(), 1);
    assert!(report.parts[0].first_error.as_deref().unwrap().contains("U+0001"));
    let document = common::read_entry(&output, "word/document.xml").unwrap();
    assert!(!document.contains('\u{1}') && !document.contains('\u{B}'));
    assert!(document.contains("Hello "));
}

#[tokio::test]
async fn test_finalize_withIllegalCharacterInPart_shouldAbortBeforeRepackaging() {
    let temp_dir = common::create_temp_dir().unwrap();
    let input = common::create_test_docx(temp_dir.path(), "hello.docx", &common::docx_document(RUNS_PARAGRAPH)).unwrap();
    let output = temp_dir.path().join("hello.fr.docx");

    let store = ContainerStore::with_working_root(Some(temp_dir.path().join("work")));
    let area = store.extract(&input).unwrap();
    let mut doc = XmlDocument::parse_bytes(&area.read_part("word/document.xml").unwrap()).unwrap();
    let first_text = doc.elements_named(W, "t")[0];
    doc.set_slot_text(TextPosition::text(first_text), "Bonjour\u{1}");

    let result = ContainerValidator::new(&store).finalize(&area, &[("word/document.xml".to_string(), &doc)], &output);
    store.cleanup(area);

    let error = result.unwrap_err();
    match &error {
        PipelineError::Validation(validation) => {
            assert_eq!(validation.part, "word/document.xml");
            assert!(matches!(validation.source, XmlError::Malformed { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(error.stage(), RunStage::Validated);
    assert!(!output.exists());
    assert!(!common::working_areas_left(temp_dir.path()));
}

#[tokio::test]
async fn test_run_withAnswersFinishingOutOfOrder_shouldKeepEachInItsParagraph() {
    let temp_dir = common::create_temp_dir().unwrap();
    let paragraphs: String = (0..10)
        .map(|n| format!("<w:p><w:r><w:t>TP{}</w:t></w:r></w:p>", n))
        .collect();
    let input = common::create_test_docx(temp_dir.path(), "ten.docx", &common::docx_document(&paragraphs)).unwrap();
    let output = temp_dir.path().join("ten.fr.docx");

    let provider = MockProvider::staggered(100, 9);
    let options = PipelineOptions {
        granularity: Some(Granularity::Leaf),
        max_concurrent_requests: 10,
        ..common::test_options(temp_dir.path())
    };
    let report = common::mock_translator(provider.clone(), options)
        .run(&input, &output, "fr")
        .await
        .unwrap();
    assert_eq!(report.translated_count(), 10);

    let order = provider.completion_order();
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_ne!(order, sorted, "answers should have finished out of order");

    let doc = XmlDocument::parse(&common::read_entry(&output, "word/document.xml").unwrap()).unwrap();
    let texts: Vec<&str> = doc
        .elements_named(W, "t")
        .into_iter()
        .map(|id| doc.slot_text(TextPosition::text(id)))
        .collect();
    let expected: Vec<String> = (0..10).map(|n| format!("[TRANSLATED to fr] TP{}", n)).collect();
    assert_eq!(texts, expected);
}
