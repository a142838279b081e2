use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::{BackendError, BackendResult};

/// Reads the embedded text layer of a PDF, one string per page in page order.
pub trait PdfTextReader: Send + Sync {
    fn page_texts(&self, pdf_bytes: &[u8]) -> BackendResult<Vec<String>>;
}

/// Text layer reader backed by the `pdf-extract` crate.
///
/// `pdf-extract` panics on some malformed inputs (unknown encodings, missing
/// font widths), so the call is isolated and a panic becomes an error.
pub struct PdfExtractReader;

impl PdfTextReader for PdfExtractReader {
    fn page_texts(&self, pdf_bytes: &[u8]) -> BackendResult<Vec<String>> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        }));

        let message = match outcome {
            Ok(Ok(pages)) => return Ok(pages),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                tracing::warn!(error = %msg, "pdf-extract panicked");
                msg
            }
        };
        Err(BackendError::new(format!("PDF parsing failed: {message}")))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn make_test_pdf(text: &str) -> Vec<u8> {
        make_pdf_with_font(
            text,
            lopdf::dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            },
        )
    }

    fn make_pdf_with_font(text: &str, font: lopdf::Dictionary) -> Vec<u8> {
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(font);

        let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let resources = dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        };

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_reads_text_layer() {
        let pdf = make_test_pdf("Vessel arrived at anchorage");
        let pages = PdfExtractReader.page_texts(&pdf).unwrap();

        assert_eq!(pages.len(), 1);
        let text: String = pages.concat();
        assert!(
            text.contains("Vessel") || text.contains("anchorage"),
            "unexpected text layer: {text}"
        );
    }

    #[test]
    fn test_invalid_pdf_is_rejected() {
        assert!(PdfExtractReader.page_texts(b"not a pdf").is_err());
    }

    #[test]
    fn test_unknown_font_encoding_is_an_error() {
        let pdf = make_pdf_with_font(
            "Vessel arrived",
            lopdf::dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "BogusEncoding",
            },
        );

        let err = PdfExtractReader.page_texts(&pdf).unwrap_err();
        assert!(err.to_string().contains("PDF parsing failed"), "{err}");
    }

    #[test]
    fn test_extractor_reports_malformed_pdf_with_file_name() {
        use crate::error::Error;
        use crate::extract::{DocumentExtractor, DocumentFormat, TextExtractor};

        let pdf = make_pdf_with_font(
            "Vessel arrived",
            lopdf::dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "BogusEncoding",
            },
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbled.pdf");
        std::fs::write(&path, pdf).unwrap();

        let err = DocumentExtractor::new()
            .extract(&path, DocumentFormat::Pdf)
            .unwrap_err();

        match err {
            Error::Extraction { file_name, cause } => {
                assert_eq!(file_name, "garbled.pdf");
                assert!(cause.contains("PDF parsing failed"), "{cause}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("bad cmap");
        assert_eq!(panic_message(boxed.as_ref()), "bad cmap");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("missing width"));
        assert_eq!(panic_message(boxed.as_ref()), "missing width");

        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
