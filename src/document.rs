//! PDF text extraction and session context assembly.

use lopdf::Document;
use tracing::{debug, instrument};

use crate::error::QuestError;

/// Extracted document text plus the page count, for logging and the API.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedDocument {
  pub text: String,
  pub pages: usize,
}

/// True if a declared content type names a PDF (parameters and case ignored).
pub fn is_pdf_media_type(content_type: &str) -> bool {
  content_type
    .split(';')
    .next()
    .map(|m| m.trim().eq_ignore_ascii_case("application/pdf"))
    .unwrap_or(false)
}

/// Extract every page's text in page order. Whitespace within a page collapses
/// to single spaces; each page is followed by a newline. All-or-nothing: any
/// page failing fails the whole document.
#[instrument(level = "info", skip(bytes), fields(bytes = bytes.len()))]
pub fn extract_text(bytes: &[u8]) -> Result<ExtractedDocument, QuestError> {
  let doc = Document::load_mem(bytes).map_err(|e| QuestError::DocumentParse(e.to_string()))?;
  let pages = doc.get_pages();

  let mut text = String::new();
  for &number in pages.keys() {
    let raw = doc
      .extract_text(&[number])
      .map_err(|e| QuestError::DocumentParse(format!("page {number}: {e}")))?;
    text.push_str(&raw.split_whitespace().collect::<Vec<_>>().join(" "));
    text.push('\n');
  }

  debug!(target: "study_quest", pages = pages.len(), text_len = text.len(), "PDF text extracted");
  Ok(ExtractedDocument { text, pages: pages.len() })
}

/// Join document text and free-form notes into the session context.
/// Fails when both are blank: there is nothing to learn from.
pub fn build_context(document_text: &str, notes: &str) -> Result<String, QuestError> {
  if document_text.trim().is_empty() && notes.trim().is_empty() {
    return Err(QuestError::InvalidInput(
      "Upload a PDF or add some notes before starting a session.".into(),
    ));
  }
  Ok(format!("{document_text}\n{notes}"))
}

#[cfg(test)]
pub(crate) mod fixtures {
  use lopdf::content::{Content, Operation};
  use lopdf::{dictionary, Document, Object, Stream};

  /// A minimal PDF with one text line per page.
  pub fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
      "Type" => "Font",
      "Subtype" => "Type1",
      "BaseFont" => "Courier",
      "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
      "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for line in lines {
      let content = Content {
        operations: vec![
          Operation::new("BT", vec![]),
          Operation::new("Tf", vec!["F1".into(), 12.into()]),
          Operation::new("Td", vec![72.into(), 700.into()]),
          Operation::new("Tj", vec![Object::string_literal(*line)]),
          Operation::new("ET", vec![]),
        ],
      };
      let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
      let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
      });
      kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
      pages_id,
      Object::Dictionary(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
      }),
    );
    let catalog_id = doc.add_object(dictionary! {
      "Type" => "Catalog",
      "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
  }
}
