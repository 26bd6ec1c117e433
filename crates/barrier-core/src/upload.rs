//! Upload checks: content sniffing, the type allow-list and the size limit.
//!
//! The content type is always sniffed from the bytes; whatever the client
//! claims in its headers is ignored.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
  "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";
pub const MIME_GIF: &str = "image/gif";
pub const MIME_TIFF: &str = "image/tiff";
pub const MIME_BMP: &str = "image/bmp";
pub const MIME_ZIP: &str = "application/zip";
pub const MIME_BZIP: &str = "application/x-bzip";
pub const MIME_BZIP2: &str = "application/x-bzip2";
pub const MIME_EMPTY: &str = "application/x-empty";
pub const MIME_UNKNOWN: &str = "application/octet-stream";

/// Content type a DOCX package declares for its main document part.
const DOCX_MAIN_PART: &str =
  "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

const CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";
const CONTENT_TYPES_MAX: u64 = 1 << 20;

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Allowed content types and maximum size, supplied from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
  pub allowed_types: Vec<String>,
  /// Maximum upload size in bytes.
  pub max_size:      u64,
}

impl Default for UploadPolicy {
  fn default() -> Self {
    Self {
      allowed_types: [
        MIME_DOC, MIME_DOCX, MIME_PDF, MIME_TEXT, MIME_JPEG, MIME_PNG, MIME_GIF,
        MIME_TIFF, MIME_BMP, MIME_ZIP, MIME_BZIP, MIME_BZIP2,
      ]
      .into_iter()
      .map(String::from)
      .collect(),
      max_size:      2_621_440,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
  #[error("file type {0} is not supported")]
  UnsupportedType(String),

  #[error("file size {actual} bytes exceeds the limit of {limit} bytes")]
  TooLarge { limit: u64, actual: u64 },
}

impl UploadPolicy {
  pub fn allows(&self, mime: &str) -> bool {
    self.allowed_types.iter().any(|t| t.eq_ignore_ascii_case(mime))
  }

  /// Sniff the type, then check it against the allow-list and the size
  /// against the limit. The type is checked first.
  pub fn check(&self, bytes: &[u8]) -> Result<&'static str, UploadError> {
    let mime = sniff(bytes);
    if !self.allows(mime) {
      return Err(UploadError::UnsupportedType(mime.to_owned()));
    }
    let actual = bytes.len() as u64;
    if actual > self.max_size {
      return Err(UploadError::TooLarge { limit: self.max_size, actual });
    }
    Ok(mime)
  }
}

// ─── Sniffing ────────────────────────────────────────────────────────────────

/// Identify the content type of `bytes` from its leading signature.
pub fn sniff(bytes: &[u8]) -> &'static str {
  const OLE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
  const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

  if bytes.is_empty() {
    return MIME_EMPTY;
  }
  if bytes.starts_with(b"%PDF-") {
    MIME_PDF
  } else if bytes.starts_with(PNG) {
    MIME_PNG
  } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
    MIME_JPEG
  } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
    MIME_GIF
  } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
    MIME_TIFF
  } else if bytes.starts_with(OLE) {
    MIME_DOC
  } else if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06") {
    if is_docx(bytes) { MIME_DOCX } else { MIME_ZIP }
  } else if bytes.starts_with(b"BZh") {
    MIME_BZIP2
  } else if bytes.starts_with(b"BZ0") {
    MIME_BZIP
  } else if looks_like_text(bytes) {
    MIME_TEXT
  } else if bytes.starts_with(b"BM") {
    MIME_BMP
  } else {
    MIME_UNKNOWN
  }
}

fn looks_like_text(bytes: &[u8]) -> bool {
  std::str::from_utf8(bytes).is_ok_and(|s| {
    s.chars()
      .all(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r' | '\x0c'))
  })
}

/// A zip container is a DOCX when its content-types manifest declares a
/// WordprocessingML main document part.
fn is_docx(bytes: &[u8]) -> bool {
  let Ok(mut archive) = zip::ZipArchive::new(Cursor::new(bytes)) else {
    return false;
  };
  let Ok(entry) = archive.by_name(CONTENT_TYPES_ENTRY) else {
    return false;
  };
  let mut manifest = Vec::new();
  if entry.take(CONTENT_TYPES_MAX).read_to_end(&mut manifest).is_err() {
    return false;
  }
  declares_content_type(&manifest, DOCX_MAIN_PART)
}

fn declares_content_type(xml: &[u8], wanted: &str) -> bool {
  let mut reader = quick_xml::Reader::from_reader(xml);
  reader.config_mut().trim_text(true);
  let mut buf = Vec::new();

  loop {
    match reader.read_event_into(&mut buf) {
      Ok(Event::Start(ref e) | Event::Empty(ref e)) => {
        let found = e.attributes().flatten().any(|attr| {
          attr.key.as_ref() == b"ContentType"
            && attr.unescape_value().is_ok_and(|v| v == wanted)
        });
        if found {
          return true;
        }
      }
      Ok(Event::Eof) | Err(_) => return false,
      _ => {}
    }
    buf.clear();
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use zip::write::SimpleFileOptions;

  use super::*;

  fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    {
      let mut writer = zip::ZipWriter::new(&mut out);
      for (name, body) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
      }
      writer.finish().unwrap();
    }
    out.into_inner()
  }

  const DOCX_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

  #[test]
  fn sniffs_common_signatures() {
    assert_eq!(sniff(b"%PDF-1.7\n..."), MIME_PDF);
    assert_eq!(sniff(b"\x89PNG\r\n\x1a\n\0\0"), MIME_PNG);
    assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), MIME_JPEG);
    assert_eq!(sniff(b"GIF89a\x01\0"), MIME_GIF);
    assert_eq!(sniff(b"BZh91AY"), MIME_BZIP2);
    assert_eq!(sniff(b"plain notes\r\n"), MIME_TEXT);
    assert_eq!(sniff(b"BM\x3a\0\0\0\0\0"), MIME_BMP);
    assert_eq!(sniff(b""), MIME_EMPTY);
    assert_eq!(sniff(&[0x7F, 0x45, 0x4C, 0x46, 0x02]), MIME_UNKNOWN);
  }

  #[test]
  fn zip_with_word_manifest_is_docx() {
    let bytes = zip_with(&[
      ("[Content_Types].xml", DOCX_TYPES),
      ("word/document.xml", "<w:document/>"),
    ]);
    assert_eq!(sniff(&bytes), MIME_DOCX);
  }

  #[test]
  fn plain_zip_stays_zip() {
    let bytes = zip_with(&[("notes.txt", "hello")]);
    assert_eq!(sniff(&bytes), MIME_ZIP);
  }

  #[test]
  fn unsupported_type_is_rejected_before_size() {
    let policy = UploadPolicy { max_size: 2, ..Default::default() };
    assert_eq!(
      policy.check(&[0x7F, 0x45, 0x4C, 0x46]),
      Err(UploadError::UnsupportedType(MIME_UNKNOWN.into()))
    );
  }

  #[test]
  fn oversize_is_rejected_with_limit_and_actual() {
    let policy = UploadPolicy { max_size: 8, ..Default::default() };
    assert_eq!(
      policy.check(b"%PDF-1.4 and then some"),
      Err(UploadError::TooLarge { limit: 8, actual: 22 })
    );
  }

  #[test]
  fn default_policy_accepts_docx_and_pdf() {
    let policy = UploadPolicy::default();
    let docx = zip_with(&[("[Content_Types].xml", DOCX_TYPES)]);
    assert_eq!(policy.check(&docx), Ok(MIME_DOCX));
    assert_eq!(policy.check(b"%PDF-1.4"), Ok(MIME_PDF));
    assert_eq!(policy.max_size, 2_621_440);
  }
}
