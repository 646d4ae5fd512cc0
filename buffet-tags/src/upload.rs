//! Scoped uploads
//!
//! An uploaded workbook lives in a temporary file for exactly as long as the
//! step that needs it. The file is removed when the [`ScopedUpload`] drops,
//! whether or not the step succeeded.

use crate::document::CellDocument;
use crate::extractor::extract_names;
use crate::importer::{parse_table, ImportEntry};
use crate::validation::ValidationError;
use crate::xlsx::XlsxDocument;
use buffet_common::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

const UPLOAD_EXTENSION: &str = ".xlsx";

/// Check an upload's file name before touching its bytes
pub fn check_upload_name(file_name: &str) -> std::result::Result<(), ValidationError> {
    if file_name.to_lowercase().ends_with(UPLOAD_EXTENSION) {
        Ok(())
    } else {
        Err(ValidationError::WrongUploadType {
            file_name: file_name.to_string(),
        })
    }
}

pub struct ScopedUpload {
    file: NamedTempFile,
}

impl ScopedUpload {
    /// Write the uploaded bytes to a fresh temporary .xlsx file
    pub fn create(file_name: &str, bytes: &[u8]) -> Result<Self> {
        check_upload_name(file_name)?;

        let mut file = tempfile::Builder::new()
            .prefix("buffet-upload-")
            .suffix(UPLOAD_EXTENSION)
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        debug!(upload = %file_name, path = %file.path().display(), "Stored upload");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn open(&self) -> Result<XlsxDocument> {
        XlsxDocument::open(self.path())
    }
}

/// Names from column D of an uploaded tag sheet
pub fn extract_names_from_upload(file_name: &str, bytes: &[u8]) -> Result<Vec<String>> {
    let upload = ScopedUpload::create(file_name, bytes)?;
    let doc = upload.open()?;
    Ok(extract_names(&doc))
}

/// Import rows from an uploaded catalog sheet
pub fn bulk_entries_from_upload(file_name: &str, bytes: &[u8]) -> Result<Vec<ImportEntry>> {
    let upload = ScopedUpload::create(file_name, bytes)?;
    let doc = upload.open()?;
    debug!(rows = doc.highest_row(), "Parsing import sheet");
    Ok(parse_table(&doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CellValue;
    use buffet_common::Error;

    #[test]
    fn test_wrong_extension_rejected_before_write() {
        let result = ScopedUpload::create("menu.csv", b"name,calories");
        assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("menu.csv")));
    }

    #[test]
    fn test_upload_name_case_insensitive() {
        assert!(check_upload_name("MENU.XLSX").is_ok());
        assert!(check_upload_name("menu.xls").is_err());
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let upload = ScopedUpload::create("menu.xlsx", b"bytes").unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.exists());

        drop(upload);
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_file_removed_when_parse_fails() {
        let upload = ScopedUpload::create("menu.xlsx", b"not a workbook").unwrap();
        let path = upload.path().to_path_buf();
        assert!(upload.open().is_err());
        drop(upload);
        assert!(!path.exists());
    }

    #[test]
    fn test_extract_names_from_upload() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("tags.xlsx");
        let mut doc = XlsxDocument::new();
        doc.set(2, 4, CellValue::Text("Apple".into()));
        doc.set(3, 4, CellValue::Text("Banana".into()));
        doc.save(&source).unwrap();

        let bytes = std::fs::read(&source).unwrap();
        let names = extract_names_from_upload("tags.xlsx", &bytes).unwrap();
        assert_eq!(names, vec!["Apple", "Banana"]);
    }
}
