use mime::Mime;

use crate::config::AuditConfig;

/// Raw file received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Size caps and type allowlists for uploaded files.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_document_bytes: usize,
    pub max_pdf_bytes: usize,
}

impl From<&AuditConfig> for UploadPolicy {
    fn from(config: &AuditConfig) -> Self {
        Self {
            max_document_bytes: config.max_upload_bytes,
            max_pdf_bytes: config.max_pdf_bytes,
        }
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from(&AuditConfig::default())
    }
}

const OFFICE_TYPES: [&str; 6] = [
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
];

impl UploadPolicy {
    /// Supporting documents: images, PDFs, and office files.
    pub fn check_document(&self, upload: &FileUpload) -> Result<Mime, UploadRejection> {
        let mime = guess(upload)?;
        let allowed = mime.type_() == mime::IMAGE
            || mime == mime::APPLICATION_PDF
            || OFFICE_TYPES.contains(&mime.essence_str());
        if !allowed {
            return Err(UploadRejection::UnsupportedType {
                file_name: upload.file_name.clone(),
                content_type: mime.essence_str().to_string(),
            });
        }
        check_size(upload, self.max_document_bytes)?;
        Ok(mime)
    }

    /// The consolidated audit upload must be a PDF.
    pub fn check_pdf(&self, upload: &FileUpload) -> Result<Mime, UploadRejection> {
        let mime = guess(upload)?;
        if mime != mime::APPLICATION_PDF {
            return Err(UploadRejection::UnsupportedType {
                file_name: upload.file_name.clone(),
                content_type: mime.essence_str().to_string(),
            });
        }
        check_size(upload, self.max_pdf_bytes)?;
        Ok(mime)
    }
}

fn guess(upload: &FileUpload) -> Result<Mime, UploadRejection> {
    if upload.file_name.trim().is_empty() {
        return Err(UploadRejection::MissingFileName);
    }
    if upload.bytes.is_empty() {
        return Err(UploadRejection::Empty {
            file_name: upload.file_name.clone(),
        });
    }
    mime_guess::from_path(&upload.file_name)
        .first()
        .ok_or_else(|| UploadRejection::UnsupportedType {
            file_name: upload.file_name.clone(),
            content_type: "unknown".to_string(),
        })
}

fn check_size(upload: &FileUpload, limit: usize) -> Result<(), UploadRejection> {
    if upload.bytes.len() > limit {
        return Err(UploadRejection::TooLarge {
            file_name: upload.file_name.clone(),
            size: upload.bytes.len(),
            limit,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("a file name is required")]
    MissingFileName,
    #[error("'{file_name}' is empty")]
    Empty { file_name: String },
    #[error("'{file_name}' has unsupported type {content_type}")]
    UnsupportedType {
        file_name: String,
        content_type: String,
    },
    #[error("'{file_name}' is {size} bytes, above the {limit} byte limit")]
    TooLarge {
        file_name: String,
        size: usize,
        limit: usize,
    },
}
