use thiserror::Error;

/// Largest resume file accepted for upload (10 MiB).
pub const MAX_RESUME_BYTES: u64 = 10 * 1024 * 1024;

/// Resume file extensions accepted by the scoring service, lower-case.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf", "doc", "docx"];

/// A resume file selected by the user, held by the form until submission.
#[derive(Clone, PartialEq, Eq)]
pub struct ResumeFile {
    name: String,
    size_bytes: u64,
    content: Vec<u8>,
}

impl ResumeFile {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: content.len() as u64,
            content,
        }
    }

    /// A file known only by name and size, for one too large to be worth loading.
    ///
    /// Meant for sizes above [`MAX_RESUME_BYTES`], which [`compose`] rejects
    /// before the content is needed.
    pub fn unloaded(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            content: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn is_loaded(&self) -> bool {
        self.content.len() as u64 == self.size_bytes
    }

    /// Lower-cased extension without the dot, if the name has one.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

// Content is elided so that logging a state never dumps a whole resume.
impl std::fmt::Debug for ResumeFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeFile")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionInput {
    pub jd_text: String,
    pub resume_file: Option<ResumeFile>,
}

/// Validated multipart payload for the scoring service.
///
/// Holds the two named parts: `jd_text` (already trimmed) and `resume_file`
/// (raw bytes plus the original filename and a mime type derived from the
/// extension).
#[derive(Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub jd_text: String,
    pub resume_file_name: String,
    pub resume_mime: &'static str,
    pub resume_bytes: Vec<u8>,
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBody")
            .field("jd_chars", &self.jd_text.chars().count())
            .field("resume_file_name", &self.resume_file_name)
            .field("resume_mime", &self.resume_mime)
            .field("resume_bytes", &self.resume_bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please choose a resume file (.txt / .pdf / .doc / .docx)")]
    MissingFile,
    #[error(
        "unsupported resume file type {}; only .txt / .pdf / .doc / .docx are accepted",
        describe_extension(.extension)
    )]
    UnsupportedType { extension: Option<String> },
    #[error("resume file is too large ({size_bytes} bytes, limit {max_bytes} bytes)")]
    FileTooLarge { size_bytes: u64, max_bytes: u64 },
    #[error("please enter the job description text")]
    MissingJD,
}

/// Validates the form input and builds the request body.
///
/// Rules run in order and the first failure wins: file present, extension
/// allowed, size within [`MAX_RESUME_BYTES`], non-blank job description.
pub fn compose(input: SubmissionInput) -> Result<RequestBody, ValidationError> {
    let SubmissionInput {
        jd_text,
        resume_file,
    } = input;

    let file = resume_file.ok_or(ValidationError::MissingFile)?;

    let extension = file.extension();
    let resume_mime = match extension.as_deref().and_then(mime_for_extension) {
        Some(mime) => mime,
        None => return Err(ValidationError::UnsupportedType { extension }),
    };

    let size_bytes = file.size_bytes();
    if size_bytes > MAX_RESUME_BYTES {
        return Err(ValidationError::FileTooLarge {
            size_bytes,
            max_bytes: MAX_RESUME_BYTES,
        });
    }

    let jd_text = jd_text.trim();
    if jd_text.is_empty() {
        return Err(ValidationError::MissingJD);
    }

    Ok(RequestBody {
        jd_text: jd_text.to_string(),
        resume_file_name: file.name,
        resume_mime,
        resume_bytes: file.content,
    })
}

fn describe_extension(extension: &Option<String>) -> String {
    match extension {
        Some(ext) => format!(".{ext}"),
        None => "(none)".to_string(),
    }
}

fn mime_for_extension(extension: &str) -> Option<&'static str> {
    if !ALLOWED_EXTENSIONS.contains(&extension) {
        return None;
    }
    let mime = match extension {
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        _ => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    };
    Some(mime)
}
