//! Models for the upload-and-attach endpoint.

use std::{fmt, str::FromStr};
use thiserror::Error;

/// File extensions the relay accepts, matching what OpenAI file search can index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedExtension {
    C,
    Cs,
    Cpp,
    Doc,
    Docx,
    Html,
    Java,
    Json,
    Md,
    Pdf,
    Php,
    Pptx,
    Py,
    Rb,
    Tex,
    Txt,
    Css,
    Js,
    Sh,
    Ts,
}

impl SupportedExtension {
    /// Every accepted extension, in the order they are listed in error messages.
    pub const ALL: [SupportedExtension; 20] = [
        Self::C,
        Self::Cs,
        Self::Cpp,
        Self::Doc,
        Self::Docx,
        Self::Html,
        Self::Java,
        Self::Json,
        Self::Md,
        Self::Pdf,
        Self::Php,
        Self::Pptx,
        Self::Py,
        Self::Rb,
        Self::Tex,
        Self::Txt,
        Self::Css,
        Self::Js,
        Self::Sh,
        Self::Ts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cs => "cs",
            Self::Cpp => "cpp",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Html => "html",
            Self::Java => "java",
            Self::Json => "json",
            Self::Md => "md",
            Self::Pdf => "pdf",
            Self::Php => "php",
            Self::Pptx => "pptx",
            Self::Py => "py",
            Self::Rb => "rb",
            Self::Tex => "tex",
            Self::Txt => "txt",
            Self::Css => "css",
            Self::Js => "js",
            Self::Sh => "sh",
            Self::Ts => "ts",
        }
    }

    /// Comma separated list of all extensions with their leading dot, e.g. `.c, .cs, .cpp`.
    pub fn supported_list() -> String {
        Self::ALL.iter().map(|ext| ext.to_string()).collect::<Vec<_>>().join(", ")
    }

    /// Extension of `filename`: the text after the last `.`, compared case-insensitively.
    ///
    /// Leading dots of the final path component do not start an extension (`.bashrc` and
    /// `docs/.txt` have none).
    pub fn from_filename(filename: &str) -> Result<Self, ValidationError> {
        let extension = match filename.rsplit_once('.') {
            Some((stem, extension)) if has_name(stem) => extension,
            _ => "",
        };
        extension.parse().map_err(|()| ValidationError::UnsupportedExtension {
            extension: extension.to_lowercase(),
        })
    }
}

fn has_name(stem: &str) -> bool {
    stem.rsplit('/')
        .next()
        .is_some_and(|base| !base.trim_start_matches('.').is_empty())
}

impl fmt::Display for SupportedExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.as_str())
    }
}

impl FromStr for SupportedExtension {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ext| ext.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Why an upload was refused before anything was sent upstream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File has no filename.")]
    MissingFilename,

    #[error(
        "Unsupported file extension: {}. Supported extensions are: {}",
        display_extension(.extension),
        SupportedExtension::supported_list()
    )]
    UnsupportedExtension { extension: String },

    #[error("Missing required form field: {0}")]
    MissingField(&'static str),

    #[error("Form field {0} must not be empty")]
    EmptyField(&'static str),

    #[error("Invalid vector_store_id: {0:?} is not a valid path segment")]
    InvalidVectorStoreId(String),
}

fn display_extension(extension: &str) -> String {
    if extension.is_empty() {
        "(none)".to_string()
    } else {
        format!(".{extension}")
    }
}

/// The `file` part of the form.
#[derive(Debug)]
pub struct UploadedFile {
    /// Filename as sent by the client, if any
    pub filename: Option<String>,
    pub contents: Vec<u8>,
}

impl UploadedFile {
    /// Check the filename and its extension, returning the filename on success.
    pub fn validate(&self) -> Result<(&str, SupportedExtension), ValidationError> {
        let filename = self
            .filename
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(ValidationError::MissingFilename)?;
        let extension = SupportedExtension::from_filename(filename)?;
        Ok((filename, extension))
    }
}

/// A fully parsed `POST /add_file_to_vector_store` form.
#[derive(Debug)]
pub struct UploadRequest {
    pub vector_store_id: String,
    pub file: UploadedFile,
}

impl UploadRequest {
    /// Assemble a request from the collected form fields. Field presence is checked here; the
    /// file itself is checked by [`UploadedFile::validate`].
    pub fn from_parts(vector_store_id: Option<String>, file: Option<UploadedFile>) -> Result<Self, ValidationError> {
        let file = file.ok_or(ValidationError::MissingField("file"))?;
        let vector_store_id = vector_store_id.ok_or(ValidationError::MissingField("vector_store_id"))?;
        if vector_store_id.trim().is_empty() {
            return Err(ValidationError::EmptyField("vector_store_id"));
        }
        if is_dot_segment(&vector_store_id) {
            return Err(ValidationError::InvalidVectorStoreId(vector_store_id));
        }
        Ok(Self { vector_store_id, file })
    }
}

/// `.` and `..`, including their `%2e` spellings, are resolved away by URL path normalization.
fn is_dot_segment(segment: &str) -> bool {
    matches!(segment.to_ascii_lowercase().replace("%2e", ".").as_str(), "." | "..")
}

/// Identifier of a file stored by the upstream files API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    id: String,
}

impl FileHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}
