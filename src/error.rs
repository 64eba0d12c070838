//! Error types for songbook builds.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while loading, reconciling or writing a songbook.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed document: {0}")]
    Parse(String),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("{0}")]
    Build(BuildErrors),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A defect found in the source tree during preprocessing.
///
/// Dead links are deliberately absent: they are repaired by removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A song has body content both inline and in its `src` file.
    StructuralAmbiguity { title: String, path: String },
    /// A `src` file does not exist or does not parse.
    MissingSource {
        src: String,
        path: String,
        reason: String,
    },
    /// The same attribute has different values inline and in the `src` file.
    AttributeConflict {
        path: String,
        attribute: String,
        external: String,
        local: String,
    },
    /// Two distinct nodes declare the same explicit `xhtml` file name.
    FilenameCollision { xhtml: String, paths: Vec<String> },
    /// An HTML include is missing, unparsable or disagrees on its title.
    InvalidHtmlSubdocument { path: String, message: String },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::StructuralAmbiguity { title, path } => write!(
                f,
                "{title} is defined in both master XML and a source file ({path})"
            ),
            BuildError::MissingSource { src, path, reason } => {
                write!(f, "Source file {src} not found ({path}): {reason}")
            }
            BuildError::AttributeConflict {
                path,
                attribute,
                external,
                local,
            } => write!(
                f,
                "Ambiguous attribute values for {path}/@{attribute}: '{external}' vs '{local}'"
            ),
            BuildError::FilenameCollision { xhtml, paths } => {
                write!(f, "Duplicate xhtml file name {xhtml}: {}", paths.join(", "))
            }
            BuildError::InvalidHtmlSubdocument { path, message } => write!(f, "{path}: {message}"),
        }
    }
}

/// Every defect collected across all preprocessing passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildErrors {
    errors: Vec<BuildError>,
}

impl BuildErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: BuildError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: BuildErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildError> {
        self.errors.iter()
    }

    /// Signal failure once, carrying the complete defect list.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Build(self))
        }
    }
}

impl fmt::Display for BuildErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) found in source tree", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a BuildErrors {
    type Item = &'a BuildError;
    type IntoIter = std::slice::Iter<'a, BuildError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
