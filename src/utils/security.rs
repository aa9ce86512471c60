use std::fmt;
use std::path::{Component, Path};

//===============
// Path Handling
//===============
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathValidationError {
    ContainsParentDir,
    AbsolutePath,
    InvalidComponent,
    /// More than one component, e.g. `photos/front.jpg`
    NotAFileName,
    NullByte,
    Empty,
}

impl fmt::Display for PathValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValidationError::ContainsParentDir => {
                write!(f, "Path contains parent directory (..)")
            }
            PathValidationError::AbsolutePath => write!(f, "Path is absolute"),
            PathValidationError::InvalidComponent => write!(f, "Path contains invalid component"),
            PathValidationError::NotAFileName => write!(f, "Path must be a bare file name"),
            PathValidationError::NullByte => write!(f, "Path contains null byte"),
            PathValidationError::Empty => write!(f, "Path is empty"),
        }
    }
}

impl std::error::Error for PathValidationError {}

// Target names come from the host, but they are joined onto the save
// directory and written by a network request, so they get the same
// treatment as untrusted input: exactly one normal component.
pub fn validate_filename(filename: &str) -> Result<(), PathValidationError> {
    if filename.trim().is_empty() {
        return Err(PathValidationError::Empty);
    }

    // rust uses C-style APIs so \0 can end str early
    if filename.contains('\0') {
        return Err(PathValidationError::NullByte);
    }

    let mut normal = 0;
    for component in Path::new(filename).components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::ParentDir => return Err(PathValidationError::ContainsParentDir),
            Component::RootDir => return Err(PathValidationError::AbsolutePath),
            Component::CurDir => return Err(PathValidationError::InvalidComponent),
            Component::Prefix(_) => return Err(PathValidationError::InvalidComponent), // Windows
        }
    }

    // Backslash is a separator on Windows only; refuse it everywhere
    if normal != 1 || filename.contains(['/', '\\']) {
        return Err(PathValidationError::NotAFileName);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename_accepts_plain_names() {
        assert!(validate_filename("front.jpg").is_ok());
        assert!(validate_filename("client_42_damage 1.jpeg").is_ok());
        assert!(validate_filename(".hidden.png").is_ok());
    }

    #[test]
    fn test_validate_filename_parent_directory() {
        assert_eq!(
            validate_filename("../etc/passwd"),
            Err(PathValidationError::ContainsParentDir)
        );
        assert_eq!(
            validate_filename(".."),
            Err(PathValidationError::ContainsParentDir)
        );
    }

    #[test]
    fn test_validate_filename_absolute_path() {
        assert_eq!(
            validate_filename("/etc/passwd"),
            Err(PathValidationError::AbsolutePath)
        );
    }

    #[test]
    fn test_validate_filename_nested_path() {
        assert_eq!(
            validate_filename("photos/front.jpg"),
            Err(PathValidationError::NotAFileName)
        );
        assert_eq!(
            validate_filename("photos\\front.jpg"),
            Err(PathValidationError::NotAFileName)
        );
        assert_eq!(
            validate_filename("front.jpg/"),
            Err(PathValidationError::NotAFileName)
        );
    }

    #[test]
    fn test_validate_filename_empty_and_null() {
        assert_eq!(validate_filename(""), Err(PathValidationError::Empty));
        assert_eq!(validate_filename("   "), Err(PathValidationError::Empty));
        assert_eq!(
            validate_filename("front\0.jpg"),
            Err(PathValidationError::NullByte)
        );
    }

    #[test]
    fn test_validate_filename_current_dir() {
        assert!(validate_filename(".").is_err());
        assert!(validate_filename("./front.jpg").is_err());
    }
}
