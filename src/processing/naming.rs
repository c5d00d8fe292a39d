//! Output file naming and per-batch collision tracking

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{CollisionPolicy, TargetFormat};
use crate::error::{Result, ResizerError};

/// Derive the output file name: source stem + "." + lowercased format name.
///
/// `photo.png` with JPEG becomes `photo.jpeg`; `archive.tar.gz` keeps `archive.tar`.
pub fn output_file_name(source: &Path, format: TargetFormat) -> Result<String> {
    let stem = source.file_stem().ok_or_else(|| {
        ResizerError::invalid_parameters(format!("Source has no file name: {:?}", source))
    })?;

    Ok(format!("{}.{}", stem.to_string_lossy(), format.extension()))
}

/// Output names already written in the current batch
#[derive(Debug)]
pub struct OutputNames {
    policy: CollisionPolicy,
    written: HashMap<String, PathBuf>,
}

impl OutputNames {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            written: HashMap::new(),
        }
    }

    /// Check whether `source` may write `name`.
    ///
    /// Only [`CollisionPolicy::Fail`] turns a collision into an error.
    pub fn check(&self, name: &str, source: &Path) -> Result<()> {
        let Some(previous) = self.written.get(name) else {
            return Ok(());
        };

        match self.policy {
            CollisionPolicy::Overwrite => {
                debug!("{} overwrites output {} from {:?}", source.display(), name, previous);
                Ok(())
            }
            CollisionPolicy::Warn => {
                warn!(
                    "Output name collision: {} from {} replaces the output of {}",
                    name,
                    source.display(),
                    previous.display()
                );
                Ok(())
            }
            CollisionPolicy::Fail => Err(ResizerError::collision(name, previous.clone())),
        }
    }

    /// Record a successful write
    pub fn record(&mut self, name: String, source: PathBuf) {
        self.written.insert(name, source);
    }

    pub(crate) fn len(&self) -> usize {
        self.written.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        let name = output_file_name(Path::new("in/photo.png"), TargetFormat::Jpeg).unwrap();
        assert_eq!(name, "photo.jpeg");

        let name = output_file_name(Path::new("in/archive.tar.gz"), TargetFormat::WebP).unwrap();
        assert_eq!(name, "archive.tar.webp");

        let name = output_file_name(Path::new("in/README"), TargetFormat::Png).unwrap();
        assert_eq!(name, "README.png");

        let name = output_file_name(Path::new("in/.hidden"), TargetFormat::Bmp).unwrap();
        assert_eq!(name, ".hidden.bmp");
    }

    #[test]
    fn test_output_file_name_requires_file_name() {
        assert!(output_file_name(Path::new("/"), TargetFormat::Jpeg).is_err());
    }

    #[test]
    fn test_collision_policies() {
        for policy in [CollisionPolicy::Overwrite, CollisionPolicy::Warn] {
            let mut names = OutputNames::new(policy);
            names.record("a.jpeg".to_string(), PathBuf::from("a.png"));
            assert!(names.check("a.jpeg", Path::new("a.webp")).is_ok());
        }

        let mut names = OutputNames::new(CollisionPolicy::Fail);
        assert!(names.check("a.jpeg", Path::new("a.png")).is_ok());
        names.record("a.jpeg".to_string(), PathBuf::from("a.png"));

        let err = names.check("a.jpeg", Path::new("a.webp")).unwrap_err();
        assert!(matches!(err, ResizerError::OutputCollision { .. }));
        assert!(names.check("b.jpeg", Path::new("b.png")).is_ok());
        assert_eq!(names.len(), 1);
    }
}
