//! Format-specific metadata handlers and the registry that picks one per file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::error::LibraryError;
use super::id3::Id3Codec;
use super::model::Track;
use super::tags::TagCodec;
use super::wav::WavCodec;

/// Loads and saves the metadata of one container format.
pub trait Codec: Send + Sync {
    fn load(&self, path: &Path) -> Result<Track, LibraryError>;

    /// Persist `track`'s metadata and return what was written.
    fn save(&self, track: &Track) -> Result<Track, LibraryError>;

    /// Whether `save` actually writes anything.
    fn writable(&self) -> bool {
        false
    }
}

/// Lower-cased extension without the dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .map(normalize_extension)
        .unwrap_or_default()
}

/// Maps normalized file extensions to codecs.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `codec` for `ext`, replacing any previous handler.
    pub fn register(&mut self, ext: &str, codec: Arc<dyn Codec>) -> &mut Self {
        self.codecs.insert(normalize_extension(ext), codec);
        self
    }

    /// Codec responsible for `path`.
    pub fn resolve(&self, path: &Path) -> Result<Arc<dyn Codec>, LibraryError> {
        let ext = extension_of(path);
        self.codecs
            .get(&ext)
            .cloned()
            .ok_or_else(|| LibraryError::UnsupportedExtension {
                ext,
                path: path.to_path_buf(),
            })
    }
}

/// Registry with every built-in format.
pub fn default_registry(rating_tag: &str) -> CodecRegistry {
    let tags: Arc<dyn Codec> = Arc::new(TagCodec);
    let mut registry = CodecRegistry::new();
    registry
        .register("mp3", Arc::new(Id3Codec::new(rating_tag)))
        .register("flac", tags.clone())
        .register("ogg", tags)
        .register("wav", Arc::new(WavCodec));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_case_insensitive() {
        let registry = default_registry("shellac");
        assert!(registry.resolve(Path::new("/music/A.MP3")).is_ok());
        assert!(registry.resolve(Path::new("/music/b.Flac")).is_ok());
        assert!(registry.resolve(Path::new("/music/c.OGG")).is_ok());
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let registry = default_registry("shellac");
        let err = match registry.resolve(Path::new("/music/cover.jpg")) {
            Err(e) => e,
            Ok(_) => panic!("jpg should not resolve"),
        };
        assert!(matches!(
            err,
            LibraryError::UnsupportedExtension { ref ext, .. } if ext == "jpg"
        ));
        assert!(registry.resolve(Path::new("/music/noext")).is_err());
    }

    #[test]
    fn registering_new_formats_needs_no_dispatch_changes() {
        let mut registry = default_registry("shellac");
        assert!(registry.resolve(Path::new("x.opus")).is_err());
        registry.register(".Opus", Arc::new(TagCodec));
        assert!(registry.resolve(Path::new("x.opus")).is_ok());
    }
}
