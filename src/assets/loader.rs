use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine as _;

use crate::assets::decode::{PreparedImage, decode_image_bytes};
use crate::foundation::error::{CardError, CardResult};

/// Opaque reference to an image, resolved by an [`ImageLoader`].
///
/// Loaders interpret the string: a relative path, a key, or an inline `data:` URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when the reference is an inline `data:` URI.
    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl From<&str> for ImageRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ImageRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Image Loader collaborator: resolves and decodes image references.
///
/// Loads for one render are independent and may run on several threads at once.
pub trait ImageLoader: Send + Sync {
    fn load(&self, reference: &ImageRef) -> CardResult<PreparedImage>;
}

impl<L: ImageLoader + ?Sized> ImageLoader for Arc<L> {
    fn load(&self, reference: &ImageRef) -> CardResult<PreparedImage> {
        (**self).load(reference)
    }
}

/// Decode an inline `data:[<mime>][;base64],<payload>` reference.
pub fn decode_data_uri(reference: &str) -> CardResult<PreparedImage> {
    let rest = reference
        .strip_prefix("data:")
        .ok_or_else(|| CardError::asset_load("not a data URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CardError::asset_load("data URI has no payload"))?;
    let bytes = if meta.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| CardError::asset_load(format!("invalid base64 in data URI: {e}")))?
    } else {
        payload.as_bytes().to_vec()
    };
    decode_image_bytes(&bytes)
}

/// Loads images from files below a root directory.
///
/// References are normalized and must stay inside the root: absolute paths and `..` segments
/// are rejected. Inline `data:` URIs are decoded directly.
#[derive(Clone, Debug)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, reference: &ImageRef) -> CardResult<PreparedImage> {
        if reference.is_data_uri() {
            return decode_data_uri(reference.as_str());
        }
        let norm = normalize_rel_path(reference.as_str())?;
        let p = self.root.join(Path::new(&norm));
        let bytes = std::fs::read(&p).map_err(|e| {
            CardError::asset_load(format!("failed to read image '{}': {e}", p.display()))
        })?;
        decode_image_bytes(&bytes)
            .map_err(|e| CardError::asset_load(format!("failed to decode '{}': {e}", p.display())))
    }
}

/// In-memory loader keyed by reference string.
///
/// Entries hold either encoded bytes (decoded on every load) or a prepared image.
#[derive(Clone, Debug, Default)]
pub struct MemoryImageLoader {
    entries: HashMap<String, MemoryEntry>,
}

#[derive(Clone, Debug)]
enum MemoryEntry {
    Encoded(Arc<Vec<u8>>),
    Prepared(PreparedImage),
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register encoded image bytes under `reference`.
    pub fn insert_bytes(&mut self, reference: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.entries
            .insert(reference.into(), MemoryEntry::Encoded(Arc::new(bytes)));
        self
    }

    /// Register an already decoded image under `reference`.
    pub fn insert_image(&mut self, reference: impl Into<String>, image: PreparedImage) -> &mut Self {
        self.entries
            .insert(reference.into(), MemoryEntry::Prepared(image));
        self
    }

    pub fn with_image(mut self, reference: impl Into<String>, image: PreparedImage) -> Self {
        self.insert_image(reference, image);
        self
    }
}

impl ImageLoader for MemoryImageLoader {
    fn load(&self, reference: &ImageRef) -> CardResult<PreparedImage> {
        if reference.is_data_uri() {
            return decode_data_uri(reference.as_str());
        }
        match self.entries.get(reference.as_str()) {
            Some(MemoryEntry::Prepared(img)) => Ok(img.clone()),
            Some(MemoryEntry::Encoded(bytes)) => decode_image_bytes(bytes).map_err(|e| {
                CardError::asset_load(format!("failed to decode '{reference}': {e}"))
            }),
            None => Err(CardError::asset_load(format!(
                "no image registered for '{reference}'"
            ))),
        }
    }
}

/// Normalize and validate root-relative paths.
///
/// The result uses `/` separators, drops `.` segments, and rejects absolute paths or parent
/// traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> CardResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(CardError::asset_load("image paths must be relative"));
    }
    if s.is_empty() {
        return Err(CardError::asset_load("image path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(CardError::asset_load("image paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(CardError::asset_load("image path must contain a file name"));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn normalize_path_slash_normalization() {
        assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
        assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
        assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
        assert!(normalize_rel_path("../x.png").is_err());
        assert!(normalize_rel_path("/abs.png").is_err());
        assert!(normalize_rel_path("").is_err());
    }

    #[test]
    fn data_uri_base64_decodes() {
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png_bytes())
        );
        let img = decode_data_uri(&uri).unwrap();
        assert_eq!((img.width, img.height), (2, 2));
    }

    #[test]
    fn memory_loader_reports_missing_as_asset_load() {
        let mut loader = MemoryImageLoader::new();
        loader.insert_bytes("ok", png_bytes());
        assert!(loader.load(&ImageRef::new("ok")).is_ok());
        assert!(loader.load(&ImageRef::new("nope")).unwrap_err().is_asset_load());
    }

    #[test]
    fn fs_loader_reads_relative_files() {
        let dir = std::env::temp_dir().join(format!("cardsmith-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.png"), png_bytes()).unwrap();

        let loader = FsImageLoader::new(&dir);
        assert!(loader.load(&ImageRef::new("a.png")).is_ok());
        assert!(loader.load(&ImageRef::new("missing.png")).is_err());
        assert!(loader.load(&ImageRef::new("../a.png")).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
