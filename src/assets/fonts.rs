use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{CardError, CardResult};

/// Family plus weight selector used by text draw ops.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontSpec {
    pub family: String,
    pub bold: bool,
}

impl FontSpec {
    pub fn regular(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            bold: false,
        }
    }

    pub fn bold(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            bold: true,
        }
    }
}

/// One registered face: raw font bytes plus the key it was registered under.
#[derive(Clone, Debug)]
pub struct FontFace {
    pub(crate) key: FaceKey,
    pub(crate) bytes: Arc<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct FaceKey {
    family: String,
    bold: bool,
}

impl FaceKey {
    fn new(family: &str, bold: bool) -> Self {
        Self {
            family: family.trim().to_ascii_lowercase(),
            bold,
        }
    }
}

/// Font Registry collaborator.
///
/// Filled once before the first render and then shared read-only (`Arc<FontRegistry>`) by every
/// render. Registering the same family/weight twice replaces the earlier face.
#[derive(Clone, Debug, Default)]
pub struct FontRegistry {
    faces: BTreeMap<FaceKey, FontFace>,
    default_family: Option<String>,
}

/// File names looked up by [`FontRegistry::from_dir`] for the default family.
pub const REGULAR_FONT_FILE: &str = "Helvetica.ttf";
pub const BOLD_FONT_FILE: &str = "HelveticaBold.ttf";
/// Family the bundled font files are registered under.
pub const DEFAULT_FAMILY: &str = "Helvetica";

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a face from raw TrueType/OpenType bytes.
    ///
    /// The first registered family becomes the fallback for unknown families.
    pub fn register(&mut self, family: &str, bold: bool, bytes: Vec<u8>) -> CardResult<()> {
        if family.trim().is_empty() {
            return Err(CardError::font("font family name must be non-empty"));
        }
        if bytes.len() < 12 {
            return Err(CardError::font(format!(
                "font data for '{family}' is too short to be a font file"
            )));
        }
        let key = FaceKey::new(family, bold);
        self.faces.insert(
            key.clone(),
            FontFace {
                key,
                bytes: Arc::new(bytes),
            },
        );
        if self.default_family.is_none() {
            self.default_family = Some(family.trim().to_string());
        }
        Ok(())
    }

    pub fn register_file(&mut self, family: &str, bold: bool, path: &Path) -> CardResult<()> {
        let bytes = std::fs::read(path).map_err(|e| {
            CardError::font(format!("failed to read font '{}': {e}", path.display()))
        })?;
        self.register(family, bold, bytes)
    }

    /// Load the bundled `Helvetica.ttf` / `HelveticaBold.ttf` pair from `dir`.
    ///
    /// Either file may be missing, but not both.
    pub fn from_dir(dir: &Path) -> CardResult<Self> {
        let mut reg = Self::new();
        for (file, bold) in [(REGULAR_FONT_FILE, false), (BOLD_FONT_FILE, true)] {
            let p = dir.join(file);
            if p.is_file() {
                reg.register_file(DEFAULT_FAMILY, bold, &p)?;
            }
        }
        if reg.is_empty() {
            return Err(CardError::font(format!(
                "no font files ({REGULAR_FONT_FILE}, {BOLD_FONT_FILE}) found in '{}'",
                dir.display()
            )));
        }
        Ok(reg)
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Resolve a face for `spec`.
    ///
    /// Lookup order: exact family and weight, same family other weight, default family with the
    /// requested weight, default family other weight.
    pub fn resolve(&self, spec: &FontSpec) -> CardResult<&FontFace> {
        let mut candidates = vec![
            FaceKey::new(&spec.family, spec.bold),
            FaceKey::new(&spec.family, !spec.bold),
        ];
        if let Some(default) = &self.default_family {
            candidates.push(FaceKey::new(default, spec.bold));
            candidates.push(FaceKey::new(default, !spec.bold));
        }
        candidates
            .iter()
            .find_map(|k| self.faces.get(k))
            .ok_or_else(|| {
                CardError::font(format!(
                    "no font registered for family '{}' (and no fallback)",
                    spec.family
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_font() -> Vec<u8> {
        vec![0u8; 64]
    }

    #[test]
    fn resolve_prefers_exact_then_weight_then_default() {
        let mut reg = FontRegistry::new();
        reg.register("Helvetica", false, fake_font()).unwrap();
        reg.register("Helvetica", true, fake_font()).unwrap();
        reg.register("Mono", false, fake_font()).unwrap();

        let f = reg.resolve(&FontSpec::bold("helvetica")).unwrap();
        assert_eq!(f.key, FaceKey::new("Helvetica", true));

        let f = reg.resolve(&FontSpec::bold("Mono")).unwrap();
        assert_eq!(f.key, FaceKey::new("Mono", false));

        let f = reg.resolve(&FontSpec::regular("Unknown")).unwrap();
        assert_eq!(f.key, FaceKey::new("Helvetica", false));
    }

    #[test]
    fn empty_registry_is_a_font_error() {
        let reg = FontRegistry::new();
        let err = reg.resolve(&FontSpec::regular("Helvetica")).unwrap_err();
        assert!(matches!(err, CardError::Font(_)));
    }

    #[test]
    fn register_rejects_empty_inputs() {
        let mut reg = FontRegistry::new();
        assert!(reg.register("  ", false, fake_font()).is_err());
        assert!(reg.register("X", false, vec![1, 2]).is_err());
        assert!(reg.is_empty());
    }
}
