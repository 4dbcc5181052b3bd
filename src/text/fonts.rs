use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::assets::{SourceRef, SourceResolver};
use crate::foundation::error::{TesseraError, TesseraResult};

/// Weight and slant a face is registered with, or a run asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceStyle {
    pub weight: u16,
    pub italic: bool,
}

impl FaceStyle {
    pub const REGULAR: Self = Self::new(400, false);
    pub const BOLD: Self = Self::new(700, false);

    pub const fn new(weight: u16, italic: bool) -> Self {
        Self { weight, italic }
    }

    /// Lower is closer. Slant outranks weight.
    fn distance(self, want: FaceStyle) -> (bool, u16) {
        (self.italic != want.italic, self.weight.abs_diff(want.weight))
    }
}

impl Default for FaceStyle {
    fn default() -> Self {
        Self::REGULAR
    }
}

/// Font bytes registered under a family name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFace {
    pub name: String,
    pub style: FaceStyle,
    /// Source key or content hash; unique per registry.
    pub key: String,
    pub bytes: Arc<Vec<u8>>,
}

#[derive(Default)]
struct Inner {
    faces: Vec<Arc<FontFace>>,
    by_name: HashMap<String, Vec<usize>>,
    by_source: HashMap<String, usize>,
}

/// Fonts available to text rendering. Shared across renders; entries are never evicted.
///
/// A family may hold several faces; [`FontRegistry::resolve`] picks the closest style.
#[derive(Default)]
pub struct FontRegistry {
    inner: RwLock<Inner>,
}

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First well-known sans-serif font file present on this machine.
pub fn system_font_path() -> Option<PathBuf> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
}

/// Bold sibling of [`system_font_path`], when the family ships one next to it.
pub fn system_bold_font_path() -> Option<PathBuf> {
    let regular = system_font_path()?;
    let file = regular.file_name()?.to_str()?;
    let bold = match file {
        "DejaVuSans.ttf" => "DejaVuSans-Bold.ttf".to_owned(),
        "Arial.ttf" | "arial.ttf" => "Arial Bold.ttf".to_owned(),
        other => other.replace("-Regular", "-Bold"),
    };
    let path = regular.with_file_name(bold);
    (path != regular && path.is_file()).then_some(path)
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with a system font (and its bold face, if present) under the name
    /// `"sans-serif"`.
    pub fn with_system_fonts() -> Self {
        let registry = Self::new();
        let candidates = [
            (system_font_path(), FaceStyle::REGULAR),
            (system_bold_font_path(), FaceStyle::BOLD),
        ];
        for (path, style) in candidates {
            let Some(path) = path else { continue };
            match std::fs::read(&path) {
                Ok(bytes) => {
                    let source = format!("path:{}", path.display());
                    if let Err(e) = registry.insert("sans-serif", style, source, bytes) {
                        tracing::warn!(path = %path.display(), error = %e, "system font rejected");
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "system font unreadable")
                }
            }
        }
        registry
    }

    /// Register the regular face behind `source` under `name`.
    pub fn register(
        &self,
        name: &str,
        source: &SourceRef,
        resolver: &dyn SourceResolver,
    ) -> TesseraResult<Arc<FontFace>> {
        self.register_styled(name, FaceStyle::REGULAR, source, resolver)
    }

    /// Register the font behind `source` as the `style` face of family `name`. Registering
    /// the same source again returns the existing face.
    pub fn register_styled(
        &self,
        name: &str,
        style: FaceStyle,
        source: &SourceRef,
        resolver: &dyn SourceResolver,
    ) -> TesseraResult<Arc<FontFace>> {
        let key = source.key();
        if let Some(face) = self.by_source(&key)? {
            return Ok(face);
        }
        let bytes = resolver
            .resolve(source)
            .map_err(|e| TesseraError::resource(format!("font '{name}': {e}")))?;
        self.insert(name, style, key, bytes)
    }

    /// Register in-memory font bytes as a regular face, deduplicated by content hash.
    pub fn register_face(&self, name: &str, bytes: Vec<u8>) -> TesseraResult<Arc<FontFace>> {
        self.register_styled_face(name, FaceStyle::REGULAR, bytes)
    }

    pub fn register_styled_face(
        &self,
        name: &str,
        style: FaceStyle,
        bytes: Vec<u8>,
    ) -> TesseraResult<Arc<FontFace>> {
        let key = format!("bytes:{:016x}", xxhash_rust::xxh3::xxh3_64(&bytes));
        if let Some(face) = self.by_source(&key)? {
            return Ok(face);
        }
        self.insert(name, style, key, bytes)
    }

    /// Closest face of family `name` (the first registered family when `None`) to `want`.
    ///
    /// A matching slant beats a closer weight; ties go to the face registered first.
    pub fn resolve(&self, name: Option<&str>, want: FaceStyle) -> TesseraResult<Arc<FontFace>> {
        let inner = self.read()?;
        let family = match name {
            Some(n) => n,
            None => match inner.faces.first() {
                Some(face) => face.name.as_str(),
                None => return Err(TesseraError::resource("no fonts registered")),
            },
        };
        inner
            .by_name
            .get(family)
            .and_then(|idxs| idxs.iter().min_by_key(|&&i| inner.faces[i].style.distance(want)))
            .map(|&i| inner.faces[i].clone())
            .ok_or_else(|| TesseraError::resource(format!("font '{family}' is not registered")))
    }

    pub fn is_empty(&self) -> bool {
        self.read().map(|i| i.faces.is_empty()).unwrap_or(true)
    }

    pub fn len(&self) -> usize {
        self.read().map(|i| i.faces.len()).unwrap_or(0)
    }

    fn by_source(&self, key: &str) -> TesseraResult<Option<Arc<FontFace>>> {
        let inner = self.read()?;
        Ok(inner.by_source.get(key).map(|&i| inner.faces[i].clone()))
    }

    fn insert(
        &self,
        name: &str,
        style: FaceStyle,
        key: String,
        bytes: Vec<u8>,
    ) -> TesseraResult<Arc<FontFace>> {
        if bytes.is_empty() {
            return Err(TesseraError::resource(format!("font '{name}' has no bytes")));
        }
        let mut inner = self
            .inner
            .write()
            .map_err(|_| TesseraError::render("font registry lock poisoned"))?;
        if let Some(&i) = inner.by_source.get(&key) {
            return Ok(inner.faces[i].clone());
        }
        let face = Arc::new(FontFace {
            name: name.to_owned(),
            style,
            key: key.clone(),
            bytes: Arc::new(bytes),
        });
        let idx = inner.faces.len();
        inner.faces.push(face.clone());
        inner.by_name.entry(name.to_owned()).or_default().push(idx);
        inner.by_source.insert(key, idx);
        tracing::debug!(
            name,
            weight = style.weight,
            italic = style.italic,
            faces = idx + 1,
            "font registered"
        );
        Ok(face)
    }

    fn read(&self) -> TesseraResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| TesseraError::render("font registry lock poisoned"))
    }
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry").field("faces", &self.len()).finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/fonts.rs"]
mod tests;
