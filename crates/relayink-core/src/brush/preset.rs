//! Brush presets and the static preset catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

/// Stroke algorithm used by a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrushEngine {
    /// Hard segment with optional taper and jitter.
    #[default]
    Solid,
    /// Radial-gradient dabs.
    Soft,
    /// Solid geometry whose alpha fades with stroke length.
    Fade,
    /// Scattered particles.
    Spray,
}

impl BrushEngine {
    /// Display name for this engine.
    pub fn name(self) -> &'static str {
        match self {
            BrushEngine::Solid => "Solid",
            BrushEngine::Soft => "Soft",
            BrushEngine::Fade => "Fade",
            BrushEngine::Spray => "Spray",
        }
    }
}

fn default_opacity() -> f64 {
    1.0
}

fn default_hardness() -> f64 {
    1.0
}

fn default_density() -> f64 {
    1.0
}

fn default_texture() -> String {
    "none".to_string()
}

/// Immutable parameter set selecting a stroke algorithm and its tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushPreset {
    pub id: String,
    pub engine: BrushEngine,
    /// Default brush size in logical units.
    pub size: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_hardness")]
    pub hardness: f64,
    #[serde(default)]
    pub taper: f64,
    #[serde(default)]
    pub jitter: f64,
    #[serde(default = "default_density")]
    pub density: f64,
    /// Particle radius range for spray, in logical units.
    #[serde(default)]
    pub particle_size_range: Option<(f64, f64)>,
    #[serde(default)]
    pub drip: bool,
    #[serde(default = "default_texture")]
    pub texture: String,
}

impl BrushPreset {
    /// Create a preset with neutral parameters.
    pub fn new(id: impl Into<String>, engine: BrushEngine) -> Self {
        Self {
            id: id.into(),
            engine,
            size: 8.0,
            opacity: 1.0,
            hardness: 1.0,
            taper: 0.0,
            jitter: 0.0,
            density: 1.0,
            particle_size_range: None,
            drip: false,
            texture: default_texture(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self.normalized()
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self.normalized()
    }

    pub fn with_hardness(mut self, hardness: f64) -> Self {
        self.hardness = hardness;
        self.normalized()
    }

    pub fn with_taper(mut self, taper: f64) -> Self {
        self.taper = taper;
        self.normalized()
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self.normalized()
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self.normalized()
    }

    pub fn with_particle_size_range(mut self, min: f64, max: f64) -> Self {
        self.particle_size_range = Some((min, max));
        self.normalized()
    }

    pub fn with_drip(mut self, drip: bool) -> Self {
        self.drip = drip;
        self
    }

    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = texture.into();
        self
    }

    /// Clamp every parameter into its valid range.
    pub fn normalized(mut self) -> Self {
        fn unit(v: f64, fallback: f64) -> f64 {
            if v.is_finite() { v.clamp(0.0, 1.0) } else { fallback }
        }
        self.size = if self.size.is_finite() { self.size.max(0.5) } else { 8.0 };
        self.opacity = unit(self.opacity, 1.0);
        self.hardness = unit(self.hardness, 1.0);
        self.taper = unit(self.taper, 0.0);
        self.jitter = unit(self.jitter, 0.0);
        self.density = if self.density.is_finite() { self.density.max(0.1) } else { 1.0 };
        self.particle_size_range = self.particle_size_range.and_then(|(min, max)| {
            if !(min.is_finite() && max.is_finite()) {
                return None;
            }
            let min = min.max(0.1);
            Some((min, max.max(min)))
        });
        self
    }
}

/// Errors raised while loading a preset catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Catalog contains no presets")]
    Empty,
    #[error("Duplicate preset id: {0}")]
    DuplicateId(String),
}

/// Read-only collection of brush presets, looked up by id.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushCatalog {
    presets: Vec<BrushPreset>,
}

impl BrushCatalog {
    /// Build a catalog, normalizing presets and rejecting duplicate ids.
    pub fn new(presets: Vec<BrushPreset>) -> Result<Self, CatalogError> {
        if presets.is_empty() {
            return Err(CatalogError::Empty);
        }
        {
            let mut seen = HashSet::new();
            for preset in &presets {
                if !seen.insert(preset.id.as_str()) {
                    return Err(CatalogError::DuplicateId(preset.id.clone()));
                }
            }
        }
        Ok(Self {
            presets: presets.into_iter().map(BrushPreset::normalized).collect(),
        })
    }

    /// Load a catalog from a JSON array of presets.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let presets: Vec<BrushPreset> = serde_json::from_str(json)?;
        Self::new(presets)
    }

    /// The built-in catalog, created once.
    pub fn builtin() -> &'static BrushCatalog {
        static BUILTIN: OnceLock<BrushCatalog> = OnceLock::new();
        BUILTIN.get_or_init(|| BrushCatalog {
            presets: builtin_presets(),
        })
    }

    /// Get a preset by id.
    pub fn get(&self, id: &str) -> Option<&BrushPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// The first preset, used when nothing else is selected.
    pub fn default_preset(&self) -> &BrushPreset {
        // Construction guarantees at least one preset
        &self.presets[0]
    }

    /// Iterate presets in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &BrushPreset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for BrushCatalog {
    fn default() -> Self {
        Self::builtin().clone()
    }
}

fn builtin_presets() -> Vec<BrushPreset> {
    vec![
        BrushPreset::new("pencil", BrushEngine::Solid)
            .with_size(3.0)
            .with_taper(0.2)
            .with_texture("graphite"),
        BrushPreset::new("ink", BrushEngine::Solid)
            .with_size(6.0)
            .with_taper(0.6),
        BrushPreset::new("chalk", BrushEngine::Solid)
            .with_size(10.0)
            .with_opacity(0.85)
            .with_jitter(0.15)
            .with_texture("grain"),
        BrushPreset::new("marker", BrushEngine::Fade)
            .with_size(14.0)
            .with_opacity(0.8),
        BrushPreset::new("airbrush", BrushEngine::Soft)
            .with_size(28.0)
            .with_opacity(0.45)
            .with_hardness(0.2),
        BrushPreset::new("watercolor", BrushEngine::Soft)
            .with_size(22.0)
            .with_opacity(0.3)
            .with_hardness(0.6)
            .with_texture("paper"),
        BrushPreset::new("spray", BrushEngine::Spray)
            .with_size(24.0)
            .with_opacity(0.9),
        BrushPreset::new("drip", BrushEngine::Spray)
            .with_size(18.0)
            .with_density(0.8)
            .with_particle_size_range(0.6, 2.2)
            .with_drip(true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = BrushCatalog::builtin();
        assert_eq!(catalog.default_preset().id, "pencil");
        assert!(catalog.get("spray").is_some());
        assert!(catalog.get("missing").is_none());
        assert!(catalog.get("drip").is_some_and(|p| p.drip));

        // Every engine is represented
        let engines = [
            BrushEngine::Solid,
            BrushEngine::Soft,
            BrushEngine::Fade,
            BrushEngine::Spray,
        ];
        for engine in engines {
            assert!(catalog.iter().any(|p| p.engine == engine), "{}", engine.name());
        }
    }

    #[test]
    fn test_normalized_clamps() {
        let preset = BrushPreset::new("x", BrushEngine::Solid)
            .with_opacity(1.7)
            .with_hardness(-1.0)
            .with_density(0.0)
            .with_particle_size_range(3.0, 1.0);
        assert!((preset.opacity - 1.0).abs() < f64::EPSILON);
        assert!(preset.hardness.abs() < f64::EPSILON);
        assert!((preset.density - 0.1).abs() < f64::EPSILON);
        assert_eq!(preset.particle_size_range, Some((3.0, 3.0)));
    }

    #[test]
    fn test_from_json_defaults() {
        let json = r#"[
            {"id": "a", "engine": "spray", "size": 12, "particle_size_range": [1, 2]},
            {"id": "b", "engine": "soft", "size": 20, "opacity": 0.5, "hardness": 0.3}
        ]"#;
        let catalog = BrushCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let a = catalog.get("a").unwrap();
        assert_eq!(a.engine, BrushEngine::Spray);
        assert!((a.opacity - 1.0).abs() < f64::EPSILON);
        assert_eq!(a.particle_size_range, Some((1.0, 2.0)));
        assert_eq!(a.texture, "none");

        let b = catalog.get("b").unwrap();
        assert!((b.hardness - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_json_rejects_duplicates_and_empty() {
        let dup = r#"[
            {"id": "a", "engine": "solid", "size": 1},
            {"id": "a", "engine": "fade", "size": 2}
        ]"#;
        assert!(matches!(
            BrushCatalog::from_json(dup),
            Err(CatalogError::DuplicateId(id)) if id == "a"
        ));
        assert!(matches!(BrushCatalog::from_json("[]"), Err(CatalogError::Empty)));
        assert!(matches!(BrushCatalog::from_json("{"), Err(CatalogError::Parse(_))));
    }
}
