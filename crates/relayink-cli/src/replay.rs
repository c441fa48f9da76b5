//! Drive a [`DrawingEngine`] through a session script.

use crate::script::{PointerStep, Script, Step};
use kurbo::Point;
use relayink_core::{
    BrushCatalog, Buttons, CatalogError, DrawingEngine, EngineError, InputEvent, RasterSurface,
    encode_png,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Script parse error: {0}")]
    Script(#[from] serde_json::Error),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Step {index} failed: {source}")]
    Step {
        index: usize,
        #[source]
        source: EngineError,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;

/// How a replay is run.
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Overrides the script's random seed.
    pub seed: Option<u64>,
    /// Replaces the built-in brush catalog.
    pub catalog: Option<BrushCatalog>,
    /// Fail on the first rejected step instead of skipping it.
    pub strict: bool,
}

/// Counts reported after a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    /// Steps the engine rejected (bad color, unknown preset, unreadable reference).
    pub rejected: usize,
}

/// Read a file, attaching the path to any error.
pub fn read_file(path: &Path) -> ReplayResult<String> {
    std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a file, attaching the path to any error.
pub fn write_file(path: &Path, bytes: &[u8]) -> ReplayResult<()> {
    std::fs::write(path, bytes).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a script file.
pub fn load_script(path: &Path) -> ReplayResult<Script> {
    Ok(Script::from_json(&read_file(path)?)?)
}

/// Load a brush catalog file.
pub fn load_catalog(path: &Path) -> ReplayResult<BrushCatalog> {
    Ok(BrushCatalog::from_json(&read_file(path)?)?)
}

/// Build an engine for a script and run every step.
pub fn replay(
    script: &Script,
    options: &ReplayOptions,
) -> ReplayResult<(DrawingEngine, ReplaySummary)> {
    let mut config = script.config.clone();
    if let Some(seed) = options.seed {
        config.rng_seed = Some(seed);
    }
    let mut engine = match &options.catalog {
        Some(catalog) => DrawingEngine::with_catalog(config, catalog.clone()),
        None => DrawingEngine::new(config),
    };
    engine.initialize_surface(script.width, script.height, script.dpr)?;

    let mut summary = ReplaySummary::default();
    for (index, step) in script.steps.iter().enumerate() {
        summary.steps += 1;
        if let Err(source) = apply_step(&mut engine, step) {
            if options.strict {
                return Err(ReplayError::Step { index, source });
            }
            log::warn!("Skipping step {index}: {source}");
            summary.rejected += 1;
        }
    }

    log::info!("Replayed {} steps ({} rejected)", summary.steps, summary.rejected);
    Ok((engine, summary))
}

/// Apply one step to the engine.
pub fn apply_step(engine: &mut DrawingEngine, step: &Step) -> Result<(), EngineError> {
    match step {
        Step::Color { hex } => engine.set_color_hex(hex)?,
        Step::Preset { id } => engine.select_preset(id)?,
        Step::Size { size } => engine.set_brush_size(*size),
        Step::Tool { tool } => engine.set_tool(*tool),
        Step::Zoom { zoom } => engine.set_user_zoom(*zoom),
        Step::Resize { width, height } => engine.resize_viewport(*width, *height),
        Step::Disable { disabled } => engine.set_disabled(*disabled),
        Step::Down(pointer) => engine.pointer_down(&pointer.to_event()),
        Step::Move(pointer) => engine.pointer_move(&pointer.to_event()),
        Step::Up(pointer) => engine.pointer_up(&pointer.to_event()),
        Step::Leave(pointer) => engine.pointer_leave(&pointer.to_event()),
        Step::Stroke { pointer, device, points } => {
            let events: Vec<InputEvent> = points
                .iter()
                .map(|&(x, y)| {
                    PointerStep {
                        pointer: *pointer,
                        device: *device,
                        buttons: Buttons::PRIMARY,
                        x,
                        y,
                        screen: None,
                    }
                    .to_event()
                })
                .collect();
            if let Some((first, rest)) = events.split_first() {
                engine.pointer_down(first);
                for event in rest {
                    engine.pointer_move(event);
                }
                engine.pointer_up(events.last().unwrap_or(first));
            }
        }
        Step::Fill { x, y } => {
            engine.flood_fill(Point::new(*x, *y));
        }
        Step::Undo => {
            engine.undo();
        }
        Step::Clear => engine.clear()?,
        Step::Reference { source } => engine.load_reference_image(source)?,
        Step::ClearReference => engine.clear_reference_image(),
        Step::Onion { opacity, placement } => {
            if let Some(opacity) = opacity {
                engine.set_onion_opacity(*opacity);
            }
            if let Some(placement) = placement {
                engine.set_onion_placement(*placement);
            }
        }
    }
    Ok(())
}

/// Encode the replay result: the bare surface, or the onion composite.
pub fn render_output(engine: &DrawingEngine, composite: bool) -> ReplayResult<Vec<u8>> {
    if !composite {
        return Ok(engine.export_png()?);
    }
    let surface = engine.surface().ok_or(EngineError::NotInitialized)?;
    let frame = engine.compose_frame()?;
    Ok(encode_png(surface.width(), surface.height(), &frame)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(json: &str) -> Script {
        Script::from_json(json).unwrap()
    }

    #[test]
    fn test_fill_scenario() {
        let script = script(
            r##"{"width": 10, "height": 10, "steps": [
                {"type": "color", "hex": "#FF0000"},
                {"type": "tool", "tool": "fill"},
                {"type": "down", "x": 5, "y": 5},
                {"type": "up", "x": 5, "y": 5}
            ]}"##,
        );
        let (engine, summary) = replay(&script, &ReplayOptions::default()).unwrap();
        assert_eq!(summary, ReplaySummary { steps: 4, rejected: 0 });
        let surface = engine.surface().unwrap();
        assert!(surface.as_rgba().chunks_exact(4).all(|px| px == [255, 0, 0, 255]));
    }

    #[test]
    fn test_rejected_steps_are_skipped() {
        let script = script(
            r##"{"width": 8, "height": 8, "steps": [
                {"type": "color", "hex": "#00ff00"},
                {"type": "color", "hex": "not-a-color"},
                {"type": "preset", "id": "missing"},
                {"type": "fill", "x": 1, "y": 1}
            ]}"##,
        );
        let (engine, summary) = replay(&script, &ReplayOptions::default()).unwrap();
        assert_eq!(summary.rejected, 2);
        assert_eq!(engine.surface().unwrap().get_pixel(7, 7), Some([0, 255, 0, 255]));
    }

    #[test]
    fn test_strict_stops_at_first_rejection() {
        let script = script(
            r#"{"width": 8, "height": 8, "steps": [
                {"type": "undo"},
                {"type": "preset", "id": "missing"}
            ]}"#,
        );
        let options = ReplayOptions {
            strict: true,
            ..Default::default()
        };
        let err = replay(&script, &options).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Step { index: 1, source: EngineError::UnknownPreset(_) }
        ));
    }

    #[test]
    fn test_oversized_surface_fails_replay() {
        let script = script(r#"{"width": 100000, "height": 100000, "dpr": 1000, "steps": []}"#);
        let err = replay(&script, &ReplayOptions::default()).unwrap_err();
        assert!(matches!(err, ReplayError::Engine(EngineError::SurfaceTooLarge { .. })));
    }

    #[test]
    fn test_stroke_then_undo() {
        let script = script(
            r#"{"width": 40, "height": 40, "steps": [
                {"type": "stroke", "points": [[5, 20], [20, 20], [35, 20]]}
            ]}"#,
        );
        let (mut engine, _) = replay(&script, &ReplayOptions::default()).unwrap();
        assert_ne!(engine.surface().unwrap().get_pixel(20, 20), Some([255, 255, 255, 255]));
        assert!(!engine.arbiter().is_drawing());
        assert!(engine.undo());
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_seed_makes_spray_reproducible() {
        let script = script(
            r#"{"width": 60, "height": 60, "steps": [
                {"type": "preset", "id": "spray"},
                {"type": "stroke", "points": [[10, 10], [50, 50]]}
            ]}"#,
        );
        let options = ReplayOptions {
            seed: Some(99),
            ..Default::default()
        };
        let (a, _) = replay(&script, &options).unwrap();
        let (b, _) = replay(&script, &options).unwrap();
        assert_eq!(a.surface().unwrap().as_rgba(), b.surface().unwrap().as_rgba());
    }

    #[test]
    fn test_custom_catalog() {
        let json = r#"[{"id": "fat", "engine": "solid", "size": 20}]"#;
        let catalog = BrushCatalog::from_json(json).unwrap();
        let script = script(
            r#"{"width": 50, "height": 50, "steps": [
                {"type": "preset", "id": "fat"},
                {"type": "down", "x": 25, "y": 25}
            ]}"#,
        );
        let options = ReplayOptions {
            catalog: Some(catalog),
            ..Default::default()
        };
        let (engine, summary) = replay(&script, &options).unwrap();
        assert_eq!(summary.rejected, 0);
        assert!((engine.brush_size() - 20.0).abs() < f64::EPSILON);
        // A 20-wide dot fully covers pixels 8 px from its center
        assert_eq!(engine.surface().unwrap().get_pixel(33, 25), Some([0, 0, 0, 255]));
    }
}
