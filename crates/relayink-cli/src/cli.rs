//! Command-line arguments and the top-level run function.

use crate::replay::{
    ReplayOptions, ReplayResult, ReplaySummary, load_catalog, load_script, render_output, replay,
    write_file,
};
use clap::Parser;
use std::path::PathBuf;

/// Replay a RelayInk drawing session and write the resulting frame as PNG.
#[derive(Parser, Debug)]
#[command(name = "relayink", version, about = "Headless RelayInk session replay")]
pub struct CliArgs {
    /// Session script (JSON).
    #[arg(short, long, value_name = "SCRIPT.json")]
    pub script: PathBuf,

    /// Output PNG path.
    #[arg(short, long, value_name = "FILE")]
    pub out: PathBuf,

    /// Brush catalog (JSON array of presets) replacing the built-in one.
    #[arg(long, value_name = "CATALOG.json")]
    pub catalog: Option<PathBuf>,

    /// Seed for spray and jitter randomness.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the onion-skin composite instead of the bare surface.
    #[arg(long)]
    pub composite: bool,

    /// Fail on the first step the engine rejects.
    #[arg(long)]
    pub strict: bool,
}

/// Run a replay described by the arguments.
pub fn run(args: &CliArgs) -> ReplayResult<ReplaySummary> {
    let script = load_script(&args.script)?;
    let catalog = args.catalog.as_deref().map(load_catalog).transpose()?;
    let options = ReplayOptions {
        seed: args.seed,
        catalog,
        strict: args.strict,
    };

    let (engine, summary) = replay(&script, &options)?;
    let png = render_output(&engine, args.composite)?;
    write_file(&args.out, &png)?;
    log::info!("Wrote {} ({} bytes)", args.out.display(), png.len());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::ReplayError;
    use std::fs;

    fn args(dir: &tempfile::TempDir, script: &str) -> CliArgs {
        let script_path = dir.path().join("session.json");
        fs::write(&script_path, script).unwrap();
        CliArgs {
            script: script_path,
            out: dir.path().join("frame.png"),
            catalog: None,
            seed: Some(1),
            composite: false,
            strict: false,
        }
    }

    #[test]
    fn test_parse_args() {
        let args = CliArgs::try_parse_from([
            "relayink", "--script", "s.json", "-o", "out.png", "--seed", "4", "--composite",
        ])
        .unwrap();
        assert_eq!(args.script, PathBuf::from("s.json"));
        assert_eq!(args.out, PathBuf::from("out.png"));
        assert_eq!(args.seed, Some(4));
        assert!(args.composite);
        assert!(!args.strict);
        assert!(CliArgs::try_parse_from(["relayink", "--out", "x.png"]).is_err());
    }

    #[test]
    fn test_run_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(
            &dir,
            r##"{"width": 12, "height": 9, "dpr": 2, "steps": [
                {"type": "color", "hex": "#0000ff"},
                {"type": "fill", "x": 3, "y": 3}
            ]}"##,
        );
        let summary = run(&args).unwrap();
        assert_eq!(summary.steps, 2);

        let bytes = fs::read(&args.out).unwrap();
        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let reader = decoder.read_info().unwrap();
        assert_eq!((reader.info().width, reader.info().height), (24, 18));
    }

    #[test]
    fn test_run_with_catalog_and_composite() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("brushes.json");
        fs::write(&catalog_path, r#"[{"id": "dot", "engine": "solid", "size": 4}]"#).unwrap();

        let mut args = args(
            &dir,
            r#"{"width": 16, "height": 16, "steps": [
                {"type": "preset", "id": "dot"},
                {"type": "onion", "opacity": 0.5, "placement": "above"},
                {"type": "stroke", "points": [[2, 2], [14, 14]]}
            ]}"#,
        );
        args.catalog = Some(catalog_path);
        args.composite = true;
        args.strict = true;

        let summary = run(&args).unwrap();
        assert_eq!(summary.rejected, 0);
        assert!(args.out.exists());
    }

    #[test]
    fn test_missing_script_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(&dir, "{}");
        args.script = dir.path().join("nope.json");
        let err = run(&args).unwrap_err();
        assert!(matches!(err, ReplayError::Io { ref path, .. } if path.ends_with("nope.json")));
        assert!(!args.out.exists());
    }

    #[test]
    fn test_bad_script_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(&dir, r#"{"width": "wide"}"#);
        assert!(matches!(run(&args), Err(ReplayError::Script(_))));
    }
}
