use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use scene_forge_jsx::{
    GenerateOptions, Generator, load_scene_from_path,
    progress::{ProgressEvent, Stage},
};

#[derive(Debug, Default, Clone)]
struct Cli {
    scene: Option<PathBuf>,
    options: Option<PathBuf>,
    output: Option<PathBuf>,
    context_out: Option<PathBuf>,
    saved_context: Option<PathBuf>,
    precision: Option<u32>,
    switches: Vec<String>,
}

const SWITCHES: &[&str] = &[
    "--instance",
    "--instance-all",
    "--keep-names",
    "--keep-groups",
    "--debug",
    "--types",
    "--shadows",
    "--meta",
    "--no-light-rotation",
];

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let value = |name: &str| {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| anyhow!("missing value for {name}"))
        };
        match arg {
            "--scene" => cli.scene = Some(PathBuf::from(value(arg)?)),
            "--options" => cli.options = Some(PathBuf::from(value(arg)?)),
            "--output" => cli.output = Some(PathBuf::from(value(arg)?)),
            "--context-out" => cli.context_out = Some(PathBuf::from(value(arg)?)),
            "--saved-context" => cli.saved_context = Some(PathBuf::from(value(arg)?)),
            "--precision" => {
                let v = value(arg)?;
                cli.precision = Some(
                    v.parse()
                        .map_err(|e| anyhow!("invalid --precision {v:?}: {e}"))?,
                );
            }
            s if SWITCHES.contains(&s) => {
                cli.switches.push(s.to_string());
                i += 1;
                continue;
            }
            other => {
                return Err(anyhow!(
                    "unknown argument: {other} (supported: --scene <scene.json>, --options <options.json>, \
                     --output <file>, --context-out <file>, --saved-context <file>, --precision <n>, {})",
                    SWITCHES.join(", ")
                ));
            }
        }
        i += 2;
    }
    Ok(cli)
}

fn resolve_options(cli: &Cli) -> Result<GenerateOptions> {
    let mut options = match &cli.options {
        Some(path) => GenerateOptions::from_json_path(path)?,
        None => GenerateOptions::default(),
    };
    if let Some(p) = cli.precision {
        options.precision = p;
    }
    for switch in &cli.switches {
        match switch.as_str() {
            "--instance" => options.instance = true,
            "--instance-all" => options.instance_all = true,
            "--keep-names" => options.keep_names = true,
            "--keep-groups" => options.keep_groups = true,
            "--debug" => options.debug = true,
            "--types" => options.types = true,
            "--shadows" => options.shadows = true,
            "--meta" => options.meta = true,
            "--no-light-rotation" => options.light_rotation_controls = false,
            _ => {}
        }
    }
    Ok(options)
}

fn read_saved_context(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read saved context at {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse saved context at {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;
    let scene_path = cli
        .scene
        .as_deref()
        .ok_or_else(|| anyhow!("--scene <scene.json> is required"))?;

    let scene = load_scene_from_path(scene_path)?;
    let options = resolve_options(&cli)?;

    let (progress_tx, progress_rx) = crossbeam_channel::unbounded::<ProgressEvent>();
    let reporter = std::thread::spawn(move || {
        for event in progress_rx {
            let stage = match event.stage {
                Stage::Walk => "walk",
                Stage::Emit => "emit",
            };
            log::debug!("[{stage}] {}/{}", event.done, event.total);
        }
    });

    let mut generator = Generator::new(options).with_progress(&progress_tx);
    if let Some(path) = cli.saved_context.as_deref() {
        generator = generator.with_saved_context(read_saved_context(path)?);
    }
    let unit = generator.generate(&scene)?;
    drop(generator);
    drop(progress_tx);
    if reporter.join().is_err() {
        log::warn!("progress reporter thread panicked");
    }

    match cli.output.as_deref() {
        Some(path) => {
            std::fs::write(path, &unit.text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => print!("{}", unit.text),
    }

    if let Some(path) = cli.context_out.as_deref() {
        let blob = unit.context.to_blob().context("failed to serialize context")?;
        std::fs::write(path, blob)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("wrote context blob {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_cli_paths_and_switches() {
        let cli = parse_cli(&args(&[
            "--scene",
            "scene.json",
            "--instance",
            "--output",
            "Model.jsx",
            "--precision",
            "3",
            "--no-light-rotation",
        ]))
        .unwrap();
        assert_eq!(cli.scene.as_ref().unwrap(), &PathBuf::from("scene.json"));
        assert_eq!(cli.output.as_ref().unwrap(), &PathBuf::from("Model.jsx"));

        let options = resolve_options(&cli).unwrap();
        assert!(options.instance);
        assert_eq!(options.precision, 3);
        assert!(!options.light_rotation_controls);
        assert!(!options.types);
    }

    #[test]
    fn parse_cli_rejects_unknown_and_missing_values() {
        assert!(parse_cli(&args(&["--bogus"])).is_err());
        assert!(parse_cli(&args(&["--scene"])).is_err());
        assert!(parse_cli(&args(&["--precision", "two"])).is_err());
    }
}
