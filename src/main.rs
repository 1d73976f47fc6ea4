use std::path::{Path, PathBuf};
use std::process::ExitCode;

use shader_builder::{BuildSettings, FileAssetLoader, ShaderBuilder};

const USAGE: &str = "usage: shader-builder [--root DIR] [--settings FILE.json] [--set \"NAME=VALUE ...\"]... [--json] ENTRY";

struct Options {
    root: PathBuf,
    settings: BuildSettings,
    json: bool,
    entry: String,
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut root = PathBuf::from(".");
    let mut settings = BuildSettings::new();
    let mut json = false;
    let mut entry = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--root" => {
                root = iter.next().ok_or("--root needs a directory")?.into();
            }
            "--settings" => {
                let path = iter.next().ok_or("--settings needs a file")?;
                let loaded = BuildSettings::from_json_file(Path::new(path)).map_err(|e| e.to_string())?;
                settings.merge(loaded);
            }
            "--set" => {
                let text = iter.next().ok_or("--set needs NAME=VALUE")?;
                let parsed = BuildSettings::from_assignments(text).map_err(|e| e.to_string())?;
                settings.merge(parsed);
            }
            "--json" => json = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if other.starts_with("--") => return Err(format!("unknown option {}\n{}", other, USAGE)),
            other => {
                if entry.replace(other.to_string()).is_some() {
                    return Err(format!("more than one entry file given\n{}", USAGE));
                }
            }
        }
    }

    Ok(Options {
        root,
        settings,
        json,
        entry: entry.ok_or_else(|| USAGE.to_string())?,
    })
}

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let builder = ShaderBuilder::new(FileAssetLoader, &options.root);
    let result = match builder.build(&options.entry, &options.settings) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if options.json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", result.markup());
    }
    ExitCode::SUCCESS
}
