//! Apply one registered transform to an image file.
//!
//! cargo run --example apply_transform -- <input> <algorithm|preset> <output> [name=value ...]
//! cargo run --example apply_transform -- --list

use std::process::ExitCode;
use transform_lab::engine::{load_image, save_image};
use transform_lab::{ExecutionEngine, ImageBuffer, ParamValue, ParameterBinding, Preset};

struct Args {
    input: String,
    algorithm: String,
    output: String,
    overrides: Vec<(String, ParamValue)>,
}

fn parse_value(raw: &str) -> Option<ParamValue> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(ParamValue::Int(int));
    }
    raw.parse::<f64>().ok().map(ParamValue::Float)
}

fn args_from_env() -> Result<Option<Args>, String> {
    let mut positional = Vec::new();
    let mut overrides = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--list" || arg == "-l" {
            return Ok(None);
        }
        if let Some((name, raw)) = arg.split_once('=') {
            let value = parse_value(raw).ok_or_else(|| format!("'{raw}' is not a number"))?;
            overrides.push((name.to_string(), value));
        } else {
            positional.push(arg);
        }
    }
    match <[String; 3]>::try_from(positional) {
        Ok([input, algorithm, output]) => Ok(Some(Args {
            input,
            algorithm,
            output,
            overrides,
        })),
        Err(_) => Err("usage: apply_transform <input> <algorithm|preset> <output> [name=value ...]".into()),
    }
}

fn save_image_or_report(buffer: &ImageBuffer, path: &str) -> ExitCode {
    match save_image(buffer, path) {
        Ok(()) => {
            println!("wrote {path} ({}x{}, {} channel(s))", buffer.width(), buffer.height(), buffer.channels());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to save {path}: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_catalogue(engine: &ExecutionEngine) {
    for descriptor in engine.list_algorithms() {
        println!("{:<20} {} (accepts {}-channel input)", descriptor.id, descriptor.label, descriptor.accepts.describe());
        for spec in &descriptor.params {
            println!(
                "    {:<12} {} .. {} step {} (default {})",
                spec.name, spec.min, spec.max, spec.step, spec.default
            );
        }
    }
    println!("presets: {}", Preset::NAMES.join(", "));
}

fn main() -> ExitCode {
    let engine = match ExecutionEngine::from_env() {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let args = match args_from_env() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_catalogue(&engine);
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    // a preset name selects both the algorithm and its starting binding
    let (algorithm, mut binding): (String, ParameterBinding) = match Preset::get(&args.algorithm) {
        Some(preset) => (preset.algorithm.to_string(), preset.binding),
        None => match engine.default_binding(&args.algorithm) {
            Ok(binding) => (args.algorithm.clone(), binding),
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        },
    };
    for (name, value) in args.overrides {
        binding.set(name, value);
    }

    let input = match load_image(&args.input, &engine.config().limits) {
        Ok(buffer) => buffer,
        Err(err) => {
            eprintln!("failed to load {}: {err}", args.input);
            return ExitCode::FAILURE;
        }
    };

    match engine.run(&algorithm, &binding, &input) {
        Ok(output) => {
            if let Some(hint) = &output.diagnostic {
                eprintln!("hint: {hint}");
            }
            save_image_or_report(&output.buffer, &args.output)
        }
        Err(err) => {
            eprintln!("{algorithm} failed: {err}");
            ExitCode::FAILURE
        }
    }
}
