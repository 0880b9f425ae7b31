//! # Carterie CLI
//!
//! Usage:
//!   carterie params.json -o card.jpg
//!   carterie -o card.jpg                     (persisted or default params)
//!   carterie --sheet ./generated -o sheet.pdf --margin 10 --width 63
//!   carterie --example > params.json
//!   carterie --list-fonts ./fonts
//!   carterie --list-backgrounds ./backgrounds
//!
//! `--fonts DIR` points at the font directory; `--save-defaults` persists
//! the rendered parameters as the new startup defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use carterie::model::{CardParams, SheetSpec, TextBlock};
use carterie::{assets, config, export_jpeg, font, FontLibrary};

/// Where "save as defaults" puts the parameter blob.
const CONFIG_PATH: &str = "config/params.json";

fn main() -> ExitCode {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_params_json());
        return ExitCode::SUCCESS;
    }

    if let Some(dir) = flag_value(&args, "--list-fonts") {
        for (name, path) in font::scan_fonts(Path::new(&dir)) {
            println!("{name}\t{}", path.display());
        }
        return ExitCode::SUCCESS;
    }

    if let Some(dir) = flag_value(&args, "--list-backgrounds") {
        for path in assets::scan_backgrounds(Path::new(&dir)) {
            println!("{}", path.display());
        }
        return ExitCode::SUCCESS;
    }

    if let Some(dir) = flag_value(&args, "--sheet") {
        return run_sheet(&args, Path::new(&dir));
    }

    run_card(&args)
}

fn run_card(args: &[String]) -> ExitCode {
    let params = match load_params(args) {
        Ok(params) => params,
        Err(e) => {
            eprintln!("✗ {e}");
            return ExitCode::FAILURE;
        }
    };

    let font_dir = flag_value(args, "--fonts").map(PathBuf::from);
    let fonts = FontLibrary::new(font_dir);

    let output_path = flag_value(args, "-o").unwrap_or_else(|| "card.jpg".to_string());
    let img = carterie::render(&params, &fonts);
    if let Err(e) = export_jpeg(&img, Path::new(&output_path)) {
        eprintln!("✗ {e}");
        return ExitCode::FAILURE;
    }
    eprintln!("✓ Written {}x{} card to {}", img.width(), img.height(), output_path);

    if args.iter().any(|a| a == "--save-defaults") {
        if let Err(e) = config::save(Path::new(CONFIG_PATH), &params) {
            eprintln!("✗ failed to save defaults: {e}");
            return ExitCode::FAILURE;
        }
        eprintln!("✓ Saved parameters as defaults ({CONFIG_PATH})");
    }

    ExitCode::SUCCESS
}

fn run_sheet(args: &[String], image_dir: &Path) -> ExitCode {
    let spec = SheetSpec {
        image_dir: image_dir.to_path_buf(),
        margin_mm: parse_flag_or(args, "--margin", 10.0),
        photo_width_mm: parse_flag_or(args, "--width", 63.0),
        ..SheetSpec::default()
    };

    let output_path = flag_value(args, "-o").unwrap_or_else(|| "sheet.pdf".to_string());
    match carterie::build_sheet(&spec) {
        Ok(pdf_bytes) => {
            if let Err(e) = fs::write(&output_path, &pdf_bytes) {
                eprintln!("✗ failed to write {output_path}: {e}");
                return ExitCode::FAILURE;
            }
            eprintln!("✓ Written {} bytes to {}", pdf_bytes.len(), output_path);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {e}");
            ExitCode::FAILURE
        }
    }
}

/// Parameters come from the first non-flag argument, else the persisted
/// blob, else the built-in defaults.
fn load_params(args: &[String]) -> Result<CardParams, carterie::CardError> {
    let mut skip_next = false;
    for arg in &args[1..] {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with('-') {
            skip_next = matches!(arg.as_str(), "-o" | "--fonts" | "--margin" | "--width" | "--sheet");
            continue;
        }
        let json = fs::read_to_string(arg)?;
        return Ok(serde_json::from_str(&json)?);
    }
    Ok(config::load(Path::new(CONFIG_PATH)).unwrap_or_default())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].clone())
}

fn parse_flag_or(args: &[String], flag: &str, default: f64) -> f64 {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn example_params_json() -> String {
    let mut params = CardParams::default();
    params.title.text = "Griffon".to_string();
    params.text.blocks = vec![
        TextBlock {
            title: "Attaque".to_string(),
            body: "Griffes et bec, 2 points de dégâts".to_string(),
            comment: "(commune)".to_string(),
        },
        TextBlock {
            title: String::new(),
            body: "Vole par-dessus les obstacles du plateau".to_string(),
            comment: String::new(),
        },
    ];
    let mut json = serde_json::to_string_pretty(&params).expect("default params serialize");
    json.push('\n');
    json
}
