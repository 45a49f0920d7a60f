//! CLI tool for packing a directory of PNGs into one atlas plus a
//! TexturePacker-compatible JSON manifest

use anyhow::{bail, Context, Result};
use clap::Parser;
use jam_kit::loaders::write_manifest;
use jam_kit::sprites::{create_packed_sheet, pack, save_debug, utilization};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "atlas_pack")]
#[command(about = "Pack a directory of PNG images into a single texture atlas")]
struct Args {
    /// Directory containing the PNG images to pack
    input: PathBuf,

    /// Output atlas image
    #[arg(short, long, default_value = "atlas.png")]
    output: PathBuf,

    /// Output manifest (defaults to the atlas path with a .json extension)
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Atlas width in pixels
    #[arg(long, default_value = "512")]
    width: u32,

    /// Atlas height in pixels
    #[arg(long, default_value = "512")]
    height: u32,

    /// Keep directory order instead of packing the tallest images first
    #[arg(long)]
    no_sort: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if args.width == 0 || args.height == 0 {
        bail!("atlas dimensions must be non-zero");
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    paths.sort();

    let mut images = Vec::with_capacity(paths.len());
    for path in &paths {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Non UTF-8 file name {}", path.display()))?
            .to_string();
        let image = image::open(path)
            .with_context(|| format!("Failed to load {}", path.display()))?
            .to_rgba8();
        images.push((name, image));
    }
    if !args.no_sort {
        // Stable sort keeps names in order among equal heights
        images.sort_by(|a, b| b.1.height().cmp(&a.1.height()));
    }

    let mut atlas = create_packed_sheet(args.width, args.height);
    for (name, image) in &images {
        pack(&mut atlas, name, image).with_context(|| format!("Failed to pack {}", name))?;
    }
    log::info!(
        "Packed {} images into {}x{} ({:.1}% used, {} shelves)",
        images.len(),
        args.width,
        args.height,
        utilization(&atlas) * 100.0,
        atlas.shelves.len()
    );

    save_debug(&atlas, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let manifest_path = args
        .manifest
        .clone()
        .unwrap_or_else(|| args.output.with_extension("json"));
    let image_name = args
        .output
        .file_name()
        .and_then(|name| name.to_str())
        .context("Atlas path has no file name")?;
    let json = write_manifest(&atlas, image_name)?;
    std::fs::write(&manifest_path, json)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    log::info!(
        "Wrote {} and {}",
        args.output.display(),
        manifest_path.display()
    );
    Ok(())
}
