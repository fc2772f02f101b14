use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bbm_core::{import_model_str, list_geometries, ImportOptions, SkeletonResult, DEFAULT_BONE_LENGTH};
use bbm_math::DVec3;
use clap::Parser;

/// Inspect a block-model geometry file
#[derive(Parser, Debug)]
#[command(name = "bbm_inspect")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Geometry JSON file
    path: PathBuf,

    /// Geometry identifier, with or without the "geometry." prefix
    #[arg(short, long)]
    geometry: Option<String>,

    /// Display length of emitted bones, in world units
    #[arg(long, default_value_t = DEFAULT_BONE_LENGTH)]
    bone_length: f64,

    /// List the geometries in the file and exit
    #[arg(short, long)]
    list: bool,
}

impl Args {
    fn import_options(&self) -> ImportOptions {
        let options = ImportOptions::default().with_bone_length(self.bone_length);
        match &self.geometry {
            Some(name) => options.with_geometry_name(name.as_str()),
            None => options,
        }
    }
}

fn fmt_vec(v: DVec3) -> String {
    format!("({:.4}, {:.4}, {:.4})", v.x, v.y, v.z)
}

/// Human-readable summary of an import.
fn report(result: &SkeletonResult) -> String {
    let skeleton = &result.skeleton;
    let mut out = String::new();

    let _ = writeln!(out, "Skeleton '{}' ({} bones)", skeleton.name, skeleton.bone_count());

    let mut stack: Vec<(usize, usize)> = skeleton.roots().map(|id| (id, 0)).collect();
    stack.reverse();
    while let Some((id, depth)) = stack.pop() {
        let Some(bone) = skeleton.bone(id) else {
            continue;
        };
        let _ = writeln!(
            out,
            "{}{}  head {}  tail {}",
            "  ".repeat(depth + 1),
            bone.name,
            fmt_vec(bone.head),
            fmt_vec(bone.tail)
        );

        let mut children: Vec<_> = skeleton.children_of(id).map(|c| (c, depth + 1)).collect();
        children.reverse();
        stack.extend(children);
    }

    let _ = writeln!(out, "Meshes ({})", result.meshes.len());
    for mesh in &result.meshes {
        let bone = skeleton.bone(mesh.attachment.bone).map_or("?", |b| b.name.as_str());
        let center = result.mesh_world_center(mesh).map_or_else(|| "?".to_string(), fmt_vec);
        let hidden = mesh.mesh.visible.iter().filter(|v| !**v).count();
        let _ = writeln!(
            out,
            "  {} -> {}  center {}  hidden faces {}",
            mesh.name, bone, center, hidden
        );
    }

    let _ = writeln!(out, "Locators ({})", result.locators.len());
    for locator in &result.locators {
        let bone = skeleton.bone(locator.attachment.bone).map_or("?", |b| b.name.as_str());
        let position = result
            .locator_world_position(locator)
            .map_or_else(|| "?".to_string(), fmt_vec);
        let _ = writeln!(out, "  {} -> {}  at {}", locator.name, bone, position);
    }

    let bounds = result.world_bounds();
    if bounds.is_empty() {
        let _ = writeln!(out, "Bounds: empty");
    } else {
        let _ = writeln!(out, "Bounds: {} .. {}", fmt_vec(bounds.min), fmt_vec(bounds.max));
    }

    out
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let json = std::fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;

    if args.list {
        let identifiers = list_geometries(&json)
            .with_context(|| format!("Failed to list geometries in {}", args.path.display()))?;
        for identifier in identifiers {
            println!("{}", identifier);
        }
        return Ok(());
    }

    let result = import_model_str(&json, &args.import_options())
        .with_context(|| format!("Failed to import {}", args.path.display()))?;

    print!("{}", report(&result));

    Ok(())
}
