//! Headless run of an effect file: an anchor circles the origin dragging a
//! trail while emitters spray sparks, then the anchor is destroyed and the
//! trail fades out.

use std::path::PathBuf;

use clap::Parser;
use glam::{Quat, Vec3};
use serde_json::json;
use sparkykit_core::config::{EmitterEntry, TrailEntry};
use sparkykit_core::style::vertex_bytes;
use sparkykit_core::{
    EffectsConfig, HeadlessHost, LineStyle, Scene, TrailConfig, UniformSampler,
};
use sparkykit_platform::{Result, Transform};
use tracing::{debug, info};

const FRAME_RATE: f32 = 60.0;
const FRAMES: usize = 240;
const ORBIT_RADIUS: f32 = 2.0;

#[derive(Debug, Parser)]
#[command(name = "sparkykit")]
#[command(about = "Runs a spark and trail effect headlessly and logs what it draws", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Effect file (.toml or .json). Built-in effects are used when omitted.
    pub config: Option<PathBuf>,

    /// Print the lines left at the end of the run as JSON
    #[arg(long)]
    pub json: bool,
}

fn default_effects() -> EffectsConfig {
    let mut config = EffectsConfig::default();
    config.styles.insert(
        "spark".into(),
        LineStyle {
            width: 0.05,
            taper: 1.0,
            ..LineStyle::default()
        },
    );
    config.styles.insert("ribbon".into(), LineStyle::default());
    config.emitters.push(EmitterEntry {
        name: "sparks".into(),
        templates: vec!["spark".into()],
        ..EmitterEntry::default()
    });
    config.trails.push(TrailEntry {
        name: "tail".into(),
        style: "ribbon".into(),
        trail: TrailConfig {
            point_capacity: 12,
            spline_precision: 4,
            ..TrailConfig::default()
        },
    });
    config
}

fn orbit(time: f32) -> Transform {
    let angle = time * std::f32::consts::PI;
    Transform {
        position: Vec3::new(angle.cos(), angle.sin(), 0.0) * ORBIT_RADIUS,
        rotation: Quat::from_rotation_z(angle + std::f32::consts::FRAC_PI_2),
    }
}

/// Every live line with its GPU vertices.
fn lines_json<S: UniformSampler>(scene: &Scene<HeadlessHost, S>) -> serde_json::Value {
    scene
        .lines()
        .map(|(id, line)| json!({ "id": id, "line": line, "vertices": line.vertices() }))
        .collect()
}

pub fn run(cli: &Cli) -> Result<()> {
    let effects = match &cli.config {
        Some(path) => EffectsConfig::load(path)?,
        None => default_effects(),
    };
    info!(
        styles = effects.styles.len(),
        emitters = effects.emitters.len(),
        trails = effects.trails.len(),
        "effects loaded"
    );

    let mut scene = Scene::with_host(HeadlessHost::default());
    let anchor = scene.spawn_anchor(orbit(0.0));

    for entry in &effects.emitters {
        let templates = effects.templates(entry)?;
        let emitter = scene.spawn_emitter(entry.emitter.clone(), templates, orbit(0.0))?;
        scene.set_parent(emitter, Some(anchor))?;
        debug!(name = %entry.name, ?emitter, "emitter attached");
    }
    for entry in &effects.trails {
        let style = effects.style(&entry.style)?;
        let trail = scene.spawn_trail(entry.trail.clone(), style, orbit(0.0), Some(anchor))?;
        debug!(name = %entry.name, ?trail, "trail attached");
    }

    let dt = 1.0 / FRAME_RATE;
    for frame in 1..=FRAMES {
        if frame == FRAMES / 2 {
            info!(frame, "destroying anchor");
            scene.destroy(anchor);
        } else if scene.is_alive(anchor) {
            scene.set_transform(anchor, orbit(scene.time() + dt))?;
        }
        scene.step(dt);

        if frame % FRAME_RATE as usize == 0 {
            let stats = scene.stats();
            info!(
                time = scene.time(),
                sparks = stats.sparks,
                trails = stats.trails,
                emitters = stats.emitters,
                "scene"
            );
        }
    }

    let host = scene.host();
    let vertices: Vec<_> = scene.lines().flat_map(|(_, line)| line.vertices()).collect();
    info!(
        created = host.created,
        released = host.released,
        vertex_bytes = vertex_bytes(&vertices).len(),
        "lines"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&lines_json(&scene))?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkykit_core::MidpointSampler;

    #[test]
    fn default_effects_are_valid() {
        assert!(default_effects().validate().is_ok());
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["sparkykit", "--frames"]).is_err());
    }

    #[test]
    fn config_path_and_json_flag_parse() {
        let cli = Cli::try_parse_from(["sparkykit", "effects.toml", "--json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("effects.toml")));
        assert!(cli.json);
    }

    #[test]
    fn no_arguments_uses_built_in_effects() {
        let cli = Cli::try_parse_from(["sparkykit"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn json_dump_carries_vertices_per_point() {
        let mut scene = Scene::new(HeadlessHost::default(), MidpointSampler);
        let anchor = scene.spawn_anchor(orbit(0.0));
        let style = LineStyle::default();
        scene
            .spawn_trail(TrailConfig::default(), &style, orbit(0.0), Some(anchor))
            .unwrap();
        scene.set_transform(anchor, orbit(0.1)).unwrap();
        scene.step(0.1);

        let dump = lines_json(&scene);
        let entry = &dump[0];
        let points = entry["line"]["positions"].as_array().unwrap().len();
        let vertices = entry["vertices"].as_array().unwrap();
        assert_eq!(vertices.len(), points);
        let width = vertices[0]["width"].as_f64().unwrap();
        assert!((width - 0.1).abs() < 1e-6);
    }

    #[test]
    fn runs_the_default_effect() {
        let cli = Cli::try_parse_from(["sparkykit"]).unwrap();
        assert!(run(&cli).is_ok());
    }
}
