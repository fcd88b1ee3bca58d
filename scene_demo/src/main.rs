//! Headless scene demo
//!
//! Drops a handful of physics crates onto a static floor, draws a few
//! seconds of frames through a logging renderer, fires traces at the pile,
//! pauses physics for a while and finally hands the nodes over to a second
//! scene.
//!
//! Usage: `scene_demo [config.toml|config.ron]`

use std::collections::BTreeMap;

use rand::Rng;
use thiserror::Error;
use vinter2d::prelude::*;

const FRAME_TIME: f64 = 1.0 / 60.0;
const CRATE_COUNT: usize = 12;
const CRATE_LAYER: u32 = 1;
const FLOOR_LAYER: u32 = 2;

#[derive(Error, Debug)]
enum DemoError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),
}

/// Renderer that only counts what it is given
#[derive(Default)]
struct LoggingRenderer {
    frames: u64,
    drawn: BTreeMap<String, usize>,
}

impl Renderer for LoggingRenderer {
    fn render(&mut self, pass: &RenderPass<'_>) {
        let camera = pass.camera.debug_name.as_deref().unwrap_or("camera");
        *self.drawn.entry(camera.to_owned()).or_default() += pass.nodes.len();

        if self.frames % 60 == 0 {
            let names: Vec<&str> = pass.world_nodes().map(SceneNode::label).collect();
            log::info!(
                "[{}] frame {}: {} world nodes, {} UI nodes: {:?}",
                camera,
                self.frames,
                pass.nodes.len(),
                pass.ui_nodes.len(),
                names
            );
        }
    }
}

fn build_scene(config: SceneConfig) -> Result<(Scene, Vec<NodeId>), DemoError> {
    let mut scene = Scene::new(config);
    let mut rng = rand::thread_rng();

    let floor = scene.insert_node(
        SceneNode::new(Point2::new(-300.0, 200.0), Vec2::new(600.0, 4.0), FLOOR_LAYER).with_debug_name("floor"),
    );
    scene.make_static_object(floor, Point2::new(300.0, 200.0))?;
    scene.set_friction(floor, 0.9)?;

    let backdrop = scene.insert_node(
        SceneNode::new(Point2::new(-1000.0, -1000.0), Vec2::new(2000.0, 2000.0), 0)
            .with_flags(NodeFlags::NO_CLIP)
            .with_debug_name("backdrop"),
    );
    log::debug!("Backdrop {:?}", backdrop);

    let mut crates = Vec::with_capacity(CRATE_COUNT);
    for index in 0..CRATE_COUNT {
        let size = rng.gen_range(10.0..30.0);
        let position = Point2::new(rng.gen_range(-250.0..250.0), rng.gen_range(-200.0..0.0));
        let id = scene.insert_node(
            SceneNode::new(position, Vec2::new(size, size), CRATE_LAYER)
                .with_flags(NodeFlags::DYNAMIC)
                .with_debug_name(format!("crate-{index}")),
        );
        let shape = if index % 3 == 0 { BodyShape::Circle } else { BodyShape::Box };
        scene.enable_physics(id, shape)?;
        scene.set_mass(id, size * size / 100.0)?;
        scene.restrict_velocity(id, Some(400.0))?;
        crates.push(id);
    }

    let hud = scene.spawn(SceneNode::new(Point2::new(8.0, 8.0), Vec2::new(200.0, 24.0), 0).with_debug_name("hud"));
    scene.add_ui_node(hud)?;

    scene.add_camera(Camera::new(Point2::new(-320.0, -240.0), Vec2::new(640.0, 480.0)).with_debug_name("main"));
    scene.add_camera(Camera::new(Point2::new(-80.0, 120.0), Vec2::new(160.0, 120.0)).with_debug_name("minimap"));

    Ok((scene, crates))
}

fn report_traces(scene: &Scene) {
    let line = scene.trace_line(Point2::new(0.0, -400.0), Point2::new(0.0, 400.0), CRATE_LAYER);
    match line {
        Some(hit) => log::info!(
            "Line trace hit {} at {:?} after {:.1} units",
            scene.node(hit.node).map_or("?", SceneNode::label),
            hit.position,
            hit.distance
        ),
        None => log::info!("Line trace missed"),
    }

    let rect = scene.trace_rect_filtered(&Rect::new(-300.0, 150.0, 600.0, 60.0), LayerFilter::Any);
    if let Some(hit) = rect {
        log::info!("Rect trace topmost: {}", scene.node(hit.node).map_or("?", SceneNode::label));
    }
}

fn run() -> Result<(), DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading scene config from {}", path);
            SceneConfig::load_from_file(&path)?
        }
        None => SceneConfig::default(),
    };

    let (mut scene, crates) = build_scene(config.clone())?;
    let mut renderer = LoggingRenderer::default();

    for frame in 0..300_u64 {
        renderer.frames = frame;
        if frame == 120 {
            scene.pause_physics()?;
            scene.apply_impulse(crates[0], Vec2::new(0.0, -200.0), Vec2::new(2.0, 0.0))?;
        }
        if frame == 180 {
            scene.unpause_physics()?;
        }

        let stats = scene.draw(&mut renderer, FRAME_TIME);
        if frame % 60 == 0 {
            log::info!("Frame {}: {:?}", frame, stats);
            report_traces(&scene);
        }
    }

    log::info!("Simulated {:.2}s of physics", scene.physics_time().unwrap_or_default());
    for (camera, count) in &renderer.drawn {
        log::info!("Camera {} drew {} nodes in total", camera, count);
    }

    // Only the crates come back; floor, backdrop and HUD stay detached in the store
    let store = scene.teardown();
    let mut next = Scene::with_store(config, store);
    for &id in &crates {
        next.add_node(id)?;
    }
    log::info!("Second scene holds {} of {} nodes", next.nodes().len(), next.store().len());

    next.delete_all_nodes();
    log::info!("After delete_all_nodes: {} nodes remain in the store", next.store().len());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    println!("=== Vinter2D Scene Demo ===");
    run()?;
    Ok(())
}
