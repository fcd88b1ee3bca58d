use std::cell::Cell;
use std::rc::Rc;

use approx::assert_relative_eq;

use super::{node, scene};
use crate::animation::AnimationStatus;
use crate::foundation::collections::{CameraId, NodeId};
use crate::foundation::math::{Point2, Point3, Vec2};
use crate::scene::{Camera, NodeFlags, RenderPass, Renderer};

/// Remembers what every pass contained
#[derive(Default)]
struct RecordingRenderer {
    passes: Vec<(CameraId, Vec<NodeId>, Vec<NodeId>)>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, pass: &RenderPass<'_>) {
        self.passes
            .push((pass.camera_id, pass.nodes.to_vec(), pass.ui_nodes.to_vec()));
    }
}

#[test]
fn test_camera_only_receives_visible_nodes() {
    let mut scene = scene();
    let inside = scene.insert_node(node(10.0, 10.0, 10.0, 10.0, 0));
    let _outside = scene.insert_node(node(400.0, 400.0, 10.0, 10.0, 0));
    let hud = scene.spawn(node(0.0, 0.0, 100.0, 20.0, 0));
    scene.add_ui_node(hud).unwrap();
    let camera = scene.add_camera(Camera::new(Point2::new(0.0, 0.0), Vec2::new(100.0, 100.0)));

    let mut renderer = RecordingRenderer::default();
    let stats = scene.draw(&mut renderer, 1.0 / 60.0);

    assert_eq!(renderer.passes, vec![(camera, vec![inside], vec![hud])]);
    assert_eq!(stats.render_passes, 1);
    assert_eq!(stats.rendered_nodes, 1);
}

#[test]
fn test_cameras_draw_in_registration_order() {
    let mut scene = scene();
    let left = scene.insert_node(node(-200.0, 0.0, 10.0, 10.0, 0));
    let right = scene.insert_node(node(200.0, 0.0, 10.0, 10.0, 0));
    let first = scene.add_camera(Camera::new(Point2::new(150.0, -50.0), Vec2::new(100.0, 100.0)));
    let second = scene.add_camera(Camera::new(Point2::new(-250.0, -50.0), Vec2::new(100.0, 100.0)));

    let mut renderer = RecordingRenderer::default();
    scene.draw(&mut renderer, 0.0);

    assert_eq!(renderer.passes[0].0, first);
    assert_eq!(renderer.passes[0].1, vec![right]);
    assert_eq!(renderer.passes[1].0, second);
    assert_eq!(renderer.passes[1].1, vec![left]);

    assert!(scene.remove_camera(first));
    assert!(!scene.remove_camera(first));
    assert_eq!(scene.cameras().map(|(id, _)| id).collect::<Vec<_>>(), vec![second]);
}

#[test]
fn test_no_pass_hides_node_from_its_camera() {
    let mut scene = scene();
    let main = scene.add_camera(Camera::new(Point2::new(0.0, 0.0), Vec2::new(100.0, 100.0)));
    let mirror = scene.add_camera(Camera::new(Point2::new(0.0, 0.0), Vec2::new(100.0, 100.0)));
    let screen = scene.insert_node(node(10.0, 10.0, 30.0, 30.0, 0));
    scene.node_mut(screen).unwrap().no_pass = Some(mirror);

    let mut renderer = RecordingRenderer::default();
    scene.draw(&mut renderer, 0.0);

    assert_eq!(renderer.passes[0], (main, vec![screen], vec![]));
    assert_eq!(renderer.passes[1], (mirror, vec![], vec![]));
}

#[test]
fn test_no_clip_node_reaches_every_camera() {
    let mut scene = scene();
    let sky = scene.insert_node(node(-500.0, -500.0, 1.0, 1.0, 0).with_flags(NodeFlags::NO_CLIP));
    let dust = scene.insert_node(node(-480.0, -480.0, 1.0, 1.0, 0).with_flags(NodeFlags::DYNAMIC));
    scene.add_camera(Camera::new(Point2::new(300.0, 300.0), Vec2::new(50.0, 50.0)));

    let mut renderer = RecordingRenderer::default();
    scene.draw(&mut renderer, 0.0);

    let drawn = &renderer.passes[0].1;
    assert!(drawn.contains(&sky));
    assert!(drawn.contains(&dust));
}

#[test]
fn test_draw_visits_children_through_parent() {
    let mut scene = scene();
    let parent = scene.insert_node(node(20.0, 30.0, 10.0, 10.0, 0));
    let child = scene.spawn(node(5.0, 0.0, 2.0, 2.0, 0));
    scene.add_child(parent, child).unwrap();
    scene.set_rotation(parent, std::f32::consts::FRAC_PI_2);
    scene.add_camera(Camera::new(Point2::new(0.0, 0.0), Vec2::new(100.0, 100.0)));

    scene.draw(&mut RecordingRenderer::default(), 0.0);

    let parent_origin = scene.node(parent).unwrap().matrix().transform_point(&Point3::origin());
    assert_relative_eq!(parent_origin, Point3::new(20.0, 30.0, 0.0), epsilon = 1e-4);

    // child offset (5, 0) rotated by 90 degrees lands at (0, 5) from the parent
    let child_origin = scene.node(child).unwrap().matrix().transform_point(&Point3::origin());
    assert_relative_eq!(child_origin, Point3::new(20.0, 35.0, 0.0), epsilon = 1e-4);
}

#[test]
fn test_draw_runs_committed_animations() {
    let mut scene = scene();
    let elapsed = Rc::new(Cell::new(0.0));
    let counter = elapsed.clone();
    scene.animation_server_mut().begin().push(move |dt: f64| {
        counter.set(counter.get() + dt);
        AnimationStatus::Running
    });
    scene.animation_server_mut().commit();

    scene.draw(&mut RecordingRenderer::default(), 0.25);
    scene.draw(&mut RecordingRenderer::default(), 0.25);

    assert_relative_eq!(elapsed.get(), 0.5);
    assert_eq!(scene.animation_server().running(), 1);
}
