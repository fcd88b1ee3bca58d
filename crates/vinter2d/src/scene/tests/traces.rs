use approx::assert_relative_eq;

use super::{node, scene};
use crate::core::{LayerMatch, SceneConfig, WorldBounds};
use crate::foundation::math::{Line, Point2, Rect};
use crate::scene::{LayerFilter, NodeFlags, Scene};

#[test]
fn test_line_trace_hits_left_edge() {
    let mut scene = scene();
    let id = scene.insert_node(node(0.0, 0.0, 10.0, 10.0, 1));

    let hit = scene
        .trace_line(Point2::new(-5.0, 5.0), Point2::new(15.0, 5.0), 1)
        .expect("line crosses the node");

    assert_eq!(hit.node, id);
    assert_relative_eq!(hit.distance, 5.0, epsilon = 1e-4);
    assert_relative_eq!(hit.position, Point2::new(0.0, 5.0), epsilon = 1e-4);
}

#[test]
fn test_line_trace_returns_nearest() {
    let mut scene = scene();
    let far = scene.insert_node(node(100.0, 0.0, 10.0, 10.0, 1));
    let near = scene.insert_node(node(40.0, 0.0, 10.0, 10.0, 1));

    let hit = scene.trace_line(Point2::new(0.0, 5.0), Point2::new(200.0, 5.0), 1).unwrap();
    assert_eq!(hit.node, near);

    let reverse = scene.trace_line(Point2::new(200.0, 5.0), Point2::new(0.0, 5.0), 1).unwrap();
    assert_eq!(reverse.node, far);
    assert_relative_eq!(reverse.distance, 90.0, epsilon = 1e-3);
}

#[test]
fn test_line_trace_filters_layer() {
    let mut scene = scene();
    scene.insert_node(node(0.0, 0.0, 10.0, 10.0, 2));

    assert!(scene.trace_line(Point2::new(-5.0, 5.0), Point2::new(15.0, 5.0), 1).is_none());
    assert!(scene
        .trace_line_filtered(&Line::new(Point2::new(-5.0, 5.0), Point2::new(15.0, 5.0)), LayerFilter::Any)
        .is_some());
}

#[test]
fn test_line_trace_short_of_node_misses() {
    let mut scene = scene();
    scene.insert_node(node(0.0, 0.0, 10.0, 10.0, 1));

    assert!(scene.trace_line(Point2::new(-20.0, 5.0), Point2::new(-1.0, 5.0), 1).is_none());
}

#[test]
fn test_line_starting_inside_has_zero_distance() {
    let mut scene = scene();
    let id = scene.insert_node(node(0.0, 0.0, 10.0, 10.0, 1));

    let hit = scene.trace_line(Point2::new(5.0, 5.0), Point2::new(50.0, 5.0), 1).unwrap();
    assert_eq!(hit.node, id);
    assert_relative_eq!(hit.distance, 0.0);
}

#[test]
fn test_rect_trace_far_from_node_misses() {
    let mut scene = scene();
    scene.insert_node(node(100.0, 100.0, 10.0, 10.0, 1));

    assert!(scene.trace_rect(&Rect::new(0.0, 0.0, 10.0, 10.0), 1).is_none());
}

#[test]
fn test_rect_trace_prefers_highest_layer_then_first_added() {
    let scene_config = SceneConfig::new(WorldBounds::new(-512.0, -512.0, 512.0, 512.0), 4)
        .with_physics(None)
        .with_layer_match(LayerMatch::Mask);
    let mut scene = Scene::new(scene_config);
    let low = scene.insert_node(node(0.0, 0.0, 20.0, 20.0, 0b001));
    let first_high = scene.insert_node(node(5.0, 5.0, 20.0, 20.0, 0b100));
    let second_high = scene.insert_node(node(-5.0, -5.0, 20.0, 20.0, 0b100));
    let query = Rect::new(8.0, 8.0, 4.0, 4.0);

    let hit = scene.trace_rect(&query, 0b111).unwrap();
    assert_eq!(hit.node, first_high);
    assert_relative_eq!(hit.position, Point2::new(10.0, 10.0), epsilon = 1e-4);

    assert!(scene.remove_node(first_high));
    assert_eq!(scene.trace_rect(&query, 0b111).unwrap().node, second_high);
    assert_eq!(scene.trace_rect(&query, 0b001).unwrap().node, low);
}

#[test]
fn test_no_clip_node_is_traced_outside_world() {
    let mut scene = scene();
    let id = scene.insert_node(node(2000.0, 2000.0, 10.0, 10.0, 1).with_flags(NodeFlags::NO_CLIP));

    let hit = scene.trace_rect(&Rect::new(2004.0, 2004.0, 1.0, 1.0), 1).unwrap();
    assert_eq!(hit.node, id);

    assert!(scene.trace_rect(&Rect::new(0.0, 0.0, 1.0, 1.0), 1).is_none());
}

#[test]
fn test_children_are_not_traced() {
    let mut scene = scene();
    let parent = scene.insert_node(node(0.0, 0.0, 10.0, 10.0, 1));
    let child = scene.spawn(node(100.0, 100.0, 10.0, 10.0, 1));
    scene.add_child(parent, child).unwrap();

    assert!(scene.trace_rect(&Rect::new(100.0, 100.0, 10.0, 10.0), 1).is_none());
}

#[test]
fn test_line_trace_tie_prefers_highest_layer_then_first_added() {
    let mut scene = scene();
    let low = scene.insert_node(node(10.0, 0.0, 10.0, 10.0, 1));
    let high = scene.insert_node(node(10.0, 0.0, 10.0, 10.0, 4));
    let line = Line::new(Point2::new(-50.0, 5.0), Point2::new(50.0, 5.0));

    let hit = scene.trace_line_filtered(&line, LayerFilter::Any).unwrap();
    assert_eq!(hit.node, high);
    assert_relative_eq!(hit.distance, 60.0, epsilon = 1e-3);

    scene.remove_node(high);
    let twin = scene.insert_node(node(10.0, -5.0, 10.0, 20.0, 1));
    let hit = scene.trace_line_filtered(&line, LayerFilter::Any).unwrap();
    assert_eq!(hit.node, low);
    assert_ne!(hit.node, twin);
}
