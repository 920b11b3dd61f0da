//! User-authored annotations anchored to the timeline
//!
//! Single-user, single-session scope: edits apply immediately and there is
//! no conflict resolution. Draw order is creation order, which `at_time`
//! preserves so the renderer is deterministic.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Pass,
    Run,
    Dribble,
    Zone,
}

/// When an annotation is visible. An instant anchor shows the annotation
/// from its timestamp onward (it persists until deleted); a range shows it
/// only inside the closed interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Instant(Timestamp),
    Range { start: Timestamp, end: Timestamp },
}

impl Anchor {
    pub fn covers(&self, t: Timestamp) -> bool {
        match *self {
            Anchor::Instant(at) => t >= at,
            Anchor::Range { start, end } => t >= start && t <= end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Uuid,
    pub kind: AnnotationKind,
    pub anchor: Anchor,
    /// Polyline or zone outline in pitch coordinates.
    pub points: Vec<Point2<f32>>,
    /// Optional hex color override; the renderer falls back to kit colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    seq: u64,
}

/// CRUD container for annotations, keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationLayer {
    items: Vec<Annotation>,
    next_seq: u64,
}

impl AnnotationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: AnnotationKind, anchor: Anchor, points: Vec<Point2<f32>>) -> Uuid {
        let id = Uuid::new_v4();
        self.items.push(Annotation { id, kind, anchor, points, color: None, seq: self.next_seq });
        self.next_seq += 1;
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&Annotation> {
        self.items.iter().find(|a| a.id == id)
    }

    /// Replace the geometry of an existing annotation. Returns false for an
    /// unknown id.
    pub fn update_points(&mut self, id: Uuid, points: Vec<Point2<f32>>) -> bool {
        match self.items.iter_mut().find(|a| a.id == id) {
            Some(annotation) => {
                annotation.points = points;
                true
            }
            None => false,
        }
    }

    pub fn set_color(&mut self, id: Uuid, color: Option<String>) -> bool {
        match self.items.iter_mut().find(|a| a.id == id) {
            Some(annotation) => {
                annotation.color = color;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|a| a.id != id);
        self.items.len() != before
    }

    /// All annotations covering `t`, in creation order.
    pub fn at_time(&self, t: Timestamp) -> Vec<&Annotation> {
        // Items are stored in insertion order and seq never reorders, so a
        // plain filter already yields deterministic draw order.
        self.items.iter().filter(|a| a.anchor.covers(t)).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrow(x0: f32, x1: f32) -> Vec<Point2<f32>> {
        vec![Point2::new(x0, 30.0), Point2::new(x1, 30.0)]
    }

    #[test]
    fn test_crud_roundtrip() {
        let mut layer = AnnotationLayer::new();
        let id = layer.add(AnnotationKind::Pass, Anchor::Instant(10.0), arrow(10.0, 20.0));
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.get(id).unwrap().kind, AnnotationKind::Pass);

        assert!(layer.update_points(id, arrow(10.0, 30.0)));
        assert_eq!(layer.get(id).unwrap().points[1].x, 30.0);

        assert!(layer.set_color(id, Some("#4CAF50".to_string())));
        assert!(layer.remove(id));
        assert!(layer.is_empty());
        assert!(!layer.remove(id));
    }

    #[test]
    fn test_at_time_anchor_coverage() {
        let mut layer = AnnotationLayer::new();
        let instant = layer.add(AnnotationKind::Run, Anchor::Instant(5.0), arrow(0.0, 5.0));
        let ranged = layer.add(
            AnnotationKind::Zone,
            Anchor::Range { start: 2.0, end: 4.0 },
            arrow(0.0, 1.0),
        );

        assert!(layer.at_time(1.0).is_empty());
        let at_3 = layer.at_time(3.0);
        assert_eq!(at_3.len(), 1);
        assert_eq!(at_3[0].id, ranged);
        let at_6 = layer.at_time(6.0);
        assert_eq!(at_6.len(), 1);
        assert_eq!(at_6[0].id, instant);
    }

    #[test]
    fn test_at_time_preserves_creation_order() {
        let mut layer = AnnotationLayer::new();
        let first = layer.add(AnnotationKind::Pass, Anchor::Instant(0.0), arrow(0.0, 1.0));
        let second = layer.add(AnnotationKind::Run, Anchor::Instant(0.0), arrow(1.0, 2.0));
        let third = layer.add(AnnotationKind::Dribble, Anchor::Instant(0.0), arrow(2.0, 3.0));
        layer.remove(second);
        let visible: Vec<Uuid> = layer.at_time(10.0).iter().map(|a| a.id).collect();
        assert_eq!(visible, vec![first, third]);
    }
}
