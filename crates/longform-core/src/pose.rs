#![forbid(unsafe_code)]

//! Visual pose of a node.
//!
//! A [`Pose`] is the full animatable state of one element: the CSS
//! `opacity`, `filter: blur()`, and `transform` components, plus the
//! `--highlight-scale` custom property used by inline emphasis spans.
//! Animators never touch the DOM; they write poses, and the host applies
//! them.

use std::fmt;

/// Opaque handle to a host node.
///
/// The host assigns ids when it mounts nodes; the runtime only compares and
/// hashes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One animatable property of a [`Pose`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseProperty {
    Opacity,
    /// Gaussian blur radius in px.
    Blur,
    /// Horizontal translation in px.
    X,
    /// Vertical translation in px.
    Y,
    Scale,
    /// Rotation in degrees.
    Rotation,
    /// `--highlight-scale` (0 = hidden underline, 1 = full).
    Highlight,
}

impl PoseProperty {
    /// Every property, in a stable order.
    pub const ALL: [Self; 7] = [
        Self::Opacity,
        Self::Blur,
        Self::X,
        Self::Y,
        Self::Scale,
        Self::Rotation,
        Self::Highlight,
    ];
}

/// Full visual state of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub opacity: f32,
    pub blur: f32,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub rotation: f32,
    pub highlight: f32,
}

impl Pose {
    /// Untouched element: fully visible, no transform, highlight collapsed.
    pub const REST: Self = Self {
        opacity: 1.0,
        blur: 0.0,
        x: 0.0,
        y: 0.0,
        scale: 1.0,
        rotation: 0.0,
        highlight: 0.0,
    };

    /// Read one property.
    #[must_use]
    pub const fn get(&self, prop: PoseProperty) -> f32 {
        match prop {
            PoseProperty::Opacity => self.opacity,
            PoseProperty::Blur => self.blur,
            PoseProperty::X => self.x,
            PoseProperty::Y => self.y,
            PoseProperty::Scale => self.scale,
            PoseProperty::Rotation => self.rotation,
            PoseProperty::Highlight => self.highlight,
        }
    }

    /// Write one property.
    pub fn set(&mut self, prop: PoseProperty, value: f32) {
        let slot = match prop {
            PoseProperty::Opacity => &mut self.opacity,
            PoseProperty::Blur => &mut self.blur,
            PoseProperty::X => &mut self.x,
            PoseProperty::Y => &mut self.y,
            PoseProperty::Scale => &mut self.scale,
            PoseProperty::Rotation => &mut self.rotation,
            PoseProperty::Highlight => &mut self.highlight,
        };
        *slot = value;
    }

    /// Builder-style write.
    #[must_use]
    pub fn with(mut self, prop: PoseProperty, value: f32) -> Self {
        self.set(prop, value);
        self
    }

    /// Whether the node is fully visible and untransformed (ignoring
    /// rotation and highlight, which have per-node rest values).
    #[must_use]
    pub fn is_settled_visible(&self) -> bool {
        (self.opacity - 1.0).abs() < 1e-3
            && self.blur.abs() < 1e-3
            && self.x.abs() < 1e-3
            && self.y.abs() < 1e-3
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::REST
    }
}

/// A partial pose: a list of property assignments.
///
/// Used for immediate sets and as tween targets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PosePatch {
    entries: Vec<(PoseProperty, f32)>,
}

impl PosePatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an assignment.
    #[must_use]
    pub fn with(mut self, prop: PoseProperty, value: f32) -> Self {
        self.insert(prop, value);
        self
    }

    pub fn insert(&mut self, prop: PoseProperty, value: f32) {
        if let Some(entry) = self.entries.iter_mut().find(|(p, _)| *p == prop) {
            entry.1 = value;
        } else {
            self.entries.push((prop, value));
        }
    }

    /// Drop the assignment for `prop`. Returns whether one existed.
    pub fn remove(&mut self, prop: PoseProperty) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(p, _)| *p != prop);
        before != self.entries.len()
    }

    #[must_use]
    pub fn opacity(self, v: f32) -> Self {
        self.with(PoseProperty::Opacity, v)
    }

    #[must_use]
    pub fn blur(self, v: f32) -> Self {
        self.with(PoseProperty::Blur, v)
    }

    #[must_use]
    pub fn x(self, v: f32) -> Self {
        self.with(PoseProperty::X, v)
    }

    #[must_use]
    pub fn y(self, v: f32) -> Self {
        self.with(PoseProperty::Y, v)
    }

    #[must_use]
    pub fn scale(self, v: f32) -> Self {
        self.with(PoseProperty::Scale, v)
    }

    #[must_use]
    pub fn rotation(self, v: f32) -> Self {
        self.with(PoseProperty::Rotation, v)
    }

    #[must_use]
    pub fn highlight(self, v: f32) -> Self {
        self.with(PoseProperty::Highlight, v)
    }

    /// Value assigned to `prop`, if any.
    #[must_use]
    pub fn get(&self, prop: PoseProperty) -> Option<f32> {
        self.entries
            .iter()
            .find(|(p, _)| *p == prop)
            .map(|(_, v)| *v)
    }

    /// Iterate assignments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (PoseProperty, f32)> + '_ {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every assignment to `pose`.
    pub fn apply(&self, pose: &mut Pose) {
        for (prop, value) in self.iter() {
            pose.set(prop, value);
        }
    }

    /// Interpolate between `from` and this patch, writing into `pose`.
    pub fn lerp_into(&self, from: &PosePatch, t: f32, pose: &mut Pose) {
        for (prop, to) in self.iter() {
            let start = from.get(prop).unwrap_or(to);
            pose.set(prop, start + (to - start) * t);
        }
    }

    /// Snapshot the current values of this patch's properties from `pose`.
    #[must_use]
    pub fn capture(&self, pose: &Pose) -> PosePatch {
        PosePatch {
            entries: self.iter().map(|(p, _)| (p, pose.get(p))).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_round_trip_every_property() {
        let mut pose = Pose::REST;
        for (i, prop) in PoseProperty::ALL.into_iter().enumerate() {
            pose.set(prop, i as f32 + 0.5);
            assert_eq!(pose.get(prop), i as f32 + 0.5);
        }
    }

    #[test]
    fn patch_insert_replaces() {
        let patch = PosePatch::new().opacity(0.0).opacity(1.0).y(40.0);
        assert_eq!(patch.get(PoseProperty::Opacity), Some(1.0));
        assert_eq!(patch.iter().count(), 2);
    }

    #[test]
    fn lerp_midpoint() {
        let to = PosePatch::new().opacity(1.0).y(0.0);
        let from = PosePatch::new().opacity(0.0).y(40.0);
        let mut pose = Pose::REST;
        to.lerp_into(&from, 0.5, &mut pose);
        assert!((pose.opacity - 0.5).abs() < 1e-6);
        assert!((pose.y - 20.0).abs() < 1e-6);
    }

    #[test]
    fn capture_reads_current_values() {
        let pose = Pose::REST.with(PoseProperty::Blur, 10.0);
        let snap = PosePatch::new().blur(0.0).capture(&pose);
        assert_eq!(snap.get(PoseProperty::Blur), Some(10.0));
    }

    #[test]
    fn settled_visible() {
        assert!(Pose::REST.is_settled_visible());
        assert!(!Pose::REST.with(PoseProperty::Y, 40.0).is_settled_visible());
    }
}
