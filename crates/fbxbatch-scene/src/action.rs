//! Animation actions and keyframe curves.
//!
//! An [`Action`] is a named, reusable animation clip: a set of keyframe
//! curves independent of any object until bound. Actions are created and
//! destroyed by the host; this crate only mirrors them, toggles their
//! inclusion flags, and (for root-motion extraction) rewrites curve data
//! on owned copies.

use serde::{Deserialize, Serialize};

/// The animated property a curve drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelProperty {
    /// Translation.
    Location,
    /// XYZ Euler rotation.
    RotationEuler,
    /// Scale.
    Scale,
}

impl ChannelProperty {
    /// Returns the host-side data path component for this property.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelProperty::Location => "location",
            ChannelProperty::RotationEuler => "rotation_euler",
            ChannelProperty::Scale => "scale",
        }
    }
}

/// Identifies one scalar channel an F-curve animates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelTarget {
    /// Pose bone the channel belongs to; `None` for object-level channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bone: Option<String>,
    /// The animated property.
    pub property: ChannelProperty,
    /// Component index (0 = X, 1 = Y, 2 = Z).
    pub index: u8,
}

impl ChannelTarget {
    /// An object-level channel.
    pub fn object(property: ChannelProperty, index: u8) -> Self {
        Self {
            bone: None,
            property,
            index,
        }
    }

    /// A pose-bone channel.
    pub fn bone(bone: impl Into<String>, property: ChannelProperty, index: u8) -> Self {
        Self {
            bone: Some(bone.into()),
            property,
            index,
        }
    }

    /// The host-side RNA data path for this channel.
    pub fn data_path(&self) -> String {
        match &self.bone {
            Some(bone) => format!("pose.bones[\"{}\"].{}", bone, self.property.as_str()),
            None => self.property.as_str().to_string(),
        }
    }

    /// Returns true if this is a translation channel on the named bone.
    pub fn is_bone_location(&self, bone: &str) -> bool {
        self.property == ChannelProperty::Location && self.bone.as_deref() == Some(bone)
    }
}

/// One keyframe on a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Frame number.
    pub frame: f32,
    /// Channel value at the frame.
    pub value: f32,
}

/// A keyframe curve for one scalar channel.
///
/// Keyframes are kept sorted by frame; insertion at an existing frame
/// replaces the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FCurve {
    /// The channel this curve animates.
    pub target: ChannelTarget,
    /// Keyframes, sorted by frame.
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl FCurve {
    /// Creates an empty curve for the given channel.
    pub fn new(target: ChannelTarget) -> Self {
        Self {
            target,
            keyframes: Vec::new(),
        }
    }

    /// Inserts or replaces a keyframe, keeping frame order.
    pub fn insert_key(&mut self, frame: f32, value: f32) {
        match self
            .keyframes
            .binary_search_by(|k| k.frame.partial_cmp(&frame).unwrap_or(std::cmp::Ordering::Less))
        {
            Ok(i) => self.keyframes[i].value = value,
            Err(i) => self.keyframes.insert(i, Keyframe { frame, value }),
        }
    }

    /// Value stored exactly at a frame, if keyed there.
    pub fn key_at(&self, frame: f32) -> Option<f32> {
        self.keyframes
            .iter()
            .find(|k| k.frame == frame)
            .map(|k| k.value)
    }

    /// Samples the curve at a frame with linear interpolation, clamped
    /// to the first/last key. An empty curve samples as 0.
    pub fn evaluate(&self, frame: f32) -> f32 {
        let keys = &self.keyframes;
        if keys.is_empty() {
            return 0.0;
        }
        if frame <= keys[0].frame {
            return keys[0].value;
        }
        if frame >= keys[keys.len() - 1].frame {
            return keys[keys.len() - 1].value;
        }
        for pair in keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if frame >= a.frame && frame <= b.frame {
                let span = b.frame - a.frame;
                if span <= f32::EPSILON {
                    return b.value;
                }
                let t = (frame - a.frame) / span;
                return a.value + (b.value - a.value) * t;
            }
        }
        keys[keys.len() - 1].value
    }

    /// Frames of every keyframe, in order.
    pub fn frames(&self) -> impl Iterator<Item = f32> + '_ {
        self.keyframes.iter().map(|k| k.frame)
    }
}

/// A named animation clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action name, unique within the registry.
    pub name: String,
    /// First frame of the clip.
    #[serde(default)]
    pub frame_start: f32,
    /// Last frame of the clip.
    #[serde(default)]
    pub frame_end: f32,
    /// Whether the action is included in the batch export.
    #[serde(default = "default_true")]
    pub export: bool,
    /// Mirror of an external animation manager's selection flag.
    ///
    /// Present exactly when that integration annotated the action; absent
    /// otherwise. See `ops::sync_selected_flag`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    /// Keyframe curves.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub curves: Vec<FCurve>,
}

fn default_true() -> bool {
    true
}

impl Action {
    /// Creates an empty action with the given frame range.
    pub fn new(name: impl Into<String>, frame_start: f32, frame_end: f32) -> Self {
        Self {
            name: name.into(),
            frame_start,
            frame_end,
            export: true,
            selected: None,
            curves: Vec::new(),
        }
    }

    /// The clip's frame range as stored.
    pub fn frame_range(&self) -> (f32, f32) {
        (self.frame_start, self.frame_end)
    }

    /// Looks up the curve for a channel.
    pub fn curve(&self, target: &ChannelTarget) -> Option<&FCurve> {
        self.curves.iter().find(|c| &c.target == target)
    }

    /// Looks up the curve for a channel, mutably.
    pub fn curve_mut(&mut self, target: &ChannelTarget) -> Option<&mut FCurve> {
        self.curves.iter_mut().find(|c| &c.target == target)
    }

    /// The curve for a channel, created empty when absent.
    pub fn curve_mut_or_insert(&mut self, target: ChannelTarget) -> &mut FCurve {
        let i = match self.curves.iter().position(|c| c.target == target) {
            Some(i) => i,
            None => {
                self.curves.push(FCurve::new(target));
                self.curves.len() - 1
            }
        };
        &mut self.curves[i]
    }

    /// Curves animating the named bone's translation.
    pub fn bone_location_curves<'a>(
        &'a self,
        bone: &'a str,
    ) -> impl Iterator<Item = &'a FCurve> + 'a {
        self.curves
            .iter()
            .filter(move |c| c.target.is_bone_location(bone))
    }

    /// Union of keyframe frames across the named bone's translation
    /// channels, sorted and deduplicated.
    pub fn bone_location_frames(&self, bone: &str) -> Vec<f32> {
        let mut frames: Vec<f32> = self
            .bone_location_curves(bone)
            .flat_map(|c| c.frames())
            .collect();
        frames.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        frames.dedup();
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn curve_with_keys(keys: &[(f32, f32)]) -> FCurve {
        let mut curve = FCurve::new(ChannelTarget::bone("Root", ChannelProperty::Location, 0));
        for &(frame, value) in keys {
            curve.insert_key(frame, value);
        }
        curve
    }

    #[test]
    fn test_insert_key_keeps_order_and_replaces() {
        let mut curve = curve_with_keys(&[(10.0, 1.0), (1.0, 0.0), (5.0, 0.5)]);
        let frames: Vec<f32> = curve.frames().collect();
        assert_eq!(frames, vec![1.0, 5.0, 10.0]);

        curve.insert_key(5.0, 2.0);
        assert_eq!(curve.keyframes.len(), 3);
        assert_eq!(curve.key_at(5.0), Some(2.0));
    }

    #[test]
    fn test_evaluate_interpolates_and_clamps() {
        let curve = curve_with_keys(&[(0.0, 0.0), (10.0, 10.0)]);
        assert_eq!(curve.evaluate(5.0), 5.0);
        assert_eq!(curve.evaluate(-5.0), 0.0);
        assert_eq!(curve.evaluate(20.0), 10.0);
    }

    #[test]
    fn test_evaluate_empty_curve_is_zero() {
        let curve = FCurve::new(ChannelTarget::object(ChannelProperty::Location, 1));
        assert_eq!(curve.evaluate(3.0), 0.0);
    }

    #[test]
    fn test_data_path() {
        let bone = ChannelTarget::bone("Root", ChannelProperty::Location, 2);
        assert_eq!(bone.data_path(), "pose.bones[\"Root\"].location");

        let object = ChannelTarget::object(ChannelProperty::RotationEuler, 2);
        assert_eq!(object.data_path(), "rotation_euler");
    }

    #[test]
    fn test_bone_location_frames_union() {
        let mut action = Action::new("Walk", 1.0, 20.0);
        action
            .curve_mut_or_insert(ChannelTarget::bone("Root", ChannelProperty::Location, 0))
            .insert_key(1.0, 0.0);
        action
            .curve_mut_or_insert(ChannelTarget::bone("Root", ChannelProperty::Location, 1))
            .insert_key(10.0, 2.0);
        action
            .curve_mut_or_insert(ChannelTarget::bone("Root", ChannelProperty::Location, 2))
            .insert_key(1.0, 1.0);
        // Rotation channels do not contribute.
        action
            .curve_mut_or_insert(ChannelTarget::bone("Root", ChannelProperty::RotationEuler, 2))
            .insert_key(15.0, 0.5);

        assert_eq!(action.bone_location_frames("Root"), vec![1.0, 10.0]);
        assert!(action.bone_location_frames("Spine").is_empty());
    }

    #[test]
    fn test_action_serde_round_trip() {
        let mut action = Action::new("Idle", 1.0, 60.0);
        action.selected = Some(true);
        action
            .curve_mut_or_insert(ChannelTarget::object(ChannelProperty::Location, 0))
            .insert_key(1.0, 0.25);

        let json = serde_json::to_string(&action).unwrap();
        let parsed: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, action);
    }
}
