//! Structured stream properties reported by the service.
//!
//! Property updates arrive as tagged key/value pairs. Scalar keys land
//! directly on the snapshot, per-channel arrays are folded into one entry per
//! channel, and nested parameter structs are kept as a string map. Keys the
//! engine does not model are surfaced as diagnostics and retained rather
//! than silently dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A dynamically-typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    /// 32-bit integer.
    Int(i32),
    /// 32-bit float.
    Float(f32),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// Array of floats (per-channel volumes and the like).
    FloatArray(Vec<f32>),
    /// Array of service ids (channel positions and the like).
    IdArray(Vec<u32>),
    /// Nested name/value struct.
    Struct(BTreeMap<String, PropValue>),
}

/// Property keys the engine understands, plus a pass-through for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropKey {
    /// Master volume.
    Volume,
    /// Master mute.
    Mute,
    /// Monitor mute.
    MonitorMute,
    /// Soft mute.
    SoftMute,
    /// Per-channel volumes.
    ChannelVolumes,
    /// Per-channel position ids.
    ChannelMap,
    /// Per-channel monitor volumes.
    MonitorVolumes,
    /// Per-channel soft volumes.
    SoftVolumes,
    /// Nested parameter struct.
    Params,
    /// A key the engine does not model, by service id.
    Other(u32),
}

/// One key/value pair from a property-change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    /// Which property changed.
    pub key: PropKey,
    /// Its new value.
    pub value: PropValue,
}

impl Prop {
    /// Convenience constructor.
    pub fn new(key: PropKey, value: PropValue) -> Self {
        Self { key, value }
    }
}

/// Per-channel view assembled from the array-valued properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel position id, from the channel map.
    pub id: Option<u32>,
    /// Channel volume.
    pub volume: Option<f32>,
    /// Channel monitor volume.
    pub monitor_volume: Option<f32>,
    /// Channel soft volume.
    pub soft_volume: Option<f32>,
}

/// Accumulated property state for one stream.
///
/// Updated incrementally as notifications arrive; a clone of the whole
/// snapshot rides along with each property-change event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamProperties {
    /// Master volume.
    pub volume: Option<f32>,
    /// Master mute.
    pub mute: Option<bool>,
    /// Monitor mute.
    pub monitor_mute: Option<bool>,
    /// Soft mute.
    pub soft_mute: Option<bool>,
    /// Per-channel state, indexed by channel.
    pub channels: Vec<ChannelInfo>,
    /// Nested parameter struct, by name.
    pub params: BTreeMap<String, PropValue>,
    /// Keys that arrived but are not modeled, for diagnostics.
    pub unhandled: Vec<u32>,
}

impl StreamProperties {
    /// Apply a batch of property updates.
    pub fn apply_all(&mut self, props: impl IntoIterator<Item = Prop>) {
        for prop in props {
            self.apply(prop);
        }
    }

    /// Apply a single property update.
    pub fn apply(&mut self, prop: Prop) {
        match (prop.key, prop.value) {
            (PropKey::Volume, PropValue::Float(v)) => self.volume = Some(v),
            (PropKey::Mute, PropValue::Bool(v)) => self.mute = Some(v),
            (PropKey::MonitorMute, PropValue::Bool(v)) => self.monitor_mute = Some(v),
            (PropKey::SoftMute, PropValue::Bool(v)) => self.soft_mute = Some(v),
            (PropKey::ChannelVolumes, PropValue::FloatArray(volumes)) => {
                for (index, volume) in volumes.into_iter().enumerate() {
                    self.channel_mut(index).volume = Some(volume);
                }
            }
            (PropKey::ChannelMap, PropValue::IdArray(ids)) => {
                for (index, id) in ids.into_iter().enumerate() {
                    self.channel_mut(index).id = Some(id);
                }
            }
            (PropKey::MonitorVolumes, PropValue::FloatArray(volumes)) => {
                for (index, volume) in volumes.into_iter().enumerate() {
                    self.channel_mut(index).monitor_volume = Some(volume);
                }
            }
            (PropKey::SoftVolumes, PropValue::FloatArray(volumes)) => {
                for (index, volume) in volumes.into_iter().enumerate() {
                    self.channel_mut(index).soft_volume = Some(volume);
                }
            }
            (PropKey::Params, PropValue::Struct(entries)) => {
                self.params.extend(entries);
            }
            (PropKey::Other(id), _) => {
                tracing::warn!(key = id, "unhandled stream property");
                if !self.unhandled.contains(&id) {
                    self.unhandled.push(id);
                }
            }
            (key, value) => {
                // Known key with an unexpected value shape: keep the
                // diagnostic visible instead of guessing.
                tracing::warn!(?key, ?value, "stream property with unexpected value type");
            }
        }
    }

    fn channel_mut(&mut self, index: usize) -> &mut ChannelInfo {
        if index >= self.channels.len() {
            self.channels.resize_with(index + 1, ChannelInfo::default);
        }
        &mut self.channels[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_props_land_on_the_snapshot() {
        let mut props = StreamProperties::default();
        props.apply_all([
            Prop::new(PropKey::Volume, PropValue::Float(0.5)),
            Prop::new(PropKey::Mute, PropValue::Bool(true)),
            Prop::new(PropKey::SoftMute, PropValue::Bool(false)),
        ]);
        assert_eq!(props.volume, Some(0.5));
        assert_eq!(props.mute, Some(true));
        assert_eq!(props.soft_mute, Some(false));
    }

    #[test]
    fn channel_arrays_fold_into_per_channel_entries() {
        let mut props = StreamProperties::default();
        props.apply_all([
            Prop::new(PropKey::ChannelVolumes, PropValue::FloatArray(vec![0.8, 0.6])),
            Prop::new(PropKey::ChannelMap, PropValue::IdArray(vec![3, 4])),
            Prop::new(PropKey::SoftVolumes, PropValue::FloatArray(vec![1.0, 0.9])),
        ]);
        assert_eq!(props.channels.len(), 2);
        assert_eq!(props.channels[0].volume, Some(0.8));
        assert_eq!(props.channels[0].id, Some(3));
        assert_eq!(props.channels[1].soft_volume, Some(0.9));
    }

    #[test]
    fn params_struct_merges_by_name() {
        let mut props = StreamProperties::default();
        let mut entries = BTreeMap::new();
        entries.insert("latency.internal".to_string(), PropValue::Int(256));
        props.apply(Prop::new(PropKey::Params, PropValue::Struct(entries)));
        assert_eq!(
            props.params.get("latency.internal"),
            Some(&PropValue::Int(256))
        );
    }

    #[test]
    fn unhandled_keys_are_retained_once() {
        let mut props = StreamProperties::default();
        props.apply(Prop::new(PropKey::Other(77), PropValue::Int(1)));
        props.apply(Prop::new(PropKey::Other(77), PropValue::Int(2)));
        assert_eq!(props.unhandled, vec![77]);
    }
}
