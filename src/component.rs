//! Component configuration values and markup name translation
//!
//! A component attached to an entity carries one of a fixed set of
//! configuration shapes, resolved once at construction:
//!
//! ```text
//! ComponentValue
//! ├── Default      -> component name emitted with no value
//! ├── Text(s)      -> flat property string, passed through unchanged
//! ├── Map(props)   -> "key: value; key2: value2" in insertion order
//! └── Asset(a)     -> the asset's reference expression (#id or url(src))
//! ```
//!
//! Component names are stored in whatever form the caller used; the
//! snake_case to kebab-case rewrite happens at render time only.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::error::SceneError;

/// Rewrite a host-safe identifier to the markup's hyphenated form.
///
/// Pure and total; [`from_markup_name`] is its inverse for names that do not
/// mix both separators.
pub fn to_markup_name(name: &str) -> String {
    name.replace('_', "-")
}

/// Rewrite a hyphenated markup name to the host-safe identifier form.
pub fn from_markup_name(name: &str) -> String {
    name.replace('-', "_")
}

/// Escape a string for use inside a double-quoted attribute value
pub(crate) fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// A single property value inside a component mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Literal value, emitted as-is
    Literal(String),
    /// Asset reference, emitted as the asset's reference expression
    Asset(Asset),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Literal(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Literal(value)
    }
}

impl From<Asset> for PropertyValue {
    fn from(asset: Asset) -> Self {
        PropertyValue::Asset(asset)
    }
}

/// Ordered component properties
///
/// Insertion order is preserved and is the order properties appear in the
/// rendered property string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyMap {
    entries: IndexMap<String, PropertyValue>,
}

impl PropertyMap {
    /// Create an empty property map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property (builder style). Re-setting a key keeps its position.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Look up a property by key
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no properties
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.entries.iter()
    }
}

/// Shorthand for starting a [`PropertyMap`] chain
pub fn props() -> PropertyMap {
    PropertyMap::new()
}

/// Configuration attached to an entity under a component name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentValue {
    /// Attach with defaults; the component name is emitted with no value
    Default,
    /// Flat property string, passed through unchanged
    Text(String),
    /// Ordered key/value properties
    Map(PropertyMap),
    /// The value is an asset reference
    Asset(Asset),
}

impl ComponentValue {
    /// Build a component value from loosely-shaped JSON data.
    ///
    /// `null` attaches with defaults, scalars become the flat property
    /// string, and an object of scalars becomes an ordered map. Arrays and
    /// nested objects are rejected with an error naming the component.
    pub fn from_json(component: &str, value: &serde_json::Value) -> Result<Self, SceneError> {
        use serde_json::Value;

        match value {
            Value::Null => Ok(ComponentValue::Default),
            Value::String(s) => Ok(ComponentValue::Text(s.clone())),
            Value::Bool(b) => Ok(ComponentValue::Text(b.to_string())),
            Value::Number(n) => Ok(ComponentValue::Text(n.to_string())),
            Value::Object(entries) => {
                let mut map = PropertyMap::new();
                for (key, entry) in entries {
                    let literal = match entry {
                        Value::String(s) => s.clone(),
                        Value::Bool(b) => b.to_string(),
                        Value::Number(n) => n.to_string(),
                        other => {
                            return Err(SceneError::BadComponentValue {
                                component: component.to_string(),
                                detail: format!(
                                    "property '{}' has unsupported type ({})",
                                    key,
                                    json_type_name(other)
                                ),
                            })
                        }
                    };
                    map = map.set(key.clone(), literal);
                }
                Ok(ComponentValue::Map(map))
            }
            other => Err(SceneError::BadComponentValue {
                component: component.to_string(),
                detail: format!(
                    "expected null, scalar, or object, got {}",
                    json_type_name(other)
                ),
            }),
        }
    }

    /// Render this value to its attribute string, registering any referenced
    /// assets with the caller. `None` means the component is emitted as a
    /// bare name (defaults).
    pub(crate) fn render(&self, register: &mut dyn FnMut(&Asset)) -> Option<String> {
        match self {
            ComponentValue::Default => None,
            ComponentValue::Text(s) => Some(s.clone()),
            ComponentValue::Map(map) => {
                let rendered: Vec<String> = map
                    .iter()
                    .map(|(key, value)| match value {
                        PropertyValue::Literal(s) => format!("{}: {}", key, s),
                        PropertyValue::Asset(asset) => {
                            register(asset);
                            format!("{}: {}", key, asset.reference())
                        }
                    })
                    .collect();
                Some(rendered.join("; "))
            }
            ComponentValue::Asset(asset) => {
                register(asset);
                Some(asset.reference())
            }
        }
    }
}

impl From<&str> for ComponentValue {
    fn from(value: &str) -> Self {
        ComponentValue::Text(value.to_string())
    }
}

impl From<String> for ComponentValue {
    fn from(value: String) -> Self {
        ComponentValue::Text(value)
    }
}

impl From<Asset> for ComponentValue {
    fn from(asset: Asset) -> Self {
        ComponentValue::Asset(asset)
    }
}

impl From<PropertyMap> for ComponentValue {
    fn from(map: PropertyMap) -> Self {
        ComponentValue::Map(map)
    }
}

impl From<()> for ComponentValue {
    fn from(_: ()) -> Self {
        ComponentValue::Default
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_translation_round_trips() {
        assert_eq!(to_markup_name("wasd_controls"), "wasd-controls");
        assert_eq!(from_markup_name("wasd-controls"), "wasd_controls");
        assert_eq!(from_markup_name(&to_markup_name("json_model")), "json_model");
        // Single-word names pass through both ways
        assert_eq!(to_markup_name("light"), "light");
        assert_eq!(from_markup_name("light"), "light");
    }

    #[test]
    fn test_map_renders_in_insertion_order() {
        let value = ComponentValue::Map(
            props().set("type", "directional").set("intensity", "0.8").set("color", "#FFF"),
        );
        let mut registered = Vec::new();
        let rendered = value.render(&mut |a| registered.push(a.clone())).unwrap();
        assert_eq!(rendered, "type: directional; intensity: 0.8; color: #FFF");
        assert!(registered.is_empty());
    }

    #[test]
    fn test_asset_valued_property_renders_reference() {
        let tex = Asset::image("wood", "./wood.png");
        let value = ComponentValue::Map(props().set("src", tex.clone()).set("repeat", "4 4"));
        let mut registered = Vec::new();
        let rendered = value.render(&mut |a| registered.push(a.clone())).unwrap();
        assert_eq!(rendered, "src: #wood; repeat: 4 4");
        assert_eq!(registered, vec![tex]);
    }

    #[test]
    fn test_default_renders_bare_name() {
        let value = ComponentValue::Default;
        assert!(value.render(&mut |_| {}).is_none());
    }

    #[test]
    fn test_from_json_shapes() {
        assert_eq!(
            ComponentValue::from_json("camera", &json!(null)).unwrap(),
            ComponentValue::Default
        );
        assert_eq!(
            ComponentValue::from_json("color", &json!("red")).unwrap(),
            ComponentValue::Text("red".to_string())
        );
        assert_eq!(
            ComponentValue::from_json("radius", &json!(2.5)).unwrap(),
            ComponentValue::Text("2.5".to_string())
        );

        let value = ComponentValue::from_json("light", &json!({"type": "ambient", "intensity": 0.5}))
            .unwrap();
        let rendered = value.render(&mut |_| {}).unwrap();
        assert_eq!(rendered, "type: ambient; intensity: 0.5");
    }

    #[test]
    fn test_from_json_rejects_unsupported_shapes() {
        let err = ComponentValue::from_json("position", &json!([0, 1, 0])).unwrap_err();
        match err {
            SceneError::BadComponentValue { component, .. } => assert_eq!(component, "position"),
            other => panic!("unexpected error: {:?}", other),
        }

        let err =
            ComponentValue::from_json("material", &json!({"shader": {"name": "flat"}})).unwrap_err();
        match err {
            SceneError::BadComponentValue { component, detail } => {
                assert_eq!(component, "material");
                assert!(detail.contains("shader"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
