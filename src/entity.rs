//! Scene graph entities and markup rendering
//!
//! An [`Entity`] is one node of the composed scene graph: a tag, an ordered
//! component map, ordered children, and the script URLs its components need.
//! Entities are built with consuming builder calls and nested arbitrarily
//! deep; rendering is a read-only depth-first pre-order walk that produces a
//! markup fragment while feeding the per-render [`Collector`].
//!
//! Spatial properties (position/rotation/scale) on a child are interpreted
//! by the consuming renderer as relative to its parent; this crate only
//! preserves nesting order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::asset::Asset;
use crate::component::{escape_attr, to_markup_name, ComponentValue};
use crate::error::SceneError;

/// Tags with a dedicated A-Frame primitive element (`<a-box>`, `<a-sky>`, ...)
///
/// Any other tag renders as a generic `a-entity` with the tag folded into
/// the `geometry` component as `primitive: <tag>`.
pub const PRIMITIVE_TAGS: &[&str] = &[
    "box", "sphere", "cylinder", "plane", "sky", "light", "camera", "cursor", "circle", "cone",
    "ring", "torus", "torus-knot", "dodecahedron", "octahedron", "tetrahedron", "icosahedron",
    "text", "image", "video", "videosphere", "sound", "gltf-model", "obj-model", "collada-model",
    "curvedimage", "triangle", "link",
];

/// One node in the composed scene graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Element tag; `None` renders a bare `a-entity`
    tag: Option<String>,
    /// Component name -> configuration, insertion order preserved
    #[serde(default)]
    components: IndexMap<String, ComponentValue>,
    /// Child entities, list order preserved in the output
    #[serde(default)]
    children: Vec<Entity>,
    /// Script URLs required by components on this entity
    #[serde(default)]
    js_sources: Vec<String>,
}

impl Entity {
    /// Create an entity with the given tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            components: IndexMap::new(),
            children: Vec::new(),
            js_sources: Vec::new(),
        }
    }

    /// Create an entity with no tag (renders a bare `a-entity`)
    pub fn untagged() -> Self {
        Self {
            tag: None,
            components: IndexMap::new(),
            children: Vec::new(),
            js_sources: Vec::new(),
        }
    }

    /// Attach a component (builder style).
    ///
    /// The value can be a property string (`&str`), a [`PropertyMap`],
    /// an [`Asset`], or `()` for attach-with-defaults.
    ///
    /// [`PropertyMap`]: crate::component::PropertyMap
    pub fn component(mut self, name: impl Into<String>, value: impl Into<ComponentValue>) -> Self {
        self.components.insert(name.into(), value.into());
        self
    }

    /// Attach a component from loosely-shaped JSON data.
    ///
    /// Rejects arrays and nested objects with an error naming the component.
    pub fn component_json(
        self,
        name: impl Into<String>,
        value: &serde_json::Value,
    ) -> Result<Self, SceneError> {
        let name = name.into();
        let resolved = ComponentValue::from_json(&name, value)?;
        Ok(self.component(name, resolved))
    }

    /// Append a child entity (builder style)
    pub fn child(mut self, child: Entity) -> Self {
        self.children.push(child);
        self
    }

    /// Require a script URL for this entity's components (builder style)
    pub fn script(mut self, url: impl Into<String>) -> Self {
        self.js_sources.push(url.into());
        self
    }

    /// The entity's tag, if any
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Child entities in list order
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// Attached components in insertion order
    pub fn components(&self) -> impl Iterator<Item = (&String, &ComponentValue)> {
        self.components.iter()
    }

    /// Script URLs required by this entity
    pub fn scripts(&self) -> &[String] {
        &self.js_sources
    }

    /// Element name plus the primitive to fold into `geometry`, if any
    fn resolve_element(&self) -> (String, Option<String>) {
        match &self.tag {
            None => ("a-entity".to_string(), None),
            Some(tag) => {
                let markup_tag = to_markup_name(tag);
                if PRIMITIVE_TAGS.contains(&markup_tag.as_str()) {
                    (format!("a-{}", markup_tag), None)
                } else {
                    ("a-entity".to_string(), Some(markup_tag))
                }
            }
        }
    }

    /// Render this entity's attribute list (no leading space), registering
    /// referenced assets and required scripts with the collector.
    pub(crate) fn render_attributes(&self, collector: &mut Collector) -> String {
        for url in &self.js_sources {
            collector.register_script(url);
        }

        let (_, primitive) = self.resolve_element();
        let mut attrs: Vec<String> = Vec::new();

        // A folded primitive with no caller-supplied geometry leads the list
        if let Some(p) = &primitive {
            if !self.components.contains_key("geometry") {
                attrs.push(format!("geometry=\"primitive: {}\"", escape_attr(p)));
            }
        }

        for (name, value) in &self.components {
            let markup_name = to_markup_name(name);
            let rendered = value.render(&mut |asset| collector.register_asset(asset));
            let folded = primitive.as_deref().filter(|_| markup_name == "geometry");
            match (rendered, folded) {
                (None, None) => attrs.push(markup_name),
                (None, Some(p)) => {
                    attrs.push(format!("geometry=\"primitive: {}\"", escape_attr(p)))
                }
                (Some(v), None) => {
                    attrs.push(format!("{}=\"{}\"", markup_name, escape_attr(&v)))
                }
                (Some(v), Some(p)) => attrs.push(format!(
                    "geometry=\"{}\"",
                    escape_attr(&format!("primitive: {}; {}", p, v))
                )),
            }
        }

        attrs.join(" ")
    }

    /// Render this entity and its descendants into `out`, one level of
    /// indentation per depth.
    pub(crate) fn render_into(&self, out: &mut String, depth: usize, collector: &mut Collector) {
        let indent = "  ".repeat(depth);
        let (element, _) = self.resolve_element();
        let attrs = self.render_attributes(collector);

        out.push_str(&indent);
        out.push('<');
        out.push_str(&element);
        if !attrs.is_empty() {
            out.push(' ');
            out.push_str(&attrs);
        }
        out.push('>');

        if self.children.is_empty() {
            out.push_str(&format!("</{}>\n", element));
        } else {
            out.push('\n');
            for child in &self.children {
                child.render_into(out, depth + 1, collector);
            }
            out.push_str(&format!("{}</{}>\n", indent, element));
        }
    }
}

/// Accumulates unique assets and script URLs during one render pass.
///
/// A fresh collector is created for every render, so dedup state is scoped
/// to the pass and multiple scenes coexist without interference. Both
/// sequences keep first-encountered order; a later asset reusing a seen id
/// is ignored silently (first occurrence wins).
#[derive(Debug, Default)]
pub(crate) struct Collector {
    assets: Vec<Asset>,
    seen_asset_ids: HashSet<String>,
    scripts: Vec<String>,
    seen_scripts: HashSet<String>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset for the declarations block. Inline assets render at
    /// the point of use and are skipped.
    pub fn register_asset(&mut self, asset: &Asset) {
        if asset.is_inline() {
            return;
        }
        let Some(id) = asset.id() else { return };
        if self.seen_asset_ids.insert(id.to_string()) {
            self.assets.push(asset.clone());
        }
    }

    /// Register a script URL for the head block, keyed by the literal URL.
    pub fn register_script(&mut self, url: &str) {
        if self.seen_scripts.insert(url.to_string()) {
            self.scripts.push(url.to_string());
        }
    }

    /// Declared assets in first-encountered order
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Script URLs in first-encountered order
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }
}
