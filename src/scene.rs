//! Scene composition, rendering, and serving
//!
//! A [`Scene`] is the root of a renderable tree. Scene-level components
//! become attributes of the `<a-scene>` element, scene-level children are
//! the top-level entities, and the template/title/description select and
//! label the surrounding document.
//!
//! `render` walks the tree once with a fresh [`Collector`], so dedup state
//! is scoped to the call and never shared between scenes or renders. The
//! scene API is `&mut`-based and expected to be driven from one thread;
//! concurrent renders of the same scene must be externally serialized.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use crate::component::{to_markup_name, ComponentValue};
use crate::entity::{Collector, Entity};
use crate::error::SceneError;
use crate::server::SceneServer;
use crate::template::{substitute, Fragments, Template};

/// The root of a renderable scene tree
#[derive(Debug, Serialize, Deserialize)]
pub struct Scene {
    /// Root entity: scene-level components and the top-level children
    root: Entity,
    /// Document template
    #[serde(default)]
    template: Template,
    /// Document title
    #[serde(default)]
    title: String,
    /// Meta description
    #[serde(default)]
    description: String,
    /// Active server, if any (never persisted)
    #[serde(skip)]
    server: Option<SceneServer>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with the `empty` template
    pub fn new() -> Self {
        Self {
            root: Entity::untagged(),
            template: Template::Empty,
            title: "Untitled Scene".to_string(),
            description: String::new(),
            server: None,
        }
    }

    /// Set the document title (builder style)
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the meta description (builder style)
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Select a template (builder style)
    pub fn template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    /// Select a template by name: a built-in identifier or a path to an
    /// existing document file. Fails before render on unknown names.
    pub fn template_named(self, name: &str) -> Result<Self, SceneError> {
        Ok(self.template(Template::named(name)?))
    }

    /// Append a top-level entity (builder style)
    pub fn child(mut self, entity: Entity) -> Self {
        self.root = self.root.child(entity);
        self
    }

    /// Attach a scene-level component; it renders as an attribute of the
    /// `<a-scene>` element (builder style)
    pub fn component(mut self, name: impl Into<String>, value: impl Into<ComponentValue>) -> Self {
        self.root = self.root.component(name, value);
        self
    }

    /// Require a script URL at scene level (builder style)
    pub fn script(mut self, url: impl Into<String>) -> Self {
        self.root = self.root.script(url);
        self
    }

    /// The scene's root entity
    pub fn root(&self) -> &Entity {
        &self.root
    }

    /// Render the scene to a complete document.
    ///
    /// Pure function of the current tree state; every call walks the tree
    /// with fresh dedup bookkeeping.
    pub fn render(&self) -> Result<String, SceneError> {
        let mut collector = Collector::new();

        // Scene-level attributes first so scene-referenced assets lead the
        // declarations, then the children depth-first in list order.
        let attributes = self.root.render_attributes(&mut collector);

        let mut entities = String::new();
        for child in self.root.children() {
            child.render_into(&mut entities, 3, &mut collector);
        }

        let scripts = collector
            .scripts()
            .iter()
            .map(|url| format!("    <script src=\"{}\"></script>", url))
            .collect::<Vec<_>>()
            .join("\n");

        let assets = collector
            .assets()
            .iter()
            .map(|asset| format!("        {}", asset.render()))
            .collect::<Vec<_>>()
            .join("\n");

        let defaults = self
            .template
            .defaults()
            .iter()
            .filter(|default| !self.supplies_component(default.component))
            .map(|default| default.markup)
            .collect::<Vec<_>>()
            .join("\n");

        let attributes = if attributes.is_empty() {
            String::new()
        } else {
            format!(" {}", attributes)
        };

        Ok(substitute(
            self.template.document(),
            &Fragments {
                title: &self.title,
                description: &self.description,
                scripts: &scripts,
                assets: &assets,
                entities: entities.trim_end(),
                attributes: &attributes,
                defaults: &defaults,
            },
        ))
    }

    /// Render and write the document to `path`
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let document = self.render()?;
        std::fs::write(path, document)?;
        Ok(())
    }

    /// Start serving this scene at `host:port`.
    ///
    /// The document is rendered at server start; local asset files are
    /// served from beneath the process working directory. Serving an
    /// already-serving scene is refused; call [`Scene::stop`] first.
    pub fn serve(&mut self, host: &str, port: u16) -> Result<(), SceneError> {
        if let Some(server) = &self.server {
            return Err(SceneError::AlreadyServing(server.address().to_string()));
        }

        let document = self.render()?;
        let root_dir = std::env::current_dir()?;
        let server = SceneServer::start(document, root_dir, host, port)?;
        println!("Serving scene at http://{}/", server.address());
        self.server = Some(server);
        Ok(())
    }

    /// Serve the scene and open it in the system browser
    pub fn view(&mut self, host: &str, port: u16) -> Result<(), SceneError> {
        self.serve(host, port)?;
        if let Some(address) = self.address() {
            let url = format!("http://{}/", address);
            if webbrowser::open(&url).is_err() {
                eprintln!("Failed to open browser. Please visit:\n{}", url);
            }
        }
        Ok(())
    }

    /// Stop the active server. No-op when not serving.
    pub fn stop(&mut self) {
        if let Some(mut server) = self.server.take() {
            server.stop();
            println!("Scene server stopped");
        }
    }

    /// The bound address while serving
    pub fn address(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(|s| s.address())
    }

    /// Save the scene definition as pretty-printed RON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let config = ron::ser::PrettyConfig::new().indentor("  ".to_string());
        let data = ron::ser::to_string_pretty(self, config)
            .map_err(|e| SceneError::Serialization(e.to_string()))?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Load a scene definition saved with [`Scene::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let data = std::fs::read_to_string(path)?;
        ron::from_str(&data).map_err(|e| SceneError::Serialization(e.to_string()))
    }

    /// Whether any entity in the tree (or the scene root) attaches the
    /// given component, counting matching primitive tags as supplying it
    fn supplies_component(&self, component: &str) -> bool {
        let mut supplied = HashSet::new();
        collect_supplied(&self.root, &mut supplied);
        supplied.contains(component)
    }
}

fn collect_supplied(entity: &Entity, supplied: &mut HashSet<String>) {
    if let Some(tag) = entity.tag() {
        supplied.insert(to_markup_name(tag));
    }
    for (name, _) in entity.components() {
        supplied.insert(to_markup_name(name));
    }
    for child in entity.children() {
        collect_supplied(child, supplied);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::component::props;

    /// The concrete two-child scenario: a box with a json_model asset and a
    /// gltf-model with a two-part asset.
    fn cube_and_kangaroo() -> Scene {
        Scene::new()
            .child(
                Entity::new("box")
                    .component("json_model", Asset::new("cube", "./cube.json")),
            )
            .child(Entity::new("gltf-model").component(
                "src",
                Asset::new("kangaroo", "./Kangaroo_01.gltf").with_part("./Kangaroo_01.bin"),
            ))
    }

    #[test]
    fn test_two_declarations_in_supplied_order() {
        let document = cube_and_kangaroo().render().unwrap();

        let cube = document.find("id=\"cube\"").unwrap();
        let kangaroo = document.find("id=\"kangaroo\"").unwrap();
        assert!(cube < kangaroo);

        // Each asset declared exactly once
        assert_eq!(document.matches("id=\"cube\"").count(), 1);
        assert_eq!(document.matches("id=\"kangaroo\"").count(), 1);
    }

    #[test]
    fn test_two_fragments_in_supplied_order() {
        let document = cube_and_kangaroo().render().unwrap();

        let box_pos = document.find("<a-box").unwrap();
        let gltf_pos = document.find("<a-gltf-model").unwrap();
        assert!(box_pos < gltf_pos);
        assert!(document.contains("json-model=\"#cube\""));
        assert!(document.contains("src=\"#kangaroo\""));
    }

    #[test]
    fn test_shared_asset_declared_once() {
        let tex = Asset::image("wood", "./wood.png");
        let scene = Scene::new()
            .child(Entity::new("box").component("material", props().set("src", tex.clone())))
            .child(Entity::new("sphere").component("material", props().set("src", tex)));

        let document = scene.render().unwrap();
        assert_eq!(document.matches("id=\"wood\"").count(), 1);
    }

    #[test]
    fn test_conflicting_asset_ids_first_wins() {
        let scene = Scene::new()
            .child(Entity::new("box").component("json_model", Asset::new("cube", "./first.json")))
            .child(
                Entity::new("sphere").component("json_model", Asset::new("cube", "./second.json")),
            );

        let document = scene.render().unwrap();
        assert!(document.contains("src=\"./first.json\""));
        assert!(!document.contains("./second.json"));
    }

    #[test]
    fn test_shared_script_included_once() {
        let url = "https://example.com/component.js";
        let scene = Scene::new()
            .child(Entity::new("box").script(url))
            .child(Entity::new("sphere").script(url));

        let document = scene.render().unwrap();
        assert_eq!(
            document.matches("<script src=\"https://example.com/component.js\">").count(),
            1
        );
    }

    #[test]
    fn test_explicit_light_suppresses_preset_default() {
        let with_light = Scene::new()
            .template(Template::Grid)
            .child(Entity::untagged().component("light", "type: point; intensity: 2"))
            .render()
            .unwrap();
        // The caller's light is the only light configuration
        assert!(with_light.contains("light=\"type: point; intensity: 2\""));
        assert!(!with_light.contains("type: ambient"));
        assert!(!with_light.contains("type: directional"));
        // The unrelated camera default survives
        assert!(with_light.contains("camera look-controls"));

        let without_light = Scene::new().template(Template::Grid).render().unwrap();
        assert!(without_light.contains("type: ambient"));
    }

    #[test]
    fn test_light_primitive_tag_also_suppresses_default() {
        let document = Scene::new()
            .template(Template::Ground)
            .child(Entity::new("light").component("type", "point"))
            .render()
            .unwrap();
        assert!(!document.contains("type: hemisphere"));
    }

    #[test]
    fn test_scene_level_components_render_as_scene_attributes() {
        let document = Scene::new()
            .component("fog", "type: linear; color: #AAA")
            .component("stats", ())
            .render()
            .unwrap();
        assert!(document.contains("<a-scene fog=\"type: linear; color: #AAA\" stats>"));
    }

    #[test]
    fn test_render_is_pure_and_repeatable() {
        let scene = cube_and_kangaroo();
        let first = scene.render().unwrap();
        let second = scene.render().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_title_and_description_substituted() {
        let document = Scene::new()
            .title("Kangaroo Park")
            .description("Marsupials in 3D")
            .render()
            .unwrap();
        assert!(document.contains("<title>Kangaroo Park</title>"));
        assert!(document.contains("content=\"Marsupials in 3D\""));
    }

    #[test]
    fn test_inline_asset_never_declared() {
        let document = Scene::new()
            .child(
                Entity::new("sky")
                    .component("material", props().set("src", Asset::inline("./sky.jpg"))),
            )
            .render()
            .unwrap();
        assert!(document.contains("src: url(./sky.jpg)"));
        assert!(!document.contains("<img"));
        assert!(!document.contains("<a-asset-item"));
    }

    #[test]
    fn test_write_outputs_rendered_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scene.html");
        cube_and_kangaroo().write(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, cube_and_kangaroo().render().unwrap());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scene.ron");

        let scene = cube_and_kangaroo().title("Saved").template(Template::Grid);
        scene.save(&path).unwrap();

        let loaded = Scene::load(&path).unwrap();
        assert_eq!(loaded.render().unwrap(), scene.render().unwrap());
    }

    #[test]
    fn test_serve_twice_is_refused_and_stop_is_noop_when_idle() {
        let mut scene = Scene::new();
        // Stopping an idle scene is a no-op
        scene.stop();

        scene.serve("127.0.0.1", 0).unwrap();
        let err = scene.serve("127.0.0.1", 0).unwrap_err();
        assert!(matches!(err, SceneError::AlreadyServing(_)));

        scene.stop();
        // A fresh serve after stop succeeds
        scene.serve("127.0.0.1", 0).unwrap();
        scene.stop();
    }

    #[test]
    fn test_served_document_matches_render() {
        let mut scene = cube_and_kangaroo();
        scene.serve("127.0.0.1", 0).unwrap();
        let address = scene.address().unwrap();

        let body = ureq::get(&format!("http://{}/", address))
            .call()
            .unwrap()
            .into_string()
            .unwrap();
        assert_eq!(body, scene.render().unwrap());

        scene.stop();
        assert!(scene.address().is_none());
    }
}
