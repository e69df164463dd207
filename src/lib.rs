//! Declarative builder for A-Frame 3D scene markup
//!
//! Compose [`Asset`], [`Entity`], and [`Scene`] values in Rust, render them
//! to a complete A-Frame HTML document, and preview the result over a local
//! HTTP server that also serves the scene's local asset files.
//!
//! ## Core Concept: Scene = Tree of Entities + Deduplicated Assets
//!
//! ```text
//! Scene
//! ├── template: Empty | Grid | Ground | Custom(document)
//! ├── title / description
//! └── root Entity
//!     ├── components: name -> Default | Text | Map | Asset  (scene attributes)
//!     └── children: Vec<Entity>            (the top-level <a-scene> content)
//!         └── ... nested arbitrarily deep, order preserved
//! ```
//!
//! Rendering walks the tree once, depth-first: every entity becomes a markup
//! fragment, every referenced asset and required script URL is collected into
//! an ordered, duplicate-free block, and the fragments are spliced into the
//! chosen template's placeholder slots.
//!
//! # Example
//!
//! ```
//! use scenery::{Asset, Entity, Scene};
//!
//! let cube = Asset::new("cube", "./cube.json");
//! let scene = Scene::new()
//!     .title("Demo")
//!     .child(Entity::new("box").component("json_model", cube))
//!     .child(Entity::new("sky").component("color", "#ECECEC"));
//!
//! let html = scene.render().unwrap();
//! assert!(html.contains("<a-box json-model=\"#cube\">"));
//! assert!(html.contains("id=\"cube\""));
//! ```
//!
//! Call `scene.serve("127.0.0.1", 8080)` to preview the document at
//! `http://127.0.0.1:8080/`; local files referenced by assets are served
//! from beneath the working directory, and `scene.stop()` tears the server
//! down.

mod asset;
mod component;
mod entity;
mod error;
mod scene;
mod server;
mod template;

pub use asset::{Asset, ASSET_ITEM_TAG, IMAGE_TAG};
pub use component::{
    from_markup_name, props, to_markup_name, ComponentValue, PropertyMap, PropertyValue,
};
pub use entity::{Entity, PRIMITIVE_TAGS};
pub use error::SceneError;
pub use scene::Scene;
pub use template::Template;
