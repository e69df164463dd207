//! Document templates and placeholder substitution
//!
//! A template is a full HTML document with a fixed set of placeholder
//! tokens that the scene fills in at render time:
//!
//! ```text
//! {{ title }}       document title
//! {{ description }} meta description
//! {{ scripts }}     head-injected <script> block
//! {{ assets }}      <a-assets> declarations
//! {{ entities }}    rendered entity fragments
//! {{ attributes }}  scene-level component attributes (inside <a-scene ...>)
//! {{ defaults }}    preset content the caller's tree can override
//! ```
//!
//! Substitution is literal: every occurrence of each recognized token is
//! replaced. Built-in presets ship suppressible defaults (camera, lights)
//! tagged by the component concern they provide; a default is dropped when
//! the caller's tree attaches that component itself, so explicit
//! configuration is the only one in effect.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SceneError;

/// Document template selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Template {
    /// Bare scene with no preset content
    Empty,
    /// Grid-textured ground with a default camera and lights
    Grid,
    /// Large plain ground under a high hemisphere light
    Ground,
    /// Caller-supplied document using the standard placeholder set
    Custom(String),
}

impl Default for Template {
    fn default() -> Self {
        Template::Empty
    }
}

/// A preset fragment a built-in template injects unless the caller's tree
/// supplies the same component itself
#[derive(Debug)]
pub(crate) struct DefaultEntity {
    /// Component concern this default provides ("camera", "light", ...)
    pub component: &'static str,
    /// The fragment, indented for the entity block
    pub markup: &'static str,
}

impl Template {
    /// Resolve a template by name: a built-in identifier, else a path to an
    /// existing document file.
    pub fn named(name: &str) -> Result<Self, SceneError> {
        match name {
            "empty" => Ok(Template::Empty),
            "grid" => Ok(Template::Grid),
            "ground" => Ok(Template::Ground),
            other => {
                let path = Path::new(other);
                if path.is_file() {
                    Ok(Template::Custom(std::fs::read_to_string(path)?))
                } else {
                    Err(SceneError::UnknownTemplate(other.to_string()))
                }
            }
        }
    }

    /// Wrap a raw caller-supplied document
    pub fn custom(document: impl Into<String>) -> Self {
        Template::Custom(document.into())
    }

    /// The template's document text with placeholders intact
    pub(crate) fn document(&self) -> &str {
        match self {
            Template::Empty => EMPTY_DOCUMENT,
            Template::Grid => GRID_DOCUMENT,
            Template::Ground => GROUND_DOCUMENT,
            Template::Custom(doc) => doc,
        }
    }

    /// Suppressible preset fragments for this template
    pub(crate) fn defaults(&self) -> &'static [DefaultEntity] {
        match self {
            Template::Empty | Template::Custom(_) => &[],
            Template::Grid => GRID_DEFAULTS,
            Template::Ground => GROUND_DEFAULTS,
        }
    }
}

/// Generated fragments to splice into a template document
pub(crate) struct Fragments<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub scripts: &'a str,
    pub assets: &'a str,
    pub entities: &'a str,
    pub attributes: &'a str,
    pub defaults: &'a str,
}

/// Replace every occurrence of each recognized placeholder token.
///
/// Block tokens sitting alone on a line collapse the line when their
/// fragment is empty; any other occurrence is substituted in place.
pub(crate) fn substitute(document: &str, fragments: &Fragments<'_>) -> String {
    let mut doc = document.to_string();
    for (token, value) in [
        ("{{ scripts }}", fragments.scripts),
        ("{{ assets }}", fragments.assets),
        ("{{ entities }}", fragments.entities),
        ("{{ defaults }}", fragments.defaults),
    ] {
        doc = substitute_block(&doc, token, value);
    }
    doc.replace("{{ title }}", fragments.title)
        .replace("{{ description }}", fragments.description)
        .replace("{{ attributes }}", fragments.attributes)
}

fn substitute_block(document: &str, token: &str, value: &str) -> String {
    let own_line = format!("\n{}\n", token);
    let replacement = if value.is_empty() {
        "\n".to_string()
    } else {
        format!("\n{}\n", value)
    };
    document.replace(&own_line, &replacement).replace(token, value)
}

const EMPTY_DOCUMENT: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{{ title }}</title>
    <meta name="description" content="{{ description }}">
    <script src="https://aframe.io/releases/1.5.0/aframe.min.js"></script>
{{ scripts }}
  </head>
  <body>
    <a-scene{{ attributes }}>
      <a-assets>
{{ assets }}
      </a-assets>
{{ entities }}
{{ defaults }}
    </a-scene>
  </body>
</html>
"#;

const GRID_DOCUMENT: &str = r##"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{{ title }}</title>
    <meta name="description" content="{{ description }}">
    <script src="https://aframe.io/releases/1.5.0/aframe.min.js"></script>
{{ scripts }}
  </head>
  <body>
    <a-scene{{ attributes }}>
      <a-assets>
{{ assets }}
      </a-assets>
{{ entities }}
{{ defaults }}
      <a-plane rotation="-90 0 0" width="40" height="40" segments-width="40" segments-height="40" color="#7BC8A4" material="wireframe: true"></a-plane>
      <a-sky color="#ECECEC"></a-sky>
    </a-scene>
  </body>
</html>
"##;

const GROUND_DOCUMENT: &str = r##"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{{ title }}</title>
    <meta name="description" content="{{ description }}">
    <script src="https://aframe.io/releases/1.5.0/aframe.min.js"></script>
{{ scripts }}
  </head>
  <body>
    <a-scene{{ attributes }}>
      <a-assets>
{{ assets }}
      </a-assets>
{{ entities }}
{{ defaults }}
      <a-plane rotation="-90 0 0" width="100" height="100" color="#7BC8A4"></a-plane>
      <a-sky color="#ECECEC"></a-sky>
    </a-scene>
  </body>
</html>
"##;

const GRID_DEFAULTS: &[DefaultEntity] = &[
    DefaultEntity {
        component: "camera",
        markup: "      <a-entity camera look-controls wasd-controls position=\"0 1.6 0\"></a-entity>",
    },
    DefaultEntity {
        component: "light",
        markup: "      <a-entity light=\"type: ambient; color: #FFF; intensity: 0.6\"></a-entity>",
    },
    DefaultEntity {
        component: "light",
        markup: "      <a-entity light=\"type: directional; intensity: 0.6\" position=\"-1 2 1\"></a-entity>",
    },
];

const GROUND_DEFAULTS: &[DefaultEntity] = &[
    DefaultEntity {
        component: "camera",
        markup: "      <a-entity camera look-controls wasd-controls position=\"0 1.6 0\"></a-entity>",
    },
    DefaultEntity {
        component: "light",
        markup: "      <a-entity light=\"type: hemisphere; color: #FFF; groundColor: #7BC8A4; intensity: 1.0\" position=\"0 50 0\"></a-entity>",
    },
];
