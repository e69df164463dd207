//! Asset references
//!
//! An [`Asset`] points at one external media resource (a model file, an
//! image, audio). Two rendering modes:
//! - Non-inline (the default): the asset is declared once in the scene's
//!   `<a-assets>` block and referenced from entities as `#id`.
//! - Inline: the asset is embedded at the point of use as a `url(...)`
//!   expression and never joins the declarations block.
//!
//! Non-inline assets always carry an id; the builder constructors take it as
//! a required argument, and the data-driven [`Asset::from_config`] path
//! rejects the missing-id combination at construction, not at render.

use serde::{Deserialize, Serialize};

use crate::component::escape_attr;
use crate::error::SceneError;

/// Default element for declared assets
pub const ASSET_ITEM_TAG: &str = "a-asset-item";

/// Element used for image assets
pub const IMAGE_TAG: &str = "img";

fn default_tag() -> String {
    ASSET_ITEM_TAG.to_string()
}

/// A reference to one external media resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique identifier; present on every non-inline asset
    id: Option<String>,
    /// Source path or URI
    src: String,
    /// Companion files the consumer fetches relative to `src` (e.g. the
    /// `.bin` next to a `.gltf`). Not declared in markup; see [`Asset::files`].
    #[serde(default)]
    parts: Vec<String>,
    /// Markup element used in the declarations block
    #[serde(default = "default_tag")]
    tag: String,
    /// Inline assets render at the point of use instead of the declarations block
    #[serde(default)]
    inline: bool,
}

impl Asset {
    /// Create a non-inline asset declared as an `a-asset-item`
    pub fn new(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            src: src.into(),
            parts: Vec::new(),
            tag: default_tag(),
            inline: false,
        }
    }

    /// Create a non-inline image asset declared as an `img` element
    pub fn image(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            src: src.into(),
            parts: Vec::new(),
            tag: IMAGE_TAG.to_string(),
            inline: false,
        }
    }

    /// Create an inline asset referenced directly by its source URL
    pub fn inline(src: impl Into<String>) -> Self {
        Self {
            id: None,
            src: src.into(),
            parts: Vec::new(),
            tag: default_tag(),
            inline: true,
        }
    }

    /// Build an asset from loosely-shaped configuration data.
    ///
    /// Fails fast with [`SceneError::MissingAssetId`] when a non-inline
    /// asset is configured without an id.
    pub fn from_config(
        id: Option<String>,
        src: impl Into<String>,
        inline: bool,
    ) -> Result<Self, SceneError> {
        let src = src.into();
        if !inline && id.is_none() {
            return Err(SceneError::MissingAssetId(src));
        }
        Ok(Self {
            id,
            src,
            parts: Vec::new(),
            tag: default_tag(),
            inline,
        })
    }

    /// Add a companion file path (builder style)
    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.parts.push(part.into());
        self
    }

    /// Override the declaration element (builder style)
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// The asset's id, if any
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The asset's source path or URI
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Whether this asset renders inline
    pub fn is_inline(&self) -> bool {
        self.inline
    }

    /// The string an entity property should contain to point at this asset.
    ///
    /// Non-inline assets reference the declarations block by id (`#id`);
    /// inline assets embed the source directly (`url(src)`).
    pub fn reference(&self) -> String {
        match (&self.id, self.inline) {
            (Some(id), false) => format!("#{}", id),
            // Inline assets never have an id form; an id-less non-inline
            // asset is unconstructable, so fall through to the src expression.
            _ => format!("url({})", self.src),
        }
    }

    /// The scene-level declaration fragment for this asset.
    ///
    /// Inline assets contribute nothing to the declarations block.
    pub fn render(&self) -> String {
        let id = match (&self.id, self.inline) {
            (Some(id), false) => id,
            _ => return String::new(),
        };
        if self.tag == IMAGE_TAG {
            format!(
                "<img id=\"{}\" src=\"{}\">",
                escape_attr(id),
                escape_attr(&self.src)
            )
        } else {
            format!(
                "<{tag} id=\"{}\" src=\"{}\"></{tag}>",
                escape_attr(id),
                escape_attr(&self.src),
                tag = self.tag
            )
        }
    }

    /// Every local file this asset needs: `src` first, then `parts`.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.src.as_str()).chain(self.parts.iter().map(|p| p.as_str()))
    }
}
