use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use macroquad::{
    math::Vec2 as MacroquadVec2,
    texture::{self, DrawTextureParams, Texture2D},
};
use rollout_reef_rendering::Color;

use crate::to_macroquad_color;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Name of the full-surface backdrop image in the atlas.
pub const BACKGROUND_IMAGE: &str = "background";

/// Parameters describing how an image should be drawn on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawParams {
    /// Position in screen-space pixels where the image's top-left corner is placed.
    pub position: Vec2,
    /// Desired size in screen-space pixels.
    pub scale: Vec2,
    /// Tint applied to the image.
    pub tint: Color,
}

impl DrawParams {
    /// Creates draw parameters anchored at the provided position and scale.
    #[must_use]
    pub fn new(position: Vec2, scale: Vec2) -> Self {
        Self {
            position,
            scale,
            tint: Color::new(1.0, 1.0, 1.0, 1.0),
        }
    }
}

/// Cache of textures loaded from the image manifest, keyed by image name.
///
/// Lookups soft-fail: a name missing from the atlas skips its draw instead
/// of raising an error, so absent artwork degrades to invisible sprites.
#[derive(Debug, Default)]
pub struct TextureAtlas {
    textures: HashMap<String, Texture2D>,
}

impl TextureAtlas {
    /// Loads the default image manifest from disk.
    pub fn from_default_manifest() -> Result<Self> {
        Self::from_manifest_path(Self::default_manifest_path())
    }

    /// Loads images from the manifest located at the provided path.
    pub fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_manifest_with_loader(path, default_loader)
    }

    /// Returns the default manifest path relative to the repository root.
    #[must_use]
    pub fn default_manifest_path() -> PathBuf {
        PathBuf::from("assets/manifest.toml")
    }

    /// Draws the named image, reporting whether anything was drawn.
    ///
    /// A missing name is not an error; the draw is skipped silently and
    /// `false` is returned.
    pub fn draw(&self, name: &str, params: DrawParams) -> bool {
        let Some(texture) = self.textures.get(name) else {
            return false;
        };

        let draw_params = DrawTextureParams {
            dest_size: Some(MacroquadVec2::new(params.scale.x, params.scale.y)),
            ..DrawTextureParams::default()
        };
        texture::draw_texture_ex(
            *texture,
            params.position.x,
            params.position.y,
            to_macroquad_color(params.tint),
            draw_params,
        );
        true
    }

    /// Returns whether the atlas contains the provided image name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    /// Returns the number of textures stored in the atlas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Returns whether the atlas holds no textures at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn from_manifest_with_loader(
        path: impl AsRef<Path>,
        mut loader: impl FnMut(&str, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read image manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let entries = parse_manifest(&contents, &base)?;
        Ok(Self::from_entries(entries, &mut loader))
    }

    fn from_entries(
        entries: Vec<(String, PathBuf)>,
        loader: &mut impl FnMut(&str, &Path) -> Result<Texture2D>,
    ) -> Self {
        let mut textures = HashMap::with_capacity(entries.len());
        for (name, path) in entries {
            match loader(&name, &path) {
                Ok(texture) => {
                    let _ = textures.insert(name, texture);
                }
                Err(error) => {
                    // Absent artwork renders as nothing; keep going.
                    tracing::warn!(%name, %error, "skipping unloadable image");
                }
            }
        }
        Self { textures }
    }
}

fn default_loader(_name: &str, path: &Path) -> Result<Texture2D> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read image asset at {}", path.display()))?;
    Ok(Texture2D::from_file_with_format(&bytes, None))
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    images: HashMap<String, String>,
}

fn parse_manifest(contents: &str, base_path: &Path) -> Result<Vec<(String, PathBuf)>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse image manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported image manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut entries: Vec<(String, PathBuf)> = manifest
        .images
        .into_iter()
        .map(|(name, relative_path)| (name, base_path.join(relative_path)))
        .collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn parse_manifest_resolves_paths_relative_to_base_directory() {
        let manifest = r#"
            version = 1

            [images]
            background = "background.png"
            blue0 = "sprites/blue0.png"
        "#;

        let parsed = parse_manifest(manifest, Path::new("assets")).expect("manifest should parse");
        assert_eq!(
            parsed,
            vec![
                (
                    String::from("background"),
                    PathBuf::from("assets/background.png")
                ),
                (
                    String::from("blue0"),
                    PathBuf::from("assets/sprites/blue0.png")
                ),
            ]
        );
    }

    #[test]
    fn parse_manifest_rejects_unsupported_versions() {
        let manifest = r#"
            version = 2

            [images]
            background = "background.png"
        "#;

        assert!(parse_manifest(manifest, Path::new("assets")).is_err());
    }

    #[test]
    fn unloadable_images_are_skipped_rather_than_fatal() {
        let entries = vec![
            (String::from("blue0"), PathBuf::from("blue0.png")),
            (String::from("yellow0"), PathBuf::from("yellow0.png")),
        ];
        let atlas = TextureAtlas::from_entries(entries, &mut |name, _| {
            if name == "blue0" {
                bail!("corrupt file")
            }
            Ok(Texture2D::empty())
        });

        assert!(!atlas.contains("blue0"));
        assert!(atlas.contains("yellow0"));
        assert_eq!(atlas.len(), 1);
    }

    #[test]
    fn draws_report_whether_the_image_existed() {
        let entries = vec![(String::from("yellow1"), PathBuf::from("yellow1.png"))];
        let load_count = RefCell::new(0);
        let atlas = TextureAtlas::from_entries(entries, &mut |_, _| {
            *load_count.borrow_mut() += 1;
            Ok(Texture2D::empty())
        });

        assert_eq!(*load_count.borrow(), 1);
        assert!(!atlas.draw(
            "darkblue3",
            DrawParams::new(Vec2::ZERO, Vec2::splat(32.0))
        ));
    }
}
