use std::{collections::HashSet, path::Path};

use anyhow::Context as _;

use crate::foundation::error::{StoryError, StoryResult};

/// Display name used when a line references a character the project does not define.
pub const UNKNOWN_SPEAKER: &str = "Unknown";

/// Opaque, resolvable resource handle (URL, relative path or store key).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AssetRef(pub String);

impl AssetRef {
    /// Build a handle from any string-like value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw handle text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A speaking character. Only `name` is consumed by the playback core.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Unique character id.
    pub id: String,
    /// Display name shown above subtitles.
    pub name: String,
    /// Voice selector used upstream for speech synthesis.
    #[serde(default, alias = "voiceSelector")]
    pub voice: String,
    /// Optional portrait.
    #[serde(default, alias = "avatarRef")]
    pub avatar: Option<AssetRef>,
}

/// One line of dialogue. Lines without `audio` are silent and advance after a dwell time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialogue {
    /// Line id, unique within its scene.
    pub id: String,
    /// Speaking character.
    pub character_id: String,
    /// Subtitle text.
    pub text: String,
    /// Delivery hint used upstream.
    #[serde(default)]
    pub emotion: String,
    /// Narration clip, once generated.
    #[serde(default, alias = "audioRef")]
    pub audio: Option<AssetRef>,
}

/// A scene: one background image and an ordered list of lines.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Unique scene id.
    pub id: String,
    /// Playback position; scenes play in ascending `order`, not storage order.
    pub order: u32,
    /// Prompt the background was generated from.
    #[serde(default)]
    pub description: String,
    /// Background image, once generated.
    #[serde(default, alias = "backgroundImageRef")]
    pub background_image: Option<AssetRef>,
    /// Lines in speaking order.
    #[serde(default)]
    pub dialogues: Vec<Dialogue>,
}

/// Ordered scenes plus the characters that speak in them.
///
/// [`Project::sort_scenes`] orders scenes by `order` (stable, ties keep storage order). The
/// player sorts on construction and every index it uses refers to the sorted list.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Story title.
    #[serde(default)]
    pub title: String,
    /// Scenes, in playback order once sorted.
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Characters referenced by lines.
    #[serde(default)]
    pub characters: Vec<Character>,
}

impl Project {
    /// Build a project, sorting scenes into playback order.
    pub fn new(scenes: Vec<Scene>, characters: Vec<Character>) -> Self {
        let mut project = Self {
            title: String::new(),
            scenes,
            characters,
        };
        project.sort_scenes();
        project
    }

    /// Parse a project from JSON and sort its scenes into playback order.
    pub fn from_json_str(json: &str) -> StoryResult<Self> {
        let mut project: Project =
            serde_json::from_str(json).map_err(|e| StoryError::serde(e.to_string()))?;
        project.sort_scenes();
        Ok(project)
    }

    /// Read and parse a project JSON file.
    pub fn from_json_file(path: &Path) -> StoryResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read project '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Stable sort by `order`.
    pub fn sort_scenes(&mut self) {
        self.scenes.sort_by_key(|s| s.order);
    }

    /// Check identifier uniqueness. Dangling speaker references are only warned about.
    pub fn validate(&self) -> StoryResult<()> {
        let mut character_ids = HashSet::new();
        for c in &self.characters {
            if !character_ids.insert(c.id.as_str()) {
                return Err(StoryError::validation(format!(
                    "duplicate character id '{}'",
                    c.id
                )));
            }
        }

        let mut scene_ids = HashSet::new();
        for scene in &self.scenes {
            if !scene_ids.insert(scene.id.as_str()) {
                return Err(StoryError::validation(format!(
                    "duplicate scene id '{}'",
                    scene.id
                )));
            }
            let mut line_ids = HashSet::new();
            for d in &scene.dialogues {
                if !line_ids.insert(d.id.as_str()) {
                    return Err(StoryError::validation(format!(
                        "duplicate dialogue id '{}' in scene '{}'",
                        d.id, scene.id
                    )));
                }
                if !character_ids.contains(d.character_id.as_str()) {
                    tracing::warn!(
                        scene = %scene.id,
                        dialogue = %d.id,
                        character = %d.character_id,
                        "dialogue references an unknown character"
                    );
                }
            }
        }
        Ok(())
    }

    /// Scene at a playback index.
    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// Line at a playback position.
    pub fn dialogue(&self, scene_index: usize, dialogue_index: usize) -> Option<&Dialogue> {
        self.scene(scene_index)?.dialogues.get(dialogue_index)
    }

    /// Number of scenes.
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Display name for `character_id`, falling back to [`UNKNOWN_SPEAKER`].
    pub fn speaker_name(&self, character_id: &str) -> &str {
        self.characters
            .iter()
            .find(|c| c.id == character_id)
            .map(|c| c.name.as_str())
            .unwrap_or(UNKNOWN_SPEAKER)
    }

    /// Populate (or replace) a scene's background handle. Returns `false` if the scene is unknown.
    pub fn set_scene_background(&mut self, scene_id: &str, image: AssetRef) -> bool {
        match self.scenes.iter_mut().find(|s| s.id == scene_id) {
            Some(scene) => {
                scene.background_image = Some(image);
                true
            }
            None => false,
        }
    }

    /// Populate (or replace) a line's audio handle. Returns `false` if the line is unknown.
    pub fn set_dialogue_audio(
        &mut self,
        scene_id: &str,
        dialogue_id: &str,
        audio: AssetRef,
    ) -> bool {
        let line = self
            .scenes
            .iter_mut()
            .find(|s| s.id == scene_id)
            .and_then(|s| s.dialogues.iter_mut().find(|d| d.id == dialogue_id));
        match line {
            Some(line) => {
                line.audio = Some(audio);
                true
            }
            None => false,
        }
    }

    /// All distinct handles referenced by scenes (backgrounds) and lines (audio).
    pub fn referenced_assets(&self) -> (Vec<AssetRef>, Vec<AssetRef>) {
        let mut images: Vec<AssetRef> = self
            .scenes
            .iter()
            .filter_map(|s| s.background_image.clone())
            .collect();
        let mut audio: Vec<AssetRef> = self
            .scenes
            .iter()
            .flat_map(|s| s.dialogues.iter().filter_map(|d| d.audio.clone()))
            .collect();
        images.sort();
        images.dedup();
        audio.sort();
        audio.dedup();
        (images, audio)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/project.rs"]
mod tests;
