//! Story highlights: the data behind the strip, the strip itself, and the
//! host screen that presents a story over it.

pub mod provider;
pub mod screen;
pub mod strip;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use provider::{CatalogError, OverlayProvider, StoryCatalog};
pub use screen::{StoryOverlay, StoryScreen};
pub use strip::{StripAppearance, StripView};

/// Media kind of a story item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryItemKind {
    Image,
    Video,
}

/// One page of a story.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoryItem {
    pub kind: StoryItemKind,
    /// Where the media lives; never fetched by this crate.
    pub url: String,
    /// How long the page stays up before auto-advancing.
    #[serde(default = "default_item_duration_ms")]
    pub duration_ms: u64,
}

fn default_item_duration_ms() -> u64 {
    5_000
}

impl StoryItem {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// A highlight in the strip and the items it plays.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Story {
    pub id: String,
    /// Name shown under the avatar.
    pub display_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Whether the viewer has opened this story.
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub items: Vec<StoryItem>,
}

impl Story {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar: None,
            seen: false,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: StoryItem) -> Self {
        self.items.push(item);
        self
    }

    /// Total playback time of all items.
    pub fn total_duration(&self) -> Duration {
        self.items.iter().map(StoryItem::duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_deserializes_with_defaults() {
        let story: Story = serde_json::from_str(
            r#"{
                "id": "s1",
                "display_name": "Lisbon",
                "items": [
                    {"kind": "image", "url": "https://cdn.example/1.jpg"},
                    {"kind": "video", "url": "https://cdn.example/2.mp4", "duration_ms": 12000}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(story.display_name, "Lisbon");
        assert!(!story.seen);
        assert!(story.avatar.is_none());
        assert_eq!(story.items[0].duration(), Duration::from_secs(5));
        assert_eq!(story.items[1].kind, StoryItemKind::Video);
        assert_eq!(story.total_duration(), Duration::from_secs(17));
    }

    #[test]
    fn test_story_builder() {
        let story = Story::new("s2", "Porto").with_item(StoryItem {
            kind: StoryItemKind::Image,
            url: "a.jpg".into(),
            duration_ms: 3_000,
        });
        assert_eq!(story.items.len(), 1);
        assert_eq!(story.total_duration(), Duration::from_secs(3));
    }
}
