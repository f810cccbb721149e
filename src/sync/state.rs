use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Layout of the slide pane on viewer screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SlideMode {
    #[default]
    #[serde(rename = "none")]
    Hidden,
    Full,
    Half,
}

impl SlideMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideMode::Hidden => "none",
            SlideMode::Full => "full",
            SlideMode::Half => "half",
        }
    }
}

/// Prominence of the embedded live video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LiveMode {
    #[default]
    Full,
    Half,
    #[serde(rename = "none")]
    Hidden,
}

impl LiveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveMode::Full => "full",
            LiveMode::Half => "half",
            LiveMode::Hidden => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SlideStyle {
    #[serde(rename = "slide", default)]
    pub slide_mode: SlideMode,
    #[serde(rename = "ytlive", default)]
    pub yt_live_mode: LiveMode,
}

/// The presentation state every member of a session group renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SharedSessionState {
    #[serde(default)]
    pub style: SlideStyle,
    #[serde(rename = "ytid", default, skip_serializing_if = "Option::is_none")]
    pub youtube_id: Option<String>,
    #[serde(rename = "slideURL", default, skip_serializing_if = "Option::is_none")]
    pub slide_thumbnail_url: Option<String>,
    #[serde(rename = "table", default)]
    pub group_table: Vec<String>,
    #[serde(default = "default_target")]
    pub target: BTreeMap<String, bool>,
    #[serde(rename = "fixedText", default)]
    pub fixed_text: String,
}

impl Default for SharedSessionState {
    fn default() -> Self {
        Self {
            style: SlideStyle::default(),
            youtube_id: None,
            slide_thumbnail_url: None,
            group_table: Vec::new(),
            target: default_target(),
            fixed_text: String::new(),
        }
    }
}

impl SharedSessionState {
    /// Build a state from a raw document value, normalizing empty ids to `None`.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut state: SharedSessionState = serde_json::from_value(value)?;
        state.youtube_id = state.youtube_id.filter(|id| !id.is_empty());
        state.slide_thumbnail_url = state.slide_thumbnail_url.filter(|url| !url.is_empty());
        Ok(state)
    }
}

fn default_target() -> BTreeMap<String, bool> {
    BTreeMap::from([("c1".to_string(), false), ("c2".to_string(), false)])
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SlideStylePatch {
    #[serde(rename = "slide", default, skip_serializing_if = "Option::is_none")]
    pub slide_mode: Option<SlideMode>,
    #[serde(rename = "ytlive", default, skip_serializing_if = "Option::is_none")]
    pub yt_live_mode: Option<LiveMode>,
}

/// A partial write. Only `Some` fields reach the shared document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionStatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<SlideStylePatch>,
    #[serde(rename = "ytid", default, skip_serializing_if = "Option::is_none")]
    pub youtube_id: Option<String>,
    #[serde(rename = "slideURL", default, skip_serializing_if = "Option::is_none")]
    pub slide_thumbnail_url: Option<String>,
    #[serde(rename = "table", default, skip_serializing_if = "Option::is_none")]
    pub group_table: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<BTreeMap<String, bool>>,
    #[serde(rename = "fixedText", default, skip_serializing_if = "Option::is_none")]
    pub fixed_text: Option<String>,
}

impl SessionStatePatch {
    pub fn is_empty(&self) -> bool {
        self.style.map_or(true, |s| s.slide_mode.is_none() && s.yt_live_mode.is_none())
            && self.youtube_id.is_none()
            && self.slide_thumbnail_url.is_none()
            && self.group_table.is_none()
            && self.target.is_none()
            && self.fixed_text.is_none()
    }

    /// Patch that writes every field of `state`, used to seed a fresh document.
    pub fn full(state: &SharedSessionState) -> Self {
        Self {
            style: Some(SlideStylePatch {
                slide_mode: Some(state.style.slide_mode),
                yt_live_mode: Some(state.style.yt_live_mode),
            }),
            youtube_id: Some(state.youtube_id.clone().unwrap_or_default()),
            slide_thumbnail_url: state.slide_thumbnail_url.clone(),
            group_table: Some(state.group_table.clone()),
            target: Some(state.target.clone()),
            fixed_text: Some(state.fixed_text.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let json = serde_json::to_value(SessionStatePatch::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
        assert!(SessionStatePatch::default().is_empty());
    }

    #[test]
    fn style_patch_with_no_fields_is_empty() {
        let patch = SessionStatePatch {
            style: Some(SlideStylePatch::default()),
            ..Default::default()
        };
        assert!(patch.is_empty());
    }

    #[test]
    fn state_reads_wire_names() {
        let json = serde_json::json!({
            "style": { "slide": "half", "ytlive": "none" },
            "ytid": "",
            "slideURL": "https://thumbs/1.png",
            "table": ["A", "B"],
            "target": { "c1": true },
            "fixedText": "welcome"
        });
        let state = SharedSessionState::from_json(json).unwrap();
        assert_eq!(state.style.slide_mode, SlideMode::Half);
        assert_eq!(state.style.yt_live_mode, LiveMode::Hidden);
        assert_eq!(state.youtube_id, None);
        assert_eq!(state.slide_thumbnail_url.as_deref(), Some("https://thumbs/1.png"));
        assert_eq!(state.group_table, vec!["A", "B"]);
        assert_eq!(state.target.get("c1"), Some(&true));
        assert_eq!(state.fixed_text, "welcome");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let state = SharedSessionState::from_json(serde_json::json!({})).unwrap();
        assert_eq!(state, SharedSessionState::default());
    }
}
