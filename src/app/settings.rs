use crate::layout::{self, PageSetup};
use crate::model::FramePreset;
use crate::selection::Workflow;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct AppSettings {
    pub workflow: Workflow,
    pub photo_preset: FramePreset,
    pub photo_count: u32,
    pub gap_cm: f32,
    pub pdf_path: String,
    pub svg_path: String,
    pub page: PageSetup,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            workflow: Workflow::Card,
            photo_preset: FramePreset::Passport,
            photo_count: 4,
            gap_cm: 0.2,
            pdf_path: "layout.pdf".to_string(),
            svg_path: "layout.svg".to_string(),
            page: PageSetup::A4,
        }
    }
}

impl AppSettings {
    fn sanitized(mut self) -> Self {
        self.photo_count = layout::clamp_tile_count(self.photo_count);
        if !FramePreset::PHOTO.contains(&self.photo_preset) {
            self.photo_preset = FramePreset::Passport;
        }
        if self.gap_cm.is_nan() || self.gap_cm < 0.0 {
            self.gap_cm = 0.0;
        }
        self
    }
}

pub(super) fn load_settings(path: &str) -> Option<AppSettings> {
    let s = std::fs::read_to_string(path).ok()?;
    let parsed = if path.ends_with(".toml") {
        toml::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| serde_json::from_str::<AppSettings>(&s).ok())
    } else {
        serde_json::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| toml::from_str::<AppSettings>(&s).ok())
    };
    if parsed.is_none() {
        log::warn!("ignoring malformed settings file {path}");
    }
    parsed.map(AppSettings::sanitized)
}

pub(super) fn save_settings(path: &str, settings: &AppSettings) -> Result<(), String> {
    if path.ends_with(".toml") {
        let toml = toml::to_string_pretty(settings).map_err(|e| e.to_string())?;
        std::fs::write(path, toml).map_err(|e| e.to_string())
    } else {
        let json = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("sheetcrop-{}-{name}", std::process::id()))
            .display()
            .to_string()
    }

    #[test]
    fn toml_round_trip() {
        let path = temp_path("settings.toml");
        let settings = AppSettings {
            workflow: Workflow::Photo,
            photo_preset: FramePreset::Joint,
            photo_count: 12,
            ..AppSettings::default()
        };
        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let path = temp_path("partial.toml");
        std::fs::write(&path, "photo_count = 9\n[page]\nmargin_cm = 1.0\n").unwrap();
        let loaded = load_settings(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.photo_count, 9);
        assert_eq!(loaded.page.margin_cm, 1.0);
        assert_eq!(loaded.page.width_cm, 21.0);
        assert_eq!(loaded.workflow, Workflow::Card);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let path = temp_path("clamp.json");
        std::fs::write(
            &path,
            r#"{"photo_count": 400, "photo_preset": "CardFace", "gap_cm": -1.0}"#,
        )
        .unwrap();
        let loaded = load_settings(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.photo_count, 50);
        assert_eq!(loaded.photo_preset, FramePreset::Passport);
        assert_eq!(loaded.gap_cm, 0.0);
    }

    #[test]
    fn missing_or_malformed_file_is_none() {
        assert!(load_settings(&temp_path("missing.toml")).is_none());
        let path = temp_path("bad.toml");
        std::fs::write(&path, "photo_count = [").unwrap();
        assert!(load_settings(&path).is_none());
        std::fs::remove_file(&path).ok();
    }
}
