use chrono::{DateTime, Utc};
use egui::Color32;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Accent colors cycled through as projects are created.
pub const PROJECT_PALETTE: [Color32; 8] = [
    Color32::from_rgb(0xf9, 0x73, 0x16), // orange
    Color32::from_rgb(0x3b, 0x82, 0xf6), // blue
    Color32::from_rgb(0x10, 0xb9, 0x81), // emerald
    Color32::from_rgb(0x8b, 0x5c, 0xf6), // violet
    Color32::from_rgb(0xef, 0x44, 0x44), // red
    Color32::from_rgb(0xea, 0xb3, 0x08), // yellow
    Color32::from_rgb(0x06, 0xb6, 0xd4), // cyan
    Color32::from_rgb(0xec, 0x48, 0x99), // pink
];

/// A project groups tasks and gives them their bar color on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    /// Accent color (serialized as a `#rrggbb` hex string).
    #[serde(with = "hex_color")]
    pub color: Color32,
    #[serde(default)]
    pub collapsed: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>, color: Color32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color,
            collapsed: false,
            created: Utc::now(),
            modified: Utc::now(),
        }
    }

    /// Palette color for the `index`-th project, wrapping around.
    pub fn palette_color(index: usize) -> Color32 {
        PROJECT_PALETTE[index % PROJECT_PALETTE.len()]
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }
}

/// Serde helper storing `Color32` as a `#rrggbb` hex string.
mod hex_color {
    use egui::Color32;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let hex = format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b());
        serializer.serialize_str(&hex)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Color32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        parse_hex(&hex).ok_or_else(|| serde::de::Error::custom(format!("invalid color: {hex}")))
    }

    pub fn parse_hex(hex: &str) -> Option<Color32> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color32::from_rgb(r, g, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_round_trips_through_hex() {
        let project = Project::new("Launch", Color32::from_rgb(0x3b, 0x82, 0xf6));
        let json = serde_json::to_string(&project).unwrap();
        assert!(json.contains("\"#3b82f6\""));

        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(back.color, project.color);
        assert_eq!(back.name, "Launch");
    }

    #[test]
    fn palette_wraps() {
        assert_eq!(Project::palette_color(0), PROJECT_PALETTE[0]);
        assert_eq!(Project::palette_color(8), PROJECT_PALETTE[0]);
        assert_eq!(Project::palette_color(11), PROJECT_PALETTE[3]);
    }
}
