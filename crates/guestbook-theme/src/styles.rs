use rand::Rng;
use serde::Serialize;

use crate::detect::ThemeId;

/// Colors and borders that make up a theme's page chrome.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub gradient: (&'static str, &'static str),
    pub heading: &'static str,
    pub heading_shadow: Option<&'static str>,
    pub button: &'static str,
    pub button_border: &'static str,
    pub button_text: Option<&'static str>,
    pub panel_alpha: f32,
    pub shadow: &'static str,
    pub border: Option<&'static str>,
}

impl ThemeId {
    pub fn palette(self) -> Palette {
        let base = Palette {
            gradient: ("#f5f7fa", "#e4e8f1"),
            heading: "#1E88E5",
            heading_shadow: None,
            button: "#1E88E5",
            button_border: "#1976D2",
            button_text: None,
            panel_alpha: 0.9,
            shadow: "0 6px 15px rgba(0, 0, 0, 0.1)",
            border: None,
        };

        match self {
            ThemeId::Spring => Palette {
                gradient: ("#e0f7fa", "#c8e6c9"),
                heading: "#388e3c",
                button: "#66bb6a",
                button_border: "#43a047",
                panel_alpha: 0.85,
                ..base
            },
            ThemeId::Summer => Palette {
                gradient: ("#bbdefb", "#4fc3f7"),
                heading: "#0277bd",
                button: "#29b6f6",
                button_border: "#0288d1",
                panel_alpha: 0.8,
                shadow: "0 8px 20px rgba(0, 0, 0, 0.15)",
                ..base
            },
            ThemeId::Autumn => Palette {
                gradient: ("#ffe0b2", "#ffab91"),
                heading: "#e65100",
                button: "#ff8a65",
                button_border: "#e64a19",
                panel_alpha: 0.85,
                shadow: "0 6px 15px rgba(0, 0, 0, 0.15)",
                border: Some("border-left: 5px solid #bf360c;"),
                ..base
            },
            ThemeId::Winter => Palette {
                gradient: ("#e3f2fd", "#bbdefb"),
                heading: "#1565c0",
                button: "#42a5f5",
                button_border: "#1976d2",
                border: Some("border: 1px solid rgba(200, 230, 255, 0.8);"),
                ..base
            },
            ThemeId::ChineseNewYear => Palette {
                gradient: ("#b71c1c", "#d32f2f"),
                heading: "#ffd700",
                heading_shadow: Some("1px 1px 2px rgba(0, 0, 0, 0.3)"),
                button: "#ffc107",
                button_border: "#ff8f00",
                button_text: Some("#b71c1c"),
                shadow: "0 8px 20px rgba(0, 0, 0, 0.2)",
                border: Some("border: 2px solid #ffd700;"),
                ..base
            },
            ThemeId::Qingming => Palette {
                gradient: ("#e8f5e9", "#c8e6c9"),
                heading: "#2e7d32",
                button: "#66bb6a",
                button_border: "#43a047",
                border: Some("border-left: 4px solid #2e7d32;"),
                ..base
            },
            ThemeId::DragonBoat => Palette {
                gradient: ("#e8f5e9", "#81c784"),
                heading: "#1b5e20",
                button: "#4caf50",
                button_border: "#388e3c",
                shadow: "0 6px 15px rgba(0, 0, 0, 0.15)",
                border: Some("border: 2px dashed #4caf50;"),
                ..base
            },
            ThemeId::MidAutumn => Palette {
                gradient: ("#37474f", "#263238"),
                heading: "#ffb74d",
                heading_shadow: Some("1px 1px 3px rgba(0, 0, 0, 0.5)"),
                button: "#ff9800",
                button_border: "#f57c00",
                shadow: "0 8px 20px rgba(0, 0, 0, 0.3)",
                border: Some("border: 2px solid #ff9800;"),
                ..base
            },
            ThemeId::Christmas => Palette {
                gradient: ("#d32f2f", "#1b5e20"),
                heading: "#ffeb3b",
                heading_shadow: Some("1px 1px 3px rgba(0, 0, 0, 0.5)"),
                button: "#f44336",
                button_border: "#d32f2f",
                shadow: "0 8px 20px rgba(0, 0, 0, 0.3)",
                border: Some("border: 3px dashed #f44336;"),
                ..base
            },
            ThemeId::Default => base,
        }
    }

    /// Style sheet for the page chrome of this theme.
    pub fn css(self) -> String {
        let p = self.palette();
        let heading_shadow = p
            .heading_shadow
            .map(|s| format!(" text-shadow: {};", s))
            .unwrap_or_default();
        let button_text = p
            .button_text
            .map(|c| format!(" color: {} !important; font-weight: bold;", c))
            .unwrap_or_default();

        format!(
            ".decorative-bg {{ background: linear-gradient(120deg, {g0}, {g1}); background-attachment: fixed; }}\n\
             .main-container {{ border-radius: 15px; background-color: rgba(255, 255, 255, {alpha}); padding: 2rem; box-shadow: {shadow}; {border} }}\n\
             .main-container h1, .main-container h2, .main-container h3 {{ color: {heading} !important;{heading_shadow} }}\n\
             button, .button {{ background-color: {button} !important; border: 1px solid {button_border} !important;{button_text} }}\n\
             button:hover, .button:hover {{ background-color: {button_border} !important; }}\n",
            g0 = p.gradient.0,
            g1 = p.gradient.1,
            alpha = p.panel_alpha,
            shadow = p.shadow,
            border = p.border.unwrap_or_default(),
            heading = p.heading,
            button = p.button,
            button_border = p.button_border,
        )
    }

    /// Keyframe animations for the two floating theme icons
    /// (top-right, bottom-left). `None` leaves the icon still.
    pub fn icon_animations(self) -> (Option<&'static str>, Option<&'static str>) {
        match self {
            ThemeId::Spring | ThemeId::Summer => (
                Some("float 5s ease-in-out infinite"),
                Some("sway 6s ease-in-out infinite"),
            ),
            ThemeId::Autumn => (
                Some("fall 8s ease-in-out infinite"),
                Some("sway 6s ease-in-out infinite"),
            ),
            ThemeId::Winter => (
                Some("snowfall 8s linear infinite"),
                Some("snowfall 8s linear infinite"),
            ),
            ThemeId::ChineseNewYear => (
                Some("hongbao 5s ease-in-out infinite"),
                Some("lantern 4s ease-in-out infinite"),
            ),
            ThemeId::DragonBoat => (Some("boat 8s linear infinite"), None),
            ThemeId::MidAutumn => (None, Some("lantern 4s ease-in-out infinite")),
            ThemeId::Christmas => (None, Some("gift 4s ease-in-out infinite")),
            ThemeId::Qingming | ThemeId::Default => (None, None),
        }
    }
}

/// One falling snowflake of the Christmas decoration.
#[derive(Debug, Clone, Serialize)]
pub struct Snowflake {
    pub left_pct: f32,
    pub opacity: f32,
    pub size_em: f32,
    pub duration_s: f32,
    pub delay_s: f32,
}

pub const SNOWFLAKE_COUNT: usize = 20;

/// Randomly placed snowflakes; empty for every theme but Christmas.
pub fn snowflakes<R: Rng + ?Sized>(theme: ThemeId, rng: &mut R) -> Vec<Snowflake> {
    if theme != ThemeId::Christmas {
        return Vec::new();
    }
    (0..SNOWFLAKE_COUNT)
        .map(|_| Snowflake {
            left_pct: rng.random_range(0.0..100.0),
            opacity: rng.random_range(0.3..1.0),
            size_em: rng.random_range(0.5..1.5),
            duration_s: rng.random_range(5.0..15.0),
            delay_s: rng.random_range(0.0..5.0),
        })
        .collect()
}
