use ratatui::style::Color;

#[derive(Clone)]
pub struct Theme {
    pub name: &'static str,
    pub bg: Color,
    pub fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub error: Color,
    pub warning: Color,
    pub user_color: Color,
    pub assistant_color: Color,
    pub notice_color: Color,
    pub code_fg: Color,
    /// Background of the hot (picked or hovered) message.
    pub hot_bg: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark",
            bg: Color::Rgb(24, 24, 27),
            fg: Color::Rgb(228, 228, 231),
            accent: Color::Rgb(250, 204, 21),
            muted: Color::Rgb(113, 113, 122),
            error: Color::Rgb(248, 113, 113),
            warning: Color::Rgb(251, 146, 60),
            user_color: Color::Cyan,
            assistant_color: Color::Rgb(250, 204, 21),
            notice_color: Color::Rgb(161, 161, 170),
            code_fg: Color::Rgb(134, 239, 172),
            hot_bg: Color::Rgb(39, 39, 42),
            border: Color::Rgb(63, 63, 70),
            border_focus: Color::Rgb(250, 204, 21),
        }
    }

    pub fn tokyo_night() -> Self {
        Self {
            name: "tokyo-night",
            bg: Color::Rgb(26, 27, 38),
            fg: Color::Rgb(169, 177, 214),
            accent: Color::Rgb(122, 162, 247),
            muted: Color::Rgb(86, 95, 137),
            error: Color::Rgb(247, 118, 142),
            warning: Color::Rgb(224, 175, 104),
            user_color: Color::Rgb(125, 207, 255),
            assistant_color: Color::Rgb(187, 154, 247),
            notice_color: Color::Rgb(224, 175, 104),
            code_fg: Color::Rgb(158, 206, 106),
            hot_bg: Color::Rgb(41, 46, 66),
            border: Color::Rgb(52, 53, 74),
            border_focus: Color::Rgb(122, 162, 247),
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: "dracula",
            bg: Color::Rgb(40, 42, 54),
            fg: Color::Rgb(248, 248, 242),
            accent: Color::Rgb(255, 121, 198),
            muted: Color::Rgb(98, 114, 164),
            error: Color::Rgb(255, 85, 85),
            warning: Color::Rgb(255, 184, 108),
            user_color: Color::Rgb(139, 233, 253),
            assistant_color: Color::Rgb(189, 147, 249),
            notice_color: Color::Rgb(241, 250, 140),
            code_fg: Color::Rgb(80, 250, 123),
            hot_bg: Color::Rgb(68, 71, 90),
            border: Color::Rgb(68, 71, 90),
            border_focus: Color::Rgb(255, 121, 198),
        }
    }

    /// Unknown names fall back to `dark`.
    pub fn by_name(name: &str) -> Self {
        match name {
            "tokyo-night" => Self::tokyo_night(),
            "dracula" => Self::dracula(),
            _ => Self::dark(),
        }
    }

    pub fn exists(name: &str) -> bool {
        Self::all_names().contains(&name)
    }

    pub fn all_names() -> &'static [&'static str] {
        &["dark", "tokyo-night", "dracula"]
    }
}
