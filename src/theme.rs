use ratatui::style::Color;

/// All themeable colors in the application
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    // Log levels
    pub level_fatal: Color,
    pub level_error: Color,
    pub level_warn: Color,
    pub level_info: Color,
    pub level_debug: Color,
    pub level_trace: Color,

    // Log rows
    pub timestamp: Color,
    pub match_marker: Color,

    // Pane frames
    pub border: Color,
    pub title: Color,
    pub status: Color,

    // Query line
    pub query_unset: Color,
    pub query_valid: Color,
    pub query_invalid: Color,

    // Detail pane
    pub json: Color,

    // Messages
    pub empty_state: Color,
    pub warning_message: Color,

    // Help overlay
    pub help_border: Color,
    pub help_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::nord()
    }
}

impl Theme {
    /// Nord palette
    pub fn nord() -> Self {
        Self {
            level_fatal: Color::Rgb(191, 97, 106),
            level_error: Color::Rgb(208, 135, 112),
            level_warn: Color::Rgb(235, 203, 139),
            level_info: Color::Rgb(163, 190, 140),
            level_debug: Color::Rgb(129, 161, 193),
            level_trace: Color::Rgb(143, 188, 187),

            timestamp: Color::Rgb(76, 86, 106),
            match_marker: Color::Rgb(235, 203, 139),

            border: Color::Rgb(76, 86, 106),
            title: Color::Rgb(136, 192, 208),
            status: Color::Rgb(216, 222, 233),

            query_unset: Color::Rgb(143, 188, 187),
            query_valid: Color::Rgb(163, 190, 140),
            query_invalid: Color::Rgb(191, 97, 106),

            json: Color::Rgb(216, 222, 233),

            empty_state: Color::Rgb(76, 86, 106),
            warning_message: Color::Rgb(235, 203, 139),

            help_border: Color::Rgb(136, 192, 208),
            help_bg: Color::Rgb(46, 52, 64),
        }
    }

    /// Plain 16-color palette for terminals without truecolor
    pub fn classic() -> Self {
        Self {
            level_fatal: Color::Magenta,
            level_error: Color::Red,
            level_warn: Color::Yellow,
            level_info: Color::Green,
            level_debug: Color::Blue,
            level_trace: Color::DarkGray,

            timestamp: Color::DarkGray,
            match_marker: Color::Yellow,

            border: Color::DarkGray,
            title: Color::Cyan,
            status: Color::White,

            query_unset: Color::Cyan,
            query_valid: Color::Green,
            query_invalid: Color::Red,

            json: Color::Cyan,

            empty_state: Color::DarkGray,
            warning_message: Color::Yellow,

            help_border: Color::Cyan,
            help_bg: Color::Black,
        }
    }

    /// Look up a theme by name (case-insensitive)
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "nord" | "default" => Some(Self::nord()),
            "classic" => Some(Self::classic()),
            _ => None,
        }
    }

    /// Three-letter code and color for a level label
    pub fn level_code(&self, level: &str) -> (String, Option<Color>) {
        let (code, color) = match level.to_lowercase().as_str() {
            "panic" => ("PNC", self.level_fatal),
            "fatal" | "critical" => ("FTL", self.level_fatal),
            "error" | "err" => ("ERR", self.level_error),
            "warn" | "warning" => ("WRN", self.level_warn),
            "info" => ("INF", self.level_info),
            "debug" => ("DBG", self.level_debug),
            "trace" => ("TRC", self.level_trace),
            other => {
                let code: String = other.to_uppercase().chars().take(3).collect();
                return (format!("{:<3}", code), None);
            }
        };
        (code.to_string(), Some(color))
    }
}
