//! Theme system for the TUI.
//!
//! Provides semantic color roles as ratatui `Style` values. The
//! `ThemeVariant` enum selects between Dark and Light palettes.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// Every semantic UI role mapped to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Browse cards --
    pub card_border: Style,
    pub card_border_active: Style,
    pub card_title: Style,
    pub card_description: Style,
    pub chip: Style,
    pub chip_active: Style,
    pub scroll_arrow: Style,
    pub question: Style,
    pub question_selected: Style,
    pub loading: Style,

    // -- Transcript --
    pub user_label: Style,
    pub user_text: Style,
    pub assistant_label: Style,
    pub assistant_text: Style,
    pub typing_indicator: Style,
    pub error_notice: Style,

    // -- Markdown --
    pub md_heading: Style,
    pub md_code_block: Style,
    pub md_inline_code: Style,
    pub md_emphasis: Style,
    pub md_strong: Style,
    pub md_link: Style,

    // -- Chrome --
    pub header: Style,
    pub input: Style,
    pub input_disabled: Style,
    pub placeholder: Style,
    pub disclaimer: Style,
    pub status_bar: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            card_border: Style::default().fg(Color::DarkGray),
            card_border_active: Style::default().fg(Color::Cyan),
            card_title: Style::default().add_modifier(Modifier::BOLD),
            card_description: Style::default().fg(Color::Gray),
            chip: Style::default().fg(Color::Gray),
            chip_active: Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            scroll_arrow: Style::default().fg(Color::Cyan),
            question: Style::default(),
            question_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            loading: Style::default().fg(Color::DarkGray),

            user_label: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            user_text: Style::default(),
            assistant_label: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            assistant_text: Style::default(),
            typing_indicator: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            error_notice: Style::default().fg(Color::Red),

            md_heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            md_code_block: Style::default().fg(Color::Yellow).bg(Color::Black),
            md_inline_code: Style::default().fg(Color::Yellow),
            md_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            md_strong: Style::default().add_modifier(Modifier::BOLD),
            md_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            input: Style::default(),
            input_disabled: Style::default().fg(Color::DarkGray),
            placeholder: Style::default().fg(Color::DarkGray),
            disclaimer: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
        }
    }

    /// For light terminal backgrounds.
    fn light() -> Self {
        Self {
            card_border: Style::default().fg(Color::Gray),
            card_border_active: Style::default().fg(Color::Blue),
            card_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            card_description: Style::default().fg(Color::DarkGray),
            chip: Style::default().fg(Color::DarkGray),
            chip_active: Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            scroll_arrow: Style::default().fg(Color::Blue),
            question: Style::default().fg(Color::Black),
            question_selected: Style::default().bg(Color::Blue).fg(Color::White),
            loading: Style::default().fg(Color::DarkGray),

            user_label: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            user_text: Style::default().fg(Color::Black),
            assistant_label: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            assistant_text: Style::default().fg(Color::Black),
            typing_indicator: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            error_notice: Style::default().fg(Color::Red),

            md_heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            md_code_block: Style::default().fg(Color::DarkGray).bg(Color::White),
            md_inline_code: Style::default().fg(Color::DarkGray),
            md_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            md_strong: Style::default().add_modifier(Modifier::BOLD),
            md_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            input: Style::default().fg(Color::Black),
            input_disabled: Style::default().fg(Color::Gray),
            placeholder: Style::default().fg(Color::Gray),
            disclaimer: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            status_bar: Style::default().bg(Color::White).fg(Color::Black),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
