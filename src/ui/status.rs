use crate::app::App;
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Render the status bar
pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    // Use Cow to avoid allocations for static strings and borrowed status messages
    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.session.status().is_busy() {
        Cow::Borrowed("Replying... [Esc]leave chat [Ctrl+C]quit")
    } else if app.in_chat() {
        Cow::Borrowed("[Enter]send [Up/Down/PgUp/PgDn]scroll [Esc]back to topics [Ctrl+T]theme")
    } else {
        Cow::Borrowed(
            "[Left/Right]card [Tab]topic [Shift+Left/Right]scroll tabs [Up/Down]question [Enter]ask [Esc]quit",
        )
    };

    f.render_widget(Paragraph::new(text).style(app.theme.status_bar), area);
}
