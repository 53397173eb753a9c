//! The chat widget: launcher button plus the chat panel.
//!
//! The launcher sits in the configured corner. When the session is open the
//! panel is drawn between the launcher and the opposite edge, so a
//! bottom-anchored widget grows upwards and a top-anchored one downwards.

use crate::input::{TextInput, TextInputState};
use crate::text::{truncate_to_width, visual_width, wrap_text};
use crate::theme::Theme;
use mozbot_engine::{Message, Position, SessionSnapshot, WidgetConfig};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};

pub const PANEL_WIDTH: u16 = 44;
pub const PANEL_HEIGHT: u16 = 20;
const LAUNCHER_HEIGHT: u16 = 3;
const MARGIN_X: u16 = 2;
const MARGIN_Y: u16 = 1;
/// Smallest panel worth drawing: borders, header, one message row, input.
const MIN_PANEL_HEIGHT: u16 = 7;

pub const ONLINE_STATUS: &str = "Online now";
pub const BRANDING: &str = "Powered by MozBot";
pub const TYPING_INDICATOR: &str = "• • •";
const SEND_LABEL: &str = "[Send]";

/// Where the launcher and panel go inside the host area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetLayout {
    pub launcher: Rect,
    pub panel: Option<Rect>,
}

/// Text on the launcher button.
pub fn launcher_label(config: &WidgetConfig, open: bool) -> String {
    if open {
        "x Close".to_string()
    } else {
        format!("Chat with {}", config.bot_name)
    }
}

/// Place the launcher in `position` and, if `open`, the panel next to it.
pub fn widget_layout(area: Rect, position: Position, label_width: u16, open: bool) -> WidgetLayout {
    let max_width = area.width.saturating_sub(MARGIN_X * 2);
    let width = label_width.saturating_add(4).min(max_width);
    let height = LAUNCHER_HEIGHT.min(area.height);

    let x_for = |w: u16| {
        if position.is_left() {
            area.x + MARGIN_X.min(area.width)
        } else {
            area.right().saturating_sub(MARGIN_X + w).max(area.x)
        }
    };

    let launcher_y = if position.is_top() {
        area.y + MARGIN_Y.min(area.height.saturating_sub(height))
    } else {
        area.bottom().saturating_sub(MARGIN_Y + height).max(area.y)
    };
    let launcher = Rect::new(x_for(width), launcher_y, width, height).intersection(area);

    let panel = open
        .then(|| {
            let width = PANEL_WIDTH.min(max_width);
            let available = if position.is_top() {
                area.bottom().saturating_sub(launcher.bottom() + MARGIN_Y)
            } else {
                launcher.y.saturating_sub(area.y + MARGIN_Y)
            };
            let height = PANEL_HEIGHT.min(available);
            let y = if position.is_top() {
                launcher.bottom()
            } else {
                launcher.y - height
            };
            Rect::new(x_for(width), y, width, height)
        })
        .filter(|panel| panel.height >= MIN_PANEL_HEIGHT && panel.width > 4);

    WidgetLayout { launcher, panel }
}

/// Lines for the message list, wrapped to `width`.
///
/// Bot messages are left aligned in the accent color, user messages right
/// aligned. A typing indicator follows the log while a reply is pending.
pub fn message_lines(
    messages: &[Message],
    typing: bool,
    width: u16,
    theme: Theme,
) -> Vec<Line<'static>> {
    // Bubbles take at most 85% of the row, minus the one-cell padding.
    let bubble = (usize::from(width) * 85 / 100).saturating_sub(2).max(1);
    let mut lines = Vec::new();

    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        let (style, alignment) = if message.is_bot() {
            (theme.bot_message(), Alignment::Left)
        } else {
            (theme.user_message(), Alignment::Right)
        };
        for row in wrap_text(&message.text, bubble) {
            lines.push(Line::from(Span::styled(format!(" {row} "), style)).alignment(alignment));
        }
    }

    if typing {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            format!(" {TYPING_INDICATOR} "),
            theme.bot_message(),
        )));
    }

    lines
}

/// Renders the whole widget for one session snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ChatWidget<'a> {
    config: &'a WidgetConfig,
    snapshot: &'a SessionSnapshot,
    input: &'a TextInputState,
    input_focused: bool,
    theme: Theme,
}

impl<'a> ChatWidget<'a> {
    pub fn new(
        config: &'a WidgetConfig,
        snapshot: &'a SessionSnapshot,
        input: &'a TextInputState,
    ) -> Self {
        Self {
            config,
            snapshot,
            input,
            input_focused: false,
            theme: Theme::from_config(config),
        }
    }

    #[must_use]
    pub fn input_focused(mut self, focused: bool) -> Self {
        self.input_focused = focused;
        self
    }

    fn render_launcher(&self, area: Rect, buf: &mut Buffer) {
        let label = launcher_label(self.config, self.snapshot.is_open());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .style(self.theme.header());
        let inner = block.inner(area);
        block.render(area, buf);
        let label = truncate_to_width(&label, usize::from(inner.width));
        Paragraph::new(label)
            .alignment(Alignment::Center)
            .style(self.theme.header())
            .render(inner, buf);
    }

    fn render_panel(&self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let border_style = if self.input_focused {
            self.theme.border_focused()
        } else {
            self.theme.border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .style(self.theme.base());
        let inner = block.inner(area);
        block.render(area, buf);

        let [header, messages, input, footer] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let width = usize::from(header.width.saturating_sub(2));
        Paragraph::new(vec![
            Line::from(Span::styled(
                format!(" {}", truncate_to_width(&self.config.bot_name, width)),
                self.theme.header(),
            )),
            Line::from(Span::styled(
                format!(" {ONLINE_STATUS}"),
                self.theme.header_status(),
            )),
        ])
        .style(self.theme.header())
        .render(header, buf);

        let lines = message_lines(
            &self.snapshot.messages,
            self.snapshot.is_typing(),
            messages.width,
            self.theme,
        );
        // Pin the view to the newest messages.
        let skip = lines.len().saturating_sub(usize::from(messages.height));
        Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>())
            .style(self.theme.base())
            .render(messages, buf);

        let send_width = u16::try_from(visual_width(SEND_LABEL)).unwrap_or(u16::MAX);
        let [field, send] =
            Layout::horizontal([Constraint::Min(1), Constraint::Length(send_width)]).areas(input);
        TextInput::new(self.input, self.theme)
            .focused(self.input_focused)
            .render(field, buf);
        Paragraph::new(SEND_LABEL)
            .style(self.theme.send(!self.snapshot.is_typing()))
            .render(send, buf);

        Paragraph::new(BRANDING)
            .alignment(Alignment::Center)
            .style(self.theme.dim())
            .render(footer, buf);
    }
}

impl Widget for ChatWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let label = launcher_label(self.config, self.snapshot.is_open());
        let label_width = u16::try_from(visual_width(&label)).unwrap_or(u16::MAX);
        let layout = widget_layout(
            area,
            self.config.position,
            label_width,
            self.snapshot.is_open(),
        );

        self.render_launcher(layout.launcher, buf);
        if let Some(panel) = layout.panel {
            self.render_panel(panel, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;
    use mozbot_engine::chat::IdClock;
    use mozbot_engine::{ReplyPhase, Sender, Visibility};

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 80,
        height: 30,
    };

    fn snapshot(open: bool, typing: bool, texts: &[(Sender, &str)]) -> SessionSnapshot {
        let mut clock = IdClock::new();
        SessionSnapshot {
            visibility: if open {
                Visibility::Open
            } else {
                Visibility::Closed
            },
            phase: if typing {
                ReplyPhase::AwaitingReply
            } else {
                ReplyPhase::Idle
            },
            messages: texts
                .iter()
                .map(|(sender, text)| clock.message(*sender, *text))
                .collect(),
        }
    }

    fn render(config: &WidgetConfig, snapshot: &SessionSnapshot) -> String {
        let input = TextInputState::new();
        let mut buf = Buffer::empty(AREA);
        ChatWidget::new(config, snapshot, &input).render(AREA, &mut buf);
        buffer_to_string(&buf)
    }

    #[test]
    fn test_layout_corners() {
        let bottom_right = widget_layout(AREA, Position::BottomRight, 10, true);
        assert_eq!(bottom_right.launcher, Rect::new(64, 26, 14, 3));
        let panel = bottom_right.panel.unwrap();
        assert_eq!(panel.right(), 78);
        assert_eq!(panel.bottom(), bottom_right.launcher.y);
        assert_eq!(panel.height, PANEL_HEIGHT);

        let top_left = widget_layout(AREA, Position::TopLeft, 10, true);
        assert_eq!(top_left.launcher, Rect::new(2, 1, 14, 3));
        let panel = top_left.panel.unwrap();
        assert_eq!(panel.x, 2);
        assert_eq!(panel.y, top_left.launcher.bottom());
    }

    #[test]
    fn test_layout_closed_has_no_panel() {
        let layout = widget_layout(AREA, Position::BottomLeft, 10, false);
        assert!(layout.panel.is_none());
        assert_eq!(layout.launcher.x, 2);
    }

    #[test]
    fn test_layout_too_small_for_panel() {
        let tiny = Rect::new(0, 0, 20, 6);
        let layout = widget_layout(tiny, Position::BottomRight, 10, true);
        assert!(layout.panel.is_none());
        assert_eq!(layout.launcher.intersection(tiny), layout.launcher);
    }

    #[test]
    fn test_message_lines_alignment_and_typing() {
        let snap = snapshot(
            true,
            true,
            &[(Sender::Bot, "Welcome"), (Sender::User, "hello")],
        );
        let lines = message_lines(&snap.messages, true, 40, Theme::default());
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].alignment, Some(Alignment::Left));
        assert_eq!(lines[2].alignment, Some(Alignment::Right));
        assert_eq!(lines[4].to_string(), format!(" {TYPING_INDICATOR} "));
    }

    #[test]
    fn test_message_lines_wrap_long_text() {
        let snap = snapshot(
            true,
            false,
            &[(Sender::Bot, "one two three four five six seven eight nine ten")],
        );
        let lines = message_lines(&snap.messages, false, 20, Theme::default());
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width() <= 20));
    }

    #[test]
    fn test_render_closed_shows_only_launcher() {
        let config = WidgetConfig::default();
        let snap = snapshot(false, false, &[(Sender::Bot, "Hello! How can I help you today?")]);
        let screen = render(&config, &snap);
        assert!(screen.contains("Chat with MozBot Assistant"));
        assert!(!screen.contains(ONLINE_STATUS));
        assert!(!screen.contains("How can I help"));
    }

    #[test]
    fn test_render_open_panel() {
        let config = WidgetConfig::default();
        let snap = snapshot(
            true,
            true,
            &[
                (Sender::Bot, "Hello! How can I help you today?"),
                (Sender::User, "pricing?"),
            ],
        );
        let screen = render(&config, &snap);
        assert!(screen.contains("MozBot Assistant"));
        assert!(screen.contains(ONLINE_STATUS));
        assert!(screen.contains("Hello! How can I help you today?"));
        assert!(screen.contains("pricing?"));
        assert!(screen.contains(TYPING_INDICATOR));
        assert!(screen.contains("Type your message..."));
        assert!(screen.contains(BRANDING));
        assert!(screen.contains("x Close"));
    }

    #[test]
    fn test_render_top_left_puts_launcher_first() {
        let config = WidgetConfig {
            position: Position::TopLeft,
            ..Default::default()
        };
        let snap = snapshot(true, false, &[(Sender::Bot, "Welcome aboard")]);
        let screen = render(&config, &snap);
        let launcher_row = screen.lines().position(|l| l.contains("x Close")).unwrap();
        let header_row = screen.lines().position(|l| l.contains(ONLINE_STATUS)).unwrap();
        assert!(launcher_row < header_row);
        assert!(screen.lines().nth(launcher_row).unwrap().starts_with("  "));
    }
}
