use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use modelbot_core::ChatRole;

use crate::app::App;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn label_style(role: ChatRole) -> Style {
    let color = match role {
        ChatRole::User => Color::Cyan,
        ChatRole::Assistant => Color::Yellow,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" modelbot ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("{}: {} ", app.provider.display_name(), app.model),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area for mouse hit-testing and scroll calculations (inner size minus borders)
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let pending = app.session.is_pending();

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat ");

    let chat_text = if app.session.transcript().is_empty() && !pending {
        Text::from(Span::styled(
            "Type a message and press Enter...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.session.labeled() {
            lines.push(Line::from(Span::styled(
                format!("{}:", msg.label),
                label_style(msg.role),
            )));
            match msg.role {
                ChatRole::User => lines.push(Line::from(msg.message.to_string())),
                ChatRole::Assistant => {
                    lines.extend(msg.message.lines().map(parse_markdown_line));
                }
            }
            lines.push(Line::default());
        }

        if pending {
            lines.push(Line::from(Span::styled(
                format!("{}:", ChatRole::Assistant.label()),
                label_style(ChatRole::Assistant),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.session.is_pending();
    let (border_color, title) = if pending {
        (Color::DarkGray, " Sending... ")
    } else {
        (Color::Yellow, " Message (Enter to send) ")
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor inside the box (inner width excludes borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .session
        .input()
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let text_color = if pending { Color::DarkGray } else { Color::Cyan };
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(input_block);

    frame.render_widget(input, area);

    if !pending {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.session.is_pending() {
        (" SENDING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" ^L ", key_style),
        Span::styled(" clear ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ];

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::AppEvent;
    use async_trait::async_trait;
    use modelbot_core::{Completion, Provider, RemoteError};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct Never;

    #[async_trait]
    impl Completion for Never {
        async fn complete(&self, _message: &str) -> Result<String, RemoteError> {
            std::future::pending().await
        }
    }

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(Arc::new(Never), Provider::Ollama, "gemma3:latest".to_string(), tx);
        (app, rx)
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_bold_markdown_spans() {
        let line = parse_markdown_line("a **b** c");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "b");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_unclosed_bold_is_literal() {
        let line = parse_markdown_line("a **b");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "a **b");
    }

    #[tokio::test]
    async fn test_empty_chat_shows_placeholder() {
        let (mut app, _rx) = test_app();
        let screen = draw(&mut app);
        assert!(screen.contains("Type a message"));
        assert!(screen.contains("Ollama (Local): gemma3:latest"));
    }

    #[tokio::test]
    async fn test_pending_shows_labels_and_thinking() {
        let (mut app, _rx) = test_app();
        app.session.set_input("Hi");
        app.submit();

        let screen = draw(&mut app);
        assert!(screen.contains("You:"));
        assert!(screen.contains("Assistant:"));
        assert!(screen.contains("Thinking."));
        assert!(screen.contains("Sending..."));
    }

    #[tokio::test]
    async fn test_reply_replaces_thinking() {
        let (mut app, _rx) = test_app();
        app.session.set_input("Hi");
        app.submit();
        app.receive_reply(Ok("Hello there".to_string()));

        let screen = draw(&mut app);
        assert!(screen.contains("Hello there"));
        assert!(!screen.contains("Thinking"));
        assert_eq!(app.chat_width, 58);
    }

    #[tokio::test]
    async fn test_long_transcript_scrolls_to_newest_reply() {
        let (mut app, _rx) = test_app();
        // First draw records the pane size used for scrolling
        draw(&mut app);
        assert_eq!(app.chat_height, 13);

        for n in 0..5 {
            app.session.set_input(format!("question {}", n));
            app.submit();
            app.receive_reply(Ok(format!("answer {}", n)));
        }

        // Three lines per message, ten messages, thirteen visible rows
        assert_eq!(app.scroll, 30 - 13);
        let screen = draw(&mut app);
        assert!(screen.contains("answer 4"));
        assert!(screen.contains("answer 3"));
        assert!(!screen.contains("answer 0"));
    }
}
