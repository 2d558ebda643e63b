use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use companion_core::Role;

use crate::app::{App, InputMode, CAPABILITIES};

const TITLE: &str = " 🧠 Code Companion ";
const CAPTION: &str = "🚀 Your AI Pair Programmer with Debugging Superpowers";

fn code_style() -> Style {
    Style::default().fg(Color::Green)
}

/// Style `**bold**` and `` `code` `` spans within one line of model output
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current_text = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let (closing, style): (&str, Style) = match c {
            '`' => ("`", code_style()),
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                ("**", Style::default().add_modifier(Modifier::BOLD))
            }
            _ => {
                current_text.push(c);
                continue;
            }
        };

        // Collect until the closing delimiter
        let mut inner = String::new();
        let mut found_close = false;
        while let Some(c) = chars.next() {
            if closing == "`" && c == '`' {
                found_close = true;
                break;
            }
            if closing == "**" && c == '*' && chars.peek() == Some(&'*') {
                chars.next();
                found_close = true;
                break;
            }
            inner.push(c);
        }

        if found_close && !inner.is_empty() {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }
            spans.push(Span::styled(inner, style));
        } else {
            // No closing delimiter, keep it literal
            current_text.push_str(closing);
            current_text.push_str(&inner);
            if found_close {
                current_text.push_str(closing);
            }
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    Line::from(spans)
}

/// Render a message body, dimming the contents of fenced code blocks
fn push_markdown(lines: &mut Vec<Line<'static>>, content: &str) {
    let mut in_code_block = false;
    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(Line::from(Span::styled(line.to_string(), Style::default().fg(Color::DarkGray))));
        } else if in_code_block {
            lines.push(Line::from(Span::styled(line.to_string(), code_style())));
        } else {
            lines.push(parse_markdown_line(line));
        }
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [main_area, sidebar_area] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(32),
    ])
    .areas(body_area);

    render_header(frame, header_area);
    render_chat_screen(app, frame, main_area);
    render_sidebar(app, frame, sidebar_area);
    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    } else if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(TITLE, Style::default().fg(Color::Cyan).bold()),
        Span::styled(CAPTION, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" ↑/↓ ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" t ", key_style),
            Span::styled(if app.show_thinking { " hide thinking " } else { " show thinking " }, label_style),
            Span::styled(" M ", key_style),
            Span::styled(" model ", label_style),
            Span::styled(" K ", key_style),
            Span::styled(" API key ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

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

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let status_height = if app.status.is_some() { 1 } else { 0 };

    // Input sits above the conversation
    let [input_area, status_area, chat_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(status_height),
        Constraint::Min(0),
    ])
    .areas(area);

    render_input(app, frame, input_area);

    if let Some(status) = &app.status {
        let status_line = Paragraph::new(format!(" {}", status))
            .style(Style::default().fg(Color::Red));
        frame.render_widget(status_line, status_area);
    }

    // Store area for mouse hit-testing and inner size for scroll calculations
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Groq: {} ", app.selected_model));

    let chat = Paragraph::new(chat_text(app))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);
}

fn chat_text(app: &App) -> Text<'static> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let thinking_style = Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);
    let ai_label = Span::styled("AI:", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    for msg in app.session.messages() {
        // Thinking goes above the message it belongs to
        if let Some(thinking) = &msg.thinking {
            let marker = if app.show_thinking { "▾" } else { "▸" };
            lines.push(Line::from(Span::styled(
                format!("{} 🧠 Thinking", marker),
                Style::default().fg(Color::Magenta),
            )));
            if app.show_thinking {
                for line in thinking.lines() {
                    lines.push(Line::from(Span::styled(line.to_string(), thinking_style)));
                }
            }
        }

        match msg.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(msg.content.clone()));
            }
            Role::Assistant => {
                lines.push(Line::from(ai_label.clone()));
                push_markdown(&mut lines, &msg.content);
            }
            Role::System => {
                lines.push(Line::from(Span::styled(
                    "System:",
                    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(msg.content.clone(), thinking_style)));
            }
        }
        lines.push(Line::default());
    }

    if app.streaming {
        lines.push(Line::from(ai_label));
        if app.stream_buffer.is_empty() {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(format!("Thinking{}", dots), thinking_style)));
        } else {
            for line in app.stream_buffer.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
    }

    Text::from(lines)
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let title = if app.streaming {
        " Type Your Coding Question Here 😎 (waiting for response) "
    } else {
        " Type Your Coding Question Here 😎 "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.query_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.query_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing && !app.show_api_key_input && !app.show_model_picker {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_sidebar(app: &App, frame: &mut Frame, area: Rect) {
    let label = Style::default().fg(Color::DarkGray);
    let key_status = match app.key_source() {
        Some(source) => Span::styled(format!("set ({})", source), Style::default().fg(Color::Green)),
        None => Span::styled("missing (press K)", Style::default().fg(Color::Red)),
    };

    let mut lines = vec![
        Line::from(Span::styled("⚙️ Configuration", Style::default().fg(Color::Cyan).bold())),
        Line::from(vec![Span::styled("Model: ", label), Span::raw(app.selected_model.clone())]),
        Line::from(vec![Span::styled("Temperature: ", label), Span::raw(format!("{:.1}", app.temperature))]),
        Line::from(vec![Span::styled("API key: ", label), key_status]),
        Line::from(vec![Span::styled("Exchanges: ", label), Span::raw(app.exchanges().to_string())]),
        Line::default(),
        Line::from(Span::styled("Model Capabilities", Style::default().fg(Color::Cyan).bold())),
    ];
    for capability in CAPABILITIES {
        lines.push(Line::from(format!(" • {}", capability)));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Built with Groq", label)));

    let sidebar = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).border_style(label))
        .wrap(Wrap { trim: true });

    frame.render_widget(sidebar, area);
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 48, app.available_models.len() as u16 + 2);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Choose Model (Enter to select, Esc to cancel) ");

    let items: Vec<ListItem> = app
        .available_models
        .iter()
        .map(|model| {
            let style = if model == &app.selected_model {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", model)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.model_picker_state);
}

/// Mask all but the last four characters of a key
fn mask_key(key: &str) -> String {
    let char_count = key.chars().count();
    if char_count <= 4 {
        return "*".repeat(char_count);
    }
    let masked_len = char_count - 4;
    let last_four: String = key.chars().skip(masked_len).collect();
    format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 56, 7);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Groq API Key (Enter to save, Esc to cancel) ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let prompt = Paragraph::new("Paste your key from console.groq.com:")
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(prompt, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let input = Paragraph::new(mask_key(&app.api_key_input))
        .style(Style::default().fg(Color::Cyan));
    frame.render_widget(input, input_area);

    let cursor_x = app.api_key_input_cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    let status = Paragraph::new(format!("{} characters, saved to the config file", app.api_key_input.chars().count()))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, Rect::new(inner.x, inner.y + 4, inner.width, 1));
}
