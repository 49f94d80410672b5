use chat_shared::{ConnectionState, Origin};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::display::{RenderedMessage, TerminalDisplay};
use crate::input::InputField;

pub fn render(f: &mut Frame, display: &TerminalDisplay, input: &InputField) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    let messages: Vec<ListItem> = display.messages().iter().map(message_item).collect();
    let messages_widget = List::new(messages).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Chat · {}", display.endpoint())),
    );
    let mut list_state = ListState::default().with_selected(display.selected());
    f.render_stateful_widget(messages_widget, chunks[0], &mut list_state);

    // One row, scrolled sideways so the cursor stays visible
    let prefix: String = input.value().chars().take(input.cursor()).collect();
    let inner_width = chunks[1].width.saturating_sub(2);
    let (scroll, column) = input_viewport(Line::raw(prefix).width(), inner_width);

    let input_widget = Paragraph::new(input.value())
        .block(Block::default().borders(Borders::ALL).title("Input"))
        .scroll((0, scroll));
    f.render_widget(input_widget, chunks[1]);

    if input.is_focused() {
        let x = chunks[1].x.saturating_add(1).saturating_add(column);
        let y = chunks[1].y.saturating_add(1);
        f.set_cursor_position((x, y));
    }

    f.render_widget(status_line(display.status()), chunks[2]);
}

/// Horizontal scroll and cursor column for a one-row input `inner_width`
/// cells wide, with `prefix_width` cells of text before the cursor.
fn input_viewport(prefix_width: usize, inner_width: u16) -> (u16, u16) {
    let visible = usize::from(inner_width.max(1)) - 1;
    let scroll = prefix_width.saturating_sub(visible);
    let column = prefix_width - scroll;
    (
        u16::try_from(scroll).unwrap_or(u16::MAX),
        u16::try_from(column).unwrap_or(u16::MAX),
    )
}

fn status_line(state: ConnectionState) -> Line<'static> {
    let color = match state {
        ConnectionState::Connecting => Color::Yellow,
        ConnectionState::Open => Color::Green,
        ConnectionState::Closed => Color::Red,
    };
    Line::from(vec![
        Span::styled("● ", Style::default().fg(color)),
        Span::styled(state.label(), Style::default().fg(color).bold()),
        Span::raw("  Enter send · PgUp/PgDn scroll · Esc quit").dark_gray(),
    ])
}

fn message_item(rendered: &RenderedMessage) -> ListItem<'static> {
    let origin = rendered.message.origin;
    let label_style = match origin {
        Origin::User => Style::default().fg(Color::Cyan).bold(),
        Origin::Bot => Style::default().fg(Color::Magenta).bold(),
    };

    let mut lines = vec![Line::from(Span::styled(
        format!("{}:", origin.label()),
        label_style,
    ))];
    match &rendered.lines {
        Some(styled) => lines.extend(styled.iter().cloned()),
        None => lines.extend(
            rendered
                .content
                .lines()
                .map(|line| Line::raw(line.to_string())),
        ),
    }
    lines.push(Line::default());

    ListItem::new(Text::from(lines))
}
