use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::{Priority, Project, Task};

use super::app::{App, Item, View};
use super::form::FormField;

const LEFT_WIDTH: usize = 10;
const MODE_WIDTH: usize = 8;
const HELP_SEPARATOR: &str = "  •  ";
/// Title line, description line, spacer.
const ENTRY_HEIGHT: u16 = 3;

pub fn spinner_frames() -> &'static [&'static str] {
    &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]
}

pub fn draw(f: &mut Frame<'_>, app: &App) {
    let area = f.size();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(3),    // body
            Constraint::Length(1), // message
            Constraint::Length(1), // help
        ])
        .split(area);

    draw_status_bar(f, app, layout[0]);
    draw_body(f, app, layout[1]);
    draw_message(f, app, layout[2]);
    draw_help(f, app, layout[3]);
}

fn draw_status_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let width = area.width as usize;

    let left_bg = if app.view == View::Auth {
        Color::Red
    } else {
        Color::Blue
    };
    let left = pad_cell(app.view.badge(), LEFT_WIDTH);
    let mode = pad_cell(mode_label(app.view), MODE_WIDTH);
    let right = position_label(app)
        .map(|p| format!(" {} ", p))
        .unwrap_or_default();

    let reserved = left.width() + mode.width() + right.width();
    let available = width.saturating_sub(reserved);
    let (center, center_style) = match status_center(app) {
        Some(CenterText::Error) => (
            " ERROR ".to_string(),
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ),
        Some(CenterText::Loading(text)) => (text, Style::default().fg(Color::White)),
        None => (String::new(), Style::default()),
    };
    let center = truncate_to_width(&center, available);
    let filler = " ".repeat(available.saturating_sub(center.width()));

    let line = Line::from(vec![
        Span::styled(
            left,
            Style::default()
                .fg(Color::Black)
                .bg(left_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            mode,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(center, center_style),
        Span::raw(filler),
        Span::styled(right, Style::default().fg(Color::Black).bg(Color::Gray)),
    ]);

    f.render_widget(Paragraph::new(line), area);
}

#[derive(Debug, PartialEq, Eq)]
enum CenterText {
    Error,
    Loading(String),
}

fn status_center(app: &App) -> Option<CenterText> {
    if app.error.is_some() {
        return Some(CenterText::Error);
    }
    if app.loading {
        let frames = spinner_frames();
        let spinner = frames[app.spinner_index % frames.len()];
        return Some(CenterText::Loading(format!(" {} Loading... ", spinner)));
    }
    None
}

fn mode_label(view: View) -> &'static str {
    if view.is_form() {
        "INPUT"
    } else {
        "NORMAL"
    }
}

fn position_label(app: &App) -> Option<String> {
    let (index, total) = app.position()?;
    if app.view == View::Config {
        Some(format!("Field {}/{}", index, total))
    } else {
        Some(format!("{}/{}", index, total))
    }
}

/// Left-aligned text in a fixed-width cell with one column of padding.
fn pad_cell(text: &str, width: usize) -> String {
    let inner = width.saturating_sub(1);
    let text = truncate_to_width(text, inner);
    let fill = inner.saturating_sub(text.width());
    format!(" {}{}", text, " ".repeat(fill))
}

fn draw_body(f: &mut Frame<'_>, app: &App, area: Rect) {
    match app.view {
        View::Config => draw_form(f, app, "TickTick Configuration", &[], area),
        View::Auth => {
            let mut intro = vec![];
            if let Some(url) = &app.auth_url {
                let muted = Style::default().fg(Color::DarkGray);
                intro.push(Line::from(Span::styled(
                    "Open the following link in your browser to authorize:",
                    muted,
                )));
                intro.push(Line::from(Span::styled("(copied to clipboard)", muted)));
                intro.push(Line::from(""));
                intro.push(Line::from(Span::styled(
                    url.clone(),
                    Style::default().fg(Color::Cyan),
                )));
                intro.push(Line::from(""));
            }
            draw_form(f, app, "TickTick Authorization", &intro, area);
        }
        View::ProjectList => draw_list(f, app, "No projects found", "Loading projects...", area),
        View::TaskList => draw_list(f, app, "No tasks found", "Loading tasks...", area),
        View::TaskDetail | View::CreateTask | View::CreateProject | View::DeleteConfirm => {}
    }
}

fn inset(area: Rect, horizontal: u16, vertical: u16) -> Rect {
    Rect {
        x: area.x.saturating_add(horizontal),
        y: area.y.saturating_add(vertical),
        width: area.width.saturating_sub(horizontal * 2),
        height: area.height.saturating_sub(vertical * 2),
    }
}

fn draw_form(f: &mut Frame<'_>, app: &App, title: &str, intro: &[Line<'static>], area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            title.to_string(),
            Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(intro.iter().cloned());

    for item in &app.items {
        if let Item::Field(field) = item {
            lines.push(field_line(field));
            lines.push(Line::from(""));
        }
    }

    let p = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(p, inset(area, 4, 2));
}

/// `> value` with the cursor drawn as a reversed cell when focused.
fn field_line(field: &FormField) -> Line<'static> {
    let (text_style, placeholder_style) = if field.is_focused() {
        (
            Style::default().fg(Color::Black).bg(Color::Gray),
            Style::default().fg(Color::LightBlue).bg(Color::Gray),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::DarkGray),
        )
    };

    let mut spans = vec![Span::styled("> ", text_style)];
    let text = field.display_text();

    if text.is_empty() {
        let mut chars = field.placeholder.chars();
        if field.is_focused() {
            let first = chars.next().map(String::from).unwrap_or_else(|| " ".into());
            spans.push(Span::styled(
                first,
                placeholder_style.add_modifier(Modifier::REVERSED),
            ));
        }
        spans.push(Span::styled(chars.collect::<String>(), placeholder_style));
        return Line::from(spans);
    }

    if !field.is_focused() {
        spans.push(Span::styled(text, text_style));
        return Line::from(spans);
    }

    let col = field.cursor_column();
    let before: String = text.chars().take(col).collect();
    let at: String = text.chars().nth(col).map(String::from).unwrap_or_else(|| " ".into());
    let after: String = text.chars().skip(col + 1).collect();
    spans.push(Span::styled(before, text_style));
    spans.push(Span::styled(at, text_style.add_modifier(Modifier::REVERSED)));
    spans.push(Span::styled(after, text_style));
    Line::from(spans)
}

fn draw_list(f: &mut Frame<'_>, app: &App, empty: &str, loading: &str, area: Rect) {
    if app.items.is_empty() {
        let notice = if app.loading { loading } else { empty };
        f.render_widget(Paragraph::new(notice.to_string()), inset(area, 2, 2));
        return;
    }

    let inner = inset(area, 4, 1);
    let rows = inner.height.saturating_sub(1).max(ENTRY_HEIGHT);
    let per_page = (rows / ENTRY_HEIGHT).max(1) as usize;
    let selected = app.selected_index();
    let page = selected / per_page;
    let pages = app.items.len().div_ceil(per_page);
    let width = inner.width as usize;

    let mut lines: Vec<Line> = vec![];
    for (idx, item) in app
        .items
        .iter()
        .enumerate()
        .skip(page * per_page)
        .take(per_page)
    {
        let is_selected = idx == selected;
        let (title, desc) = match item {
            Item::Project(project) => (project_title(project), project_description(project)),
            Item::Task(task) => (task_title(task), task_description(task)),
            Item::Field(_) => continue,
        };
        lines.push(entry_title(title, is_selected, width));
        lines.push(entry_description(&desc, is_selected, width));
        lines.push(Line::from(""));
    }

    if pages > 1 {
        lines.push(pagination_line(page, pages));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn entry_title(mut spans: Vec<Span<'static>>, selected: bool, width: usize) -> Line<'static> {
    let (gutter, style) = if selected {
        (
            Span::styled("│ ", Style::default().fg(Color::LightBlue)),
            Style::default().fg(Color::LightBlue),
        )
    } else {
        (Span::raw("  "), Style::default().fg(Color::White))
    };

    if let Some(head) = spans.first_mut() {
        head.content = truncate_to_width(&head.content, width.saturating_sub(2)).into();
        if head.style == Style::default() {
            head.style = style;
        }
    }
    spans.insert(0, gutter);
    Line::from(spans)
}

fn entry_description(desc: &str, selected: bool, width: usize) -> Line<'static> {
    let desc = truncate_to_width(desc, width.saturating_sub(2));
    if selected {
        Line::from(vec![
            Span::styled("│ ", Style::default().fg(Color::LightBlue)),
            Span::styled(desc, Style::default().fg(Color::Blue)),
        ])
    } else {
        Line::from(vec![
            Span::raw("  "),
            Span::styled(desc, Style::default().fg(Color::DarkGray)),
        ])
    }
}

pub fn pagination_line(page: usize, pages: usize) -> Line<'static> {
    let spans: Vec<Span> = (0..pages)
        .map(|p| {
            if p == page {
                Span::styled("◈ ", Style::default().fg(Color::White))
            } else {
                Span::styled("◇ ", Style::default().fg(Color::DarkGray))
            }
        })
        .collect();
    Line::from(spans)
}

/// Name, then a colour dot when the project has a colour.
pub fn project_title(project: &Project) -> Vec<Span<'static>> {
    let mut spans = vec![Span::raw(project.name.clone())];
    if !project.color.is_empty() {
        let dot_style = parse_hex_color(&project.color)
            .map(|c| Style::default().fg(c))
            .unwrap_or_default();
        spans.push(Span::raw(" "));
        spans.push(Span::styled("●", dot_style));
    }
    spans
}

pub fn project_description(project: &Project) -> String {
    let mut desc = if project.closed {
        "Archived".to_string()
    } else if !project.kind.is_empty() {
        project.kind.clone()
    } else {
        "Active project".to_string()
    };

    if !project.group_id.is_empty() {
        let chars: Vec<char> = project.group_id.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        desc.push_str(" • Group: ");
        desc.push_str(&tail);
    }
    desc
}

pub fn task_title(task: &Task) -> Vec<Span<'static>> {
    let mut spans = vec![Span::raw(task.title.clone())];
    let badge_color = match task.priority {
        Priority::None => None,
        Priority::Low => Some(Color::LightBlue),
        Priority::Medium => Some(Color::LightYellow),
        Priority::High => Some(Color::LightRed),
    };
    if let Some(color) = badge_color {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            task.priority.label(),
            Style::default().fg(color),
        ));
    }
    spans
}

pub fn task_description(task: &Task) -> String {
    let mut desc = String::new();
    if let Some(due) = &task.due_date {
        desc.push_str("Due: ");
        desc.push_str(&due.to_string());
    }

    if !task.content.is_empty() {
        if !desc.is_empty() {
            desc.push_str(" • ");
        }
        let mut chars = task.content.chars();
        let head: String = chars.by_ref().take(10).collect();
        desc.push_str(&head);
        if chars.next().is_some() {
            desc.push_str("...");
        }
    }
    desc
}

/// `#RRGGBB` (leading `#` optional).
pub fn parse_hex_color(raw: &str) -> Option<Color> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn draw_message(f: &mut Frame<'_>, app: &App, area: Rect) {
    let line = if let Some(err) = &app.error {
        Line::from(Span::styled(
            format!(" {}", err),
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        ))
    } else if let Some(msg) = &app.message {
        Line::from(Span::styled(
            format!(" {}", msg),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        // Blank line keeps the layout from jumping.
        Line::from("")
    };
    f.render_widget(Paragraph::new(line), area);
}

pub fn help_items(view: View) -> &'static [(&'static str, &'static str)] {
    match view {
        View::Config => &[
            ("Ctrl+c", "Exit"),
            ("Up/Down", "Select"),
            ("Enter", "Save"),
        ],
        View::Auth => &[("Ctrl+c", "Exit"), ("Enter", "Submit")],
        View::ProjectList => &[
            ("Ctrl+c", "Exit"),
            ("Up/Down", "Select"),
            ("Enter", "Open"),
            ("r", "Reload"),
        ],
        View::TaskList => &[
            ("Ctrl+c", "Exit"),
            ("Up/Down", "Select"),
            ("r", "Reload"),
            ("Esc", "Back"),
        ],
        View::TaskDetail | View::CreateTask | View::CreateProject | View::DeleteConfirm => {
            &[("Ctrl+c", "Exit")]
        }
    }
}

pub fn help_text(view: View, width: usize) -> String {
    let joined = help_items(view)
        .iter()
        .map(|(key, desc)| format!("{} {}", key, desc))
        .collect::<Vec<_>>()
        .join(HELP_SEPARATOR);
    truncate_to_width(&joined, width.saturating_sub(2))
}

fn draw_help(f: &mut Frame<'_>, app: &App, area: Rect) {
    let text = help_text(app.view, area.width as usize);
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", text),
            Style::default().fg(Color::DarkGray),
        ))),
        area,
    );
}

pub fn truncate_to_width(s: &str, max: usize) -> String {
    if UnicodeWidthStr::width(s) <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    if max == 1 {
        return "…".to_string();
    }

    let mut out = String::new();
    let mut width = 0usize;
    for ch in s.chars() {
        let ch_w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_w > max - 1 {
            break;
        }
        out.push(ch);
        width += ch_w;
    }
    out.push('…');
    out
}
