use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::app::{AppState, PopupState};
use crate::color::color_from_hex;
use crate::forms::{CategoryField, CategoryForm, ItemField, ItemForm, SettingsField, SettingsForm};
use crate::menu::{FlatEntry, MenuTree, Projection};
use crate::theme::Theme;

const MAIN_SHORTCUTS: &[(&str, &str)] = &[
    ("↑↓", "Move"),
    ("Enter", "Run"),
    ("Space", "Toggle"),
    ("i", "Info"),
    ("n", "New"),
    ("e", "Edit"),
    ("d", "Delete"),
    ("s", "Settings"),
    ("^B", "Scan"),
    ("r", "Reload"),
    ("q", "Quit"),
];

pub fn render(frame: &mut Frame, app: &AppState) {
    let size = frame.size();
    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.background)),
        size,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(size);

    frame.render_widget(title_bar(&app.store.settings().title, &app.theme), chunks[0]);

    let shortcuts = Paragraph::new(shortcut_line(MAIN_SHORTCUTS, &app.theme))
        .alignment(Alignment::Center)
        .style(Style::default().bg(app.theme.surface));
    frame.render_widget(shortcuts, chunks[1]);

    let content_area = chunks[2];
    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.surface)),
        content_area,
    );
    render_columns(
        frame,
        content_area.inner(&Margin {
            vertical: 1,
            horizontal: 1,
        }),
        app,
    );

    frame.render_widget(status_bar(app), chunks[3]);

    if let Some(popup) = &app.active_popup {
        render_popup(frame, popup, app);
    }
}

fn title_bar(title: &str, theme: &Theme) -> Paragraph<'static> {
    Paragraph::new(title.to_string())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(theme.text)
                .bg(theme.primary)
                .add_modifier(Modifier::BOLD),
        )
}

fn status_bar(app: &AppState) -> Paragraph<'static> {
    Paragraph::new(app.status_text())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .bg(app.theme.primary)
                .fg(app.theme.text)
                .add_modifier(Modifier::BOLD),
        )
}

fn shortcut_line(shortcuts: &[(&str, &str)], theme: &Theme) -> Line<'static> {
    let key_style = Style::default()
        .fg(theme.accent)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::new();
    for (idx, (key, label)) in shortcuts.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(key.to_string(), key_style));
        spans.push(Span::styled(
            format!(" {label}"),
            Style::default().fg(theme.text),
        ));
    }
    Line::from(spans)
}

fn render_columns(frame: &mut Frame, area: Rect, app: &AppState) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let column_count = app.projection.column_count().max(1);
    let constraints = (0..column_count)
        .map(|_| Constraint::Ratio(1, column_count as u32))
        .collect::<Vec<_>>();
    let column_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    let selected = app.selected_index();
    for (col_idx, chunk) in column_chunks.iter().enumerate() {
        let (start, entries) = app.projection.column(col_idx);
        let mut items: Vec<ListItem> = entries
            .iter()
            .enumerate()
            .map(|(offset, entry)| {
                let (line, style) = entry_line(app.store.tree(), entry, &app.theme);
                if selected == Some(start + offset) {
                    let style = style
                        .bg(app.theme.accent)
                        .fg(app.theme.background)
                        .add_modifier(Modifier::BOLD);
                    ListItem::new(line).style(style)
                } else {
                    ListItem::new(line).style(style)
                }
            })
            .collect();

        if items.is_empty() {
            items.push(ListItem::new(""));
        }

        let list = List::new(items).block(
            Block::default().style(Style::default().bg(app.theme.surface).fg(app.theme.text)),
        );
        frame.render_widget(list, *chunk);
    }
}

fn entry_line(tree: &MenuTree, entry: &FlatEntry, theme: &Theme) -> (Line<'static>, Style) {
    let category = tree.get(entry.category_name());
    let mut style = Style::default().fg(theme.text).bg(theme.surface);
    if let Some(colors) = category.and_then(|c| c.colors.as_ref()) {
        if let Some(bg) = color_from_hex(&colors.background) {
            style = style.bg(bg);
        }
        if let Some(fg) = color_from_hex(&colors.text) {
            style = style.fg(fg);
        }
    }
    match entry {
        FlatEntry::CategoryHeader { name } => {
            let expanded = category.map_or(true, |c| c.expanded);
            (
                Line::from(format!("{} {name}", expansion_marker(expanded))),
                style.add_modifier(Modifier::BOLD),
            )
        }
        FlatEntry::MenuItem { item } => (Line::from(format!("    {}", item.label)), style),
    }
}

fn expansion_marker(expanded: bool) -> &'static str {
    if expanded {
        "▼"
    } else {
        "▶"
    }
}

pub fn listing(tree: &MenuTree, projection: &Projection) -> Vec<String> {
    let mut lines = Vec::new();
    for col_idx in 0..projection.column_count() {
        let (_, entries) = projection.column(col_idx);
        if entries.is_empty() {
            continue;
        }
        lines.push(format!("Column {}", col_idx + 1));
        for entry in entries {
            match entry {
                FlatEntry::CategoryHeader { name } => {
                    let expanded = tree.get(name).map_or(true, |c| c.expanded);
                    lines.push(format!("  {} {name}", expansion_marker(expanded)));
                }
                FlatEntry::MenuItem { item } => {
                    lines.push(format!("      {}  ({})", item.label, item.cmd));
                }
            }
        }
    }
    lines
}

fn render_popup(frame: &mut Frame, popup: &PopupState, app: &AppState) {
    match popup {
        PopupState::Info(info) => {
            let area = centered_rect(frame.size(), 60, 40);
            frame.render_widget(Clear, area);
            let text = format!(
                "Label: {}\nCommand: {}\nCategory: {}\nDescription: {}\n\nPress Enter or Esc to close.",
                info.label, info.command, info.category, info.description
            );
            let block = Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .style(Style::default().bg(app.theme.surface).fg(app.theme.text))
                .block(
                    Block::default()
                        .title("Item Info")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(app.theme.surface)),
                );
            frame.render_widget(block, area);
        }
        PopupState::ItemForm(form) => {
            let (lines, shortcuts) = item_form_lines(form, app);
            render_form_screen(frame, app, form.title(), lines, shortcuts);
        }
        PopupState::CategoryForm(form) => {
            let (lines, shortcuts) = category_form_lines(form, app);
            render_form_screen(frame, app, "Edit Category", lines, shortcuts);
        }
        PopupState::SettingsForm(form) => {
            let (lines, shortcuts) = settings_form_lines(form, app);
            render_form_screen(frame, app, "Settings", lines, shortcuts);
        }
    }
}

fn render_form_screen(
    frame: &mut Frame,
    app: &AppState,
    mode_label: &str,
    lines: Vec<FormLine>,
    shortcuts: &[(&str, &str)],
) {
    let area = frame.size();
    frame.render_widget(Clear, area);
    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.background)),
        area,
    );
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let title = format!("{} - {mode_label}", app.store.settings().title);
    frame.render_widget(title_bar(&title, &app.theme), sections[0]);

    let shortcuts = Paragraph::new(shortcut_line(shortcuts, &app.theme))
        .alignment(Alignment::Center)
        .style(Style::default().bg(app.theme.surface));
    frame.render_widget(shortcuts, sections[1]);

    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.surface)),
        sections[2],
    );
    let inner = sections[2].inner(&Margin {
        horizontal: 3,
        vertical: 1,
    });
    let rendered = materialize_form_lines(&lines, inner.width as usize, &app.theme);
    let paragraph = Paragraph::new(rendered)
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(app.theme.surface).fg(app.theme.text));
    frame.render_widget(paragraph, inner);

    frame.render_widget(status_bar(app), sections[3]);
}

fn item_form_lines(
    form: &ItemForm,
    app: &AppState,
) -> (Vec<FormLine>, &'static [(&'static str, &'static str)]) {
    let theme = &app.theme;
    let mut lines = vec![
        plain_line("Fill in the menu item details below."),
        field_line("Label", &form.label, form.selected == ItemField::Label, theme),
        field_line("Command", &form.cmd, form.selected == ItemField::Command, theme),
        field_line(
            "Description",
            &form.info,
            form.selected == ItemField::Description,
            theme,
        ),
        field_line(
            "Category",
            &form.category,
            form.selected == ItemField::Category,
            theme,
        ),
        toggle_line(
            "Pause After Run",
            form.pause,
            form.selected == ItemField::Pause,
            theme,
        ),
    ];
    push_error(&mut lines, form.error.as_deref());
    if !form.categories.is_empty() {
        lines.push(plain_line(""));
        lines.push(heading_line("Available Categories:", theme));
        for category in &form.categories {
            lines.push(plain_line(format!("  • {category}")));
        }
    }
    (
        lines,
        &[
            ("Tab", "Move"),
            ("Enter", "Save"),
            ("Esc", "Cancel"),
            ("Space", "Toggle Pause"),
        ],
    )
}

fn category_form_lines(
    form: &CategoryForm,
    app: &AppState,
) -> (Vec<FormLine>, &'static [(&'static str, &'static str)]) {
    let theme = &app.theme;
    let mut lines = vec![
        field_line("Name", &form.name, form.selected == CategoryField::Name, theme),
        color_field_line(
            "Background",
            &form.background,
            form.selected == CategoryField::Background,
            theme,
        ),
        color_field_line(
            "Text",
            &form.text,
            form.selected == CategoryField::Text,
            theme,
        ),
        field_line(
            "Column",
            &form.column,
            form.selected == CategoryField::Column,
            theme,
        ),
    ];

    let palette_value = match form.palette.get(form.palette_index) {
        Some(entry) if form.palette_index < form.custom_count => {
            format!("◀ {} ▶  (custom)", entry.name)
        }
        Some(entry) => format!("◀ {} ▶", entry.name),
        None => "(none)".to_string(),
    };
    lines.push(field_line(
        "Palette",
        &palette_value,
        form.selected == CategoryField::Palette,
        theme,
    ));
    lines.push(field_line(
        "Preset Name",
        &form.preset_name,
        form.selected == CategoryField::PresetName,
        theme,
    ));
    push_error(&mut lines, form.error.as_deref());

    lines.push(plain_line(""));
    lines.push(heading_line("Preview:", theme));
    let mut preview = Style::default().fg(theme.text).bg(theme.surface);
    if let Some(bg) = color_from_hex(&form.background) {
        preview = preview.bg(bg);
    }
    if let Some(fg) = color_from_hex(&form.text) {
        preview = preview.fg(fg);
    }
    let name = if form.name.trim().is_empty() {
        form.old_name.as_str()
    } else {
        form.name.as_str()
    };
    lines.push(plain_line(Line::from(Span::styled(
        format!(" ▼ {name} "),
        preview.add_modifier(Modifier::BOLD),
    ))));

    (
        lines,
        &[
            ("Tab", "Move"),
            ("←→", "Palette"),
            ("^A", "Save Preset"),
            ("^D", "Delete Preset"),
            ("Enter", "Save"),
            ("Esc", "Cancel"),
        ],
    )
}

fn settings_form_lines(
    form: &SettingsForm,
    app: &AppState,
) -> (Vec<FormLine>, &'static [(&'static str, &'static str)]) {
    let theme = &app.theme;
    let preview = Theme::from_key(form.theme_key());
    let mut lines = vec![
        field_line(
            "Title",
            &form.title,
            form.selected == SettingsField::Title,
            theme,
        ),
        field_line(
            "Columns",
            &form.columns,
            form.selected == SettingsField::Columns,
            theme,
        ),
        field_line(
            "Theme",
            &format!("◀ {} ▶", preview.name),
            form.selected == SettingsField::Theme,
            theme,
        ),
    ];
    push_error(&mut lines, form.error.as_deref());
    lines.push(plain_line(""));
    lines.push(plain_line(Line::from(vec![
        Span::styled("  ", Style::default().bg(preview.primary)),
        Span::styled("  ", Style::default().bg(preview.accent)),
        Span::styled("  ", Style::default().bg(preview.background)),
        Span::styled("  ", Style::default().bg(preview.surface)),
        Span::styled("  ", Style::default().bg(preview.text)),
    ])));
    (
        lines,
        &[
            ("Tab", "Move"),
            ("←→", "Theme"),
            ("Enter", "Save"),
            ("Esc", "Cancel"),
        ],
    )
}

struct FormLine {
    line: Line<'static>,
    highlight: bool,
}

impl FormLine {
    fn new(line: Line<'static>, highlight: bool) -> Self {
        Self { line, highlight }
    }
}

fn materialize_form_lines(lines: &[FormLine], width: usize, theme: &Theme) -> Vec<Line<'static>> {
    lines
        .iter()
        .map(|form_line| {
            if form_line.highlight {
                highlight_line_with_width(form_line.line.clone(), width, theme)
            } else {
                form_line.line.clone()
            }
        })
        .collect()
}

fn highlight_line_with_width(mut line: Line<'static>, width: usize, theme: &Theme) -> Line<'static> {
    let mut text_width = 0usize;
    let highlight_style = Style::default()
        .fg(theme.background)
        .bg(theme.accent)
        .add_modifier(Modifier::BOLD);
    for span in &mut line.spans {
        span.style = highlight_style;
        text_width += UnicodeWidthStr::width(span.content.as_ref());
    }
    if width > text_width {
        line.spans
            .push(Span::styled(" ".repeat(width - text_width), highlight_style));
    }
    line
}

fn plain_line(line: impl Into<Line<'static>>) -> FormLine {
    FormLine::new(line.into(), false)
}

fn heading_line(text: &str, theme: &Theme) -> FormLine {
    plain_line(Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    )))
}

fn push_error(lines: &mut Vec<FormLine>, error: Option<&str>) {
    if let Some(error) = error {
        lines.push(plain_line(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        ))));
    }
}

fn labelled_line(label: &str, value: Span<'static>, selected: bool, theme: &Theme) -> FormLine {
    let label_span = Span::styled(
        format!("{label}: "),
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    );
    FormLine::new(Line::from(vec![label_span, value]), selected)
}

fn display_value(value: &str) -> String {
    if value.trim().is_empty() {
        "(empty)".to_string()
    } else {
        value.to_string()
    }
}

fn field_line(label: &str, value: &str, selected: bool, theme: &Theme) -> FormLine {
    let value = Span::styled(display_value(value), Style::default().fg(theme.text));
    labelled_line(label, value, selected, theme)
}

fn color_field_line(label: &str, value: &str, selected: bool, theme: &Theme) -> FormLine {
    let color = color_from_hex(value).unwrap_or(theme.text);
    let value = Span::styled(
        display_value(value),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    );
    labelled_line(label, value, selected, theme)
}

fn toggle_line(label: &str, value: bool, selected: bool, theme: &Theme) -> FormLine {
    let (status, color) = if value {
        ("Yes", Color::Green)
    } else {
        ("No", Color::Red)
    };
    let value = Span::styled(
        status,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    );
    labelled_line(label, value, selected, theme)
}

fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(area);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100 - height_percent) / 2),
        ])
        .split(horizontal[1]);
    vertical[1]
}
