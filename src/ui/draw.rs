use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::line::NORMAL as LINE;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render modals
use tui_widgets::popup::Popup;

use crate::config::RgbColor;
use crate::detail::{DetailFocus, DetailTab, DetailView};
use crate::model::ContactField;
use crate::query::PageLink;
use crate::table::{CellState, ColumnKind, ContactTable};

use super::app::App;

const CONFIRM_HELP: &str = "y/Enter: confirm  n/Esc: cancel";
const COLUMNS_HELP: &str = "j/k: move  Space: show/hide  Esc: close";
const HELP_MODAL_FOOTER: &str = "j/k: scroll  Esc/q: close";
const SEARCH_HELP: &str = "Type to search  Enter: apply  Esc: cancel";
const EDIT_HELP: &str = "Enter: save  Tab/arrows: save and move  Esc: cancel";
const FORM_HELP: &str = "Tab: next field  Left/Right: change choice  Enter: save  F2: move  Esc: close";
const MOVE_HELP: &str = "Arrows: move popup  F2/Enter/Esc: done";
const DETAIL_HELP: &str =
    "Tab: fields/items  h/l: tab  t/n/a: new  e: edit  Space: complete  d: delete  Esc: close";
const COLUMN_SPACING: u16 = 1;

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    if app.detail.is_some() {
        draw_detail(frame, layout[1], app);
    } else {
        draw_table(frame, layout[1], app);
    }
    draw_page_strip(frame, layout[2], app);
    draw_footer(frame, layout[3], app);
    draw_form_popup(frame, size, app);
    draw_columns_modal(frame, size, app);
    draw_confirm_modal(frame, size, app);
    draw_help_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let header_style = header_text_style(app);
    let pages = app.pages();
    let mut spans = vec![
        Span::styled(" CONTACTDESK ", header_style.add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {} ", pages.preset().title().to_uppercase())),
    ];

    match app.search_input() {
        Some(input) => {
            spans.push(Span::styled(" / ", header_style));
            spans.push(Span::raw(input.value().to_string()));
        }
        None if !pages.search().is_empty() => {
            spans.push(Span::styled(" search: ", header_style));
            spans.push(Span::raw(pages.search().to_string()));
        }
        None => {}
    }

    let selected = app.table.selected_count();
    let mut right = format!("{} contacts  {} per page", pages.total(), pages.page_size());
    if selected > 0 {
        right = format!("{} selected  {}", selected, right);
    }
    if app.is_loading() || app.in_flight() > 0 {
        right = format!("... {}", right);
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(right.len() as u16 + 1),
        ])
        .split(area);
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);
    frame.render_widget(
        Paragraph::new(Span::styled(right, header_style)).alignment(Alignment::Right),
        chunks[1],
    );

    if let Some(input) = app.search_input() {
        let prefix = " CONTACTDESK ".len() + pages.preset().title().len() + 2 + 3;
        let x = area.x + (prefix + input.visual_cursor()) as u16;
        frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
    }
}

// =============================================================================
// Contact table
// =============================================================================

/// First scrollable column index to render so that `cursor` fits. The
/// selection and name columns stay pinned on the left.
fn horizontal_start(widths: &[u16], cursor: usize, available: u16) -> usize {
    let pinned = widths.len().min(2);
    let cursor = cursor.min(widths.len().saturating_sub(1));
    let pinned_width: u16 = widths[..pinned]
        .iter()
        .map(|w| w + COLUMN_SPACING)
        .sum();
    if cursor < pinned {
        return pinned;
    }
    let mut start = pinned;
    while start < cursor {
        let used: u16 = widths[start..=cursor]
            .iter()
            .map(|w| w + COLUMN_SPACING)
            .sum();
        if pinned_width + used <= available {
            break;
        }
        start += 1;
    }
    start
}

fn draw_table(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height < 2 {
        return;
    }

    // One line goes to the header row.
    app.table.set_viewport_height(inner.height as usize - 1);

    let table = &app.table;
    let (cursor_row, cursor_col) = table.cursor();
    let columns = table.visible_columns();
    let widths: Vec<u16> = columns.iter().map(|c| table.column_width(&c.id)).collect();
    let start = horizontal_start(&widths, cursor_col, inner.width);
    let shown: Vec<usize> = (0..columns.len())
        .filter(|i| *i < 2 || *i >= start)
        .collect();

    let resizing = table.layout().resizing();
    let dragging = table.layout().dragging();
    let header_cells = shown.iter().map(|&i| {
        let column = columns[i];
        let title = match column.kind {
            ColumnKind::Selection => table.header_check().glyph().to_string(),
            _ => column.title.to_uppercase(),
        };
        let mut style = header_text_style(app).add_modifier(Modifier::BOLD);
        if resizing == Some(column.id.as_str()) || dragging == Some(column.id.as_str()) {
            style = selection_style(app);
        }
        Cell::from(title).style(style)
    });
    let header = Row::new(header_cells);

    let mounted = table.mounted_rows();
    let visible = table.visible_rows();
    let rows = mounted.clone().map(|row| {
        let contact = &table.rows()[row];
        let cells = shown.iter().map(|&i| {
            let column = columns[i];
            let on_cursor = row == cursor_row && i == cursor_col;
            let text = match column.kind {
                ColumnKind::Selection => {
                    if table.is_selected(&contact.id) { "[x]" } else { "[ ]" }.to_string()
                }
                _ if on_cursor && table.is_editing() => table.editor_value().to_string(),
                _ => table.cell_text(row, column),
            };
            Cell::from(text).style(cell_style(app, table, row, &column.id, on_cursor))
        });
        Row::new(cells)
    });

    let constraints: Vec<Constraint> = shown.iter().map(|&i| Constraint::Length(widths[i])).collect();
    let widget = Table::new(rows, constraints)
        .header(header)
        .column_spacing(COLUMN_SPACING);
    let mut state = TableState::default().with_offset(visible.start - mounted.start);
    frame.render_stateful_widget(widget, inner, &mut state);

    if table.row_count() == 0 {
        let message = if app.is_loading() { "Loading..." } else { "No contacts" };
        let area = Rect {
            y: inner.y + 1,
            height: 1,
            ..inner
        };
        frame.render_widget(Paragraph::new(message).alignment(Alignment::Center), area);
    }

    if table.is_editing() && visible.contains(&cursor_row) {
        let x_offset: u16 = shown
            .iter()
            .take_while(|&&i| i != cursor_col)
            .map(|&i| widths[i] + COLUMN_SPACING)
            .sum();
        let width = widths.get(cursor_col).copied().unwrap_or(1).max(1);
        let x = inner.x + x_offset + (table.editor_cursor() as u16).min(width - 1);
        let y = inner.y + 1 + (cursor_row - visible.start) as u16;
        frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), y));
    }
}

fn cell_style(app: &App, table: &ContactTable, row: usize, column_id: &str, on_cursor: bool) -> Style {
    let colors = app.ui_colors();
    let mut style = Style::default();
    match table.cell_state(row, column_id) {
        CellState::Saving => style = style.fg(color(colors.saving_fg)),
        CellState::Error(_) => style = style.fg(color(colors.error_fg)),
        CellState::Viewing | CellState::Editing => {}
    }
    if on_cursor {
        style = if table.is_editing() {
            style.add_modifier(Modifier::UNDERLINED)
        } else {
            selection_style(app)
        };
    }
    style
}

fn draw_page_strip(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let pages = app.pages();
    let style = header_text_style(app);
    let dim = Style::default().add_modifier(Modifier::DIM);
    let arrow = |label: &'static str, enabled: bool| {
        Span::styled(label, if enabled { style } else { dim })
    };

    let mut spans = vec![
        arrow("<< ", pages.has_prev()),
        arrow("< ", pages.has_prev()),
    ];
    for link in pages.strip() {
        match link {
            PageLink::Page(n) if n == pages.page() => {
                spans.push(Span::styled(format!("[{}] ", n), selection_style(app)));
            }
            PageLink::Page(n) => spans.push(Span::raw(format!("{} ", n))),
            PageLink::Gap => spans.push(Span::raw("... ")),
        }
    }
    spans.push(arrow("> ", pages.has_next()));
    spans.push(arrow(">>", pages.has_next()));
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

// =============================================================================
// Contact detail
// =============================================================================

fn draw_detail(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let Some(view) = app.detail.as_ref() else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    draw_detail_fields(frame, chunks[0], app, view);
    draw_detail_items(frame, chunks[1], app, view);
}

fn draw_detail_fields(frame: &mut Frame<'_>, area: Rect, app: &App, view: &DetailView) {
    let focused = view.focus() == DetailFocus::Fields;
    let title = Line::from(Span::styled(
        format!(" {} ", view.contact().name),
        header_text_style(app),
    ));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let colors = app.ui_colors();
    let label_width = ContactField::ALL
        .iter()
        .map(|f| f.title().len() + 1)
        .max()
        .unwrap_or(0);

    let mut lines = Vec::new();
    let mut cursor = None;
    for (index, field) in ContactField::ALL.iter().enumerate() {
        let highlight = focused && index == view.field_cursor();
        let editing = highlight && view.is_editing_field();
        let value = if editing {
            cursor = Some((index, label_width + 1 + view.field_editor_cursor()));
            view.field_editor_value().to_string()
        } else {
            field.display(view.contact())
        };
        let mut value_style = match view.field_state(*field) {
            CellState::Saving => Style::default().fg(color(colors.saving_fg)),
            CellState::Error(_) => Style::default().fg(color(colors.error_fg)),
            _ => Style::default(),
        };
        if highlight && !editing {
            value_style = selection_style(app);
        }
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<width$} ", format!("{}:", field.title()), width = label_width),
                header_text_style(app),
            ),
            Span::styled(value, value_style),
        ]));
    }
    if let Some(message) = view.field_editor_message() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(color(colors.error_fg)),
        )));
    }
    frame.render_widget(Paragraph::new(lines), inner);

    if let Some((line, column)) = cursor {
        let x = inner.x.saturating_add(column as u16);
        let y = inner.y.saturating_add(line as u16);
        frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), y));
    }
}

fn build_tab_header(app: &App, view: &DetailView) -> Line<'static> {
    let mut spans = Vec::new();
    for tab in DetailTab::ALL {
        let label = format!(" [{}] {} ", tab.digit(), tab.title());
        if tab == view.tab() {
            spans.push(Span::styled(label, selection_style(app)));
        } else {
            spans.push(Span::raw(label));
        }
    }
    if view.tab() == DetailTab::Tasks {
        spans.push(Span::styled(
            format!(
                "  status: {}  priority: {}",
                view.status_filter().title(),
                view.priority_filter().title()
            ),
            header_text_style(app),
        ));
    }
    Line::from(spans)
}

fn draw_detail_items(frame: &mut Frame<'_>, area: Rect, app: &App, view: &DetailView) {
    let focused = view.focus() == DetailFocus::Items;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    render_header_with_separator(frame, layout[0], build_tab_header(app, view), app, area.width);

    let list_area = layout[1];
    let mut lines: Vec<Line> = Vec::new();
    if !view.is_loaded() {
        lines.push(Line::from("Loading..."));
    } else if view.items().is_empty() {
        lines.push(Line::from("Nothing here yet"));
    } else {
        let height = list_area.height as usize;
        let skip = (view.cursor() + 1).saturating_sub(height);
        for (index, item) in view.items().iter().enumerate().skip(skip).take(height) {
            let text = format!("{:<9} {}", item.kind().title(), item.summary());
            if focused && index == view.cursor() {
                lines.push(Line::from(Span::styled(text, selection_style(app))));
            } else {
                lines.push(Line::from(text));
            }
        }
    }
    frame.render_widget(Paragraph::new(lines), list_area);
}

fn draw_form_popup(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let header_style = header_text_style(app);
    let border = border_style(app);
    let error_style = Style::default().fg(color(app.ui_colors().error_fg));
    let saving_style = Style::default().fg(color(app.ui_colors().saving_fg));
    let focus_style = selection_style(app);

    let Some(form) = app.detail.as_mut().and_then(|d| d.form.as_mut()) else {
        return;
    };

    let content_width = (area.width.saturating_mul(2) / 3).max(30) as usize;
    let label_width = form.fields().iter().map(|f| f.label().len() + 1).max().unwrap_or(0);

    let mut lines: Vec<Line> = Vec::new();
    for (index, field) in form.fields().iter().enumerate() {
        let focused = index == form.focus();
        let value = if field.is_choice() {
            format!("< {} >", field.value())
        } else {
            field.value().to_string()
        };
        let padded = format!("{:<width$}", value, width = content_width.saturating_sub(label_width + 1));
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<width$} ", format!("{}:", field.label()), width = label_width),
                header_style,
            ),
            Span::styled(padded, if focused { focus_style } else { Style::default() }),
        ]));
    }
    lines.push(Line::from(""));
    if form.is_saving() {
        lines.push(Line::from(Span::styled("Saving...", saving_style)));
    } else if let Some(error) = form.error() {
        lines.push(Line::from(Span::styled(error.to_string(), error_style)));
    }
    lines.push(Line::from(if form.is_moving() { MOVE_HELP } else { FORM_HELP }));

    let title_line = Line::from(Span::styled(format!(" {} ", form.title()), header_style));
    let popup = Popup::new(Text::from(lines))
        .title(title_line)
        .border_style(border);
    frame.render_stateful_widget_ref(popup, area, &mut form.popup);

    let focused = form.fields().get(form.focus());
    if let (Some(popup_area), Some(field)) = (form.popup.area(), focused) {
        if !field.is_choice() && !form.is_moving() {
            let inner = Block::default().borders(Borders::ALL).inner(*popup_area);
            let x = inner.x + (label_width + 1 + field.visual_cursor()) as u16;
            let y = inner.y + form.focus() as u16;
            frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), y));
        }
    }
}

// =============================================================================
// Modals
// =============================================================================

fn draw_columns_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(modal) = app.columns_modal.as_ref() else {
        return;
    };
    let entries = app.column_entries();
    let mut lines: Vec<Line> = entries
        .iter()
        .enumerate()
        .map(|(index, (_, title, hidden))| {
            let text = format!("{} {:<24}", if *hidden { "[ ]" } else { "[x]" }, title);
            if index == modal.cursor {
                Line::from(Span::styled(text, selection_style(app)))
            } else {
                Line::from(text)
            }
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(COLUMNS_HELP));

    let title_line = Line::from(Span::styled(" COLUMNS ", header_text_style(app)));
    let popup = Popup::new(Text::from(lines))
        .title(title_line)
        .border_style(border_style(app));
    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

fn draw_confirm_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(modal) = app.confirm_modal.as_ref() else {
        return;
    };

    let lines = vec![
        Line::from(modal.message.clone()),
        Line::from(""),
        Line::from(CONFIRM_HELP),
    ];
    let title_line = Line::from(Span::styled(modal.title.clone(), header_text_style(app)));
    let popup = Popup::new(Text::from(lines))
        .title(title_line)
        .border_style(border_style(app));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

fn draw_help_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    if app.help_modal.is_none() {
        return;
    }

    // 2/3 width, 80% height
    let width = area.width.saturating_mul(2).saturating_div(3).max(40).min(area.width);
    let height = area.height.saturating_mul(4).saturating_div(5).max(10).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal_area);

    let header_style = header_text_style(app);
    let border = border_style(app);

    let sections = app.help_entries();
    let mut lines: Vec<Line> = Vec::new();
    let content_width = width.saturating_sub(4) as usize;
    let action_width = 20usize;

    for (section_idx, section) in sections.iter().enumerate() {
        let header_text = format!(" {} ", section.title);
        let padding_total = content_width.saturating_sub(header_text.len());
        let left_pad = padding_total / 2;
        let right_pad = padding_total - left_pad;
        let header_line = format!(
            "{}{}{}",
            LINE.horizontal.repeat(left_pad),
            header_text,
            LINE.horizontal.repeat(right_pad)
        );
        lines.push(Line::from(Span::styled(header_line, header_style)));

        for entry in &section.entries {
            lines.push(Line::from(vec![
                Span::raw(format!("{:<width$}", entry.action, width = action_width)),
                Span::styled(entry.keys.clone(), header_style),
            ]));
        }

        if section_idx < sections.len() - 1 {
            lines.push(Line::from(""));
        }
    }

    let total_lines = lines.len();
    // borders (2) + footer line (1)
    let inner_height = height.saturating_sub(3) as usize;

    let Some(modal) = app.help_modal.as_mut() else {
        return;
    };
    modal.total_lines = total_lines;
    modal.viewport_height = inner_height;
    let max_scroll = modal.total_lines.saturating_sub(modal.viewport_height);
    modal.scroll = modal.scroll.min(max_scroll);

    let scroll_indicator = match (modal.can_scroll_up(), modal.can_scroll_down()) {
        (true, true) => "▲▼",
        (true, false) => "▲ ",
        (false, true) => " ▼",
        (false, false) => "  ",
    };
    let visible_lines: Vec<Line> = lines
        .into_iter()
        .skip(modal.scroll)
        .take(modal.viewport_height)
        .collect();

    let title = Line::from(vec![
        Span::styled(" HELP ", header_style),
        Span::styled(scroll_indicator, header_style),
    ]);
    let footer = Line::from(Span::styled(format!(" {} ", HELP_MODAL_FOOTER), header_style));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
        .title_bottom(footer)
        .title_alignment(Alignment::Center);

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);
    frame.render_widget(Paragraph::new(visible_lines), inner);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let colors = app.ui_colors();
    let mut style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let editing_detail_field = app.detail.as_ref().is_some_and(|d| d.is_editing_field());
    let message: String = if app.confirm_modal.is_some() {
        CONFIRM_HELP.to_string()
    } else if app.columns_modal.is_some() {
        COLUMNS_HELP.to_string()
    } else if app.search_input().is_some() {
        SEARCH_HELP.to_string()
    } else if let Some(message) = app.table.editor_message() {
        style = style.fg(color(colors.error_fg));
        message.to_string()
    } else if app.table.is_editing() || editing_detail_field {
        EDIT_HELP.to_string()
    } else if let Some(status) = app.status() {
        if status.is_error {
            style = style.fg(color(colors.error_fg));
        }
        status.text.clone()
    } else if app.detail.is_some() {
        DETAIL_HELP.to_string()
    } else {
        "READY".to_string()
    };

    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);
    frame.render_widget(Paragraph::new(message).style(style), area);
}

/// Render a header line with a separator below it.
/// `area` is the inner content area for the header.
/// `outer_width` is the full pane width (including borders) for drawing connected separators.
fn render_header_with_separator(
    frame: &mut Frame<'_>,
    area: Rect,
    content: Line<'static>,
    app: &App,
    outer_width: u16,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    if area.height == 1 {
        frame.render_widget(Paragraph::new(content), area);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);
    frame.render_widget(Paragraph::new(content), layout[0]);

    // Separator with connector characters: ├───┤
    let inner_width = outer_width.saturating_sub(2) as usize;
    let separator = format!(
        "{}{}{}",
        LINE.vertical_right,
        LINE.horizontal.repeat(inner_width),
        LINE.vertical_left
    );
    let separator_area = Rect {
        x: layout[1].x.saturating_sub(1),
        y: layout[1].y,
        width: outer_width,
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(separator, border_style(app)))),
        separator_area,
    );
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().border))
}

fn header_text_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().header_fg))
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_start_keeps_cursor_in_view() {
        // select, name, then five 10-wide columns
        let widths = [3, 24, 10, 10, 10, 10, 10];
        assert_eq!(horizontal_start(&widths, 1, 80), 2);
        assert_eq!(horizontal_start(&widths, 4, 80), 2);
        // 4 + 25 pinned, each data column takes 11
        assert_eq!(horizontal_start(&widths, 6, 60), 5);
        assert_eq!(horizontal_start(&widths, 6, 80), 3);
    }
}
