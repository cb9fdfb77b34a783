//! Interactive project board.
//!
//! The board is the interactive end of the sync protocol: crossterm mouse
//! events feed the gesture tracker, completed intents run through the
//! editor's optimistic reorder path, and the status line surfaces every
//! settlement warning. The terminal row grid is the coordinate space — one
//! row of travel is enough to tell a drag from a click.

use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use rusqlite::Connection;

use crate::transport::LocalTransport;
use mapform_core::action::{Notification, Severity};
use mapform_core::config;
use mapform_core::db::{self, query};
use mapform_core::gesture::{DragTracker, ItemRect, Point};
use mapform_core::model::{PageId, PageLayerId, ProjectId};
use mapform_core::paths;
use mapform_core::session::ProjectEditor;

/// Activation distance in terminal cells: one row of travel is a drag.
const CELL_ACTIVATION_DISTANCE: f32 = 1.0;

/// How long the board waits for in-flight mutations on quit.
const QUIT_DRAIN_BUDGET: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Pages,
    Layers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputMode {
    CreatePage { buffer: String },
    RenamePage { id: PageId, buffer: String },
}

struct Board {
    editor: ProjectEditor<LocalTransport>,
    conn: Connection,
    project_id: ProjectId,
    drag: DragTracker<PageId>,
    focus: Focus,
    selected_layer: usize,
    input: Option<InputMode>,
    status: Option<(Severity, String)>,
    pages_area: Rect,
    layers_area: Rect,
    should_quit: bool,
}

/// Open the board for one project and run it until quit.
pub fn run_board(root: &Path, project_id: ProjectId) -> Result<()> {
    let conn = db::open_store(&paths::store_path(root)).context("open store")?;
    let snapshot =
        query::project_snapshot(&conn, project_id, None).context("load project snapshot")?;
    let editor_config = config::load_project_config(root)?.editor;

    let transport = LocalTransport::spawn(paths::store_path(root));
    let editor = ProjectEditor::new(snapshot, transport, editor_config.debounce_window());

    let mut board = Board {
        editor,
        conn,
        project_id,
        drag: DragTracker::new(CELL_ACTIVATION_DISTANCE),
        focus: Focus::Pages,
        selected_layer: 0,
        input: None,
        status: None,
        pages_area: Rect::default(),
        layers_area: Rect::default(),
        should_quit: false,
    };

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let result = board.run(&mut terminal);

    disable_raw_mode().ok();
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    result
}

impl Board {
    fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        while !self.should_quit {
            self.editor.tick(Instant::now());
            self.absorb_notifications();

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        self.handle_key(key);
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }

        // flush coalescing edits and give in-flight mutations a moment
        self.editor.flush_edits();
        let deadline = Instant::now() + QUIT_DRAIN_BUDGET;
        while !self.editor.quiescent() && Instant::now() < deadline {
            self.editor.tick(Instant::now());
            std::thread::sleep(Duration::from_millis(20));
        }
        Ok(())
    }

    fn absorb_notifications(&mut self) {
        for Notification {
            severity, message, ..
        } in self.editor.drain_notifications()
        {
            self.status = Some((severity, message));
        }
    }

    // -------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) {
        if self.input.is_some() {
            self.handle_input_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Pages => Focus::Layers,
                    Focus::Layers => Focus::Pages,
                };
            }
            KeyCode::Char('j') | KeyCode::Down => self.select_offset(1),
            KeyCode::Char('k') | KeyCode::Up => self.select_offset(-1),
            KeyCode::Char('J') => self.move_selected(1),
            KeyCode::Char('K') => self.move_selected(-1),
            KeyCode::Char('n') => {
                self.input = Some(InputMode::CreatePage {
                    buffer: String::new(),
                });
            }
            KeyCode::Char('r') => {
                if let Some(id) = self.editor.active_page() {
                    let title = self
                        .editor
                        .current()
                        .page(id)
                        .map(|p| p.title.clone())
                        .unwrap_or_default();
                    self.input = Some(InputMode::RenamePage { id, buffer: title });
                }
            }
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Char('a') => self.attach_next_layer(),
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let Some(mode) = self.input.as_mut() else {
            return;
        };
        let buffer = match mode {
            InputMode::CreatePage { buffer } | InputMode::RenamePage { buffer, .. } => buffer,
        };
        match key.code {
            KeyCode::Esc => self.input = None,
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            KeyCode::Enter => {
                let mode = self.input.take();
                match mode {
                    Some(InputMode::CreatePage { buffer }) => {
                        if let Err(err) = self.editor.create_page(buffer) {
                            self.status = Some((Severity::Warning, err.to_string()));
                        }
                    }
                    Some(InputMode::RenamePage { id, buffer }) => {
                        self.editor.rename_page(id, buffer, Instant::now());
                    }
                    None => {}
                }
            }
            _ => {}
        }
    }

    fn select_offset(&mut self, delta: i64) {
        match self.focus {
            Focus::Pages => {
                let pages = self.editor.current().pages;
                if pages.is_empty() {
                    return;
                }
                let current = self
                    .editor
                    .active_page()
                    .and_then(|id| pages.iter().position(|p| p.id == id))
                    .unwrap_or(0);
                let next = clamp_index(current, delta, pages.len());
                let target = pages[next].id;
                if self.editor.select_page(target) {
                    self.reload_snapshot();
                }
            }
            Focus::Layers => {
                let stack_len = self.editor.current().active_page_layers.len();
                if stack_len == 0 {
                    return;
                }
                self.selected_layer = clamp_index(self.selected_layer, delta, stack_len);
            }
        }
    }

    /// Keyboard reorder: synthesize the same intent a drag would produce.
    fn move_selected(&mut self, delta: i64) {
        match self.focus {
            Focus::Pages => {
                let pages = self.editor.current().pages;
                let Some(active) = self.editor.active_page() else {
                    return;
                };
                let Some(index) = pages.iter().position(|p| p.id == active) else {
                    return;
                };
                let over = clamp_index(index, delta, pages.len());
                if over == index {
                    return;
                }
                self.editor.reorder_pages(mapform_core::gesture::ReorderIntent {
                    active_id: active,
                    over_id: pages[over].id,
                });
            }
            Focus::Layers => {
                let stack = self.editor.current().active_page_layers;
                if stack.is_empty() {
                    return;
                }
                let index = self.selected_layer.min(stack.len() - 1);
                let over = clamp_index(index, delta, stack.len());
                if over == index {
                    return;
                }
                let intent = mapform_core::gesture::ReorderIntent {
                    active_id: stack[index].id,
                    over_id: stack[over].id,
                };
                self.editor.reorder_layers(intent);
                self.selected_layer = over;
            }
        }
    }

    fn delete_selected(&mut self) {
        match self.focus {
            Focus::Pages => {
                if let Some(id) = self.editor.active_page() {
                    self.editor.delete_page(id);
                }
            }
            Focus::Layers => {
                let stack = self.editor.current().active_page_layers;
                if let Some(entry) = stack.get(self.selected_layer) {
                    let id: PageLayerId = entry.id;
                    self.editor.detach_layer(id);
                    self.selected_layer = self.selected_layer.saturating_sub(1);
                }
            }
        }
    }

    /// Attach the first workspace layer not already on the active page.
    fn attach_next_layer(&mut self) {
        let snapshot = self.editor.current();
        let attached: Vec<_> = snapshot
            .active_page_layers
            .iter()
            .map(|l| l.layer_id)
            .collect();
        let Some(layer) = snapshot.layers.iter().find(|l| !attached.contains(&l.id)) else {
            self.status = Some((
                Severity::Info,
                "every workspace layer is already on this page".to_string(),
            ));
            return;
        };
        self.editor.attach_layer(layer.id);
    }

    // -------------------------------------------------------------------
    // Mouse
    // -------------------------------------------------------------------

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.input.is_some() {
            return;
        }
        let at = Point::new(f32::from(mouse.column), f32::from(mouse.row));
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(page_id) = self.page_at(mouse.column, mouse.row) {
                    self.focus = Focus::Pages;
                    if self.editor.select_page(page_id) {
                        self.reload_snapshot();
                    }
                    self.drag.press(page_id, at);
                } else if let Some(index) = self.layer_row_at(mouse.column, mouse.row) {
                    self.focus = Focus::Layers;
                    self.selected_layer = index;
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => self.drag.moved(at),
            MouseEventKind::Up(MouseButton::Left) => {
                let rects = self.page_rects();
                if let Some(intent) = self.drag.release(at, &rects) {
                    self.editor.reorder_pages(intent);
                }
            }
            MouseEventKind::ScrollDown => self.select_offset(1),
            MouseEventKind::ScrollUp => self.select_offset(-1),
            _ => {}
        }
    }

    /// Page row under a terminal coordinate, accounting for the pane border.
    fn page_at(&self, x: u16, y: u16) -> Option<PageId> {
        if !self.pages_area.contains((x, y).into()) {
            return None;
        }
        let row = y.checked_sub(self.pages_area.y.checked_add(1)?)?;
        self.editor
            .current()
            .pages
            .get(row as usize)
            .map(|page| page.id)
    }

    /// Layer-stack row under a terminal coordinate, if any.
    fn layer_row_at(&self, x: u16, y: u16) -> Option<usize> {
        if !self.layers_area.contains((x, y).into()) {
            return None;
        }
        let row = y.checked_sub(self.layers_area.y.checked_add(1)?)? as usize;
        let stack_len = self.editor.current().active_page_layers.len();
        (row < stack_len).then_some(row)
    }

    /// Bounding boxes of the rendered page rows, in cell units.
    fn page_rects(&self) -> Vec<ItemRect<PageId>> {
        let inner_x = f32::from(self.pages_area.x) + 1.0;
        let inner_width = f32::from(self.pages_area.width.saturating_sub(2));
        self.editor
            .current()
            .pages
            .iter()
            .enumerate()
            .map(|(idx, page)| ItemRect {
                id: page.id,
                x: inner_x,
                y: f32::from(self.pages_area.y) + 1.0 + idx as f32,
                width: inner_width,
                height: 1.0,
            })
            .collect()
    }

    /// Re-fetch the snapshot after page navigation so the active page's
    /// layer stack is loaded. This is the session's rebase point: any
    /// unresolved optimistic patch is discarded in favor of the store.
    fn reload_snapshot(&mut self) {
        match query::project_snapshot(&self.conn, self.project_id, self.editor.active_page()) {
            Ok(snapshot) => {
                self.editor.refresh(snapshot);
                self.selected_layer = 0;
            }
            Err(err) => {
                self.status = Some((Severity::Error, format!("snapshot reload failed: {err}")));
            }
        }
    }

    // -------------------------------------------------------------------
    // Render
    // -------------------------------------------------------------------

    fn render(&mut self, frame: &mut ratatui::Frame<'_>) {
        let snapshot = self.editor.current();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(4),
                Constraint::Length(1),
                Constraint::Length(u16::from(self.input.is_some())),
            ])
            .split(frame.area());

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(rows[0]);
        self.pages_area = panes[0];
        self.layers_area = panes[1];

        // pages pane
        let page_items: Vec<ListItem<'_>> = snapshot
            .pages
            .iter()
            .map(|page| {
                ListItem::new(Line::from(format!(
                    "{:>2}  {}",
                    page.position, page.title
                )))
            })
            .collect();
        let mut page_state = ListState::default();
        page_state.select(
            self.editor
                .active_page()
                .and_then(|id| snapshot.pages.iter().position(|p| p.id == id)),
        );
        let pages_focused = self.focus == Focus::Pages;
        let pages = List::new(page_items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} — pages ", snapshot.project.name))
                    .border_style(border_style(pages_focused)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(pages, panes[0], &mut page_state);

        // layers pane
        let layer_items: Vec<ListItem<'_>> = snapshot
            .active_page_layers
            .iter()
            .map(|link| {
                let name = snapshot.layer_name(link).unwrap_or("(unknown layer)");
                ListItem::new(Line::from(format!("{:>2}  {}", link.position, name)))
            })
            .collect();
        let mut layer_state = ListState::default();
        if !snapshot.active_page_layers.is_empty() {
            layer_state.select(Some(
                self.selected_layer
                    .min(snapshot.active_page_layers.len() - 1),
            ));
        }
        let layers_focused = self.focus == Focus::Layers;
        let layers = List::new(layer_items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" layer stack ")
                    .border_style(border_style(layers_focused)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(layers, panes[1], &mut layer_state);

        // status line
        let status = self.status_line();
        frame.render_widget(Paragraph::new(status), rows[1]);

        // input line
        if let Some(mode) = &self.input {
            let (label, buffer) = match mode {
                InputMode::CreatePage { buffer } => ("new page", buffer),
                InputMode::RenamePage { buffer, .. } => ("rename", buffer),
            };
            frame.render_widget(
                Paragraph::new(format!("{label}: {buffer}▏"))
                    .style(Style::default().fg(Color::Yellow)),
                rows[2],
            );
        }
    }

    fn status_line(&self) -> Line<'_> {
        let in_flight = self.editor.in_flight();
        let sync = if in_flight > 0 {
            format!("syncing ({in_flight})")
        } else {
            "synced".to_string()
        };
        let message = match &self.status {
            Some((severity, message)) => {
                let prefix = match severity {
                    Severity::Warning | Severity::Error => "! ",
                    Severity::Info | Severity::Success => "",
                };
                format!("  {prefix}{message}")
            }
            None => String::new(),
        };
        Line::from(format!(
            " {sync}{message}   [j/k select  J/K move  n new  r rename  d delete  a attach  Tab pane  q quit]"
        ))
    }
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// Move an index by `delta`, clamped to `[0, len)`.
fn clamp_index(current: usize, delta: i64, len: usize) -> usize {
    let target = current as i64 + delta;
    target.clamp(0, len.saturating_sub(1) as i64) as usize
}
