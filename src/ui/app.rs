use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, info, warn};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use tui_widgets::popup::PopupState;

use crate::api::dispatch::{Completion, Dispatcher};
use crate::api::{Backend, Request, Response};
use crate::cache::QueryCache;
use crate::config::{Config, UiColors};
use crate::detail::{DetailFocus, DetailItem, DetailTab, DetailView};
use crate::error::ApiError;
use crate::model::{ContactPage, RelatedKind};
use crate::query::{PageController, PAGE_SIZES};
use crate::store::Store;
use crate::table::{CommitOutcome, ContactTable, LayoutState, TableEvent, NAME_COLUMN, SELECT_COLUMN};

use super::draw;
use super::keys::{describe, matches_any};

const LAYOUT_PREFERENCE: &str = "table_layout";
const TICK: Duration = Duration::from_millis(100);

/// Why the event loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    /// The server rejected the token; the stored session was cleared.
    SignedOut,
}

#[derive(Debug, Clone)]
pub struct ConfirmModal {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

/// Action to perform when confirm modal is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Delete every selected contact
    BulkDelete,
    /// Delete the task, note or activity under the detail cursor
    DeleteItem,
}

/// Show/hide picker for the data columns.
#[derive(Debug, Clone, Default)]
pub struct ColumnsModal {
    pub cursor: usize,
}

/// Help modal state with scroll support
#[derive(Debug, Clone)]
pub struct HelpModal {
    /// Current scroll offset (line index at top of viewport)
    pub scroll: usize,
    /// Total number of content lines
    pub total_lines: usize,
    /// Viewport height (set during rendering)
    pub viewport_height: usize,
}

impl HelpModal {
    pub fn new(total_lines: usize) -> Self {
        Self {
            scroll: 0,
            total_lines,
            viewport_height: 10,
        }
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max_scroll = self.total_lines.saturating_sub(self.viewport_height);
        self.scroll = (self.scroll + lines).min(max_scroll);
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn can_scroll_up(&self) -> bool {
        self.scroll > 0
    }

    pub fn can_scroll_down(&self) -> bool {
        self.scroll + self.viewport_height < self.total_lines
    }
}

/// A section in the help modal (e.g., "Global", "Table")
pub struct HelpSection {
    pub title: &'static str,
    pub entries: Vec<HelpEntry>,
}

/// A single help entry (action name + key bindings)
pub struct HelpEntry {
    pub action: &'static str,
    pub keys: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

pub struct App<'a> {
    config: &'a Config,
    store: &'a Store,
    user_id: String,
    dispatcher: Dispatcher,
    cache: QueryCache,
    pages: PageController,
    pub table: ContactTable,
    /// Layout read at start-up, re-applied once custom columns are known.
    saved_layout: Option<LayoutState>,
    pub detail: Option<DetailView>,
    loading: bool,
    search: Option<Input>,
    pub confirm_modal: Option<ConfirmModal>,
    pub columns_modal: Option<ColumnsModal>,
    pub help_modal: Option<HelpModal>,
    pub modal_popup: PopupState,
    status: Option<StatusLine>,
    signed_out: bool,
}

impl<'a> App<'a> {
    pub fn new(
        config: &'a Config,
        store: &'a Store,
        backend: Arc<dyn Backend>,
        user_id: String,
    ) -> Self {
        let saved_layout = match store.preference::<LayoutState>(&user_id, LAYOUT_PREFERENCE) {
            Ok(layout) => layout,
            Err(err) => {
                warn!(error = %err, "failed to read saved table layout");
                None
            }
        };
        let table = ContactTable::new(
            &[],
            saved_layout.clone(),
            config.table.overscan,
            config.table.min_column_width,
        );

        let mut app = Self {
            config,
            store,
            user_id,
            dispatcher: Dispatcher::new(backend),
            cache: QueryCache::new(config.table.cache_ttl),
            pages: PageController::new(config.table.page_size),
            table,
            saved_layout,
            detail: None,
            loading: false,
            search: None,
            confirm_modal: None,
            columns_modal: None,
            help_modal: None,
            modal_popup: PopupState::default(),
            status: None,
            signed_out: false,
        };
        app.dispatcher.submit(Request::ListCustomProperties);
        app.request_page();
        app
    }

    pub fn run(&mut self) -> Result<Exit> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<Exit>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            for completion in self.dispatcher.drain() {
                self.handle_completion(completion);
            }
            if self.signed_out {
                return Ok(Exit::SignedOut);
            }

            draw::render(terminal, self)?;

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key) {
                        return Ok(Exit::Quit);
                    }
                }
            }
        }
    }

    // =========================================================================
    // Accessors used while drawing
    // =========================================================================

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    pub fn pages(&self) -> &PageController {
        &self.pages
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn search_input(&self) -> Option<&Input> {
        self.search.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Data columns in layout order with their visibility.
    pub fn column_entries(&self) -> Vec<(String, String, bool)> {
        self.table
            .layout()
            .order()
            .iter()
            .filter(|id| id.as_str() != SELECT_COLUMN && id.as_str() != NAME_COLUMN)
            .filter_map(|id| {
                let column = self.table.columns().get(id)?;
                Some((
                    id.clone(),
                    column.title.clone(),
                    self.table.layout().is_hidden(id),
                ))
            })
            .collect()
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        let text = message.into();
        info!(status = %text);
        self.status = Some(StatusLine {
            text,
            is_error: false,
        });
    }

    fn set_error<S: Into<String>>(&mut self, message: S) {
        self.status = Some(StatusLine {
            text: message.into(),
            is_error: true,
        });
    }

    // =========================================================================
    // Requests and completions
    // =========================================================================

    /// Show the page for the current query, from the cache when fresh.
    fn request_page(&mut self) {
        let query = self.pages.query();
        if let Some(page) = self.cache.get(&query) {
            debug!(page = query.page, "contact page served from cache");
            self.apply_page(page);
            return;
        }
        self.loading = true;
        self.dispatcher.submit(Request::ListContacts(query));
    }

    fn apply_page(&mut self, page: ContactPage) {
        self.loading = false;
        let pulled_back = self
            .pages
            .apply_counts(page.pagination.total, page.pagination.total_pages);
        self.table.set_rows(page.contacts);
        if pulled_back {
            self.request_page();
        }
    }

    fn change_query(&mut self, change: impl FnOnce(&mut PageController) -> bool) {
        if change(&mut self.pages) {
            self.request_page();
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        let Completion {
            id: request_id,
            request,
            result,
        } = completion;

        if let Err(err) = &result {
            if err.is_unauthorized() {
                self.sign_out();
                return;
            }
        }
        if result.is_ok() && request.mutates_contacts() {
            self.cache.invalidate_all();
        }

        match (request, result) {
            (Request::ListContacts(query), Ok(Response::ContactPage(page))) => {
                let current = query == self.pages.query();
                self.cache.store(query, page.clone());
                if current {
                    self.apply_page(page);
                }
            }
            (Request::ListContacts(query), Err(err)) => {
                if query == self.pages.query() {
                    self.loading = false;
                    self.fail(&err);
                }
            }
            (Request::GetContact { id }, Ok(Response::ContactDetail(detail))) => {
                if let Some(view) = self.detail_for(&id) {
                    view.set_detail(detail);
                }
            }
            (Request::UpdateContact { id, patch }, Ok(Response::Contact(contact))) => {
                let column_id = patch.column_id();
                self.table.save_succeeded(request_id, contact, &column_id);
                if let Some(view) = self.detail.as_mut().filter(|d| d.contact_id() == id) {
                    view.field_saved(&column_id);
                    self.dispatcher.submit(Request::GetContact { id });
                }
            }
            (Request::UpdateContact { id, patch }, Err(err)) => {
                let column_id = patch.column_id();
                let message = err.user_message();
                self.table
                    .save_failed(request_id, &id, &column_id, message.clone());
                if let Some(view) = self.detail_for(&id) {
                    view.field_save_failed(&column_id, message);
                }
                self.fail(&err);
            }
            (Request::DeleteContacts { ids }, Ok(_)) => {
                self.table.bulk_delete_succeeded(&ids);
                self.set_status(format!("Deleted {} contacts", ids.len()));
                self.request_page();
            }
            (Request::DeleteContacts { .. }, Err(err)) => {
                self.table.bulk_delete_failed();
                self.fail(&err);
            }
            (Request::SaveTask { contact_id, .. }, Ok(Response::Task(task))) => {
                if let Some(view) = self.detail_for(&contact_id) {
                    view.item_saved(DetailItem::Task(task));
                }
            }
            (Request::SaveNote { contact_id, .. }, Ok(Response::Note(note))) => {
                if let Some(view) = self.detail_for(&contact_id) {
                    view.item_saved(DetailItem::Note(note));
                }
            }
            (Request::SaveActivity { contact_id, .. }, Ok(Response::Activity(activity))) => {
                if let Some(view) = self.detail_for(&contact_id) {
                    view.item_saved(DetailItem::Activity(activity));
                }
            }
            (
                Request::SaveTask {
                    contact_id,
                    task_id,
                    ..
                },
                Err(err),
            ) => self.item_save_failed(&contact_id, RelatedKind::Task, task_id.as_deref(), &err),
            (
                Request::SaveNote {
                    contact_id,
                    note_id,
                    ..
                },
                Err(err),
            ) => self.item_save_failed(&contact_id, RelatedKind::Note, note_id.as_deref(), &err),
            (
                Request::SaveActivity {
                    contact_id,
                    activity_id,
                    ..
                },
                Err(err),
            ) => self.item_save_failed(
                &contact_id,
                RelatedKind::Activity,
                activity_id.as_deref(),
                &err,
            ),
            (
                Request::DeleteRelated {
                    contact_id,
                    kind,
                    item_id,
                },
                result,
            ) => {
                let Some(view) = self.detail_for(&contact_id) else {
                    return;
                };
                match result {
                    Ok(_) => view.delete_succeeded(kind, &item_id),
                    Err(err) => {
                        view.delete_failed(kind, &item_id);
                        self.fail(&err);
                    }
                }
            }
            (Request::ListCustomProperties, Ok(Response::CustomProperties(definitions))) => {
                self.table.set_definitions(&definitions);
                if let Some(saved) = self.saved_layout.take() {
                    self.table.restore_layout(saved);
                }
            }
            (_, Err(err)) => self.fail(&err),
            (request, Ok(response)) => {
                warn!(request = %request.describe(), ?response, "unexpected response");
            }
        }
    }

    fn detail_for(&mut self, contact_id: &str) -> Option<&mut DetailView> {
        self.detail
            .as_mut()
            .filter(|view| view.contact_id() == contact_id)
    }

    fn item_save_failed(
        &mut self,
        contact_id: &str,
        kind: RelatedKind,
        item_id: Option<&str>,
        err: &ApiError,
    ) {
        if let Some(view) = self.detail_for(contact_id) {
            view.item_save_failed(kind, item_id, err.user_message());
        }
        self.fail(err);
    }

    fn fail(&mut self, err: &ApiError) {
        self.set_error(err.user_message());
    }

    fn sign_out(&mut self) {
        warn!("token rejected, clearing stored session");
        if let Err(err) = self.store.clear_session() {
            warn!(error = %err, "failed to clear stored session");
        }
        self.signed_out = true;
        self.set_error(ApiError::Unauthorized.user_message());
    }

    fn apply_table_event(&mut self, event: TableEvent) {
        match event {
            TableEvent::UpdateContact { id, patch } => {
                let request = self.dispatcher.submit(Request::UpdateContact { id, patch });
                self.table.track_save(request);
            }
            TableEvent::BulkDelete(ids) => {
                self.set_status(format!("Deleting {} contacts...", ids.len()));
                self.dispatcher.submit(Request::DeleteContacts { ids });
            }
            TableEvent::ViewContact(id) => self.open_detail(&id),
            TableEvent::SelectionChanged(ids) => {
                debug!(selected = ids.len(), "selection changed");
            }
            TableEvent::LayoutChanged(state) => self.persist_layout(&state),
        }
    }

    fn persist_layout(&mut self, state: &LayoutState) {
        self.saved_layout = None;
        if let Err(err) = self
            .store
            .set_preference(&self.user_id, LAYOUT_PREFERENCE, state)
        {
            warn!(error = %err, "failed to save table layout");
            self.set_error("Could not save the column layout");
        }
    }

    fn open_detail(&mut self, id: &str) {
        let Some(contact) = self.table.rows().iter().find(|c| c.id == id).cloned() else {
            return;
        };
        self.detail = Some(DetailView::open(contact));
        self.dispatcher.submit(Request::GetContact { id: id.to_string() });
    }

    // =========================================================================
    // Key handling
    // =========================================================================

    /// Returns true when the application should quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return true;
        }

        if self.help_modal.is_some() {
            self.handle_help_modal_key(key);
            return false;
        }

        if self.confirm_modal.is_some() {
            self.handle_confirm_modal_key(key);
            return false;
        }

        if self.columns_modal.is_some() {
            self.handle_columns_modal_key(key);
            return false;
        }

        if self.search.is_some() {
            self.handle_search_key(key);
            return false;
        }

        if self.detail.is_some() {
            self.handle_detail_key(key);
            return false;
        }

        self.handle_table_key(key)
    }

    /// Global actions shared by the table and the detail view.
    fn handle_global_key(&mut self, key: &KeyEvent) -> bool {
        let config = self.config;
        let global = &config.keys.global;

        if matches_any(key, &global.help) {
            self.show_help();
        } else if matches_any(key, &global.refresh) {
            self.cache.invalidate_all();
            self.dispatcher.submit(Request::ListCustomProperties);
            self.request_page();
            let detail_id = self.detail.as_ref().map(|d| d.contact_id().to_string());
            if let Some(id) = detail_id {
                self.dispatcher.submit(Request::GetContact { id });
            }
        } else {
            return false;
        }
        true
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> bool {
        if self.table.is_editing() {
            self.handle_cell_editor_key(key);
            return false;
        }
        if self.table.is_resizing() {
            self.handle_resize_key(key);
            return false;
        }
        if self.table.is_dragging() {
            self.handle_drag_key(key);
            return false;
        }

        let config = self.config;
        let global = &config.keys.global;
        let keys = &config.keys.table;

        if matches_any(&key, &global.quit) {
            return true;
        }
        if self.handle_global_key(&key) {
            return false;
        }

        if matches_any(&key, &global.search) {
            self.search = Some(Input::new(self.pages.search().to_string()));
        } else if matches_any(&key, &global.preset_next) {
            self.change_query(|p| p.set_preset(p.preset().cycle(1)));
        } else if matches_any(&key, &global.preset_prev) {
            self.change_query(|p| p.set_preset(p.preset().cycle(-1)));
        } else if matches_any(&key, &global.page_size) {
            self.change_query(|p| p.cycle_page_size(1) || p.set_page_size(PAGE_SIZES[0]));
        } else if matches_any(&key, &keys.next) {
            self.table.move_row(1);
        } else if matches_any(&key, &keys.prev) {
            self.table.move_row(-1);
        } else if matches_any(&key, &keys.left) {
            self.table.move_col(-1);
        } else if matches_any(&key, &keys.right) {
            self.table.move_col(1);
        } else if matches_any(&key, &keys.page_down) {
            self.table.page_rows(1);
        } else if matches_any(&key, &keys.page_up) {
            self.table.page_rows(-1);
        } else if matches_any(&key, &keys.first) {
            self.table.first_row();
        } else if matches_any(&key, &keys.last) {
            self.table.last_row();
        } else if matches_any(&key, &keys.edit) {
            self.table.clear_cell_error();
            if let Err(message) = self.table.begin_edit() {
                self.set_status(message);
            }
        } else if matches_any(&key, &keys.open) {
            if let Some(event) = self.table.view_current() {
                self.apply_table_event(event);
            }
        } else if matches_any(&key, &keys.select) {
            if let Some(event) = self.table.toggle_current() {
                self.apply_table_event(event);
            }
        } else if matches_any(&key, &keys.select_all) {
            let event = self.table.toggle_all();
            self.apply_table_event(event);
        } else if matches_any(&key, &keys.delete) {
            match self.table.request_bulk_delete() {
                Some(count) => {
                    self.modal_popup = PopupState::default();
                    self.confirm_modal = Some(ConfirmModal {
                        title: " DELETE CONTACTS ".to_string(),
                        message: format!("Delete {} selected contacts?", count),
                        action: ConfirmAction::BulkDelete,
                    });
                }
                None if self.table.is_deleting() => self.set_status("A delete is already running"),
                None => self.set_status("Select contacts to delete first"),
            }
        } else if matches_any(&key, &keys.next_page) {
            self.change_query(PageController::next_page);
        } else if matches_any(&key, &keys.prev_page) {
            self.change_query(PageController::prev_page);
        } else if matches_any(&key, &keys.first_page) {
            self.change_query(PageController::first_page);
        } else if matches_any(&key, &keys.last_page) {
            self.change_query(PageController::last_page);
        } else if matches_any(&key, &keys.resize) {
            if self.table.begin_resize() {
                self.set_status("Resize: left/right to adjust, Enter to keep, Esc to cancel");
            }
        } else if matches_any(&key, &keys.reorder) {
            if self.table.begin_drag() {
                self.set_status("Move: left/right to move, Enter to drop, Esc to cancel");
            } else {
                self.set_status("This column cannot be moved");
            }
        } else if matches_any(&key, &keys.hide) {
            let id = self.table.current_column().map(|c| c.id.clone());
            match id.and_then(|id| self.table.toggle_column(&id)) {
                Some(event) => self.apply_table_event(event),
                None => self.set_status("This column cannot be hidden"),
            }
        } else if matches_any(&key, &keys.columns) {
            self.modal_popup = PopupState::default();
            self.columns_modal = Some(ColumnsModal::default());
        }
        false
    }

    fn handle_cell_editor_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let keys = &config.keys.editor;

        if matches_any(&key, &keys.cancel) {
            self.table.cancel_edit();
        } else if matches_any(&key, &keys.confirm) {
            self.commit_cell(0, 0);
        } else if matches_any(&key, &keys.next) {
            self.commit_cell(0, 1);
        } else if matches_any(&key, &keys.prev) {
            self.commit_cell(0, -1);
        } else if matches_any(&key, &keys.up) {
            self.commit_cell(-1, 0);
        } else if matches_any(&key, &keys.down) {
            self.commit_cell(1, 0);
        } else {
            self.table.edit_key(key);
        }
    }

    /// Commit the open cell, then move the cursor unless the value was
    /// rejected.
    fn commit_cell(&mut self, rows: isize, cols: isize) {
        match self.table.commit_edit() {
            CommitOutcome::Invalid(message) => {
                self.set_error(message);
                return;
            }
            CommitOutcome::Submitted(event) => self.apply_table_event(event),
            CommitOutcome::Unchanged | CommitOutcome::NotEditing => {}
        }
        if rows != 0 {
            self.table.move_row(rows);
        }
        if cols != 0 {
            self.table.move_col(cols);
        }
    }

    fn handle_resize_key(&mut self, key: KeyEvent) {
        let config = self.config;
        if matches_any(&key, &config.keys.table.left) {
            self.table.adjust_resize(-1);
        } else if matches_any(&key, &config.keys.table.right) {
            self.table.adjust_resize(1);
        } else if matches_any(&key, &config.keys.editor.confirm) {
            if let Some(event) = self.table.commit_resize() {
                self.apply_table_event(event);
            }
            self.status = None;
        } else if matches_any(&key, &config.keys.editor.cancel) {
            self.table.cancel_resize();
            self.status = None;
        }
    }

    fn handle_drag_key(&mut self, key: KeyEvent) {
        let config = self.config;
        if matches_any(&key, &config.keys.table.left) {
            self.table.drag_by(-1);
        } else if matches_any(&key, &config.keys.table.right) {
            self.table.drag_by(1);
        } else if matches_any(&key, &config.keys.editor.confirm) {
            if let Some(event) = self.table.drop_drag() {
                self.apply_table_event(event);
            }
            self.status = None;
        } else if matches_any(&key, &config.keys.editor.cancel) {
            self.table.cancel_drag();
            self.status = None;
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let Some(input) = self.search.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.search = None;
            }
            KeyCode::Enter => {
                let term = input.value().to_string();
                self.search = None;
                self.change_query(|p| p.set_search(&term));
            }
            _ => {
                input.handle_event(&Event::Key(key));
            }
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let Some(view) = self.detail.as_mut() else {
            return;
        };
        if view.form.is_some() {
            self.handle_form_key(key);
            return;
        }
        if view.is_editing_field() {
            self.handle_field_editor_key(key);
            return;
        }
        if self.handle_global_key(&key) {
            return;
        }

        let keys = &config.keys.detail;
        let Some(view) = self.detail.as_mut() else {
            return;
        };
        let mut request = None;

        if matches_any(&key, &keys.close) {
            self.detail = None;
            return;
        } else if matches_any(&key, &keys.next) {
            view.move_cursor(1);
        } else if matches_any(&key, &keys.prev) {
            view.move_cursor(-1);
        } else if matches_any(&key, &keys.tab_next) {
            view.select_tab(view.tab().next());
        } else if matches_any(&key, &keys.tab_prev) {
            view.select_tab(view.tab().prev());
        } else if matches_any(&key, &keys.focus) {
            view.toggle_focus();
        } else if matches_any(&key, &keys.open) {
            if view.focus() == DetailFocus::Items {
                view.open_selected();
            } else if let Err(message) = view.begin_field_edit() {
                self.set_status(message);
            }
        } else if matches_any(&key, &keys.edit) {
            if view.focus() == DetailFocus::Fields {
                if let Err(message) = view.begin_field_edit() {
                    self.set_status(message);
                }
            } else {
                view.open_selected();
            }
        } else if matches_any(&key, &keys.new_task) {
            view.new_item(RelatedKind::Task);
        } else if matches_any(&key, &keys.new_note) {
            view.new_item(RelatedKind::Note);
        } else if matches_any(&key, &keys.new_activity) {
            view.new_item(RelatedKind::Activity);
        } else if matches_any(&key, &keys.delete) {
            if view.focus() == DetailFocus::Items {
                if let Some(item) = view.selected() {
                    let kind = item.kind();
                    self.modal_popup = PopupState::default();
                    self.confirm_modal = Some(ConfirmModal {
                        title: format!(" DELETE {} ", kind.title()),
                        message: format!("Delete this {}?", kind.title().to_lowercase()),
                        action: ConfirmAction::DeleteItem,
                    });
                }
            }
        } else if matches_any(&key, &keys.toggle) {
            request = view.toggle_selected_task();
        } else if matches_any(&key, &keys.status_filter) {
            view.cycle_status_filter();
        } else if matches_any(&key, &keys.priority_filter) {
            view.cycle_priority_filter();
        } else if let KeyCode::Char(digit) = key.code {
            if let Some(tab) = DetailTab::from_digit(digit) {
                view.select_tab(tab);
            }
        }

        if let Some(request) = request {
            self.dispatcher.submit(request);
        }
    }

    fn handle_field_editor_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let keys = &config.keys.editor;
        let Some(view) = self.detail.as_mut() else {
            return;
        };

        if matches_any(&key, &keys.cancel) {
            view.cancel_field_edit();
            return;
        }
        let commit = [&keys.confirm, &keys.next, &keys.prev, &keys.up, &keys.down]
            .into_iter()
            .any(|bindings| matches_any(&key, bindings));
        if !commit {
            view.field_edit_key(key);
            return;
        }
        match view.commit_field_edit() {
            CommitOutcome::Invalid(message) => self.set_error(message),
            CommitOutcome::Submitted(event) => self.apply_table_event(event),
            CommitOutcome::Unchanged | CommitOutcome::NotEditing => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let keys = &config.keys.form;
        let Some(view) = self.detail.as_mut() else {
            return;
        };
        let Some(form) = view.form.as_mut() else {
            return;
        };

        if form.is_moving() {
            match key.code {
                KeyCode::Left => form.nudge(-1, 0),
                KeyCode::Right => form.nudge(1, 0),
                KeyCode::Up => form.nudge(0, -1),
                KeyCode::Down => form.nudge(0, 1),
                _ if matches_any(&key, &keys.move_mode)
                    || matches_any(&key, &keys.cancel)
                    || matches_any(&key, &keys.submit) =>
                {
                    form.toggle_moving();
                }
                _ => {}
            }
            return;
        }

        if matches_any(&key, &keys.cancel) {
            view.close_form();
        } else if matches_any(&key, &keys.move_mode) {
            form.toggle_moving();
        } else if matches_any(&key, &keys.submit) {
            if let Some(request) = view.submit_form() {
                self.dispatcher.submit(request);
            }
        } else if matches_any(&key, &keys.next) {
            form.focus_next();
        } else if matches_any(&key, &keys.prev) {
            form.focus_prev();
        } else if matches_any(&key, &keys.choice_next) {
            if !form.cycle_choice(1) {
                form.handle_key_event(key);
            }
        } else if matches_any(&key, &keys.choice_prev) {
            if !form.cycle_choice(-1) {
                form.handle_key_event(key);
            }
        } else {
            form.handle_key_event(key);
        }
    }

    fn handle_confirm_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.confirm_modal.take() else {
            return;
        };

        let config = self.config;
        let modal_keys = &config.keys.modal;

        if matches_any(&key, &modal_keys.cancel) {
            return;
        }

        if matches_any(&key, &modal_keys.confirm) {
            match modal.action {
                ConfirmAction::BulkDelete => {
                    if let Some(event) = self.table.confirm_bulk_delete() {
                        self.apply_table_event(event);
                    }
                }
                ConfirmAction::DeleteItem => {
                    let request = self.detail.as_mut().and_then(DetailView::delete_selected);
                    if let Some(request) = request {
                        self.dispatcher.submit(request);
                    }
                }
            }
            return;
        }

        // Put the modal back if key wasn't handled
        self.confirm_modal = Some(modal);
    }

    fn handle_columns_modal_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let keys = &config.keys.modal;
        let entries = self.column_entries();
        let Some(modal) = self.columns_modal.as_mut() else {
            return;
        };

        if matches_any(&key, &keys.cancel) || matches_any(&key, &keys.confirm) {
            self.columns_modal = None;
        } else if matches_any(&key, &keys.next) {
            modal.cursor = (modal.cursor + 1).min(entries.len().saturating_sub(1));
        } else if matches_any(&key, &keys.prev) {
            modal.cursor = modal.cursor.saturating_sub(1);
        } else if matches_any(&key, &keys.toggle) {
            let Some((id, _, _)) = entries.get(modal.cursor) else {
                return;
            };
            if let Some(event) = self.table.toggle_column(id) {
                self.apply_table_event(event);
            }
        }
    }

    // =========================================================================
    // Help Modal
    // =========================================================================

    /// Generate help content from current keybindings configuration
    pub fn help_entries(&self) -> Vec<HelpSection> {
        let keys = &self.config.keys;
        let entry = |action: &'static str, bindings: &[String]| HelpEntry {
            action,
            keys: describe(bindings),
        };

        vec![
            HelpSection {
                title: "Global",
                entries: vec![
                    entry("Quit", &keys.global.quit),
                    entry("Help", &keys.global.help),
                    entry("Search", &keys.global.search),
                    entry("Refresh", &keys.global.refresh),
                    entry("Next view", &keys.global.preset_next),
                    entry("Previous view", &keys.global.preset_prev),
                    entry("Page size", &keys.global.page_size),
                ],
            },
            HelpSection {
                title: "Table",
                entries: vec![
                    entry("Down / up", &[keys.table.next.clone(), keys.table.prev.clone()].concat()),
                    entry("Left / right", &[keys.table.left.clone(), keys.table.right.clone()].concat()),
                    entry("Edit cell", &keys.table.edit),
                    entry("Open contact", &keys.table.open),
                    entry("Select row", &keys.table.select),
                    entry("Select all", &keys.table.select_all),
                    entry("Delete selected", &keys.table.delete),
                    entry("Next page", &keys.table.next_page),
                    entry("Previous page", &keys.table.prev_page),
                    entry("First page", &keys.table.first_page),
                    entry("Last page", &keys.table.last_page),
                    entry("Resize column", &keys.table.resize),
                    entry("Move column", &keys.table.reorder),
                    entry("Hide column", &keys.table.hide),
                    entry("Columns", &keys.table.columns),
                ],
            },
            HelpSection {
                title: "Editing",
                entries: vec![
                    entry("Save", &keys.editor.confirm),
                    entry("Cancel", &keys.editor.cancel),
                    entry("Save and move", &[keys.editor.next.clone(), keys.editor.prev.clone()].concat()),
                ],
            },
            HelpSection {
                title: "Contact",
                entries: vec![
                    entry("Close", &keys.detail.close),
                    entry("Switch tab", &[keys.detail.tab_next.clone(), keys.detail.tab_prev.clone()].concat()),
                    entry("Fields / items", &keys.detail.focus),
                    entry("Open item", &keys.detail.open),
                    entry("Edit", &keys.detail.edit),
                    entry("New task", &keys.detail.new_task),
                    entry("New note", &keys.detail.new_note),
                    entry("New activity", &keys.detail.new_activity),
                    entry("Delete item", &keys.detail.delete),
                    entry("Complete task", &keys.detail.toggle),
                    entry("Status filter", &keys.detail.status_filter),
                    entry("Priority filter", &keys.detail.priority_filter),
                ],
            },
            HelpSection {
                title: "Form",
                entries: vec![
                    entry("Save", &keys.form.submit),
                    entry("Cancel", &keys.form.cancel),
                    entry("Next field", &keys.form.next),
                    entry("Previous field", &keys.form.prev),
                    entry("Change choice", &[keys.form.choice_prev.clone(), keys.form.choice_next.clone()].concat()),
                    entry("Move popup", &keys.form.move_mode),
                ],
            },
        ]
    }

    /// Open the help modal
    pub fn show_help(&mut self) {
        let total_lines = self
            .help_entries()
            .iter()
            .map(|section| section.entries.len() + 2)
            .sum();
        self.help_modal = Some(HelpModal::new(total_lines));
    }

    /// Handle keys when help modal is open
    fn handle_help_modal_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc) || matches!(key.code, KeyCode::Char('q')) {
            self.help_modal = None;
            return;
        }

        let Some(modal) = self.help_modal.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => modal.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up => modal.scroll_up(1),
            KeyCode::PageDown => {
                let page = modal.viewport_height.saturating_sub(1).max(1);
                modal.scroll_down(page);
            }
            KeyCode::PageUp => {
                let page = modal.viewport_height.saturating_sub(1).max(1);
                modal.scroll_up(page);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use tempfile::TempDir;
    use time::OffsetDateTime;

    use crate::api::memory::MemoryBackend;
    use crate::model::{fixtures, TaskStatus};
    use crate::store::Session;

    struct Harness {
        _dir: TempDir,
        config: Config,
        store: Store,
        backend: Arc<MemoryBackend>,
    }

    fn harness(contacts: usize) -> Harness {
        let dir = TempDir::new().unwrap();
        let raw = format!(
            "api_url = \"http://localhost:3000\"\ndb_path = \"{}\"\nlog_file = \"{}\"\n",
            dir.path().join("state.db").display(),
            dir.path().join("contactdesk.log").display()
        );
        let config = crate::config::parse(&raw, PathBuf::from("test.toml")).unwrap();
        let store = Store::open(&config.db_path).unwrap();
        Harness {
            _dir: dir,
            config,
            store,
            backend: Arc::new(MemoryBackend::with_contacts(contacts)),
        }
    }

    fn app(h: &Harness) -> App<'_> {
        let mut app = App::new(&h.config, &h.store, h.backend.clone(), "u1".to_string());
        settle(&mut app);
        app
    }

    /// Process completions until nothing is in flight.
    fn settle(app: &mut App) {
        while app.dispatcher.in_flight() > 0 {
            match app.dispatcher.wait(Duration::from_secs(5)) {
                Some(completion) => app.handle_completion(completion),
                None => break,
            }
        }
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        let quit = app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
        settle(app);
        quit
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_paging_through_120_contacts() {
        let h = harness(120);
        let mut app = app(&h);
        assert_eq!(app.table.row_count(), 100);
        assert!(app.pages().has_next());

        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.pages().page(), 2);
        assert_eq!(app.table.row_count(), 20);
        assert!(!app.pages().has_next());
    }

    #[test]
    fn test_search_resets_page_and_requeries() {
        let h = harness(120);
        let mut app = app(&h);
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.pages().page(), 2);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "contact 01");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.pages().page(), 1);
        assert_eq!(app.pages().search(), "contact 01");
        assert_eq!(app.table.row_count(), 10);
        assert_eq!(
            h.backend.calls().last().map(String::as_str),
            Some("GET contacts page=1 limit=100")
        );
    }

    #[test]
    fn test_cached_page_is_not_refetched() {
        let h = harness(120);
        let mut app = app(&h);
        press(&mut app, KeyCode::Char(']'));
        press(&mut app, KeyCode::Char('['));
        let lists = h
            .backend
            .calls()
            .iter()
            .filter(|c| c.starts_with("GET contacts page"))
            .count();
        assert_eq!(lists, 2);
    }

    #[test]
    fn test_cell_edit_blur_sends_one_update() {
        let h = harness(3);
        let mut app = app(&h);
        // name -> email
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "ada@example.com");
        press(&mut app, KeyCode::Tab);

        let updates: Vec<String> = h
            .backend
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("PUT contacts/"))
            .collect();
        assert_eq!(updates, vec![r#"PUT contacts/c0 {"email":"ada@example.com"}"#]);
        assert_eq!(app.table.rows()[0].email.as_deref(), Some("ada@example.com"));
        assert!(!app.table.is_editing());
    }

    #[test]
    fn test_bulk_delete_removes_selected_rows() {
        let h = harness(5);
        let mut app = app(&h);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('d'));
        assert!(app.confirm_modal.is_some());
        press(&mut app, KeyCode::Char('y'));

        assert!(app.confirm_modal.is_none());
        assert_eq!(app.table.row_count(), 3);
        assert_eq!(app.table.selected_count(), 0);
        assert!(h.backend.contact("c0").is_none());
        assert!(h.backend.contact("c1").is_none());
    }

    #[test]
    fn test_task_toggle_sends_full_task() {
        let h = harness(1);
        let mut task = fixtures::task("t1", "c0", "Call back", OffsetDateTime::now_utc());
        task.status = TaskStatus::Pending;
        h.backend.add_task(task);
        let mut app = app(&h);

        press(&mut app, KeyCode::Char('o'));
        assert!(app.detail.as_ref().is_some_and(|d| d.is_loaded()));
        press(&mut app, KeyCode::Char(' '));

        let puts: Vec<String> = h
            .backend
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("PUT contacts/c0/tasks/t1"))
            .collect();
        assert_eq!(puts.len(), 1);
        assert!(puts[0].contains(r#""status":"COMPLETED""#));
        assert!(puts[0].contains(r#""title":"Call back""#));
        assert!(app.detail.as_ref().unwrap().form.is_none());
    }

    #[test]
    fn test_layout_survives_restart() {
        let h = harness(2);
        {
            let mut app = app(&h);
            // cursor on email, move it one to the right
            press(&mut app, KeyCode::Char('l'));
            press(&mut app, KeyCode::Char('m'));
            press(&mut app, KeyCode::Char('l'));
            press(&mut app, KeyCode::Enter);
        }
        let app = app(&h);
        let order = app.table.layout().order();
        assert_eq!(order[0], SELECT_COLUMN);
        assert_eq!(order[1], NAME_COLUMN);
        assert_eq!(order[2], "phone");
        assert_eq!(order[3], "email");
    }

    #[test]
    fn test_unauthorized_clears_session() {
        let h = harness(1);
        h.store
            .save_session(&Session {
                token: "t".into(),
                user_id: "u1".into(),
            })
            .unwrap();
        let mut app = app(&h);
        h.backend.fail_next(ApiError::Unauthorized);
        press(&mut app, KeyCode::F(5));

        assert!(app.signed_out);
        assert_eq!(h.store.session().unwrap(), None);
    }

    #[test]
    fn test_quit_and_ctrl_c() {
        let h = harness(0);
        let mut app = app(&h);
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }
}
