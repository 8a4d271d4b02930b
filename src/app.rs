use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::board::{BoardFilter, BoardState, ColumnSpec, MoveOutcome, MoveTicket};
use crate::comments::{self, CommentFeed};
use crate::config::AppConfig;
use crate::event::KeyAction;
use crate::model::comment::{Comment, NewComment};
use crate::model::item::{BoardItem, Priority};
use crate::store::{ResourceKind, ResourceStore, StoreError};

#[derive(Debug, Clone)]
pub enum Action {
    Key(KeyAction),
    Tick,
    ItemsLoaded(Vec<BoardItem>),
    FetchError(String),
    /// A spawned persistence call for a move has resolved.
    MoveSettled {
        ticket: MoveTicket,
        result: Result<(), StoreError>,
    },
    /// A spawned fetch of a test case's comments has resolved.
    CommentsLoaded {
        test_case_id: i64,
        result: Result<Vec<Comment>, StoreError>,
    },
    /// A spawned comment mutation (and its re-fetch) has resolved.
    CommentSettled {
        test_case_id: i64,
        outcome: CommentOutcome,
        result: Result<Vec<Comment>, StoreError>,
    },
    Quit,
}

/// Which mutation a `CommentSettled` action reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOutcome {
    Posted,
    Replied,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    Board,
    Comments,
}

/// What the command-bar text is for when input is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputIntent {
    Filter,
    NewComment,
    Reply(i64),
    EditComment(i64),
}

pub struct App {
    pub board: BoardState,
    pub filter: BoardFilter,
    pub columns: Vec<ColumnSpec>,
    pub view_mode: ViewMode,
    pub selected_column: usize,
    pub selected_row: usize,
    pub feed: Option<CommentFeed>,
    pub selected_comment: usize,
    pub input_active: bool,
    pub input_buffer: String,
    pub input_cursor: usize,
    pub input_intent: InputIntent,
    /// Comment id awaiting an explicit y/n delete confirmation.
    pub pending_delete: Option<i64>,
    pub loading: bool,
    pub flash_message: Option<(String, Instant)>,
    pub should_quit: bool,
    pub user_id: i64,
    pub action_tx: mpsc::UnboundedSender<Action>,
    resource: ResourceKind,
    store: Arc<dyn ResourceStore>,
}

impl App {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn ResourceStore>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        let columns = config.columns();
        Self {
            board: BoardState::new(&columns, Vec::new()),
            filter: BoardFilter::default(),
            columns,
            view_mode: ViewMode::Board,
            selected_column: 0,
            selected_row: 0,
            feed: None,
            selected_comment: 0,
            input_active: false,
            input_buffer: String::new(),
            input_cursor: 0,
            input_intent: InputIntent::Filter,
            pending_delete: None,
            loading: true,
            flash_message: None,
            should_quit: false,
            user_id: config.user_id(),
            action_tx,
            resource: config.resource(),
            store,
        }
    }

    pub async fn update(&mut self, action: Action) {
        // Clear flash message after 3 seconds
        if let Some((_, t)) = &self.flash_message {
            if t.elapsed().as_secs() >= 3 {
                self.flash_message = None;
            }
        }

        match action {
            Action::Key(key) => {
                if self.pending_delete.is_some() {
                    self.handle_confirm_key(key);
                } else if self.input_active {
                    self.handle_input_key(key);
                } else {
                    self.handle_key(key);
                }
            }
            Action::Tick => {}
            Action::ItemsLoaded(items) => {
                self.board = BoardState::new(&self.columns, items);
                self.loading = false;
                self.clamp_selection();
            }
            Action::FetchError(msg) => {
                self.loading = false;
                self.flash(format!("Fetch error: {msg}"));
            }
            Action::MoveSettled { ticket, result } => match result {
                Ok(()) => {
                    self.board.commit_move(&ticket);
                }
                Err(e) => {
                    // A stale ticket changes nothing; a live one snaps the
                    // card back to where it was.
                    if self.board.rollback_move(&ticket) {
                        self.flash(format!("Move failed: {e}"));
                        self.clamp_selection();
                    }
                }
            },
            Action::CommentsLoaded {
                test_case_id,
                result,
            } => match result {
                Ok(flat) => {
                    let mut feed = CommentFeed::new(test_case_id);
                    feed.apply(flat);
                    self.feed = Some(feed);
                    self.selected_comment = 0;
                    self.view_mode = ViewMode::Comments;
                }
                Err(e) => self.flash(format!("Failed to load comments: {e}")),
            },
            Action::CommentSettled {
                test_case_id,
                outcome,
                result,
            } => self.settle_comment(test_case_id, outcome, result),
            Action::Quit => {
                self.should_quit = true;
            }
        }
    }

    fn handle_key(&mut self, key: KeyAction) {
        match self.view_mode {
            ViewMode::Board => self.handle_board_key(key),
            ViewMode::Comments => self.handle_comments_key(key),
        }
    }

    fn handle_board_key(&mut self, key: KeyAction) {
        match key {
            KeyAction::Up => {
                self.selected_row = self.selected_row.saturating_sub(1);
            }
            KeyAction::Down => {
                let len = self.visible_len(self.selected_column);
                if len > 0 && self.selected_row < len - 1 {
                    self.selected_row += 1;
                }
            }
            KeyAction::Left => {
                self.selected_column = self.selected_column.saturating_sub(1);
                self.clamp_selection();
            }
            KeyAction::Right => {
                if self.selected_column + 1 < self.board.columns().len() {
                    self.selected_column += 1;
                }
                self.clamp_selection();
            }
            KeyAction::Select => self.open_comments(),
            KeyAction::Escape => {
                if self.filter.is_active() {
                    self.filter = BoardFilter::default();
                    self.clamp_selection();
                }
            }
            KeyAction::Char('q') => self.should_quit = true,
            KeyAction::Char('r') => self.refresh_items(),
            KeyAction::Char('/') => {
                self.input_intent = InputIntent::Filter;
                self.input_buffer = self.filter.text.clone();
                self.input_cursor = self.input_buffer.chars().count();
                self.input_active = true;
            }
            KeyAction::Char('p') => self.cycle_priority_filter(),
            KeyAction::Char('H') => self.move_selected_across(-1),
            KeyAction::Char('L') => self.move_selected_across(1),
            KeyAction::Char('K') => self.reorder_selected(-1),
            KeyAction::Char('J') => self.reorder_selected(1),
            _ => {}
        }
    }

    fn handle_comments_key(&mut self, key: KeyAction) {
        match key {
            KeyAction::Up => {
                self.selected_comment = self.selected_comment.saturating_sub(1);
            }
            KeyAction::Down => {
                let len = self.feed.as_ref().map_or(0, |f| f.flattened().len());
                if len > 0 && self.selected_comment < len - 1 {
                    self.selected_comment += 1;
                }
            }
            KeyAction::Left | KeyAction::Escape => {
                self.view_mode = ViewMode::Board;
                self.feed = None;
                self.selected_comment = 0;
            }
            KeyAction::Char('q') => self.should_quit = true,
            KeyAction::Char('n') => {
                self.input_intent = InputIntent::NewComment;
                self.input_buffer.clear();
                self.input_cursor = 0;
                self.input_active = true;
            }
            KeyAction::Char('r') => {
                // Replies attach to the thread's top-level comment, even
                // when the cursor sits on one of its replies.
                let Some(selected) = self.selected_comment_id() else {
                    self.flash("No comment to reply to");
                    return;
                };
                let parent = self
                    .feed
                    .as_ref()
                    .and_then(|f| f.find(selected))
                    .and_then(|c| c.parent_id)
                    .unwrap_or(selected);
                self.input_intent = InputIntent::Reply(parent);
                self.input_buffer.clear();
                self.input_cursor = 0;
                self.input_active = true;
            }
            KeyAction::Char('e') => {
                let Some(id) = self.selected_comment_id() else {
                    return;
                };
                let (can, current) = match self.feed.as_ref() {
                    Some(feed) => (
                        feed.can_modify(id, self.user_id),
                        feed.find(id).map(|c| c.content.clone()),
                    ),
                    None => return,
                };
                if !can {
                    self.flash("Only the author can edit a comment");
                    return;
                }
                self.input_buffer = current.unwrap_or_default();
                self.input_cursor = self.input_buffer.chars().count();
                self.input_intent = InputIntent::EditComment(id);
                self.input_active = true;
            }
            KeyAction::Char('d') => {
                let Some(id) = self.selected_comment_id() else {
                    return;
                };
                let can = self
                    .feed
                    .as_ref()
                    .is_some_and(|f| f.can_modify(id, self.user_id));
                if can {
                    self.pending_delete = Some(id);
                } else {
                    self.flash("Only the author can delete a comment");
                }
            }
            _ => {}
        }
    }

    /// y/n prompt before a delete; anything but `y` cancels.
    fn handle_confirm_key(&mut self, key: KeyAction) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        if !matches!(key, KeyAction::Char('y') | KeyAction::Char('Y')) {
            self.flash("Delete cancelled");
            return;
        }
        let Some(tc) = self.feed.as_ref().map(|f| f.test_case_id()) else {
            return;
        };
        let store = self.store.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = match store.delete_comment(id).await {
                Ok(()) => store.fetch_comments(tc).await,
                Err(e) => Err(e),
            };
            let _ = tx.send(Action::CommentSettled {
                test_case_id: tc,
                outcome: CommentOutcome::Deleted,
                result,
            });
        });
    }

    fn handle_input_key(&mut self, key: KeyAction) {
        match key {
            KeyAction::Char(c) => {
                let byte = byte_index(&self.input_buffer, self.input_cursor);
                self.input_buffer.insert(byte, c);
                self.input_cursor += 1;
            }
            KeyAction::Backspace => {
                if self.input_cursor > 0 {
                    let byte = byte_index(&self.input_buffer, self.input_cursor - 1);
                    self.input_buffer.remove(byte);
                    self.input_cursor -= 1;
                }
            }
            KeyAction::Left => {
                self.input_cursor = self.input_cursor.saturating_sub(1);
            }
            KeyAction::Right => {
                let len = self.input_buffer.chars().count();
                self.input_cursor = (self.input_cursor + 1).min(len);
            }
            KeyAction::Escape => {
                self.input_active = false;
                self.input_buffer.clear();
                self.input_cursor = 0;
            }
            KeyAction::Select => self.submit_input(),
            _ => {}
        }
    }

    fn submit_input(&mut self) {
        match self.input_intent.clone() {
            InputIntent::Filter => {
                self.filter.text = self.input_buffer.trim().to_string();
                self.close_input();
                self.clamp_selection();
            }
            InputIntent::NewComment => self.submit_comment(None),
            InputIntent::Reply(parent) => self.submit_comment(Some(parent)),
            InputIntent::EditComment(id) => self.submit_edit(id),
        }
    }

    /// Validate the draft, then persist and re-fetch off the update loop.
    /// The command bar stays open until the mutation settles, so a failure
    /// leaves the text in place for a retry.
    fn submit_comment(&mut self, parent_id: Option<i64>) {
        let Some(tc) = self.feed.as_ref().map(|f| f.test_case_id()) else {
            return;
        };
        let content = match comments::validate_content(&self.input_buffer) {
            Ok(content) => content,
            Err(e) => {
                self.flash(format!("Comment failed: {e}"));
                return;
            }
        };
        let outcome = if parent_id.is_some() {
            CommentOutcome::Replied
        } else {
            CommentOutcome::Posted
        };
        let draft = NewComment {
            content,
            test_case_id: tc,
            parent_id,
        };
        let store = self.store.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = match store.create_comment(&draft).await {
                Ok(_) => store.fetch_comments(tc).await,
                Err(e) => Err(e),
            };
            let _ = tx.send(Action::CommentSettled {
                test_case_id: tc,
                outcome,
                result,
            });
        });
    }

    fn submit_edit(&mut self, id: i64) {
        let Some(tc) = self.feed.as_ref().map(|f| f.test_case_id()) else {
            return;
        };
        let content = match comments::validate_content(&self.input_buffer) {
            Ok(content) => content,
            Err(e) => {
                self.flash(format!("Edit failed: {e}"));
                return;
            }
        };
        let store = self.store.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = match store.update_comment(id, &content).await {
                Ok(_) => store.fetch_comments(tc).await,
                Err(e) => Err(e),
            };
            let _ = tx.send(Action::CommentSettled {
                test_case_id: tc,
                outcome: CommentOutcome::Updated,
                result,
            });
        });
    }

    /// Apply a settled comment mutation. A settlement for a feed the user
    /// has already navigated away from is dropped.
    fn settle_comment(
        &mut self,
        test_case_id: i64,
        outcome: CommentOutcome,
        result: Result<Vec<Comment>, StoreError>,
    ) {
        let current = self.feed.as_ref().map(|f| f.test_case_id());
        if current != Some(test_case_id) {
            return;
        }
        match result {
            Ok(flat) => {
                if let Some(feed) = self.feed.as_mut() {
                    feed.apply(flat);
                }
                match outcome {
                    CommentOutcome::Posted => {
                        self.close_input();
                        self.flash("Comment added");
                    }
                    CommentOutcome::Replied => {
                        self.close_input();
                        self.flash("Reply added");
                    }
                    CommentOutcome::Updated => {
                        self.close_input();
                        self.flash("Comment updated");
                    }
                    CommentOutcome::Deleted => self.flash("Comment deleted"),
                }
                self.clamp_comment_selection();
            }
            // Keep the command-bar text so the user can retry without
            // re-typing.
            Err(e) => {
                let verb = match outcome {
                    CommentOutcome::Posted | CommentOutcome::Replied => "Comment failed",
                    CommentOutcome::Updated => "Edit failed",
                    CommentOutcome::Deleted => "Delete failed",
                };
                self.flash(format!("{verb}: {e}"));
            }
        }
    }

    fn close_input(&mut self) {
        self.input_active = false;
        self.input_buffer.clear();
        self.input_cursor = 0;
    }

    fn cycle_priority_filter(&mut self) {
        self.filter.min_priority = match self.filter.min_priority {
            None => Some(Priority::Low),
            Some(Priority::Critical) => None,
            Some(p) => Priority::ALL
                .iter()
                .copied()
                .find(|candidate| *candidate > p),
        };
        match self.filter.min_priority {
            Some(p) => self.flash(format!("Priority filter: {p} and up")),
            None => self.flash("Priority filter off"),
        }
        self.clamp_selection();
    }

    /// Fetch the board off the update loop; the result arrives as
    /// `ItemsLoaded` or `FetchError` through the action channel.
    pub fn refresh_items(&mut self) {
        self.loading = true;
        let store = self.store.clone();
        let tx = self.action_tx.clone();
        let kind = self.resource;
        tokio::spawn(async move {
            match store.fetch_items(kind).await {
                Ok(items) => {
                    let _ = tx.send(Action::ItemsLoaded(items));
                }
                Err(e) => {
                    let _ = tx.send(Action::FetchError(e.to_string()));
                }
            }
        });
    }

    fn open_comments(&mut self) {
        let Some(item_id) = self.selected_item_id() else {
            return;
        };
        let Some(target) = self.board.item(&item_id).and_then(|i| i.comment_target()) else {
            self.flash("No linked test case for this card");
            return;
        };
        let store = self.store.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = store.fetch_comments(target).await;
            let _ = tx.send(Action::CommentsLoaded {
                test_case_id: target,
                result,
            });
        });
    }

    /// Move the selected card `dir` columns left or right, keeping its
    /// vertical position where possible. Optimistic: the card moves now and
    /// persistence settles through the action channel.
    fn move_selected_across(&mut self, dir: isize) {
        let Some((item_id, source, pos)) = self.selected_position() else {
            return;
        };
        let src_idx = match self.board.columns().iter().position(|c| c.id == source) {
            Some(i) => i,
            None => return,
        };
        let dest_idx = src_idx as isize + dir;
        if dest_idx < 0 || dest_idx as usize >= self.board.columns().len() {
            return;
        }
        let dest = self.board.columns()[dest_idx as usize].id.clone();
        self.apply_move(&item_id, &source, &dest, pos);
    }

    /// Reorder the selected card within its column.
    fn reorder_selected(&mut self, dir: isize) {
        let Some((item_id, source, pos)) = self.selected_position() else {
            return;
        };
        let dest_index = pos as isize + dir;
        if dest_index < 0 {
            return;
        }
        let source_clone = source.clone();
        self.apply_move(&item_id, &source_clone, &source, dest_index as usize);
    }

    fn apply_move(&mut self, item_id: &str, source: &str, dest: &str, dest_index: usize) {
        match self.board.move_item(item_id, source, dest, dest_index) {
            Ok(MoveOutcome::Moved(ticket)) => {
                self.persist_move(ticket);
                self.select_item(item_id);
            }
            Ok(MoveOutcome::NoOp) => {}
            Err(e) => self.flash(format!("Move rejected: {e}")),
        }
    }

    fn persist_move(&self, ticket: MoveTicket) {
        let store = self.store.clone();
        let tx = self.action_tx.clone();
        let kind = self.resource;
        let id = ticket.item_id().to_string();
        let status = ticket.dest_column().to_string();
        tokio::spawn(async move {
            let result = store.update_status(kind, &id, &status).await;
            let _ = tx.send(Action::MoveSettled { ticket, result });
        });
    }

    /// The filter-visible view the board screen renders from.
    fn visible_len(&self, column: usize) -> usize {
        self.board
            .filtered(&self.filter)
            .get(column)
            .map_or(0, |(_, items)| items.len())
    }

    pub fn selected_item_id(&self) -> Option<String> {
        let view = self.board.filtered(&self.filter);
        let (_, items) = view.get(self.selected_column)?;
        items.get(self.selected_row).map(|i| i.id.clone())
    }

    /// Selected item plus its actual (unfiltered) position in its column.
    fn selected_position(&self) -> Option<(String, String, usize)> {
        let view = self.board.filtered(&self.filter);
        let (column, items) = view.get(self.selected_column)?;
        let item = items.get(self.selected_row)?;
        let pos = column.item_ids.iter().position(|id| *id == item.id)?;
        Some((item.id.clone(), column.id.clone(), pos))
    }

    /// Re-point the cursor at an item after a move changed its location.
    fn select_item(&mut self, item_id: &str) {
        let view = self.board.filtered(&self.filter);
        for (col_idx, (_, items)) in view.iter().enumerate() {
            if let Some(row) = items.iter().position(|i| i.id == item_id) {
                self.selected_column = col_idx;
                self.selected_row = row;
                return;
            }
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let columns = self.board.columns().len();
        if columns == 0 {
            self.selected_column = 0;
            self.selected_row = 0;
            return;
        }
        self.selected_column = self.selected_column.min(columns - 1);
        let len = self.visible_len(self.selected_column);
        self.selected_row = if len == 0 {
            0
        } else {
            self.selected_row.min(len - 1)
        };
    }

    fn clamp_comment_selection(&mut self) {
        let len = self.feed.as_ref().map_or(0, |f| f.flattened().len());
        self.selected_comment = if len == 0 {
            0
        } else {
            self.selected_comment.min(len - 1)
        };
    }

    fn selected_comment_id(&self) -> Option<i64> {
        self.feed
            .as_ref()?
            .flattened()
            .get(self.selected_comment)
            .map(|(c, _)| c.id)
    }

    fn flash(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), Instant::now()));
    }
}

fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
