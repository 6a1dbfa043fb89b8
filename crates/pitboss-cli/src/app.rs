use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pitboss_core::{
    chat::{ChatStore, Conversation, MemoryStorage, Role},
    constants::{
        chat::{ASSISTANT_NAME, DEFAULT_USER_NAME, SUGGESTED_PROMPTS},
        completion::{REGENERATE_FALLBACK, SEND_FALLBACK},
    },
    interaction::{self, Action, HotMessage, InteractionContext},
    llm::CompletionClient,
    markdown,
    pipeline::{spawn_turn, Pipeline, RevealSchedule, TurnEvent},
    Settings,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Terminal,
};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::commands::{self, CommandResult};
use crate::keys::to_chord;
use crate::theme::Theme;

// ── Single-prompt mode ──────────────────────────────────────────────────

pub async fn run_single_prompt(settings: &Settings, prompt: &str) -> Result<()> {
    let client: Arc<dyn CompletionClient> = Arc::new(settings.build_completion_client()?);

    // One-shot prompts stay out of the saved chat history.
    let mut store = ChatStore::load(Box::new(MemoryStorage::new()));
    let mut pipeline = Pipeline::new(settings.profile_hint(), settings.chat.cancel_stale_turns);

    let Some(request) = pipeline.send(&mut store, prompt) else {
        anyhow::bail!("Nothing to send");
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<TurnEvent>();
    let handle = spawn_turn(client, request, settings.reveal_schedule(), event_tx);

    let mut printed = 0usize;
    let mut stdout = io::stdout();
    while let Some(event) = event_rx.recv().await {
        match &event {
            TurnEvent::Content { text, .. } => {
                // Each event carries the full prefix; print only what is new.
                print!("{}", text.get(printed..).unwrap_or_default());
                printed = text.len();
                stdout.flush()?;
            }
            TurnEvent::Failed { error, .. } => eprintln!("Error: {error}"),
            TurnEvent::Finished { .. } => {}
        }
        pipeline.apply(&mut store, event);
    }
    handle.await?;

    if printed == 0 {
        if let Some(reply) = store.active().and_then(|c| c.messages.last()) {
            print!("{}", reply.content);
        }
    }
    println!();
    Ok(())
}

// ── Interactive TUI ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Transcript,
}

enum ConfirmAction {
    DeleteConversation {
        id: String,
    },
    DeleteMessage {
        conversation_id: String,
        message_id: String,
    },
}

/// A y/n question blocking every other key until answered.
struct PendingConfirm {
    prompt: String,
    action: ConfirmAction,
}

/// Transcript rows covered by one message in the last drawn frame.
struct MessageRows {
    index: usize,
    start: usize,
    end: usize,
}

struct AppState {
    // Input
    input: String,
    cursor_pos: usize,
    input_history: Vec<String>,
    history_pos: Option<usize>,

    // Chat
    store: ChatStore,
    pipeline: Pipeline,
    client: Option<Arc<dyn CompletionClient>>,
    schedule: RevealSchedule,
    event_tx: mpsc::UnboundedSender<TurnEvent>,

    // Interaction
    focus: Focus,
    /// Index of the hot message in the active conversation.
    hot: Option<usize>,
    confirm: Option<PendingConfirm>,
    notice: Option<String>,

    // Layout of the last frame, used for mouse hit-testing
    transcript_area: Rect,
    message_rows: Vec<MessageRows>,
    scroll_offset: usize,

    // Status
    status_text: String,
    endpoint: String,
    user_name: String,

    // Display
    should_quit: bool,
    show_sidebar: bool,
    theme: Theme,
}

impl AppState {
    fn new(
        settings: &Settings,
        theme_name: &str,
        event_tx: mpsc::UnboundedSender<TurnEvent>,
    ) -> Self {
        let store = ChatStore::load(settings.build_storage());
        let pipeline = Pipeline::new(settings.profile_hint(), settings.chat.cancel_stale_turns);

        let (client, notice) = match settings.build_completion_client() {
            Ok(client) => (Some(Arc::new(client) as Arc<dyn CompletionClient>), None),
            Err(e) => (
                None,
                Some(format!("Completion client not available: {e}")),
            ),
        };

        Self {
            input: String::new(),
            cursor_pos: 0,
            input_history: Vec::new(),
            history_pos: None,

            store,
            pipeline,
            client,
            schedule: settings.reveal_schedule(),
            event_tx,

            focus: Focus::Input,
            hot: None,
            confirm: None,
            notice,

            transcript_area: Rect::default(),
            message_rows: Vec::new(),
            scroll_offset: usize::MAX,

            status_text: "Ready".into(),
            endpoint: settings.completion.endpoint.clone(),
            user_name: settings
                .profile_hint()
                .as_ref()
                .and_then(|hint| hint.label())
                .unwrap_or(DEFAULT_USER_NAME)
                .to_string(),

            should_quit: false,
            show_sidebar: true,
            theme: Theme::by_name(theme_name),
        }
    }

    fn scroll_to_bottom(&mut self) {
        // Will be resolved on next draw
        self.scroll_offset = usize::MAX;
    }

    fn active_busy(&self) -> bool {
        self.store
            .active_id()
            .is_some_and(|id| self.pipeline.is_busy(id))
    }

    fn set_input(&mut self, text: String) {
        self.cursor_pos = text.len();
        self.input = text;
    }

    fn push_history(&mut self, input: String) {
        if !input.is_empty() && self.input_history.last() != Some(&input) {
            self.input_history.push(input);
        }
        self.history_pos = None;
    }

    fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            None => self.input_history.len().saturating_sub(1),
            Some(0) => 0,
            Some(p) => p - 1,
        };
        self.history_pos = Some(pos);
        self.set_input(self.input_history[pos].clone());
    }

    fn history_next(&mut self) {
        if let Some(pos) = self.history_pos {
            if pos + 1 >= self.input_history.len() {
                self.history_pos = None;
                self.set_input(String::new());
            } else {
                self.history_pos = Some(pos + 1);
                self.set_input(self.input_history[pos + 1].clone());
            }
        }
    }

    /// Indices of messages drawn in the transcript (placeholders are not).
    fn visible_indices(&self) -> Vec<usize> {
        self.store
            .active()
            .map(|c| {
                c.messages
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| !m.is_placeholder())
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn move_hot(&mut self, forward: bool) {
        let visible = self.visible_indices();
        if visible.is_empty() {
            self.hot = None;
            return;
        }
        let pos = self
            .hot
            .and_then(|h| visible.iter().position(|&i| i == h));
        let next = match (pos, forward) {
            (None, _) => visible.len() - 1,
            (Some(p), true) => (p + 1).min(visible.len() - 1),
            (Some(p), false) => p.saturating_sub(1),
        };
        self.hot = Some(visible[next]);
        self.scroll_hot_into_view();
    }

    fn scroll_hot_into_view(&mut self) {
        let Some(hot) = self.hot else { return };
        let Some(rows) = self.message_rows.iter().find(|r| r.index == hot) else {
            return;
        };
        let height = self.transcript_area.height.saturating_sub(2) as usize;
        if self.scroll_offset == usize::MAX || rows.start < self.scroll_offset {
            self.scroll_offset = rows.start;
        } else if rows.end > self.scroll_offset + height {
            self.scroll_offset = rows.end.saturating_sub(height);
        }
    }

    fn switch_to(&mut self, id: &str) -> bool {
        if !self.store.set_active(id) {
            return false;
        }
        self.hot = None;
        self.notice = None;
        self.scroll_to_bottom();
        true
    }

    fn new_conversation(&mut self) {
        self.store.create_conversation();
        self.hot = None;
        self.notice = None;
        self.focus = Focus::Input;
        self.status_text = "New conversation".into();
        self.scroll_to_bottom();
    }
}

pub async fn run_tui(settings: Settings, theme_name: &str) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<TurnEvent>();
    let mut state = AppState::new(&settings, theme_name, event_tx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        // Draw
        terminal.draw(|f| draw_ui(f, &mut state))?;

        // Process turn events (non-blocking)
        while let Ok(turn_event) = event_rx.try_recv() {
            handle_turn_event(&mut state, turn_event);
        }

        // Handle terminal input with timeout
        if event::poll(Duration::from_millis(33))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut state, key),
                Event::Mouse(mouse) => handle_mouse(&mut state, mouse),
                _ => {}
            }
        }

        if state.should_quit {
            let cancelled = state.pipeline.cancel_all(&mut state.store);
            if cancelled > 0 {
                tracing::debug!("Cancelled {cancelled} replies on exit");
            }
            break;
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    Ok(())
}

// ── Drawing ─────────────────────────────────────────────────────────────

fn draw_ui(f: &mut ratatui::Frame, state: &mut AppState) {
    let theme = state.theme.clone();

    let input_height = if state.confirm.is_some() { 4 } else { 3 };

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),               // chats + transcript
            Constraint::Length(input_height), // input (or confirmation)
            Constraint::Length(1),            // status
        ])
        .split(f.area());

    f.render_widget(
        Block::default().style(Style::default().bg(theme.bg)),
        f.area(),
    );

    let transcript_area = if state.show_sidebar {
        let h_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(40)])
            .split(main_chunks[0]);

        draw_sidebar(f, h_chunks[0], state, &theme);
        h_chunks[1]
    } else {
        main_chunks[0]
    };

    draw_transcript(f, transcript_area, state, &theme);

    if let Some(ref confirm) = state.confirm {
        draw_confirm(f, main_chunks[1], confirm, &theme);
    } else {
        draw_input(f, main_chunks[1], state, &theme);
    }

    draw_status_bar(f, main_chunks[2], state, &theme);
}

fn draw_sidebar(f: &mut ratatui::Frame, area: Rect, state: &AppState, theme: &Theme) {
    let width = area.width.saturating_sub(6) as usize;
    let active = state.store.active_id();

    let lines: Vec<Line> = state
        .store
        .conversations()
        .iter()
        .enumerate()
        .map(|(i, conv)| {
            let is_active = active == Some(conv.id.as_str());
            let marker = if state.pipeline.is_busy(&conv.id) { "…" } else { " " };
            let style = if is_active {
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.fg)
            };
            Line::from(vec![
                Span::styled(format!("{:>2} ", i + 1), Style::default().fg(theme.muted)),
                Span::styled(truncate(&conv.title, width), style),
                Span::styled(marker, Style::default().fg(theme.muted)),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Chats ")
        .border_style(Style::default().fg(theme.border));

    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .style(Style::default().fg(theme.fg)),
        area,
    );
}

fn draw_transcript(f: &mut ratatui::Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let width = area.width.saturating_sub(3) as usize;
    let typing = state.pipeline.is_typing(&state.store);
    let (lines, rows) = build_transcript_lines(
        state.store.active(),
        &state.user_name,
        state.hot,
        typing,
        state.notice.as_deref(),
        theme,
        width,
    );
    state.message_rows = rows;
    state.transcript_area = area;

    let total_lines = lines.len();
    let visible_height = area.height.saturating_sub(2) as usize;

    // Resolve scroll_to_bottom
    if state.scroll_offset == usize::MAX {
        state.scroll_offset = total_lines.saturating_sub(visible_height);
    }

    // Clamp scroll offset
    let max_scroll = total_lines.saturating_sub(visible_height);
    if state.scroll_offset > max_scroll {
        state.scroll_offset = max_scroll;
    }

    let title = state
        .store
        .active()
        .map(|c| format!(" {} ", c.title))
        .unwrap_or_else(|| " Pit Boss ".into());
    let border = if state.focus == Focus::Transcript {
        theme.border_focus
    } else {
        theme.border
    };

    let transcript = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(border)),
        )
        .scroll((state.scroll_offset as u16, 0));
    f.render_widget(transcript, area);

    // Scrollbar
    if total_lines > visible_height {
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(state.scroll_offset);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("^"))
                .end_symbol(Some("v")),
            area,
            &mut scrollbar_state,
        );
    }
}

/// Transcript lines, pre-wrapped to `width` so that every line is one screen
/// row, plus the rows each message occupies.
fn build_transcript_lines(
    conversation: Option<&Conversation>,
    user_name: &str,
    hot: Option<usize>,
    typing: bool,
    notice: Option<&str>,
    theme: &Theme,
    width: usize,
) -> (Vec<Line<'static>>, Vec<MessageRows>) {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut rows = Vec::new();
    let indent = "    ";
    let body_width = width.saturating_sub(indent.len());

    match conversation {
        None => lines.push(Line::from(Span::styled(
            "  No conversation selected. Type to start one, or /chats to pick one.",
            Style::default().fg(theme.muted),
        ))),
        Some(conv) if conv.messages.is_empty() && notice.is_none() => {
            lines.push(Line::from(Span::styled(
                format!("  Ask {ASSISTANT_NAME} anything. /help for commands."),
                Style::default().fg(theme.muted),
            )));
        }
        Some(_) => {}
    }

    if notice.is_none() && !conversation.is_some_and(Conversation::has_user_message) {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "  Suggested questions (press 1-4 in the transcript, or /ask n):",
            Style::default().fg(theme.muted),
        )));
        for row in commands::suggestion_list().lines() {
            lines.push(Line::from(Span::styled(
                row.to_string(),
                Style::default().fg(theme.accent),
            )));
        }
        lines.push(Line::raw(""));
    }

    for (i, msg) in conversation
        .map(|c| c.messages.as_slice())
        .unwrap_or_default()
        .iter()
        .enumerate()
    {
        if msg.is_placeholder() {
            continue;
        }
        let is_hot = hot == Some(i);
        let (author, color) = match msg.role {
            Role::User => (user_name, theme.user_color),
            Role::Assistant => (ASSISTANT_NAME, theme.assistant_color),
        };
        let failed = msg.role == Role::Assistant
            && (msg.content == SEND_FALLBACK || msg.content == REGENERATE_FALLBACK);

        let start = lines.len();
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}{:>3} ", if is_hot { "▸" } else { " " }, i + 1),
                Style::default().fg(if is_hot { theme.accent } else { theme.muted }),
            ),
            Span::styled(
                author.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", format_time(msg.created_at)),
                Style::default().fg(theme.muted),
            ),
        ]));

        // Replies get code-fence highlighting; user text is shown as typed.
        let detect_code = msg.role == Role::Assistant;
        let mut in_code_block = false;
        for raw_line in msg.content.lines() {
            let style = if detect_code && raw_line.starts_with("```") {
                in_code_block = !in_code_block;
                Style::default().fg(theme.muted)
            } else if in_code_block {
                Style::default().fg(theme.code_fg)
            } else if failed {
                Style::default().fg(theme.error)
            } else {
                Style::default().fg(theme.fg)
            };
            for row in wrap_text(raw_line, body_width) {
                lines.push(Line::from(vec![
                    Span::raw(indent),
                    Span::styled(row, style),
                ]));
            }
        }
        let end = lines.len();

        if is_hot {
            for line in &mut lines[start..end] {
                line.style = line.style.bg(theme.hot_bg);
            }
        }
        rows.push(MessageRows { index: i, start, end });
        lines.push(Line::raw(""));
    }

    if typing {
        lines.push(Line::from(Span::styled(
            format!("  {ASSISTANT_NAME} is typing…"),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::DIM),
        )));
    }

    if let Some(notice) = notice {
        lines.push(Line::raw(""));
        for raw_line in notice.lines() {
            for row in wrap_text(raw_line, width) {
                lines.push(Line::from(Span::styled(
                    row,
                    Style::default().fg(theme.notice_color),
                )));
            }
        }
    }

    (lines, rows)
}

fn draw_confirm(f: &mut ratatui::Frame, area: Rect, confirm: &PendingConfirm, theme: &Theme) {
    let text = vec![
        Line::from(Span::styled(
            format!(" {}", confirm.prompt),
            Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            " [y] Delete  [n] Keep ",
            Style::default().fg(theme.accent),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Confirm ")
        .border_style(Style::default().fg(theme.warning));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_input(f: &mut ratatui::Frame, area: Rect, state: &AppState, theme: &Theme) {
    let focused = state.focus == Focus::Input;
    let is_command = state.input.starts_with('/');

    let title = if is_command {
        " Command "
    } else if state.active_busy() {
        " Message (waiting for reply…) "
    } else {
        " Message  Enter to send "
    };

    let border = if is_command {
        theme.accent
    } else if focused {
        theme.border_focus
    } else {
        theme.border
    };

    let input = Paragraph::new(state.input.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(border)),
        )
        .style(Style::default().fg(if focused { theme.fg } else { theme.muted }))
        .wrap(Wrap { trim: false });
    f.render_widget(input, area);

    // Set cursor position in input area
    if focused {
        let column = state.input[..state.cursor_pos].chars().count() as u16;
        let cursor_x = area.x + column + 1;
        // Clamp cursor to area width
        let max_x = area.x + area.width.saturating_sub(2);
        f.set_cursor_position((cursor_x.min(max_x), area.y + 1));
    }
}

fn draw_status_bar(f: &mut ratatui::Frame, area: Rect, state: &AppState, theme: &Theme) {
    let focus_str = match state.focus {
        Focus::Input => "input",
        Focus::Transcript => "transcript  ↑↓ pick  c copy  e edit  r regen  d delete",
    };

    let status_spans = vec![
        Span::styled(
            " Pit Boss ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("| {} ", state.endpoint), Style::default().fg(theme.muted)),
        Span::styled(format!("| {focus_str} "), Style::default().fg(theme.accent)),
        Span::styled("| ", Style::default().fg(theme.muted)),
        Span::styled(state.status_text.as_str(), Style::default().fg(theme.muted)),
    ];
    let status = Paragraph::new(Line::from(status_spans));
    f.render_widget(status, area);
}

// ── Events ──────────────────────────────────────────────────────────────

fn handle_turn_event(state: &mut AppState, event: TurnEvent) {
    let failed = matches!(event, TurnEvent::Failed { .. });
    let finished = matches!(event, TurnEvent::Finished { .. });

    if !state.pipeline.apply(&mut state.store, event) {
        return;
    }
    if failed {
        state.status_text = "Reply failed".into();
    } else if finished && !state.pipeline.any_busy() {
        state.status_text = "Ready".into();
    }
    if state.focus == Focus::Input {
        state.scroll_to_bottom();
    }
}

fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    let area = state.transcript_area;
    let inside = mouse.column > area.x
        && mouse.column < area.x + area.width.saturating_sub(1)
        && mouse.row > area.y
        && mouse.row < area.y + area.height.saturating_sub(1);
    if !inside {
        return;
    }

    match mouse.kind {
        MouseEventKind::Moved => {
            let line = state.scroll_offset + (mouse.row - area.y - 1) as usize;
            state.hot = state
                .message_rows
                .iter()
                .find(|r| r.start <= line && line < r.end)
                .map(|r| r.index);
        }
        MouseEventKind::ScrollUp => {
            state.scroll_offset = state.scroll_offset.saturating_sub(3);
        }
        MouseEventKind::ScrollDown => {
            state.scroll_offset = state.scroll_offset.saturating_add(3);
        }
        _ => {}
    }
}

fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Global shortcuts first; the resolver knows about dialogs and focus.
    let action = {
        let messages = state
            .store
            .active()
            .map(|c| c.messages.as_slice())
            .unwrap_or_default();
        let hot = state
            .hot
            .and_then(|i| messages.get(i).map(|m| HotMessage::from_message(i, m)));
        let ctx = InteractionContext {
            dialog_open: state.confirm.is_some(),
            focus_in_editable: state.focus == Focus::Input,
            hot: hot.as_ref(),
            messages,
        };
        interaction::resolve(to_chord(&key), &ctx)
    };
    if let Some(action) = action {
        perform_action(state, action);
        return;
    }

    if state.confirm.is_some() {
        handle_confirm_key(state, key);
        return;
    }

    match (key.modifiers, key.code) {
        // Cancel, then quit
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            let active = state.store.active_id().map(str::to_string);
            match active {
                Some(id) if state.pipeline.is_busy(&id) => {
                    state.pipeline.cancel(&mut state.store, &id);
                    state.status_text = "Cancelled".into();
                }
                _ => state.should_quit = true,
            }
        }

        // New conversation
        (KeyModifiers::CONTROL, KeyCode::Char('n')) => state.new_conversation(),

        // Toggle chat list
        (KeyModifiers::CONTROL, KeyCode::Char('b')) => {
            state.show_sidebar = !state.show_sidebar;
        }

        (_, KeyCode::Esc) => {
            if state.focus == Focus::Transcript {
                state.notice = None;
            } else {
                state.focus = Focus::Transcript;
                if state.hot.is_none() {
                    state.move_hot(false);
                }
            }
        }

        // Scroll
        (_, KeyCode::PageUp) => {
            state.scroll_offset = state.scroll_offset.saturating_sub(20);
        }
        (_, KeyCode::PageDown) => {
            state.scroll_offset = state.scroll_offset.saturating_add(20);
        }

        _ => match state.focus {
            Focus::Input => handle_input_key(state, key),
            Focus::Transcript => handle_transcript_key(state, key),
        },
    }
}

fn handle_transcript_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Up => state.move_hot(false),
        KeyCode::Down => state.move_hot(true),
        KeyCode::Tab | KeyCode::Enter | KeyCode::Char('i') => state.focus = Focus::Input,
        KeyCode::Delete | KeyCode::Char('d') => {
            if let Some(index) = state.hot {
                ask_delete_message(state, index);
            }
        }
        KeyCode::Char(c @ '1'..='9') => {
            let fresh = !state
                .store
                .active()
                .is_some_and(Conversation::has_user_message);
            let n = c as usize - '0' as usize;
            if let Some(prompt) = SUGGESTED_PROMPTS.get(n - 1).filter(|_| fresh) {
                send_text(state, prompt);
            }
        }
        _ => {}
    }
}

fn handle_input_key(state: &mut AppState, key: KeyEvent) {
    match (key.modifiers, key.code) {
        // Submit input
        (_, KeyCode::Enter) => submit(state),

        // Input editing
        (_, KeyCode::Backspace) => {
            if let Some(c) = state.input[..state.cursor_pos].chars().next_back() {
                state.cursor_pos -= c.len_utf8();
                state.input.remove(state.cursor_pos);
            }
        }
        (_, KeyCode::Delete) => {
            if state.cursor_pos < state.input.len() {
                state.input.remove(state.cursor_pos);
            }
        }
        (_, KeyCode::Left) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                // Word jump left
                state.cursor_pos = word_boundary_left(&state.input, state.cursor_pos);
            } else if let Some(c) = state.input[..state.cursor_pos].chars().next_back() {
                state.cursor_pos -= c.len_utf8();
            }
        }
        (_, KeyCode::Right) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                // Word jump right
                state.cursor_pos = word_boundary_right(&state.input, state.cursor_pos);
            } else if let Some(c) = state.input[state.cursor_pos..].chars().next() {
                state.cursor_pos += c.len_utf8();
            }
        }
        (KeyModifiers::CONTROL, KeyCode::Char('a')) | (_, KeyCode::Home) => {
            state.cursor_pos = 0;
        }
        (KeyModifiers::CONTROL, KeyCode::Char('e')) | (_, KeyCode::End) => {
            state.cursor_pos = state.input.len();
        }

        // History navigation
        (_, KeyCode::Up) => state.history_prev(),
        (_, KeyCode::Down) => state.history_next(),

        // Kill line (Ctrl+U)
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
            state.input.drain(..state.cursor_pos);
            state.cursor_pos = 0;
        }

        // Delete word backward (Ctrl+W)
        (KeyModifiers::CONTROL, KeyCode::Char('w')) => {
            let new_pos = word_boundary_left(&state.input, state.cursor_pos);
            state.input.drain(new_pos..state.cursor_pos);
            state.cursor_pos = new_pos;
        }

        // Clipboard paste (Ctrl+V)
        (KeyModifiers::CONTROL, KeyCode::Char('v')) => {
            if let Ok(mut cb) = arboard::Clipboard::new() {
                if let Ok(text) = cb.get_text() {
                    let text = text.replace('\r', ""); // strip CR
                    state.input.insert_str(state.cursor_pos, &text);
                    state.cursor_pos += text.len();
                }
            }
        }

        // Tab completes commands, otherwise moves to the transcript
        (_, KeyCode::Tab) => {
            if state.input.starts_with('/') {
                if let Some(completion) = commands::complete_command(&state.input) {
                    state.set_input(completion);
                }
            } else {
                state.focus = Focus::Transcript;
            }
        }

        // Regular character input
        (m, KeyCode::Char(c)) if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            state.input.insert(state.cursor_pos, c);
            state.cursor_pos += c.len_utf8();
        }

        _ => {}
    }
}

fn handle_confirm_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            if let Some(confirm) = state.confirm.take() {
                run_confirmed(state, confirm.action);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.confirm = None;
            state.status_text = "Kept".into();
        }
        _ => {}
    }
}

fn run_confirmed(state: &mut AppState, action: ConfirmAction) {
    match action {
        ConfirmAction::DeleteConversation { id } => {
            if state.pipeline.delete_conversation(&mut state.store, &id) {
                state.status_text = "Conversation deleted".into();
            }
        }
        ConfirmAction::DeleteMessage {
            conversation_id,
            message_id,
        } => {
            if state
                .pipeline
                .delete_message(&mut state.store, &conversation_id, &message_id)
            {
                state.status_text = "Message deleted".into();
            }
        }
    }
    state.hot = None;
    state.scroll_to_bottom();
}

fn perform_action(state: &mut AppState, action: Action) {
    tracing::debug!("Shortcut: {}", action.label());
    match action {
        Action::FocusInput => state.focus = Focus::Input,
        Action::Copy(text) => {
            state.status_text = match copy_to_clipboard(text) {
                Ok(()) => "Copied message".into(),
                Err(e) => format!("Clipboard unavailable: {e}"),
            };
        }
        Action::EditAndResend(text) => {
            state.set_input(text);
            state.focus = Focus::Input;
            state.status_text = "Editing message".into();
        }
        Action::Regenerate { user_index } => start_regenerate(state, user_index),
    }
}

fn copy_to_clipboard(text: String) -> std::result::Result<(), arboard::Error> {
    let mut cb = arboard::Clipboard::new()?;
    cb.set_text(text)
}

// ── Turns ───────────────────────────────────────────────────────────────

fn submit(state: &mut AppState) {
    if state.input.trim().is_empty() {
        return;
    }
    let input = state.input.clone();

    // Handle slash commands
    if input.starts_with('/') {
        state.set_input(String::new());
        state.push_history(input.clone());
        handle_command_result(state, commands::handle_command(&input));
        return;
    }

    if send_text(state, &input) {
        state.set_input(String::new());
        state.push_history(input);
    }
}

/// Start a turn for `text` in the active conversation. Typed input and
/// suggested questions both come through here.
fn send_text(state: &mut AppState, text: &str) -> bool {
    if state.active_busy() {
        state.status_text = "Still replying. Ctrl+C cancels.".into();
        return false;
    }
    let Some(client) = state.client.clone() else {
        state.status_text = "No completion client".into();
        return false;
    };

    let Some(request) = state.pipeline.send(&mut state.store, text) else {
        return false;
    };
    spawn_turn(client, request, state.schedule, state.event_tx.clone());
    state.notice = None;
    state.hot = None;
    state.focus = Focus::Input;
    state.status_text = format!("Waiting for {ASSISTANT_NAME}…");
    state.scroll_to_bottom();
    true
}

fn start_regenerate(state: &mut AppState, user_index: usize) {
    let Some(client) = state.client.clone() else {
        state.status_text = "No completion client".into();
        return;
    };

    match state.pipeline.regenerate_from(&mut state.store, user_index) {
        Ok(request) => {
            spawn_turn(client, request, state.schedule, state.event_tx.clone());
            state.hot = None;
            state.status_text = "Regenerating…".into();
            state.scroll_to_bottom();
        }
        Err(e) => state.status_text = e.to_string(),
    }
}

fn ask_delete_message(state: &mut AppState, index: usize) {
    let Some(conv) = state.store.active() else {
        return;
    };
    let Some(msg) = conv.messages.get(index) else {
        state.notice = Some(format!("No message {}", index + 1));
        return;
    };
    state.confirm = Some(PendingConfirm {
        prompt: format!("Delete message {}? \"{}\"", index + 1, truncate(&msg.content, 40)),
        action: ConfirmAction::DeleteMessage {
            conversation_id: conv.id.clone(),
            message_id: msg.id.clone(),
        },
    });
}

fn handle_command_result(state: &mut AppState, result: CommandResult) {
    match result {
        CommandResult::Message(msg) => state.notice = Some(msg),
        CommandResult::Quit => state.should_quit = true,
        CommandResult::NewConversation => state.new_conversation(),
        CommandResult::ListConversations => {
            let all: Vec<&Conversation> = state.store.conversations().iter().collect();
            state.notice = Some(list_conversations(state, &all, "Conversations"));
        }
        CommandResult::SearchConversations(query) => {
            let hits = state.store.search(&query);
            state.notice = Some(if hits.is_empty() {
                format!("No conversation titles match \"{query}\".")
            } else {
                list_conversations(state, &hits, &format!("Matching \"{query}\""))
            });
        }
        CommandResult::OpenConversation(arg) => {
            let target = match arg.parse::<usize>() {
                Ok(n) if n >= 1 => state.store.conversations().get(n - 1),
                _ => state
                    .store
                    .conversations()
                    .iter()
                    .find(|c| c.id.starts_with(&arg)),
            }
            .map(|c| c.id.clone());
            match target {
                Some(id) => {
                    state.switch_to(&id);
                    state.status_text = "Switched conversation".into();
                }
                None => state.notice = Some(format!("No conversation matching '{arg}'.")),
            }
        }
        CommandResult::RenameConversation(title) => {
            let renamed = state
                .store
                .active_id()
                .map(str::to_string)
                .is_some_and(|id| state.store.rename_conversation(&id, &title));
            state.status_text = if renamed {
                "Renamed".into()
            } else {
                "Nothing to rename".into()
            };
        }
        CommandResult::DeleteConversation => {
            if let Some(conv) = state.store.active() {
                state.confirm = Some(PendingConfirm {
                    prompt: format!("Delete conversation \"{}\"?", conv.title),
                    action: ConfirmAction::DeleteConversation {
                        id: conv.id.clone(),
                    },
                });
            }
        }
        CommandResult::DeleteMessage(n) => ask_delete_message(state, n - 1),
        CommandResult::Regenerate(n) => {
            let Some(conv) = state.store.active() else {
                return;
            };
            let target = match n {
                None => conv.messages.iter().rposition(|m| m.role == Role::User),
                Some(n) => match conv.messages.get(n - 1).map(|m| m.role) {
                    Some(Role::User) => Some(n - 1),
                    Some(Role::Assistant) => conv.preceding_user_index(n - 1),
                    None => None,
                },
            };
            match target {
                Some(user_index) => start_regenerate(state, user_index),
                None => state.notice = Some("Nothing to regenerate.".into()),
            }
        }
        CommandResult::EditMessage(n) => match Pipeline::edit_and_resend(&state.store, n - 1) {
            Some(text) => {
                state.set_input(text);
                state.status_text = "Editing message".into();
            }
            None => state.notice = Some(format!("Message {n} is not one of yours.")),
        },
        CommandResult::Ask(prompt) => {
            send_text(state, prompt);
        }
        CommandResult::Cancel => {
            let active = state.store.active_id().map(str::to_string);
            let cancelled = active.is_some_and(|id| state.pipeline.cancel(&mut state.store, &id));
            state.status_text = if cancelled {
                "Cancelled".into()
            } else {
                "Nothing to cancel".into()
            };
        }
        CommandResult::Export(path) => {
            let Some(conv) = state.store.active() else {
                state.notice = Some("No conversation to export.".into());
                return;
            };
            let html = markdown::render_document(conv, ASSISTANT_NAME);
            state.status_text = match std::fs::write(&path, html) {
                Ok(()) => format!("Exported to {}", path.display()),
                Err(e) => format!("Export failed: {e}"),
            };
        }
        CommandResult::ThemeChanged(name) => {
            if Theme::exists(&name) {
                state.theme = Theme::by_name(&name);
                state.status_text = format!("Theme: {name}");
            } else {
                let themes = Theme::all_names().join(", ");
                state.notice = Some(format!("Unknown theme '{name}'. Available: {themes}"));
            }
        }
        CommandResult::NotACommand => {}
    }
}

/// Numbered listing; numbers are positions in the full chat list, as
/// accepted by `/open`.
fn list_conversations(state: &AppState, convs: &[&Conversation], heading: &str) -> String {
    let mut out = format!("{heading}:\n");
    for conv in convs {
        let n = state
            .store
            .conversations()
            .iter()
            .position(|c| c.id == conv.id)
            .map(|p| p + 1)
            .unwrap_or(0);
        let marker = if state.store.active_id() == Some(conv.id.as_str()) {
            "*"
        } else {
            " "
        };
        out.push_str(&format!(
            " {marker}{n:>3}  {}  ({} messages)\n",
            conv.title,
            conv.messages.len()
        ));
    }
    out
}

// ── Helper functions ────────────────────────────────────────────────────

fn word_boundary_left(s: &str, pos: usize) -> usize {
    if pos == 0 {
        return 0;
    }
    let bytes = s.as_bytes();
    let mut i = pos - 1;
    // Skip whitespace
    while i > 0 && bytes[i] == b' ' {
        i -= 1;
    }
    // Skip word characters
    while i > 0 && bytes[i] != b' ' {
        i -= 1;
    }
    if bytes[i] == b' ' && i > 0 {
        i + 1
    } else {
        i
    }
}

fn word_boundary_right(s: &str, pos: usize) -> usize {
    let len = s.len();
    if pos >= len {
        return len;
    }
    let bytes = s.as_bytes();
    let mut i = pos;
    // Skip current word
    while i < len && bytes[i] != b' ' {
        i += 1;
    }
    // Skip whitespace
    while i < len && bytes[i] == b' ' {
        i += 1;
    }
    i
}

/// Hard-wrap one line into rows of at most `width` characters.
fn wrap_text(line: &str, width: usize) -> Vec<String> {
    if width == 0 || line.chars().count() <= width {
        return vec![line.to_string()];
    }
    let chars: Vec<char> = line.chars().collect();
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn format_time(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_text("", 4), vec![""]);
        assert_eq!(wrap_text("ééééé", 2), vec!["éé", "éé", "é"]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }

    #[test]
    fn test_word_boundaries() {
        let s = "stake the chips";
        assert_eq!(word_boundary_left(s, s.len()), 10);
        assert_eq!(word_boundary_right(s, 0), 6);
    }

    #[test]
    fn test_transcript_rows_skip_placeholders() {
        let mut conv = Conversation::new();
        conv.messages.push(pitboss_core::Message::user("hi"));
        conv.messages.push(pitboss_core::Message::assistant("hello\nthere"));
        conv.messages.push(pitboss_core::Message::assistant(""));

        let theme = Theme::dark();
        let (lines, rows) =
            build_transcript_lines(Some(&conv), "Sam", Some(1), true, None, &theme, 40);

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].index, rows[0].start, rows[0].end), (0, 0, 2));
        assert_eq!((rows[1].index, rows[1].start, rows[1].end), (1, 3, 6));
        // Two messages with a blank line after each, plus the typing line.
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[3].style.bg, Some(theme.hot_bg));
        assert_eq!(lines[0].spans[1].content, "Sam");
        assert_eq!(lines[3].spans[1].content, ASSISTANT_NAME);
    }

    #[test]
    fn test_empty_conversation_offers_suggestions() {
        let conv = Conversation::new();
        let theme = Theme::dark();
        let (lines, rows) =
            build_transcript_lines(Some(&conv), DEFAULT_USER_NAME, None, false, None, &theme, 80);

        assert!(rows.is_empty());
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert!(text.iter().any(|l| l == "  1. What is the Digital Asset Agreement?"));
        assert!(text.iter().any(|l| l.starts_with("  2. How is my ownership") && l.ends_with('…')));
    }

    #[test]
    fn test_suggestions_hidden_after_first_question() {
        let mut conv = Conversation::new();
        conv.messages.push(pitboss_core::Message::user("hi"));
        let theme = Theme::dark();
        let (lines, _) =
            build_transcript_lines(Some(&conv), DEFAULT_USER_NAME, None, false, None, &theme, 80);

        assert!(!lines.iter().any(|l| l.to_string().contains("Digital Asset")));
    }

    #[test]
    fn test_failed_reply_uses_error_color() {
        let mut conv = Conversation::new();
        conv.messages.push(pitboss_core::Message::user("hi"));
        conv.messages.push(pitboss_core::Message::assistant(SEND_FALLBACK));
        let theme = Theme::dark();
        let (lines, rows) =
            build_transcript_lines(Some(&conv), DEFAULT_USER_NAME, None, false, None, &theme, 120);

        let body = &lines[rows[1].start + 1];
        assert_eq!(body.spans[1].style.fg, Some(theme.error));
    }
}
