use std::sync::Arc;

use modelbot_core::{ChatSession, Completion, Provider, RemoteError};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::tui::AppEvent;

pub struct App {
    pub should_quit: bool,
    pub session: ChatSession,

    // Collaborator
    pub backend: Arc<dyn Completion>,
    pub provider: Provider,
    pub model: String,
    replies: UnboundedSender<AppEvent>,
    pub reply_task: Option<JoinHandle<()>>,

    // Input editing
    pub cursor: usize, // cursor position in chars

    // Chat pane
    pub scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub chat_area: Option<Rect>,

    // Animation frame for "Thinking..." indicator (0-2)
    pub animation_frame: u8,
}

impl App {
    pub fn new(
        backend: Arc<dyn Completion>,
        provider: Provider,
        model: String,
        replies: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            session: ChatSession::new(),
            backend,
            provider,
            model,
            replies,
            reply_task: None,
            cursor: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            animation_frame: 0,
        }
    }

    /// Start a send cycle. The reply comes back through the event channel
    /// as `AppEvent::Reply`.
    pub fn submit(&mut self) {
        let Some(message) = self.session.begin_send() else {
            return;
        };
        info!(provider = %self.provider, chars = message.chars().count(), "sending message");

        let backend = Arc::clone(&self.backend);
        let replies = self.replies.clone();
        self.reply_task = Some(tokio::spawn(async move {
            // Run the call on its own task so a panic settles as an error
            let result = tokio::spawn(async move { backend.complete(&message).await })
                .await
                .map_err(RemoteError::from)
                .and_then(|reply| reply);
            if replies.send(AppEvent::Reply(result)).is_err() {
                debug!("reply dropped, event loop has already exited");
            }
        }));

        self.animation_frame = 0;
        self.scroll_to_bottom();
    }

    pub fn receive_reply(&mut self, result: Result<String, RemoteError>) {
        self.reply_task = None;
        self.session.settle(result);
        self.cursor = 0;
        self.scroll_to_bottom();
    }

    pub fn clear_chat(&mut self) {
        self.session.clear();
        self.scroll = 0;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Scroll chat to bottom so the newest message is visible
    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.total_chat_lines().saturating_sub(visible_height)
    }

    /// Rendered height of the transcript at the current wrap width
    fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.session.labeled() {
            total_lines = total_lines.saturating_add(1); // Label line ("You:" or "Assistant:")
            for line in msg.message.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 {
                    1
                } else {
                    (char_count / wrap_width) + 1
                };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.session.is_pending() {
            total_lines = total_lines.saturating_add(2); // "Assistant:" + "Thinking..."
        }

        total_lines
    }
}
