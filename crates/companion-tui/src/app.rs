use std::path::PathBuf;
use anyhow::{Result, anyhow};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use companion_core::{split_response, Config, GroqClient, Role, Session};

/// Shown in the sidebar under "Model Capabilities"
pub const CAPABILITIES: [&str; 4] = [
    "Python Expert",
    "Debugging Assistant",
    "Code Documentation",
    "Solution Design",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Chat input
    pub query_input: String,
    pub query_cursor: usize, // cursor position in query_input, in chars

    // Conversation
    pub session: Session,
    pub show_thinking: bool,

    // In-flight response
    pub streaming: bool,
    pub stream_buffer: String,
    pub status: Option<String>,

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of the chat area, set during render
    pub chat_width: u16,  // Inner width of the chat area, set during render
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Model picker state
    pub show_model_picker: bool,
    pub available_models: Vec<String>,
    pub model_picker_state: ListState,

    // API key input state
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_input_cursor: usize,

    // Provider
    pub config: Config,
    pub config_path: Option<PathBuf>, // None when there is no config directory
    pub client: Option<GroqClient>,
    pub selected_model: String,
    pub temperature: f32,
}

impl App {
    pub fn new(config: Config, model_override: Option<String>) -> Self {
        let client = config
            .api_key()
            .map(|key| GroqClient::with_base_url(&key, &config.base_url()));
        let selected_model = model_override.unwrap_or_else(|| config.model());
        let temperature = config.temperature();
        let config_path = Config::get_config_path().ok();

        tracing::info!(
            model = %selected_model,
            key_source = config.key_source().unwrap_or("none"),
            "app initialized"
        );

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            query_input: String::new(),
            query_cursor: 0,

            session: Session::new(),
            show_thinking: false,

            streaming: false,
            stream_buffer: String::new(),
            status: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,

            animation_frame: 0,

            show_model_picker: false,
            available_models: GroqClient::list_models(),
            model_picker_state: ListState::default(),

            show_api_key_input: false,
            api_key_input: String::new(),
            api_key_input_cursor: 0,

            config,
            config_path,
            client,
            selected_model,
            temperature,
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.streaming {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Mark a request as in flight and clear the display buffer
    pub fn begin_response(&mut self) {
        self.streaming = true;
        self.stream_buffer.clear();
        self.status = None;
        self.animation_frame = 0;
        self.scroll_chat_to_bottom();
    }

    pub fn append_chunk(&mut self, chunk: &str) {
        if !self.streaming {
            return;
        }
        self.stream_buffer.push_str(chunk);
        self.scroll_chat_to_bottom();
    }

    /// Split the finished response and record it in the session
    pub fn finish_response(&mut self, full_response: &str) {
        let parsed = split_response(full_response);
        tracing::debug!(
            thinking_chars = parsed.thinking.len(),
            answer_chars = parsed.answer.len(),
            "response parsed"
        );

        let thinking = parsed.thinking_opt();
        self.session.push_assistant(parsed.answer, thinking);
        self.streaming = false;
        self.stream_buffer.clear();
        self.scroll_chat_to_bottom();
    }

    /// The request failed. Nothing is added to the session.
    pub fn fail_response(&mut self, error: &str) {
        tracing::error!(error, "completion failed");
        self.streaming = false;
        self.stream_buffer.clear();
        self.status = Some(format!("Error: {}", error));
    }

    pub fn toggle_thinking(&mut self) {
        self.show_thinking = !self.show_thinking;
        self.clamp_chat_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
        self.clamp_chat_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn half_page(&self) -> u16 {
        (self.visible_height() / 2).max(1)
    }

    fn wrap_width(&self) -> usize {
        // Default to 50 until the first render reports the real width
        if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        }
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    fn wrapped_lines(&self, text: &str) -> u16 {
        let wrap_width = self.wrap_width();
        let mut total: u16 = 0;
        for line in text.lines() {
            // Character count, not byte length, for UTF-8 text
            let char_count = line.chars().count();
            total = total.saturating_add((char_count / wrap_width + 1) as u16);
        }
        total.max(1)
    }

    /// Estimated number of rendered lines in the chat view
    pub fn chat_line_count(&self) -> u16 {
        let mut total: u16 = 0;

        for msg in self.session.messages() {
            if let Some(thinking) = &msg.thinking {
                total = total.saturating_add(1); // Thinking header
                if self.show_thinking {
                    total = total.saturating_add(self.wrapped_lines(thinking));
                }
            }
            total = total.saturating_add(1); // Role line
            total = total.saturating_add(self.wrapped_lines(&msg.content));
            total = total.saturating_add(1); // Blank line after message
        }

        if self.streaming {
            total = total.saturating_add(1);
            total = if self.stream_buffer.is_empty() {
                total.saturating_add(1) // "Thinking..."
            } else {
                total.saturating_add(self.wrapped_lines(&self.stream_buffer))
            };
        }

        total
    }

    fn max_scroll(&self) -> u16 {
        self.chat_line_count().saturating_sub(self.visible_height())
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    fn clamp_chat_scroll(&mut self) {
        self.chat_scroll = self.chat_scroll.min(self.max_scroll());
    }

    pub fn exchanges(&self) -> usize {
        self.session.count_role(Role::User)
    }

    // Model picker methods
    pub fn open_model_picker(&mut self) {
        let current_idx = self
            .available_models
            .iter()
            .position(|m| *m == self.selected_model)
            .unwrap_or(0);
        self.model_picker_state.select(Some(current_idx));
        self.show_model_picker = true;
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = self.available_models.len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some(i) = self.model_picker_state.selected() {
            if let Some(model) = self.available_models.get(i) {
                self.selected_model = model.clone();
                self.show_model_picker = false;
                tracing::info!(model = %self.selected_model, "model selected");
                if let Err(e) = self.save_default_model() {
                    tracing::warn!(error = %e, "failed to save default model");
                }
            }
        }
    }

    // API key prompt
    pub fn open_api_key_input(&mut self) {
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
        self.show_api_key_input = true;
    }

    pub fn close_api_key_input(&mut self) {
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
        self.show_api_key_input = false;
    }

    /// Use `key` for this session and remember it in the config file
    pub fn set_api_key(&mut self, key: &str) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }

        self.client = Some(GroqClient::with_base_url(key, &self.config.base_url()));
        self.config.groq_api_key = Some(key.to_string());
        self.status = None;

        if let Err(e) = self.save_api_key(key) {
            tracing::warn!(error = %e, "failed to save API key");
            self.status = Some(format!("Key set for this session only: {}", e));
        }
    }

    fn save_default_model(&self) -> Result<()> {
        Config::save_default_model_to(self.existing_config_path()?, &self.selected_model)
    }

    fn save_api_key(&self, key: &str) -> Result<()> {
        Config::save_api_key_to(self.existing_config_path()?, key)
    }

    fn existing_config_path(&self) -> Result<&PathBuf> {
        self.config_path
            .as_ref()
            .ok_or_else(|| anyhow!("Could not determine config directory"))
    }

    /// Where the API key came from, for the sidebar
    pub fn key_source(&self) -> Option<&'static str> {
        if self.client.is_none() {
            None
        } else {
            self.config.key_source()
        }
    }
}
