use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod buffer;
mod commands;
mod config;
mod error;
mod file_io;
mod persistence;
mod platform;
mod session;
mod state;
mod stats;
mod store;

use buffer::TextBuffer;
use commands::Command;
use config::Config;
use error::Result;
use persistence::PersistenceManager;
use session::{Notification, Session};
use state::Theme;
use stats::{compute_stats, evaluate_limit, group_thousands};
use store::JsonFileStore;
use platform::TerminalPlatform;

const TAB_SIZE: usize = 4;

// Foreground/background pair for each theme
fn theme_colors(theme: Theme) -> (Color, Color) {
    match theme {
        Theme::White => (
            Color::Rgb { r: 34, g: 34, b: 34 },
            Color::Rgb { r: 255, g: 255, b: 255 },
        ),
        Theme::Dark => (
            Color::Rgb { r: 224, g: 224, b: 224 },
            Color::Rgb { r: 26, g: 26, b: 26 },
        ),
        Theme::Coffee => (
            Color::Rgb { r: 74, g: 55, b: 40 },
            Color::Rgb { r: 245, g: 236, b: 220 },
        ),
    }
}

// Main editor struct - the terminal front end around one Session
struct Editor {
    buffer: TextBuffer,
    offset_y: usize,
    offset_x: usize,
    terminal_height: u16,
    terminal_width: u16,
    dirty: bool,
    session: Session<JsonFileStore>,
    platform: TerminalPlatform,
    autosave_interval: Duration,
    last_autosave: Instant,
    panel_visible: bool,
}

impl Editor {
    fn new(config: &Config, force_fallback: bool) -> io::Result<Self> {
        let (width, height) = terminal::size()?;

        let store = JsonFileStore::new(config.store_path());
        let session = Session::start(PersistenceManager::new(store));
        let buffer = TextBuffer::from_text(&session.state().text);
        let platform = TerminalPlatform::new(config.file_handles && !force_fallback, config.downloads_dir());

        Ok(Editor {
            buffer,
            offset_y: 0,
            offset_x: 0,
            terminal_height: height,
            terminal_width: width,
            dirty: true,
            session,
            platform,
            autosave_interval: Duration::from_secs(config.autosave_interval_seconds.max(1)),
            last_autosave: Instant::now(),
            panel_visible: false,
        })
    }

    fn run(&mut self) -> io::Result<()> {
        self.enter_raw_mode()?;

        loop {
            // Autosave runs whether or not anything changed
            if self.last_autosave.elapsed() >= self.autosave_interval {
                self.last_autosave = Instant::now();
                let result = self.session.dispatch(Command::Autosave);
                self.report(result)?;
            }

            // The stats panel fades out on its own; redraw when it flips
            let visible = self.session.acknowledgment_visible(Instant::now());
            if visible != self.panel_visible {
                self.panel_visible = visible;
                self.dirty = true;
            }

            self.render()?;

            // Poll for events with 16ms timeout (roughly 60 FPS)
            if event::poll(Duration::from_millis(16))? {
                match event::read()? {
                    Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                        if self.handle_key_event(key_event)? {
                            break;
                        }
                    }
                    Event::Resize(width, height) => {
                        self.terminal_width = width;
                        self.terminal_height = height;
                        self.dirty = true;
                    }
                    _ => {}
                }
            }
        }

        // Write the final snapshot before leaving
        let result = self.session.dispatch(Command::Autosave);
        self.report(result)?;

        self.leave_raw_mode()
    }

    fn enter_raw_mode(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            DisableLineWrap,
            Hide,
            Clear(ClearType::All)
        )?;
        self.dirty = true;
        Ok(())
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        leave_terminal()
    }

    // Returns Ok(true) when the user asked to quit
    fn handle_key_event(&mut self, key_event: KeyEvent) -> io::Result<bool> {
        if key_event.modifiers.contains(KeyModifiers::CONTROL) {
            match key_event.code {
                KeyCode::Char('q') => return Ok(true),
                KeyCode::Char('s') => {
                    let result = self.session.save_file(&mut self.platform);
                    self.report(result)?;
                }
                KeyCode::Char('o') => {
                    let result = self.session.open_file(&mut self.platform);
                    self.report(result)?;
                    self.reload_buffer();
                }
                KeyCode::Char('n') => {
                    let result = self.session.new_document(&mut self.platform);
                    self.report(result)?;
                    self.reload_buffer();
                }
                KeyCode::Char('t') => {
                    let theme = self.session.state().theme.next();
                    let result = self.session.dispatch(Command::SetTheme(theme));
                    self.report(result)?;
                }
                KeyCode::Char('f') => {
                    let font = self.session.state().font.next();
                    let result = self.session.dispatch(Command::SetFont(font));
                    self.report(result)?;
                }
                KeyCode::Char('l') => {
                    let result = self.session.dispatch(Command::ToggleLimit);
                    self.report(result)?;
                }
                KeyCode::Char('w') => {
                    let current = self.session.state().limit.to_string();
                    if let Some(input) = self.platform.read_line("Word limit:", &current)? {
                        let result = self.session.dispatch(Command::SetLimit(input));
                        self.report(result)?;
                    }
                }
                _ => {}
            }
            self.dirty = true;
            return Ok(false);
        }

        let page_size = self.text_rows();
        let changed = match key_event.code {
            KeyCode::Left => {
                self.buffer.move_left();
                false
            }
            KeyCode::Right => {
                self.buffer.move_right();
                false
            }
            KeyCode::Up => {
                self.buffer.move_up();
                false
            }
            KeyCode::Down => {
                self.buffer.move_down();
                false
            }
            KeyCode::Home => {
                self.buffer.move_home();
                false
            }
            KeyCode::End => {
                self.buffer.move_end();
                false
            }
            KeyCode::PageUp => {
                self.buffer.page_up(page_size);
                false
            }
            KeyCode::PageDown => {
                self.buffer.page_down(page_size);
                false
            }
            KeyCode::Backspace => self.buffer.backspace(),
            KeyCode::Delete => self.buffer.delete(),
            KeyCode::Enter => {
                self.buffer.insert_newline();
                true
            }
            KeyCode::Tab => {
                self.buffer.insert_tab(TAB_SIZE);
                true
            }
            KeyCode::Char(c) if !key_event.modifiers.contains(KeyModifiers::ALT) => {
                self.buffer.insert_char(c);
                true
            }
            _ => false,
        };

        if changed {
            let result = self.session.dispatch(Command::EditText(self.buffer.to_text()));
            self.report(result)?;
        }
        self.dirty = true;
        Ok(false)
    }

    // File operations may replace the document wholesale
    fn reload_buffer(&mut self) {
        if self.buffer.to_text() != self.session.state().text {
            self.buffer = TextBuffer::from_text(&self.session.state().text);
            self.offset_x = 0;
            self.offset_y = 0;
        }
    }

    // Shows pending alerts, and a store failure if there was one
    fn report(&mut self, result: Result<()>) -> io::Result<()> {
        if let Err(e) = result {
            tracing::error!(error = %e, "could not persist document");
            self.platform.alert(&format!("Could not store document: {}", e))?;
        }
        for notification in self.session.take_notifications() {
            match notification {
                Notification::Alert(message) => self.platform.alert(&message)?,
            }
        }
        self.dirty = true;
        Ok(())
    }

    fn text_rows(&self) -> usize {
        self.terminal_height.saturating_sub(2).max(1) as usize
    }

    fn update_offset(&mut self) {
        let visible_height = self.text_rows();

        // Vertical scrolling
        if self.buffer.cursor_y < self.offset_y {
            self.offset_y = self.buffer.cursor_y;
        } else if self.buffer.cursor_y >= self.offset_y + visible_height {
            self.offset_y = self.buffer.cursor_y - visible_height + 1;
        }

        // Horizontal scrolling
        let visible_width = self.terminal_width.max(1) as usize;
        if self.buffer.cursor_x < self.offset_x {
            self.offset_x = self.buffer.cursor_x;
        } else if self.buffer.cursor_x >= self.offset_x + visible_width {
            self.offset_x = self.buffer.cursor_x - visible_width + 1;
        }
    }

    fn render(&mut self) -> io::Result<()> {
        if !self.dirty {
            return Ok(());
        }

        self.update_offset();

        let mut stdout = io::stdout();
        let visible_height = self.text_rows();
        let (fg, bg) = theme_colors(self.session.state().theme);
        let over_limit = self.session.display().warning_active();

        execute!(stdout, Hide, SetForegroundColor(fg), SetBackgroundColor(bg))?;

        for y in 0..visible_height {
            execute!(stdout, MoveTo(0, y as u16), Clear(ClearType::CurrentLine))?;

            let file_y = y + self.offset_y;
            if let Some(line) = self.buffer.lines().get(file_y) {
                let visible_start = self.offset_x;
                let visible_end = (visible_start + self.terminal_width as usize).min(line.len());

                if visible_start < line.len() {
                    let line_str: String = line[visible_start..visible_end].iter().collect();
                    if over_limit {
                        execute!(stdout, SetForegroundColor(Color::DarkRed))?;
                    }
                    execute!(stdout, Print(&line_str), SetForegroundColor(fg))?;
                }
            }
        }

        self.render_panel(fg, bg)?;

        let screen_y = self.buffer.cursor_y - self.offset_y;
        let screen_x = self.buffer.cursor_x - self.offset_x;
        execute!(stdout, MoveTo(screen_x as u16, screen_y as u16), Show)?;

        stdout.flush()?;
        self.dirty = false;
        Ok(())
    }

    fn render_panel(&mut self, fg: Color, bg: Color) -> io::Result<()> {
        let mut stdout = io::stdout();
        let y = self.terminal_height.saturating_sub(2);
        let display = self.session.display();
        let state = self.session.state();

        execute!(
            stdout,
            SetForegroundColor(fg),
            SetBackgroundColor(bg),
            MoveTo(0, y),
            Clear(ClearType::CurrentLine),
            MoveTo(0, y + 1),
            Clear(ClearType::CurrentLine)
        )?;

        if self.panel_visible {
            let mut panel = format!(
                " {} characters · {} words",
                group_thousands(display.stats.char_count),
                group_thousands(display.stats.word_count)
            );
            if let Some(limit) = &display.limit {
                panel.push_str(&format!(" · {}", limit.display_text));
            }
            let marker = if self.session.is_persisted() { "●" } else { "○" };
            let modified = if self.session.has_unsaved_changes() { "*" } else { "" };
            // A retained handle means ^S writes straight back to that file
            let linked = if self.session.files().handle().is_some() { " (linked)" } else { "" };
            panel.push_str(&format!(
                " · {} · {} · {}{}{} {}",
                state.theme.name(),
                state.font.label(),
                state.file_name,
                modified,
                linked,
                marker
            ));

            let limit_color = if display.warning_active() { Color::Red } else { fg };
            execute!(
                stdout,
                MoveTo(0, y),
                SetForegroundColor(limit_color),
                SetAttribute(Attribute::Dim),
                Print(&panel),
                SetAttribute(Attribute::Reset),
                SetBackgroundColor(bg)
            )?;
        }

        // The warning stays up for as long as the text is over the limit
        if display.warning_active() {
            execute!(
                stdout,
                MoveTo(0, y + 1),
                SetForegroundColor(Color::Red),
                Print(" Word limit exceeded")
            )?;
        } else if self.panel_visible {
            execute!(
                stdout,
                MoveTo(0, y + 1),
                SetForegroundColor(fg),
                SetAttribute(Attribute::Dim),
                Print(" ^S save  ^O open  ^N new  ^T theme  ^F font  ^L limit  ^W set limit  ^Q quit"),
                SetAttribute(Attribute::Reset)
            )?;
        }

        execute!(stdout, ResetColor)?;
        Ok(())
    }
}

fn leave_terminal() -> io::Result<()> {
    execute!(io::stdout(), ResetColor, Show, EnableLineWrap, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = leave_terminal();
        default_hook(info);
    }));
}

// Log to a file: stdout belongs to the editor
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let log_dir = config::data_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Could not create log directory {}: {}", log_dir.display(), e);
        return None;
    }

    let file_appender = tracing_appender::rolling::never(&log_dir, "kanso.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn show_stats(config: &Config) {
    let state = PersistenceManager::new(JsonFileStore::new(config.store_path())).load();
    let stats = compute_stats(&state.text);

    println!("{}", state.file_name);
    println!("  characters: {}", group_thousands(stats.char_count));
    println!("  words:      {}", group_thousands(stats.word_count));
    if let Some(limit) = evaluate_limit(stats.word_count, state.limit, state.limit_enabled) {
        let note = if limit.over_limit { " (over limit)" } else { "" };
        println!("  limit:      {}{}", limit.display_text, note);
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = Config::load();
    let _log_guard = init_logging(&config);

    if args.iter().skip(1).any(|arg| arg == "--stats") {
        show_stats(&config);
        return Ok(());
    }

    let force_fallback = args.iter().skip(1).any(|arg| arg == "--fallback");
    tracing::info!(
        store = %config.store_path().display(),
        file_handles = config.file_handles && !force_fallback,
        "starting kanso"
    );

    install_panic_hook();
    let mut editor = Editor::new(&config, force_fallback)?;
    editor.run()?;
    Ok(())
}
