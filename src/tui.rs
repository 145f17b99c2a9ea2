use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::cli::{self, Cli, ShellCommand};
use crate::core::batch::run_config;
use crate::core::classifier::is_progress_bar;
use crate::core::command::UtilityCommand;
use crate::core::config::{collect_config_files, load_config, save_config};
use crate::core::error::SyncError;
use crate::core::event::{StreamKind, SyncEvent};
use crate::core::formatter::{format_config, format_duration, format_event};
use crate::core::job::JobStatus;
use crate::core::summary::RunSummary;
use crate::core::RunContext;
use crate::editor::{normalize_types, Editor, COMMON_TYPES};

const ABOUT_LINES: [&str; 12] = [
    "syncflow: batch sync of Canvas course files through canvassyncer.",
    "Usage:",
    "  1. Fill in token, url, courses and dir (or 'load' a configuration)",
    "  2. Optionally pick file types with 'include' / 'exclude'",
    "  3. 'save' the configuration for later use",
    "  4. 'run' to download; progress appears in this log",
    "Getting a Canvas API token:",
    "  1. Log in to Canvas",
    "  2. Open Account > Settings",
    "  3. Scroll to 'Approved Integrations'",
    "  4. Click 'New Access Token', describe it and generate",
    "Licensed under MIT.",
];

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, SyncError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

/// A configuration waiting to run. Editor runs own their temp file so it is
/// deleted as soon as the run (or the queue) lets go of it.
#[derive(Debug)]
enum QueuedRun {
    File(PathBuf),
    Editor(NamedTempFile),
}

impl QueuedRun {
    fn path(&self) -> &Path {
        match self {
            QueuedRun::File(path) => path,
            QueuedRun::Editor(file) => file.path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Dialog {
    title: &'static str,
    message: String,
}

/// The background run for one configuration.
struct Worker {
    ctx: RunContext,
    handle: JoinHandle<()>,
    course: Option<(usize, usize, String)>,
    completed: usize,
}

struct AppState {
    input: String,
    history: Vec<String>,
    editor: Editor,
    timeout: Duration,
    utility: UtilityCommand,
    status: Option<JobStatus>,
    worker: Option<Worker>,
    queue: VecDeque<QueuedRun>,
    dialog: Option<Dialog>,
    last_progress_line: Option<String>,
    files_total: u64,
    should_quit: bool,
    scroll_offset: usize,
    view_lines: usize,
    tick: u64,
}

const DIVIDER_MARKER: &str = "<divider>";

impl AppState {
    fn new(utility: UtilityCommand, timeout: Duration, queue: Vec<PathBuf>) -> Self {
        let mut history = vec!["Welcome to syncflow. Type 'help' for commands.".to_string()];
        if !queue.is_empty() {
            history.push(format!("Queued {} configuration(s).", queue.len()));
        }
        Self {
            input: String::new(),
            history,
            editor: Editor::default(),
            timeout,
            utility,
            status: None,
            worker: None,
            queue: queue.into_iter().map(QueuedRun::File).collect(),
            dialog: None,
            last_progress_line: None,
            files_total: 0,
            should_quit: false,
            scroll_offset: 0,
            view_lines: 1,
            tick: 0,
        }
    }

    fn push_history(&mut self, line: impl Into<String>) {
        const MAX_LINES: usize = 2000;
        if self.history.len() >= MAX_LINES {
            let drain_count = self.history.len().saturating_sub(MAX_LINES - 1);
            self.history.drain(0..drain_count);
        }
        self.history.push(line.into());
        self.clamp_scroll();
    }

    fn show_dialog(&mut self, title: &'static str, message: impl Into<String>) {
        self.dialog = Some(Dialog {
            title,
            message: message.into(),
        });
    }

    fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn set_view_lines(&mut self, lines: usize) {
        self.view_lines = lines.max(1);
        self.clamp_scroll();
    }

    fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.max_scroll();
        self.scroll_offset = (self.scroll_offset + lines).min(max_scroll);
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    fn scroll_top(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    fn scroll_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    fn max_scroll(&self) -> usize {
        self.history.len().saturating_sub(self.view_lines)
    }

    fn clamp_scroll(&mut self) {
        let max_scroll = self.max_scroll();
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
    }

    fn apply_event(&mut self, event: SyncEvent) {
        match &event {
            SyncEvent::CourseStarted { index, total, course } => {
                if let Some(worker) = self.worker.as_mut() {
                    worker.course = Some((*index, *total, course.to_string()));
                }
                self.last_progress_line = None;
            }
            SyncEvent::Line {
                stream: StreamKind::Stderr,
                text,
            } if is_progress_bar(text) => {
                self.last_progress_line = Some(text.clone());
            }
            SyncEvent::CourseFinished(invocation) => {
                if let Some(worker) = self.worker.as_mut() {
                    worker.completed += 1;
                }
                self.files_total += invocation.verdict.files_downloaded();
            }
            _ => {}
        }

        let finished = match &event {
            SyncEvent::ConfigFinished { summary, error, .. } => Some((*summary, error.clone())),
            _ => None,
        };

        for line in format_event(&event) {
            self.push_history(line);
        }

        if let Some((summary, error)) = finished {
            self.finish_run(summary, error);
        }
    }

    fn finish_run(&mut self, summary: RunSummary, error: Option<String>) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.handle.join();
        }
        self.last_progress_line = None;
        self.push_history(format!("Files downloaded this session: {}", self.files_total));

        let succeeded = error.is_none() && summary.all_succeeded();
        self.status = Some(if succeeded {
            JobStatus::Finished
        } else {
            JobStatus::Failed
        });
        info!(succeeded, failed = summary.failed, "configuration run finished");

        let message = if succeeded {
            "Canvas files downloaded!".to_string()
        } else {
            let reason = match error {
                Some(message) => message,
                None => format!("{}/{} course(s) failed", summary.failed, summary.total()),
            };
            format!("Download not fully successful: {reason}")
        };

        // Queued runs keep going; the dialog only closes out the last one.
        if self.queue.is_empty() {
            self.show_dialog(if succeeded { "Done" } else { "Warning" }, message);
        } else {
            self.push_history(message);
        }
    }

    fn start_next(&mut self, events: &mpsc::Sender<SyncEvent>) {
        if self.is_running() || self.dialog.is_some() {
            return;
        }
        let Some(run) = self.queue.pop_front() else {
            return;
        };

        let ctx = RunContext::new(self.utility.clone(), self.timeout);
        let worker_ctx = ctx.clone();
        let tx = events.clone();
        self.push_history(DIVIDER_MARKER);
        self.push_history(format!("Using configuration: {}", run.path().display()));

        let handle = thread::spawn(move || {
            let path = run.path().to_path_buf();
            run_config(&worker_ctx, &path, &mut |event: SyncEvent| {
                let _ = tx.send(event);
            });
            // `run` drops here, deleting an editor temp file.
            drop(run);
        });

        self.status = Some(JobStatus::Running);
        self.worker = Some(Worker {
            ctx,
            handle,
            course: None,
            completed: 0,
        });
    }

    /// Stops the in-flight run and discards queued editor temp files.
    fn shutdown(&mut self) {
        self.queue.clear();
        if let Some(worker) = self.worker.take() {
            warn!("shutting down with a run in progress");
            worker.ctx.cancel();
            let _ = worker.handle.join();
        }
    }
}

pub fn run(cli: &Cli) -> Result<(), SyncError> {
    let utility = UtilityCommand::parse(&cli.utility)?;
    let timeout = cli.timeout();

    // Pre-loading is best effort here: a bad path is reported in the log.
    let (initial, load_error) = if cli.config.is_some() || cli.dir.is_some() {
        match collect_config_files(cli.config.as_deref(), cli.dir.as_deref()) {
            Ok(files) => (files, None),
            Err(err) => (Vec::new(), Some(err)),
        }
    } else {
        (Vec::new(), None)
    };

    let mut app = AppState::new(utility, timeout, initial);
    if let Some(err) = load_error {
        app.push_history(format!("error: {err}"));
    }

    let result = event_loop(&mut app);
    app.shutdown();
    result
}

fn event_loop(app: &mut AppState) -> Result<(), SyncError> {
    let _guard = TerminalGuard::enter()?;
    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (event_tx, event_rx) = mpsc::channel::<SyncEvent>();

    loop {
        while let Ok(event) = event_rx.try_recv() {
            app.apply_event(event);
        }

        app.start_next(&event_tx);

        let size = terminal.size()?;
        let history_height = size.height.saturating_sub(7).max(3) as usize;
        let view_lines = history_height.saturating_sub(2).max(1);
        app.set_view_lines(view_lines);

        app.tick = app.tick.wrapping_add(1);

        terminal.draw(|frame| {
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(4),
                    Constraint::Min(3),
                    Constraint::Length(3),
                ])
                .split(frame.size());

            let header = render_header(app, layout[0].width as usize);
            frame.render_widget(header, layout[0]);

            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(30), Constraint::Length(44)])
                .split(layout[1]);

            let history = render_history(app, body[0].height as usize, body[0].width as usize);
            frame.render_widget(history, body[0]);
            frame.render_widget(render_config_panel(app), body[1]);

            let input = Paragraph::new(app.input.as_str())
                .block(Block::default().title("Command").borders(Borders::ALL))
                .wrap(Wrap { trim: false });
            frame.render_widget(input, layout[2]);

            if let Some(dialog) = &app.dialog {
                let area = centered_rect(60, 7, frame.size());
                frame.render_widget(Clear, area);
                frame.render_widget(render_dialog(dialog), area);
            } else {
                frame.set_cursor(layout[2].x + 1 + app.input.len() as u16, layout[2].y + 1);
            }
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut AppState, code: KeyCode, modifiers: KeyModifiers) {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.dialog.is_some() {
        if matches!(code, KeyCode::Enter | KeyCode::Esc) {
            app.dialog = None;
        }
        return;
    }

    match code {
        KeyCode::Char(ch) => {
            app.input.push(ch);
        }
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Enter => {
            let line = app.input.trim().to_string();
            app.input.clear();
            if !line.is_empty() {
                handle_line(app, line);
            }
        }
        KeyCode::PageUp => {
            let step = app.view_lines.saturating_sub(1).max(1);
            app.scroll_up(step);
        }
        KeyCode::PageDown => {
            let step = app.view_lines.saturating_sub(1).max(1);
            app.scroll_down(step);
        }
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Home => app.scroll_top(),
        KeyCode::End => app.scroll_bottom(),
        KeyCode::Esc => {
            app.should_quit = true;
        }
        _ => {}
    }
}

fn handle_line(app: &mut AppState, line: String) {
    let trimmed = line.trim();
    app.push_history(format!(">> {trimmed}"));

    if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
        app.should_quit = true;
        return;
    }

    if trimmed.eq_ignore_ascii_case("clear") {
        app.history.clear();
        app.scroll_bottom();
        return;
    }

    if trimmed.eq_ignore_ascii_case("help") {
        for line in cli::HELP_LINES {
            app.push_history(line);
        }
        app.push_history(format!("Common file types: {}", COMMON_TYPES.join(" ")));
        return;
    }

    match cli::parse_line(trimmed) {
        Ok(command) => execute(app, command),
        Err(err) => {
            for line in err.lines().filter(|line| !line.trim().is_empty()) {
                app.push_history(line.to_string());
            }
        }
    }
}

fn execute(app: &mut AppState, command: ShellCommand) {
    match command {
        ShellCommand::Token { value } => {
            app.editor.token = value;
            app.push_history("Token set.");
        }
        ShellCommand::Url { value } => {
            app.push_history(format!("Canvas URL: {value}"));
            app.editor.url = value;
        }
        ShellCommand::Courses { ids } => {
            let rejected = app.editor.set_courses(&ids);
            if !rejected.is_empty() {
                app.push_history(format!("Ignored non-numeric course ids: {}", rejected.join(", ")));
            }
            app.push_history(format!("{} course id(s) set.", app.editor.courses.len()));
        }
        ShellCommand::Dir { path } => {
            app.push_history(format!("Download directory: {path}"));
            app.editor.download_dir = path;
        }
        ShellCommand::Include { exts } => {
            app.editor.includes = normalize_types(&exts);
        }
        ShellCommand::Exclude { exts } => {
            app.editor.excludes = normalize_types(&exts);
        }
        ShellCommand::Show => {
            for line in format_config(&app.editor.to_config()) {
                app.push_history(line);
            }
            app.push_history(format!("Timeout      : {}s", app.timeout.as_secs()));
        }
        ShellCommand::Load { file } => match load_config(&file) {
            Ok(config) => {
                app.editor = Editor::from_config(&config);
                app.push_history(format!("Loaded configuration: {}", file.display()));
            }
            Err(err) => app.show_dialog("Error", format!("Could not load configuration: {err}")),
        },
        ShellCommand::Save { file } => {
            if let Err(message) = app.editor.validate() {
                app.show_dialog("Validation failed", message);
                return;
            }
            match save_config(&app.editor.to_config(), &file) {
                Ok(path) => app.show_dialog("Saved", format!("Configuration saved to {}", path.display())),
                Err(err) => app.show_dialog("Error", format!("Could not save configuration: {err}")),
            }
        }
        ShellCommand::Timeout { seconds } => {
            app.timeout = Duration::from_secs(seconds);
            app.push_history(format!("Timeout set to {seconds}s."));
        }
        ShellCommand::Run { file: Some(file) } => {
            app.queue.push_back(QueuedRun::File(file));
            report_queue(app);
        }
        ShellCommand::Run { file: None } => {
            if let Err(message) = app.editor.validate() {
                app.show_dialog("Validation failed", message);
                return;
            }
            match app.editor.to_config().write_temp() {
                Ok(temp) => {
                    app.queue.push_back(QueuedRun::Editor(temp));
                    report_queue(app);
                }
                Err(err) => app.show_dialog("Error", format!("Could not start download: {err}")),
            }
        }
        ShellCommand::Batch { dir } => match collect_config_files(None, Some(&dir)) {
            Ok(files) => {
                let count = files.len();
                app.queue.extend(files.into_iter().map(QueuedRun::File));
                app.push_history(format!("Queued {count} configuration(s) from '{}'.", dir.display()));
            }
            Err(err) => app.push_history(format!("error: {err}")),
        },
        ShellCommand::About => {
            for line in ABOUT_LINES {
                app.push_history(line);
            }
        }
    }
}

fn report_queue(app: &mut AppState) {
    if app.is_running() {
        app.push_history(format!(
            "A download is in progress; {} run(s) queued.",
            app.queue.len()
        ));
    } else {
        app.push_history("Preparing download...");
    }
}

fn render_header(app: &AppState, width: usize) -> Paragraph<'static> {
    let status = match app.status {
        Some(JobStatus::Running) => "Running",
        Some(JobStatus::Finished) => "Finished",
        Some(JobStatus::Failed) => "Failed",
        None => "Idle",
    };

    let course = match app.worker.as_ref().and_then(|worker| worker.course.as_ref()) {
        Some((index, total, id)) => format!("course {index}/{total} (ID {id})"),
        None => "no course running".to_string(),
    };

    let bar_width = width.saturating_sub(40).clamp(10, 40);
    let progress_bar = render_progress_bar(app, bar_width);
    let detail = app.last_progress_line.clone().unwrap_or_default();

    let text = vec![
        Line::from(vec![
            Span::raw("Status: "),
            Span::raw(status),
            Span::raw(format!("  |  {course}  |  queued: {}", app.queue.len())),
        ]),
        Line::from(vec![
            Span::raw(progress_bar),
            Span::raw(" "),
            Span::raw(detail),
        ]),
    ];

    Paragraph::new(text)
        .block(Block::default().title("syncflow").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn render_progress_bar(app: &AppState, width: usize) -> String {
    let width = width.max(10);
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');

    let Some(worker) = &app.worker else {
        bar.push_str(&" ".repeat(width));
        bar.push(']');
        return bar;
    };

    if let Some((_, total, _)) = worker.course {
        if total > 0 {
            let ratio = (worker.completed as f64 / total as f64).clamp(0.0, 1.0);
            let filled = ((ratio * width as f64).round() as usize).min(width);
            for idx in 0..width {
                if idx < filled {
                    bar.push('=');
                } else if idx == filled && filled < width {
                    bar.push('>');
                } else {
                    bar.push(' ');
                }
            }
            bar.push(']');
            return bar;
        }
    }

    let pos = (app.tick as usize) % width;
    for idx in 0..width {
        if idx == pos {
            bar.push('>');
        } else if idx < pos {
            bar.push('=');
        } else {
            bar.push(' ');
        }
    }
    bar.push(']');
    bar
}

fn render_history(app: &AppState, height: usize, width: usize) -> Paragraph<'static> {
    let max_lines = height.saturating_sub(2).max(1);
    let end = app.history.len().saturating_sub(app.scroll_offset);
    let start = end.saturating_sub(max_lines);
    let divider_width = width.saturating_sub(2).max(1);
    let divider = "─".repeat(divider_width);
    let lines: Vec<Line> = app.history[start..end]
        .iter()
        .map(|line| {
            if line == DIVIDER_MARKER {
                Line::from(Span::raw(divider.clone()))
            } else {
                Line::from(line.clone())
            }
        })
        .collect();

    Paragraph::new(lines)
        .block(Block::default().title("Log").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
}

fn render_config_panel(app: &AppState) -> Paragraph<'static> {
    let mut lines: Vec<Line> = format_config(&app.editor.to_config())
        .into_iter()
        .map(Line::from)
        .collect();
    lines.push(Line::from(format!("Timeout      : {}s", app.timeout.as_secs())));
    lines.push(Line::from(format!(
        "Files so far : {}",
        app.files_total
    )));
    if let Some(worker) = &app.worker {
        lines.push(Line::from(format!(
            "Elapsed cap  : {}",
            format_duration(worker.ctx.timeout)
        )));
    }

    Paragraph::new(lines)
        .block(Block::default().title("Configuration").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn render_dialog(dialog: &Dialog) -> Paragraph<'static> {
    let lines = vec![
        Line::from(dialog.message.clone()),
        Line::from(""),
        Line::from("[Enter] OK"),
    ];
    Paragraph::new(lines)
        .block(Block::default().title(dialog.title).borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * percent_x.min(100) / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::{ExitState, Verdict};
    use crate::core::config::CourseId;
    use crate::core::job::Invocation;
    use pretty_assertions::assert_eq;

    fn app() -> AppState {
        AppState::new(UtilityCommand::default(), Duration::from_secs(300), Vec::new())
    }

    #[test]
    fn editor_commands_fill_the_form() {
        let mut app = app();
        for line in [
            "token secret-token",
            "url https://canvas.example.edu",
            "courses 101 abc 202",
            "dir '/tmp/Canvas Files'",
            "include .PDF docx",
            "timeout 120",
        ] {
            handle_line(&mut app, line.to_string());
        }

        assert_eq!(app.editor.token, "secret-token");
        assert_eq!(app.editor.courses, vec![CourseId::Number(101), CourseId::Number(202)]);
        assert_eq!(app.editor.download_dir, "/tmp/Canvas Files");
        assert!(app.editor.includes.contains("pdf"));
        assert_eq!(app.timeout, Duration::from_secs(120));
        assert!(app.history.iter().any(|line| line.contains("Ignored non-numeric course ids: abc")));
        assert!(app.editor.validate().is_ok());
    }

    #[test]
    fn run_without_required_fields_opens_a_dialog() {
        let mut app = app();
        handle_line(&mut app, "run".to_string());
        assert!(app.queue.is_empty());
        assert_eq!(
            app.dialog,
            Some(Dialog {
                title: "Validation failed",
                message: "Please enter the Canvas API token".to_string(),
            })
        );
    }

    #[test]
    fn queued_editor_run_owns_its_temp_file() {
        let mut app = app();
        for line in ["token t", "url u", "courses 1", "dir d", "run"] {
            handle_line(&mut app, line.to_string());
        }
        assert_eq!(app.queue.len(), 1);
        let path = app.queue[0].path().to_path_buf();
        assert!(path.exists());

        app.shutdown();
        assert!(!path.exists());
    }

    #[test]
    fn progress_bars_are_logged_and_shown_in_the_header() {
        let mut app = app();
        let before = app.history.len();
        for step in 0..30 {
            app.apply_event(SyncEvent::Line {
                stream: StreamKind::Stderr,
                text: format!(" {step}%|█         | {step}/100"),
            });
        }
        assert_eq!(app.history.len(), before + 30);
        assert_eq!(app.history[before], "info:  0%|█         | 0/100");
        assert_eq!(app.history[before + 29], "info:  29%|█         | 29/100");
        assert_eq!(app.last_progress_line.as_deref(), Some(" 29%|█         | 29/100"));

        app.apply_event(SyncEvent::Line {
            stream: StreamKind::Stderr,
            text: "ssl failure".to_string(),
        });
        assert_eq!(app.history.last().map(String::as_str), Some("error: ssl failure"));
    }

    #[test]
    fn finished_config_shows_result_dialog() {
        let mut app = app();
        app.apply_event(SyncEvent::CourseFinished(Box::new(Invocation {
            course: CourseId::Number(1),
            config_path: PathBuf::from("c.json"),
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit: ExitState::Exited(0),
            elapsed: Duration::from_secs(1),
            verdict: Verdict::Success { files_downloaded: Some(4) },
        })));
        app.apply_event(SyncEvent::ConfigFinished {
            path: PathBuf::from("c.json"),
            summary: RunSummary { succeeded: 1, failed: 2, files_downloaded: 4 },
            error: None,
        });

        assert_eq!(app.files_total, 4);
        assert_eq!(app.status, Some(JobStatus::Failed));
        assert_eq!(
            app.dialog.as_ref().map(|d| d.message.as_str()),
            Some("Download not fully successful: 2/3 course(s) failed")
        );
    }

    #[test]
    fn dialog_swallows_keys_until_dismissed() {
        let mut app = app();
        app.show_dialog("Done", "ok");
        handle_key(&mut app, KeyCode::Char('x'), KeyModifiers::NONE);
        assert!(app.input.is_empty());
        handle_key(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert!(app.dialog.is_none());
    }

    #[test]
    fn centered_rect_stays_inside() {
        let area = Rect { x: 0, y: 0, width: 100, height: 5 };
        let rect = centered_rect(60, 7, area);
        assert_eq!(rect, Rect { x: 20, y: 0, width: 60, height: 5 });
    }
}
