use std::path::PathBuf;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{info, warn};

use crate::{
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore},
    error::{OpenFieldError, Result},
    report::{self, ReportRecord},
    runtime::OpenFieldEvent,
    session::{SessionController, StopKind, TestConfig, TickOutcome},
    zone::{Zone, ZoneSnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Setup,
    Testing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    AnimalId,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Keys that mark a zone while a test runs
pub fn zone_for_key(c: char) -> Option<Zone> {
    match c.to_ascii_lowercase() {
        'c' | '1' => Some(Zone::Corner),
        'l' | '2' => Some(Zone::Lateral),
        'm' | '3' => Some(Zone::Center),
        _ => None,
    }
}

/// Everything the terminal front end needs, free of any widget references
pub struct App<C: Clock = SystemClock> {
    pub clock: C,
    pub controller: SessionController,
    pub state: AppState,
    pub focus: Field,
    pub animal_id_input: String,
    pub duration_input: String,
    pub report: Option<ReportRecord>,
    /// Exactly what the report pane shows, and what export writes
    pub report_text: Option<String>,
    pub notice: Option<Notice>,
    pub output_path: Option<PathBuf>,
    pub config: Config,
    pub config_store: Box<dyn ConfigStore>,
}

impl<C: Clock> App<C> {
    pub fn new(clock: C, config_store: Box<dyn ConfigStore>) -> Self {
        let config = config_store.load();
        Self {
            clock,
            controller: SessionController::new(),
            state: AppState::Setup,
            focus: Field::AnimalId,
            animal_id_input: String::new(),
            duration_input: config.default_duration_secs.to_string(),
            report: None,
            report_text: None,
            notice: None,
            output_path: None,
            config,
            config_store,
        }
    }

    pub fn with_animal_id(mut self, animal_id: impl Into<String>) -> Self {
        self.animal_id_input = animal_id.into();
        self.focus = Field::Duration;
        self
    }

    pub fn with_duration(mut self, secs: u32) -> Self {
        self.duration_input = secs.to_string();
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn start_test(&mut self) {
        if self.controller.is_running() {
            return;
        }
        let config = match TestConfig::parse(&self.animal_id_input, &self.duration_input) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}");
                self.notice = Some(Notice::new(NoticeLevel::Warning, e.to_string()));
                return;
            }
        };
        let duration_secs = config.duration_secs;
        let now = self.clock.now();
        if !self.controller.start(config, now) {
            return;
        }

        self.state = AppState::Testing;
        self.report = None;
        self.report_text = None;
        self.notice = None;

        if self.config.default_duration_secs != duration_secs {
            self.config.default_duration_secs = duration_secs;
            if let Err(e) = self.config_store.save(&self.config) {
                warn!("could not save config: {e}");
            }
        }
    }

    pub fn press_zone(&mut self, zone: Zone) {
        let now = self.clock.now();
        self.controller.press(zone, now);
    }

    pub fn stop_test(&mut self) {
        let now = self.clock.now();
        if self.controller.stop(now, StopKind::Manual) {
            self.on_stopped(StopKind::Manual);
        }
    }

    pub fn on_tick(&mut self) {
        let now = self.clock.now();
        if let TickOutcome::Expired(_) = self.controller.tick(now) {
            self.on_stopped(StopKind::Expired);
        }
    }

    fn on_stopped(&mut self, kind: StopKind) {
        self.state = AppState::Finished;
        self.generate_report();
        if kind == StopKind::Manual {
            if let Some(session) = self.controller.session() {
                self.notice = Some(Notice::new(
                    NoticeLevel::Info,
                    format!("Test for {} finished!", session.animal_id),
                ));
            }
        }
    }

    /// Regenerate the displayed report; session state is left untouched
    pub fn generate_report(&mut self) {
        match report::generate(&self.controller, self.clock.now(), Local::now()) {
            Ok(record) => {
                self.report_text = Some(record.to_text());
                self.report = Some(record);
            }
            Err(e) => {
                self.notice = Some(Notice::new(NoticeLevel::Info, e.to_string()));
            }
        }
    }

    /// Destination used by `export_report` when no path is given
    pub fn export_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.output_path {
            return Some(path.clone());
        }
        let record = self.report.as_ref()?;
        let dir = self
            .config
            .report_dir
            .clone()
            .unwrap_or_else(AppDirs::report_dir);
        Some(dir.join(report::default_file_name(
            &record.animal_id,
            record.generated_at,
        )))
    }

    /// Write the displayed report verbatim. On failure the report stays
    /// displayed and the error is posted as a notice.
    pub fn export_report(&mut self) -> Result<PathBuf> {
        let result = self.try_export();
        self.notice = Some(match &result {
            Ok(path) => Notice::new(
                NoticeLevel::Info,
                format!("Report exported to {}", path.display()),
            ),
            Err(OpenFieldError::NoReport) => Notice::new(
                NoticeLevel::Info,
                OpenFieldError::NoReport.to_string(),
            ),
            Err(e) => Notice::new(NoticeLevel::Error, e.to_string()),
        });
        result
    }

    fn try_export(&self) -> Result<PathBuf> {
        let text = self.report_text.as_deref().ok_or(OpenFieldError::NoReport)?;
        let path = self.export_path().ok_or(OpenFieldError::NoReport)?;
        report::export(text, &path)?;
        Ok(path)
    }

    pub fn new_test(&mut self) {
        if self.controller.is_running() {
            return;
        }
        info!("back to setup");
        self.state = AppState::Setup;
        self.focus = Field::AnimalId;
        self.notice = None;
    }

    pub fn remaining_secs(&self) -> f64 {
        if self.controller.is_running() {
            self.controller.remaining(self.clock.now())
        } else if self.controller.session().is_some() {
            0.0
        } else {
            self.duration_input.trim().parse::<f64>().unwrap_or(0.0)
        }
    }

    pub fn zone_snapshot(&self) -> ZoneSnapshot {
        self.controller.snapshot(self.clock.now())
    }

    pub fn active_zone(&self) -> Option<Zone> {
        self.controller.zones().active()
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            Field::AnimalId => &mut self.animal_id_input,
            Field::Duration => &mut self.duration_input,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Field::AnimalId => Field::Duration,
            Field::Duration => Field::AnimalId,
        };
    }

    /// Dispatch one runner event. Every key is followed by a poll so expiry
    /// is checked on each pass of the loop, not only on idle ticks.
    pub fn handle_event(&mut self, event: OpenFieldEvent) -> Action {
        match event {
            OpenFieldEvent::Key(key) => {
                let action = self.handle_key(key);
                if action == Action::Continue {
                    self.on_tick();
                }
                action
            }
            OpenFieldEvent::Tick => {
                self.on_tick();
                Action::Continue
            }
            OpenFieldEvent::Resize => Action::Continue,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Action::Quit;
        }

        match self.state {
            AppState::Setup => match key.code {
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                    self.toggle_focus()
                }
                KeyCode::Enter => self.start_test(),
                KeyCode::Backspace => {
                    self.focused_input().pop();
                }
                KeyCode::Char(c) => self.focused_input().push(c),
                _ => {}
            },
            AppState::Testing => match key.code {
                KeyCode::Char('s') => self.stop_test(),
                KeyCode::Char('g') => self.generate_report(),
                // Only a report generated mid-run can be exported here
                KeyCode::Char('e') if self.report_text.is_some() => {
                    let _ = self.export_report();
                }
                KeyCode::Char(c) => {
                    if let Some(zone) = zone_for_key(c) {
                        self.press_zone(zone);
                    }
                }
                _ => {}
            },
            AppState::Finished => match key.code {
                KeyCode::Char('g') => self.generate_report(),
                KeyCode::Char('e') => {
                    let _ = self.export_report();
                }
                KeyCode::Char('n') => self.new_test(),
                _ => {}
            },
        }
        Action::Continue
    }
}
