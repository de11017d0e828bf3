#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use alarm::{Alarm, AlarmId};
use alarm_edit::{AlarmBuilder, EditingState};
use config::{Config, Theme};
use eframe::egui::{
    self, Button, CentralPanel, Color32, Context, Grid, Layout, RichText, ScrollArea,
    TopBottomPanel, Window,
};
use foreground::ForegroundAlarmView;
use log::{error, info, warn};
use notification::AuthorizationStatus;
use receiver::AlarmDispatcher;
use service::AlarmService;
use widgets::PermissionBanner;

pub mod alarm;
/// implementation of alarm editing for egui
pub mod alarm_edit;
pub mod communication;
pub mod config;
pub mod error;
pub mod foreground;
pub mod notification;
pub mod receiver;
pub mod scheduler;
pub mod service;
pub mod sound;
pub mod store;
pub mod ticker;
pub mod widgets;

pub const PERMISSION_NOTICE: &str =
    "Please enable notifications in Settings to receive alarm alerts.";

/// locks a mutex, a panic on another thread doesn't make the data unusable here
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[must_use]
pub fn local_now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeOfDay {
    #[default]
    AM,
    PM,
}

enum RowAction {
    Toggle(AlarmId),
    Edit(Alarm),
    Delete(AlarmId),
    Select(AlarmId, bool),
}

pub struct Clock {
    config: Config,
    service: AlarmService,
    dispatcher: AlarmDispatcher,
    foreground: Option<ForegroundAlarmView>,
    editing: Option<AlarmBuilder>,
    in_config: bool,
    notice: Option<String>,
    /// edit mode, rows can be picked for deletion
    selecting: bool,
    selected: BTreeSet<AlarmId>,
}

impl Clock {
    #[must_use]
    pub const fn new(config: Config, service: AlarmService, dispatcher: AlarmDispatcher) -> Self {
        Self {
            config,
            service,
            dispatcher,
            foreground: None,
            editing: None,
            in_config: false,
            notice: None,
            selecting: false,
            selected: BTreeSet::new(),
        }
    }

    fn save_config(&mut self) {
        let saved = Config::config_path().and_then(|path| self.config.save(path));
        if let Err(e) = saved {
            error!("couldn't save config: {e}");
            self.notice = Some(e.to_string());
        }
    }

    fn request_permission(&mut self) {
        let granted = self.service.scheduler().request_permission();
        self.config.notifications.asked = true;
        self.save_config();
        if granted {
            // alarms saved while permission was missing get their triggers now
            self.service.restore_triggers(local_now());
        }
    }

    fn render_settings(&mut self, ctx: &egui::Context) {
        let mut save = false;
        Window::new("settings ⚙")
            .open(&mut self.in_config)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Time format");
                    ui.text_edit_singleline(&mut self.config.time_format);
                });
                ui.separator();
                let status = self.service.scheduler().authorization_status();
                ui.label(format!("Notifications: {status:?}"));
                if status == AuthorizationStatus::Denied {
                    ui.label(
                        "Set notifications.allow = true in the config file below and restart to receive alarm alerts.",
                    );
                }
                if let Ok(path) = Config::config_path() {
                    ui.monospace(path.display().to_string());
                }
                if ui.button("Save").clicked() {
                    save = true;
                }
            });
        if save {
            self.save_config();
        }
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("time_and_ctrl").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let theme_btn = ui.add(Button::new({
                    if self.config.theme == Theme::Dark {
                        "🌞"
                    } else {
                        "🌙"
                    }
                }));
                if theme_btn.clicked() {
                    self.config.theme = !self.config.theme;
                    self.save_config();
                }
                ui.label(format!(
                    "Time: {}",
                    local_now().format(&self.config.time_format)
                ));
                ui.with_layout(Layout::right_to_left(egui::Align::Min), |ui| {
                    if ui.button("⚙").on_hover_text("settings").clicked() {
                        self.in_config = true;
                    }
                    if ui.button("+").on_hover_text("add alarm").clicked() {
                        self.editing = Some(AlarmBuilder::now());
                    }
                    let edit_text = if self.selecting { "Done" } else { "Edit" };
                    if ui.button(edit_text).clicked() {
                        self.selecting = !self.selecting;
                        self.selected.clear();
                    }
                });
            });
            if !self.service.scheduler().is_authorized() {
                let status = self.service.scheduler().authorization_status();
                if ui.add(PermissionBanner::new(status)).clicked() {
                    match status {
                        AuthorizationStatus::Denied => self.in_config = true,
                        _ => self.request_permission(),
                    }
                }
            }
        });
    }

    fn list_alarms(&self, ui: &mut egui::Ui) -> Option<RowAction> {
        let mut action = None;
        for alarm in self.service.alarms() {
            let color = if alarm.enabled {
                ui.visuals().strong_text_color()
            } else {
                Color32::GRAY
            };
            ui.vertical(|ui| {
                ui.label(
                    RichText::new(alarm.date.format(&self.config.time_format).to_string())
                        .size(32.0)
                        .color(color),
                );
                ui.label(RichText::new(alarm.date.format("%a, %b %-d").to_string()).color(color));
                if let Some(note) = &alarm.note {
                    ui.label(RichText::new(note).small().color(Color32::GRAY));
                }
            });
            if self.selecting {
                let mut picked = self.selected.contains(&alarm.id);
                if ui.checkbox(&mut picked, "").changed() {
                    action = Some(RowAction::Select(alarm.id, picked));
                }
                ui.end_row();
                continue;
            }
            let mut enabled = alarm.enabled;
            if ui.checkbox(&mut enabled, "enabled").changed() {
                action = Some(RowAction::Toggle(alarm.id));
            }
            if ui.button("edit").clicked() {
                action = Some(RowAction::Edit(alarm.clone()));
            }
            if ui.button("x").on_hover_text("delete alarm").clicked() {
                action = Some(RowAction::Delete(alarm.id));
            }
            ui.end_row();
        }
        action
    }

    fn apply(&mut self, action: RowAction) {
        let result = match action {
            RowAction::Toggle(id) => self.service.toggle(id, local_now()).map(|_| ()),
            RowAction::Edit(alarm) => {
                self.editing = Some(AlarmBuilder::from(&alarm));
                Ok(())
            }
            RowAction::Delete(id) => self.service.delete(id).map(|_| ()),
            RowAction::Select(id, picked) => {
                if picked {
                    self.selected.insert(id);
                } else {
                    self.selected.remove(&id);
                }
                Ok(())
            }
        };
        if let Err(e) = result {
            error!("{e}");
            self.notice = Some(e.to_string());
        }
    }

    /// deletes every picked alarm in one write and leaves edit mode
    fn delete_selected(&mut self) {
        let ids: Vec<AlarmId> = self.selected.iter().copied().collect();
        match self.service.delete_many(&ids) {
            Ok(removed) => {
                info!("deleted {} alarms", removed.len());
                self.selected.clear();
                self.selecting = false;
            }
            Err(e) => {
                error!("{e}");
                self.notice = Some(e.to_string());
            }
        }
    }

    fn render_editor(&mut self, ctx: &egui::Context) {
        let Some(editing) = &mut self.editing else {
            return;
        };
        let mut close = false;
        match editing.render_alarm_editor(ctx) {
            EditingState::Done(new_alarm) => {
                let now = local_now();
                let saved = match editing.replacing() {
                    Some(old) => self.service.replace(old, new_alarm, now),
                    None => self.service.create(new_alarm, now),
                };
                match saved {
                    Ok(saved) => {
                        close = true;
                        if saved.needs_permission() {
                            self.notice = Some(PERMISSION_NOTICE.to_string());
                        }
                    }
                    Err(e) => {
                        warn!("couldn't save alarm: {e}");
                        editing.error = Some(e.to_string());
                    }
                }
            }
            EditingState::Cancelled => close = true,
            EditingState::Editing => {}
        }
        if close {
            self.editing = None;
        }
    }

    fn render_notice(&mut self, ctx: &egui::Context) {
        let mut dismissed = false;
        if let Some(notice) = &self.notice {
            Window::new("Notice")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(notice);
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
        }
        if dismissed {
            self.notice = None;
        }
    }

    /// keeps the alarm screen in step with the dispatcher
    fn render_foreground(&mut self, ctx: &egui::Context) {
        let presented = self.dispatcher.state().presented().cloned();
        let showing = self.foreground.as_ref().map(|view| view.data().id.clone());
        match (showing, presented) {
            (showing, Some(data)) if showing.as_deref() != Some(data.id.as_str()) => {
                let repaint = ctx.clone();
                self.foreground = Some(ForegroundAlarmView::mount(data, move || {
                    repaint.request_repaint();
                }));
            }
            (Some(_), None) => self.foreground = None,
            _ => {}
        }
        let playing = self.dispatcher.player().is_playing();
        let mut stopped = false;
        if let Some(view) = &mut self.foreground {
            if view.show(ctx, playing) {
                view.stop(&mut self.dispatcher, || stopped = true);
            }
        }
        if stopped {
            self.foreground = None;
        }
    }
}

impl eframe::App for Clock {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // fired alarms start ringing before anything is drawn
        self.dispatcher.pump();
        ctx.set_visuals(self.config.theme.into());

        if self.in_config {
            self.render_settings(ctx);
        }
        self.render_editor(ctx);
        self.render_header(ctx);

        CentralPanel::default().show(ctx, |ui| {
            if self.service.store().is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label("No Alarms\nAdd an alarm to get started");
                });
                return;
            }
            let action = ScrollArea::vertical()
                .show(ui, |ui| {
                    Grid::new("alarms")
                        .striped(true)
                        .show(ui, |ui| self.list_alarms(ui))
                        .inner
                })
                .inner;
            if let Some(action) = action {
                self.apply(action);
            }
            if self.selecting {
                ui.separator();
                let delete = Button::new(format!("Delete ({})", self.selected.len()));
                if ui.add_enabled(!self.selected.is_empty(), delete).clicked() {
                    self.delete_selected();
                }
            }
        });

        self.render_notice(ctx);
        self.render_foreground(ctx);
        // the header clock only has minute precision
        ctx.request_repaint_after(Duration::from_secs(1));
    }
}

/// opens the gui, `on_start` receives the egui context before the first frame
pub fn run(
    config: Config,
    service: AlarmService,
    dispatcher: AlarmDispatcher,
    on_start: impl FnOnce(Context) + 'static,
) -> eframe::Result {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Mirai Alert")
            .with_inner_size([480.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Mirai Alert",
        native_options,
        Box::new(move |cc| {
            on_start(cc.egui_ctx.clone());
            Ok(Box::new(Clock::new(config, service, dispatcher)))
        }),
    )
}
