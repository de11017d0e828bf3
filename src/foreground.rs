use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::NaiveDateTime;
use eframe::egui::{self, Align2, Button, Color32, RichText, Window};

use crate::{
    local_now, lock,
    receiver::{AlarmDispatcher, AlarmNotificationData},
    ticker::Ticker,
};

const CLOCK_TICK: Duration = Duration::from_secs(1);

/// full-screen alarm shown while a fired alarm is ringing
#[derive(Debug)]
pub struct ForegroundAlarmView {
    data: AlarmNotificationData,
    current_time: Arc<Mutex<NaiveDateTime>>,
    ticker: Option<Ticker>,
}

impl ForegroundAlarmView {
    /// starts the display clock, `on_tick` runs after every update of the time
    pub fn mount(data: AlarmNotificationData, on_tick: impl Fn() + Send + 'static) -> Self {
        Self::mount_with(data, CLOCK_TICK, local_now, on_tick)
    }

    pub fn mount_with(
        data: AlarmNotificationData,
        interval: Duration,
        clock: fn() -> NaiveDateTime,
        on_tick: impl Fn() + Send + 'static,
    ) -> Self {
        let current_time = Arc::new(Mutex::new(clock()));
        let shared = Arc::clone(&current_time);
        let ticker = Ticker::spawn(interval, move || {
            *lock(&shared) = clock();
            on_tick();
        });
        Self {
            data,
            current_time,
            ticker: Some(ticker),
        }
    }

    pub fn unmount(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    #[must_use]
    pub const fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    #[must_use]
    pub const fn data(&self) -> &AlarmNotificationData {
        &self.data
    }

    #[must_use]
    pub fn current_time(&self) -> NaiveDateTime {
        *lock(&self.current_time)
    }

    /// "h:mm" and "AM"/"PM"
    #[must_use]
    pub fn time_text(&self) -> (String, String) {
        let now = self.current_time();
        (now.format("%-I:%M").to_string(), now.format("%p").to_string())
    }

    /// the single action: silence the alarm, clear it and hand control back
    pub fn stop(&mut self, dispatcher: &mut AlarmDispatcher, dismiss: impl FnOnce()) {
        dispatcher.stop_alarm();
        self.unmount();
        dismiss();
    }

    /// returns true when stop was clicked
    pub fn show(&self, ctx: &egui::Context, playing: bool) -> bool {
        let mut stop = false;
        let (time, am_pm) = self.time_text();
        Window::new("alarm_ringing")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(time).size(72.0));
                        ui.label(RichText::new(am_pm).size(36.0));
                    });
                    ui.add_space(24.0);
                    ui.label(RichText::new(&self.data.title).size(24.0));
                    if !self.data.body.is_empty() {
                        ui.label(RichText::new(&self.data.body).size(18.0).color(Color32::GRAY));
                    }
                    ui.horizontal(|ui| {
                        let speaker = if playing { "🔊" } else { "🔇" };
                        ui.label(RichText::new(speaker).color(Color32::from_rgb(255, 149, 0)));
                        ui.label(RichText::new(&self.data.sound_name).small().color(Color32::GRAY));
                    });
                    ui.add_space(48.0);
                    let stop_button = Button::new(RichText::new("⏹ Stop").size(24.0))
                        .fill(Color32::from_rgb(255, 149, 0))
                        .min_size(egui::vec2(200.0, 56.0));
                    if ui.add(stop_button).clicked() {
                        stop = true;
                    }
                });
            });
        stop
    }
}

impl Drop for ForegroundAlarmView {
    fn drop(&mut self) {
        self.unmount();
    }
}
