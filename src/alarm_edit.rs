use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use eframe::egui::{self, Color32, TextEdit, Widget, Window};

use crate::{
    alarm::{Alarm, AlarmId, NewAlarm, SoundName},
    error::AlarmError,
    TimeOfDay,
};

/// form state for adding an alarm, or for replacing one when `replacing` is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmBuilder {
    pub(crate) year: i32,
    pub(crate) month: u32,
    pub(crate) day: u32,
    /// 1 through 12
    pub(crate) hour: u32,
    pub(crate) minute: u32,
    pub(crate) time_of_day: TimeOfDay,
    pub(crate) note: String,
    pub(crate) sound: SoundName,
    pub(crate) replacing: Option<AlarmId>,
    pub(crate) error: Option<String>,
    text: FieldText,
}

/// what is typed into the number fields, synced back once focus is lost
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct FieldText {
    year: String,
    month: String,
    day: String,
    hour: String,
    minute: String,
}

pub enum EditingState {
    Cancelled,
    Editing,
    Done(NewAlarm),
}

impl AlarmBuilder {
    /// starts at the given date and time, rounded down to the minute
    #[must_use]
    pub fn at(date: NaiveDateTime) -> Self {
        let (pm, hour) = date.time().hour12();
        let mut builder = Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            hour,
            minute: date.minute(),
            time_of_day: if pm { TimeOfDay::PM } else { TimeOfDay::AM },
            note: String::new(),
            sound: SoundName::Default,
            replacing: None,
            error: None,
            text: FieldText::default(),
        };
        builder.sync_text();
        builder
    }

    #[must_use]
    pub fn now() -> Self {
        Self::at(chrono::Local::now().naive_local())
    }

    #[must_use]
    pub const fn replacing(&self) -> Option<AlarmId> {
        self.replacing
    }

    /// combines the date and time fields
    pub fn date_time(&self) -> Result<NaiveDateTime, AlarmError> {
        let hour = self.hour % 12
            + match self.time_of_day {
                TimeOfDay::AM => 0,
                TimeOfDay::PM => 12,
            };
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            AlarmError::InvalidDate(format!("{}-{:02}-{:02}", self.year, self.month, self.day))
        })?;
        let time = NaiveTime::from_hms_opt(hour, self.minute, 0)
            .ok_or_else(|| AlarmError::InvalidDate(format!("{hour:02}:{:02}", self.minute)))?;
        Ok(date.and_time(time))
    }

    pub fn build(&self) -> Result<NewAlarm, AlarmError> {
        Ok(NewAlarm::new(self.date_time()?, &self.note, self.sound))
    }

    fn sync_text(&mut self) {
        self.text = FieldText {
            year: self.year.to_string(),
            month: self.month.to_string(),
            day: self.day.to_string(),
            hour: self.hour.to_string(),
            minute: format!("{:02}", self.minute),
        };
    }

    pub(crate) fn edit_alarm(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Note");
            ui.add(TextEdit::singleline(&mut self.note).hint_text("Alarm note"));
        });
        ui.horizontal(|ui| {
            self.render_date_editor(ui);
            ui.separator();
            self.render_time_editor(ui);
            ui.separator();
            Self::render_alarm_sound_selector(&mut self.sound, ui);
        });
    }

    pub(crate) fn render_date_editor(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.label("Date");
            ui.horizontal(|ui| {
                render_number_selector(ui, "Year", &mut self.year, &mut self.text.year, 1970..=9999);
                render_number_selector(ui, "Month", &mut self.month, &mut self.text.month, 1..=12);
                render_number_selector(ui, "Day", &mut self.day, &mut self.text.day, 1..=31);
            });
        });
    }

    pub(crate) fn render_time_editor(&mut self, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.label("Time");
            ui.horizontal(|ui| {
                render_number_selector(ui, "Hour", &mut self.hour, &mut self.text.hour, 1..=12);
                render_number_selector(
                    ui,
                    "Minute",
                    &mut self.minute,
                    &mut self.text.minute,
                    0..=59,
                );
            });
            self.render_am_pm_selector(ui);
        });
    }

    pub(crate) fn render_am_pm_selector(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(15.0);
            ui.selectable_value(&mut self.time_of_day, TimeOfDay::AM, "AM");
            ui.selectable_value(&mut self.time_of_day, TimeOfDay::PM, "PM");
        });
    }

    pub(crate) fn render_alarm_sound_selector(sound: &mut SoundName, ui: &mut egui::Ui) {
        ui.vertical(|ui| {
            ui.label("Sound");
            for name in SoundName::ALL {
                ui.selectable_value(sound, name, name.as_str());
            }
        });
    }

    pub fn render_alarm_editor(&mut self, ctx: &egui::Context) -> EditingState {
        let mut ret = EditingState::Editing;
        let title = if self.replacing.is_some() {
            "Edit Alarm"
        } else {
            "Add Alarm"
        };
        Window::new(title).collapsible(false).show(ctx, |ui| {
            self.edit_alarm(ui);
            if let Some(error) = &self.error {
                ui.colored_label(Color32::LIGHT_RED, error);
            }
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    match self.build() {
                        Ok(new_alarm) => ret = EditingState::Done(new_alarm),
                        Err(e) => self.error = Some(e.to_string()),
                    }
                } else if ui.button("Cancel").clicked() {
                    ret = EditingState::Cancelled;
                }
            });
        });
        ret
    }
}

impl From<&Alarm> for AlarmBuilder {
    /// an alarm set for 5:00 PM opens the editor at 5:00 PM
    fn from(alarm: &Alarm) -> Self {
        let mut builder = Self::at(alarm.date);
        builder.note = alarm.note_or_empty().to_string();
        builder.sound = alarm.sound;
        builder.replacing = Some(alarm.id);
        builder
    }
}

fn render_number_selector<N>(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut N,
    text: &mut String,
    range: RangeInclusive<N>,
) where
    N: Copy + PartialOrd + std::str::FromStr + ToString + std::ops::Add<Output = N>
        + std::ops::Sub<Output = N>
        + From<u8>,
{
    let one = N::from(1);
    ui.vertical(|ui| {
        ui.label(label);
        if ui.button("Up").clicked() && *value < *range.end() {
            *value = *value + one;
            *text = value.to_string();
        }
        if TextEdit::singleline(text)
            .desired_width(36.0)
            .char_limit(4)
            .ui(&mut *ui)
            .lost_focus()
        {
            // if the input value is valid, update the value
            if let Ok(parsed) = text.parse::<N>() {
                if range.contains(&parsed) {
                    *value = parsed;
                }
            }
            // sync the input value and the value regardless
            *text = value.to_string();
        }
        if ui.button("Down").clicked() && *value > *range.start() {
            *value = *value - one;
            *text = value.to_string();
        }
    });
}
