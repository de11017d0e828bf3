use eframe::egui::{Color32, Frame, Response, RichText, Ui, Widget};

use crate::notification::AuthorizationStatus;

const ACCENT: Color32 = Color32::from_rgb(255, 149, 0);

/// asks for notification permission, shown while alarms can't be scheduled
pub struct PermissionBanner {
    status: AuthorizationStatus,
}

impl PermissionBanner {
    #[must_use]
    pub const fn new(status: AuthorizationStatus) -> Self {
        Self { status }
    }

    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self.status {
            AuthorizationStatus::NotDetermined => "Allow notifications to receive alarm alerts. This is optional but recommended for the best experience.",
            AuthorizationStatus::Denied => "Notifications are disabled. You can enable them in Settings to receive alarm alerts.",
            _ => "Enable notifications to receive alarm alerts.",
        }
    }

    #[must_use]
    pub const fn button_text(&self) -> &'static str {
        match self.status {
            AuthorizationStatus::NotDetermined => "Allow Notifications",
            AuthorizationStatus::Denied => "Open Settings",
            _ => "Enable",
        }
    }
}

impl Widget for PermissionBanner {
    /// the response is the button's
    fn ui(self, ui: &mut Ui) -> Response {
        Frame::group(ui.style())
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("🔔").color(ACCENT).size(20.0));
                    ui.vertical(|ui| {
                        ui.strong("Enable Notifications");
                        ui.label(RichText::new(self.message()).small());
                    });
                });
                ui.button(RichText::new(self.button_text()).color(ACCENT))
            })
            .inner
    }
}
