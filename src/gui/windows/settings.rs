use eframe::egui;

use crate::backend::analysis::CategoryOrder;
use crate::backend::settings::{Settings, Theme};

pub struct SettingsWindow {
    selected_tab: SettingsTab,
    source_edit: Option<String>,
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum SettingsTab {
    Data,
    Display,
}

impl SettingsWindow {
    pub fn new() -> Self {
        Self {
            selected_tab: SettingsTab::Data,
            source_edit: None,
        }
    }

    /// Draws the window. Returns a source to load when the user asks for one.
    pub fn show(&mut self, ctx: &egui::Context, open: &mut bool, settings: &mut Settings) -> Option<String> {
        let mut requested = None;

        egui::Window::new("Settings")
            .open(open)
            .min_width(400.0)
            .min_height(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.selected_tab, SettingsTab::Data, "Data");
                    ui.selectable_value(&mut self.selected_tab, SettingsTab::Display, "Display");
                });
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| match self.selected_tab {
                    SettingsTab::Data => requested = self.show_data(ui, settings),
                    SettingsTab::Display => Self::show_display(ui, settings),
                });

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save Settings").clicked() {
                        settings.save();
                    }
                    if ui.button("Reset to Defaults").clicked() {
                        Settings::reset();
                        *settings = Settings::default();
                        self.source_edit = None;
                    }
                });
            });

        requested
    }

    fn show_data(&mut self, ui: &mut egui::Ui, settings: &mut Settings) -> Option<String> {
        let mut requested = None;

        ui.heading("Source");
        let edit = self
            .source_edit
            .get_or_insert_with(|| settings.data_source.clone().unwrap_or_default());
        ui.horizontal(|ui| {
            ui.text_edit_singleline(edit);
            if ui.button("Load").clicked() && !edit.trim().is_empty() {
                requested = Some(edit.trim().to_string());
            }
        });
        ui.checkbox(&mut settings.cache_bust, "Bypass caches when fetching URLs");

        ui.separator();
        ui.heading("Recent Sources");
        ui.add(egui::Slider::new(&mut settings.max_recent_sources, 1..=20).text("Max Recent Sources"));
        for recent in &settings.recent_sources {
            if ui.link(recent).clicked() {
                requested = Some(recent.clone());
            }
        }
        if ui.button("Clear Recent Sources").clicked() {
            settings.recent_sources.clear();
        }

        if let Some(source) = &requested {
            self.source_edit = Some(source.clone());
        }
        requested
    }

    fn show_display(ui: &mut egui::Ui, settings: &mut Settings) {
        ui.heading("Theme");
        egui::ComboBox::from_id_salt("theme_selector")
            .selected_text(settings.theme.name())
            .show_ui(ui, |ui| {
                for theme in Theme::all() {
                    ui.selectable_value(&mut settings.theme, *theme, theme.name());
                }
            });

        ui.separator();
        ui.heading("Categories");
        egui::ComboBox::from_id_salt("order_selector")
            .selected_text(settings.category_order.name())
            .show_ui(ui, |ui| {
                for order in CategoryOrder::all() {
                    ui.selectable_value(&mut settings.category_order, *order, order.name());
                }
            });
        ui.checkbox(&mut settings.show_cards, "Show category cards");
    }
}
