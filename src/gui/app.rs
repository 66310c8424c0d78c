use eframe::egui;
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Plot};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::backend::dashboard::{ChartModel, DashboardController, Kpi, RenderModel};
use crate::backend::error::{LoadError, LoadResult};
use crate::backend::export::export_aggregation;
use crate::backend::filter::{Choice, FilterSelection};
use crate::backend::formatting::{CardFormat, format_count};
use crate::backend::headers::CanonicalField;
use crate::backend::loader::{Dataset, DatasetLoader, LoadOptions};
use crate::backend::parser::delimiter_name;
use crate::backend::settings::{Settings, Theme};
use crate::gui::windows::settings::SettingsWindow;

pub enum AppState {
    Welcome,
    Loading {
        source: String,
        receiver: Receiver<LoadResult<Dataset>>,
    },
    Dashboard,
}

pub struct GuiApp {
    state: AppState,
    controller: DashboardController,
    selection: FilterSelection,
    settings: Settings,
    settings_window: SettingsWindow,
    show_settings: bool,
    runtime: Handle,
    source_input: String,
    status: Option<String>,
}

impl GuiApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        runtime: Handle,
        settings: Settings,
        selection: FilterSelection,
    ) -> Self {
        let mut app = Self {
            state: AppState::Welcome,
            controller: DashboardController::new(settings.category_order),
            selection,
            source_input: settings.data_source.clone().unwrap_or_default(),
            settings,
            settings_window: SettingsWindow::new(),
            show_settings: false,
            runtime,
            status: None,
        };

        if let Some(source) = app.settings.data_source.clone() {
            app.start_load(&cc.egui_ctx, source);
        }
        app
    }

    /// Spawns the load on the runtime. Ignored while another load is running.
    fn start_load(&mut self, ctx: &egui::Context, source: String) {
        if matches!(self.state, AppState::Loading { .. }) {
            debug!("load already in flight, ignoring request for {}", source);
            return;
        }

        let (tx, rx) = mpsc::channel();
        let loader = DatasetLoader::new(LoadOptions {
            cache_bust: self.settings.cache_bust,
        });
        let path = source.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = loader.load(&path).await;
            let _ = tx.send(result);
            ctx.request_repaint();
        });

        self.settings.data_source = Some(source.clone());
        self.settings.add_recent_source(&source);
        self.settings.save();
        self.source_input = source.clone();
        self.status = None;
        self.state = AppState::Loading { source, receiver: rx };
    }

    fn poll_load(&mut self) {
        let finished = match &self.state {
            AppState::Loading { source, receiver } => match receiver.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => {
                    Some(Err(LoadError::fetch(source, "load task ended without a result")))
                }
            },
            _ => None,
        };

        if let Some(result) = finished {
            // Selections from a previous dataset may not exist in the new one.
            if result.is_ok() {
                self.selection = FilterSelection::default();
            }
            self.controller.install(result);
            self.state = AppState::Dashboard;
        }
    }

    fn open_file_dialog(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Delimited text", &["csv", "tsv", "txt"])
            .pick_file()
        {
            self.start_load(ctx, path.to_string_lossy().to_string());
        }
    }

    fn export_dialog(&mut self, model: &RenderModel) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .add_filter("JSON", &["json"])
            .save_file()
        {
            self.status = Some(match export_aggregation(&path, &model.aggregation) {
                Ok(()) => format!("Exported to {}", path.display()),
                Err(e) => {
                    warn!("export failed: {:#}", e);
                    format!("Export failed: {:#}", e)
                }
            });
        }
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        apply_style(ctx, self.settings.theme);
        self.poll_load();
        self.controller.set_order(self.settings.category_order);

        if self.show_settings {
            let mut open = true;
            let requested = self.settings_window.show(ctx, &mut open, &mut self.settings);
            if !open {
                self.show_settings = false;
            }
            if let Some(source) = requested {
                self.start_load(ctx, source);
            }
        }

        // Drag & drop a dataset onto the window
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.start_load(ctx, path.to_string_lossy().to_string());
        }

        let loading = match &self.state {
            AppState::Loading { source, .. } => Some(source.clone()),
            _ => None,
        };
        if let Some(source) = loading {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(100.0);
                    ui.heading(format!("Loading {}...", source));
                    ui.spinner();
                });
            });
        } else if matches!(self.state, AppState::Welcome) {
            self.render_welcome(ctx);
        } else {
            self.render_dashboard(ctx);
        }
    }
}

impl GuiApp {
    fn render_welcome(&mut self, ctx: &egui::Context) {
        let mut requested = None;
        let mut pick_file = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(100.0);
                ui.heading(egui::RichText::new("민원 대시보드").size(36.0).strong());
                ui.label(
                    egui::RichText::new("Complaint counts by category, age and gender")
                        .size(16.0)
                        .color(egui::Color32::from_gray(150)),
                );
                ui.add_space(30.0);

                ui.horizontal(|ui| {
                    ui.label("Dataset path or URL");
                    let response = ui.text_edit_singleline(&mut self.source_input);
                    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if (ui.button("Load").clicked() || submitted) && !self.source_input.trim().is_empty() {
                        requested = Some(self.source_input.trim().to_string());
                    }
                });
                ui.add_space(10.0);
                if ui
                    .add(egui::Button::new(egui::RichText::new("Open File").size(18.0)).min_size(egui::vec2(200.0, 44.0)))
                    .clicked()
                {
                    pick_file = true;
                }

                if !self.settings.recent_sources.is_empty() {
                    ui.add_space(20.0);
                    ui.label(egui::RichText::new("Recent").strong());
                    for recent in &self.settings.recent_sources {
                        if ui.link(recent).clicked() {
                            requested = Some(recent.clone());
                        }
                    }
                }
            });
        });

        if pick_file {
            self.open_file_dialog(ctx);
        } else if let Some(source) = requested {
            self.start_load(ctx, source);
        }
    }

    fn render_dashboard(&mut self, ctx: &egui::Context) {
        // Full recompute from the current selection every frame.
        let model = self.controller.render(&self.selection);
        let mut reload = false;
        let mut export = false;

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("민원 대시보드").strong());
                if let Some(source) = &self.settings.data_source {
                    ui.label(egui::RichText::new(source).color(egui::Color32::from_gray(150)));
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Settings").clicked() {
                        self.show_settings = true;
                    }
                    ui.separator();
                    if ui
                        .add_enabled(!model.aggregation.is_empty(), egui::Button::new("Export"))
                        .clicked()
                    {
                        export = true;
                    }
                    if ui.button("Reload").clicked() {
                        reload = true;
                    }
                });
            });
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(dataset) = self.controller.dataset() {
                    let columns: Vec<&str> = CanonicalField::all()
                        .iter()
                        .map(|field| dataset.header_map().header(*field))
                        .collect();
                    ui.label(format!(
                        "{} · {} rows · {} delimited · columns {}",
                        dataset.source(),
                        dataset.len(),
                        delimiter_name(dataset.delimiter()),
                        columns.join(" / ")
                    ));
                    if dataset.coerced_counts() > 0 {
                        ui.separator();
                        ui.label(format!("{} non-numeric counts read as 0", dataset.coerced_counts()));
                    }
                }
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        let age_options = self.controller.age_options();
        let gender_options = self.controller.gender_options();

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.horizontal(|ui| {
                    filter_combo(ui, "age_filter", "연령", &age_options, &mut self.selection.age);
                    ui.add_space(16.0);
                    filter_combo(ui, "gender_filter", "성별", &gender_options, &mut self.selection.gender);
                });
                ui.separator();

                render_kpi(ui, &model.kpi);
                ui.add_space(12.0);

                match &model.chart {
                    Some(chart) => render_chart(ui, chart),
                    None => {
                        if matches!(model.kpi, Kpi::Total { .. }) {
                            ui.label(egui::RichText::new("No complaints match the current filters.").weak());
                        }
                    }
                }

                if self.settings.show_cards && !model.cards.is_empty() {
                    ui.add_space(12.0);
                    render_cards(ui, &model);
                }

                if !model.aggregation.is_empty() {
                    ui.add_space(12.0);
                    render_table(ui, &model);
                }
            });
        });

        if reload {
            if let Some(source) = self.settings.data_source.clone() {
                self.start_load(ctx, source);
            }
        }
        if export {
            self.export_dialog(&model);
        }
    }
}

fn filter_combo(ui: &mut egui::Ui, id: &str, label: &str, options: &[String], choice: &mut Choice) {
    ui.label(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(choice.label().to_string())
        .show_ui(ui, |ui| {
            for option in options {
                let candidate = Choice::parse(option);
                let selected = *choice == candidate;
                if ui.selectable_label(selected, option.as_str()).clicked() {
                    *choice = candidate;
                }
            }
        });
}

fn render_kpi(ui: &mut egui::Ui, kpi: &Kpi) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_min_width(240.0);
        match kpi {
            Kpi::Total { label, value } => {
                ui.label(egui::RichText::new(label).size(14.0));
                ui.label(egui::RichText::new(value).size(32.0).strong());
            }
            Kpi::Error { title, value, detail } => {
                ui.label(egui::RichText::new(title).size(14.0).color(egui::Color32::from_rgb(220, 80, 80)));
                ui.label(egui::RichText::new(value).size(32.0).strong());
                ui.label(egui::RichText::new(detail).small().weak());
            }
            Kpi::Pending => {
                ui.spinner();
            }
        }
    });
}

fn render_chart(ui: &mut egui::Ui, chart: &ChartModel) {
    ui.heading(&chart.title);

    let bars: Vec<Bar> = chart
        .values
        .iter()
        .zip(chart.labels.iter())
        .enumerate()
        .map(|(i, (value, label))| Bar::new(i as f64, *value as f64).name(label).width(0.6))
        .collect();

    let labels = chart.labels.clone();
    let mut plot = Plot::new("category_chart")
        .height(300.0)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .include_y(0.0)
        .x_axis_formatter(move |mark, _range| {
            let index = mark.value.round();
            if (mark.value - index).abs() > f64::EPSILON || index < 0.0 {
                return String::new();
            }
            labels.get(index as usize).cloned().unwrap_or_default()
        });
    if chart.show_legend {
        plot = plot.legend(Legend::default());
    }

    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(
            BarChart::new(chart.series_label.clone(), bars).color(egui::Color32::from_rgba_unmultiplied(75, 192, 192, 153)),
        );
    });
}

fn render_cards(ui: &mut egui::Ui, model: &RenderModel) {
    ui.horizontal_wrapped(|ui| {
        for card in &model.cards {
            let format = CardFormat::for_emphasis(card.emphasis);
            let mut frame = egui::Frame::group(ui.style()).inner_margin(egui::Margin::same(10));
            if let Some([r, g, b, a]) = format.bg_color {
                frame = frame.fill(egui::Color32::from_rgba_unmultiplied(r, g, b, a));
            }
            let text_color = format
                .text_color
                .map(|[r, g, b, a]| egui::Color32::from_rgba_unmultiplied(r, g, b, a));

            frame.show(ui, |ui| {
                ui.set_min_width(140.0);
                ui.vertical(|ui| {
                    let mut title = egui::RichText::new(&card.category).strong();
                    let mut count = egui::RichText::new(format_count(card.count)).size(18.0);
                    if let Some(color) = text_color {
                        title = title.color(color);
                        count = count.color(color);
                    }
                    ui.label(title);
                    ui.label(count);
                });
            });
        }
    });
}

fn render_table(ui: &mut egui::Ui, model: &RenderModel) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::initial(240.0).resizable(true))
        .column(Column::remainder())
        .header(24.0, |mut header| {
            header.col(|ui| {
                ui.strong("분야");
            });
            header.col(|ui| {
                ui.strong("건수");
            });
        })
        .body(|mut body| {
            for group in &model.aggregation.groups {
                body.row(22.0, |mut row| {
                    row.col(|ui| {
                        ui.label(&group.category);
                    });
                    row.col(|ui| {
                        ui.label(format_count(group.count));
                    });
                });
            }
        });
}

fn apply_style(ctx: &egui::Context, theme: Theme) {
    match theme {
        Theme::System => {
            ctx.set_visuals(egui::Visuals::default());
        }
        Theme::Dark => {
            let mut visuals = egui::Visuals::dark();
            visuals.window_corner_radius = 8.0.into();
            visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(20, 20, 25);
            ctx.set_visuals(visuals);
        }
        Theme::Light => {
            ctx.set_visuals(egui::Visuals::light());
        }
    }
}
