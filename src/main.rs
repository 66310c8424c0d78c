pub mod backend;
pub mod gui;
mod logging;

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tokio::runtime::Runtime;
use tracing::info;

use crate::backend::analysis::CategoryOrder;
use crate::backend::dashboard::{DashboardController, KPI_LABEL, Kpi};
use crate::backend::export::export_aggregation;
use crate::backend::filter::{ALL_LABEL, FilterSelection};
use crate::backend::formatting::format_grouped;
use crate::backend::loader::{DatasetLoader, LoadOptions};
use crate::backend::settings::Settings;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path or http(s) URL of the complaint dataset
    #[arg(short, long)]
    source: Option<String>,

    /// Age filter ("전체" or "all" for no constraint)
    #[arg(long, default_value = ALL_LABEL)]
    age: String,

    /// Gender filter ("전체" or "all" for no constraint)
    #[arg(long, default_value = ALL_LABEL)]
    gender: String,

    /// Category order, overrides the saved setting
    #[arg(long, value_enum)]
    order: Option<CategoryOrder>,

    /// Fetch URLs without the cache-busting query parameter
    #[arg(long)]
    no_cache_bust: bool,

    /// Print the aggregation instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Print JSON in headless mode
    #[arg(long, requires = "headless")]
    json: bool,

    /// Also write the aggregation to this .csv or .json file
    #[arg(long, requires = "headless")]
    export: Option<PathBuf>,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(if args.verbose { "debug" } else { "info" });

    let mut settings = Settings::load();
    if let Some(order) = args.order {
        settings.category_order = order;
    }
    if args.no_cache_bust {
        settings.cache_bust = false;
    }
    if let Some(source) = &args.source {
        settings.data_source = Some(source.clone());
    }

    let runtime = Runtime::new().context("Failed to start async runtime")?;
    let selection = FilterSelection::from_labels(&args.age, &args.gender);

    if args.headless {
        return run_headless(&runtime, &args, &settings, &selection);
    }

    let handle = runtime.handle().clone();
    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Complaint Dashboard",
        native_options,
        Box::new(move |cc| Ok(Box::new(crate::gui::app::GuiApp::new(cc, handle, settings, selection)))),
    )
    .map_err(|e| anyhow::anyhow!("Eframe error: {}", e))?;

    Ok(())
}

fn run_headless(runtime: &Runtime, args: &Args, settings: &Settings, selection: &FilterSelection) -> Result<()> {
    let source = settings
        .data_source
        .clone()
        .context("No data source configured; pass --source")?;

    let loader = DatasetLoader::new(LoadOptions {
        cache_bust: settings.cache_bust,
    });
    let mut controller = DashboardController::new(settings.category_order);
    controller.install(runtime.block_on(loader.load(&source)));

    let model = controller.render(selection);
    if let Kpi::Error { title, detail, .. } = &model.kpi {
        bail!("{}: {}", title, detail);
    }

    if let Some(path) = &args.export {
        export_aggregation(path, &model.aggregation)?;
        info!("aggregation written to {:?}", path);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&model.aggregation)?);
    } else {
        for group in &model.aggregation.groups {
            println!("{}\t{}", group.category, format_grouped(group.count));
        }
        println!("{}\t{}", KPI_LABEL, format_grouped(model.aggregation.total));
    }
    Ok(())
}
