mod annotation;
mod app;
mod export;
mod matrix;
mod render;
mod session;
mod settings;
mod viewport;

use std::path::PathBuf;

use eframe::egui;

const USAGE: &str = "Usage: matrix-labeler [MATRIX.txt]";

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        println!("{USAGE}");
        return Ok(());
    }
    let initial: Option<PathBuf> = match args.opt_free_from_str() {
        Ok(path) => path,
        Err(err) => {
            eprintln!("{err}\n{USAGE}");
            std::process::exit(2);
        }
    };
    let rest = args.finish();
    if !rest.is_empty() {
        eprintln!("unexpected arguments: {rest:?}\n{USAGE}");
        std::process::exit(2);
    }

    let settings = settings::Settings::load_or_default();

    let title = match &initial {
        Some(path) => format!(
            "matrix-labeler — {}",
            path.file_name()
                .unwrap_or_default()
                .to_str()
                .unwrap_or("")
        ),
        None => "matrix-labeler".to_string(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 800.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(app::MatrixLabelerApp::new(settings, initial)))),
    )
}
