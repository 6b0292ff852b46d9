mod app;

use app::StudyApp;
use study_core::config::Config;
use study_core::database::db;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load();
    let conn = db::init_database(&config.db_path)
        .map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;

    if db::load_all_study_packs(&conn).unwrap_or_default().is_empty() {
        let seeded = db::new_study_pack("Biology Basics", &conn).and_then(|pack_id| {
            db::add_flashcard(pack_id, "mitochondria", "powerhouse of the cell", &conn)?;
            db::add_flashcard(pack_id, "osmosis", "diffusion of water across a membrane", &conn)?;
            db::add_flashcard(pack_id, "ribosome", "site of protein synthesis", &conn)?;
            Ok(pack_id)
        });
        match seeded {
            Ok(_) => log::info!("Sample study pack created"),
            Err(e) => log::warn!("Could not create sample study pack: {}", e),
        }
    }

    log::info!("Using database at {}", config.db_path);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 750.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Study",
        options,
        Box::new(move |_cc| Ok(Box::new(StudyApp::new(conn, config)?))),
    )
}
