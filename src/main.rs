use log::{error, info};
use playlist_store::{
    config, DbManager, FsMediaResolver, PlaylistManager, PlaylistError, StoreLocation,
};

const DATABASE_DESCRIPTION: &str = "StorageDatabase";

fn open_legacy(location: &StoreLocation, name: &str, size_hint: u64) -> Option<DbManager> {
    if !DbManager::exists(location, name) {
        return None;
    }
    match DbManager::open(location, name, "1.0", DATABASE_DESCRIPTION, size_hint) {
        Ok(db) => Some(db),
        Err(err) => {
            // Legacy data is best-effort; the migration treats it as empty.
            log::warn!("Skipping legacy database {}: {}", name, err);
            None
        }
    }
}

fn run() -> Result<(), PlaylistError> {
    let config_path = config::default_config_path();
    let config = config::load_or_create(&config_path)?;
    log::set_max_level(config.logging.level_filter());

    let storage = &config.storage;
    let location = storage.location();
    let db = DbManager::open(
        &location,
        &storage.database_name,
        "",
        DATABASE_DESCRIPTION,
        storage.size_hint,
    )?;
    let legacy = open_legacy(&location, &storage.legacy_database_name, storage.size_hint);

    let (mut manager, report) = PlaylistManager::initialize(db, legacy, FsMediaResolver::new())?;
    info!(
        "Playlist store at version {} (from {:?}): {} playlists, {} tracks migrated, {} skipped",
        report.to_version,
        report.from_version,
        report.playlists_migrated,
        report.tracks_migrated,
        report.tracks_skipped
    );

    for playlist in manager.list_playlists()? {
        info!("{}: {} tracks", playlist.name, playlist.count);
    }
    Ok(())
}

fn main() {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Trace);
    clog.init();
    log::set_max_level(log::LevelFilter::Info);

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    if let Err(err) = run() {
        error!("{}", err);
        std::process::exit(1);
    }
}
