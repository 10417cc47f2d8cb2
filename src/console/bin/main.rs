use anyhow::Result;
use dialoguer::Confirm;
use libms::console::store::SnapshotStore;
use libms::console::ui::Console;
use libms::core::domain::Configuration;
use libms::lending::domain::service::Library;
use libms::utils::trace::setup_tracing;

fn main() -> Result<()> {
    setup_tracing();

    let store = SnapshotStore::from_env();
    let library = build_library(&store)?;
    Console::new(library, store).run()
}

fn build_library(store: &SnapshotStore) -> Result<Library> {
    if store.exists() {
        let load_saved = Confirm::new()
            .with_prompt(format!("Load saved data from {}?", store.path().display()))
            .default(true)
            .interact()?;
        if load_saved {
            match store.load().and_then(|snapshot| Ok(Library::restore(snapshot)?)) {
                Ok(library) => {
                    println!("Library restored from {}", store.path().display());
                    return Ok(library);
                }
                Err(err) => println!("Could not load saved data: {:#}; starting fresh", err),
            }
        }
    }
    Ok(Library::new(Configuration::new()))
}
