use prodtrack::logging::init_logging;
use prodtrack::source::MemorySource;
use prodtrack::{ProjectContext, VersionResolver};
use std::path::PathBuf;

/// Print the next version label for the unit of work described by the HAL_* environment,
/// falling back to the user config file, then to the bundled demo context.
fn main() {
    let _logger = init_logging(std::env::var("PRODTRACK_LOG").ok().as_deref()).unwrap();

    let args = std::env::args().collect::<Vec<String>>();
    let snapshot = match args.get(1) {
        None => PathBuf::from("./demos/assets/tracker.json"),
        Some(p) => PathBuf::from(p),
    };
    let suffix = args.get(2).map(|s| s.as_str());

    let context = ProjectContext::from_env()
        .or_else(|_| ProjectContext::load(ProjectContext::default_path()?))
        .or_else(|_| ProjectContext::load("./demos/assets/context.json"))
        .unwrap();

    let source = MemorySource::load(&snapshot).unwrap();
    let mut resolver = VersionResolver::new(source, context);
    match resolver.resolve_next(suffix) {
        Ok(result) => {
            println!("{} existing version(s)", result.existing_count);
            for label in &result.existing_labels {
                println!("  {label}");
            }
            println!("next: {}", result.next_label);
        }
        Err(e) => println!("Error: {e}"),
    }
}
