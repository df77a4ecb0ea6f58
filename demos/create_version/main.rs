use prodtrack::logging::init_logging;
use prodtrack::models::version_request::VersionRequest;
use prodtrack::source::MemorySource;
use prodtrack::{ProjectContext, VersionResolver};

/// Publish a version against the bundled snapshot, then show what the service holds afterwards.
fn main() {
    let _logger = init_logging(Some("debug")).unwrap();

    let context = ProjectContext::load("./demos/assets/context.json").unwrap();
    let source = MemorySource::load("./demos/assets/tracker.json").unwrap();
    let mut resolver = VersionResolver::new(&source, context);

    let (first, last) = {
        let shot = resolver
            .entity("Shot", 1204, Some(&["code", "sg_cut_in", "sg_cut_out"][..]))
            .unwrap();
        (
            shot["sg_cut_in"].as_i64().unwrap_or(1001),
            shot["sg_cut_out"].as_i64().unwrap_or(1001),
        )
    };

    let request = VersionRequest::new()
        .thumbnail(std::env::args().nth(1).unwrap_or_default())
        .frame_range(first, last)
        .suffix("for_review");

    match resolver.create_version(&request) {
        Ok(version) => println!("{}", serde_json::to_string_pretty(&version).unwrap()),
        Err(e) => println!("Error: {e}"),
    }

    for version in source.records("Version") {
        println!("{} {}", version["id"], version["code"]);
    }
}
