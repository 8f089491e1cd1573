//! Print the groups and faces of an OBJ file without triangulating them.

use anyhow::Context;
use objscene::resources::ObjSource;

fn main() -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let path = std::env::args()
        .nth(1)
        .context("usage: obj-dump <file.obj>")?;
    let text = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?;
    let summary = ObjSource::new(&path, text).summary()?;
    log::info!("{}: {} faces in {} groups", path, summary.face_count(), summary.groups.len());
    print!("{}", summary);
    Ok(())
}
