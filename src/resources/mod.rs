//! Loading of external files.
//!
//! Natively assets are read from `./assets/`; on the web they are fetched
//! from `<origin>/assets/`.

pub mod obj;

pub use obj::{GeometryProvider, ObjSource};

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    use anyhow::Context;

    let window = web_sys::window().context("no browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("cannot read the page origin: {:?}", e))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.error_for_status()?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        use anyhow::Context;

        let path = std::path::Path::new("./").join("assets").join(file_name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    Ok(txt)
}

/// Load an OBJ file from the assets. Parsing happens when geometry is requested.
pub async fn load_obj_source(file_name: &str) -> anyhow::Result<ObjSource> {
    let text = load_string(file_name).await?;
    log::info!("loaded {} ({} bytes)", file_name, text.len());
    Ok(ObjSource::new(file_name, text))
}
