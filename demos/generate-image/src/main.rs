use std::sync::Arc;

use aiimage_rs::core::storage::MemoryDraftStore;
use aiimage_rs::types::{CallerContext, DraftFileResult, FileLocation, GenerationRequest, SourceImage};
use aiimage_rs::{ImageGen, ImageGenConfig};
use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

// Run with:
//   AIIMAGE_API_USER=... AIIMAGE_API_SECRET=... cargo run -p generate-image -- "a lighthouse at dusk"
// Edit an existing image instead:
//   cargo run -p generate-image -- "add a rainbow" path/to/source.png
// Optional:
//   AIIMAGE_REGION=useast1 (default), AIIMAGE_SERVER=cloud.poodll.com (default)
//   AIIMAGE_OUT=out.png writes the stored draft bytes to disk
//   RUST_LOG=aiimage=debug

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aiimage=info")),
        )
        .init();

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "a lighthouse at dusk, watercolor".to_string());
    let source = std::env::args().nth(2);

    let config = ImageGenConfig::from_env();
    if !config.relay.has_credentials() {
        eprintln!("Set AIIMAGE_API_USER and AIIMAGE_API_SECRET before running.");
        std::process::exit(1);
    }

    let store = Arc::new(MemoryDraftStore::new("http://localhost"));
    let images = ImageGen::create_simple(config, None, store.clone())?;

    let caller = CallerContext {
        user_id: 2,
        username: std::env::var("USER").unwrap_or_else(|_| "demo".into()),
        user_context_id: 5,
        system_context_id: 1,
    };
    let draft_item_id = 1;

    let result: DraftFileResult = match source {
        Some(path) => {
            let bytes = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
            let request = GenerationRequest::edit(prompt, SourceImage::new(path, bytes))?;
            match images
                .try_edit_image(&request, draft_item_id, "edited.png", &caller)
                .await
            {
                Ok(result) => result,
                Err(err) => bail!("edit failed ({}): {}", err.category(), err.format_details()),
            }
        }
        None => {
            let request = GenerationRequest::generate(prompt)?;
            match images
                .try_generate_image(&request, draft_item_id, "generated.png", &caller)
                .await
            {
                Ok(result) => result,
                Err(err) => bail!(
                    "generation failed ({}): {}",
                    err.category(),
                    err.format_details()
                ),
            }
        }
    };

    println!("Draft URL: {}", result.draft_url);
    println!("Draft item: {}, filename: {}", result.draft_item_id, result.filename);

    if let Ok(out) = std::env::var("AIIMAGE_OUT") {
        let location =
            FileLocation::user_draft(caller.user_context_id, draft_item_id, &result.filename);
        let bytes = store
            .get_content(&location)
            .context("draft content missing from store")?;
        std::fs::write(&out, &bytes).with_context(|| format!("writing {out}"))?;
        println!("Wrote {} bytes to {out}", bytes.len());
    }

    Ok(())
}
