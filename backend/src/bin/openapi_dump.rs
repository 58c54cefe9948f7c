//! Write the proxy's OpenAPI document to stdout as pretty JSON.

use std::io::Write;

use audio_proxy::ApiDoc;
use color_eyre::eyre::Result;
use utoipa::OpenApi;

fn main() -> Result<()> {
    color_eyre::install()?;
    let json = ApiDoc::openapi().to_pretty_json()?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}
