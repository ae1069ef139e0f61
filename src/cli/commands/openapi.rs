use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, trace};
use utoipa::OpenApi;

use crate::cli::SpecFormat;
use crate::schemas::ApiDoc;

/// Render the OpenAPI document in `format`
pub fn render_openapi(format: SpecFormat) -> Result<String> {
    let doc = ApiDoc::openapi();
    let rendered = match format {
        SpecFormat::Json => serde_json::to_string_pretty(&doc)?,
        SpecFormat::Yaml => serde_yaml::to_string(&doc)?,
    };
    Ok(rendered)
}

pub fn export_openapi(format: SpecFormat, output: Option<&Path>) -> Result<()> {
    trace!("Entering export_openapi function");
    let rendered = render_openapi(format)?;

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("OpenAPI document written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
