use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use shared::config::ClientConfig;

/// Writes a default client configuration in `format` ("yaml" or "json").
///
/// The file goes to `output` when given, otherwise `config.<format>` in the
/// working directory. Existing files are left alone unless `force` is set.
///
/// # Errors
/// Returns an error if the format is unsupported or writing the file fails.
pub fn generate_config(format: &str, output: Option<&Path>, force: bool) -> Result<PathBuf> {
    let config = ClientConfig::with_defaults();
    let serialized = match format {
        "yaml" | "yml" => serde_yml::to_string(&config)?,
        "json" => serde_json::to_string_pretty(&config)?,
        other => bail!("unsupported format '{other}'. Use 'yaml' or 'json'."),
    };

    let path = output.map_or_else(|| PathBuf::from(format!("config.{format}")), Path::to_path_buf);
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, serialized)
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("Configuration file '{}' generated successfully.", path.display());
    Ok(path)
}
