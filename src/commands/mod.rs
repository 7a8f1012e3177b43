pub mod add;
pub mod build;
pub mod list;
pub mod remove;
pub mod settings;

use anyhow::{Context as AnyhowContext, Result, bail};
use composekit::{CommandValidator, Descriptor, Validator, Verdict, document};
use std::fs;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::{progress, ui};

/// Directory of an application, relative to the current directory.
pub fn app_dir(app: &str) -> Result<PathBuf> {
    let app = app.trim();
    if app.is_empty() {
        bail!("Application name must not be empty");
    }
    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    Ok(cwd.join(app))
}

/// The descriptor file inside an application directory.
pub fn descriptor_path(ctx: &Context, app_dir: &Path) -> PathBuf {
    app_dir.join(&ctx.settings.compose_file)
}

/// Write a descriptor, then run the configured validator on it.
///
/// Validation problems are reported, never returned: the file stays
/// written either way.
pub fn write_and_validate(ctx: &Context, doc: &Descriptor, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;
    }
    document::write_file(doc, path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    ui::success(&format!("Wrote {}", path.display()));

    let Some(validator) = CommandValidator::from_argv(&ctx.settings.validator) else {
        ui::dim("Validation disabled");
        return Ok(());
    };
    validate(ctx, &validator, path);
    Ok(())
}

fn validate(ctx: &Context, validator: &CommandValidator, path: &Path) {
    if ctx.verbose > 0 {
        ui::dim(&format!("Running {} -f {} config", validator.command_line(), path.display()));
    }

    let pb = (!ctx.quiet).then(|| progress::spinner("Validating..."));
    let verdict = validator.validate(path);
    let clear = |pb: Option<indicatif::ProgressBar>| {
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
    };

    match verdict {
        Verdict::Valid => match pb {
            Some(pb) => progress::finish_success(&pb, "Compose file is valid"),
            None => ui::success("Compose file is valid"),
        },
        Verdict::Invalid(message) => {
            clear(pb);
            ui::warn("Validation failed; the file was written anyway");
            for line in message.lines() {
                ui::dim(line);
            }
        }
        Verdict::Unavailable(reason) => match pb {
            Some(pb) => progress::finish_warn(&pb, &format!("Skipped validation: {reason}")),
            None => ui::warn(&format!("Skipped validation: {reason}")),
        },
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::Context;
    use crate::config::Settings;
    use std::path::{Path, PathBuf};

    /// A quiet context whose validator always succeeds.
    pub fn context(infra: &Path) -> Context {
        Context {
            verbose: 0,
            quiet: true,
            config_path: PathBuf::from("/nonexistent/berth/config.toml"),
            settings: Settings {
                validator: vec!["true".to_string()],
                ..Default::default()
            },
            infra_override: Some(infra.to_path_buf()),
        }
    }
}
