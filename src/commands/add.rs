use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use composekit::{AddReport, Descriptor, Registry, document, merge, reconcile};
use std::fs;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cli::AddArgs;
use crate::commands::{self, list};
use crate::prompt::{self, Prompter, TerminalPrompter, WizardContext};
use crate::ui;

pub fn run(ctx: &Context, args: AddArgs) -> Result<()> {
    prompt::require_terminal("berth add")?;
    let app_dir = commands::app_dir(&args.app)?;

    match execute(ctx, &mut TerminalPrompter, &app_dir) {
        Err(err) if prompt::is_aborted(&err) => {
            println!();
            ui::warn("Aborted; nothing was written");
            Ok(())
        }
        result => result,
    }
}

/// Collect services, show the result and write it once confirmed.
pub fn execute(ctx: &Context, prompter: &mut dyn Prompter, app_dir: &Path) -> Result<()> {
    let registry = load_registry(prompter, &ctx.infra_file())?;
    let path = commands::descriptor_path(ctx, app_dir);

    let before = if path.exists() {
        fs::read_to_string(&path).with_context(|| format!("Could not read {}", path.display()))?
    } else {
        String::new()
    };
    let mut doc = document::parse_file(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    ui::header(&format!("Adding services to {}", path.display()));
    let mut wizard = WizardContext::new(&doc, &registry, &ctx.settings);
    let specs = prompt::collect_services(prompter, &mut wizard)?;
    if specs.is_empty() {
        ui::info("No services entered; nothing to do");
        return Ok(());
    }

    let report = merge::add(&mut doc, &registry, specs)?;
    let after = document::write_string(&doc);

    summarize(&doc, &report);
    if !ctx.quiet {
        show_diff(&before, &after);
    }
    println!();

    if !prompter.confirm("Write these changes?", true)? {
        ui::warn("Aborted; nothing was written");
        return Ok(());
    }

    for dir in volume_dirs(&doc, &report, app_dir) {
        match fs::create_dir_all(&dir) {
            Ok(()) => log::debug!("ensured volume directory {}", dir.display()),
            Err(e) => ui::warn(&format!("Could not create {}: {e}", dir.display())),
        }
    }
    commands::write_and_validate(ctx, &doc, &path)
}

/// Load the registry, offering to create the infrastructure file.
///
/// Declining creation is a hard failure.
fn load_registry(prompter: &mut dyn Prompter, infra: &Path) -> Result<Registry> {
    if !infra.exists() {
        ui::warn(&format!("Infrastructure file {} does not exist", infra.display()));
        if !prompter.confirm("Create it now?", true)? {
            return Err(composekit::Error::PreconditionMissing(infra.to_path_buf()).into());
        }
        reconcile::init_infra(infra)?;
        ui::success(&format!("Created {}", infra.display()));
    }
    Registry::load(infra).with_context(|| format!("Failed to read {}", infra.display()))
}

fn summarize(doc: &Descriptor, report: &AddReport) {
    ui::section("Resulting services");
    list::print_table(doc);
    println!();
    for name in &report.added {
        println!("  {} {name}", "+".green());
    }
    for name in &report.replaced {
        println!("  {} {name} {}", "~".yellow(), "(replaces existing definition)".dimmed());
    }
}

/// Print changed lines between the old and new file text.
fn show_diff(before: &str, after: &str) {
    ui::section("Changes");
    let diff = similar::TextDiff::from_lines(before, after);
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => print!("    {}", format!("- {change}").red()),
            similar::ChangeTag::Insert => print!("    {}", format!("+ {change}").green()),
            similar::ChangeTag::Equal => {}
        }
    }
}

/// Host directories to create for the volumes of added or replaced services.
///
/// Only path-like host parts count; named volumes are managed by the
/// runtime. Relative paths resolve against the application directory.
fn volume_dirs(doc: &Descriptor, report: &AddReport, app_dir: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for name in report.added.iter().chain(&report.replaced) {
        let Some(service) = doc.service(name) else {
            continue;
        };
        for volume in &service.volumes {
            if let Some(dir) = host_dir(volume, app_dir)
                && !dirs.contains(&dir)
            {
                dirs.push(dir);
            }
        }
    }
    dirs
}

fn host_dir(volume: &str, app_dir: &Path) -> Option<PathBuf> {
    let (host, _) = volume.split_once(':')?;
    if !(host.starts_with('/') || host.starts_with('.') || host.starts_with('~')) {
        return None;
    }
    let expanded = shellexpand::tilde(host);
    let path = Path::new(expanded.as_ref());
    Some(if path.is_absolute() {
        path.to_path_buf()
    } else {
        app_dir.join(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::prompt::testing::{Answer, Answer::*, ScriptedPrompter};
    use tempfile::TempDir;

    /// Answers for one service named `name` using image nginx:1 and the
    /// given volume, attaching to nothing, with no limits.
    fn service(name: &'static str, volumes: &'static str, attach: Vec<usize>) -> Vec<Answer> {
        vec![
            Text(name),
            Text(""),
            Text("nginx:1"),
            Select(0),
            Text(""),
            Text("8080:80"),
            Text(volumes),
            Confirm(false),
            Text(""),
            Multi(attach),
            Text(""),
            Select(4),
            Confirm(false),
        ]
    }

    fn setup() -> (TempDir, Context, PathBuf) {
        let dir = TempDir::new().unwrap();
        let infra = dir.path().join("infra.yml");
        fs::write(&infra, "services: {}\nnetworks:\n  proxy:\n    external: true\n").unwrap();
        let ctx = testing::context(&infra);
        let app_dir = dir.path().join("media");
        (dir, ctx, app_dir)
    }

    #[test]
    fn test_add_writes_confirmed_services() {
        let (_dir, ctx, app_dir) = setup();
        let mut answers = service("web", "./config:/config", vec![0]);
        answers.extend([Text(""), Confirm(true)]);

        let mut prompter = ScriptedPrompter::new(answers);
        execute(&ctx, &mut prompter, &app_dir).unwrap();
        assert!(prompter.finished());

        let written = fs::read_to_string(app_dir.join("compose.yml")).unwrap();
        assert_eq!(
            written,
            "services:\n  web:\n    container_name: web\n    image: nginx:1\n    restart: unless-stopped\n    networks:\n      - proxy\n    ports:\n      - \"8080:80\"\n    volumes:\n      - ./config:/config\nnetworks:\n  proxy:\n    name: proxy\n    external: true\n"
        );
        assert!(app_dir.join("config").is_dir());
    }

    #[test]
    fn test_declined_confirmation_writes_nothing() {
        let (_dir, ctx, app_dir) = setup();
        let mut answers = service("web", "./config:/config", vec![]);
        answers.extend([Text(""), Confirm(false)]);

        let mut prompter = ScriptedPrompter::new(answers);
        execute(&ctx, &mut prompter, &app_dir).unwrap();

        assert!(!app_dir.join("compose.yml").exists());
        assert!(!app_dir.join("config").exists());
    }

    #[test]
    fn test_missing_infra_declined_is_precondition_failure() {
        let dir = TempDir::new().unwrap();
        let infra = dir.path().join("infra.yml");
        let ctx = testing::context(&infra);

        let mut prompter = ScriptedPrompter::new([Confirm(false)]);
        let err = execute(&ctx, &mut prompter, &dir.path().join("media")).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<composekit::Error>(),
            Some(composekit::Error::PreconditionMissing(_))
        ));
        assert!(!infra.exists());
    }

    #[test]
    fn test_missing_infra_created_on_request() {
        let dir = TempDir::new().unwrap();
        let infra = dir.path().join("shared").join("infra.yml");
        let ctx = testing::context(&infra);

        let mut prompter = ScriptedPrompter::new([Confirm(true), Text("")]);
        execute(&ctx, &mut prompter, &dir.path().join("media")).unwrap();

        assert_eq!(fs::read_to_string(&infra).unwrap(), reconcile::INFRA_SKELETON);
    }

    #[test]
    fn test_re_add_keeps_other_services_and_notes() {
        let (_dir, ctx, app_dir) = setup();
        fs::create_dir_all(&app_dir).unwrap();
        fs::write(
            app_dir.join("compose.yml"),
            "services:\n  db:\n    # primary store\n    image: postgres:16\n",
        )
        .unwrap();

        // db is offered as a dependency, so one more multi-select answer.
        let mut answers = vec![Text("web"), Text(""), Text("nginx:1"), Select(0), Multi(vec![])];
        answers.extend(service("web", "", vec![]).into_iter().skip(4));
        answers.extend([Text(""), Confirm(true)]);

        let mut prompter = ScriptedPrompter::new(answers);
        execute(&ctx, &mut prompter, &app_dir).unwrap();

        let written = fs::read_to_string(app_dir.join("compose.yml")).unwrap();
        assert!(written.starts_with("services:\n  db:\n    # primary store\n    image: postgres:16\n  web:\n"));
    }

    #[test]
    fn test_host_dir_only_for_paths() {
        let app = Path::new("/srv/media");
        assert_eq!(host_dir("./data:/data", app), Some(PathBuf::from("/srv/media/./data")));
        assert_eq!(host_dir("/mnt/films:/films:ro", app), Some(PathBuf::from("/mnt/films")));
        assert_eq!(host_dir("dbdata:/var/lib/postgresql", app), None);
        assert_eq!(host_dir("/just/a/container/path", app), None);
    }
}
