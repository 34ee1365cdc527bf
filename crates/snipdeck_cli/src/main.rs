//! Command-line front end for a local snipdeck data directory.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use serde_json::{json, Value};
use snipdeck_core::logging::init_tracing;
use snipdeck_core::filter::FilterOption;
use snipdeck_core::metadata::CleanupReport;
use snipdeck_core::models::LegacySnippetRecord;
use snipdeck_core::{
    compose, Config, FilterCriteria, JsonStore, LabelMode, MetadataKind, SelectionState, Snippet,
    SnippetDraft, SnippetEngine, SnippetStore,
};
use std::io;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "snipdeck", about = "Compose prompts from reusable snippets", version)]
struct Cli {
    /// Data directory (can also be set via SNIPDECK_DATA_DIR)
    #[arg(short, long, env = "SNIPDECK_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Category,
    Label,
}

impl From<KindArg> for MetadataKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Category => MetadataKind::Category,
            KindArg::Label => MetadataKind::Label,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// List snippets, optionally filtered
    List {
        /// Category bubble (repeatable, OR-combined)
        #[arg(short, long)]
        category: Vec<String>,
        /// Label bubble (repeatable)
        #[arg(short, long)]
        label: Vec<String>,
        /// How label bubbles combine: and | or
        #[arg(short, long)]
        mode: Option<LabelMode>,
        /// Whitespace-separated search terms
        #[arg(short, long)]
        search: Option<String>,
    },
    Show {
        snippet: String,
    },
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        category: String,
        #[arg(short, long)]
        prompt: String,
        /// Comma-separated labels
        #[arg(short, long, default_value = "")]
        labels: String,
        #[arg(short, long)]
        exclusive: bool,
    },
    Edit {
        snippet: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        prompt: Option<String>,
        /// Comma-separated labels, replacing the current set
        #[arg(short, long)]
        labels: Option<String>,
        #[arg(short, long)]
        exclusive: Option<bool>,
    },
    Delete {
        #[arg(required = true)]
        snippets: Vec<String>,
    },
    Clone {
        snippet: String,
    },
    /// Select snippets in argument order and print the composition
    Compose {
        #[arg(required = true)]
        snippets: Vec<String>,
        /// Override the configured separator
        #[arg(long)]
        separator: Option<String>,
    },
    Categories,
    Labels,
    /// Show filter bubbles: categories and labels in use, with counts
    Bubbles {
        /// Mark these categories active
        #[arg(short, long)]
        category: Vec<String>,
        /// Mark these labels active
        #[arg(short, long)]
        label: Vec<String>,
    },
    NewCategory {
        name: String,
        #[arg(long)]
        sort_order: Option<i32>,
        #[arg(long)]
        color: Option<String>,
    },
    NewLabel {
        name: String,
    },
    Rename {
        #[arg(value_enum)]
        kind: KindArg,
        current: String,
        new_name: String,
    },
    /// Change a category's sort order or color (empty color clears it)
    Style {
        category: String,
        #[arg(long)]
        sort_order: Option<i32>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete an unused category or label
    DeleteMeta {
        #[arg(value_enum)]
        kind: KindArg,
        name: String,
    },
    /// Move every reference from SOURCE to TARGET, then delete SOURCE
    Merge {
        #[arg(value_enum)]
        kind: KindArg,
        source: String,
        target: String,
    },
    /// Report unused categories and labels
    Cleanup {
        /// Remove them instead of only reporting
        #[arg(long)]
        remove: bool,
    },
    /// Import a JSON array of name-based snippet rows
    ImportLegacy {
        file: PathBuf,
    },
    /// Create placeholder metadata for orphaned references
    Repair,
}

impl Commands {
    fn action(&self) -> &'static str {
        match self {
            Commands::Completions { .. } => "Completions",
            Commands::List { .. } => "List",
            Commands::Show { .. } => "Show",
            Commands::Add { .. } => "Add",
            Commands::Edit { .. } => "Edit",
            Commands::Delete { .. } => "Delete",
            Commands::Clone { .. } => "Clone",
            Commands::Compose { .. } => "Compose",
            Commands::Categories => "Categories",
            Commands::Labels => "Labels",
            Commands::Bubbles { .. } => "Bubbles",
            Commands::NewCategory { .. } => "New category",
            Commands::NewLabel { .. } => "New label",
            Commands::Rename { .. } => "Rename",
            Commands::Style { .. } => "Style",
            Commands::DeleteMeta { .. } => "Delete metadata",
            Commands::Merge { .. } => "Merge",
            Commands::Cleanup { .. } => "Cleanup",
            Commands::ImportLegacy { .. } => "Import",
            Commands::Repair => "Repair",
        }
    }
}

fn encode(value: &Value) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("output encoding error: {}", err))
}

fn resolve_snippet(engine: &SnippetEngine, key: &str) -> Result<Uuid, String> {
    let key = key.trim();
    if let Ok(id) = Uuid::parse_str(key) {
        if engine.snippets().contains(&id) {
            return Ok(id);
        }
    }
    let matches: Vec<Uuid> = engine
        .snippets()
        .iter()
        .filter(|snippet| snippet.name.eq_ignore_ascii_case(key))
        .map(|snippet| snippet.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(format!("no snippet matches '{}'", key)),
        _ => Err(format!(
            "'{}' matches {} snippets; use an id",
            key,
            matches.len()
        )),
    }
}

fn resolve_metadata(engine: &SnippetEngine, kind: MetadataKind, key: &str) -> Result<Uuid, String> {
    if let Ok(id) = Uuid::parse_str(key.trim()) {
        if engine.metadata().contains(kind, &id) {
            return Ok(id);
        }
    }
    engine
        .metadata()
        .find_by_name(kind, key)
        .ok_or_else(|| format!("{} '{}' not found", kind, key.trim()))
}

fn build_criteria(
    engine: &SnippetEngine,
    categories: &[String],
    labels: &[String],
    mode: Option<LabelMode>,
    search: Option<String>,
) -> Result<FilterCriteria, String> {
    let categories = categories
        .iter()
        .map(|name| resolve_metadata(engine, MetadataKind::Category, name))
        .collect::<Result<Vec<_>, _>>()?;
    let labels = labels
        .iter()
        .map(|name| resolve_metadata(engine, MetadataKind::Label, name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FilterCriteria::new()
        .with_categories(categories)
        .with_labels(labels)
        .with_label_mode(mode.unwrap_or(engine.config().default_label_mode))
        .with_search(search.unwrap_or_default()))
}

fn label_names(engine: &SnippetEngine, snippet: &Snippet) -> Vec<String> {
    let mut names: Vec<String> = snippet
        .label_ids
        .iter()
        .filter_map(|id| engine.metadata().name_of(MetadataKind::Label, id))
        .map(str::to_string)
        .collect();
    names.sort();
    names
}

fn snippet_json(engine: &SnippetEngine, snippet: &Snippet) -> Value {
    json!({
        "id": snippet.id,
        "name": snippet.name,
        "category": engine
            .metadata()
            .name_of(MetadataKind::Category, &snippet.category_id),
        "labels": label_names(engine, snippet),
        "prompt_text": snippet.prompt_text,
        "exclusive": snippet.exclusive,
        "created_at": snippet.created_at,
    })
}

fn format_snippet_rows(engine: &SnippetEngine, ids: &[Uuid], json: bool) -> Result<String, String> {
    let snippets: Vec<&Snippet> = ids
        .iter()
        .filter_map(|id| engine.snippets().get(id))
        .collect();
    if json {
        let values: Vec<Value> = snippets
            .iter()
            .map(|snippet| snippet_json(engine, snippet))
            .collect();
        return encode(&Value::Array(values));
    }

    let rows: Vec<String> = snippets
        .iter()
        .map(|snippet| {
            let category = engine
                .metadata()
                .name_of(MetadataKind::Category, &snippet.category_id)
                .unwrap_or("?");
            let marker = if snippet.exclusive { "!" } else { " " };
            format!(
                "{:<36} {}{:<30} {:<16} {}",
                snippet.id,
                marker,
                snippet.name,
                category,
                label_names(engine, snippet).join(",")
            )
        })
        .collect();
    Ok(rows.join("\n"))
}

fn format_snippet_detail(engine: &SnippetEngine, snippet: &Snippet, json: bool) -> Result<String, String> {
    if json {
        return encode(&snippet_json(engine, snippet));
    }
    let category = engine
        .metadata()
        .name_of(MetadataKind::Category, &snippet.category_id)
        .unwrap_or("?");
    Ok(format!(
        "{} ({})\ncategory: {}\nlabels: {}\nexclusive: {}\n\n{}",
        snippet.name,
        snippet.id,
        category,
        label_names(engine, snippet).join(", "),
        snippet.exclusive,
        snippet.prompt_text
    ))
}

fn format_category_rows(engine: &SnippetEngine, json: bool) -> Result<String, String> {
    let categories = engine.metadata().categories();
    if json {
        let values = serde_json::to_value(&categories)
            .map_err(|err| format!("output encoding error: {}", err))?;
        return encode(&values);
    }
    Ok(categories
        .iter()
        .map(|c| {
            format!(
                "{:<36} {:<24} order={:<4} used={:<5} {}",
                c.id,
                c.name,
                c.sort_order,
                c.usage_count,
                c.color.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

fn format_label_rows(engine: &SnippetEngine, json: bool) -> Result<String, String> {
    let labels = engine.metadata().labels();
    if json {
        let values =
            serde_json::to_value(&labels).map_err(|err| format!("output encoding error: {}", err))?;
        return encode(&values);
    }
    Ok(labels
        .iter()
        .map(|l| format!("{:<36} {:<24} used={}", l.id, l.name, l.usage_count))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn format_bubble_rows(engine: &SnippetEngine, json: bool) -> Result<String, String> {
    let options = engine.filter_options();
    if json {
        let value =
            serde_json::to_value(&options).map_err(|err| format!("output encoding error: {}", err))?;
        return encode(&value);
    }
    let row = |kind: &str, option: &FilterOption| {
        let marker = if option.active { "*" } else { " " };
        format!("{}{:<9} {:<24} {}", marker, kind, option.name, option.count)
    };
    Ok(options
        .categories
        .iter()
        .map(|option| row("category", option))
        .chain(options.labels.iter().map(|option| row("label", option)))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn format_compose_output(text: Option<&str>, selected: &[Uuid], json: bool) -> Result<String, String> {
    if json {
        return encode(&json!({ "selected": selected, "text": text }));
    }
    Ok(compose::preview_text(text).to_string())
}

fn format_cleanup_output(report: &CleanupReport, removed: bool, json: bool) -> Result<String, String> {
    if json {
        return encode(&json!({
            "categories_removed": report.categories_removed,
            "labels_removed": report.labels_removed,
            "categories_unused": report.categories_unused,
            "labels_unused": report.labels_unused,
        }));
    }
    if removed {
        Ok(format!(
            "Removed {} categories and {} labels",
            report.categories_removed, report.labels_removed
        ))
    } else {
        Ok(format!(
            "Unused: {} categories, {} labels (pass --remove to delete)",
            report.categories_unused, report.labels_unused
        ))
    }
}

fn print_output(output: String) {
    if !output.is_empty() {
        println!("{}", output);
    }
}

fn run(command: Commands, json: bool, config: Config) -> Result<(), String> {
    let store = JsonStore::open(config.data_dir.clone()).map_err(|err| err.to_string())?;
    tracing::debug!("Using data directory {}", store.data_dir().display());

    if let Commands::Repair = command {
        let snapshot = store.load().map_err(|err| err.to_string())?;
        let (engine, (categories, labels)) =
            SnippetEngine::from_snapshot_adopting_orphans(config, snapshot)
                .map_err(|err| err.to_string())?;
        engine.save(&store).map_err(|err| err.to_string())?;
        print_output(if json {
            encode(&json!({ "categories_adopted": categories, "labels_adopted": labels }))?
        } else {
            format!("Adopted {} categories and {} labels", categories, labels)
        });
        return Ok(());
    }

    let mut engine = SnippetEngine::load(config, &store).map_err(|err| err.to_string())?;
    let mut dirty = false;

    match command {
        Commands::Completions { .. } | Commands::Repair => {}
        Commands::List {
            category,
            label,
            mode,
            search,
        } => {
            let criteria = build_criteria(&engine, &category, &label, mode, search)?;
            engine.apply_criteria(criteria).map_err(|err| err.to_string())?;
            let state = engine.render_state();
            print_output(format_snippet_rows(&engine, &state.visible_ids, json)?);
            if let Some(description) = state.filter_description.filter(|_| !json) {
                eprintln!(
                    "{} of {} shown ({})",
                    state.visible_ids.len(),
                    engine.snippets().len(),
                    description
                );
            }
        }
        Commands::Show { snippet } => {
            let id = resolve_snippet(&engine, &snippet)?;
            let snippet = engine
                .snippets()
                .get(&id)
                .ok_or_else(|| format!("snippet '{}' vanished", id))?;
            print_output(format_snippet_detail(&engine, snippet, json)?);
        }
        Commands::Add {
            name,
            category,
            prompt,
            labels,
            exclusive,
        } => {
            let draft = SnippetDraft::new(name, category, prompt)
                .with_labels_csv(&labels)
                .exclusive(exclusive);
            let created = engine.create_snippet(draft).map_err(|err| err.to_string())?;
            dirty = true;
            print_output(if json {
                encode(&snippet_json(&engine, &created))?
            } else {
                format!("Created: {} ({})", created.name, created.id)
            });
        }
        Commands::Edit {
            snippet,
            name,
            category,
            prompt,
            labels,
            exclusive,
        } => {
            let id = resolve_snippet(&engine, &snippet)?;
            let current = engine
                .snippets()
                .get(&id)
                .ok_or_else(|| format!("snippet '{}' vanished", id))?;
            let mut draft = SnippetDraft::from_snippet(current);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(category) = category {
                draft.category = category.into();
            }
            if let Some(prompt) = prompt {
                draft.prompt_text = prompt;
            }
            if let Some(labels) = labels {
                draft.labels.clear();
                draft = draft.with_labels_csv(&labels);
            }
            if let Some(exclusive) = exclusive {
                draft.exclusive = exclusive;
            }
            let updated = engine.update_snippet(&id, draft).map_err(|err| err.to_string())?;
            dirty = true;
            print_output(if json {
                encode(&snippet_json(&engine, &updated))?
            } else {
                format!("Updated: {} ({})", updated.name, updated.id)
            });
        }
        Commands::Delete { snippets } => {
            let ids = snippets
                .iter()
                .map(|key| resolve_snippet(&engine, key))
                .collect::<Result<Vec<_>, _>>()?;
            let removed = engine.delete_snippets(&ids);
            dirty = removed > 0;
            print_output(if json {
                encode(&json!({ "deleted": removed }))?
            } else {
                format!("Deleted {} snippet(s)", removed)
            });
        }
        Commands::Clone { snippet } => {
            let id = resolve_snippet(&engine, &snippet)?;
            let copy = engine.clone_snippet(&id).map_err(|err| err.to_string())?;
            dirty = true;
            print_output(if json {
                encode(&snippet_json(&engine, &copy))?
            } else {
                format!("Created: {} ({})", copy.name, copy.id)
            });
        }
        Commands::Compose {
            snippets,
            separator,
        } => {
            for key in &snippets {
                let id = resolve_snippet(&engine, key)?;
                engine
                    .set_state(&id, SelectionState::Selected)
                    .map_err(|err| err.to_string())?;
            }
            let selected: Vec<&Snippet> = engine.selected_snippets();
            let ids: Vec<Uuid> = selected.iter().map(|s| s.id).collect();
            let separator = separator.unwrap_or_else(|| engine.config().compose_separator.clone());
            let text = compose::compose(selected, &separator);
            print_output(format_compose_output(text.as_deref(), &ids, json)?);
        }
        Commands::Categories => print_output(format_category_rows(&engine, json)?),
        Commands::Labels => print_output(format_label_rows(&engine, json)?),
        Commands::Bubbles { category, label } => {
            let criteria = build_criteria(&engine, &category, &label, None, None)?;
            engine.apply_criteria(criteria).map_err(|err| err.to_string())?;
            print_output(format_bubble_rows(&engine, json)?);
        }
        Commands::NewCategory {
            name,
            sort_order,
            color,
        } => {
            let id = engine
                .create_category(&name, sort_order, color)
                .map_err(|err| err.to_string())?;
            dirty = true;
            print_output(format!("Category: {}", id));
        }
        Commands::NewLabel { name } => {
            let id = engine.create_label(&name).map_err(|err| err.to_string())?;
            dirty = true;
            print_output(format!("Label: {}", id));
        }
        Commands::Rename {
            kind,
            current,
            new_name,
        } => {
            let kind = MetadataKind::from(kind);
            let id = resolve_metadata(&engine, kind, &current)?;
            engine
                .rename_metadata(&id, &new_name, kind)
                .map_err(|err| err.to_string())?;
            dirty = true;
        }
        Commands::Style {
            category,
            sort_order,
            color,
        } => {
            let id = resolve_metadata(&engine, MetadataKind::Category, &category)?;
            engine
                .update_category_style(&id, sort_order, color)
                .map_err(|err| err.to_string())?;
            dirty = true;
        }
        Commands::DeleteMeta { kind, name } => {
            let kind = MetadataKind::from(kind);
            let id = resolve_metadata(&engine, kind, &name)?;
            engine.delete_metadata(&id, kind).map_err(|err| err.to_string())?;
            dirty = true;
        }
        Commands::Merge {
            kind,
            source,
            target,
        } => {
            let kind = MetadataKind::from(kind);
            let source = resolve_metadata(&engine, kind, &source)?;
            let target = resolve_metadata(&engine, kind, &target)?;
            let report = engine
                .merge_metadata(source, target, kind)
                .map_err(|err| err.to_string())?;
            dirty = true;
            print_output(if json {
                encode(&json!({
                    "kind": report.kind,
                    "source_id": report.source_id,
                    "target_id": report.target_id,
                    "snippets_updated": report.snippets_updated,
                }))?
            } else {
                format!("Merged {}; {} snippet(s) updated", kind, report.snippets_updated)
            });
        }
        Commands::Cleanup { remove } => {
            let report = engine.cleanup_unused(remove);
            dirty = remove;
            print_output(format_cleanup_output(&report, remove, json)?);
        }
        Commands::ImportLegacy { file } => {
            let raw = std::fs::read_to_string(&file)
                .map_err(|err| format!("cannot read '{}': {}", file.display(), err))?;
            let records: Vec<LegacySnippetRecord> = serde_json::from_str(&raw)
                .map_err(|err| format!("cannot parse '{}': {}", file.display(), err))?;
            let report = engine.import_legacy(&records).map_err(|err| err.to_string())?;
            dirty = report.imported > 0;
            print_output(if json {
                encode(&json!({ "imported": report.imported, "skipped": report.skipped }))?
            } else {
                format!("Imported {}, skipped {}", report.imported, report.skipped)
            });
        }
    }

    if dirty {
        engine.save(&store).map_err(|err| err.to_string())?;
    }
    Ok(())
}

fn main() {
    let Cli {
        data_dir,
        json,
        debug,
        command,
    } = Cli::parse();

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return;
    }

    let mut config = Config::from_env();
    if let Some(dir) = data_dir {
        config = config.with_data_dir(dir);
    }
    if debug {
        config = config.with_debug(true);
    }
    init_tracing(&config);

    let action = command.action();
    if let Err(message) = run(command, json, config) {
        eprintln!("{} failed: {}", action, message);
        std::process::exit(1);
    }
}
