//! `onerep template`: saved workouts and sharing.

use chrono::Utc;
use serde::Serialize;

use crate::cli::args::{OutputFormat, TemplateSubcommand};
use crate::cli::commands::{AppContext, parse_day, print_json};
use crate::coach::SilentCoach;
use crate::error::OneRepError;
use crate::store::WorkoutTemplate;
use crate::store::templates::suggested_name;

/// Templates shown by `list`.
const RECENT_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateListing {
    recent: Vec<WorkoutTemplate>,
    saved: Vec<WorkoutTemplate>,
}

/// # Errors
///
/// Unknown template, undecodable import, or a persistence failure.
pub fn run(cmd: TemplateSubcommand, ctx: AppContext) -> Result<(), OneRepError> {
    let templates = ctx.templates();
    let profile = ctx.profile;
    let now = Utc::now();

    match cmd {
        TemplateSubcommand::List(args) => {
            let listing = TemplateListing {
                recent: templates.recent(profile, RECENT_LIMIT),
                saved: templates.saved(profile),
            };
            if args.format == OutputFormat::Json {
                return print_json(&listing);
            }
            if listing.saved.is_empty() {
                println!("No saved templates.");
            }
            if !listing.recent.is_empty() {
                println!("Recent:");
                for t in &listing.recent {
                    println!("  {:<28} {} exercise(s)", t.name, t.exercises.len());
                }
            }
            if !listing.saved.is_empty() {
                println!("Saved:");
                for t in &listing.saved {
                    let created = t.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d");
                    println!("  {:<28} {} exercise(s), created {created}", t.name, t.exercises.len());
                }
            }
        }
        TemplateSubcommand::Save { name, from_day } => {
            let template = match from_day {
                Some(raw) => {
                    let day = parse_day(&raw)?;
                    let entries: Vec<_> = ctx
                        .log
                        .entries_for_profile(profile)
                        .filter(|e| ctx.log.day_of(e.date) == day)
                        .collect();
                    if entries.is_empty() {
                        return Err(OneRepError::Usage(format!("no sets logged on {day}")));
                    }
                    let name = name.unwrap_or_else(|| suggested_name(day));
                    templates.create_from_logs(&name, profile, &entries, now)?
                }
                None => {
                    let name = name.unwrap_or_else(|| suggested_name(ctx.log.day_of(now)));
                    let registry = ctx.registry();
                    templates.create_from_exercises(&name, profile, registry.exercises(), now)?
                }
            };
            println!(
                "Saved template \"{}\" ({} exercise(s))",
                template.name,
                template.exercises.len()
            );
        }
        TemplateSubcommand::Load { name } => {
            let mut session = ctx.session(Box::new(SilentCoach));
            let template = session.load_template(&name)?;
            println!("Loaded \"{}\"", template.name);
        }
        TemplateSubcommand::Delete { name } => {
            let removed = templates.delete(profile, &name)?;
            println!("Deleted \"{}\"", removed.name);
        }
        TemplateSubcommand::Rename { name, new_name } => {
            templates.rename(profile, &name, &new_name)?;
            println!("Renamed \"{name}\" to \"{}\"", new_name.trim());
        }
        TemplateSubcommand::Export { name, output } => {
            let json = templates.export(profile, &name, now)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        TemplateSubcommand::Import { file } => {
            let data = std::fs::read_to_string(&file)?;
            let template = templates.import(profile, &data, now)?;
            println!("Imported \"{}\"", template.name);
        }
    }
    Ok(())
}
