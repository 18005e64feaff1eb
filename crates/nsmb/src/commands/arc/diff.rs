use clap::{Args, ValueEnum};
use itertools::Itertools;
use miette::{miette, Result};
use nsmb_course::{load_course, AreaRecordSet, Metadata};
use nsmb_u8::U8Archive;
use owo_colors::OwoColorize;
use similar::{ChangeTag, TextDiff};
use std::{collections::BTreeSet, fmt::Display, path::PathBuf};
use tracing::debug;

use crate::commands::read_input;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Mode {
    #[default]
    Semantic,
    Full,
}

/// One difference between two archives, nested by archive entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Delta {
    /// Only the right side has this entry
    Added { section: String, name: String },
    /// Only the left side has this entry
    Removed { section: String, name: String },
    /// A value that differs between the sides
    Changed {
        field: String,
        left: String,
        right: String,
    },
    /// Inline diff of a metadata value
    Lines(Vec<String>),
    /// An entry both sides have, with differences of its own
    Entry {
        section: String,
        name: String,
        details: Vec<Delta>,
        children: Vec<Delta>,
    },
}

impl Delta {
    fn entry(section: &str, name: &str) -> Self {
        Delta::Entry {
            section: section.into(),
            name: name.into(),
            details: Vec::new(),
            children: Vec::new(),
        }
    }

    fn push_children(&mut self, more: Vec<Delta>) -> Result<()> {
        match self {
            Delta::Entry { children, .. } => {
                children.extend(more);
                children.sort();
                Ok(())
            }
            _ => Err(miette!("only entries present on both sides have children")),
        }
    }

    fn push_details(&mut self, more: Vec<Delta>) -> Result<()> {
        match self {
            Delta::Entry { details, .. } => {
                details.extend(more);
                details.sort();
                Ok(())
            }
            _ => Err(miette!("only entries present on both sides have details")),
        }
    }

    /// Line introducing a run of children of the same kind
    fn heading(&self) -> Option<String> {
        match self {
            Delta::Added { section, .. } => Some(format!("{section} only in the right archive:")),
            Delta::Removed { section, .. } => Some(format!("{section} only in the left archive:")),
            Delta::Entry { section, .. } => Some(format!("{section} that differ:")),
            Delta::Changed { .. } | Delta::Lines(_) => None,
        }
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| format!("  {l}"))
        .join("\n")
}

impl Display for Delta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delta::Added { name, .. } => write!(f, "+ {}", name.green()),
            Delta::Removed { name, .. } => write!(f, "- {}", name.red()),
            Delta::Changed { field, left, right } => {
                write!(f, "{field}: {} -> {}", left.red(), right.green())
            }
            Delta::Lines(lines) => write!(f, "{}", lines.iter().map(|l| l.trim_end()).join("\n")),
            Delta::Entry {
                name,
                details,
                children,
                ..
            } => {
                let mut body = details.iter().map(ToString::to_string).collect::<Vec<_>>();
                for (heading, group) in &children.iter().chunk_by(|c| c.heading()) {
                    body.extend(heading);
                    body.extend(group.map(|c| indent(&c.to_string())));
                }

                writeln!(f, "{}", name.blue().bold())?;
                write!(f, "{}", indent(&body.join("\n")))
            }
        }
    }
}

/// Whether an archive entry is the course file of an area
fn is_course_file(name: &str) -> bool {
    name.rsplit('/')
        .next()
        .is_some_and(|file| file.starts_with("course") && !file.contains("_bgdat"))
        && name.ends_with(".bin")
}

fn inline_diff(old: &str, new: &str) -> Vec<String> {
    let diff = TextDiff::from_lines(old, new);
    let mut comparison = Vec::new();
    for op in diff.ops().iter() {
        for change in diff.iter_inline_changes(op) {
            let mut context = String::new();
            for (emphasized, value) in change.iter_strings_lossy() {
                if !emphasized {
                    context.push_str(&format!("{}", value.dimmed()));
                } else if change.tag() == ChangeTag::Insert {
                    context.push_str(&format!("{}", value.green().underline()));
                } else {
                    context.push_str(&format!("{}", value.red().underline()));
                }
            }
            comparison.push(context);
        }
    }
    comparison
}

#[derive(Args)]
pub struct DiffArgs {
    /// An input archive, optionally compressed
    #[arg(short, long, value_name = "FILE")]
    left: PathBuf,

    /// An input archive, optionally compressed
    #[arg(short, long, value_name = "FILE")]
    right: PathBuf,

    /// Comparison mode
    #[arg(short, long, value_enum, default_value_t=Mode::Semantic)]
    mode: Mode,
}

impl DiffArgs {
    fn handle_metadata(&self, left: &Metadata, right: &Metadata) -> Vec<Delta> {
        let mut result = Vec::new();

        let left_keys = left.keys().map(|k| k.to_vec()).collect::<BTreeSet<_>>();
        let right_keys = right.keys().map(|k| k.to_vec()).collect::<BTreeSet<_>>();
        let display = |k: &[u8]| String::from_utf8_lossy(k).into_owned();

        right_keys
            .difference(&left_keys)
            .map(|k| Delta::Added {
                section: "metadata keys".into(),
                name: display(k.as_slice()),
            })
            .for_each(|c| result.push(c));

        left_keys
            .difference(&right_keys)
            .map(|k| Delta::Removed {
                section: "metadata keys".into(),
                name: display(k.as_slice()),
            })
            .for_each(|c| result.push(c));

        for key in left_keys.intersection(&right_keys) {
            let old = left.string(key).unwrap_or_default();
            let new = right.string(key).unwrap_or_default();
            let same_binary = left.binary(key) == right.binary(key);
            if old == new && same_binary {
                continue;
            }

            let comparison = if self.mode == Mode::Full {
                inline_diff(&old, &new)
            } else {
                Vec::new()
            };
            result.push(Delta::Entry {
                section: "metadata keys".into(),
                name: display(key.as_slice()),
                details: vec![Delta::Lines(comparison)],
                children: Vec::new(),
            });
        }

        result
    }

    fn handle_course(&self, left: &AreaRecordSet, right: &AreaRecordSet) -> Vec<Delta> {
        let counts = |course: &AreaRecordSet| {
            [
                ("zones", course.zones.len()),
                ("sprites", course.sprites.len()),
                ("entrances", course.entrances.len()),
                ("locations", course.locations.len()),
                ("paths", course.paths.len()),
            ]
        };

        let mut related = counts(left)
            .into_iter()
            .zip(counts(right))
            .filter(|((_, old), (_, new))| old != new)
            .map(|((field, old), (_, new))| Delta::Changed {
                field: field.into(),
                left: old.to_string(),
                right: new.to_string(),
            })
            .collect::<Vec<_>>();

        for (slot, (old, new)) in left
            .tilesets
            .names
            .iter()
            .zip(&right.tilesets.names)
            .enumerate()
        {
            if old != new {
                related.push(Delta::Changed {
                    field: format!("tileset {slot}"),
                    left: old.clone(),
                    right: new.clone(),
                });
            }
        }

        related
    }

    fn handle_file(&self, name: &str, left: &[u8], right: &[u8]) -> Result<Option<Delta>> {
        if left == right {
            return Ok(None);
        }

        let mut result = Delta::entry("files", name);
        if left.len() != right.len() {
            result.push_details(vec![Delta::Changed {
                field: "size".into(),
                left: left.len().to_string(),
                right: right.len().to_string(),
            }])?;
        }

        if is_course_file(name) {
            match (load_course(left), load_course(right)) {
                (Ok(course_left), Ok(course_right)) => {
                    if self.mode == Mode::Full {
                        result.push_details(self.handle_course(&course_left, &course_right))?;
                    }
                    let changes =
                        self.handle_metadata(&course_left.metadata, &course_right.metadata);
                    if !changes.is_empty() {
                        result.push_children(changes)?;
                    }
                }
                (left, right) => {
                    debug!(
                        name,
                        left = left.is_ok(),
                        right = right.is_ok(),
                        "not comparing as course"
                    );
                }
            }
        }

        Ok(Some(result))
    }

    fn handle_archive(
        &self,
        name: &str,
        left: &U8Archive,
        right: &U8Archive,
    ) -> Result<Option<Delta>> {
        let mut result: Option<Delta> = None;

        if left.len() != right.len() {
            result
                .get_or_insert(Delta::entry("archives", name))
                .push_details(vec![Delta::Changed {
                    field: "entries".into(),
                    left: left.len().to_string(),
                    right: right.len().to_string(),
                }])?;
        }

        let left_names = left.file_names().collect::<BTreeSet<_>>();
        let right_names = right.file_names().collect::<BTreeSet<_>>();

        let files_added: Vec<Delta> = right_names
            .difference(&left_names)
            .map(|k| Delta::Added {
                section: "files".into(),
                name: k.to_string(),
            })
            .collect();

        if !files_added.is_empty() {
            result
                .get_or_insert(Delta::entry("archives", name))
                .push_children(files_added)?;
        }

        let files_removed: Vec<Delta> = left_names
            .difference(&right_names)
            .map(|k| Delta::Removed {
                section: "files".into(),
                name: k.to_string(),
            })
            .collect();

        if !files_removed.is_empty() {
            result
                .get_or_insert(Delta::entry("archives", name))
                .push_children(files_removed)?;
        }

        for file in left_names.intersection(&right_names) {
            let data_left = left.get(file)?.unwrap_or_default();
            let data_right = right.get(file)?.unwrap_or_default();

            if let Some(c) = self.handle_file(file, data_left, data_right)? {
                result
                    .get_or_insert(Delta::entry("archives", name))
                    .push_children(vec![c])?;
            }
        }

        Ok(result)
    }

    pub fn handle(&self) -> Result<()> {
        let left = U8Archive::from_bytes(&nsmb_lz::decompress(&read_input(&self.left)?)?)?;
        let right = U8Archive::from_bytes(&nsmb_lz::decompress(&read_input(&self.right)?)?)?;

        let difference = self.handle_archive(&self.left.to_string_lossy(), &left, &right)?;

        if let Some(d) = difference {
            println!("{}", d);
        }

        Ok(())
    }
}
