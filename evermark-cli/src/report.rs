//! End-of-run summary printed to stdout.

use evermark_babel::common::links::{InternalRef, Reference};
use evermark_babel::{build_graph, ConvertedNote, NoteId};
use evermark_config::ConversionMode;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

/// Summary of a run. The sections depend on the mode:
///
/// - `recursive`: notes of the folder the traversal never reached
/// - `all`: links to notes that are not in the folder, then one line per cluster of linked
///   notes naming where to start reading it
pub struct Report<'a> {
    mode: ConversionMode,
    files: &'a [String],
    converted: &'a [ConvertedNote],
    elapsed: Duration,
}

impl<'a> Report<'a> {
    pub fn new(
        mode: ConversionMode,
        files: &'a [String],
        converted: &'a [ConvertedNote],
        elapsed: Duration,
    ) -> Self {
        Self {
            mode,
            files,
            converted,
            elapsed,
        }
    }

    /// Notes of the folder that were not converted.
    pub fn missing_files(&self) -> Vec<&'a str> {
        let converted: BTreeSet<NoteId> = self.converted.iter().map(|n| n.id.clone()).collect();
        self.files
            .iter()
            .filter(|file| !converted.contains(&NoteId::from_file_name(file)))
            .map(String::as_str)
            .collect()
    }

    /// Internal links no note of the folder answers to, deduplicated and sorted.
    pub fn missing_links(&self) -> BTreeSet<String> {
        self.converted
            .iter()
            .flat_map(|note| note.unresolved_links())
            .map(|link| match &link.target.reference {
                Reference::Internal(InternalRef::File(path)) => {
                    path.rsplit('/').next().unwrap_or(path).to_string()
                }
                _ => link.target.href.clone(),
            })
            .collect()
    }

    /// One line per cluster of linked notes.
    pub fn root_lines(&self) -> Vec<String> {
        let names: BTreeMap<&NoteId, String> = self
            .converted
            .iter()
            .map(|note| (&note.id, format!("{}.html", note.id)))
            .collect();
        let name = |id: &NoteId| {
            names
                .get(id)
                .cloned()
                .unwrap_or_else(|| id.to_string())
        };

        build_graph(self.converted)
            .clusters()
            .into_iter()
            .map(|cluster| match cluster.roots.as_slice() {
                [] => {
                    let first = cluster.members.first().map(&name).unwrap_or_default();
                    format!("{first} (no root)")
                }
                [root] => name(root),
                roots => {
                    let roots: Vec<String> = roots.iter().map(&name).collect();
                    format!("{} (multiple roots)", roots.join(" "))
                }
            })
            .collect()
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ConversionMode::Recursive => {
                writeln!(f, "\nMissing files:")?;
                for file in self.missing_files() {
                    writeln!(f, "{file}")?;
                }
            }
            ConversionMode::All => {
                writeln!(f, "\nMissing links:\n--------------")?;
                for link in self.missing_links() {
                    writeln!(f, "{link}")?;
                }
                writeln!(f, "\nRoot files:\n-----------")?;
                for line in self.root_lines() {
                    writeln!(f, "{line}")?;
                }
            }
            ConversionMode::Single => {}
        }
        writeln!(
            f,
            "Converted {} files in {:.3} seconds.",
            self.converted.len(),
            self.elapsed.as_secs_f64()
        )
    }
}
