//! Folder-level glue around the conversion engine.
//!
//! An export folder holds one `<title>.html` per note and a `<title>_files/` folder of
//! attachments per note. [`Workspace`] finds the notes, [`convert`] runs one of the
//! conversion modes over them and [`Writer`] puts the results on disk.

use crate::error::{CliError, Result};
use evermark_babel::convert::RESOURCE_DIR;
use evermark_babel::{index_notes, ConvertedNote, Converter, Note, NoteId, RenderOptions, Traversal};
use evermark_config::ConversionMode;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

const NOTE_EXTENSION: &str = ".html";

/// The folder of notes a run works on.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub dir: PathBuf,
    /// File names of every note of the folder, sorted
    pub files: Vec<String>,
    /// The note named on the command line, when the path was a file
    pub start: Option<String>,
}

impl Workspace {
    /// Find the notes next to `path` (a note file) or inside it (a folder).
    pub fn discover(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| CliError::read(path, e))?;
        let (dir, start) = if metadata.is_dir() {
            (path.to_path_buf(), None)
        } else {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let start = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            (dir, start)
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| CliError::read(&dir, e))? {
            let entry = entry.map_err(|e| CliError::read(&dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(NOTE_EXTENSION) && entry.path().is_file() {
                files.push(name);
            }
        }
        files.sort();
        log::debug!("found {} notes in {}", files.len(), dir.display());

        Ok(Self { dir, files, start })
    }

    /// Read and parse every note of the folder. Notes that cannot be read or parsed are
    /// returned as failures, keyed by file name, and left out of the index.
    pub fn load(&self) -> (Vec<Note>, Vec<(String, CliError)>) {
        let mut notes = Vec::with_capacity(self.files.len());
        let mut failures = Vec::new();
        for file in &self.files {
            let path = self.dir.join(file);
            let parsed = fs::read_to_string(&path)
                .map_err(|e| CliError::read(&path, e))
                .and_then(|html| {
                    Note::parse(file, &html).map_err(|source| CliError::Convert {
                        file: file.clone(),
                        source,
                    })
                });
            match parsed {
                Ok(note) => notes.push(note),
                Err(err) => failures.push((file.clone(), err)),
            }
        }
        (notes, failures)
    }

    /// Whether a load failure of `file` fails the run. Outside `all` mode the other notes
    /// of the folder only feed the link index, so only the start note counts.
    pub fn is_selected(&self, file: &str, mode: ConversionMode) -> bool {
        mode == ConversionMode::All || self.start.as_deref() == Some(file)
    }
}

/// Outcome of a conversion run.
#[derive(Debug, Default)]
pub struct Run {
    /// Converted notes, in conversion order
    pub converted: Vec<ConvertedNote>,
    pub failures: Vec<CliError>,
}

/// Convert the notes selected by `mode`.
///
/// - `single`: the start note
/// - `all`: every note, in file name order
/// - `recursive`: the start note, then every note reachable through resolved links
pub fn convert(
    notes: &[Note],
    start: Option<&str>,
    mode: ConversionMode,
    options: &RenderOptions,
    relocate_resources: bool,
) -> Run {
    let index = index_notes(notes);
    let converter = Converter::new(options, &index).relocate_resources(relocate_resources);
    let by_id: BTreeMap<&NoteId, &Note> = notes.iter().map(|note| (&note.id, note)).collect();
    let mut run = Run::default();

    let convert_one = |note: &Note, run: &mut Run| -> Option<usize> {
        match converter.convert(note) {
            Ok(converted) => {
                run.converted.push(converted);
                Some(run.converted.len() - 1)
            }
            Err(source) => {
                run.failures.push(CliError::Convert {
                    file: note.file_name.clone(),
                    source,
                });
                None
            }
        }
    };

    match mode {
        ConversionMode::All => {
            for note in notes {
                convert_one(note, &mut run);
            }
        }
        ConversionMode::Single | ConversionMode::Recursive => {
            let Some(start) = start else {
                return run;
            };
            let mut traversal = Traversal::new(NoteId::from_file_name(start));
            while let Some(id) = traversal.next() {
                let Some(&note) = by_id.get(&id) else {
                    log::warn!("{id} is not a readable note of the folder");
                    continue;
                };
                let Some(position) = convert_one(note, &mut run) else {
                    continue;
                };
                if mode == ConversionMode::Recursive {
                    let linked: Vec<NoteId> = run.converted[position]
                        .linked_notes()
                        .into_iter()
                        .cloned()
                        .collect();
                    traversal.extend(linked);
                }
            }
        }
    }
    run
}

/// Writes converted notes and their attachments.
#[derive(Debug, Clone)]
pub struct Writer<'a> {
    /// Folder the notes were read from
    source: &'a Path,
    /// Output root; `None` writes next to the sources
    output: Option<&'a Path>,
    copy_resources: bool,
}

impl<'a> Writer<'a> {
    pub fn new(source: &'a Path, output: Option<&'a Path>, copy_resources: bool) -> Self {
        Self {
            source,
            output,
            copy_resources,
        }
    }

    /// Where the Markdown of a note goes: `<output>/<notebook>/<id>.md`, or `<id>.md` next
    /// to the source file.
    pub fn note_path(&self, note: &ConvertedNote) -> PathBuf {
        match self.output {
            Some(output) => output.join(note.relative_path()),
            None => self.source.join(format!("{}.md", note.id)),
        }
    }

    pub fn write(&self, note: &ConvertedNote) -> Result<()> {
        let path = self.note_path(note);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CliError::write(parent, e))?;
        }
        fs::write(&path, &note.markdown).map_err(|e| CliError::write(&path, e))?;
        log::info!("wrote {}", path.display());

        if let (Some(output), true) = (self.output, self.copy_resources) {
            for resource in &note.resources {
                self.copy_resource(output, resource)?;
            }
        }
        Ok(())
    }

    /// Copy one attachment to `<output>/resources/<path>`. Attachments missing from the
    /// export are logged and skipped.
    fn copy_resource(&self, output: &Path, resource: &str) -> Result<()> {
        let Some(relative) = safe_relative(resource) else {
            log::warn!("not copying '{resource}': path leaves the export folder");
            return Ok(());
        };
        let from = self.source.join(&relative);
        if !from.is_file() {
            log::warn!("attachment '{}' not found", from.display());
            return Ok(());
        }
        let to = output.join(RESOURCE_DIR).join(&relative);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| CliError::write(parent, e))?;
        }
        fs::copy(&from, &to).map_err(|e| CliError::write(&to, e))?;
        log::debug!("copied {} to {}", from.display(), to.display());
        Ok(())
    }
}

/// A `/`-separated attachment path as a relative path that stays inside its root.
fn safe_relative(resource: &str) -> Option<PathBuf> {
    let path = PathBuf::from(resource);
    path.components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
        .then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(file_name: &str, body: &str) -> Note {
        let title = NoteId::from_file_name(file_name);
        let html = format!("<html><body><h1>{title}</h1>{body}</body></html>");
        Note::parse(file_name, &html).unwrap()
    }

    fn corpus() -> Vec<Note> {
        vec![
            note("A.html", "<div><a href=\"B.html\">B</a></div>"),
            note("B.html", "<div><a href=\"C.html\">C</a> and <a href=\"A.html\">A</a></div>"),
            note("C.html", "<div>End</div>"),
            note("D.html", "<div>Alone</div>"),
        ]
    }

    fn ids(run: &Run) -> Vec<&str> {
        run.converted.iter().map(|note| note.id.as_str()).collect()
    }

    #[test]
    fn test_modes_select_notes() {
        let notes = corpus();
        let options = RenderOptions::default();

        let single = convert(&notes, Some("B.html"), ConversionMode::Single, &options, false);
        assert_eq!(ids(&single), vec!["B"]);

        let all = convert(&notes, Some("B.html"), ConversionMode::All, &options, false);
        assert_eq!(ids(&all), vec!["A", "B", "C", "D"]);

        let recursive = convert(&notes, Some("A.html"), ConversionMode::Recursive, &options, false);
        assert_eq!(ids(&recursive), vec!["A", "B", "C"]);
        assert!(recursive.failures.is_empty());
    }

    #[test]
    fn test_unknown_start_converts_nothing() {
        let notes = corpus();
        let run = convert(
            &notes,
            Some("Missing.html"),
            ConversionMode::Recursive,
            &RenderOptions::default(),
            false,
        );
        assert!(run.converted.is_empty());
    }

    #[test]
    fn test_note_paths() {
        let notes = vec![note(
            "Trip.html",
            "<table><tr><td>Tags:</td><td>nb:Personal/Travel</td></tr></table><div>x</div>",
        )];
        let run = convert(&notes, None, ConversionMode::All, &RenderOptions::default(), true);
        let converted = &run.converted[0];

        let in_place = Writer::new(Path::new("export"), None, true);
        assert_eq!(in_place.note_path(converted), PathBuf::from("export/Trip.md"));

        let output = Path::new("out");
        let writer = Writer::new(Path::new("export"), Some(output), true);
        assert_eq!(
            writer.note_path(converted),
            PathBuf::from("out/Personal/Travel/Trip.md")
        );
    }

    #[test]
    fn test_only_selected_notes_fail_the_run() {
        let workspace = Workspace {
            dir: PathBuf::from("export"),
            files: vec!["A.html".to_string(), "B.html".to_string()],
            start: Some("A.html".to_string()),
        };
        assert!(workspace.is_selected("A.html", ConversionMode::Single));
        assert!(!workspace.is_selected("B.html", ConversionMode::Single));
        assert!(!workspace.is_selected("B.html", ConversionMode::Recursive));
        assert!(workspace.is_selected("B.html", ConversionMode::All));
    }

    #[test]
    fn test_resource_paths_stay_inside_the_export() {
        assert_eq!(
            safe_relative("Note_files/a b.png"),
            Some(PathBuf::from("Note_files/a b.png"))
        );
        assert_eq!(safe_relative("../secret.txt"), None);
        assert_eq!(safe_relative("/etc/passwd"), None);
    }
}
