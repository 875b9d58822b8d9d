use std::fmt;
use std::path::PathBuf;

/// User-visible notifications. Failures in the editor core never crash or
/// propagate; they degrade to "no effect" plus one of these, which the log
/// panel drains each frame.
#[derive(Debug, Clone)]
pub enum EditorNotice {
    SourceLoaded { path: PathBuf, animations: usize, parts: usize },
    ImportFailed { path: PathBuf, reason: String },
    SelectionDiscarded { path: PathBuf },
    NameIssue { message: String },
    CompileBlocked { issues: usize },
    CompileSubmitted { model_name: String },
    CompileFailed { reason: String },
    EditorClosed { released_files: usize },
}

impl fmt::Display for EditorNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorNotice::SourceLoaded { path, animations, parts } => {
                write!(f, "Loaded {} ({animations} animations, {parts} parts)", path.display())
            }
            EditorNotice::ImportFailed { path, reason } => {
                write!(f, "Failed to load {}: {reason}", path.display())
            }
            EditorNotice::SelectionDiscarded { path } => {
                write!(f, "Discarded load of {} (row was removed)", path.display())
            }
            EditorNotice::NameIssue { message } => write!(f, "Name issue: {message}"),
            EditorNotice::CompileBlocked { issues } => {
                write!(f, "Compilation blocked by {issues} name issue(s)")
            }
            EditorNotice::CompileSubmitted { model_name } => {
                write!(f, "Compiling model {model_name}")
            }
            EditorNotice::CompileFailed { reason } => write!(f, "Failed to submit compile: {reason}"),
            EditorNotice::EditorClosed { released_files } => {
                write!(f, "Editor closed, released {released_files} file(s)")
            }
        }
    }
}

#[derive(Default)]
pub struct NoticeBus {
    notices: Vec<EditorNotice>,
}

impl NoticeBus {
    pub fn push(&mut self, notice: EditorNotice) {
        self.notices.push(notice);
    }

    pub fn drain(&mut self) -> Vec<EditorNotice> {
        self.notices.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
