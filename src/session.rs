use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{normalize_path, SourceFileCache};
use crate::compiler::ModelCompiler;
use crate::config::EditorConfig;
use crate::edit::{Animation, BodyPart, EditModel, EntityId, ModelSlot, Sequence};
use crate::events::{EditorNotice, NoticeBus};
use crate::import::{ImportBackend, SourceFileData};
use crate::request::{self, CompilationRequest};

/// Which editor row asked for a source file. Carried through the pending
/// table so a load that resolves after its row was removed can be told
/// apart from a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRef {
    Model { part: EntityId, model: EntityId },
    Animation { animation: EntityId },
}

/// Owns the edit model, the reference cache, and the import backend, and
/// wires them together: file selections funnel through the per-path pending
/// table, removals release held references, shutdown tears the cache down.
/// Nothing here is global; the session is created at editor startup and
/// dropped after `shutdown`.
pub struct EditorSession<B: ImportBackend> {
    backend: B,
    cache: SourceFileCache,
    model: EditModel,
    /// One in-flight load per path, however many rows wait on it.
    pending: IndexMap<PathBuf, Vec<SlotRef>>,
    notices: NoticeBus,
    strict_names: bool,
}

impl<B: ImportBackend> EditorSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: SourceFileCache::new(),
            model: EditModel::default(),
            pending: IndexMap::new(),
            notices: NoticeBus::default(),
            strict_names: true,
        }
    }

    pub fn apply_config(&mut self, config: &EditorConfig) {
        self.strict_names = config.strict_names;
        if self.model.export_path.is_none() {
            self.model.export_path = config.default_export_path.clone();
        }
    }

    pub fn model(&self) -> &EditModel {
        &self.model
    }

    pub fn cache(&self) -> &SourceFileCache {
        &self.cache
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn drain_notices(&mut self) -> Vec<EditorNotice> {
        self.notices.drain()
    }

    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    // --- plain field edits -------------------------------------------------

    pub fn set_model_name(&mut self, name: impl Into<String>) {
        self.model.model_name = name.into();
    }

    pub fn set_export_path(&mut self, path: impl Into<PathBuf>) {
        self.model.export_path = Some(path.into());
    }

    pub fn add_body_part(&mut self) -> EntityId {
        self.model.body_parts.insert(BodyPart::default())
    }

    pub fn rename_body_part(&mut self, part: EntityId, name: impl Into<String>) {
        let name = name.into();
        self.model.body_parts.update(part, |body_part| body_part.name = name);
    }

    pub fn add_model(&mut self, part: EntityId) -> Option<EntityId> {
        self.model.body_parts.get_mut(part).map(|body_part| body_part.models.insert(ModelSlot::default()))
    }

    pub fn rename_model(&mut self, part: EntityId, model: EntityId, name: impl Into<String>) {
        let name = name.into();
        if let Some(slot) = self.model.model_slot_mut(part, model) {
            slot.name = name;
        }
    }

    pub fn set_model_blank(&mut self, part: EntityId, model: EntityId, blank: bool) {
        if let Some(slot) = self.model.model_slot_mut(part, model) {
            slot.blank = blank;
        }
    }

    /// Includes or excludes one named mesh part of the model's source file.
    /// Stale ids, missing sources, and out-of-range indices all no-op.
    pub fn set_part_enabled(&mut self, part: EntityId, model: EntityId, index: usize, enabled: bool) {
        let Some(slot) = self.model.model_slot(part, model) else { return };
        let Some(source) = slot.source.clone() else { return };
        let Some(data) = self.cache.metadata(&source) else { return };
        let Some(name) = data.parts.get(index).cloned() else { return };
        if let Some(slot) = self.model.model_slot_mut(part, model) {
            if let Some(cell) = slot.part_selection.as_mut().and_then(|selection| selection.get_mut(index)) {
                *cell = if enabled { Some(name) } else { None };
            }
        }
    }

    pub fn add_animation(&mut self) -> EntityId {
        self.model.animations.insert(Animation::default())
    }

    pub fn rename_animation(&mut self, animation: EntityId, name: impl Into<String>) {
        let name = name.into();
        self.model.animations.update(animation, |entry| entry.name = name);
    }

    /// Picks which of the source file's animations to export; `None` falls
    /// back to the file's first animation at assembly time.
    pub fn choose_source_animation(&mut self, animation: EntityId, choice: Option<String>) {
        self.model.animations.update(animation, |entry| entry.source_animation = choice);
    }

    pub fn add_sequence(&mut self) -> EntityId {
        self.model.sequences.insert(Sequence::default())
    }

    pub fn rename_sequence(&mut self, sequence: EntityId, name: impl Into<String>) {
        let name = name.into();
        self.model.sequences.update(sequence, |entry| entry.name = name);
    }

    pub fn set_sequence_grid(&mut self, sequence: EntityId, grid: Vec<Vec<String>>) {
        self.model.sequences.update(sequence, |entry| entry.grid = grid);
    }

    /// Writes one grid cell, growing the grid with empty cells as needed so
    /// positions stay meaningful to the compiler's blend logic.
    pub fn set_sequence_cell(
        &mut self,
        sequence: EntityId,
        row: usize,
        column: usize,
        animation: impl Into<String>,
    ) {
        let name = animation.into();
        self.model.sequences.update(sequence, |entry| {
            if entry.grid.len() <= row {
                entry.grid.resize_with(row + 1, Vec::new);
            }
            let cells = &mut entry.grid[row];
            if cells.len() <= column {
                cells.resize(column + 1, String::new());
            }
            cells[column] = name;
        });
    }

    // --- removals (the session, not the model, releases held files) -------

    pub fn remove_body_part(&mut self, part: EntityId) {
        let Some(body_part) = self.model.body_parts.remove(part) else { return };
        for (_, slot) in body_part.models.iter() {
            if let Some(source) = &slot.source {
                self.cache.release(&mut self.backend, source);
            }
        }
    }

    pub fn remove_model(&mut self, part: EntityId, model: EntityId) {
        let Some(body_part) = self.model.body_parts.get_mut(part) else { return };
        let Some(slot) = body_part.models.remove(model) else { return };
        if let Some(source) = slot.source {
            self.cache.release(&mut self.backend, &source);
        }
    }

    pub fn remove_animation(&mut self, animation: EntityId) {
        let Some(entry) = self.model.animations.remove(animation) else { return };
        if let Some(source) = entry.source {
            self.cache.release(&mut self.backend, &source);
        }
    }

    pub fn remove_sequence(&mut self, sequence: EntityId) {
        self.model.sequences.remove(sequence);
    }

    // --- file selection flow ----------------------------------------------

    /// Result of the file dialog for a model row. `None` (cancelled) mutates
    /// nothing; re-picking the current file is a pure no-op beyond dropping
    /// any queued switch for the row. Anything else replaces whatever the
    /// row had queued and resolves on the next `process_pending`.
    pub fn select_model_source(&mut self, part: EntityId, model: EntityId, selection: Option<PathBuf>) {
        let Some(selection) = selection else { return };
        let Some(slot) = self.model.model_slot(part, model) else { return };
        let next = normalize_path(&selection);
        if slot.source.as_deref() == Some(next.as_path()) {
            // Changed back to the committed file; forget any queued switch.
            self.cancel_queued(SlotRef::Model { part, model });
            return;
        }
        self.queue_load(SlotRef::Model { part, model }, next);
    }

    pub fn select_animation_source(&mut self, animation: EntityId, selection: Option<PathBuf>) {
        let Some(selection) = selection else { return };
        let Some(entry) = self.model.animations.get(animation) else { return };
        let next = normalize_path(&selection);
        if entry.source.as_deref() == Some(next.as_path()) {
            self.cancel_queued(SlotRef::Animation { animation });
            return;
        }
        self.queue_load(SlotRef::Animation { animation }, next);
    }

    /// A row waits on at most one path; the latest pick wins.
    fn queue_load(&mut self, owner: SlotRef, path: PathBuf) {
        self.cancel_queued(owner);
        self.pending.entry(path).or_default().push(owner);
    }

    fn cancel_queued(&mut self, owner: SlotRef) {
        self.pending.retain(|_, owners| {
            owners.retain(|queued| *queued != owner);
            !owners.is_empty()
        });
    }

    /// Runs the queued loads: one oracle call per distinct path, fanned out
    /// to every row still waiting on it. Rows removed while the load was in
    /// flight have their result discarded; a failed load leaves every
    /// waiting row on its previous selection.
    pub fn process_pending(&mut self) {
        let queued: Vec<(PathBuf, Vec<SlotRef>)> = self.pending.drain(..).collect();
        for (path, owners) in queued {
            self.run_load(path, owners);
        }
    }

    fn run_load(&mut self, path: PathBuf, owners: Vec<SlotRef>) {
        for owner in owners {
            if !self.owner_alive(owner) {
                self.notices.push(EditorNotice::SelectionDiscarded { path: path.clone() });
                continue;
            }
            match self.cache.acquire(&mut self.backend, &path) {
                Ok(data) => self.apply_loaded(owner, &path, &data),
                Err(error) => {
                    eprintln!("[session] failed to load '{}': {error}", path.display());
                    self.notices
                        .push(EditorNotice::ImportFailed { path: path.clone(), reason: error.to_string() });
                    // No entry was inserted; remaining waiters would only
                    // re-fail, so the whole path is dropped in one go.
                    return;
                }
            }
        }
    }

    fn owner_alive(&self, owner: SlotRef) -> bool {
        match owner {
            SlotRef::Model { part, model } => self.model.model_slot(part, model).is_some(),
            SlotRef::Animation { animation } => self.model.animations.contains(animation),
        }
    }

    fn apply_loaded(&mut self, owner: SlotRef, path: &Path, data: &Arc<SourceFileData>) {
        let previous = match owner {
            SlotRef::Model { part, model } => {
                let previous = self.model.model_slot(part, model).and_then(|slot| slot.source.clone());
                if let Some(slot) = self.model.model_slot_mut(part, model) {
                    slot.source = Some(path.to_path_buf());
                    slot.part_selection =
                        Some(data.parts.iter().map(|name| Some(name.clone())).collect());
                }
                previous
            }
            SlotRef::Animation { animation } => {
                let previous = self.model.animations.get(animation).and_then(|entry| entry.source.clone());
                self.model.animations.update(animation, |entry| {
                    entry.source = Some(path.to_path_buf());
                    entry.source_animation = None;
                });
                previous
            }
        };
        // The new reference is held before the old one goes; a re-pick of
        // the same path never dips to zero (and was filtered out earlier).
        if let Some(previous) = previous {
            if previous != path {
                self.cache.release(&mut self.backend, &previous);
            }
        }
        self.notices.push(EditorNotice::SourceLoaded {
            path: path.to_path_buf(),
            animations: data.animations.len(),
            parts: data.parts.len(),
        });
    }

    // --- compilation and shutdown -----------------------------------------

    pub fn assemble(&self) -> CompilationRequest {
        request::assemble(&self.model, &self.cache)
    }

    /// Audits names, assembles one request, and hands it to the compiler.
    /// The cache is untouched; it owns file lifetime, not compile lifetime.
    /// Returns whether a request was actually submitted.
    pub fn compile(&mut self, compiler: &mut dyn ModelCompiler) -> bool {
        if self.model.model_name.is_empty() {
            self.notices
                .push(EditorNotice::CompileFailed { reason: String::from("model name is empty") });
            return false;
        }
        let issues = request::audit_names(&self.model);
        if !issues.is_empty() {
            for issue in &issues {
                self.notices.push(EditorNotice::NameIssue { message: issue.to_string() });
            }
            if self.strict_names {
                self.notices.push(EditorNotice::CompileBlocked { issues: issues.len() });
                return false;
            }
        }
        let mut request = self.assemble();
        if !request.model_name.ends_with(".mdl") {
            request.model_name.push_str(".mdl");
        }
        match compiler.compile_model(&request) {
            Ok(()) => {
                self.notices.push(EditorNotice::CompileSubmitted { model_name: request.model_name });
                true
            }
            Err(error) => {
                eprintln!("[session] compile submission failed: {error:#}");
                self.notices.push(EditorNotice::CompileFailed { reason: format!("{error:#}") });
                false
            }
        }
    }

    /// Editor shutdown: pending selections are dropped and every open file
    /// is force-released exactly once.
    pub fn shutdown(&mut self) {
        self.pending.clear();
        let released = self.cache.len();
        self.cache.teardown(&mut self.backend);
        self.notices.push(EditorNotice::EditorClosed { released_files: released });
    }
}
