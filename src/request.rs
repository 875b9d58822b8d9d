use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::cache::SourceFileCache;
use crate::edit::EditModel;

/// The normalized payload the external compiler consumes. Mappings are
/// keyed by export name in edit order; two entities sharing a name collapse
/// last-write-wins (see [`audit_names`] for the reported counterpart).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompilationRequest {
    pub model_name: String,
    pub export_path: PathBuf,
    pub body_parts: IndexMap<String, RequestBodyPart>,
    pub animations: IndexMap<String, RequestAnimation>,
    pub sequences: IndexMap<String, RequestSequence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBodyPart {
    pub models: IndexMap<String, RequestModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestModel {
    pub is_blank: bool,
    pub file_source: PathBuf,
    pub part_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestAnimation {
    pub file_source: PathBuf,
    pub animation_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSequence {
    pub animations: Vec<Vec<String>>,
}

/// Folds the current edit snapshot into one request. Pure shape
/// transformation: no I/O, no cache mutation, and total over any snapshot —
/// request validity is the compiler's concern, not this function's.
pub fn assemble(model: &EditModel, cache: &SourceFileCache) -> CompilationRequest {
    let mut body_parts = IndexMap::new();
    for (_, body_part) in model.body_parts.iter() {
        let mut models = IndexMap::new();
        for (_, slot) in body_part.models.iter() {
            // Unset selection slots mean "this named mesh part is excluded".
            let part_names: Vec<String> =
                slot.part_selection.as_deref().unwrap_or(&[]).iter().flatten().cloned().collect();
            models.insert(
                slot.name.clone(),
                RequestModel {
                    is_blank: slot.blank,
                    file_source: slot.source.clone().unwrap_or_default(),
                    part_names,
                },
            );
        }
        body_parts.insert(body_part.name.clone(), RequestBodyPart { models });
    }

    let mut animations = IndexMap::new();
    for (_, animation) in model.animations.iter() {
        let animation_name = animation
            .source_animation
            .clone()
            .or_else(|| {
                let source = animation.source.as_deref()?;
                let data = cache.metadata(source)?;
                data.first_animation().map(str::to_string)
            })
            .unwrap_or_default();
        animations.insert(
            animation.name.clone(),
            RequestAnimation {
                file_source: animation.source.clone().unwrap_or_default(),
                animation_name,
            },
        );
    }

    let mut sequences = IndexMap::new();
    for (_, sequence) in model.sequences.iter() {
        // Cloned row-major; empty cells stay empty strings, the grid
        // positions carry blend semantics downstream.
        sequences.insert(sequence.name.clone(), RequestSequence { animations: sequence.grid.clone() });
    }

    CompilationRequest {
        model_name: model.model_name.clone(),
        export_path: model.export_path.clone().unwrap_or_default(),
        body_parts,
        animations,
        sequences,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    BodyPart,
    Model,
    Animation,
    Sequence,
}

impl NameKind {
    pub fn label(self) -> &'static str {
        match self {
            NameKind::BodyPart => "body part",
            NameKind::Model => "model",
            NameKind::Animation => "animation",
            NameKind::Sequence => "sequence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameIssue {
    Empty { kind: NameKind },
    Duplicate { kind: NameKind, name: String },
}

impl fmt::Display for NameIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameIssue::Empty { kind } => write!(f, "unnamed {}", kind.label()),
            NameIssue::Duplicate { kind, name } => {
                write!(f, "duplicate {} name '{name}'", kind.label())
            }
        }
    }
}

/// Reports names that would collapse or vanish in the assembled request:
/// empty names and duplicates within a mapping (model names clash per body
/// part, not globally). Assembly itself never fails; whether issues block
/// submission is the session's policy.
pub fn audit_names(model: &EditModel) -> Vec<NameIssue> {
    let mut issues = Vec::new();
    audit_collection(
        NameKind::BodyPart,
        model.body_parts.values().map(|part| part.name.as_str()),
        &mut issues,
    );
    for (_, body_part) in model.body_parts.iter() {
        audit_collection(
            NameKind::Model,
            body_part.models.values().map(|slot| slot.name.as_str()),
            &mut issues,
        );
    }
    audit_collection(
        NameKind::Animation,
        model.animations.values().map(|animation| animation.name.as_str()),
        &mut issues,
    );
    audit_collection(
        NameKind::Sequence,
        model.sequences.values().map(|sequence| sequence.name.as_str()),
        &mut issues,
    );
    issues
}

fn audit_collection<'a>(
    kind: NameKind,
    names: impl Iterator<Item = &'a str>,
    issues: &mut Vec<NameIssue>,
) {
    let mut seen: HashSet<&str> = HashSet::new();
    for name in names {
        if name.is_empty() {
            issues.push(NameIssue::Empty { kind });
        } else if !seen.insert(name) {
            issues.push(NameIssue::Duplicate { kind, name: name.to_string() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::{Animation, BodyPart, ModelSlot, Sequence};

    #[test]
    fn audit_flags_duplicates_and_empties() {
        let mut model = EditModel::default();
        model.animations.insert(Animation { name: "idle".into(), ..Animation::default() });
        model.animations.insert(Animation { name: "idle".into(), ..Animation::default() });
        model.sequences.insert(Sequence { name: String::new(), grid: Vec::new() });
        let issues = audit_names(&model);
        assert!(issues
            .contains(&NameIssue::Duplicate { kind: NameKind::Animation, name: "idle".into() }));
        assert!(issues.contains(&NameIssue::Empty { kind: NameKind::Sequence }));
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn model_names_clash_per_body_part_only() {
        let mut model = EditModel::default();
        let mut left = BodyPart { name: "left".into(), ..BodyPart::default() };
        left.models.insert(ModelSlot { name: "mesh".into(), ..ModelSlot::default() });
        let mut right = BodyPart { name: "right".into(), ..BodyPart::default() };
        right.models.insert(ModelSlot { name: "mesh".into(), ..ModelSlot::default() });
        model.body_parts.insert(left);
        model.body_parts.insert(right);
        assert!(audit_names(&model).is_empty());
    }
}
