use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use super::{file_stem_name, SourceAnimation, SourceBone, SourceFileData};

#[derive(Debug, Error)]
pub enum SmdError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing version command")]
    MissingVersion,
    #[error("unsupported version {0}")]
    UnsupportedVersion(i64),
    #[error("malformed number on line {0}")]
    MalformedNumber(usize),
    #[error("malformed node on line {0}")]
    MalformedNode(usize),
    #[error("duplicate node id {0} on line {1}")]
    DuplicateNodeId(usize, usize),
    #[error("node {0} references unknown parent {1}")]
    UnknownParent(usize, i64),
    #[error("no nodes specified")]
    NoNodes,
    #[error("no frames specified")]
    NoFrames,
    #[error("unknown command '{0}' on line {1}")]
    UnknownCommand(String, usize),
    #[error("unexpected end of file inside '{0}' section")]
    UnexpectedEof(&'static str),
}

/// Reads the metadata of an SMD file: the node list, the frame count of its
/// single animation, and whether it carries a mesh. Vertex and keyframe
/// payloads are skipped; an SMD contributes one animation and at most one
/// part, both named after the file stem.
pub(super) fn load_smd(path: &Path) -> Result<SourceFileData, SmdError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Lines::new(reader);

    let mut version: Option<i64> = None;
    let mut nodes: Vec<(usize, String, i64)> = Vec::new();
    let mut node_order: HashMap<usize, usize> = HashMap::new();
    let mut frame_count = 0usize;
    let mut has_mesh = false;

    while let Some((line_no, line)) = lines.next()? {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else { continue };
        match command {
            "version" => {
                let raw = words.next().ok_or(SmdError::MissingVersion)?;
                let value: i64 = raw.parse().map_err(|_| SmdError::MalformedNumber(line_no))?;
                if !(1..=3).contains(&value) {
                    return Err(SmdError::UnsupportedVersion(value));
                }
                version = Some(value);
            }
            "nodes" => {
                if version.is_none() {
                    return Err(SmdError::MissingVersion);
                }
                loop {
                    let (line_no, line) = lines.next()?.ok_or(SmdError::UnexpectedEof("nodes"))?;
                    if line == "end" {
                        break;
                    }
                    let (id, name, parent) = parse_node(&line, line_no)?;
                    if node_order.insert(id, nodes.len()).is_some() {
                        return Err(SmdError::DuplicateNodeId(id, line_no));
                    }
                    nodes.push((id, name, parent));
                }
            }
            "skeleton" => loop {
                let (line_no, line) = lines.next()?.ok_or(SmdError::UnexpectedEof("skeleton"))?;
                if line == "end" {
                    break;
                }
                if let Some(rest) = line.strip_prefix("time") {
                    rest.trim().parse::<i64>().map_err(|_| SmdError::MalformedNumber(line_no))?;
                    frame_count += 1;
                }
            },
            "triangles" => loop {
                let (_, line) = lines.next()?.ok_or(SmdError::UnexpectedEof("triangles"))?;
                if line == "end" {
                    break;
                }
                has_mesh = true;
            },
            "vertexanimation" => loop {
                let (_, line) = lines.next()?.ok_or(SmdError::UnexpectedEof("vertexanimation"))?;
                if line == "end" {
                    break;
                }
            },
            other => return Err(SmdError::UnknownCommand(other.to_string(), line_no)),
        }
    }

    if version.is_none() {
        return Err(SmdError::MissingVersion);
    }
    if nodes.is_empty() {
        return Err(SmdError::NoNodes);
    }
    if frame_count == 0 {
        return Err(SmdError::NoFrames);
    }

    let mut bones = Vec::with_capacity(nodes.len());
    for (id, name, parent) in &nodes {
        let parent = if *parent < 0 {
            None
        } else {
            let parent_id = *parent as usize;
            Some(*node_order.get(&parent_id).ok_or(SmdError::UnknownParent(*id, *parent))?)
        };
        bones.push(SourceBone { name: name.clone(), parent });
    }

    let stem = file_stem_name(path);
    let parts = if has_mesh { vec![stem.clone()] } else { Vec::new() };
    Ok(SourceFileData {
        bones,
        animations: vec![SourceAnimation { name: stem, frame_count }],
        parts,
    })
}

/// Node lines are `<id> "<name>" <parent>`; names may contain spaces.
fn parse_node(line: &str, line_no: usize) -> Result<(usize, String, i64), SmdError> {
    let open = line.find('"').ok_or(SmdError::MalformedNode(line_no))?;
    let close = line.rfind('"').ok_or(SmdError::MalformedNode(line_no))?;
    if close <= open {
        return Err(SmdError::MalformedNode(line_no));
    }
    let id: usize = line[..open].trim().parse().map_err(|_| SmdError::MalformedNumber(line_no))?;
    let name = line[open + 1..close].to_string();
    let parent: i64 = line[close + 1..].trim().parse().map_err(|_| SmdError::MalformedNumber(line_no))?;
    Ok((id, name, parent))
}

/// Line iterator that trims whitespace and strips `//` and `;` comments,
/// skipping lines that end up empty. Yields 1-based line numbers.
struct Lines<R> {
    reader: R,
    line_no: usize,
    buffer: String,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self { reader, line_no: 0, buffer: String::new() }
    }

    fn next(&mut self) -> Result<Option<(usize, String)>, SmdError> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let mut content = self.buffer.as_str();
            if let Some(index) = content.find("//") {
                content = &content[..index];
            }
            if let Some(index) = content.find(';') {
                content = &content[..index];
            }
            let content = content.trim();
            if !content.is_empty() {
                return Ok(Some((self.line_no, content.to_string())));
            }
        }
    }
}
