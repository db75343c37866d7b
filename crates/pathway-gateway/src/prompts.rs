//! Prompt library: Markdown templates under `<data root>/prompts/`.
//!
//! A prompt file may start with YAML frontmatter:
//!
//! ```text
//! ---
//! name: review
//! description: Review a change against the workflow
//! arguments:
//!   - name: change
//!     description: What changed
//!     required: true
//! ---
//! Review {{change}} ...
//! ```
//!
//! Without frontmatter the prompt is named after the file stem and takes no
//! declared arguments.

use pathway_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Frontmatter {
    name: Option<String>,
    description: String,
    arguments: Vec<PromptArgument>,
}

/// Metadata returned by `prompts/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptInfo {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Clone)]
pub struct Prompt {
    pub info: PromptInfo,
    pub body: String,
    pub path: PathBuf,
}

/// A prompt with its arguments substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub description: String,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct PromptLibrary {
    prompts: BTreeMap<String, Prompt>,
}

/// Split `---` frontmatter from the body. Returns `None` for the frontmatter when
/// the file has none.
fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let rest = match content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    {
        Some(r) => r,
        None => return (None, content),
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    // An unterminated fence is treated as plain body text.
    (None, content)
}

pub fn parse_prompt(path: &Path, content: &str) -> Result<Prompt> {
    let (yaml, body) = split_frontmatter(content);
    let front: Frontmatter = match yaml {
        Some(y) if !y.trim().is_empty() => serde_yaml::from_str(y)?,
        _ => Frontmatter::default(),
    };
    let name = match front.name {
        Some(n) if !n.trim().is_empty() => n,
        _ => path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .ok_or_else(|| Error::invalid(format!("bad prompt file name {}", path.display())))?,
    };
    Ok(Prompt {
        info: PromptInfo {
            name,
            description: front.description,
            arguments: front.arguments,
        },
        body: body.trim_start_matches(['\r', '\n']).to_string(),
        path: path.to_path_buf(),
    })
}

/// Replace every `{{name}}` whose name is in `args`. Unknown placeholders are kept.
fn substitute(template: &str, args: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match args.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

impl PromptLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.md` under `dir`, recursively. A missing directory yields an empty
    /// library; unreadable or malformed files are skipped with a warning.
    pub fn load(dir: &Path) -> Self {
        let mut library = Self::new();
        if !dir.is_dir() {
            return library;
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
            .collect();
        files.sort();

        for path in files {
            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("cannot read prompt {}: {}", path.display(), e);
                    continue;
                }
            };
            match parse_prompt(&path, &content) {
                Ok(prompt) => library.insert(prompt),
                Err(e) => warn!("skipping prompt {}: {}", path.display(), e),
            }
        }
        debug!("loaded {} prompts from {}", library.len(), dir.display());
        library
    }

    /// Add a prompt. The first prompt registered under a name wins.
    pub fn insert(&mut self, prompt: Prompt) {
        if let Some(existing) = self.prompts.get(&prompt.info.name) {
            warn!(
                "prompt '{}' in {} shadowed by {}",
                prompt.info.name,
                prompt.path.display(),
                existing.path.display()
            );
            return;
        }
        self.prompts.insert(prompt.info.name.clone(), prompt);
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Prompt metadata sorted by name.
    pub fn list(&self) -> Vec<&PromptInfo> {
        self.prompts.values().map(|p| &p.info).collect()
    }

    pub fn get(&self, name: &str, args: &HashMap<String, String>) -> Result<RenderedPrompt> {
        let prompt = self
            .prompts
            .get(name)
            .ok_or_else(|| Error::not_found(format!("prompt '{}'", name)))?;

        let missing: Vec<&str> = prompt
            .info
            .arguments
            .iter()
            .filter(|a| a.required && !args.contains_key(&a.name))
            .map(|a| a.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(Error::invalid(format!(
                "prompt '{}' requires argument(s): {}",
                name,
                missing.join(", ")
            )));
        }

        // Declared optional arguments that were not supplied render as empty.
        let mut values = args.clone();
        for arg in &prompt.info.arguments {
            values.entry(arg.name.clone()).or_default();
        }

        Ok(RenderedPrompt {
            description: prompt.info.description.clone(),
            text: substitute(&prompt.body, &values),
        })
    }
}
