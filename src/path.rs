//! Path normalization
//!
//! Canonicalizes user-supplied paths into the key space of the path index. Keys are
//! Unicode-normalized, case-folded, slash-rooted, free of `.`/`..` segments, and never
//! start with the configured remote root prefix.

use unicode_normalization::UnicodeNormalization;

const MAX_FOLD_PASSES: usize = 4;

/// Pure, total path canonicalizer bound to one remote root prefix
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    /// Folded prefix segments stripped from keys
    prefix: Vec<String>,
    /// Prefix as configured (case preserved), used to build remote locations
    display_prefix: String,
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::new("origin")
    }
}

impl PathNormalizer {
    pub fn new(root_prefix: &str) -> Self {
        let display = clean_segments(&compose(root_prefix));
        let prefix = display.iter().map(|s| fold(s)).collect();
        Self {
            prefix,
            display_prefix: display.join("/"),
        }
    }

    /// Canonical index key for `raw`. Idempotent; unparsable input maps to `/`.
    pub fn normalize(&self, raw: &str) -> String {
        let segments = self.strip_prefix(clean_segments(&fold(raw)));
        join_key(&segments)
    }

    /// Case-preserving cleaned segments of `raw`, with the root prefix removed
    pub fn display_segments(&self, raw: &str) -> Vec<String> {
        self.strip_prefix(clean_segments(&compose(raw)))
    }

    /// Remote-rooted location string for a directory given as display segments
    pub fn remote_location(&self, dir: &[String]) -> String {
        match (self.display_prefix.is_empty(), dir.is_empty()) {
            (true, _) => format!("/{}", dir.join("/")),
            (false, true) => self.display_prefix.clone(),
            (false, false) => format!("{}/{}", self.display_prefix, dir.join("/")),
        }
    }

    fn strip_prefix(&self, mut segments: Vec<String>) -> Vec<String> {
        if self.prefix.is_empty() {
            return segments;
        }
        while segments.len() >= self.prefix.len()
            && segments
                .iter()
                .zip(&self.prefix)
                .all(|(seg, pre)| fold(seg) == *pre)
        {
            segments.drain(..self.prefix.len());
        }
        segments
    }
}

/// A raw path decomposed into directory, base name and extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    /// Parent directory segments, case preserved, root prefix removed
    pub dir: Vec<String>,
    /// Base name without extension
    pub name: String,
    /// Extension including the leading dot, or empty
    pub ext: String,
}

impl PathParts {
    /// Split `raw` into its parts. Returns `None` for the root.
    pub fn split(normalizer: &PathNormalizer, raw: &str) -> Option<Self> {
        let mut dir = normalizer.display_segments(raw);
        let file = dir.pop()?;
        let (name, ext) = split_extension(&file);
        Some(Self {
            dir,
            name: name.to_string(),
            ext: ext.to_string(),
        })
    }

    /// Last segment as written, extension included
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name, self.ext)
    }

    /// Display path of every ancestor directory, root-to-leaf
    pub fn ancestors(&self) -> Vec<Vec<String>> {
        (1..=self.dir.len()).map(|i| self.dir[..i].to_vec()).collect()
    }
}

/// Split `file` at its final dot. Leading-dot names have no extension.
pub fn split_extension(file: &str) -> (&str, &str) {
    match file.rfind('.') {
        Some(idx) if idx > 0 => file.split_at(idx),
        _ => (file, ""),
    }
}

/// Join display segments into a slash-rooted path
pub fn display_path(segments: &[String]) -> String {
    join_key(segments)
}

fn compose(raw: &str) -> String {
    raw.nfc().collect::<String>().replace('\\', "/")
}

// Lowercasing can denormalize a handful of code points, so fold to a fixpoint.
fn fold(raw: &str) -> String {
    let mut current = compose(raw).to_lowercase();
    for _ in 0..MAX_FOLD_PASSES {
        let next: String = current.nfc().collect::<String>().to_lowercase();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn clean_segments(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other.to_string()),
        }
    }
    out
}

fn join_key(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}
