//! Repository-wide language detection

use std::path::Path;
use walkdir::WalkDir;

/// Returned when no file matches the extension table.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Extension → language, in tie-breaking order.
const LANGUAGE_TABLE: [(&str, &str); 8] = [
    ("py", "python"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("java", "java"),
    ("go", "go"),
    ("rs", "rust"),
    ("cpp", "cpp"),
    ("sh", "shell"),
];

/// Detects the dominant language of a working tree from file extensions.
///
/// Walks every file below `root` except the `.git` directory. Ties are
/// resolved in favour of the language listed first in the table.
pub fn detect_language(root: &Path) -> String {
    let mut counts = [0usize; LANGUAGE_TABLE.len()];

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");

    for entry in walker.flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if let Some(idx) = LANGUAGE_TABLE.iter().position(|(e, _)| *e == ext) {
            counts[idx] += 1;
        }
    }

    pick_language(&counts).to_string()
}

fn pick_language(counts: &[usize; LANGUAGE_TABLE.len()]) -> &'static str {
    let mut best: Option<(usize, usize)> = None;
    for (idx, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((idx, count)),
        }
    }
    best.map(|(idx, _)| LANGUAGE_TABLE[idx].1)
        .unwrap_or(UNKNOWN_LANGUAGE)
}
