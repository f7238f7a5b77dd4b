//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries hold:
//! domain is pure, application sees only domain and ports, infra never
//! reaches up into presentation.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        if line.trim().contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Non-comment lines outside `#[cfg(test)]` blocks, with 1-based line numbers.
fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut tracker = CfgTestTracker::new();
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            let comment = trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*');
            (!in_test && !comment).then(|| (i + 1, line.to_string()))
        })
        .collect()
}

fn src(sub: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(sub)
}

fn violations(dir: &Path, forbidden: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    for file in collect_rs_files(dir) {
        let rel = file
            .strip_prefix(env!("CARGO_MANIFEST_DIR"))
            .unwrap_or(&file)
            .display()
            .to_string();
        for (lineno, line) in production_lines(&file) {
            for needle in forbidden {
                if line.contains(needle) {
                    found.push(format!("{rel}:{lineno}: `{needle}`: {}", line.trim()));
                }
            }
        }
    }
    found
}

#[test]
fn test_domain_is_pure() {
    let found = violations(
        &src("domain"),
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
            "reqwest",
        ],
    );
    assert!(found.is_empty(), "domain/ must stay pure:\n{}", found.join("\n"));
}

#[test]
fn test_application_depends_only_on_domain_and_ports() {
    let found = violations(
        &src("application"),
        &["crate::infra", "crate::commands", "crate::output", "reqwest", "std::fs"],
    );
    assert!(
        found.is_empty(),
        "application/ must not reach infra or presentation:\n{}",
        found.join("\n")
    );
}

#[test]
fn test_infra_has_no_imports_from_commands_or_output() {
    let found = violations(&src("infra"), &["crate::commands", "crate::output"]);
    assert!(found.is_empty(), "forbidden import in infra/:\n{}", found.join("\n"));
}

#[test]
fn test_output_has_no_imports_from_infra_or_commands() {
    let found = violations(&src("output"), &["crate::infra", "crate::commands"]);
    assert!(found.is_empty(), "forbidden import in output/:\n{}", found.join("\n"));
}

#[test]
fn test_only_infra_talks_http() {
    let mut found = Vec::new();
    for dir in ["domain", "application", "commands", "output"] {
        found.extend(violations(&src(dir), &["reqwest::Client", "Client::builder"]));
    }
    assert!(found.is_empty(), "HTTP client outside infra/:\n{}", found.join("\n"));
}

#[test]
fn test_no_unwrap_or_expect_in_production_code() {
    let mut found = Vec::new();
    for dir in ["domain", "application", "infra", "commands"] {
        found.extend(violations(&src(dir), &[".unwrap()", ".expect("]));
    }
    assert!(found.is_empty(), "propagate errors instead:\n{}", found.join("\n"));
}
