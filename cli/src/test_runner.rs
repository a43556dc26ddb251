use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use interpreter::{RenderOptions, Template};

use crate::bindings_file::table_to_bindings;

const EXTENSION: &str = ".test.mrk";

/// Front matter of a `.test.mrk` file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Values bound at the root scope.
    #[serde(default)]
    pub bindings: toml::Table,

    /// Expected rendered text (compared after trimming).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// If true, the template must fail to parse.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Substring the parse error message must contain.
    #[serde(default)]
    pub expect_parse_message: Option<String>,

    #[serde(default)]
    pub recursion_limit: Option<usize>,
}

/// Split a `.test.mrk` file into its TOML config and template source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- front matter delimiter")?;
    let after_open = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))
        .unwrap_or(after_open);

    let close = after_open
        .find("\n---")
        .ok_or("missing closing --- front matter delimiter")?;

    let toml_str = after_open[..close].trim_end_matches('\r');
    let rest = &after_open[close + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;
    if config.expect_parse_error && config.expect_output.is_some() {
        return Err("expect_output and expect_parse_error are exclusive".into());
    }

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(EXTENSION))
                .unwrap_or("?")
        })
    }
}

pub fn run_single_test(path: &Path) -> TestResult {
    let (description, outcome) = match std::fs::read_to_string(path) {
        Err(e) => (None, TestOutcome::Fail(format!("cannot read file: {}", e))),
        Ok(content) => match parse_test_file(&content) {
            Err(e) => (None, TestOutcome::Fail(format!("front matter error: {}", e))),
            Ok((config, source)) => {
                let filename = path.display().to_string();
                let outcome = match check(&config, source, &filename) {
                    None => TestOutcome::Pass,
                    Some(reason) => TestOutcome::Fail(reason),
                };
                (config.description, outcome)
            }
        },
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Returns `Some(reason)` when the template does not behave as configured.
fn check(config: &TestConfig, source: &str, filename: &str) -> Option<String> {
    let template = match Template::with_filename(source, filename) {
        Ok(template) => template,
        Err(error) if config.expect_parse_error => {
            return match &config.expect_parse_message {
                Some(expected) if !error.message.contains(expected.as_str()) => Some(format!(
                    "expected parse error containing \"{}\", got: {}",
                    expected, error.message
                )),
                _ => None,
            };
        }
        Err(error) => return Some(format!("unexpected parse error: {}", error)),
    };

    if config.expect_parse_error {
        return Some("expected parse error, but parsing succeeded".into());
    }

    let mut options = RenderOptions::new();
    if let Some(limit) = config.recursion_limit {
        options = options.with_recursion_limit(limit);
    }
    let bindings = table_to_bindings(&config.bindings);
    let actual = template.with_options(options).render(&bindings);
    debug!(filename, output = %actual, "rendered golden test");

    let expected = config.expect_output.as_deref()?;
    if actual.trim() == expected.trim() {
        None
    } else {
        Some(format!(
            "output mismatch\n  expected: {}\n  actual:   {}",
            expected.trim(),
            actual.trim()
        ))
    }
}

/// `.test.mrk` files grouped by their folder relative to `root`.
/// Files directly in `root` get the empty category.
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(EXTENSION));
        if is_test {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// Keep the categories named on the command line, including their
/// subfolders. Unknown names are reported and skipped.
fn select<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }

    let mut selected = BTreeMap::new();
    for name in requested {
        let name = name.trim_matches('/');
        let prefix = format!("{}/", name);
        let mut found = false;
        for (category, files) in all {
            if category == name || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files.as_slice());
                found = true;
            }
        }
        if !found {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                name,
                available.join(", ")
            );
        }
    }
    selected
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", EXTENSION, path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

// ----- Reporting -----

struct Style {
    no_color: bool,
}

impl Style {
    fn paint(&self, text: &str, code: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
    }

    fn pass(&self) -> String {
        self.paint("PASS", "32")
    }

    fn fail(&self) -> String {
        self.paint("FAIL", "31")
    }

    fn bold(&self, text: &str) -> String {
        self.paint(text, "1")
    }
}

#[derive(Default)]
struct Summary {
    passed: usize,
    failures: Vec<TestResult>,
}

impl Summary {
    fn record(&mut self, result: TestResult, style: &Style) {
        match result.outcome {
            TestOutcome::Pass => {
                eprintln!("  {}  {}", style.pass(), result.label());
                self.passed += 1;
            }
            TestOutcome::Fail(_) => {
                eprintln!("  {}  {}", style.fail(), result.label());
                self.failures.push(result);
            }
        }
    }

    /// Print failure details and the final line; returns the exit code.
    fn finish(self, style: &Style) -> i32 {
        if !self.failures.is_empty() {
            eprintln!();
            eprintln!("failures:");
            for failure in &self.failures {
                eprintln!();
                eprintln!("  --- {} ---", failure.path.display());
                if let TestOutcome::Fail(reason) = &failure.outcome {
                    for line in reason.lines() {
                        eprintln!("  {}", line);
                    }
                }
            }
        }

        eprintln!();
        let failed = self.failures.len();
        if failed == 0 {
            eprintln!(
                "test result: {}. {} passed, 0 failed",
                style.paint("ok", "32"),
                self.passed
            );
            0
        } else {
            eprintln!(
                "test result: {}. {} passed, {} failed (of {})",
                style.paint("FAILED", "31"),
                self.passed,
                failed,
                self.passed + failed
            );
            1
        }
    }
}

/// Run every `.test.mrk` file under `path` (or a single file).
/// If `categories` is non-empty, only those categories run.
/// Returns the process exit code: 0 when everything passed.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { no_color };
    let mut summary = Summary::default();

    if path.is_file() {
        summary.record(run_single_test(path), &style);
        return summary.finish(&style);
    }

    let all = discover_categorized(path);
    if all.is_empty() {
        eprintln!("no {} files found in {}", EXTENSION, path.display());
        return 1;
    }

    let selected = select(&all, categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    for (category, files) in selected {
        eprintln!();
        eprintln!("{}", style.bold(category_label(category)));
        for file in files {
            summary.record(run_single_test(file), &style);
        }
    }

    summary.finish(&style)
}
