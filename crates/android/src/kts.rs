//! Gradle Kotlin DSL import
//!
//! Reads the subset of an app-level `build.gradle.kts` that framework-managed
//! Android projects use and turns it into a [`BuildManifest`]. This is not a
//! Kotlin parser: blocks are recognised by name, statements are either
//! `key = value` assignments or single-string calls such as
//! `id("com.android.application")` and `implementation("g:a:v")`.
//! Anything else is logged and skipped, including the bodies of
//! conditionals and lambdas such as `if (file.exists()) { ... }` or
//! `?.let { file(it) }`.

use crate::dependency::{DependencyRef, CONFIGURATIONS};
use crate::document::SettingValue;
use crate::error::{PlanError, Result};
use crate::manifest::BuildManifest;
use crate::signing::DEBUG_VARIANT;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static BLOCK_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([A-Za-z_]\w*)(?:\(\s*"([^"]*)"\s*\))?\s*\{$"#).unwrap()
});

static STRING_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^([A-Za-z_]\w*)\(\s*"([^"]*)"\s*\)(.*)$"#).unwrap());

static ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_]\w*)\s*=\s*(.+)$").unwrap());

static SIGNING_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^signingConfigs\.(?:getByName|named)\(\s*"([^"]+)"\s*\)$"#).unwrap()
});

static JAVA_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^JavaVersion\.VERSION_(\d+)(?:_(\d+))?$").unwrap());

/// Calls that name a container element, e.g. `getByName("release") {`
const NAMED_ELEMENT_CALLS: &[&str] = &["getByName", "create", "register", "maybeCreate", "named"];

/// Stack frame for a `{` that does not open a recognised block
const ANONYMOUS_FRAME: &str = "_";

/// Kotlin keywords that open a block without naming one
const CONTROL_KEYWORDS: &[&str] = &["else", "try", "finally", "do"];

/// Build types the Android Gradle plugin always defines
const STANDARD_BUILD_TYPES: &[&str] = &["debug", "release"];

/// One logical statement with the 1-based line it started on
#[derive(Debug, PartialEq, Eq)]
struct Statement {
    line: usize,
    text: String,
}

/// Split the script into statements, putting every `{` and `}` on a line of
/// its own and dropping comments.
fn statements(source: &str) -> Vec<Statement> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut start = 1;
    let mut line = 1;
    let mut chars = source.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if current.trim().is_empty() {
            start = line;
        }
        if in_string {
            current.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                '"' => in_string = false,
                '\n' => line += 1,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                current.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        flush(&mut current, start, &mut out);
                        line += 1;
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        line += 1;
                    }
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            '{' => {
                current.push('{');
                flush(&mut current, start, &mut out);
            }
            '}' => {
                flush(&mut current, start, &mut out);
                out.push(Statement {
                    line,
                    text: "}".to_string(),
                });
            }
            '\n' => {
                flush(&mut current, start, &mut out);
                line += 1;
            }
            ';' => flush(&mut current, start, &mut out),
            _ => current.push(c),
        }
    }
    flush(&mut current, start, &mut out);
    out
}

fn flush(current: &mut String, start: usize, out: &mut Vec<Statement>) {
    let text = current.trim();
    if !text.is_empty() {
        out.push(Statement {
            line: start,
            text: text.to_string(),
        });
    }
    current.clear();
}

/// Interpret a right-hand side
fn parse_value(raw: &str) -> SettingValue {
    let raw = raw.trim();
    let raw = raw.strip_suffix(".toString()").unwrap_or(raw);

    if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        return SettingValue::Str(inner.replace("\\\"", "\"").replace("\\\\", "\\"));
    }
    if let Ok(i) = raw.parse::<i64>() {
        return SettingValue::Int(i);
    }
    match raw {
        "true" => return SettingValue::Bool(true),
        "false" => return SettingValue::Bool(false),
        _ => {}
    }
    if let Some(caps) = JAVA_VERSION.captures(raw) {
        let version = match caps.get(2) {
            Some(minor) => format!("{}.{}", &caps[1], minor.as_str()),
            None => caps[1].to_string(),
        };
        return SettingValue::Str(version);
    }
    // References such as `flutter.versionCode` are kept verbatim
    SettingValue::Str(raw.to_string())
}

/// Map a block path and assignment key to a settings key
fn setting_key(path: &[String], key: &str) -> Option<String> {
    let path: Vec<&str> = path.iter().map(String::as_str).collect();
    match (path.as_slice(), key) {
        (["android"] | ["android", "defaultConfig"], _) => Some(key.to_string()),
        (["android", "compileOptions"], _) => Some(key.to_string()),
        (["android", "kotlinOptions"] | ["kotlinOptions"], "jvmTarget") => {
            Some("jvmTarget".to_string())
        }
        (["flutter"], "source") => Some("frameworkSource".to_string()),
        (["flutter"], "target") => Some("frameworkTarget".to_string()),
        ([], _) => None,
        (["android", rest @ ..], _) => Some(format!("{}.{}", rest.join("."), key)),
        (rest, _) => Some(format!("{}.{}", rest.join("."), key)),
    }
}

fn parse_error(line: usize, err: PlanError) -> PlanError {
    PlanError::Parse {
        line,
        message: err.to_string(),
    }
}

/// Parse a `build.gradle.kts` script
pub fn parse(source: &str) -> Result<BuildManifest> {
    let mut manifest = BuildManifest::default();
    let mut stack: Vec<String> = Vec::new();
    let mut build_types: Vec<String> = Vec::new();

    for stmt in statements(source) {
        let text = stmt.text.as_str();

        if text == "}" {
            if stack.pop().is_none() {
                return Err(PlanError::Parse {
                    line: stmt.line,
                    message: "unbalanced '}'".to_string(),
                });
            }
            continue;
        }

        if let Some(caps) = BLOCK_OPEN
            .captures(text)
            .filter(|caps| !CONTROL_KEYWORDS.contains(&&caps[1]))
        {
            let call = &caps[1];
            let name = match caps.get(2) {
                Some(arg) if NAMED_ELEMENT_CALLS.contains(&call) => arg.as_str().to_string(),
                _ => call.to_string(),
            };
            if stack.len() == 2 && stack[0] == "android" && stack[1] == "buildTypes" {
                build_types.push(name.clone());
            }
            stack.push(name);
            continue;
        }

        if text.ends_with('{') {
            tracing::debug!(line = stmt.line, text, "Skipping anonymous block");
            stack.push(ANONYMOUS_FRAME.to_string());
            continue;
        }

        if stack.iter().any(|frame| frame == ANONYMOUS_FRAME) {
            tracing::trace!(line = stmt.line, text, "Skipping statement inside anonymous block");
            continue;
        }

        let path: Vec<&str> = stack.iter().map(String::as_str).collect();
        match path.as_slice() {
            ["plugins"] => parse_plugin(&mut manifest, &stmt)?,
            ["dependencies"] => parse_dependency(&mut manifest, &stmt)?,
            _ => parse_assignment(&mut manifest, &stack, &stmt)?,
        }
    }

    if !stack.is_empty() {
        return Err(PlanError::Parse {
            line: source.lines().count(),
            message: format!("unclosed block '{}'", stack.join(".")),
        });
    }

    if manifest.signing.variants().all(|v| v != DEBUG_VARIANT) {
        manifest.signing.register(DEBUG_VARIANT, DEBUG_VARIANT)?;
    }

    let extra: Vec<String> = build_types
        .into_iter()
        .filter(|b| !STANDARD_BUILD_TYPES.contains(&b.as_str()))
        .collect();
    if !extra.is_empty() {
        let mut variants: Vec<String> = STANDARD_BUILD_TYPES.iter().map(|s| s.to_string()).collect();
        variants.extend(extra);
        manifest.variants = Some(variants);
    }

    manifest.settings.seal();
    tracing::debug!(
        settings = manifest.settings.len(),
        plugins = manifest.plugins.len(),
        dependencies = manifest.dependencies.len(),
        "Gradle script imported"
    );
    Ok(manifest)
}

/// Read and parse a `build.gradle.kts` file
pub fn parse_file(path: &Path) -> Result<BuildManifest> {
    tracing::debug!(path = %path.display(), "Importing Gradle script");
    let source = std::fs::read_to_string(path)?;
    parse(&source)
}

fn parse_plugin(manifest: &mut BuildManifest, stmt: &Statement) -> Result<()> {
    let Some(caps) = STRING_CALL.captures(&stmt.text) else {
        tracing::debug!(line = stmt.line, text = %stmt.text, "Skipping plugin statement");
        return Ok(());
    };
    let id = match &caps[1] {
        "id" => caps[2].to_string(),
        "kotlin" => format!("org.jetbrains.kotlin.{}", &caps[2]),
        _ => {
            tracing::debug!(line = stmt.line, text = %stmt.text, "Skipping plugin statement");
            return Ok(());
        }
    };
    if caps[3].contains("apply false") {
        return Ok(());
    }
    manifest.plugins.add(id).map_err(|e| parse_error(stmt.line, e))
}

fn parse_dependency(manifest: &mut BuildManifest, stmt: &Statement) -> Result<()> {
    let Some(caps) = STRING_CALL.captures(&stmt.text) else {
        tracing::warn!(line = stmt.line, text = %stmt.text, "Skipping unsupported dependency declaration");
        return Ok(());
    };
    let configuration = &caps[1];
    if !CONFIGURATIONS.contains(&configuration) {
        tracing::warn!(line = stmt.line, configuration, "Skipping unknown dependency configuration");
        return Ok(());
    }

    let dependency = DependencyRef::parse(&caps[2])
        .map_err(|e| parse_error(stmt.line, e))?
        .with_configuration(configuration);
    manifest
        .dependencies
        .add(dependency)
        .map_err(|e| parse_error(stmt.line, e))
}

fn parse_assignment(manifest: &mut BuildManifest, stack: &[String], stmt: &Statement) -> Result<()> {
    let Some(caps) = ASSIGNMENT.captures(&stmt.text) else {
        tracing::debug!(line = stmt.line, text = %stmt.text, "Skipping statement");
        return Ok(());
    };
    let key = &caps[1];
    let raw = caps[2].trim();

    // android.buildTypes.<variant>.signingConfig
    if stack.len() == 3 && stack[0] == "android" && stack[1] == "buildTypes" && key == "signingConfig" {
        let Some(reference) = SIGNING_REF.captures(raw) else {
            return Err(PlanError::Parse {
                line: stmt.line,
                message: format!("unsupported signingConfig reference '{}'", raw),
            });
        };
        return manifest
            .signing
            .register(stack[2].clone(), reference[1].to_string())
            .map_err(|e| parse_error(stmt.line, e));
    }

    let Some(setting) = setting_key(stack, key) else {
        tracing::debug!(line = stmt.line, key, "Skipping top-level assignment");
        return Ok(());
    };
    manifest
        .settings
        .set(setting, parse_value(raw))
        .map_err(|e| parse_error(stmt.line, e))
}
