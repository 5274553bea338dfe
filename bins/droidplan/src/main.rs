//! droidplan CLI
//!
//! Resolves an Android app's build configuration into a build plan.

use anyhow::Result;
use clap::{Parser, Subcommand};
use droidplan_android::constraint::{ConstraintValidator, VersionConstraint};
use droidplan_android::{kts, BuildManifest, BuildPlan, PlanValue};
use droidplan_cli::output::{format_count, format_duration, Status};
use droidplan_core::config::{Config, OutputFormat};
use droidplan_core::error::exit_codes;
use droidplan_core::{Error, ResultExt};
use droidplan_telemetry::{level_for_verbosity, timed_span, TelemetryConfig, Timer};
use owo_colors::{OwoColorize, Stream};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "droidplan")]
#[command(about = "Resolve Android build configuration into a build plan")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Build manifest (.toml) or Gradle script (.gradle.kts)
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the manifest and compose a plan, reporting problems
    Validate {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Print the composed build plan
    Plan {
        /// Output format: text, json, toml
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Show the signing identity for a build variant
    Signing {
        /// Build variant, e.g. release
        variant: String,
    },

    /// List dependencies in declaration order
    Deps {
        /// Only show one Gradle configuration
        #[arg(long)]
        configuration: Option<String>,
    },

    /// Check an SDK level triple
    #[command(name = "check-sdk")]
    CheckSdk {
        /// minSdk
        #[arg(long = "min")]
        minimum: u32,
        /// targetSdk
        #[arg(long)]
        target: u32,
        /// compileSdk
        #[arg(long)]
        compile: u32,
    },

    /// Convert a build.gradle.kts script into a manifest
    Import {
        /// Path to build.gradle.kts
        script: PathBuf,
        /// Write the manifest here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

struct Context {
    config: Config,
    manifest: Option<PathBuf>,
    quiet: bool,
}

impl Context {
    fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.config.schema.tool.manifest))
    }

    fn load_manifest(&self) -> droidplan_core::Result<BuildManifest> {
        let path = self.manifest_path();
        if !path.exists() {
            return Err(Error::file_not_found(&path)
                .with_suggestion("Pass --manifest or set tool.manifest in .droidplan.toml"));
        }
        let loaded = if is_gradle_script(&path) {
            kts::parse_file(&path)
        } else {
            BuildManifest::from_path(&path)
        };
        loaded
            .map_err(Error::from)
            .context(format!("Loading {}", path.display()))
    }

    fn plan_format(&self, requested: Option<OutputFormat>) -> OutputFormat {
        requested.unwrap_or(self.config.schema.tool.format)
    }

    fn compose(&self, manifest: &BuildManifest, strict: bool) -> droidplan_core::Result<BuildPlan> {
        let tool = &self.config.schema.tool;
        let composer = manifest
            .composer(&tool.variants)
            .strict(strict || tool.strict);
        manifest.compose_with(&composer).map_err(Error::from)
    }
}

fn is_gradle_script(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".kts")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            Status::report(&e);
            std::process::exit(exit_codes::CONFIG_ERROR);
        }
    };

    droidplan_telemetry::init_with_config(TelemetryConfig {
        log_level: level_for_verbosity(cli.verbose, cli.quiet, &config.schema.logging.level),
        json: config.schema.logging.json,
        ansi: !cli.no_color && std::io::stderr().is_terminal(),
    })?;

    let ctx = Context {
        config,
        manifest: cli.manifest,
        quiet: cli.quiet,
    };

    // Failures of `plan --format json` are reported as JSON on stdout
    let json_report = matches!(
        cli.command,
        Commands::Plan { format, .. } if ctx.plan_format(format) == OutputFormat::Json
    );

    let outcome = match cli.command {
        Commands::Validate { strict } => run_validate(&ctx, strict),
        Commands::Plan { format, strict } => run_plan(&ctx, format, strict),
        Commands::Signing { variant } => run_signing(&ctx, &variant),
        Commands::Deps { configuration } => run_deps(&ctx, configuration.as_deref()),
        Commands::CheckSdk {
            minimum,
            target,
            compile,
        } => run_check_sdk(&ctx, VersionConstraint::new(minimum, target, compile)),
        Commands::Import { script, output } => run_import(&ctx, &script, output.as_deref()),
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(code = %e.code, "Command failed");
            match serde_json::to_string_pretty(&e.to_report()) {
                Ok(report) if json_report => println!("{}", report),
                _ => Status::report(&e),
            }
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}

fn run_validate(ctx: &Context, strict: bool) -> droidplan_core::Result<i32> {
    let timer = Timer::start("validate");
    let manifest = ctx.load_manifest()?;
    let plan = ctx.compose(&manifest, strict)?;
    let elapsed = timer.stop();

    for warning in &plan.warnings {
        Status::warning(warning);
    }
    if !ctx.quiet {
        Status::success(&format!(
            "{} is valid ({}, {}, {}) in {}",
            plan.application_id,
            format_count(plan.dependencies.len(), "dependency", "dependencies"),
            format_count(plan.signing.len(), "variant", "variants"),
            format_count(plan.warnings.len(), "warning", "warnings"),
            format_duration(elapsed)
        ));
    }
    Ok(exit_codes::SUCCESS)
}

fn run_plan(ctx: &Context, format: Option<OutputFormat>, strict: bool) -> droidplan_core::Result<i32> {
    timed_span!("plan", strict);
    let manifest = ctx.load_manifest()?;
    let plan = ctx.compose(&manifest, strict)?;

    match ctx.plan_format(format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Toml => print!("{}", toml::to_string_pretty(&plan)?),
        OutputFormat::Text => print_plan(&plan),
    }
    Ok(exit_codes::SUCCESS)
}

fn print_plan(plan: &BuildPlan) {
    Status::header(&format!("Build plan: {}", plan.application_id));
    Status::detail("namespace", &plan.namespace);
    Status::detail(
        "sdk",
        &format!(
            "min {} / target {} / compile {}",
            plan.sdk.minimum, plan.sdk.target, plan.sdk.compile_against
        ),
    );
    if let Some(ndk) = &plan.ndk_version {
        Status::detail("ndk", ndk);
    }
    if let Some(code) = &plan.version_code {
        Status::detail("versionCode", &describe(code));
    }
    if let Some(name) = &plan.version_name {
        Status::detail("versionName", &describe(name));
    }
    if let Some(target) = &plan.jvm.jvm_target {
        Status::detail("jvmTarget", target);
    }
    if let Some(source) = &plan.framework_source {
        Status::detail("framework source", source);
    }

    Status::header("Plugins");
    for plugin in plan.plugins.iter() {
        println!("  {}", plugin);
    }

    Status::header("Dependencies");
    for dep in plan.dependencies.all() {
        let configuration = format!("{:<12}", dep.configuration);
        println!(
            "  {} {}",
            configuration.if_supports_color(Stream::Stdout, |t| t.dimmed()),
            dep
        );
    }

    Status::header("Signing");
    for identity in &plan.signing {
        println!(
            "  {} → {}",
            identity.variant_name,
            identity
                .identity_name
                .if_supports_color(Stream::Stdout, |t| t.bold())
        );
    }

    if !plan.settings.is_empty() {
        Status::header("Other settings");
        for (key, value) in &plan.settings {
            Status::detail(key, &value.to_string());
        }
    }

    if plan.has_warnings() {
        println!();
        for warning in &plan.warnings {
            Status::warning(warning);
        }
    }
}

fn describe(value: &PlanValue) -> String {
    match value {
        PlanValue::Literal(v) => v.to_string(),
        PlanValue::Deferred(reference) => format!("{} (from framework)", reference),
    }
}

fn run_signing(ctx: &Context, variant: &str) -> droidplan_core::Result<i32> {
    let manifest = ctx.load_manifest()?;
    let identity = manifest.signing.resolve(variant).map_err(Error::from)?;

    let note = if manifest.signing.is_fallback(variant) {
        " (debug fallback)"
    } else {
        ""
    };
    println!("{} → {}{}", identity.variant_name, identity.identity_name, note);
    Ok(exit_codes::SUCCESS)
}

fn run_deps(ctx: &Context, configuration: Option<&str>) -> droidplan_core::Result<i32> {
    let manifest = ctx.load_manifest()?;
    let deps = &manifest.dependencies;

    let selected: Vec<_> = match configuration {
        Some(name) => deps.by_configuration(name).collect(),
        None => deps.all().collect(),
    };
    for dep in &selected {
        println!("{} {}", dep.configuration, dep);
    }
    if !ctx.quiet && selected.is_empty() {
        Status::info("No dependencies declared");
    }
    Ok(exit_codes::SUCCESS)
}

fn run_check_sdk(ctx: &Context, constraint: VersionConstraint) -> droidplan_core::Result<i32> {
    let validator = ConstraintValidator::new();
    validator.validate(&constraint).map_err(Error::from)?;

    for warning in validator.advisories(&constraint).warnings() {
        Status::warning(&warning.to_string());
    }
    if !ctx.quiet {
        Status::success(&format!(
            "minSdk {} <= targetSdk {} <= compileSdk {}",
            constraint.minimum, constraint.target, constraint.compile_against
        ));
    }
    Ok(exit_codes::SUCCESS)
}

fn run_import(ctx: &Context, script: &Path, output: Option<&Path>) -> droidplan_core::Result<i32> {
    timed_span!("import");
    let manifest = kts::parse_file(script)
        .map_err(Error::from)
        .context(format!("Importing {}", script.display()))?;
    let content = manifest.to_toml_string().map_err(Error::from)?;

    match output {
        Some(path) => {
            std::fs::write(path, &content)?;
            if !ctx.quiet {
                Status::success(&format!("Wrote {}", path.display()));
            }
        }
        None => print!("{}", content),
    }
    Ok(exit_codes::SUCCESS)
}
