//! `tg build`: resolve patterns, refresh `build.ninja`, run ninja

use crate::config::Config;
use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use tg_build::ninja::{is_signature_current, make_build_ninja, BUILD_NINJA};
use tg_build::{resolve_patterns, BuildPlan, SrcFs, TargetCache};
use tracing::{debug, info};

/// Options of one `tg build` invocation
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub patterns: Vec<String>,
    /// Regenerate `build.ninja` and stop
    pub ninja_training: bool,
    /// Print the resolved plan as JSON and stop
    pub print_plan: bool,
}

/// Returns the exit code of the process
pub fn run(config: &Config, options: &BuildOptions) -> Result<i32> {
    let tg_path = config.tg_path()?;
    let src_fs = SrcFs::new(Config::src_path(&tg_path))?;
    let current_path = env::current_dir()
        .ok()
        .and_then(|cwd| cwd.canonicalize().ok())
        .and_then(|cwd| src_fs.make_path(&cwd).ok());
    debug!(?current_path, "resolving patterns");

    let mut cache = TargetCache::new(src_fs);
    let requested = resolve_patterns(&mut cache, &options.patterns, current_path.as_deref())?;
    if requested.is_empty() {
        bail!("No targets to build");
    }

    if options.print_plan {
        let plan = BuildPlan::resolve(&mut cache, &requested)?;
        println!("{}", serde_json::to_string_pretty(&plan.summary())?);
        return Ok(0);
    }

    let build_ninja = tg_path.join(BUILD_NINJA);
    if options.ninja_training || !is_signature_current(&build_ninja, &requested)? {
        let plan = BuildPlan::resolve(&mut cache, &requested)?;
        let content = make_build_ninja(
            &tg_path,
            cache.src_fs(),
            &requested,
            &plan,
            &config.toolchain(),
        )?;
        fs::write(&build_ninja, content)
            .with_context(|| format!("Failed to write {}", build_ninja.display()))?;
        info!(
            targets = plan.len(),
            loaded = cache.load_count(),
            "wrote {}",
            build_ninja.display()
        );
    }

    if options.ninja_training {
        return Ok(0);
    }
    super::run_ninja(&config.ninja, &tg_path, &[])
}
