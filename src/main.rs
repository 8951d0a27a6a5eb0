//! PocketPress - builds a static site from programmable node trees.

use anyhow::{Result, bail};
use clap::Parser;
use pocketpress::{
    build::build_site,
    cli::Cli,
    compiler::CommandCompiler,
    config::{SiteConfig, cfg, init_config},
    log, watch,
};

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    let config = SiteConfig::load(cli)?;
    config.validate()?;
    init_config(config);
    let config = cfg();

    if config.watch.enable {
        // Initial build; failures are reported and watching continues
        match watch::rebuild() {
            Ok(report) if !report.is_success() => {
                log!("watch"; "{} articles failed", report.failures.len());
            }
            Ok(_) => {}
            Err(e) => log!("error"; "{e:#}"),
        }
        return watch::watch_for_changes_blocking();
    }

    let compiler = CommandCompiler::new(config.build.compiler.clone());
    let report = build_site(&config, &compiler)?;
    if !report.is_success() {
        bail!("{} articles failed to build", report.failures.len());
    }
    Ok(())
}
