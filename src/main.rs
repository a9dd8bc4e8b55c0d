use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kira_zonemap::cli::{Cli, Commands, CommonArgs};
use kira_zonemap::config::AnalysisConfig;
use kira_zonemap::ctx::{Command, Ctx};
use kira_zonemap::input::ArtifactStatus;
use kira_zonemap::io;
use kira_zonemap::pipeline::Pipeline;
use kira_zonemap::pipeline::stage0_scaffold::Stage0Scaffold;
use kira_zonemap::pipeline::stage1_cohort::Stage1Cohort;
use kira_zonemap::pipeline::stage2_sources::Stage2Sources;
use kira_zonemap::pipeline::stage3_zone_masks::Stage3ZoneMasks;
use kira_zonemap::pipeline::stage4_concordance::Stage4Concordance;
use kira_zonemap::pipeline::stage5_output::Stage5Output;
use kira_zonemap::zones::Granularity;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Zones(args) => {
            let mut ctx = build_ctx(Command::Zones, &args.common, PathBuf::from("."), false)?;
            let pipeline = Pipeline::new(vec![
                Box::new(Stage0Scaffold::new()),
                Box::new(Stage1Cohort::new()),
                Box::new(Stage2Sources::new()),
                Box::new(Stage3ZoneMasks::new()),
            ]);
            pipeline.run(&mut ctx)?;
            print!("{}", io::summary::format_zone_summary(&ctx));
            print_warnings(&ctx);
        }
        Commands::Analyze(args) => {
            let mut ctx = build_ctx(Command::Analyze, &args.common, args.out, args.json)?;
            let pipeline = Pipeline::new(vec![
                Box::new(Stage0Scaffold::new()),
                Box::new(Stage1Cohort::new()),
                Box::new(Stage2Sources::new()),
                Box::new(Stage4Concordance::new()),
                Box::new(Stage5Output::new()),
            ]);
            pipeline.run(&mut ctx)?;
            print!("{}", io::summary::format_summary(&ctx));
            print_warnings(&ctx);
        }
        Commands::Validate(args) => {
            let mut ctx = build_ctx(Command::Validate, &args.common, PathBuf::from("."), false)?;
            let pipeline = Pipeline::new(vec![
                Box::new(Stage0Scaffold::new()),
                Box::new(Stage1Cohort::new()),
                Box::new(Stage2Sources::new()),
            ]);
            pipeline.run(&mut ctx)?;
            print_validate_summary(&ctx);
        }
    }

    Ok(())
}

fn build_ctx(command: Command, common: &CommonArgs, out: PathBuf, json: bool) -> Result<Ctx> {
    let mut config = match &common.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    config.apply(common.overrides());

    let levels = if common.levels.is_empty() {
        Granularity::ALL.to_vec()
    } else {
        let mut levels = Vec::with_capacity(common.levels.len());
        for &level in &common.levels {
            let g = Granularity::from_level(level)?;
            if !levels.contains(&g) {
                levels.push(g);
            }
        }
        levels
    };

    let mut ctx = Ctx::new(command, config, levels, out, json, env!("CARGO_PKG_VERSION"));
    ctx.threads = common.threads;
    Ok(ctx)
}

fn print_warnings(ctx: &Ctx) {
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
}

fn print_validate_summary(ctx: &Ctx) {
    let flag = |b: bool| if b { "yes" } else { "no" };
    println!("kira-zonemap validate");
    println!("patients: {}", ctx.patients.len());
    println!("patient\timage\tgland\tlesions\tmri\tbiopsy\tzone_masks");
    let mut analysable = 0;
    for pid in &ctx.patients {
        let mri_entry = ctx.mri.as_ref().is_some_and(|m| m.contains(pid));
        let status = ArtifactStatus::check(&ctx.config, pid, &ctx.levels, mri_entry);
        if status.can_analyse() {
            analysable += 1;
        }
        let masks: Vec<String> = status
            .zone_masks
            .iter()
            .map(|(g, name, present)| format!("{}/{}={}", g.level(), name, flag(*present)))
            .collect();
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            pid,
            flag(status.image),
            flag(status.gland),
            flag(status.lesions),
            flag(status.mri_entry),
            flag(status.biopsy),
            masks.join(",")
        );
    }
    println!("analysable: {}", analysable);
    print_warnings(ctx);
}
