//! `grd run`: derive the window and drive the three-round pipeline, rendering
//! per-round progress counters on stdout.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use grd_core::config::GrdConfig;
use grd_core::fetch;
use grd_core::pipeline::{self, PipelineEvent, PipelineSummary, Stage};
use grd_core::window::TimeWindow;

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Logs => "Processing log files",
        Stage::Metadata => "Checking replays",
        Stage::Replays => "Downloading replays",
    }
}

fn render_event(event: PipelineEvent) {
    match event {
        PipelineEvent::StageStarted { stage, total } => match stage {
            Stage::Logs => println!("Found {} log files to process.", total),
            Stage::Metadata => println!(
                "Found {} replay files. Checking game versions...",
                total
            ),
            Stage::Replays => println!(
                "Found {} replays with matching criteria. Downloading...",
                total
            ),
        },
        PipelineEvent::Progress { stage, progress } => {
            if progress.failed > 0 {
                print!(
                    "\r{}: {} / {} ({} failed)",
                    stage_label(stage),
                    progress.done,
                    progress.total,
                    progress.failed
                );
            } else {
                print!(
                    "\r{}: {} / {}",
                    stage_label(stage),
                    progress.done,
                    progress.total
                );
            }
            let _ = std::io::stdout().flush();
            if progress.done == progress.total {
                println!();
            }
        }
        PipelineEvent::DuplicateNames { count } => {
            println!("Found {} duplicate filenames that will be renamed.", count);
        }
    }
}

fn print_summary(summary: &PipelineSummary, output_dir: &Path) {
    if summary.log_resources == 0 {
        println!("No log files found for the specified period. Exiting.");
        return;
    }
    if summary.uploads_in_window == 0 {
        println!("No uploads found in the logs. Exiting.");
        return;
    }
    if summary.pairs == 0 {
        println!("No replay/metadata pairs found in the uploads. Exiting.");
        return;
    }
    if summary.candidates == 0 {
        println!("No valid replays to download. Exiting.");
        return;
    }
    if summary.download_failed > 0 {
        println!("Failed to download {} replays.", summary.download_failed);
    }
    println!(
        "Downloaded {} replays to {}.",
        summary.downloaded,
        output_dir.display()
    );
    println!("Download process complete.");
}

/// Runs the download pipeline for the last `hours` hours. `hours` has been
/// validated positive by clap before this is reached.
pub async fn run_download(cfg: &GrdConfig, hours: u64, output_dir: &Path) -> Result<()> {
    let window = TimeWindow::last_hours(hours);
    println!("Starting GenTool replay downloader...");
    println!(
        "Time Window: {} to {} (GMT)",
        window.start.format("%Y-%m-%d %H:%M:%S"),
        window.end.format("%Y-%m-%d %H:%M:%S")
    );

    if !output_dir.exists() {
        std::fs::create_dir_all(output_dir).with_context(|| {
            format!("failed to create output directory {}", output_dir.display())
        })?;
        println!("Created replay directory at: {}", output_dir.display());
    }

    let client = fetch::build_client(cfg)?;
    let mut report = render_event;
    let summary =
        pipeline::run_pipeline(cfg, &client, &window, output_dir, &mut report).await?;

    tracing::info!(?summary, "pipeline finished");
    print_summary(&summary, output_dir);
    Ok(())
}
