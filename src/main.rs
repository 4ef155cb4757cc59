mod docx;
mod filter;
mod identity;
mod notes;
mod pipeline;
mod report;
mod settings;
mod sheet;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use settings::Settings;

#[derive(Parser)]
#[command(name = "casenotes", about = "Extract case notes from client documents into CSV and XLSX")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy the case-file documents out of a ZIP archive
    Filter {
        /// ZIP archive of .docx files
        archive: PathBuf,
        /// Output folder (recreated if it exists)
        #[arg(default_value = "filtered_case_notes_folder")]
        out: PathBuf,
    },
    /// Write a notes CSV next to every .docx under DIR
    Extract {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Render every notes CSV under DIR into an .xlsx workbook
    Render {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Extract + render in one go
    Run {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Print the notes found in one document
    Show {
        file: PathBuf,
        /// Max characters of each note to display
        #[arg(short = 'w', long, default_value = "80")]
        width: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("Invalid CASENOTES_* configuration")?;
    if let Some(n) = settings.threads {
        rayon::ThreadPoolBuilder::new().num_threads(n).build_global()?;
    }

    let result = match cli.command {
        Commands::Filter { archive, out } => {
            println!("Filtering {} ...", archive.display());
            let stats = filter::filter_archive(&archive, &out, &settings.case_file_markers)?;
            if stats.found == 0 {
                println!("No .docx files found inside the archive.");
                return Ok(());
            }
            println!(
                "Found {} documents, saved {} case files to {}",
                stats.found,
                stats.matched,
                out.display()
            );
            Ok(())
        }
        Commands::Extract { dir } => {
            let counts = pipeline::extract_dir(&dir, &settings)?;
            if counts.documents == 0 {
                println!("No .docx files found under {}.", dir.display());
                return Ok(());
            }
            counts.print();
            Ok(())
        }
        Commands::Render { dir } => {
            let counts = pipeline::render_dir(&dir, &settings)?;
            if counts.reports == 0 {
                println!("No .csv files found under {}. Run 'extract' first.", dir.display());
                return Ok(());
            }
            counts.print();
            Ok(())
        }
        Commands::Run { dir } => {
            let t_extract = Instant::now();
            let extracted = pipeline::extract_dir(&dir, &settings)?;
            if extracted.documents == 0 {
                println!("No .docx files found under {}.", dir.display());
                return Ok(());
            }
            extracted.print();
            println!("Extracted in {:.1}s", t_extract.elapsed().as_secs_f64());

            let t_render = Instant::now();
            let rendered = pipeline::render_dir(&dir, &settings)?;
            rendered.print();
            println!("Rendered in {:.1}s", t_render.elapsed().as_secs_f64());
            Ok(())
        }
        Commands::Show { file, width } => {
            let notes = pipeline::document_notes(&file)?;
            let client = identity::ClientIdentity::from_path(&file);
            println!("{} (HMIS # {})", client.name, client.id);
            if notes.is_empty() {
                println!("No case notes found.");
                return Ok(());
            }

            println!("{:>3} | {:<10} | {:<16} | Note", "#", "Date", "Staff");
            println!("{}", "-".repeat(width + 40));
            for (i, n) in notes.iter().enumerate() {
                println!(
                    "{:>3} | {:<10} | {:<16} | {}",
                    i + 1,
                    n.date,
                    truncate(&n.staff, 16),
                    truncate(&n.body, width)
                );
            }
            println!("\n{} notes", notes.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
