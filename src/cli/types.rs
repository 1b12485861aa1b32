//! CLI type definitions: clap command structures for the image job engine.

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "imagejob")]
#[command(about = "Durable, bounded-concurrency batch image-generation job engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a batch of prompts as a new job
    Submit {
        /// Prompts to render, one task per prompt per `--count`
        prompts: Vec<String>,

        /// Generation style
        #[arg(short, long, default_value = "product_photography")]
        style: String,

        /// Number of images to generate per prompt
        #[arg(short, long, default_value = "1")]
        count: u32,
    },

    /// Show a job's progress summary
    Status {
        job_id: Uuid,

        /// Include the per-task breakdown
        #[arg(short, long)]
        detail: bool,
    },

    /// Cancel a pending or running job
    Cancel { job_id: Uuid },

    /// Run the HTTP server (admin API + worker callback endpoint)
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },

    /// Run the in-process bounded worker pool standalone, without the HTTP server
    Worker,

    /// Re-dispatch pending tasks whose job is still open but have sat idle
    /// past the lease window (crash recovery; spec's stale-pending sweep)
    Reconcile {
        /// Tasks pending longer than this are considered stale
        #[arg(long, default_value = "600")]
        older_than_seconds: i64,
    },
}
