//! bigarray CLI
//!
//! Command-line demo driving a big array on disk: slot reads and writes,
//! IP bitmap loading, external sort, repository save/restore.

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use bigarray::{iputil, sort_int, BigArray, Config, FsRepository, Result, UNBOUNDED};

/// bigarray CLI
#[derive(Parser, Debug)]
#[command(name = "bigarray-cli")]
#[command(about = "Memory-mapped big array demo")]
#[command(version)]
struct Args {
    /// Directory holding the array's page files
    #[arg(short, long, default_value = "./bigarray_data")]
    directory: String,

    /// Page file prefix
    #[arg(long, default_value = "")]
    prefix: String,

    /// Page size in bytes (rounded up to a power of two)
    #[arg(long, default_value = "67108864")]
    page_size: usize,

    /// Window size in bytes (rounded up to a power of two)
    #[arg(long, default_value = "1048576")]
    sub_page_size: usize,

    /// Max pages of the array
    #[arg(long, default_value = "10")]
    max_page_count: usize,

    /// Max resident windows per page
    #[arg(long, default_value = "10")]
    max_sub_page_in_mem: i64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write an int slot
    PutInt {
        /// Slot index
        index: u64,

        /// Value to store
        value: i32,
    },

    /// Read an int slot
    GetInt {
        /// Slot index
        index: u64,
    },

    /// Append an int at the cursor
    AppendInt {
        /// Value to store
        value: i32,
    },

    /// Mark every address in a file (one IP per line) in the bitmap
    LoadIps {
        /// Path to the address list
        file: String,
    },

    /// Check whether an address is marked in the bitmap
    HasIp {
        /// Dotted-quad address
        ip: String,
    },

    /// Sort the first N ints into a second array
    Sort {
        /// Number of live ints to sort
        count: u64,

        /// Prefix for the sorted array's page files
        #[arg(long, default_value = "sorted")]
        dest_prefix: String,
    },

    /// Save every page into a blob repository directory
    Save {
        /// Blob directory
        repo_dir: String,

        /// Blob namespace
        #[arg(long, default_value = "bigarray")]
        namespace: String,
    },

    /// Restore every page from a blob repository directory
    Load {
        /// Blob directory
        repo_dir: String,

        /// Blob namespace
        #[arg(long, default_value = "bigarray")]
        namespace: String,
    },

    /// Print array geometry and page counts
    Info,

    /// Delete every page file of the array
    Delete,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bigarray=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("command failed: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder(&args.directory)
        .prefix(args.prefix.as_str())
        .page_size_in_bytes(args.page_size)
        .sub_page_size_in_bytes(args.sub_page_size)
        .max_page_count(args.max_page_count)
        .max_page_in_mem(UNBOUNDED)
        .max_sub_page_in_mem(args.max_sub_page_in_mem)
        .build();
    let array = BigArray::open(config)?;

    match args.command {
        Commands::PutInt { index, value } => {
            array.put_int(index, value)?;
            println!("[{}] = {}", index, value);
        }
        Commands::GetInt { index } => {
            println!("{}", array.get_int(index)?);
        }
        Commands::AppendInt { value } => {
            let index = array.append_int(value)?;
            println!("[{}] = {}", index, value);
        }
        Commands::LoadIps { file } => {
            let mut loaded = 0u64;
            iputil::read_ip_file(&file, |line| {
                iputil::set_ip(&array, iputil::parse(line)?)?;
                loaded += 1;
                Ok(())
            })?;
            tracing::info!("loaded {} addresses from {}", loaded, file);
        }
        Commands::HasIp { ip } => {
            let present = iputil::has_ip(&array, iputil::parse(&ip)?)?;
            println!("{}", if present { "present" } else { "absent" });
        }
        Commands::Sort { count, dest_prefix } => {
            let sorted = sort_int(&array, count, &args.directory, &dest_prefix)?;
            tracing::info!(
                "sorted {} ints into {} pages with prefix {}",
                count,
                sorted.page_count(),
                dest_prefix
            );
            sorted.close()?;
        }
        Commands::Save { repo_dir, namespace } => {
            let repo = FsRepository::open(&repo_dir, &namespace)?;
            bigarray::save_to_repo(&array, &repo)?;
            tracing::info!("saved {} pages to {}", array.page_count(), repo_dir);
        }
        Commands::Load { repo_dir, namespace } => {
            let repo = FsRepository::open(&repo_dir, &namespace)?;
            bigarray::load_from_repo(&array, &repo)?;
            tracing::info!("loaded {} pages from {}", array.page_count(), repo_dir);
        }
        Commands::Info => {
            println!("directory:        {}", args.directory);
            println!("page size:        {} bytes", array.page_size_in_bytes());
            println!("sub-page size:    {} bytes", array.sub_page_size_in_bytes());
            println!("max page count:   {}", array.max_page_count());
            println!("pages created:    {}", array.page_count());
            println!("pages resident:   {}", array.resident_page_count());
        }
        Commands::Delete => {
            array.delete_all_pages()?;
            tracing::info!("deleted all pages under {}", args.directory);
            return Ok(());
        }
    }

    array.close()
}
