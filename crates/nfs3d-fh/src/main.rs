#![warn(missing_docs)]
//! Filehandle diagnostic tool.
//!
//! Usage: fhtool <encode|decode|inspect> [options] ARG

use nfs3d_fh::{FhConfig, FhCore, FileHandle};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn print_usage(prog: &str) {
    eprintln!("Usage: {} <command> [options] ARG", prog);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  encode [--root DIR] [--dir] PATH   Compose a handle, print it as hex");
    eprintln!("  decode [--root DIR] [--attrs] HEX  Resolve a hex handle to a path");
    eprintln!("  inspect [--json] HEX               Show the fields of a hex handle");
    eprintln!();
    eprintln!("PATH is rooted at the export root (--root, default /).");
}

#[derive(Serialize)]
struct HandleReport<'a> {
    dev: u32,
    ino: u32,
    gen: u32,
    len: usize,
    trail: &'a [u8],
    wire_len: usize,
    valid: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let prog = args.first().map(|s| s.as_str()).unwrap_or("fhtool");

    if args.len() < 3 || args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage(prog);
        if args.iter().any(|a| a == "-h" || a == "--help") {
            return Ok(());
        }
        std::process::exit(1);
    }

    let command = args[1].as_str();
    let root = flag_value(&args, "--root").unwrap_or("/");
    let arg = args
        .last()
        .filter(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow::anyhow!("missing argument, see --help"))?;

    match command {
        "encode" => {
            let mut core = FhCore::new(FhConfig::with_root(root));
            let require_dir = args.iter().any(|a| a == "--dir");
            match core.encode(arg, require_dir) {
                Ok(fh) => println!("{}", hex_encode(&fh.to_bytes())),
                Err(e) => bail_nfs(e),
            }
        }
        "decode" => {
            let mut core = FhCore::new(FhConfig::with_root(root));
            let bytes = hex_decode(arg)?;
            match core.decode(&bytes) {
                Ok(path) => {
                    println!("{}", path);
                    if args.iter().any(|a| a == "--attrs") {
                        if let Some(stat) = core.peek_attr() {
                            println!("{}", serde_json::to_string_pretty(&stat)?);
                        }
                    }
                }
                Err(e) => bail_nfs(e),
            }
        }
        "inspect" => {
            let bytes = hex_decode(arg)?;
            let fh = match FileHandle::from_bytes(&bytes) {
                Ok(fh) => fh,
                Err(e) => bail_nfs(e),
            };
            let report = HandleReport {
                dev: fh.dev,
                ino: fh.ino,
                gen: fh.gen,
                len: fh.depth(),
                trail: fh.trail(),
                wire_len: fh.wire_len(),
                valid: fh.is_valid(),
            };
            if args.iter().any(|a| a == "--json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("dev      {}", report.dev);
                println!("ino      {}", report.ino);
                println!("gen      {}", report.gen);
                println!("len      {}", report.len);
                println!("trail    {}", hex_encode(report.trail));
                println!("wire_len {}", report.wire_len);
                println!("valid    {}", report.valid);
            }
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(prog);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn bail_nfs(err: nfs3d_fh::FhError) -> ! {
    eprintln!("error: {} (NFS status {})", err, err.to_nfs_status());
    std::process::exit(1)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(s: &str) -> anyhow::Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        anyhow::bail!("odd-length hex string");
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|_| anyhow::anyhow!("invalid hex at offset {}", i))
        })
        .collect()
}
