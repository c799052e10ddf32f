use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use tfs_sdk::{
    ContentId, ContentStore, DirectoryNode, Download, ErrorKind, Locator, PageRequest, SdkError,
    Store, StoreConfig, TenantStore,
};
use tracing::debug;

use crate::cli::*;

/// Taxonomy kind of the first store error in a failure chain.
pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<SdkError>())
        .map(SdkError::kind)
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = StoreConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let store = Store::open(config).context("opening store")?;
    debug!(root = %store.config().data_root.display(), "store opened");
    let ctx = Ctx {
        store,
        tenant: cli.tenant,
        format: cli.format,
    };

    match cli.command {
        Command::Put(args) => cmd_put(&ctx, args),
        Command::Get(args) => cmd_get(&ctx, args),
        Command::Objects => cmd_objects(&ctx),
        Command::Sweep(args) => cmd_sweep(&ctx, args),
        Command::Upload(args) => cmd_upload(&ctx, args),
        Command::Download(args) => cmd_download(&ctx, args),
        Command::Ls(args) => cmd_ls(&ctx, args),
        Command::Mkdir(args) => {
            let created = ctx.tenant()?.mkdir(&args.path)?;
            ctx.done(json!({ "created": created }), || {
                println!("{} Created /{}", "✓".green().bold(), created.bold())
            })
        }
        Command::Rm(args) => {
            let removed = ctx.tenant()?.delete(&args.path)?;
            ctx.done(json!({ "removed": removed }), || {
                println!("{} Removed {} ({} entries)", "✓".green().bold(), args.path.bold(), removed)
            })
        }
        Command::Rename(args) => {
            let renamed = ctx.tenant()?.rename(&args.path, &args.new_name)?;
            ctx.done(json!({ "path": renamed }), || {
                println!("{} {} → /{}", "✓".green().bold(), args.path, renamed.bold())
            })
        }
        Command::Mv(args) => {
            ctx.tenant()?.move_to(&args.src, &args.dst)?;
            ctx.done(json!({ "from": args.src, "to": args.dst }), || {
                println!("{} Moved {} → {}", "✓".green().bold(), args.src, args.dst.bold())
            })
        }
        Command::Cp(args) => {
            let copied = ctx.tenant()?.copy(&args.src, &args.dst)?;
            ctx.done(json!({ "copied": copied }), || {
                println!(
                    "{} Copied {} → {} ({} entries)",
                    "✓".green().bold(),
                    args.src,
                    args.dst.bold(),
                    copied
                )
            })
        }
        Command::Cat(args) => {
            print!("{}", ctx.tenant()?.read_text(&args.path)?);
            Ok(())
        }
        Command::Write(args) => cmd_write(&ctx, args),
        Command::Recent(args) => cmd_recent(&ctx, args),
        Command::Share(args) => cmd_share(&ctx, args),
        Command::Redeem(args) => {
            let download = ctx.store.redeem_share_token(&args.token)?;
            save(download, args.output.as_deref())
        }
    }
}

struct Ctx {
    store: Store,
    tenant: Option<String>,
    format: OutputFormat,
}

impl Ctx {
    fn tenant(&self) -> anyhow::Result<TenantStore> {
        let id = self
            .tenant
            .as_deref()
            .context("this command needs --tenant <ID>")?;
        Ok(self.store.tenant(id)?)
    }

    /// Print `value` as JSON, or run `text` for human output.
    fn done<T: Serialize>(&self, value: T, text: impl FnOnce()) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
            OutputFormat::Text => text(),
        }
        Ok(())
    }
}

fn cmd_put(ctx: &Ctx, args: PutArgs) -> anyhow::Result<()> {
    let bytes = read_local(&args.file)?;
    let cid = ctx.store.upload_content_addressed(&bytes)?;
    ctx.done(json!({ "cid": cid, "size": bytes.len() }), || {
        println!("{} {}", "✓".green().bold(), cid.to_string().yellow());
        println!("  Size: {} bytes", bytes.len());
    })
}

fn cmd_get(ctx: &Ctx, args: GetArgs) -> anyhow::Result<()> {
    let cid: ContentId = args.cid.parse().context("invalid content id")?;
    save(ctx.store.download_content(&cid)?, args.output.as_deref())
}

fn cmd_objects(ctx: &Ctx) -> anyhow::Result<()> {
    let objects = ctx.store.content().list()?;
    ctx.done(&objects, || {
        if objects.is_empty() {
            println!("No objects.");
        }
        for obj in &objects {
            println!(
                "{}  {:>10}  {}",
                obj.id.to_string().yellow(),
                obj.size,
                obj.modified.format("%Y-%m-%d %H:%M").to_string().dimmed()
            );
        }
    })
}

fn cmd_sweep(ctx: &Ctx, args: SweepArgs) -> anyhow::Result<()> {
    let removed = ctx
        .store
        .content()
        .sweep_partials(Duration::from_secs(args.min_age))?;
    ctx.done(json!({ "removed": removed }), || {
        println!("{} Swept {} staging files.", "✓".green(), removed)
    })
}

fn cmd_upload(ctx: &Ctx, args: UploadArgs) -> anyhow::Result<()> {
    let dest = match args.dest {
        Some(dest) => dest,
        None => args
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .context("cannot derive a destination name from the local path")?,
    };
    let bytes = read_local(&args.file)?;
    let record = ctx.tenant()?.upload(&bytes, &dest)?;
    ctx.done(&record, || {
        println!("{} Uploaded /{}", "✓".green().bold(), record.path.bold());
        println!("  Size: {} bytes ({})", record.size, record.mime);
        if let Some(digest) = &record.digest {
            println!("  SHA-256: {}", digest.to_string().dimmed());
        }
    })
}

fn cmd_download(ctx: &Ctx, args: DownloadArgs) -> anyhow::Result<()> {
    let locator = Locator::parse(&args.locator)?;
    let download = match &locator {
        Locator::Content(cid) => ctx.store.download_content(cid)?,
        Locator::Path(_) => ctx.tenant()?.download(&locator)?,
    };
    save(download, args.output.as_deref())
}

fn cmd_ls(ctx: &Ctx, args: LsArgs) -> anyhow::Result<()> {
    let tenant = ctx.tenant()?;
    let tree = match args.depth {
        Some(depth) => tenant.list_depth(&args.path, depth)?,
        None => tenant.list(&args.path)?,
    };
    ctx.done(&tree, || print_tree(&tree, 0))
}

fn print_tree(node: &DirectoryNode, indent: usize) {
    let pad = "  ".repeat(indent);
    match node {
        DirectoryNode::Directory(dir) => {
            let label = if dir.path.is_empty() { "/" } else { dir.name.as_str() };
            let more = if dir.truncated { " …" } else { "" };
            println!("{pad}{}{}", format!("{label}/").blue().bold(), more.dimmed());
            for child in &dir.children {
                print_tree(child, indent + 1);
            }
        }
        DirectoryNode::File(file) => {
            let name = if file.symlink {
                format!("{} @", file.name).cyan()
            } else {
                file.name.normal()
            };
            println!("{pad}{name}  {}", file.size.to_string().dimmed());
        }
    }
}

fn cmd_write(ctx: &Ctx, args: WriteArgs) -> anyhow::Result<()> {
    let content = fs::read_to_string(&args.from)
        .with_context(|| format!("reading {}", args.from.display()))?;
    let record = ctx.tenant()?.write_text(&args.path, &content)?;
    ctx.done(&record, || {
        println!("{} Saved /{} ({} bytes)", "✓".green().bold(), record.path.bold(), record.size)
    })
}

fn cmd_recent(ctx: &Ctx, args: RecentArgs) -> anyhow::Result<()> {
    let page = ctx
        .tenant()?
        .recent_files(args.kind, PageRequest::new(args.page, args.per_page))?;
    ctx.done(&page, || {
        if page.items.is_empty() {
            println!("No files.");
            return;
        }
        for record in &page.items {
            println!(
                "{}  {:<6}  {:>10}  /{}",
                record.modified.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                record.kind.to_string().cyan(),
                record.size,
                record.path
            );
        }
        println!(
            "Page {} of {} ({} files)",
            page.page.to_string().bold(),
            page.total_pages,
            page.total_items
        );
    })
}

fn cmd_share(ctx: &Ctx, args: ShareArgs) -> anyhow::Result<()> {
    let ttl = args.ttl.map(Duration::from_secs);
    let token = match Locator::parse(&args.target)? {
        Locator::Content(cid) => ctx.store.issue_content_token(cid, ttl)?,
        Locator::Path(path) => ctx.tenant()?.issue_share_token(&path, ttl)?,
    };
    let lifetime = ttl.unwrap_or_else(|| ctx.store.config().share_ttl());
    ctx.done(json!({ "token": token, "ttl_secs": lifetime.as_secs() }), || {
        println!("{}", token.as_str());
        eprintln!("  Valid for {} seconds", lifetime.as_secs());
    })
}

fn read_local(path: &Path) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(bytes)
}

/// Write a download to `output`, or stdout when none is given.
fn save(mut download: Download, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let target: PathBuf = if path.is_dir() {
                path.join(&download.name)
            } else {
                path.to_path_buf()
            };
            let mut file = File::create(&target)
                .with_context(|| format!("creating {}", target.display()))?;
            let written = io::copy(&mut download, &mut file)?;
            file.sync_all()?;
            eprintln!("{} Saved {} ({} bytes)", "✓".green(), target.display(), written);
        }
        None => {
            let mut stdout = io::stdout().lock();
            io::copy(&mut download, &mut stdout)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
