use bookfeed::{generate, output, scan, validate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "bookfeed")]
#[command(about = "Content feed builder for serialized reading apps")]
#[command(long_about = "\
Content feed builder for serialized reading apps

Your filesystem is the catalog. Books are directories of markdown
chapters, pagebooks are YAML pointers to external sites, and articles
are flat markdown files. One build produces a discovery feed plus
reader-ready HTML with CDN-addressable image URLs.

Content structure:

  content/
  ├── _config/
  │   ├── settings.yaml            # version, locales, basePath
  │   ├── categories.yaml          # category table
  │   └── featured.yaml            # featured item IDs
  ├── books/
  │   └── three-body/
  │       ├── _index.yaml          # book metadata
  │       ├── cover.jpg            # optional (jpg/jpeg/png/webp)
  │       ├── images/              # optional per-book images
  │       └── chapters/
  │           ├── 01.md            # lexicographic order = chapter order
  │           └── 01.yaml          # optional title sidecar
  ├── pagebooks/
  │   └── hsk-trainer.yaml         # one YAML per external resource
  └── articles/
      ├── images/                  # shared article image pool
      └── why-read.md              # front matter + body

Chapter title resolution (first available wins):
  sidecar .yaml → front matter title → \"Chapter {id}\"

Output: public/discover/feed.json, per-book manifests and chapter HTML
under public/books/, article HTML under public/articles/, and all
images centralized under public/images/.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    content: PathBuf,

    /// Output directory
    #[arg(long, default_value = "public", global = true)]
    output: PathBuf,

    /// Static asset directory (its images/ subtree is copied verbatim)
    #[arg(long, default_value = "static", global = true)]
    assets: PathBuf,

    /// CMS admin UI directory, copied verbatim
    #[arg(long, default_value = "admin", global = true)]
    admin: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: scan content, emit feed + site
    Build,
    /// Validate the content directory without writing anything
    Check,
    /// Validate emitted artifacts in the output directory
    Validate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            println!("==> Building {}", cli.content.display());
            let inputs = generate::BuildInputs {
                content_dir: &cli.content,
                assets_dir: &cli.assets,
                admin_dir: &cli.admin,
            };
            let report = generate::build(&inputs, &cli.output)?;
            output::print_build_output(&report);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.content.display());
            let manifest = scan::scan(&cli.content)?;
            output::print_check_output(&manifest);
            println!("==> Content is valid");
        }
        Command::Validate => {
            println!("==> Validating {}", cli.output.display());
            let report = validate::validate(&cli.output);
            output::print_validation_output(&report);
            if !report.valid() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
