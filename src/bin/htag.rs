//! htag - Tag byte ranges of binary files
//!
//! Command line front end for the htag annotation engine.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use htag::tag::{self, codec};
use htag::{
    ByteSource, Endian, FieldKey, Orientation, Session, SessionConfig, TagStore, TagType, locator,
};

/// Tag byte ranges of binary files
#[derive(Parser, Debug)]
#[command(name = "htag")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Byte order for decoding: "little" or "big"
    #[arg(short, long, global = true, default_value = "little")]
    endian: Endian,

    /// Memory-map the input file instead of reading it
    #[arg(long, global = true)]
    mmap: bool,

    /// Log debug output to stderr (HTAG_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the tags of a tag file as a table
    List {
        /// Tag file (YAML)
        tags: PathBuf,

        /// One column per tag instead of one row per tag
        #[arg(short, long)]
        transpose: bool,
    },

    /// Show the tags containing an offset
    At {
        /// Tag file (YAML)
        tags: PathBuf,

        /// Offset (hex with 0x prefix, or decimal)
        #[arg(value_parser = parse_offset)]
        offset: usize,
    },

    /// Add a tag and save the tag file
    Add {
        /// Input file the tag refers to
        input: PathBuf,

        /// Tag file (YAML), created if missing
        tags: PathBuf,

        #[arg(short, long, default_value = "")]
        name: String,

        /// First byte (hex with 0x prefix, or decimal)
        #[arg(short, long)]
        start: String,

        /// Last byte, inclusive (default: start)
        #[arg(long)]
        end: Option<String>,

        /// Value type, e.g. Uint32
        #[arg(short = 't', long = "type", default_value = "Unknown")]
        kind: String,

        /// Role, e.g. Offset
        #[arg(short, long, default_value = "Unknown")]
        role: String,

        #[arg(short, long, default_value = "")]
        comment: String,
    },

    /// Remove tags by position and save the tag file
    Remove {
        /// Tag file (YAML)
        tags: PathBuf,

        /// Position of the first tag to remove
        index: usize,

        /// Number of tags to remove
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// Decode bytes at an offset
    Decode {
        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Offset (hex with 0x prefix, or decimal)
        #[arg(value_parser = parse_offset)]
        offset: usize,

        /// Value type, e.g. Int16
        #[arg(short = 't', long = "type")]
        kind: TagType,

        /// Byte count for String/Array/Unknown
        #[arg(short, long)]
        len: Option<usize>,
    },

    /// Decode the value of every tag
    Show {
        /// Input file
        input: PathBuf,

        /// Tag file (YAML)
        tags: PathBuf,
    },

    /// Read bytes as an absolute offset
    Follow {
        /// Input file
        input: PathBuf,

        /// Where the offset is stored (hex with 0x prefix, or decimal)
        #[arg(value_parser = parse_offset)]
        at: usize,

        /// Width of the stored offset in bytes
        #[arg(short, long, default_value = "4")]
        len: usize,
    },

    /// Find values that point at an offset
    Refs {
        /// Input file
        input: PathBuf,

        /// Target offset (hex with 0x prefix, or decimal)
        #[arg(value_parser = parse_offset)]
        target: usize,

        /// Width of the stored offset in bytes
        #[arg(short, long, default_value = "4")]
        width: usize,

        /// Report every reference, not just the first
        #[arg(short, long)]
        all: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = SessionConfig {
        endian: args.endian,
        mmap: args.mmap,
        ..SessionConfig::default()
    };

    match args.command {
        Command::List { tags, transpose } => cmd_list(&tags, transpose),
        Command::At { tags, offset } => cmd_at(&tags, offset),
        Command::Add {
            input,
            tags,
            name,
            start,
            end,
            kind,
            role,
            comment,
        } => cmd_add(config, &input, &tags, [
            (FieldKey::Name, name),
            (FieldKey::End, end.unwrap_or_else(|| start.clone())),
            (FieldKey::Start, start),
            (FieldKey::Type, kind),
            (FieldKey::Role, role),
            (FieldKey::Comment, comment),
        ]),
        Command::Remove { tags, index, count } => cmd_remove(&tags, index, count),
        Command::Decode { input, offset, kind, len } => cmd_decode(config, input.as_deref(), offset, kind, len),
        Command::Show { input, tags } => cmd_show(config, &input, &tags),
        Command::Follow { input, at, len } => cmd_follow(config, &input, at, len),
        Command::Refs { input, target, width, all } => cmd_refs(config, &input, target, width, all),
    }
}

/// Log to stderr; HTAG_LOG takes precedence over --verbose
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("HTAG_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Parse offset (hex with 0x prefix or decimal)
fn parse_offset(s: &str) -> Result<usize> {
    tag::parse_offset(s).with_context(|| format!("Invalid offset: {}", s))
}

/// Open a session on a file, or on stdin when piped
fn open_session(config: SessionConfig, input: Option<&Path>) -> Result<Session> {
    let mut session = Session::new(config);
    match input {
        Some(path) => session
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?,
        None => {
            if io::stdin().is_terminal() {
                bail!("No input file given and stdin is a terminal");
            }
            let mut data = Vec::new();
            io::stdin().read_to_end(&mut data)?;
            session.load_bytes(data);
        }
    }
    Ok(session)
}

fn load_store(path: &Path, orientation: Orientation) -> Result<TagStore> {
    let mut store = TagStore::new(orientation);
    codec::read_file(&mut store, path)
        .with_context(|| format!("Failed to load tags from {}", path.display()))?;
    Ok(store)
}

fn print_table(store: &TagStore) -> Result<()> {
    let header_row: Vec<String> = match store.orientation() {
        Orientation::TagPerRow => store.labels().iter().map(|(label, _)| label.clone()).collect(),
        Orientation::TagPerColumn => std::iter::once(String::new())
            .chain((0..store.len()).map(|position| format!("#{}", position)))
            .collect(),
    };
    println!("{}", header_row.join("\t"));

    for row in 0..store.row_count() {
        let mut cells = Vec::with_capacity(store.column_count() + 1);
        match store.orientation() {
            Orientation::TagPerRow => {}
            Orientation::TagPerColumn => cells.push(store.header(row).unwrap_or_default().to_string()),
        }
        for column in 0..store.column_count() {
            cells.push(store.cell(row, column)?.to_string());
        }
        println!("{}", cells.join("\t"));
    }
    Ok(())
}

// === Commands ===

fn cmd_list(tags: &Path, transpose: bool) -> Result<()> {
    let orientation = if transpose {
        Orientation::TagPerColumn
    } else {
        Orientation::TagPerRow
    };
    let store = load_store(tags, orientation)?;
    print_table(&store)
}

fn cmd_at(tags: &Path, offset: usize) -> Result<()> {
    let store = load_store(tags, Orientation::TagPerRow)?;
    for position in store.containing(offset) {
        let tag = store.tag_at(position)?;
        println!(
            "{}\t0x{:08X}-0x{:08X}\t{}\t{}\t{}",
            position,
            tag.start(),
            tag.end(),
            tag.name(),
            tag.tag_type(),
            tag.role()
        );
    }
    Ok(())
}

fn cmd_add<const N: usize>(
    config: SessionConfig,
    input: &Path,
    tags: &Path,
    fields: [(FieldKey, String); N],
) -> Result<()> {
    let mut session = open_session(config, Some(input))?;
    if tags.exists() {
        session.load_tags(tags)?;
    }

    let tag = htag::Tag::from_fields(fields)?;
    if tag.start() > tag.end() {
        bail!("Start 0x{:X} is after end 0x{:X}", tag.start(), tag.end());
    }
    let len = session.document()?.len();
    if tag.end() >= len {
        bail!("Tag end 0x{:X} exceeds file size {}", tag.end(), len);
    }

    session.select(tag.start(), tag.end())?;
    let position = session.create_tag(tag.name(), tag.tag_type(), tag.role(), tag.comment())?;
    session.save_tags(Some(tags))?;
    println!("{}", position);
    Ok(())
}

fn cmd_remove(tags: &Path, index: usize, count: usize) -> Result<()> {
    let mut store = load_store(tags, Orientation::TagPerRow)?;
    let removed = store.remove(index..index.saturating_add(count))?;
    codec::write_file(&store, tags)?;
    for tag in removed {
        println!("{}", tag.name());
    }
    Ok(())
}

fn cmd_decode(
    config: SessionConfig,
    input: Option<&Path>,
    offset: usize,
    kind: TagType,
    len: Option<usize>,
) -> Result<()> {
    let session = open_session(config, input)?;
    let count = match (kind.width(), len) {
        (Some(width), _) => width,
        (None, Some(len)) => len,
        (None, None) => bail!("{} needs --len", kind),
    };
    let bytes = locator::read(session.document()?, offset, count)?;
    println!("{}", htag::value::decode(bytes, kind, config.endian)?);
    Ok(())
}

fn cmd_show(config: SessionConfig, input: &Path, tags: &Path) -> Result<()> {
    let mut session = open_session(config, Some(input))?;
    session.load_tags(tags)?;
    for (position, value) in session.tag_values().into_iter().enumerate() {
        let tag = session.tags().tag_at(position)?;
        let value = match value {
            Ok(value) => value.to_string(),
            Err(err) => format!("<{}>", err),
        };
        println!("0x{:08X}\t{}\t{}\t{}", tag.start(), tag.name(), tag.tag_type(), value);
    }
    Ok(())
}

fn cmd_follow(config: SessionConfig, input: &Path, at: usize, len: usize) -> Result<()> {
    if len == 0 {
        bail!("Offset width must be at least 1 byte");
    }
    let mut session = open_session(config, Some(input))?;
    session.select(at, at.saturating_add(len - 1))?;
    let offset = session.show_absolute_offset()?;
    println!("0x{:08X} ({})", offset, offset);
    for position in session.current_tags() {
        println!("  in {}", session.tags().tag_at(*position)?.name());
    }
    Ok(())
}

fn cmd_refs(config: SessionConfig, input: &Path, target: usize, width: usize, all: bool) -> Result<()> {
    let mut session = open_session(
        SessionConfig {
            offset_width: width,
            ..config
        },
        Some(input),
    )?;
    if target >= session.document()?.len() {
        bail!("Target 0x{:X} is outside the file", target);
    }
    session.move_cursor(target)?;

    let mut found = session.find_offset()?;
    while let Some(pos) = found {
        println!("0x{:08X}", pos);
        if !all {
            break;
        }
        found = session.find_again()?;
    }
    Ok(())
}
