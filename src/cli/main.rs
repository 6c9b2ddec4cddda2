//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Mimedump.
//
// Mimedump is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mimedump is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Mimedump. If not, see <http://www.gnu.org/licenses/>.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, LevelFilter};
use structopt::StructOpt;

use crate::dump::{dump, open_message, AttachmentId};
use crate::format::Formatter;
use crate::store::memory::MemoryFolder;
use crate::store::model::SystemFlags;
use crate::support::config::Config;
use crate::support::error::Error;
use crate::support::sysexits::*;
use crate::visit::display::display;
use crate::visit::has_attachment::check_and_remember;
use crate::visit::locate::locate;
use crate::visit::reply::build_reply;
use crate::visit::saver::AttachmentSaver;
use crate::visit::spam::SpamUnwrapper;

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
struct Options {
    #[structopt(flatten)]
    common: CommonOptions,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt, Default)]
struct CommonOptions {
    /// TOML file with display, reply, formatter, and image settings.
    /// Built-in defaults are used for anything it leaves out.
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// log4rs configuration file. By default, messages are logged to
    /// standard error.
    #[structopt(long, parse(from_os_str))]
    log_config: Option<PathBuf>,

    /// Log debug messages, such as traversal decisions.
    #[structopt(short, long)]
    verbose: bool,
}

/// Each command takes one message as a file. "-" reads standard input.
///
/// If the first line of the message ends with a UNIX line ending, all line
/// feeds are converted to DOS line endings before parsing.
#[derive(StructOpt)]
enum Command {
    /// Print the display object of the message as JSON.
    Show {
        /// Show plain text instead of HTML where there is a choice, and
        /// convert HTML-only bodies to text.
        #[structopt(long)]
        prefer_text: bool,

        /// Session secret substituted into inline image URLs.
        #[structopt(long, default_value = "")]
        session: String,

        #[structopt(parse(from_os_str))]
        file: PathBuf,
    },

    /// Print the quoted text for a reply to the message.
    Reply {
        /// Build a forward instead of a reply.
        #[structopt(long)]
        forward: bool,

        /// Produce an HTML fragment instead of plain text.
        #[structopt(long)]
        html: bool,

        #[structopt(parse(from_os_str))]
        file: PathBuf,
    },

    /// Write the content of one part of the message.
    ///
    /// Parts are identified as shown by `show`, e.g. "1.1.2".
    Extract {
        /// Write here instead of to standard output.
        #[structopt(short, long, parse(from_os_str))]
        output: Option<PathBuf>,

        #[structopt(parse(from_os_str))]
        file: PathBuf,

        id: String,
    },

    /// Save every attachment of the message into a directory.
    ///
    /// Existing files are never overwritten; a numeric suffix is added to the
    /// name instead. The paths written are printed one per line.
    Save {
        #[structopt(parse(from_os_str))]
        file: PathBuf,

        #[structopt(parse(from_os_str))]
        dir: PathBuf,
    },

    /// Print "true" or "false" according to whether the message has
    /// attachments.
    HasAttachment {
        #[structopt(parse(from_os_str))]
        file: PathBuf,
    },

    /// Extract the original message from a spam filter report.
    ///
    /// Exits with EX_NOINPUT if the message is not flagged as spam or carries
    /// no original.
    UnwrapSpam {
        /// Write here instead of to standard output.
        #[structopt(short, long, parse(from_os_str))]
        output: Option<PathBuf>,

        #[structopt(parse(from_os_str))]
        file: PathBuf,
    },
}

impl Command {
    fn file(&self) -> &Path {
        match *self {
            Command::Show { ref file, .. }
            | Command::Reply { ref file, .. }
            | Command::Extract { ref file, .. }
            | Command::Save { ref file, .. }
            | Command::HasAttachment { ref file }
            | Command::UnwrapSpam { ref file, .. } => file,
        }
    }
}

pub fn main() {
    let options = Options::from_args();
    init_log(&options.common);

    let config = match options.common.config {
        Some(ref path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error in config file '{}': {}", path.display(), e);
                EX_CONFIG.exit()
            },
        },
        None => Config::default(),
    };

    let raw = match read_input(options.command.file()) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!(
                "Error reading '{}': {}",
                options.command.file().display(),
                e
            );
            EX_NOINPUT.exit()
        },
    };

    let mut folder = MemoryFolder::new(
        options.command.file().to_string_lossy().into_owned(),
    );
    let uid = folder.append(raw, SystemFlags::empty(), &[]);

    if let Err(e) = run(options.command, config, &mut folder, uid) {
        eprintln!("{}", e);
        exit_for(&e).exit();
    }
}

fn init_log(common: &CommonOptions) {
    use log4rs::append::console::{ConsoleAppender, Target};
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;

    if let Some(ref path) = common.log_config {
        if let Err(e) =
            log4rs::init_file(path, log4rs::file::Deserializers::new())
        {
            eprintln!("Error in log config '{}': {}", path.display(), e);
            EX_CONFIG.exit();
        }
        return;
    }

    let level = if common.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{l}][{t}] {m}{n}")))
        .build();
    let result = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| e.to_string())
        .and_then(|config| {
            log4rs::init_config(config)
                .map(|_| ())
                .map_err(|e| e.to_string())
        });
    if let Err(e) = result {
        eprintln!("Failed to initialise logging: {}", e);
        EX_SOFTWARE.exit();
    }
}

fn read_input(path: &Path) -> io::Result<Vec<u8>> {
    let mut raw = Vec::new();
    if Path::new("-") == path {
        io::stdin().lock().read_to_end(&mut raw)?;
    } else {
        fs::File::open(path)?.read_to_end(&mut raw)?;
    }
    Ok(to_dos_line_endings(raw))
}

/// If the first line ends with a bare LF, convert every LF to CRLF.
/// Otherwise the data is returned as is.
fn to_dos_line_endings(raw: Vec<u8>) -> Vec<u8> {
    match memchr::memchr(b'\n', &raw) {
        Some(ix) if 0 == ix || b'\r' != raw[ix - 1] => {
            debug!("Converting UNIX line endings");
            let mut converted = Vec::with_capacity(raw.len() + raw.len() / 32);
            for &b in &raw {
                if b'\n' == b {
                    converted.push(b'\r');
                }
                converted.push(b);
            }
            converted
        },
        _ => raw,
    }
}

fn run(
    command: Command,
    mut config: Config,
    folder: &mut MemoryFolder,
    uid: u32,
) -> Result<(), Error> {
    match command {
        Command::Show {
            prefer_text,
            session,
            ..
        } => {
            if prefer_text {
                config.display.prefer_html = false;
            }
            let message = display(&folder.accessor(uid), &config, &session)?;
            let mut stdout = io::stdout();
            serde_json::to_writer_pretty(&mut stdout, &message)?;
            writeln!(stdout)?;
        },

        Command::Reply { forward, html, .. } => {
            if html {
                config.reply.prefer_html = true;
            }
            let message = open_message(&folder.accessor(uid))?;
            let text = build_reply(
                &message,
                &config.reply,
                &Formatter::new(&config),
                forward,
            );
            io::stdout().write_all(text.as_bytes())?;
        },

        Command::Extract { output, id, .. } => {
            let id = id.parse::<AttachmentId>()?;
            let located = locate(&folder.accessor(uid), id)?;
            debug!(
                "{}: {} {:?}",
                located.id, located.content_type, located.filename
            );
            write_output(output.as_deref(), &located.data)?;
        },

        Command::Save { dir, .. } => {
            let written =
                dump(&folder.accessor(uid), AttachmentSaver::new(dir))??;
            let mut stdout = io::stdout();
            for path in written {
                writeln!(stdout, "{}", path.display())?;
            }
        },

        Command::HasAttachment { .. } => {
            let message = open_message(&folder.accessor(uid))?;
            let verdict = check_and_remember(folder, uid, &message)?;
            println!("{}", verdict);
        },

        Command::UnwrapSpam { output, .. } => {
            match dump(&folder.accessor(uid), SpamUnwrapper::default())? {
                Some(original) => {
                    write_output(output.as_deref(), &original.raw)?
                },
                None => {
                    eprintln!("Not a spam report with an original message");
                    EX_NOINPUT.exit()
                },
            }
        },
    }

    Ok(())
}

fn write_output(path: Option<&Path>, data: &[u8]) -> Result<(), Error> {
    match path {
        Some(path) => fs::write(path, data)?,
        None => io::stdout().write_all(data)?,
    }
    Ok(())
}

fn exit_for(error: &Error) -> Sysexit {
    match *error {
        Error::BadAttachmentId(..) => EX_USAGE,
        Error::NxAttachment(..) | Error::NxMessage(..) => EX_NOINPUT,
        Error::UnreadableMessage { .. }
        | Error::PartContent(..)
        | Error::BadUuencode(..)
        | Error::BadTnef(..) => EX_DATAERR,
        Error::Io(..) => EX_IOERR,
        Error::Toml(..) => EX_CONFIG,
        Error::FolderReadOnly(..) | Error::Json(..) => EX_SOFTWARE,
    }
}
