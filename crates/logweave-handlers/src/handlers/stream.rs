//! Handler writing formatted lines to a file or a standard stream.

use logweave_types::{
    handler_options, Binding, BoundArgs, Handler, HandlerDescriptor, HandlerOptions,
    ParamDefault, ParamDescriptor, Record, Result,
};
use std::io::Write;
use std::path::PathBuf;

use super::{parse_permission, LazyFile};
use crate::formatter::format_line;

/// Where a stream handler writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTarget {
    /// Process standard output
    Stdout,
    /// Process standard error
    Stderr,
    /// Append to a file
    File(PathBuf),
}

impl StreamTarget {
    /// Parse a configured `file` value; `stdout`/`stderr` (optionally with a
    /// `php://` prefix) select the standard streams.
    pub fn parse(file: &str) -> Self {
        match file.trim_start_matches("php://") {
            "stdout" | "output" => StreamTarget::Stdout,
            "stderr" => StreamTarget::Stderr,
            _ => StreamTarget::File(PathBuf::from(file)),
        }
    }
}

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::required("file"),
    ParamDescriptor::nullable("filePermission"),
    ParamDescriptor::optional("useLocking", ParamDefault::Bool(false)),
];

/// Registry entry for `StreamHandler`.
pub const DESCRIPTOR: HandlerDescriptor = HandlerDescriptor {
    class: "StreamHandler",
    binding: Binding::Named(PARAMS),
    default_bubble: true,
    construct: StreamHandler::construct,
};

/// Writes each record as one line.
///
/// `useLocking` is accepted and must be a boolean, but changes nothing:
/// writes through one handler are always serialized by its file mutex.
#[derive(Debug)]
pub struct StreamHandler {
    options: HandlerOptions,
    target: StreamTarget,
    file: LazyFile,
}

impl StreamHandler {
    /// Create a handler for a target.
    pub fn new(target: StreamTarget) -> Self {
        Self {
            options: HandlerOptions::default(),
            target,
            file: LazyFile::new(None),
        }
    }

    fn construct(mut args: BoundArgs) -> Result<Box<dyn Handler>> {
        let file = args.require_string("file")?;
        let permission = parse_permission(args.target(), args.take_raw("filePermission"))?;
        args.take_bool("useLocking")?;

        Ok(Box::new(Self {
            options: HandlerOptions::default(),
            target: StreamTarget::parse(&file),
            file: LazyFile::new(permission),
        }))
    }

    /// Configured target.
    pub fn target(&self) -> &StreamTarget {
        &self.target
    }
}

impl Handler for StreamHandler {
    handler_options!();

    fn handle(&self, record: &Record) -> Result<bool> {
        let line = format_line(record);
        match &self.target {
            StreamTarget::Stdout => std::io::stdout().lock().write_all(line.as_bytes())?,
            StreamTarget::Stderr => std::io::stderr().lock().write_all(line.as_bytes())?,
            StreamTarget::File(path) => {
                self.file.write(path, &line)?;
            }
        }
        Ok(!self.options.bubble)
    }

    fn close(&self) -> Result<()> {
        self.file.flush()
    }
}
