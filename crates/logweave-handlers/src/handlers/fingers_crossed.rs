//! Handler that holds records back until one reaches an activation level,
//! then releases the whole backlog to a wrapped handler.

use logweave_types::{
    handler_options, Binding, BoundArgs, Handler, HandlerDescriptor, HandlerOptions, Level,
    ParamDefault, ParamDescriptor, ParamKind, Record, Result,
};
use parking_lot::Mutex;

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::handler("handler"),
    ParamDescriptor::level("activationLevel", Level::Warning),
    ParamDescriptor::optional("bufferSize", ParamDefault::Int(0)),
    ParamDescriptor::optional("stopBuffering", ParamDefault::Bool(true)),
    ParamDescriptor {
        name: "passthruLevel",
        kind: ParamKind::Level,
        default: ParamDefault::Null,
    },
];

/// Registry entry for `FingersCrossedHandler`.
pub const DESCRIPTOR: HandlerDescriptor = HandlerDescriptor {
    class: "FingersCrossedHandler",
    binding: Binding::Named(PARAMS),
    default_bubble: true,
    construct: FingersCrossedHandler::construct,
};

#[derive(Debug, Default)]
struct State {
    buffer: Vec<Record>,
    active: bool,
}

/// Buffers until activation.
#[derive(Debug)]
pub struct FingersCrossedHandler {
    options: HandlerOptions,
    inner: Box<dyn Handler>,
    activation_level: Level,
    buffer_size: usize,
    stop_buffering: bool,
    passthru_level: Option<Level>,
    state: Mutex<State>,
}

impl FingersCrossedHandler {
    /// Wrap a handler, activating at `activation_level`.
    pub fn new(inner: Box<dyn Handler>, activation_level: Level) -> Self {
        Self {
            options: HandlerOptions::default(),
            inner,
            activation_level,
            buffer_size: 0,
            stop_buffering: true,
            passthru_level: None,
            state: Mutex::new(State::default()),
        }
    }

    fn construct(mut args: BoundArgs) -> Result<Box<dyn Handler>> {
        let inner = args.take_handler("handler")?;
        let activation_level = args.take_level("activationLevel")?.unwrap_or(Level::Warning);

        let mut handler = Self::new(inner, activation_level);
        handler.buffer_size = args.take_u64("bufferSize")?.unwrap_or(0) as usize;
        handler.stop_buffering = args.take_bool("stopBuffering")?.unwrap_or(true);
        handler.passthru_level = args.take_level("passthruLevel")?;
        Ok(Box::new(handler))
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &dyn Handler {
        self.inner.as_ref()
    }

    /// Level that releases the backlog.
    pub fn activation_level(&self) -> Level {
        self.activation_level
    }

    /// Level that is released on close even without activation.
    pub fn passthru_level(&self) -> Option<Level> {
        self.passthru_level
    }

    /// Whether the handler has been activated.
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    fn forward(&self, records: &[Record]) -> Result<()> {
        for record in records {
            if self.inner.is_handling(record.level) {
                self.inner.handle(record)?;
            }
        }
        Ok(())
    }
}

impl Handler for FingersCrossedHandler {
    handler_options!();

    // Every record goes to the backlog; the wrapped handler filters on release.
    fn is_handling(&self, _level: Level) -> bool {
        true
    }

    fn handle(&self, record: &Record) -> Result<bool> {
        let released = {
            let mut state = self.state.lock();
            if state.active {
                None
            } else {
                state.buffer.push(record.clone());
                if self.buffer_size > 0 && state.buffer.len() > self.buffer_size {
                    state.buffer.remove(0);
                }
                if record.level >= self.activation_level {
                    state.active = self.stop_buffering;
                    Some(std::mem::take(&mut state.buffer))
                } else {
                    Some(Vec::new())
                }
            }
        };

        match released {
            None => self.forward(std::slice::from_ref(record))?,
            Some(records) => self.forward(&records)?,
        }

        Ok(!self.options.bubble)
    }

    fn close(&self) -> Result<()> {
        let pending = std::mem::take(&mut self.state.lock().buffer);
        if let Some(passthru) = self.passthru_level {
            let released: Vec<Record> = pending.into_iter().filter(|r| r.level >= passthru).collect();
            self.forward(&released)?;
        }
        self.inner.close()
    }
}
