use std::{fmt, sync::Arc};

use ctfc_ipc::{Action, IpcChannel, LogParam};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer::Context};

/// Layer that turns every event into a fire-and-forget `LOG` request.
pub struct ForwardLayer {
    channel: Arc<IpcChannel>,
}

impl ForwardLayer {
    pub fn new(channel: Arc<IpcChannel>) -> Self {
        Self { channel }
    }
}

impl<S> Layer<S> for ForwardLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let param = LogParam {
            message: visitor.finish(),
            levelno: Some(levelno(meta.level())),
            pathname: meta.file().map(str::to_owned),
            lineno: meta.line(),
            func_name: meta.module_path().map(str::to_owned),
        };

        // Best effort: a lost log line must not abort the check.
        if let Err(e) = self.channel.send(Action::Log, &param) {
            eprintln!("failed to forward log line: {e}");
        }
    }
}

/// Numeric severities as understood by the controller's logger.
fn levelno(level: &Level) -> u8 {
    match *level {
        Level::TRACE => 5,
        Level::DEBUG => 10,
        Level::INFO => 20,
        Level::WARN => 30,
        Level::ERROR => 40,
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        let fields = self.fields.join(" ");
        if self.message.is_empty() {
            fields
        } else {
            format!("{} {}", self.message, fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
