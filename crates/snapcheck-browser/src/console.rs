use crate::Result;
use chromiumoxide::cdp::js_protocol::runtime::{
    ConsoleApiCalledType, EventConsoleApiCalled, RemoteObject,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// A single console message observed on the page
#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    /// The console method used (log, warn, error, ...)
    pub kind: String,
    /// Rendered message text
    pub text: String,
}

/// Forwards page console output to stdout as it arrives.
///
/// Messages are printed in emission order, prefixed with
/// `Browser console:`, and retained for inspection after the run.
pub struct ConsoleForwarder {
    messages: Arc<Mutex<Vec<ConsoleMessage>>>,
    task: JoinHandle<()>,
}

impl ConsoleForwarder {
    /// Subscribe to `Runtime.consoleAPICalled` events on the page.
    ///
    /// Must be attached before navigation so messages emitted during the
    /// initial load are observed.
    pub async fn attach(page: &Page) -> Result<Self> {
        let mut events = page.event_listener::<EventConsoleApiCalled>().await?;
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = messages.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let text = render_args(&event.args);
                println!("Browser console: {}", text);

                let kind = kind_label(&event.r#type);
                if let Ok(mut sink) = sink.lock() {
                    sink.push(ConsoleMessage { kind, text });
                }
            }
        });

        Ok(Self { messages, task })
    }

    /// Messages captured so far, in emission order
    pub fn messages(&self) -> Vec<ConsoleMessage> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Stop forwarding. Dropping the session ends the event stream anyway;
    /// this just makes the shutdown order explicit.
    pub fn detach(self) {
        self.task.abort();
    }
}

/// The console method name as scripts call it (log, warn, error, ...)
fn kind_label(kind: &ConsoleApiCalledType) -> String {
    format!("{:?}", kind).to_lowercase()
}

fn render_args(args: &[RemoteObject]) -> String {
    args.iter()
        .map(|arg| render_arg(arg.value.as_ref(), arg.description.as_deref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render one console argument the way DevTools would: the primitive value
/// when the object was serialized, otherwise its description.
fn render_arg(value: Option<&serde_json::Value>, description: Option<&str>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => description.unwrap_or("[object]").to_string(),
    }
}
