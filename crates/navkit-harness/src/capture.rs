#![forbid(unsafe_code)]

//! Span and event capture for tracing assertions.
//!
//! ```rust,ignore
//! let capture = with_captured(|| router.pop(false).map(drop).unwrap());
//! let reconcile = capture.span("navkit.reconcile").unwrap();
//! assert_eq!(reconcile.parent.as_deref(), Some("navkit.transition"));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

/// A span with its fields and the name of its parent.
#[derive(Debug, Clone)]
pub struct CapturedSpan {
    pub name: String,
    pub level: Level,
    pub fields: HashMap<String, String>,
    pub parent: Option<String>,
}

/// An event with its fields and the name of the enclosing span.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: HashMap<String, String>,
    pub span: Option<String>,
}

#[derive(Default)]
struct Store {
    spans: Vec<CapturedSpan>,
    index: HashMap<u64, usize>,
    events: Vec<CapturedEvent>,
}

/// Read access to what a [`with_captured`] run recorded.
#[derive(Clone)]
pub struct CaptureHandle {
    store: Arc<Mutex<Store>>,
}

impl CaptureHandle {
    fn read<T>(&self, f: impl FnOnce(&Store) -> T) -> T {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&store)
    }

    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.read(|s| s.spans.clone())
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.read(|s| s.events.clone())
    }

    /// First span named `name`.
    pub fn span(&self, name: &str) -> Option<CapturedSpan> {
        self.read(|s| s.spans.iter().find(|span| span.name == name).cloned())
    }

    /// Every span named `name`.
    pub fn spans_named(&self, name: &str) -> Vec<CapturedSpan> {
        self.read(|s| {
            s.spans
                .iter()
                .filter(|span| span.name == name)
                .cloned()
                .collect()
        })
    }

    /// Events at `level`.
    pub fn events_at(&self, level: Level) -> Vec<CapturedEvent> {
        self.read(|s| {
            s.events
                .iter()
                .filter(|event| event.level == level)
                .cloned()
                .collect()
        })
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

struct CaptureLayer {
    store: Arc<Mutex<Store>>,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);

        // Declared but empty fields are listed too, so records can fill them.
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        for field in attrs.metadata().fields() {
            fields.entry(field.name().to_string()).or_default();
        }

        let parent = if attrs.is_contextual() {
            ctx.current_span()
                .id()
                .and_then(|pid| ctx.span(pid))
                .map(|span| span.name().to_string())
        } else {
            attrs
                .parent()
                .and_then(|pid| ctx.span(pid))
                .map(|span| span.name().to_string())
        };

        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let index = store.spans.len();
        store.spans.push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            level: *attrs.metadata().level(),
            fields,
            parent,
        });
        store.index.insert(id.into_u64(), index);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        values.record(&mut visitor);

        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = store.index.get(&id.into_u64()).copied();
        if let Some(span) = slot.and_then(|index| store.spans.get_mut(index)) {
            span.fields.extend(visitor.0);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);

        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.get("message").cloned().unwrap_or_default();
        let span = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span| span.name().to_string());

        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        store.events.push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
            span,
        });
    }
}

/// Run `f` under a subscriber that captures every span and event.
pub fn with_captured<F: FnOnce()>(f: F) -> CaptureHandle {
    let store = Arc::new(Mutex::new(Store::default()));
    let layer = CaptureLayer {
        store: Arc::clone(&store),
    };
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, f);
    CaptureHandle { store }
}
