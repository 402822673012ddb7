//! Span capture for unit tests.

use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

struct StepField<'a>(&'a mut Option<String>);

impl Visit for StepField<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "step" {
            *self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
}

struct StepSpans(Arc<Mutex<Vec<String>>>);

impl<S: Subscriber> Layer<S> for StepSpans {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let mut step = None;
        attrs.record(&mut StepField(&mut step));
        if let Some(step) = step {
            self.0.lock().unwrap().push(step);
        }
    }
}

/// `step` field of every span opened while `f` runs, in creation order.
pub(crate) fn capture_step_fields(f: impl FnOnce()) -> Vec<String> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default().with(StepSpans(Arc::clone(&seen)));
    tracing::subscriber::with_default(subscriber, f);
    let steps = seen.lock().unwrap().clone();
    steps
}
