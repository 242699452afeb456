use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("interpretalex.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("interpretalex.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("interpretalex.client.request_duration_seconds");
pub(crate) static CLIENT_THREADS_CREATED: Counter =
    Counter::new("interpretalex.client.threads_created");

pub(crate) static STREAM_BYTES: Counter = Counter::new("interpretalex.stream.bytes");
pub(crate) static STREAM_CONTENT_FRAMES: Counter =
    Counter::new("interpretalex.stream.content_frames");
pub(crate) static STREAM_METADATA_FRAMES: Counter =
    Counter::new("interpretalex.stream.metadata_frames");
pub(crate) static STREAM_METADATA_ERRORS: Counter =
    Counter::new("interpretalex.stream.metadata_errors");
pub(crate) static STREAM_IGNORED_FRAMES: Counter =
    Counter::new("interpretalex.stream.ignored_frames");

pub(crate) static SESSION_SENDS: Counter = Counter::new("interpretalex.session.sends");
pub(crate) static SESSION_BUSY_REJECTIONS: Counter =
    Counter::new("interpretalex.session.busy_rejections");
pub(crate) static SESSION_EMPTY_REPLIES: Counter =
    Counter::new("interpretalex.session.empty_replies");
pub(crate) static SESSION_SEND_ERRORS: Counter = Counter::new("interpretalex.session.send_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_counter(&CLIENT_THREADS_CREATED);

    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_CONTENT_FRAMES);
    collector.register_counter(&STREAM_METADATA_FRAMES);
    collector.register_counter(&STREAM_METADATA_ERRORS);
    collector.register_counter(&STREAM_IGNORED_FRAMES);

    collector.register_counter(&SESSION_SENDS);
    collector.register_counter(&SESSION_BUSY_REJECTIONS);
    collector.register_counter(&SESSION_EMPTY_REPLIES);
    collector.register_counter(&SESSION_SEND_ERRORS);
}
