use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::features::domain::signature::Signature;
use crate::templates::domain::template::Template;
use crate::templates::domain::template_store::{StoreError, TemplateStore};

enum StoreRequest {
    Put {
        label: String,
        signature: Signature,
        reply: Sender<Result<(), StoreError>>,
    },
    GetAll {
        reply: Sender<Result<Vec<Template>, StoreError>>,
    },
}

/// Decorator that bounds every store call by a deadline.
///
/// Calls run in order on one long-lived worker thread fed by a queue of
/// depth one. A call that gets no answer in time fails with
/// [`StoreError::Timeout`] and may still complete later. While the worker is
/// stuck and the queue is occupied, further calls fail at once with
/// [`StoreError::Busy`] and are never sent.
pub struct TimeoutTemplateStore {
    requests: Sender<StoreRequest>,
    timeout: Duration,
}

impl TimeoutTemplateStore {
    pub fn new(inner: Arc<dyn TemplateStore>, timeout: Duration) -> Self {
        let (requests, rx) = crossbeam_channel::bounded(1);
        thread::spawn(move || run_worker(inner, rx));
        Self { requests, timeout }
    }

    fn call<T>(
        &self,
        request: StoreRequest,
        reply: Receiver<Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match self.requests.try_send(request) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("Template store still busy, rejecting call");
                return Err(StoreError::Busy);
            }
            Err(TrySendError::Disconnected(_)) => return Err(StoreError::Disconnected),
        }
        match reply.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(StoreError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(StoreError::Disconnected),
        }
    }
}

impl TemplateStore for TimeoutTemplateStore {
    fn put(&self, label: &str, signature: &Signature) -> Result<(), StoreError> {
        let (reply, rx) = crossbeam_channel::bounded(1);
        let request = StoreRequest::Put {
            label: label.to_string(),
            signature: signature.clone(),
            reply,
        };
        self.call(request, rx)
    }

    fn get_all(&self) -> Result<Vec<Template>, StoreError> {
        let (reply, rx) = crossbeam_channel::bounded(1);
        self.call(StoreRequest::GetAll { reply }, rx)
    }
}

fn run_worker(inner: Arc<dyn TemplateStore>, requests: Receiver<StoreRequest>) {
    for request in requests {
        match request {
            StoreRequest::Put {
                label,
                signature,
                reply,
            } => {
                let _ = reply.send(inner.put(&label, &signature));
            }
            StoreRequest::GetAll { reply } => {
                let _ = reply.send(inner.get_all());
            }
        }
    }
    log::debug!("Template store worker stopped");
}
