// ── Remote-data bindings ──
//
// A binding owns one fetch. Its state lives in a `watch` channel that a
// driver task updates; UI consumers subscribe and redraw on change. The
// request is derived from a reactive input (usually a route key), and a
// new request or an explicit reload drops whatever fetch was in flight.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, OptionFuture};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;

/// Observable state of a binding.
pub enum Remote<T> {
    /// No request can be derived from the inputs yet.
    Idle,
    Loading,
    Ready(Arc<T>),
    Failed(Arc<CoreError>),
}

impl<T> Clone for Remote<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Loading => Self::Loading,
            Self::Ready(value) => Self::Ready(Arc::clone(value)),
            Self::Failed(err) => Self::Failed(Arc::clone(err)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Remote<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Loading => f.write_str("Loading"),
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
        }
    }
}

impl<T> Remote<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn value(&self) -> Option<&Arc<T>> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Shared by every clone of a binding. Dropping the last one stops the
/// driver task.
struct Control {
    reload: mpsc::UnboundedSender<()>,
    cancel: CancellationToken,
}

impl Drop for Control {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Handle to a reactive fetch.
///
/// Cloning is cheap; all clones observe the same state and share one
/// driver task.
pub struct Binding<T> {
    label: &'static str,
    state: watch::Receiver<Remote<T>>,
    control: Arc<Control>,
    default: Option<Arc<T>>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            state: self.state.clone(),
            control: Arc::clone(&self.control),
            default: self.default.clone(),
        }
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<T: Send + Sync + 'static> Binding<T> {
    /// A binding with no reactive inputs. Fetches immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fixed<F, Fut>(label: &'static str, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        // The sender drops here; the driver sees a closed input and only
        // reacts to reloads from then on.
        let (_input_tx, input) = watch::channel(());
        Self::derived(label, input, |_: &()| Some(()), move |()| fetch())
    }

    /// A binding whose request is derived from `input`.
    ///
    /// Every input change re-runs `derive`. A request different from the
    /// last one starts a new fetch; `None` parks the binding in
    /// [`Remote::Idle`]. Must be called from within a tokio runtime.
    pub fn derived<I, R, D, F, Fut>(
        label: &'static str,
        mut input: watch::Receiver<I>,
        derive: D,
        fetch: F,
    ) -> Self
    where
        I: Send + Sync + 'static,
        R: Clone + PartialEq + Send + 'static,
        D: Fn(&I) -> Option<R> + Send + 'static,
        F: Fn(R) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let request = derive(&*input.borrow_and_update());
        let initial = if request.is_some() {
            Remote::Loading
        } else {
            Remote::Idle
        };

        let (state_tx, state_rx) = watch::channel(initial);
        let (reload_tx, reload_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let mut driver = Driver {
            label,
            derive,
            fetch,
            state: state_tx,
            request: None,
            in_flight: None,
        };
        driver.begin(request);
        tokio::spawn(driver.run(input, reload_rx, cancel.clone()));

        Self {
            label,
            state: state_rx,
            control: Arc::new(Control {
                reload: reload_tx,
                cancel,
            }),
            default: None,
        }
    }
}

impl<T: Send + Sync + 'static> Binding<T> {
    /// Send a unit signal on every state change until the binding stops
    /// or `signal` closes.
    pub fn forward_changes(&self, signal: &mpsc::UnboundedSender<()>) {
        let mut rx = self.subscribe();
        let signal = signal.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if signal.send(()).is_err() {
                    break;
                }
            }
        });
    }
}

impl<T> Binding<T> {
    /// Value returned by [`Binding::value`] while nothing has arrived.
    pub fn with_default(mut self, value: T) -> Self {
        self.default = Some(Arc::new(value));
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// A fresh receiver for select loops and bridges.
    pub fn subscribe(&self) -> watch::Receiver<Remote<T>> {
        self.state.clone()
    }

    pub fn current(&self) -> Remote<T> {
        self.state.borrow().clone()
    }

    /// Wait for the next state change. Returns `None` once the driver has
    /// stopped.
    pub async fn changed(&mut self) -> Option<Remote<T>> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    /// The loaded value, or the default while not ready.
    pub fn value(&self) -> Option<Arc<T>> {
        match &*self.state.borrow() {
            Remote::Ready(value) => Some(Arc::clone(value)),
            _ => self.default.clone(),
        }
    }

    /// Re-issue the fetch for the current request.
    pub fn reload(&self) {
        let _ = self.control.reload.send(());
    }
}

// ── Driver task ──────────────────────────────────────────────────────

struct Driver<T, R, D, F> {
    label: &'static str,
    derive: D,
    fetch: F,
    state: watch::Sender<Remote<T>>,
    request: Option<R>,
    in_flight: Option<BoxFuture<'static, Result<T, CoreError>>>,
}

impl<T, R, D, F, Fut> Driver<T, R, D, F>
where
    T: Send + Sync + 'static,
    R: Clone + PartialEq + Send + 'static,
    F: Fn(R) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
{
    /// Replace the in-flight fetch without publishing a state.
    fn begin(&mut self, request: Option<R>) {
        if self.in_flight.take().is_some() {
            debug!(binding = self.label, "superseding in-flight fetch");
        }
        self.in_flight = request.clone().map(|r| {
            debug!(binding = self.label, "fetch started");
            (self.fetch)(r).boxed()
        });
        self.request = request;
    }

    fn restart(&mut self, request: Option<R>) {
        self.begin(request);
        let next = if self.in_flight.is_some() {
            Remote::Loading
        } else {
            Remote::Idle
        };
        self.state.send_replace(next);
    }

    fn settle(&mut self, result: Result<T, CoreError>) {
        let next = match result {
            Ok(value) => Remote::Ready(Arc::new(value)),
            Err(err) => {
                warn!(binding = self.label, error = %err, "fetch failed");
                Remote::Failed(Arc::new(err))
            }
        };
        self.state.send_replace(next);
    }

    async fn run<I>(
        mut self,
        mut input: watch::Receiver<I>,
        mut reload: mpsc::UnboundedReceiver<()>,
        cancel: CancellationToken,
    ) where
        D: Fn(&I) -> Option<R>,
    {
        let mut input_open = true;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                changed = input.changed(), if input_open => {
                    if changed.is_err() {
                        input_open = false;
                        continue;
                    }
                    let request = (self.derive)(&*input.borrow_and_update());
                    if request != self.request {
                        self.restart(request);
                    }
                }
                msg = reload.recv() => match msg {
                    Some(()) => {
                        let request = self.request.clone();
                        self.restart(request);
                    }
                    None => break,
                },
                Some(result) = OptionFuture::from(self.in_flight.as_mut()) => {
                    self.in_flight = None;
                    self.settle(result);
                }
            }
        }
        debug!(binding = self.label, "binding driver stopped");
    }
}
