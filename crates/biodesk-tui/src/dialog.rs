//! Modal round trips.
//!
//! A screen task sends a request through the action channel and awaits
//! the reply on a oneshot. The app owns the modal while it is open and
//! answers exactly once: the payload or `true` on confirm, nothing or
//! `false` on cancel. Dropping the request counts as a cancel.

use biodesk_core::{FormModel, Payload};
use tokio::sync::{mpsc, oneshot};

use crate::action::Action;

/// Ask the app to show a form.
#[derive(Debug)]
pub struct FormRequest {
    pub form: FormModel,
    pub reply: oneshot::Sender<Option<Payload>>,
}

/// Ask the app to show a yes/no dialog.
#[derive(Debug)]
pub struct ConfirmRequest {
    pub message: String,
    pub reply: oneshot::Sender<bool>,
}

impl ConfirmRequest {
    pub fn answer(self, confirmed: bool) {
        let _ = self.reply.send(confirmed);
    }
}

/// Open `form` and wait for the payload. `None` when cancelled or when
/// the app has gone away.
pub async fn request_form(tx: &mpsc::UnboundedSender<Action>, form: FormModel) -> Option<Payload> {
    let (reply, rx) = oneshot::channel();
    tx.send(Action::OpenForm(FormRequest { form, reply })).ok()?;
    rx.await.ok().flatten()
}

/// Ask `message` and wait for the answer.
pub async fn confirm(tx: &mpsc::UnboundedSender<Action>, message: impl Into<String>) -> bool {
    let (reply, rx) = oneshot::channel();
    let request = ConfirmRequest {
        message: message.into(),
        reply,
    };
    if tx.send(Action::OpenConfirm(request)).is_err() {
        return false;
    }
    rx.await.unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use biodesk_core::model::Patient;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn form_reply_reaches_the_opener() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let opener = tokio::spawn(async move {
            request_form(&tx, FormModel::create::<Patient>()).await
        });

        let Some(Action::OpenForm(request)) = rx.recv().await else {
            panic!("expected a form request");
        };
        assert_eq!(request.form.submit_label(), "Create");
        let mut payload = Payload::new();
        payload.insert("nhc".into(), json!("N1"));
        request.reply.send(Some(payload.clone())).unwrap();

        assert_eq!(opener.await.unwrap(), Some(payload));
    }

    #[tokio::test]
    async fn dropped_requests_count_as_cancel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let opener = tokio::spawn(async move { confirm(&tx, "Delete Patient N1?").await });

        let Some(Action::OpenConfirm(request)) = rx.recv().await else {
            panic!("expected a confirm request");
        };
        assert_eq!(request.message, "Delete Patient N1?");
        drop(request);

        assert!(!opener.await.unwrap());
    }

    #[tokio::test]
    async fn closed_app_cancels_immediately() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        assert!(request_form(&tx, FormModel::create::<Patient>()).await.is_none());
        assert!(!confirm(&tx, "Delete?").await);
    }
}
