//! Hand-off from the fast input/animation path to the UI context.
//!
//! The fast path only ever sends plain messages; everything with side
//! effects (haptics, callbacks, state the toolkit owns) runs where the
//! receiver is drained.

use async_channel::{Receiver, Sender, TryRecvError};

#[derive(Debug)]
pub struct UiSender<M>(Sender<M>);

impl<M> Clone for UiSender<M> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<M> UiSender<M> {
    /// Queues `msg` for the UI context. A closed queue means the owner is
    /// gone, so the message is dropped.
    pub fn post(&self, msg: M) {
        if self.0.try_send(msg).is_err() {
            log::debug!("UI queue closed, dropping message");
        }
    }
}

#[derive(Debug)]
pub struct UiReceiver<M>(Receiver<M>);

impl<M> UiReceiver<M> {
    /// Runs `handle` on every message queued so far, returning how many ran.
    pub fn drain(&self, mut handle: impl FnMut(M)) -> usize {
        let mut handled = 0;
        loop {
            match self.0.try_recv() {
                Ok(msg) => {
                    handle(msg);
                    handled += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return handled,
            }
        }
    }

    pub async fn recv(&self) -> Option<M> {
        self.0.recv().await.ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn ui_channel<M>() -> (UiSender<M>, UiReceiver<M>) {
    let (tx, rx) = async_channel::unbounded();
    (UiSender(tx), UiReceiver(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_runs_messages_in_order() {
        let (tx, rx) = ui_channel();
        tx.post(1);
        tx.clone().post(2);
        let mut seen = Vec::new();
        assert_eq!(rx.drain(|m| seen.push(m)), 2);
        assert_eq!(seen, vec![1, 2]);
        assert!(rx.is_empty());
    }

    #[test]
    fn post_after_receiver_dropped_is_silent() {
        let (tx, rx) = ui_channel::<u8>();
        drop(rx);
        tx.post(7);
    }
}
