//! Background scene loading
//!
//! A worker thread builds the value; the render thread polls for it once a
//! frame without blocking.

use crate::error::{EngineError, EngineResult};
use flume::{Receiver, TryRecvError};

#[derive(Debug)]
pub enum LoadState<T> {
    Pending,
    Ready(T),
    Failed(EngineError),
}

pub struct SceneLoad<T> {
    receiver: Receiver<EngineResult<T>>,
    finished: bool,
}

impl<T: Send + 'static> SceneLoad<T> {
    /// Run `work` on a new thread
    pub fn spawn<F>(name: &str, work: F) -> EngineResult<Self>
    where
        F: FnOnce() -> EngineResult<T> + Send + 'static,
    {
        let (sender, receiver) = flume::bounded(1);
        std::thread::Builder::new()
            .name(format!("scene-load-{}", name))
            .spawn(move || {
                // Receiver may be gone if the load was abandoned
                let _ = sender.send(work());
            })?;
        Ok(Self {
            receiver,
            finished: false,
        })
    }
}

impl<T> SceneLoad<T> {
    /// Check for a result without blocking. Ready or Failed is reported
    /// once; later polls fail.
    pub fn poll(&mut self) -> LoadState<T> {
        if self.finished {
            return LoadState::Failed(EngineError::SceneLoadFailed(
                "result already taken".to_string(),
            ));
        }
        match self.receiver.try_recv() {
            Ok(Ok(value)) => {
                self.finished = true;
                LoadState::Ready(value)
            }
            Ok(Err(error)) => {
                self.finished = true;
                LoadState::Failed(error)
            }
            Err(TryRecvError::Empty) => LoadState::Pending,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                LoadState::Failed(EngineError::SceneLoadFailed(
                    "loader exited without a result".to_string(),
                ))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
