use std::io;
use std::thread::{self, JoinHandle};

use tracing::{error, trace};

/// Named thread that gets joined when dropped
pub struct AutoJoinHandle {
    name: &'static str,
    join_handle: Option<JoinHandle<()>>,
}

impl AutoJoinHandle {
    pub fn spawn<F>(name: &'static str, f: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let join_handle = thread::Builder::new().name(name.to_owned()).spawn(f)?;
        trace!(task = name, "Spawned");
        Ok(Self {
            name,
            join_handle: Some(join_handle),
        })
    }
}

impl Drop for AutoJoinHandle {
    fn drop(&mut self) {
        if let Some(join_handle) = self.join_handle.take() {
            if join_handle.join().is_err() {
                error!(task = self.name, "Task thread panicked");
            }
        }
    }
}

#[test]
fn panicking_task_is_joined_on_drop() -> io::Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let finished = Arc::new(AtomicBool::new(false));
    let task = AutoJoinHandle::spawn("panicking", {
        let finished = finished.clone();
        move || {
            let _guard = scopeguard::guard((), |_| finished.store(true, Ordering::SeqCst));
            panic!("task failure");
        }
    })?;

    drop(task);
    assert!(finished.load(Ordering::SeqCst));
    Ok(())
}
