use super::{save_content, ContentService, ListingService};
use crate::entry::Entry;
use crate::error::FetchError;
use crate::state::{FetchJob, Fetched};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

pub enum IoCommand {
    Fetch {
        id: u64,
        job: FetchJob,
    },
    Download {
        entry: Entry,
        dir: PathBuf,
        open_after: bool,
    },
}

pub enum IoResult {
    Fetched {
        id: u64,
        job: FetchJob,
        result: Result<Fetched, FetchError>,
    },
    Downloaded {
        name: String,
        result: Result<PathBuf, FetchError>,
    },
}

fn download<S: ContentService>(
    service: &S,
    entry: &Entry,
    dir: &Path,
    open_after: bool,
) -> Result<PathBuf, FetchError> {
    let content = service.fetch_content(entry)?;
    let path = save_content(content, dir)?;
    if open_after {
        if let Err(e) = open::that(&path) {
            warn!(path = %path.display(), error = %e, "could not open downloaded file");
        }
    }
    Ok(path)
}

pub fn spawn_worker<S>(service: Arc<S>) -> (Sender<IoCommand>, Receiver<IoResult>)
where
    S: ListingService + ContentService + Send + Sync + 'static,
{
    let (cmd_tx, cmd_rx) = channel();
    let (res_tx, res_rx) = channel();

    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            let sent = match cmd {
                IoCommand::Fetch { id, job } => {
                    debug!(id, job = %job.describe(), "fetch started");
                    let result = job.run(service.as_ref());
                    res_tx.send(IoResult::Fetched { id, job, result })
                }
                IoCommand::Download {
                    entry,
                    dir,
                    open_after,
                } => {
                    let result = download(service.as_ref(), &entry, &dir, open_after);
                    res_tx.send(IoResult::Downloaded {
                        name: entry.name,
                        result,
                    })
                }
            };
            if sent.is_err() {
                break;
            }
        }
        debug!("io worker stopped");
    });

    (cmd_tx, res_rx)
}
