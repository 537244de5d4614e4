use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::segments::OrderingError;
use crate::template::TemplateError;

/// Everything that aborts a run. None of these are retried.
#[derive(Error, Debug)]
pub enum Error {
    #[error("could not read directory {}", .dir.display())]
    Listing {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Ordering(#[from] OrderingError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
