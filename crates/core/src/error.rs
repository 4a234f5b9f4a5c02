use thiserror::Error;

use crate::funnel::FunnelError;
use crate::model::{CourseError, IdError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Funnel(#[from] FunnelError),
}
