use crate::geo::ProjectionError;
use std::fmt;
use std::io;

pub type CubeResult<T> = Result<T, CubeError>;

#[derive(Debug)]
pub enum CubeError {
    NoDataFound(String),
    UnknownProduct(String),
    UnknownCategory(String),
    UnknownBand(String),
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    InvalidCoordinate((f64, f64)),
    InvalidDateRange(String),
    ProjectionError(ProjectionError),
    ArrayError(ndarray::ShapeError),
    ReadError(io::Error),
    #[cfg(feature = "image")]
    ImageError(image::ImageError),
}

impl fmt::Display for CubeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for CubeError {}

impl From<ProjectionError> for CubeError {
    fn from(e: ProjectionError) -> Self {
        CubeError::ProjectionError(e)
    }
}

impl From<ndarray::ShapeError> for CubeError {
    fn from(e: ndarray::ShapeError) -> Self {
        CubeError::ArrayError(e)
    }
}

impl From<io::Error> for CubeError {
    fn from(e: io::Error) -> Self {
        CubeError::ReadError(e)
    }
}

#[cfg(feature = "image")]
impl From<image::ImageError> for CubeError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io_error) => CubeError::ReadError(io_error),
            image_error => CubeError::ImageError(image_error),
        }
    }
}
