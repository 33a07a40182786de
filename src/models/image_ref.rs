use std::fmt;

/// An image identifier as reported by the status feed.
///
/// `path` is the server-side path of the image, `engine` the namespace tag
/// (the query engine) needed to turn it into a fetchable address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    path: String,
    engine: String,
}

impl ImageRef {
    pub fn new(path: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            engine: engine.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.engine, self.path)
    }
}
