//! The query status document the feed is distilled from.

use crate::models::ImageRef;

/// Backend processing state as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Processing,
    Training,
    Ranking,
    ResultsReady,
    FatalErrorOrSocketTimeout,
    InvalidQid,
    ResultReadError,
    Inactive,
    Unknown(u32),
}

impl QueryState {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Processing,
            51 => Self::Training,
            52 => Self::Ranking,
            100 => Self::ResultsReady,
            800 => Self::FatalErrorOrSocketTimeout,
            850 => Self::InvalidQid,
            870 => Self::ResultReadError,
            890 => Self::Inactive,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Processing => 0,
            Self::Training => 51,
            Self::Ranking => 52,
            Self::ResultsReady => 100,
            Self::FatalErrorOrSocketTimeout => 800,
            Self::InvalidQid => 850,
            Self::ResultReadError => 870,
            Self::Inactive => 890,
            Self::Unknown(code) => code,
        }
    }

    /// The backend is still working and more images may arrive.
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::Processing | Self::Training | Self::Ranking)
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            Self::FatalErrorOrSocketTimeout
                | Self::InvalidQid
                | Self::ResultReadError
                | Self::Inactive
                | Self::Unknown(_)
        )
    }
}

/// Snapshot of a running query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryStatus {
    pub state: QueryState,
    /// Engine that resolves the image paths below.
    pub engine: String,
    /// Positive training images downloaded so far.
    pub postrain_paths: Vec<String>,
    /// Curated training images, for queries that use a fixed set.
    pub curated_paths: Vec<String>,
    pub negative_count: usize,
    pub err_msg: Option<String>,
}

impl QueryStatus {
    /// References in feed order: positives first, then curated images.
    pub fn image_refs(&self) -> Vec<ImageRef> {
        self.postrain_paths
            .iter()
            .chain(self.curated_paths.iter())
            .map(|path| ImageRef::new(path.as_str(), self.engine.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes_round_trip_known_values() {
        for code in [0, 51, 52, 100, 800, 850, 870, 890] {
            assert_eq!(QueryState::from_code(code).code(), code);
        }
        assert_eq!(QueryState::from_code(7), QueryState::Unknown(7));
    }

    #[test]
    fn test_state_classification() {
        assert!(QueryState::Ranking.is_in_progress());
        assert!(!QueryState::ResultsReady.is_in_progress());
        assert!(!QueryState::ResultsReady.is_error());
        assert!(QueryState::InvalidQid.is_error());
        assert!(QueryState::Unknown(3).is_error());
    }

    #[test]
    fn test_image_refs_chain_positive_then_curated() {
        let status = QueryStatus {
            state: QueryState::Training,
            engine: "cpuvisor".into(),
            postrain_paths: vec!["p1".into()],
            curated_paths: vec!["c1".into(), "c2".into()],
            negative_count: 0,
            err_msg: None,
        };
        let paths: Vec<_> = status
            .image_refs()
            .iter()
            .map(|r| r.path().to_string())
            .collect();
        assert_eq!(paths, vec!["p1", "c1", "c2"]);
    }
}
