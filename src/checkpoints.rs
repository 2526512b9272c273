use crate::error::{Error, Result};

/// When a trial samples its counters, in processed-element counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckpointSchedule {
    /// Every `k` elements, plus the end of the stream.
    Every(u64),
    /// `floor(N * i / p)` for `i` in `1..=p`.
    Parts(u64),
    /// Explicit milestones, strictly increasing and within `1..=N`.
    Explicit(Vec<u64>),
}

impl Default for CheckpointSchedule {
    fn default() -> Self {
        CheckpointSchedule::Parts(20)
    }
}

impl CheckpointSchedule {
    /// Ordered milestones for a stream of `stream_len` elements.
    pub fn resolve(&self, stream_len: u64) -> Result<Vec<u64>> {
        if stream_len == 0 {
            return Err(Error::EmptyStream);
        }
        let milestones = match self {
            CheckpointSchedule::Every(0) => {
                return Err(Error::InvalidSchedule("interval must be positive".into()));
            }
            CheckpointSchedule::Every(k) => {
                let mut milestones: Vec<u64> = (1..=stream_len / k).map(|i| i * k).collect();
                if stream_len % k != 0 {
                    milestones.push(stream_len);
                }
                milestones
            }
            CheckpointSchedule::Parts(0) => {
                return Err(Error::InvalidSchedule("part count must be positive".into()));
            }
            CheckpointSchedule::Parts(parts) => {
                let mut milestones: Vec<u64> = Vec::new();
                for p in 1..=*parts {
                    let t = (stream_len as u128 * p as u128 / *parts as u128) as u64;
                    if t > 0 && milestones.last() != Some(&t) {
                        milestones.push(t);
                    }
                }
                milestones
            }
            CheckpointSchedule::Explicit(list) => {
                check_milestones(list, stream_len)?;
                list.clone()
            }
        };
        Ok(milestones)
    }
}

/// Checks that `milestones` is non-empty, strictly increasing and within
/// `1..=stream_len`.
pub fn check_milestones(milestones: &[u64], stream_len: u64) -> Result<()> {
    let (Some(&first), Some(&last)) = (milestones.first(), milestones.last()) else {
        return Err(Error::InvalidSchedule("no checkpoints given".into()));
    };
    if milestones.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::InvalidSchedule(format!(
            "checkpoints must be strictly increasing: {milestones:?}"
        )));
    }
    if first == 0 || last > stream_len {
        return Err(Error::InvalidSchedule(format!(
            "checkpoints must lie within 1..={stream_len}: {milestones:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(CheckpointSchedule::Every(250), 1000 => vec![250, 500, 750, 1000]; "even interval")]
    #[test_case(CheckpointSchedule::Every(300), 1000 => vec![300, 600, 900, 1000]; "ragged interval")]
    #[test_case(CheckpointSchedule::Every(5000), 1000 => vec![1000]; "interval past end")]
    #[test_case(CheckpointSchedule::Parts(4), 1000 => vec![250, 500, 750, 1000]; "parts")]
    #[test_case(CheckpointSchedule::Parts(20), 10 => vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]; "parts deduplicated")]
    #[test_case(CheckpointSchedule::Explicit(vec![1, 10, 100]), 100 => vec![1, 10, 100]; "explicit")]
    fn resolves(schedule: CheckpointSchedule, stream_len: u64) -> Vec<u64> {
        schedule.resolve(stream_len).unwrap()
    }

    #[test_case(CheckpointSchedule::Every(0); "zero interval")]
    #[test_case(CheckpointSchedule::Parts(0); "zero parts")]
    #[test_case(CheckpointSchedule::Explicit(vec![]); "empty list")]
    #[test_case(CheckpointSchedule::Explicit(vec![10, 5]); "decreasing")]
    #[test_case(CheckpointSchedule::Explicit(vec![5, 5]); "repeated")]
    #[test_case(CheckpointSchedule::Explicit(vec![0, 5]); "zero milestone")]
    #[test_case(CheckpointSchedule::Explicit(vec![5, 101]); "past end")]
    fn rejects(schedule: CheckpointSchedule) {
        assert!(matches!(schedule.resolve(100), Err(Error::InvalidSchedule(_))));
    }

    #[test]
    fn rejects_empty_stream() {
        assert!(matches!(
            CheckpointSchedule::default().resolve(0),
            Err(Error::EmptyStream)
        ));
    }
}
