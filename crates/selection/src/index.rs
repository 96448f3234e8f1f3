//! Index / time query types and the slice resolver.

use chrono::{DateTime, Duration, Utc};
use wx_common::{WxError, WxResult};

/// One end of a [`DatasetSlice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceBound {
    Index(isize),
    Time(DateTime<Utc>),
}

impl From<isize> for SliceBound {
    fn from(i: isize) -> Self {
        SliceBound::Index(i)
    }
}

impl From<DateTime<Utc>> for SliceBound {
    fn from(t: DateTime<Utc>) -> Self {
        SliceBound::Time(t)
    }
}

/// Slice step: every n-th dataset, or one dataset per time tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stride(usize),
    Every(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatasetSlice {
    pub start: Option<SliceBound>,
    pub stop: Option<SliceBound>,
    pub step: Option<Step>,
}

impl DatasetSlice {
    /// `[..]`: every dataset.
    pub fn full() -> Self {
        Self::default()
    }

    pub fn new(start: Option<SliceBound>, stop: Option<SliceBound>) -> Self {
        Self { start, stop, step: None }
    }

    pub fn indices(start: Option<isize>, stop: Option<isize>) -> Self {
        Self::new(start.map(SliceBound::Index), stop.map(SliceBound::Index))
    }

    pub fn times(start: Option<DateTime<Utc>>, stop: Option<DateTime<Utc>>) -> Self {
        Self::new(start.map(SliceBound::Time), stop.map(SliceBound::Time))
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.step = Some(step);
        self
    }

    /// Decide whether this is an index slice or a time slice.
    ///
    /// Integer bounds (or no bounds at all) make an index slice, timestamp
    /// bounds a time slice; mixing the two is rejected. Index slices only
    /// accept a positive stride.
    pub fn classify(&self) -> WxResult<SliceKind> {
        let is_index = |b: &Option<SliceBound>| matches!(b, Some(SliceBound::Index(_)));
        let is_time = |b: &Option<SliceBound>| matches!(b, Some(SliceBound::Time(_)));

        let use_index = is_index(&self.start)
            || is_index(&self.stop)
            || (self.start.is_none() && self.stop.is_none());
        let use_time = is_time(&self.start) || is_time(&self.stop);

        if use_index && use_time {
            return Err(WxError::invalid(
                "Invalid slice: index and timestamp bounds cannot be mixed",
            ));
        }

        if use_index {
            let stride = match self.step {
                None => 1,
                Some(Step::Stride(n)) if n > 0 => n,
                Some(Step::Stride(_)) => return Err(WxError::invalid("slice step cannot be zero")),
                Some(Step::Every(_)) => {
                    return Err(WxError::invalid("index slices require an integer step"))
                }
            };
            let index = |b: Option<SliceBound>| match b {
                Some(SliceBound::Index(i)) => Some(i),
                _ => None,
            };
            return Ok(SliceKind::Index {
                start: index(self.start),
                stop: index(self.stop),
                stride,
            });
        }

        match self.step {
            Some(Step::Stride(0)) => return Err(WxError::invalid("slice step cannot be zero")),
            Some(Step::Every(d)) if d <= Duration::zero() => {
                return Err(WxError::invalid("time slice step must be positive"))
            }
            _ => {}
        }
        let time = |b: Option<SliceBound>| match b {
            Some(SliceBound::Time(t)) => Some(t),
            _ => None,
        };
        Ok(SliceKind::Time {
            start: time(self.start),
            stop: time(self.stop),
            step: self.step,
        })
    }
}

/// A slice after classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKind {
    Index {
        start: Option<isize>,
        stop: Option<isize>,
        stride: usize,
    },
    Time {
        start: Option<DateTime<Utc>>,
        stop: Option<DateTime<Utc>>,
        step: Option<Step>,
    },
}

/// What to look up in a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetIndex {
    /// Position in the sorted catalog; negative counts from the end.
    Position(isize),
    Timestamp(DateTime<Utc>),
    Slice(DatasetSlice),
}

impl From<isize> for DatasetIndex {
    fn from(i: isize) -> Self {
        DatasetIndex::Position(i)
    }
}

impl From<DateTime<Utc>> for DatasetIndex {
    fn from(t: DateTime<Utc>) -> Self {
        DatasetIndex::Timestamp(t)
    }
}

impl From<DatasetSlice> for DatasetIndex {
    fn from(s: DatasetSlice) -> Self {
        DatasetIndex::Slice(s)
    }
}

/// Resolve a possibly negative position against `len` items.
pub fn position(len: usize, index: isize) -> Option<usize> {
    let resolved = if index < 0 {
        len as isize + index
    } else {
        index
    };
    if resolved >= 0 && (resolved as usize) < len {
        Some(resolved as usize)
    } else {
        None
    }
}

/// Positions selected by `[start:stop:stride]` over `len` items, with
/// negative bounds counting from the end and out-of-range bounds clamped.
pub fn slice_positions(len: usize, start: Option<isize>, stop: Option<isize>, stride: usize) -> Vec<usize> {
    let clamp = |bound: isize| -> usize {
        let b = if bound < 0 { len as isize + bound } else { bound };
        b.clamp(0, len as isize) as usize
    };
    let from = start.map(clamp).unwrap_or(0);
    let to = stop.map(clamp).unwrap_or(len);
    if from >= to {
        return Vec::new();
    }
    (from..to).step_by(stride.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 1, 28, h, 0, 0).unwrap()
    }

    #[test]
    fn test_position_negative() {
        assert_eq!(position(4, 0), Some(0));
        assert_eq!(position(4, -1), Some(3));
        assert_eq!(position(4, -4), Some(0));
        assert_eq!(position(4, 4), None);
        assert_eq!(position(4, -5), None);
        assert_eq!(position(0, 0), None);
    }

    #[test]
    fn test_slice_positions_python_semantics() {
        assert_eq!(slice_positions(5, None, None, 1), vec![0, 1, 2, 3, 4]);
        assert_eq!(slice_positions(5, Some(1), Some(3), 1), vec![1, 2]);
        assert_eq!(slice_positions(5, Some(-2), None, 1), vec![3, 4]);
        assert_eq!(slice_positions(5, None, Some(-1), 2), vec![0, 2]);
        assert_eq!(slice_positions(5, Some(10), None, 1), Vec::<usize>::new());
        assert_eq!(slice_positions(5, Some(-10), Some(2), 1), vec![0, 1]);
        assert_eq!(slice_positions(5, Some(3), Some(1), 1), Vec::<usize>::new());
    }

    #[test]
    fn test_empty_slice_is_index_slice() {
        assert_eq!(
            DatasetSlice::full().classify().unwrap(),
            SliceKind::Index { start: None, stop: None, stride: 1 }
        );
    }

    #[test]
    fn test_mixed_bounds_rejected() {
        let slice = DatasetSlice::new(Some(SliceBound::Index(0)), Some(SliceBound::Time(t(5))));
        assert!(matches!(slice.classify(), Err(WxError::InvalidValue(_))));
        let slice = DatasetSlice::new(Some(SliceBound::Time(t(5))), Some(SliceBound::Index(2)));
        assert!(matches!(slice.classify(), Err(WxError::InvalidValue(_))));
    }

    #[test]
    fn test_open_time_slice() {
        let slice = DatasetSlice::times(Some(t(5)), None).with_step(Step::Every(Duration::minutes(30)));
        assert_eq!(
            slice.classify().unwrap(),
            SliceKind::Time {
                start: Some(t(5)),
                stop: None,
                step: Some(Step::Every(Duration::minutes(30)))
            }
        );
    }

    #[test]
    fn test_bad_steps_rejected() {
        let every = DatasetSlice::indices(Some(0), None).with_step(Step::Every(Duration::minutes(5)));
        assert!(every.classify().is_err());
        let zero = DatasetSlice::indices(Some(0), None).with_step(Step::Stride(0));
        assert!(zero.classify().is_err());
        let negative = DatasetSlice::times(Some(t(5)), None).with_step(Step::Every(Duration::minutes(-5)));
        assert!(negative.classify().is_err());
    }
}
