//! Conversion segments: the unit of data exchanged between the composer,
//! converter and predictors.
//!
//! A `Segments` holds zero or more leading history segments (already
//! committed context) followed by conversion segments (the text being
//! converted). Predictors append `Candidate`s to the first conversion
//! segment.

/// Who produced a candidate. The predictor marks its own output so a
/// later revert or deletion can find history-born candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateSource {
    #[default]
    Unknown,
    UserHistoryPredictor,
}

#[derive(Debug, Clone, Default)]
pub struct Candidate {
    /// Reading of the candidate.
    pub key: String,
    /// Surface string.
    pub value: String,
    /// Annotation shown next to the candidate, e.g. a correction hint.
    pub description: String,
    pub source: CandidateSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentType {
    /// Boundary may still move.
    #[default]
    Free,
    /// Boundary fixed by the user.
    Fixed,
    /// Already committed; provides context only.
    History,
}

#[derive(Debug, Clone, Default)]
pub struct Segment {
    pub segment_type: SegmentType,
    /// Reading of the segment.
    pub key: String,
    candidates: Vec<Candidate>,
}

impl Segment {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    pub fn candidates_size(&self) -> usize {
        self.candidates.len()
    }

    pub fn candidate(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn add_candidate(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn clear_candidates(&mut self) {
        self.candidates.clear();
    }

    /// The committed surface of a history segment: its top candidate, or
    /// the key itself when no candidate was attached.
    pub fn committed_value(&self) -> &str {
        self.candidates
            .first()
            .map(|c| c.value.as_str())
            .unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Segments {
    segments: Vec<Segment>,
}

impl Segments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn segments_size(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn mut_segment(&mut self, index: usize) -> Option<&mut Segment> {
        self.segments.get_mut(index)
    }

    pub fn add_segment(&mut self, key: &str) -> &mut Segment {
        self.segments.push(Segment::new(key));
        // Just pushed, so the vec is non-empty.
        self.segments.last_mut().unwrap_or_else(|| unreachable!())
    }

    pub fn add_history_segment(&mut self, key: &str, value: &str) -> &mut Segment {
        let mut segment = Segment::new(key);
        segment.segment_type = SegmentType::History;
        segment.add_candidate(Candidate {
            key: key.to_string(),
            value: value.to_string(),
            ..Candidate::default()
        });
        self.segments.push(segment);
        self.segments.last_mut().unwrap_or_else(|| unreachable!())
    }

    fn history_len(&self) -> usize {
        self.segments
            .iter()
            .take_while(|s| s.segment_type == SegmentType::History)
            .count()
    }

    /// Leading committed-context segments.
    pub fn history_segments(&self) -> &[Segment] {
        &self.segments[..self.history_len()]
    }

    /// Segments still being converted.
    pub fn conversion_segments(&self) -> &[Segment] {
        &self.segments[self.history_len()..]
    }

    pub fn mut_conversion_segments(&mut self) -> &mut [Segment] {
        let start = self.history_len();
        &mut self.segments[start..]
    }

    pub fn conversion_segments_size(&self) -> usize {
        self.segments_size() - self.history_len()
    }
}
