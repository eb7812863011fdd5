use serde::Serialize;

/// Where a unit sits within its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitPosition {
    Whole,
    /// `index` is 0-based.
    Chunk { index: usize, total: usize },
}

/// A window of a file's text sent to the narrative service in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisUnit<'a> {
    pub text: &'a str,
    pub position: UnitPosition,
}

/// Splits file text into fixed-size, non-overlapping windows.
///
/// Sizes are counted in characters, and every cut falls on a char boundary.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlanner {
    max_chars: usize,
}

impl ChunkPlanner {
    /// `max_chars` is clamped to at least 1.
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn plan<'a>(&self, text: &'a str) -> Vec<AnalysisUnit<'a>> {
        let len = text.chars().count();
        if len <= self.max_chars {
            return vec![AnalysisUnit {
                text,
                position: UnitPosition::Whole,
            }];
        }

        let total = len.div_ceil(self.max_chars);
        let mut cuts = text
            .char_indices()
            .map(|(offset, _)| offset)
            .step_by(self.max_chars)
            .skip(1);

        let mut units = Vec::with_capacity(total);
        let mut start = 0;
        for index in 0..total {
            let end = cuts.next().unwrap_or(text.len());
            units.push(AnalysisUnit {
                text: &text[start..end],
                position: UnitPosition::Chunk { index, total },
            });
            start = end;
        }

        units
    }
}

impl Default for ChunkPlanner {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CHUNK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(units: &[AnalysisUnit<'_>]) -> String {
        units.iter().map(|u| u.text).collect()
    }

    #[test]
    fn small_text_is_one_whole_unit() {
        let units = ChunkPlanner::new(10).plan("print(1)\n");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].position, UnitPosition::Whole);
        assert_eq!(units[0].text, "print(1)\n");
    }

    #[test]
    fn text_at_threshold_is_not_chunked() {
        let text = "x".repeat(10);
        let units = ChunkPlanner::new(10).plan(&text);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].position, UnitPosition::Whole);
    }

    #[test]
    fn empty_text_is_one_whole_unit() {
        let units = ChunkPlanner::new(10).plan("");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "");
    }

    #[test]
    fn large_text_splits_into_ceil_windows() {
        let text = "a".repeat(20_000);
        let units = ChunkPlanner::default().plan(&text);

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].text.len(), 15_000);
        assert_eq!(units[1].text.len(), 5_000);
        assert_eq!(units[0].position, UnitPosition::Chunk { index: 0, total: 2 });
        assert_eq!(units[1].position, UnitPosition::Chunk { index: 1, total: 2 });
        assert_eq!(rejoin(&units), text);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let text = "b".repeat(30);
        let units = ChunkPlanner::new(10).plan(&text);
        assert_eq!(units.len(), 3);
        assert!(units.iter().all(|u| u.text.len() == 10));
    }

    #[test]
    fn windows_count_characters_not_bytes() {
        let text = "é".repeat(7) + "日本語";
        let units = ChunkPlanner::new(4).plan(&text);

        assert_eq!(units.len(), 3);
        assert_eq!(units[0].text.chars().count(), 4);
        assert_eq!(units[1].text.chars().count(), 4);
        assert_eq!(units[2].text.chars().count(), 2);
        assert_eq!(rejoin(&units), text);
    }

    #[test]
    fn concatenation_reproduces_input_for_many_sizes() {
        let text: String = (0..997).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        for max in [1, 2, 3, 7, 100, 996, 997, 998] {
            let units = ChunkPlanner::new(max).plan(&text);
            let expected = if text.len() <= max { 1 } else { text.len().div_ceil(max) };
            assert_eq!(units.len(), expected, "max = {max}");
            assert_eq!(rejoin(&units), text, "max = {max}");
        }
    }

    #[test]
    fn zero_threshold_is_clamped() {
        assert_eq!(ChunkPlanner::new(0).max_chars(), 1);
    }
}
