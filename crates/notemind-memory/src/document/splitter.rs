//! Overlapping, boundary-aware text chunker.
//!
//! A cursor walks the text left to right. Each chunk is at most
//! `max_chunk_size` bytes; when a chunk is not the last one, its end is pulled
//! back to the nearest paragraph break, sentence end or whitespace found in a
//! short window before the hard limit. The next chunk restarts `overlap_size`
//! bytes before the previous end. Offsets are byte offsets into the source and
//! always fall on `char` boundaries.

use serde::{Deserialize, Serialize};

use super::types::Chunk;

/// Upper bound on how far back from the hard limit a break point is searched.
const MAX_SEARCH_WINDOW: usize = 200;
/// Break-point search never shrinks a chunk below this many bytes.
const MIN_CHUNK_BEFORE_BREAK: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub max_chunk_size: usize,
    pub overlap_size: usize,
    pub preserve_paragraphs: bool,
    pub preserve_sentences: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            overlap_size: 100,
            preserve_paragraphs: true,
            preserve_sentences: true,
        }
    }
}

impl SplitterConfig {
    /// Clamp to `max_chunk_size >= 1` and `overlap_size < max_chunk_size`.
    #[must_use]
    pub fn clamped(self) -> Self {
        let max_chunk_size = self.max_chunk_size.max(1);
        Self {
            max_chunk_size,
            overlap_size: self.overlap_size.min(max_chunk_size - 1),
            ..self
        }
    }

    fn search_window(&self) -> usize {
        MAX_SEARCH_WINDOW.min(self.max_chunk_size / 5)
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(SplitterConfig::default())
    }
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self {
            config: config.clamped(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split `text` into chunks. Always returns at least one chunk.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        self.chunks(text).collect()
    }

    /// Lazily yield the chunks of `text`.
    #[must_use]
    pub fn chunks<'a>(&self, text: &'a str) -> ChunkIter<'a> {
        ChunkIter {
            text,
            config: self.config,
            start: 0,
            next_index: 0,
            done: false,
        }
    }
}

/// Split `text` with `config`, clamping pathological option values.
#[must_use]
pub fn chunk_text(text: &str, config: &SplitterConfig) -> Vec<Chunk> {
    TextSplitter::new(*config).split(text)
}

/// Rejoin chunk contents in `chunk_index` order, separated by blank lines.
#[must_use]
pub fn combine_chunks(chunks: &[Chunk]) -> String {
    let mut ordered: Vec<&Chunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.chunk_index);
    ordered
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Iterator returned by [`TextSplitter::chunks`].
#[derive(Debug, Clone)]
pub struct ChunkIter<'a> {
    text: &'a str,
    config: SplitterConfig,
    start: usize,
    next_index: usize,
    done: bool,
}

impl ChunkIter<'_> {
    /// End offset of the chunk starting at `start`.
    fn cut_point(&self, start: usize) -> usize {
        let len = self.text.len();
        let tentative = start.saturating_add(self.config.max_chunk_size);
        if tentative >= len {
            return len;
        }

        let end = floor_char_boundary(self.text, tentative);
        if end <= start {
            // A single character is wider than the whole chunk budget.
            return ceil_char_boundary(self.text, start + 1);
        }

        let floor = end
            .saturating_sub(self.config.search_window())
            .max(start + MIN_CHUNK_BEFORE_BREAK);
        find_break(self.text.as_bytes(), floor, end, &self.config).unwrap_or(end)
    }
}

impl Iterator for ChunkIter<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }

        let text = self.text;
        let len = text.len();
        if len <= self.config.max_chunk_size {
            self.done = true;
            return Some(Chunk {
                content: text.to_owned(),
                start_index: 0,
                end_index: len,
                chunk_index: 0,
            });
        }

        while self.start < len {
            let start = self.start;
            let end = self.cut_point(start);
            let content = text[start..end].trim();

            if end >= len {
                self.done = true;
            } else {
                let restart = end
                    .saturating_sub(self.config.overlap_size)
                    .max(start + 1);
                self.start = ceil_char_boundary(text, restart);
            }

            if !content.is_empty() {
                let chunk = Chunk {
                    content: content.to_owned(),
                    start_index: start,
                    end_index: end,
                    chunk_index: self.next_index,
                };
                self.next_index += 1;
                return Some(chunk);
            }
            tracing::trace!(start, end, "dropping whitespace-only chunk");
            if self.done {
                return None;
            }
        }

        self.done = true;
        None
    }
}

/// Best break position in `[floor, end)`, scanning backwards from `end`.
///
/// Paragraph breaks win over sentence ends, which win over plain whitespace;
/// each kind is searched across the whole window before falling back.
fn find_break(bytes: &[u8], floor: usize, end: usize, config: &SplitterConfig) -> Option<usize> {
    if floor >= end {
        return None;
    }
    let window = || (floor..end).rev();
    let next_is = |i: usize, b: u8| bytes.get(i + 1) == Some(&b);

    if config.preserve_paragraphs
        && let Some(i) = window().find(|&i| bytes[i] == b'\n' && next_is(i, b'\n'))
    {
        return Some(i + 1);
    }
    if config.preserve_sentences
        && let Some(i) = window().find(|&i| matches!(bytes[i], b'.' | b'!' | b'?') && next_is(i, b' '))
    {
        return Some(i + 1);
    }
    window().find(|&i| bytes[i].is_ascii_whitespace())
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (index..s.len())
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_chunk_size: usize, overlap_size: usize) -> SplitterConfig {
        SplitterConfig {
            max_chunk_size,
            overlap_size,
            ..SplitterConfig::default()
        }
    }

    #[test]
    fn empty_text_yields_one_empty_chunk() {
        let chunks = chunk_text("", &SplitterConfig::default());
        assert_eq!(
            chunks,
            vec![Chunk {
                content: String::new(),
                start_index: 0,
                end_index: 0,
                chunk_index: 0,
            }]
        );
    }

    #[test]
    fn short_text_is_returned_untrimmed() {
        let text = "  Hello world.  ";
        let chunks = chunk_text(text, &SplitterConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
        assert_eq!(chunks[0].end_index, text.len());
    }

    #[test]
    fn text_exactly_at_limit_is_single_chunk() {
        let text = "x".repeat(1000);
        let chunks = chunk_text(&text, &SplitterConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].end_index, 1000);
    }

    #[test]
    fn hard_cuts_without_whitespace() {
        let text = "A".repeat(2500);
        let chunks = chunk_text(&text, &SplitterConfig::default());
        let ranges: Vec<_> = chunks.iter().map(|c| (c.start_index, c.end_index)).collect();
        assert_eq!(ranges, vec![(0, 1000), (900, 1900), (1800, 2500)]);
        for c in &chunks {
            assert!(c.content.len() <= 1000);
        }
        let combined = combine_chunks(&chunks);
        assert_eq!(combined.matches('A').count(), 1000 + 1000 + 700);
    }

    #[test]
    fn consecutive_chunks_overlap_by_configured_amount() {
        let text = "A".repeat(2500);
        let chunks = chunk_text(&text, &SplitterConfig::default());
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end_index - pair[1].start_index, 100);
        }
    }

    #[test]
    fn breaks_at_paragraph_boundary() {
        let text = format!("{}\n\n{}", "a".repeat(950), "b".repeat(500));
        let chunks = chunk_text(&text, &SplitterConfig::default());
        assert_eq!(chunks[0].end_index, 951);
        assert_eq!(chunks[0].content, "a".repeat(950));
        assert_eq!(chunks[1].start_index, 851);
        assert!(chunks.last().unwrap().content.ends_with('b'));
    }

    #[test]
    fn paragraph_preferred_over_later_sentence() {
        let text = format!("{}\n\n{}. {}", "p".repeat(850), "q".repeat(50), "r".repeat(600));
        let chunks = chunk_text(&text, &SplitterConfig::default());
        assert_eq!(chunks[0].end_index, 851);

        let no_paragraphs = SplitterConfig {
            preserve_paragraphs: false,
            ..SplitterConfig::default()
        };
        let chunks = chunk_text(&text, &no_paragraphs);
        assert_eq!(chunks[0].end_index, 903);
        assert!(chunks[0].content.ends_with("q."));
    }

    #[test]
    fn sentence_preferred_over_later_whitespace() {
        let text = format!("{}. {} {}", "x".repeat(900), "y".repeat(50), "z".repeat(600));
        let chunks = chunk_text(&text, &SplitterConfig::default());
        assert_eq!(chunks[0].end_index, 901);
        assert!(chunks[0].content.ends_with('.'));

        let words_only = SplitterConfig {
            preserve_paragraphs: false,
            preserve_sentences: false,
            ..SplitterConfig::default()
        };
        let chunks = chunk_text(&text, &words_only);
        assert_eq!(chunks[0].end_index, 952);
    }

    #[test]
    fn tabs_and_carriage_returns_are_break_points() {
        for sep in ['\t', '\r'] {
            let text = format!("{}{sep}{}", "x".repeat(900), "y".repeat(600));
            let chunks = chunk_text(&text, &SplitterConfig::default());
            assert_eq!(chunks[0].end_index, 900, "separator {sep:?}");
            assert_eq!(chunks[0].content, "x".repeat(900));
        }
    }

    #[test]
    fn question_and_exclamation_end_sentences() {
        for terminator in ['?', '!'] {
            let text = format!("{}{terminator} {}", "w".repeat(900), "v".repeat(600));
            let chunks = chunk_text(&text, &SplitterConfig::default());
            assert_eq!(chunks[0].end_index, 901, "terminator {terminator}");
        }
    }

    #[test]
    fn break_outside_window_is_ignored() {
        let text = format!("{}\n\n{}", "a".repeat(700), "b".repeat(1000));
        let chunks = chunk_text(&text, &SplitterConfig::default());
        assert_eq!(chunks[0].end_index, 1000);
    }

    #[test]
    fn search_never_goes_below_minimum_chunk() {
        // window = min(200, 110 / 5) = 22 would reach back to 88; floor is start + 100
        let text = format!("{} {}", "a".repeat(95), "b".repeat(400));
        let chunks = chunk_text(&text, &config(110, 0));
        assert_eq!(chunks[0].end_index, 110);
    }

    #[test]
    fn whitespace_only_segments_are_dropped_without_index_gaps() {
        let text = format!("{}{}{}", "a".repeat(10), " ".repeat(30), "b".repeat(10));
        let chunks = chunk_text(&text, &config(10, 0));
        let contents: Vec<_> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["a".repeat(10), "b".repeat(10)]);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[1].start_index, 40);
    }

    #[test]
    fn overlap_larger_than_chunk_terminates() {
        let text = "q".repeat(100);
        let chunks = chunk_text(&text, &config(10, 50));
        assert!(!chunks.is_empty());
        assert_eq!(chunks.last().unwrap().end_index, 100);
        for pair in chunks.windows(2) {
            assert!(pair[1].start_index > pair[0].start_index);
        }
    }

    #[test]
    fn zero_max_chunk_size_is_clamped() {
        let chunks = chunk_text("abc", &config(0, 0));
        let contents: Vec<_> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[test]
    fn clamped_config() {
        let c = config(0, 10).clamped();
        assert_eq!(c.max_chunk_size, 1);
        assert_eq!(c.overlap_size, 0);
        let c = config(50, 80).clamped();
        assert_eq!(c.overlap_size, 49);

        let splitter = TextSplitter::new(config(0, 10));
        assert_eq!(splitter.config().max_chunk_size, 1);
        assert_eq!(splitter.config().overlap_size, 0);
    }

    #[test]
    fn multibyte_text_cuts_on_char_boundaries() {
        let text = "日".repeat(400);
        let chunks = chunk_text(&text, &SplitterConfig::default());
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(text.is_char_boundary(c.start_index));
            assert!(text.is_char_boundary(c.end_index));
            assert!(c.end_index - c.start_index <= 1000);
            assert!(c.content.chars().all(|ch| ch == '日'));
        }
    }

    #[test]
    fn wide_char_larger_than_budget_still_progresses() {
        let chunks = chunk_text("日本語", &config(2, 0));
        let contents: Vec<_> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["日", "本", "語"]);
    }

    #[test]
    fn lazy_iterator_matches_split() {
        let text = "Sentence one. Sentence two! ".repeat(120);
        let splitter = TextSplitter::default();
        let eager = splitter.split(&text);
        let lazy: Vec<_> = splitter.chunks(&text).collect();
        assert_eq!(eager, lazy);
        let mut iter = splitter.chunks(&text);
        for _ in iter.by_ref() {}
        assert!(iter.next().is_none());
    }

    #[test]
    fn partial_config_deserializes_over_defaults() {
        let c: SplitterConfig = serde_json::from_str(r#"{"max_chunk_size": 500}"#).unwrap();
        assert_eq!(c.max_chunk_size, 500);
        assert_eq!(c.overlap_size, 100);
        assert!(c.preserve_paragraphs);
        assert!(c.preserve_sentences);
    }

    #[test]
    fn combine_sorts_by_index() {
        let chunks = vec![
            Chunk {
                content: "second".into(),
                start_index: 5,
                end_index: 11,
                chunk_index: 1,
            },
            Chunk {
                content: "first".into(),
                start_index: 0,
                end_index: 5,
                chunk_index: 0,
            },
        ];
        assert_eq!(combine_chunks(&chunks), "first\n\nsecond");
    }

    mod proptest_splitter {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(500))]

            #[test]
            fn split_terminates_and_never_panics(
                content in "\\PC{0,3000}",
                max_chunk_size in 0usize..1500,
                overlap_size in 0usize..2000,
                preserve_paragraphs in proptest::bool::ANY,
                preserve_sentences in proptest::bool::ANY,
            ) {
                let cfg = SplitterConfig {
                    max_chunk_size,
                    overlap_size,
                    preserve_paragraphs,
                    preserve_sentences,
                };
                let chunks = chunk_text(&content, &cfg);
                prop_assert!(!chunks.is_empty());
            }

            #[test]
            fn offsets_valid_and_indices_sequential(
                content in "[a-z .!?\n]{0,4000}",
                max_chunk_size in 1usize..1200,
                overlap_size in 0usize..300,
            ) {
                let chunks = chunk_text(&content, &config(max_chunk_size, overlap_size));
                for (i, c) in chunks.iter().enumerate() {
                    prop_assert_eq!(c.chunk_index, i);
                    prop_assert!(c.end_index <= content.len());
                    prop_assert!(c.start_index <= c.end_index);
                    prop_assert!(c.end_index - c.start_index <= max_chunk_size.max(1));
                    prop_assert_eq!(c.content.trim(), content[c.start_index..c.end_index].trim());
                }
                for pair in chunks.windows(2) {
                    prop_assert!(pair[1].start_index > pair[0].start_index);
                }
            }

            #[test]
            fn every_non_whitespace_byte_is_covered(
                content in "[a-z .\n]{0,3000}",
                max_chunk_size in 1usize..800,
                overlap_size in 0usize..200,
            ) {
                let chunks = chunk_text(&content, &config(max_chunk_size, overlap_size));
                for (i, b) in content.bytes().enumerate() {
                    if b.is_ascii_whitespace() {
                        continue;
                    }
                    prop_assert!(
                        chunks.iter().any(|c| c.start_index <= i && i < c.end_index),
                        "byte {} not covered", i
                    );
                }
            }
        }
    }
}
