//! Chunked data regions and host addressing
//!
//! A data stream longer than the host's maximum list length is split into
//! `CHUNK`-sized lists. The host reads element `i` of the region (1-based)
//! through two helpers:
//!
//! - the array selector picks chunk `floor(i / CHUNK)`, falling through to
//!   the last chunk for any other value;
//! - the index corrector maps `i` to `1 + ((i - 1) mod CHUNK)` with a
//!   floored modulo.
//!
//! Both are reproduced exactly, including at chunk boundaries where the two
//! disagree (`i = CHUNK` selects chunk 1 but offset `CHUNK`).

use crate::codec::Word;
use serde::Serialize;

/// Location of a host read: chunk number and 1-based offset inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkAddress {
    pub chunk: usize,
    pub offset: usize,
}

/// A word region split across fixed-capacity host lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkedData {
    chunk_size: usize,
    chunks: Vec<Vec<Word>>,
}

impl ChunkedData {
    /// Split `stream` into exactly `num_chunks` lists of `chunk_size` words,
    /// zero-padding the tail
    ///
    /// `num_chunks` is raised to the number of chunks `stream` needs.
    pub fn from_stream(stream: &[Word], chunk_size: usize, num_chunks: usize) -> Self {
        let num_chunks = num_chunks.max(stream.len().div_ceil(chunk_size)).max(1);
        let chunks = (0..num_chunks)
            .map(|i| {
                let start = (i * chunk_size).min(stream.len());
                let end = ((i + 1) * chunk_size).min(stream.len());
                let mut chunk = stream[start..end].to_vec();
                chunk.resize(chunk_size, 0);
                chunk
            })
            .collect();

        ChunkedData { chunk_size, chunks }
    }

    /// `num_chunks` empty lists, to be filled by the host at run time
    pub fn unpopulated(chunk_size: usize, num_chunks: usize) -> Self {
        ChunkedData {
            chunk_size,
            chunks: vec![Vec::new(); num_chunks.max(1)],
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[Vec<Word>] {
        &self.chunks
    }

    /// Chunk the host's array selector returns for `index`
    pub fn select_chunk(&self, index: i64) -> usize {
        let last = self.chunks.len() - 1;
        if last == 0 {
            return 0;
        }
        let array_num = index.div_euclid(self.chunk_size as i64);
        if (0..last as i64).contains(&array_num) {
            array_num as usize
        } else {
            last
        }
    }

    /// 1-based offset the host's index corrector returns for `index`
    pub fn host_offset(&self, index: i64) -> usize {
        1 + (index - 1).rem_euclid(self.chunk_size as i64) as usize
    }

    /// Where the host's read accessor looks for `index`
    pub fn address(&self, index: i64) -> ChunkAddress {
        ChunkAddress {
            chunk: self.select_chunk(index),
            offset: self.host_offset(index),
        }
    }

    /// Value the host's read accessor returns for `index`
    ///
    /// `None` when the addressed list element does not exist.
    pub fn read(&self, index: i64) -> Option<Word> {
        let address = self.address(index);
        self.chunks[address.chunk].get(address.offset - 1).copied()
    }

    /// Word at 0-based position `position` of the concatenated stream
    pub fn word(&self, position: usize) -> Option<Word> {
        self.chunks
            .get(position / self.chunk_size)
            .and_then(|chunk| chunk.get(position % self.chunk_size))
            .copied()
    }

    /// Contiguous words `start..start + len` of the concatenated stream
    pub fn words(&self, start: usize, len: usize) -> Option<Vec<Word>> {
        (start..start + len).map(|p| self.word(p)).collect()
    }
}

/// Named sizing constants exported alongside a layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutConstants {
    pub word_width: usize,
    pub chunk_size: usize,
    pub num_chunks: usize,
    /// Only disks store file names
    pub header_name_size: Option<usize>,
    pub header_blocks_size: usize,
    pub header_size: usize,
    pub block_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stream_pads_and_splits() {
        let stream: Vec<Word> = (1..=25).collect();
        let data = ChunkedData::from_stream(&stream, 10, 1);

        assert_eq!(data.num_chunks(), 3);
        assert!(data.chunks().iter().all(|c| c.len() == 10));
        assert_eq!(data.chunks()[2][4], 25);
        assert_eq!(data.chunks()[2][5], 0);
    }

    #[test]
    fn test_from_stream_honors_requested_chunks() {
        let data = ChunkedData::from_stream(&[7], 10, 4);
        assert_eq!(data.num_chunks(), 4);
        assert_eq!(data.word(0), Some(7));
        assert_eq!(data.word(39), Some(0));
        assert_eq!(data.word(40), None);
    }

    #[test]
    fn test_empty_stream_has_one_chunk() {
        let data = ChunkedData::from_stream(&[], 10, 0);
        assert_eq!(data.num_chunks(), 1);
        assert_eq!(data.chunks()[0], vec![0; 10]);
    }

    #[test]
    fn test_single_chunk_always_selected() {
        let data = ChunkedData::from_stream(&[1, 2, 3], 10, 1);
        assert_eq!(data.select_chunk(1), 0);
        assert_eq!(data.select_chunk(500), 0);
        assert_eq!(data.read(2), Some(2));
    }

    #[test]
    fn test_host_addressing_is_one_based() {
        let stream: Vec<Word> = (1..=30).collect();
        let data = ChunkedData::from_stream(&stream, 10, 3);

        assert_eq!(data.address(1), ChunkAddress { chunk: 0, offset: 1 });
        assert_eq!(data.read(1), Some(1));
        assert_eq!(data.read(9), Some(9));
        assert_eq!(data.address(11), ChunkAddress { chunk: 1, offset: 1 });
        assert_eq!(data.read(11), Some(11));
    }

    #[test]
    fn test_host_addressing_boundary_quirk() {
        let stream: Vec<Word> = (1..=30).collect();
        let data = ChunkedData::from_stream(&stream, 10, 3);

        // The selector moves to chunk 1 at i = 10 while the corrector still
        // points at the last slot, so the host reads element 20.
        assert_eq!(data.address(10), ChunkAddress { chunk: 1, offset: 10 });
        assert_eq!(data.read(10), Some(20));

        // Index 0 wraps to the last slot of chunk 0
        assert_eq!(data.address(0), ChunkAddress { chunk: 0, offset: 10 });
    }

    #[test]
    fn test_selector_falls_through_to_last_chunk() {
        let data = ChunkedData::from_stream(&[], 10, 3);
        assert_eq!(data.select_chunk(25), 2);
        assert_eq!(data.select_chunk(1_000), 2);
        assert_eq!(data.select_chunk(-5), 2);
    }

    #[test]
    fn test_unpopulated_reads_nothing() {
        let data = ChunkedData::unpopulated(10, 2);
        assert_eq!(data.num_chunks(), 2);
        assert_eq!(data.read(1), None);
        assert_eq!(data.word(0), None);
    }

    #[test]
    fn test_words_range() {
        let stream: Vec<Word> = (1..=15).collect();
        let data = ChunkedData::from_stream(&stream, 10, 1);
        assert_eq!(data.words(8, 4), Some(vec![9, 10, 11, 12]));
        assert_eq!(data.words(18, 4), None);
    }
}
