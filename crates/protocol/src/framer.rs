//! Frame extraction from a fragmented byte stream.

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

use crate::{END_MARKER, START_MARKER};

/// Incremental `$...!` frame splitter.
///
/// Feed raw read chunks with [`extend`](Self::extend), then pull complete
/// frame payloads (markers excluded) with [`next_frame`](Self::next_frame)
/// until it returns `None`. Frames come out strictly in the order their
/// closing markers were observed.
///
/// Bytes preceding a start marker are treated as line noise and dropped.
/// An unterminated frame is retained until more data arrives; the stream
/// defines no marker-loss bound, so neither does the splitter.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buf: BytesMut,
}

impl FrameSplitter {
    /// Create an empty splitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw chunk from the transport.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Extract the next complete frame payload, if one is buffered.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        // Drop noise ahead of the start marker. Without any start marker
        // the whole buffer is noise.
        match self.buf.iter().position(|&b| b == START_MARKER) {
            Some(0) => {}
            Some(start) => {
                metrics::counter!("protocol_noise_bytes_total").increment(start as u64);
                self.buf.advance(start);
            }
            None => {
                if !self.buf.is_empty() {
                    metrics::counter!("protocol_noise_bytes_total")
                        .increment(self.buf.len() as u64);
                    self.buf.clear();
                }
                return None;
            }
        }

        let end = self.buf.iter().position(|&b| b == END_MARKER)?;

        let mut frame = self.buf.split_to(end + 1);
        frame.advance(1); // start marker
        frame.truncate(frame.len() - 1); // end marker

        let payload = frame.freeze();
        metrics::counter!("protocol_frames_total").increment(1);
        trace!(len = payload.len(), "frame extracted");
        Some(payload)
    }

    /// Discard all buffered bytes (used on reconnect; the splitter is not
    /// restartable mid-frame).
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Number of buffered bytes awaiting a closing marker.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn collect(splitter: &mut FrameSplitter) -> Vec<Bytes> {
        let mut frames = Vec::new();
        while let Some(frame) = splitter.next_frame() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_single_frame() {
        let mut splitter = FrameSplitter::new();
        splitter.extend(b"$HI!");
        assert_eq!(collect(&mut splitter), vec![Bytes::from_static(b"HI")]);
    }

    #[test]
    fn test_multiple_frames_per_chunk() {
        let mut splitter = FrameSplitter::new();
        splitter.extend(b"$OK G100!$S1 150!$OK R!");
        assert_eq!(
            collect(&mut splitter),
            vec![
                Bytes::from_static(b"OK G100"),
                Bytes::from_static(b"S1 150"),
                Bytes::from_static(b"OK R"),
            ]
        );
    }

    #[test]
    fn test_partial_frame_retained() {
        let mut splitter = FrameSplitter::new();
        splitter.extend(b"$OK G1");
        assert!(splitter.next_frame().is_none());
        assert!(splitter.pending() > 0);

        splitter.extend(b"00!");
        assert_eq!(collect(&mut splitter), vec![Bytes::from_static(b"OK G100")]);
    }

    #[test]
    fn test_noise_before_start_discarded() {
        let mut splitter = FrameSplitter::new();
        splitter.extend(b"\xff\x00garbage$HI!");
        assert_eq!(collect(&mut splitter), vec![Bytes::from_static(b"HI")]);
    }

    #[test]
    fn test_pure_noise_discarded() {
        let mut splitter = FrameSplitter::new();
        splitter.extend(b"no markers here");
        assert!(splitter.next_frame().is_none());
        assert_eq!(splitter.pending(), 0);
    }

    #[test]
    fn test_clear_drops_partial() {
        let mut splitter = FrameSplitter::new();
        splitter.extend(b"$OK G1");
        splitter.clear();
        splitter.extend(b"00!$HI!");
        // The stale prefix is gone; "00!" is noise before the next '$'.
        assert_eq!(collect(&mut splitter), vec![Bytes::from_static(b"HI")]);
    }

    #[test]
    fn test_chunking_invariance_byte_by_byte() {
        let stream = b"$HI!$OK G1000!$S1 1050!$S2 1100!$OK R!";

        let mut whole = FrameSplitter::new();
        whole.extend(stream);
        let expected = collect(&mut whole);

        let mut split = FrameSplitter::new();
        let mut got = Vec::new();
        for byte in stream {
            split.extend(std::slice::from_ref(byte));
            got.extend(collect(&mut split));
        }
        assert_eq!(got, expected);
    }

    #[test]
    fn test_chunking_invariance_random_splits() {
        let stream: Vec<u8> = b"noise$HI!$OK G42!junk$S1 99!$S3 120!$OK X!".to_vec();

        let mut whole = FrameSplitter::new();
        whole.extend(&stream);
        let expected = collect(&mut whole);

        let mut rng = rand::rng();
        for _ in 0..50 {
            let mut split = FrameSplitter::new();
            let mut got = Vec::new();
            let mut rest = stream.as_slice();
            while !rest.is_empty() {
                let take = rng.random_range(1..=rest.len());
                let (chunk, tail) = rest.split_at(take);
                split.extend(chunk);
                got.extend(collect(&mut split));
                rest = tail;
            }
            assert_eq!(got, expected);
        }
    }
}
