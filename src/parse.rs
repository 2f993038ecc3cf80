/// Where the parser is within the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Accumulating digits of the integer part.
    Integer,
    /// Past the decimal separator; holds the position of the next fractional digit.
    Fraction(u32),
    /// The line cannot be a number; skip bytes until the next newline.
    Poisoned,
}

/// Suspendable decimal-number parser for a fragmented byte stream.
///
/// A benchmark child writes newline-terminated numbers interleaved with
/// arbitrary text, and the reader hands over whatever chunk sizes the pipe
/// yields — a number or its terminator may be split across any boundary.
/// All progress (accumulated value, fractional position, poison flag)
/// therefore lives in the parser and survives between `push` calls.
#[derive(Debug)]
pub struct MetricParser {
    value: f64,
    state: State,
}

impl MetricParser {
    pub fn new() -> Self {
        MetricParser {
            value: 0.0,
            state: State::Integer,
        }
    }

    /// Feed one chunk of bytes.
    ///
    /// Returns `Some(i)` where `i` is the in-chunk index of the byte after
    /// the terminating newline (`i == chunk.len()` when the newline is the
    /// chunk's last byte), or `None` when the chunk ran out before a newline.
    /// After `Some`, call `reset` to take the value, then `push` the
    /// remainder `&chunk[i..]` — a single chunk can hold several lines.
    pub fn push(&mut self, chunk: &[u8]) -> Option<usize> {
        for (i, &byte) in chunk.iter().enumerate() {
            if byte == b'\n' {
                return Some(i + 1);
            }
            self.state = match self.state {
                State::Poisoned => State::Poisoned,
                State::Integer => match byte {
                    b'0'..=b'9' => {
                        self.value = self.value * 10.0 + f64::from(byte - b'0');
                        State::Integer
                    }
                    b'.' | b',' => State::Fraction(1),
                    _ => State::Poisoned,
                },
                State::Fraction(pos) => match byte {
                    b'0'..=b'9' => {
                        let mut n = f64::from(byte - b'0');
                        for _ in 0..pos {
                            n /= 10.0;
                        }
                        self.value += n;
                        State::Fraction(pos + 1)
                    }
                    // A second separator poisons the line.
                    _ => State::Poisoned,
                },
            };
        }
        None
    }

    /// Take the value of the line just terminated and clear all state.
    ///
    /// Returns `None` for a poisoned line — callers must not confuse that
    /// with a line that genuinely read `0`.
    pub fn reset(&mut self) -> Option<f64> {
        let out = match self.state {
            State::Poisoned => None,
            _ => Some(self.value),
        };
        self.value = 0.0;
        self.state = State::Integer;
        out
    }
}

impl Default for MetricParser {
    fn default() -> Self {
        Self::new()
    }
}
