/// A source location: byte offset range into the program text.
///
/// Compilation is strictly single-unit (one program per translation), so a
/// span is just the half-open byte range of the command it points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Span of the single byte at `offset`.
    pub fn at(offset: usize) -> Self {
        Self {
            start: offset as u32,
            end: offset as u32 + 1,
        }
    }

    /// Empty span for errors with no source position.
    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }
}

/// A value annotated with its source span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_covers_one_byte() {
        let s = Span::at(7);
        assert_eq!(s.start, 7);
        assert_eq!(s.end, 8);
    }
}
