//! Growable buffer with inline storage and heap fallback
//!
//! [`GrowableBuffer`] is what a pattern renders into. Short log lines never
//! touch the allocator: the first `N` elements live inline. The first time
//! the contents outgrow the inline array the buffer moves to a heap block and
//! stays there for the rest of its life, even if it is cleared.
//!
//! Growth on overflow targets `max(1.5 * capacity, requested)`, capped at the
//! largest allocation the element type allows. When the cap is below the exact
//! request, the exact request is used and the allocator reports the failure.

use super::codepoints::CodeUnit;
use smallvec::SmallVec;
use std::fmt;
use std::ops::{Deref, DerefMut, Range};

/// Default inline capacity used by the destinations in this crate.
pub const DEFAULT_INLINE_CAPACITY: usize = 256;

/// A resizable contiguous store with `N` elements of inline storage.
///
/// # Example
///
/// ```
/// use pattern_sink_logger::text::GrowableBuffer;
///
/// let mut buf: GrowableBuffer<u8, 8> = GrowableBuffer::new();
/// buf.append(b"abc");
/// assert!(buf.is_inline());
///
/// buf.append(b"defghijk");
/// assert!(!buf.is_inline());
/// assert_eq!(&buf[..], b"abcdefghijk");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct GrowableBuffer<T: Copy + Default, const N: usize> {
    data: SmallVec<[T; N]>,
}

impl<T: Copy + Default, const N: usize> GrowableBuffer<T, N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: SmallVec::new(),
        }
    }

    /// Number of elements in use.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Elements the buffer can hold before it has to grow.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// `true` until the first overflow moves the contents to the heap.
    #[inline]
    pub fn is_inline(&self) -> bool {
        !self.data.spilled()
    }

    /// Largest capacity the allocator can be asked for with this element type.
    #[inline]
    pub fn max_capacity() -> usize {
        isize::MAX as usize / std::mem::size_of::<T>().max(1)
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.as_mut_slice()
    }

    /// Append a run of elements.
    pub fn append(&mut self, items: &[T]) {
        self.grow_to(self.data.len().saturating_add(items.len()));
        self.data.extend_from_slice(items);
    }

    /// Append a single element.
    #[inline]
    pub fn push_back(&mut self, item: T) {
        self.grow_to(self.data.len().saturating_add(1));
        self.data.push(item);
    }

    /// Make room for at least `capacity` elements in total.
    pub fn reserve(&mut self, capacity: usize) {
        self.grow_to(capacity);
    }

    /// Set the length to `len`, filling new slots with `T::default()`.
    pub fn resize(&mut self, len: usize) {
        self.grow_to(len);
        self.data.resize(len, T::default());
    }

    /// Drop the contents. Heap storage, once acquired, is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Append a copy of `src`, a range of already-written elements.
    ///
    /// # Panics
    ///
    /// Panics if `src` is out of bounds.
    pub fn extend_from_within(&mut self, src: Range<usize>) {
        assert!(
            src.start <= src.end && src.end <= self.data.len(),
            "range {:?} out of bounds for buffer of length {}",
            src,
            self.data.len()
        );
        let dest = self.data.len();
        let count = src.end - src.start;
        self.grow_to(dest + count);
        self.data.resize(dest + count, T::default());
        self.data.copy_within(src, dest);
    }

    /// Move the contents out, leaving this buffer empty and inline again.
    ///
    /// Inline contents are copied into the returned buffer; a heap block is
    /// handed over without copying.
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    fn grow_to(&mut self, required: usize) {
        let capacity = self.data.capacity();
        if required <= capacity {
            return;
        }

        let mut target = capacity
            .saturating_add(capacity / 2)
            .max(required)
            .min(Self::max_capacity());
        if target < required {
            target = required;
        }
        self.data.reserve_exact(target - self.data.len());
    }
}

impl<T: CodeUnit, const N: usize> GrowableBuffer<T, N> {
    /// Transcode UTF-8 text into this buffer's encoding and append it.
    ///
    /// Room for the whole transcoded text is reserved before the first unit
    /// is written.
    pub fn append_str(&mut self, text: &str) {
        let units = T::encoded_len(text);
        self.grow_to(self.data.len().saturating_add(units));
        T::encode(text, &mut self.data);
    }

    /// Unicode scalar values currently stored.
    pub fn codepoints(&self) -> usize {
        T::count_codepoints(&self.data)
    }
}

impl<T: Copy + Default, const N: usize> Default for GrowableBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> Deref for GrowableBuffer<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy + Default, const N: usize> DerefMut for GrowableBuffer<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Copy + Default + fmt::Debug, const N: usize> fmt::Debug for GrowableBuffer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("inline", &self.is_inline())
            .field("data", &self.as_slice())
            .finish()
    }
}

impl<T: CodeUnit, const N: usize> fmt::Write for GrowableBuffer<T, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append_str(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn test_starts_inline() {
        let buf: GrowableBuffer<u8, 16> = GrowableBuffer::new();
        assert!(buf.is_inline());
        assert_eq!(buf.capacity(), 16);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_spill_grows_by_half() {
        let mut buf: GrowableBuffer<u8, 16> = GrowableBuffer::new();
        buf.append(&[1; 16]);
        assert!(buf.is_inline());

        buf.push_back(2);
        assert!(!buf.is_inline());
        assert_eq!(buf.capacity(), 24);
        assert_eq!(buf.len(), 17);
        assert_eq!(buf[16], 2);
    }

    #[test]
    fn test_large_append_uses_exact_request() {
        let mut buf: GrowableBuffer<u8, 16> = GrowableBuffer::new();
        buf.append(&[7; 1000]);
        assert_eq!(buf.capacity(), 1000);
        assert_eq!(buf.len(), 1000);
    }

    #[test]
    fn test_heap_is_kept_after_clear() {
        let mut buf: GrowableBuffer<u8, 4> = GrowableBuffer::new();
        buf.append(b"overflowing");
        buf.clear();
        assert!(!buf.is_inline());
        buf.append(b"ab");
        assert!(!buf.is_inline());
        assert_eq!(&buf[..], b"ab");
    }

    #[test]
    fn test_reserve_and_resize() {
        let mut buf: GrowableBuffer<u16, 8> = GrowableBuffer::new();
        buf.reserve(4);
        assert!(buf.is_inline());

        buf.reserve(100);
        assert!(buf.capacity() >= 100);

        buf.resize(5);
        assert_eq!(buf.as_slice(), &[0, 0, 0, 0, 0]);
        buf.resize(2);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_take_inline_copies_and_resets() {
        let mut source: GrowableBuffer<u8, 16> = GrowableBuffer::new();
        source.append(b"short");

        let moved = source.take();
        assert_eq!(&moved[..], b"short");
        assert!(moved.is_inline());
        assert!(source.is_empty());
        assert!(source.is_inline());
    }

    #[test]
    fn test_take_heap_adopts_block() {
        let mut source: GrowableBuffer<u8, 4> = GrowableBuffer::new();
        source.append(b"much longer than four");
        let capacity = source.capacity();

        let moved = source.take();
        assert!(!moved.is_inline());
        assert_eq!(moved.capacity(), capacity);
        assert_eq!(&moved[..], b"much longer than four");

        assert!(source.is_inline());
        assert_eq!(source.capacity(), 4);
        assert!(source.is_empty());
    }

    #[test]
    fn test_extend_from_within() {
        let mut buf: GrowableBuffer<u8, 4> = GrowableBuffer::new();
        buf.append(b"ab");
        buf.extend_from_within(0..2);
        buf.extend_from_within(0..4);
        assert_eq!(&buf[..], b"abababab");
    }

    #[test]
    #[should_panic]
    fn test_extend_from_within_out_of_bounds() {
        let mut buf: GrowableBuffer<u8, 4> = GrowableBuffer::new();
        buf.append(b"ab");
        buf.extend_from_within(1..3);
    }

    #[test]
    fn test_fmt_write_transcodes() {
        let mut narrow: GrowableBuffer<u8, 32> = GrowableBuffer::new();
        write!(narrow, "x={} ü", 42).unwrap();
        assert_eq!(&narrow[..], "x=42 ü".as_bytes());
        assert_eq!(narrow.codepoints(), 6);

        let mut wide: GrowableBuffer<u16, 32> = GrowableBuffer::new();
        write!(wide, "x={} 😀", 7).unwrap();
        let expected: Vec<u16> = "x=7 😀".encode_utf16().collect();
        assert_eq!(wide.as_slice(), expected.as_slice());
        assert_eq!(wide.codepoints(), 5);
    }
}
