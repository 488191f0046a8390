//! Modulo-256 checksum
//!
//! A single trailing byte holding the sum of every preceding byte, truncated
//! to 8 bits. Works over any primitive integer elements, not only `u8`, so
//! wider or signed values still reduce modulo 256.

mod sealed {
    pub trait Sealed {}
}

/// Integer type the checksum can be computed over
pub trait ChecksumElement: Copy + sealed::Sealed {
    /// Value modulo 256 (two's-complement low byte for signed types)
    fn low_byte(self) -> u8;

    /// True if the element's full value equals `byte`
    fn equals_byte(self, byte: u8) -> bool;
}

macro_rules! impl_checksum_element {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}

            impl ChecksumElement for $t {
                #[inline]
                fn low_byte(self) -> u8 {
                    self as u8
                }

                #[inline]
                fn equals_byte(self, byte: u8) -> bool {
                    <$t>::try_from(byte).map_or(false, |b| self == b)
                }
            }
        )*
    };
}

impl_checksum_element!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// Modulo-256 sum of all elements; 0 for an empty buffer
pub fn sum<T: ChecksumElement>(buffer: &[T]) -> u8 {
    buffer
        .iter()
        .fold(0u8, |acc, &value| acc.wrapping_add(value.low_byte()))
}

/// True if the last element equals the checksum of everything before it
///
/// An empty buffer is considered valid.
pub fn validate<T: ChecksumElement>(buffer: &[T]) -> bool {
    match buffer.split_last() {
        None => true,
        Some((&last, body)) => last.equals_byte(sum(body)),
    }
}

/// Append the checksum of the current contents as a new last element
pub fn append<T>(buffer: &mut Vec<T>)
where
    T: ChecksumElement + From<u8>,
{
    let checksum = sum(buffer);
    buffer.push(T::from(checksum));
}
