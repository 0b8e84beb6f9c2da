/// Construct a [`Buffer<T>`][crate::Buffer] from a list of elements, with
/// `vec!`-style syntax.
///
/// ```
/// use jagged_buffer::{buffer, Buffer};
///
/// let ints: Buffer<i32> = buffer![1, 2, 3];
/// let zeros: Buffer<u8> = buffer![0u8; 16];
/// ```
#[macro_export]
macro_rules! buffer {
    () => {
        $crate::Buffer::empty()
    };
    ($elem:expr; $n:expr) => {
        $crate::Buffer::full($elem, $n)
    };
    ($($x:expr),+ $(,)?) => {
        $crate::Buffer::from_iter([$($x),+])
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::Buffer;

    #[test]
    fn list_form() {
        let buf: Buffer<i32> = buffer![1, 2, 3];
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn repeat_form() {
        let buf: Buffer<u16> = buffer![7u16; 4];
        assert_eq!(buf.as_slice(), &[7, 7, 7, 7]);
    }

    #[test]
    fn empty_form() {
        let buf: Buffer<f64> = buffer![];
        assert!(buf.is_empty());
    }
}
