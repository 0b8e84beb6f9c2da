use crate::JaggedResult;

/// Extension trait for [`JaggedResult`].
pub trait ResultExt<T>: private::Sealed {
    /// Flatten a nested [`JaggedResult`]. Helper until
    /// `Result::flatten` is stabilized.
    fn flatten(self) -> JaggedResult<T>;
}

mod private {
    use crate::JaggedResult;

    pub trait Sealed {}

    impl<T> Sealed for JaggedResult<JaggedResult<T>> {}
}

impl<T> ResultExt<T> for JaggedResult<JaggedResult<T>> {
    fn flatten(self) -> JaggedResult<T> {
        match self {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) | Err(e) => Err(e),
        }
    }
}
