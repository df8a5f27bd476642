use std::fmt::Display;

pub trait ResultExtensions<T> {
    /// Prints the error, if any, to stderr and discards it.
    fn report(self) -> Option<T>;
}

impl<T, E: Display> ResultExtensions<T> for Result<T, E> {
    fn report(self) -> Option<T> {
        self.inspect_err(|err| eprintln!("{}", err)).ok()
    }
}
